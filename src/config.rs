//! Runtime configuration: CLI flags with `COOKED_*` environment fallback
//! (flags win). Immutable after startup; constructed in `main` and handed
//! to the server.

use std::time::Duration;

use clap::Parser;
use ipnet::IpNet;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "cooked",
    version,
    about = "Rendering reverse proxy: fetch raw documents, serve them as styled HTML"
)]
pub struct Config {
    /// Listen address
    #[arg(long, env = "COOKED_LISTEN", default_value = "127.0.0.1:8080")]
    pub listen: String,

    /// Cache TTL duration (e.g. 5m, 30s)
    #[arg(long, env = "COOKED_CACHE_TTL", value_parser = humantime::parse_duration, default_value = "5m")]
    pub cache_ttl: Duration,

    /// Max cache size (e.g. 100MB, 5KB, plain bytes)
    #[arg(long, env = "COOKED_CACHE_MAX_SIZE", value_parser = parse_byte_size, default_value = "100MB")]
    pub cache_max_size: u64,

    /// Upstream fetch timeout
    #[arg(long, env = "COOKED_FETCH_TIMEOUT", value_parser = humantime::parse_duration, default_value = "30s")]
    pub fetch_timeout: Duration,

    /// Max file size to render (e.g. 5MB)
    #[arg(long, env = "COOKED_MAX_FILE_SIZE", value_parser = parse_byte_size, default_value = "5MB")]
    pub max_file_size: u64,

    /// Comma-separated allowed upstreams: hostnames, *.wildcards, or CIDR
    /// ranges (e.g. "cgit.internal,*.corp,10.0.0.0/8"). Empty allows all
    /// public hosts with SSRF protection.
    #[arg(long, env = "COOKED_ALLOWED_UPSTREAMS", default_value = "")]
    pub allowed_upstreams: String,

    /// Public base URL of cooked itself, used when rewriting document links
    #[arg(long, env = "COOKED_BASE_URL", default_value = "")]
    pub base_url: String,

    /// Default theme
    #[arg(long, env = "COOKED_DEFAULT_THEME", default_value = "auto", value_parser = ["auto", "light", "dark"])]
    pub default_theme: String,

    /// Disable TLS certificate verification for upstream fetches
    #[arg(long, env = "COOKED_TLS_SKIP_VERIFY")]
    pub tls_skip_verify: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid allowed-upstreams: invalid CIDR {0:?}: {1}")]
    InvalidCidr(String, ipnet::AddrParseError),

    #[error("invalid allowed-upstreams: empty wildcard suffix in {0:?}")]
    EmptyWildcard(String),
}

impl Config {
    /// Startup validation beyond what clap's parsers cover: every
    /// allowlist entry must be well-formed so misconfiguration refuses to
    /// start instead of silently allowing nothing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for entry in self.allowed_upstreams.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            if entry.contains('/') {
                entry
                    .parse::<IpNet>()
                    .map_err(|e| ConfigError::InvalidCidr(entry.to_string(), e))?;
            } else if entry.starts_with("*.") && entry.len() <= 2 {
                return Err(ConfigError::EmptyWildcard(entry.to_string()));
            }
        }
        Ok(())
    }
}

/// Parses a human-readable byte size like "100MB", "5KB", "1GB", or a
/// plain byte count. Fractional values are accepted ("1.5MB").
pub fn parse_byte_size(s: &str) -> Result<u64, String> {
    if s.is_empty() {
        return Err("empty size string".to_string());
    }

    let split = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit() && *c != '.')
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let (number, unit) = s.split_at(split);

    let value: f64 = number
        .parse()
        .map_err(|e| format!("invalid size {s:?}: {e}"))?;

    let multiplier: u64 = match unit {
        "" | "B" => 1,
        "KB" | "kb" => 1024,
        "MB" | "mb" => 1024 * 1024,
        "GB" | "gb" => 1024 * 1024 * 1024,
        other => return Err(format!("unknown size unit {other:?} in {s:?}")),
    };

    Ok((value * multiplier as f64) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_args(args: &[&str]) -> Config {
        let mut full = vec!["cooked"];
        full.extend_from_slice(args);
        Config::try_parse_from(full).unwrap()
    }

    #[test]
    fn defaults() {
        let cfg = parse_args(&[]);
        assert_eq!(cfg.listen, "127.0.0.1:8080");
        assert_eq!(cfg.cache_ttl, Duration::from_secs(300));
        assert_eq!(cfg.cache_max_size, 100 * 1024 * 1024);
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(30));
        assert_eq!(cfg.max_file_size, 5 * 1024 * 1024);
        assert_eq!(cfg.default_theme, "auto");
        assert!(!cfg.tls_skip_verify);
        assert!(cfg.allowed_upstreams.is_empty());
    }

    #[test]
    fn flags_override_defaults() {
        let cfg = parse_args(&[
            "--listen",
            "0.0.0.0:9000",
            "--cache-ttl",
            "1m",
            "--max-file-size",
            "1MB",
            "--default-theme",
            "dark",
            "--tls-skip-verify",
        ]);
        assert_eq!(cfg.listen, "0.0.0.0:9000");
        assert_eq!(cfg.cache_ttl, Duration::from_secs(60));
        assert_eq!(cfg.max_file_size, 1024 * 1024);
        assert_eq!(cfg.default_theme, "dark");
        assert!(cfg.tls_skip_verify);
    }

    #[test]
    fn invalid_theme_is_rejected() {
        assert!(Config::try_parse_from(["cooked", "--default-theme", "sepia"]).is_err());
    }

    #[test]
    fn byte_sizes() {
        assert_eq!(parse_byte_size("100MB").unwrap(), 100 * 1024 * 1024);
        assert_eq!(parse_byte_size("5KB").unwrap(), 5 * 1024);
        assert_eq!(parse_byte_size("1GB").unwrap(), 1024 * 1024 * 1024);
        assert_eq!(parse_byte_size("1024").unwrap(), 1024);
        assert_eq!(parse_byte_size("512B").unwrap(), 512);
        assert_eq!(parse_byte_size("1.5KB").unwrap(), 1536);
        assert!(parse_byte_size("").is_err());
        assert!(parse_byte_size("12XB").is_err());
        assert!(parse_byte_size("abc").is_err());
    }

    #[test]
    fn validate_accepts_well_formed_allowlists() {
        for expr in ["", "cgit.internal", "*.corp,10.0.0.0/8", "fd00::/8"] {
            let cfg = parse_args(&["--allowed-upstreams", expr]);
            assert!(cfg.validate().is_ok(), "{expr}");
        }
    }

    #[test]
    fn validate_rejects_malformed_entries() {
        let cfg = parse_args(&["--allowed-upstreams", "10.0.0.0/99"]);
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidCidr(_, _))));

        let cfg = parse_args(&["--allowed-upstreams", "*."]);
        assert!(matches!(cfg.validate(), Err(ConfigError::EmptyWildcard(_))));
    }
}
