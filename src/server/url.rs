//! Upstream URL extraction and validation.

use std::io;

use url::Url;

use crate::ssrf;

#[derive(Debug, thiserror::Error)]
pub enum UpstreamUrlError {
    #[error("empty upstream URL")]
    Empty,

    #[error("parse upstream url: {0}")]
    Parse(#[from] url::ParseError),

    #[error("unsupported scheme {0:?}: only http and https are allowed")]
    Scheme(String),

    #[error("missing host in upstream URL")]
    MissingHost,
}

/// Reconstructs the upstream URL from the request path (leading `/`
/// stripped) and query string. HTTP routers canonicalize `//` to `/`, so a
/// collapsed scheme prefix like `https:/host` gets its slash restored.
pub fn extract_upstream_from_path(path: &str, raw_query: &str) -> String {
    let mut upstream = path.strip_prefix('/').unwrap_or(path).to_string();

    if upstream.starts_with("http:/") && !upstream.starts_with("http://") {
        upstream = format!("http://{}", &upstream["http:/".len()..]);
    }
    if upstream.starts_with("https:/") && !upstream.starts_with("https://") {
        upstream = format!("https://{}", &upstream["https:/".len()..]);
    }

    if !raw_query.is_empty() {
        upstream.push('?');
        upstream.push_str(raw_query);
    }
    upstream
}

/// Parses and validates the extracted upstream URL: http/https only, host
/// required.
pub fn parse_upstream_url(raw: &str) -> Result<Url, UpstreamUrlError> {
    if raw.is_empty() {
        return Err(UpstreamUrlError::Empty);
    }

    let url = Url::parse(raw)?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(UpstreamUrlError::Scheme(other.to_string())),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UpstreamUrlError::MissingHost);
    }

    Ok(url)
}

/// Fast-fail SSRF check used when no allowlist is configured: does the
/// host resolve to a blocked address? Real enforcement happens again at
/// dial time inside the fetch client.
pub async fn is_private_address(host: &str) -> io::Result<bool> {
    let hostname = strip_port(host);

    if let Ok(ip) = hostname.parse() {
        return Ok(ssrf::is_blocked_ip(ip));
    }

    let addrs = tokio::net::lookup_host((hostname, 0u16)).await?;
    Ok(addrs.into_iter().any(|addr| ssrf::is_blocked_ip(addr.ip())))
}

fn strip_port(host: &str) -> &str {
    if let Some(rest) = host.strip_prefix('[') {
        if let Some(end) = rest.find(']') {
            return &rest[..end];
        }
    }
    if let Some(idx) = host.rfind(':') {
        if !host[..idx].contains(':') {
            return &host[..idx];
        }
    }
    host
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_plain_upstream() {
        assert_eq!(
            extract_upstream_from_path("/https://example.com/README.md", ""),
            "https://example.com/README.md"
        );
    }

    #[test]
    fn repairs_collapsed_scheme_slashes() {
        assert_eq!(
            extract_upstream_from_path("/https:/example.com/README.md", ""),
            "https://example.com/README.md"
        );
        assert_eq!(
            extract_upstream_from_path("/http:/example.com/x.md", ""),
            "http://example.com/x.md"
        );
    }

    #[test]
    fn leaves_intact_scheme_alone() {
        assert_eq!(
            extract_upstream_from_path("/http://example.com/x.md", ""),
            "http://example.com/x.md"
        );
    }

    #[test]
    fn appends_query_when_present() {
        assert_eq!(
            extract_upstream_from_path("/https://example.com/f.md", "token=abc&v=2"),
            "https://example.com/f.md?token=abc&v=2"
        );
        assert_eq!(
            extract_upstream_from_path("/https://example.com/f.md", ""),
            "https://example.com/f.md"
        );
    }

    #[test]
    fn parse_accepts_http_and_https() {
        assert!(parse_upstream_url("http://example.com/a.md").is_ok());
        assert!(parse_upstream_url("https://example.com:8443/a.md").is_ok());
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(matches!(
            parse_upstream_url(""),
            Err(UpstreamUrlError::Empty)
        ));
        assert!(matches!(
            parse_upstream_url("ftp://example.com/a"),
            Err(UpstreamUrlError::Scheme(_))
        ));
        assert!(matches!(
            parse_upstream_url("file:///etc/passwd"),
            Err(UpstreamUrlError::Scheme(_))
        ));
        assert!(parse_upstream_url("not a url").is_err());
    }

    #[tokio::test]
    async fn private_ip_literals_are_flagged() {
        for host in [
            "127.0.0.1",
            "10.0.0.1",
            "172.16.0.1",
            "192.168.1.1",
            "100.64.0.1",
            "169.254.169.254",
            "[::1]",
            "[fd00::1]",
            "127.0.0.1:8080",
        ] {
            assert!(is_private_address(host).await.unwrap(), "{host}");
        }
    }

    #[tokio::test]
    async fn public_ip_literals_pass() {
        assert!(!is_private_address("93.184.216.34").await.unwrap());
        assert!(!is_private_address("8.8.8.8:443").await.unwrap());
    }
}
