//! Operator-declared upstream allowlist: exact hostnames (with subdomain
//! matching), `*.wildcard` patterns, and CIDR ranges.

use std::io;
use std::net::{IpAddr, ToSocketAddrs};

use ipnet::IpNet;

type Resolver = Box<dyn Fn(&str) -> io::Result<Vec<IpAddr>> + Send + Sync>;

/// Parsed allowlist. Use `Option<Allowlist>`: `None` means every host is
/// permitted and the SSRF dial guard is the remaining trust boundary.
pub struct Allowlist {
    cidrs: Vec<IpNet>,
    wildcards: Vec<String>, // stored as ".suffix" (e.g. ".internal" from "*.internal")
    exact: Vec<String>,     // lowercased hostnames
    resolver: Resolver,
}

impl Allowlist {
    /// Parses a comma-separated expression. Entries containing `/` are
    /// CIDRs, entries starting with `*.` are wildcards, everything else is
    /// an exact hostname. Returns `None` for an empty expression.
    /// Unparseable CIDRs are skipped here; config validation rejects them
    /// at startup before this runs.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            return None;
        }

        let mut allowlist = Self {
            cidrs: Vec::new(),
            wildcards: Vec::new(),
            exact: Vec::new(),
            resolver: Box::new(system_resolve),
        };

        for entry in raw.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            if entry.contains('/') {
                if let Ok(cidr) = entry.parse::<IpNet>() {
                    allowlist.cidrs.push(cidr);
                }
            } else if entry.starts_with("*.") {
                // Keep the dot: "*.internal" -> ".internal".
                allowlist.wildcards.push(entry[1..].to_ascii_lowercase());
            } else {
                allowlist.exact.push(entry.to_ascii_lowercase());
            }
        }

        Some(allowlist)
    }

    #[cfg(test)]
    pub(crate) fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Reports whether `host` (optionally with a port) is permitted.
    ///
    /// Exact entries match the host itself or any subdomain; wildcard
    /// entries match strict subdomains only; CIDRs match IP-literal hosts
    /// directly and hostnames through their resolved addresses (denying on
    /// DNS failure). Suffix matching is dot-anchored so `cgit.internal`
    /// never admits `cgit.internal.attacker.com`.
    pub fn allows(&self, host: &str) -> bool {
        let hostname = strip_port(host).to_ascii_lowercase();

        for entry in &self.exact {
            if hostname == *entry || hostname.ends_with(&format!(".{entry}")) {
                return true;
            }
        }

        for suffix in &self.wildcards {
            if hostname.ends_with(suffix.as_str()) && hostname != suffix[1..] {
                return true;
            }
        }

        if !self.cidrs.is_empty() {
            if let Ok(ip) = hostname.parse::<IpAddr>() {
                return self.cidrs.iter().any(|cidr| cidr.contains(&ip));
            }
            return match (self.resolver)(&hostname) {
                Ok(ips) => ips
                    .iter()
                    .any(|ip| self.cidrs.iter().any(|cidr| cidr.contains(ip))),
                Err(_) => false,
            };
        }

        false
    }
}

fn system_resolve(host: &str) -> io::Result<Vec<IpAddr>> {
    Ok((host, 0u16)
        .to_socket_addrs()?
        .map(|addr| addr.ip())
        .collect())
}

/// Strips an optional port, handling bracketed IPv6 literals.
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
