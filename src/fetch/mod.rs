//! Upstream document fetching with SSRF defense at dial time.
//!
//! The client resolves DNS through a guarded resolver that classifies every
//! address at the moment of connection, so a host that re-resolves to a
//! private IP between the pre-fetch check and the connect (DNS rebinding)
//! still cannot be reached. Redirects are bounded, scheme-checked, and run
//! through an optional validator; response bodies are capped twice (by the
//! advertised Content-Length and again while streaming).

mod cached;

pub use cached::{CachedClient, CachedResult};

use std::error::Error as StdError;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::{header, redirect};
use tracing::warn;
use url::Url;

use crate::ssrf;

/// Maximum number of HTTP redirects to follow.
pub const MAX_REDIRECTS: usize = 5;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Callback invoked on each redirect hop with the target URL. Returning an
/// error blocks the redirect.
pub type RedirectValidator = Arc<dyn Fn(&Url) -> Result<(), String> + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("upstream request timed out")]
    Timeout,

    #[error("file too large: exceeds {0} bytes limit")]
    TooLarge(u64),

    #[error("blocked IP {ip} for host {host:?}")]
    SsrfBlocked { host: String, ip: IpAddr },

    #[error("redirect blocked: {0}")]
    RedirectBlocked(String),

    #[error("too many redirects (max {MAX_REDIRECTS})")]
    TooManyRedirects,

    #[error("redirect to unsupported scheme {0:?}")]
    UnsupportedScheme(String),

    #[error("upstream fetch: {0}")]
    Http(#[source] reqwest::Error),
}

/// Outcome of an upstream fetch. A 304 result has an empty body and echoes
/// the validators from the upstream response.
#[derive(Debug, Clone, Default)]
pub struct FetchResult {
    pub body: Bytes,
    pub status: u16,
    pub content_type: String,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub content_len: u64,
    pub fetch_ms: u64,
}

/// Configuration for [`Client::new`]. SSRF protection defaults to on; the
/// server turns it off when an operator allowlist defines the trust
/// boundary instead.
pub struct ClientOptions {
    pub timeout: Duration,
    pub max_file_size: u64,
    pub tls_skip_verify: bool,
    pub ssrf_protection: bool,
    pub redirect_validator: Option<RedirectValidator>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_file_size: 5 * 1024 * 1024,
            tls_skip_verify: false,
            ssrf_protection: true,
            redirect_validator: None,
        }
    }
}

/// HTTP client for upstream documents.
pub struct Client {
    http: reqwest::Client,
    max_file_size: u64,
    ssrf_protection: bool,
}

impl Client {
    pub fn new(options: ClientOptions) -> Result<Self, FetchError> {
        let validator = options.redirect_validator.clone();
        let guard_literals = options.ssrf_protection;
        let policy = redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() > MAX_REDIRECTS {
                return attempt.error(RedirectViolation::TooMany);
            }
            let scheme = attempt.url().scheme().to_string();
            if scheme != "http" && scheme != "https" {
                return attempt.error(RedirectViolation::Scheme(scheme));
            }
            // IP-literal hosts never reach the guarded resolver, so the
            // same classification runs here for redirect targets.
            if guard_literals {
                if let Some(blocked) = blocked_literal(attempt.url()) {
                    return attempt.error(blocked);
                }
            }
            if let Some(validator) = &validator {
                if let Err(reason) = validator(attempt.url()) {
                    return attempt.error(RedirectViolation::Blocked(reason));
                }
            }
            attempt.follow()
        });

        let mut builder = reqwest::Client::builder()
            .timeout(options.timeout)
            .redirect(policy)
            .user_agent(crate::USER_AGENT);

        if options.tls_skip_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if options.ssrf_protection {
            builder = builder.dns_resolver(Arc::new(GuardedDnsResolver));
        }

        let http = builder.build().map_err(FetchError::Http)?;
        Ok(Self {
            http,
            max_file_size: options.max_file_size,
            ssrf_protection: options.ssrf_protection,
        })
    }

    /// Performs a GET against the upstream URL. Conditional headers are set
    /// when validators are provided; nothing from the inbound browser
    /// request (cookies, authorization) is ever forwarded.
    pub async fn fetch(
        &self,
        url: &str,
        if_none_match: Option<&str>,
        if_modified_since: Option<&str>,
    ) -> Result<FetchResult, FetchError> {
        let start = Instant::now();

        // Hostnames are vetted in the guarded resolver; IP-literal hosts
        // bypass DNS entirely, so classify them up front.
        if self.ssrf_protection {
            if let Ok(parsed) = Url::parse(url) {
                if let Some(blocked) = blocked_literal(&parsed) {
                    return Err(FetchError::SsrfBlocked {
                        host: blocked.host,
                        ip: blocked.ip,
                    });
                }
            }
        }

        let mut request = self.http.get(url);
        if let Some(etag) = if_none_match {
            request = request.header(header::IF_NONE_MATCH, etag);
        }
        if let Some(modified) = if_modified_since {
            request = request.header(header::IF_MODIFIED_SINCE, modified);
        }

        let response = request.send().await.map_err(classify)?;
        let fetch_ms = start.elapsed().as_millis() as u64;

        let status = response.status().as_u16();
        let etag = header_value(&response, header::ETAG);
        let last_modified = header_value(&response, header::LAST_MODIFIED);

        if status == 304 {
            return Ok(FetchResult {
                status,
                etag,
                last_modified,
                fetch_ms,
                ..FetchResult::default()
            });
        }

        let content_type = header_value(&response, header::CONTENT_TYPE).unwrap_or_default();

        // Phase one: trust the advertised length enough to fail early.
        if let Some(len) = response.content_length() {
            if len > self.max_file_size {
                return Err(FetchError::TooLarge(self.max_file_size));
            }
        }

        // Phase two: cap the stream regardless of what was advertised.
        let capacity = response
            .content_length()
            .map(|len| len.min(self.max_file_size) as usize)
            .unwrap_or(8192);
        let mut body = Vec::with_capacity(capacity);
        let mut response = response;
        while let Some(chunk) = response.chunk().await.map_err(classify)? {
            body.extend_from_slice(&chunk);
            if body.len() as u64 > self.max_file_size {
                return Err(FetchError::TooLarge(self.max_file_size));
            }
        }

        let content_len = body.len() as u64;
        Ok(FetchResult {
            body: body.into(),
            status,
            content_type,
            etag,
            last_modified,
            content_len,
            fetch_ms,
        })
    }
}

fn header_value(response: &reqwest::Response, name: header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Maps a reqwest error onto the fetch failure taxonomy by walking its
/// source chain for the markers attached by the redirect policy and the
/// guarded resolver.
fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::Timeout;
    }
    if let Some(violation) = find_source::<RedirectViolation>(&err) {
        return match violation {
            RedirectViolation::TooMany => FetchError::TooManyRedirects,
            RedirectViolation::Scheme(s) => FetchError::UnsupportedScheme(s.clone()),
            RedirectViolation::Blocked(reason) => FetchError::RedirectBlocked(reason.clone()),
        };
    }
    if let Some(blocked) = find_source::<DialBlocked>(&err) {
        return FetchError::SsrfBlocked {
            host: blocked.host.clone(),
            ip: blocked.ip,
        };
    }
    FetchError::Http(err)
}

fn find_source<'a, T: StdError + 'static>(err: &'a (dyn StdError + 'static)) -> Option<&'a T> {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(found) = e.downcast_ref::<T>() {
            return Some(found);
        }
        current = e.source();
    }
    None
}

/// Marker error attached by the custom redirect policy; recovered by
/// [`classify`] from the reqwest error chain.
#[derive(Debug)]
enum RedirectViolation {
    TooMany,
    Scheme(String),
    Blocked(String),
}

impl fmt::Display for RedirectViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedirectViolation::TooMany => write!(f, "too many redirects (max {MAX_REDIRECTS})"),
            RedirectViolation::Scheme(s) => write!(f, "redirect to unsupported scheme {s:?}"),
            RedirectViolation::Blocked(reason) => write!(f, "redirect blocked: {reason}"),
        }
    }
}

impl StdError for RedirectViolation {}

/// Classifies an IP-literal host against the SSRF policy.
fn blocked_literal(url: &Url) -> Option<DialBlocked> {
    let ip = match url.host()? {
        url::Host::Ipv4(v4) => IpAddr::V4(v4),
        url::Host::Ipv6(v6) => IpAddr::V6(v6),
        url::Host::Domain(_) => return None,
    };
    if ssrf::is_blocked_ip(ip) {
        warn!(host = %url.host_str().unwrap_or(""), %ip, "blocked dial to private address");
        Some(DialBlocked {
            host: url.host_str().unwrap_or("").to_string(),
            ip,
        })
    } else {
        None
    }
}

/// Marker error raised by the guarded resolver when a resolved address is
/// in a blocked range.
#[derive(Debug)]
struct DialBlocked {
    host: String,
    ip: IpAddr,
}

impl fmt::Display for DialBlocked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ssrf dial: blocked IP {} for host {:?}", self.ip, self.host)
    }
}

impl StdError for DialBlocked {}

/// DNS resolver enforcing the SSRF policy at connect time. The connection
/// is pinned to the addresses vetted here, which closes the check/use race
/// and defeats DNS rebinding: if ANY resolved address is blocked the dial
/// fails outright.
struct GuardedDnsResolver;

impl Resolve for GuardedDnsResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(async move {
            let host = name.as_str().to_string();
            let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host.as_str(), 0u16))
                .await
                .map_err(|e| Box::new(e) as BoxError)?
                .collect();

            for addr in &addrs {
                if ssrf::is_blocked_ip(addr.ip()) {
                    warn!(host = %host, ip = %addr.ip(), "blocked dial to private address");
                    return Err(Box::new(DialBlocked {
                        host,
                        ip: addr.ip(),
                    }) as BoxError);
                }
            }

            Ok(Box::new(addrs.into_iter()) as Addrs)
        })
    }
}
