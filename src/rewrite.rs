//! Relative-URL rewriting of rendered HTML. Document-to-document links are
//! routed back through the proxy; images and other assets resolve straight
//! to the upstream origin so the browser fetches them directly.

use once_cell::sync::Lazy;
use regex::bytes::Regex;
use url::Url;

use crate::render::is_markdown_link;

static HREF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)((?:href|src)\s*=\s*")([^"]+)(")"#).unwrap());

/// Rewrites relative `href`/`src` values using `upstream_url` as the base.
/// Absolute URLs, fragments, `mailto:` and `data:` URIs pass through
/// untouched, which also makes the transform idempotent on its own output.
pub fn relative_urls(html: &[u8], upstream_url: &str, base_url: &str) -> Vec<u8> {
    let Ok(upstream) = Url::parse(upstream_url) else {
        return html.to_vec();
    };
    let Some(host) = upstream.host_str() else {
        return html.to_vec();
    };

    // Base is the upstream URL with the filename stripped.
    let dir = match upstream.path().rfind('/') {
        Some(i) => &upstream.path()[..i],
        None => "",
    };
    let mut base = format!("{}://{}", upstream.scheme(), host);
    if let Some(port) = upstream.port() {
        base.push_str(&format!(":{port}"));
    }
    base.push_str(dir);

    HREF_RE
        .replace_all(html, |caps: &regex::bytes::Captures| {
            let prefix = &caps[1];
            let value = String::from_utf8_lossy(&caps[2]).into_owned();
            let suffix = &caps[3];

            match rewrite_value(&value, &base, base_url) {
                Some(rewritten) => {
                    let mut out = prefix.to_vec();
                    out.extend_from_slice(rewritten.as_bytes());
                    out.extend_from_slice(suffix);
                    out
                }
                None => caps[0].to_vec(),
            }
        })
        .into_owned()
}

/// Returns the replacement value, or None when the original should stand.
fn rewrite_value(value: &str, base: &str, base_url: &str) -> Option<String> {
    if value.starts_with("http://") || value.starts_with("https://") || value.starts_with("//") {
        return None;
    }
    if value.starts_with('#') || value.starts_with("data:") || value.starts_with("mailto:") {
        return None;
    }

    // Split off fragment, then query, so both can be reattached.
    let (path_and_query, fragment) = match value.find('#') {
        Some(i) => (&value[..i], &value[i..]),
        None => (value, ""),
    };
    let (path, query) = match path_and_query.find('?') {
        Some(i) => (&path_and_query[..i], &path_and_query[i..]),
        None => (path_and_query, ""),
    };

    if path.is_empty() {
        return None;
    }

    let resolved = resolve_relative(base, path);

    if is_markdown_link(path) {
        let proxy_prefix = if base_url.is_empty() {
            "/".to_string()
        } else {
            format!("{}/", base_url.trim_end_matches('/'))
        };
        Some(format!("{proxy_prefix}{resolved}{query}{fragment}"))
    } else {
        Some(format!("{resolved}{query}{fragment}"))
    }
}

fn resolve_relative(base: &str, path: &str) -> String {
    let path = path.strip_prefix("./").unwrap_or(path);
    if path.contains("://") {
        return path.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), path)
}
