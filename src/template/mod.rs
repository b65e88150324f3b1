//! Final page assembly: a complete, self-contained HTML document with
//! embedded CSS/JS and stable test hooks (element ids and `data-*`
//! attributes). Nothing here references an external resource other than
//! the upstream source link itself.

mod css;
mod landing;
mod scripts;

use std::fmt::Write;
use std::time::SystemTime;

use syntect::highlighting::ThemeSet;
use syntect::html::{css_for_theme_with_class_style, ClassStyle};

use crate::render::{escape_html, Heading};
use css::{write_layout_css, write_theme_css, FAVICON_SVG};
use scripts::write_scripts;

/// Number of headings at which the page grows a table of contents.
const TOC_THRESHOLD: usize = 3;

/// Everything needed to assemble a content page.
pub struct PageData<'a> {
    pub version: &'a str,
    pub upstream_url: &'a str,
    pub content_type: &'a str,
    pub type_label: &'a str,
    pub cache_status: &'a str,
    pub upstream_status: u16,
    pub file_size: u64,
    pub last_modified: Option<&'a str>,
    pub default_theme: &'a str,
    pub title: Option<&'a str>,
    pub content: &'a [u8],
    pub has_mermaid: bool,
    pub heading_count: usize,
    pub code_block_count: usize,
    pub headings: &'a [Heading],
    pub mermaid_path: &'a str,
}

/// Everything needed to assemble an error page.
pub struct ErrorData<'a> {
    pub version: &'a str,
    pub upstream_url: &'a str,
    pub status_code: u16,
    pub error_type: &'a str,
    pub message: &'a str,
    pub default_theme: &'a str,
}

/// Page renderer. Holds the syntect-generated highlight CSS for both
/// themes, computed once at startup.
pub struct Renderer {
    highlight_light_css: String,
    highlight_dark_css: String,
}

impl Renderer {
    pub fn new() -> Self {
        let themes = ThemeSet::load_defaults();
        Self {
            highlight_light_css: theme_css(&themes, "InspiredGitHub"),
            highlight_dark_css: theme_css(&themes, "base16-ocean.dark"),
        }
    }

    /// Produces the complete content page.
    pub fn render_page(&self, data: &PageData, light_css: &str, dark_css: &str) -> Vec<u8> {
        let mut out = String::with_capacity(data.content.len() + 32 * 1024);

        let title = match data.title {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => data
                .upstream_url
                .rsplit('/')
                .next()
                .filter(|s| !s.is_empty())
                .unwrap_or("cooked")
                .to_string(),
        };

        let escaped_url = escape_html(data.upstream_url);
        let truncated_url = truncate_url(data.upstream_url, 80);

        let _ = write!(
            out,
            concat!(
                "<!DOCTYPE html>\n",
                "<html lang=\"en\"\n",
                "      data-theme=\"{theme}\"\n",
                "      data-cooked-version=\"{version}\"\n",
                "      data-upstream-url=\"{url}\"\n",
                "      data-content-type=\"{content_type}\"\n",
                "      data-cache-status=\"{cache}\">\n",
                "<head>\n",
                "  <meta charset=\"utf-8\">\n",
                "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
                "  <title>{title} — cooked</title>\n",
                "  <link rel=\"icon\" type=\"image/svg+xml\" href=\"data:image/svg+xml,{favicon}\">\n",
                "  <style>\n"
            ),
            theme = escape_html(data.default_theme),
            version = escape_html(data.version),
            url = escaped_url,
            content_type = escape_html(data.content_type),
            cache = escape_html(data.cache_status),
            title = escape_html(&title),
            favicon = FAVICON_SVG,
        );

        write_theme_css(
            &mut out,
            light_css,
            dark_css,
            &self.highlight_light_css,
            &self.highlight_dark_css,
        );
        write_layout_css(&mut out);
        out.push_str("\n  </style>\n</head>\n<body>\n");

        out.push_str("  <!-- cooked: header -->\n");
        self.write_header(&mut out, data, &escaped_url, &truncated_url);

        let has_toc = data.headings.len() >= TOC_THRESHOLD;
        out.push_str("  <!-- cooked: table of contents -->\n");
        if has_toc {
            write_toc(&mut out, data.headings);
        }

        out.push_str("  <!-- cooked: content -->\n");
        let _ = write!(
            out,
            concat!(
                "  <main>\n",
                "    <article id=\"cooked-content\"\n",
                "             class=\"markdown-body\"\n",
                "             data-has-mermaid=\"{mermaid}\"\n",
                "             data-has-toc=\"{toc}\"\n",
                "             data-heading-count=\"{headings}\"\n",
                "             data-code-block-count=\"{code_blocks}\">\n"
            ),
            mermaid = data.has_mermaid,
            toc = has_toc,
            headings = data.heading_count,
            code_blocks = data.code_block_count,
        );
        out.push_str(&String::from_utf8_lossy(data.content));
        out.push_str("\n    </article>\n  </main>\n");

        out.push_str("  <!-- cooked: scripts -->\n");
        write_scripts(&mut out);

        if data.has_mermaid && !data.mermaid_path.is_empty() {
            let _ = writeln!(
                out,
                "  <script src=\"{}\"></script>",
                escape_html(data.mermaid_path)
            );
            out.push_str(
                "  <script>mermaid.initialize({startOnLoad: true, theme: 'default'});</script>\n",
            );
        }

        out.push_str("</body>\n</html>\n");
        out.into_bytes()
    }

    /// Produces an error page with the status code and error type exposed
    /// as data attributes.
    pub fn render_error(&self, data: &ErrorData) -> Vec<u8> {
        let mut out = String::with_capacity(16 * 1024);

        let escaped_url = escape_html(data.upstream_url);

        let _ = write!(
            out,
            concat!(
                "<!DOCTYPE html>\n",
                "<html lang=\"en\"\n",
                "      data-theme=\"{theme}\"\n",
                "      data-cooked-version=\"{version}\"\n",
                "      data-upstream-url=\"{url}\"\n",
                "      data-content-type=\"error\"\n",
                "      data-error-type=\"{error_type}\">\n",
                "<head>\n",
                "  <meta charset=\"utf-8\">\n",
                "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
                "  <title>Error — cooked</title>\n",
                "  <link rel=\"icon\" type=\"image/svg+xml\" href=\"data:image/svg+xml,{favicon}\">\n",
                "  <style>\n"
            ),
            theme = escape_html(data.default_theme),
            version = escape_html(data.version),
            url = escaped_url,
            error_type = escape_html(data.error_type),
            favicon = FAVICON_SVG,
        );

        write_layout_css(&mut out);
        out.push_str("\n  </style>\n</head>\n<body>\n");

        let _ = write!(
            out,
            concat!(
                "  <!-- cooked: header -->\n",
                "  <header id=\"cooked-header\">\n",
                "    <div class=\"cooked-meta\">\n",
                "      <a id=\"cooked-source-link\" href=\"{url}\" title=\"{url}\">{text}</a>\n",
                "    </div>\n",
                "    <div class=\"cooked-controls\">\n",
                "      <button id=\"cooked-theme-toggle\" title=\"Toggle theme\">&#x25D1;</button>\n",
                "    </div>\n",
                "  </header>\n"
            ),
            url = escaped_url,
            text = escape_html(&truncate_url(data.upstream_url, 80)),
        );

        let _ = write!(
            out,
            concat!(
                "  <!-- cooked: content -->\n",
                "  <main>\n",
                "    <div id=\"cooked-error\"\n",
                "         data-error-type=\"{error_type}\"\n",
                "         data-status-code=\"{status}\"\n",
                "         data-error-message=\"{message}\">\n",
                "      <h1>{status} {status_text}</h1>\n",
                "      <p>{message}</p>\n",
                "      <p><a href=\"{url}\">View original file</a></p>\n",
                "    </div>\n",
                "  </main>\n",
                "  <!-- cooked: scripts -->\n"
            ),
            error_type = escape_html(data.error_type),
            status = data.status_code,
            status_text = escape_html(http_status_text(data.status_code)),
            message = escape_html(data.message),
            url = escaped_url,
        );

        write_scripts(&mut out);
        out.push_str("</body>\n</html>\n");
        out.into_bytes()
    }

    fn write_header(&self, out: &mut String, data: &PageData, escaped_url: &str, truncated: &str) {
        let _ = write!(
            out,
            concat!(
                "  <header id=\"cooked-header\"\n",
                "          data-upstream-status=\"{status}\"\n",
                "          data-file-size=\"{size}\""
            ),
            status = data.upstream_status,
            size = data.file_size,
        );
        if let Some(modified) = data.last_modified {
            let _ = write!(out, "\n          data-last-modified=\"{}\"", escape_html(modified));
        }
        let _ = write!(
            out,
            concat!(
                ">\n",
                "    <div class=\"cooked-meta\">\n",
                "      <a id=\"cooked-source-link\" href=\"{url}\" title=\"{url}\">{text}</a>\n"
            ),
            url = escaped_url,
            text = escape_html(truncated),
        );

        if let Some(modified) = data.last_modified {
            let _ = writeln!(
                out,
                "      <time id=\"cooked-modified\" datetime=\"{dt}\" title=\"{dt}\">Modified {rel}</time>",
                dt = escape_html(modified),
                rel = escape_html(&format_relative_time(modified)),
            );
        }

        let _ = write!(
            out,
            concat!(
                "      <span id=\"cooked-size\">{size}</span>\n",
                "      <span id=\"cooked-type\">{label}</span>\n",
                "    </div>\n",
                "    <div class=\"cooked-controls\">\n"
            ),
            size = escape_html(&format_file_size(data.file_size)),
            label = escape_html(data.type_label),
        );

        if data.headings.len() >= TOC_THRESHOLD {
            out.push_str(
                "      <button id=\"cooked-toc-toggle\" title=\"Table of contents\">&#9776;</button>\n",
            );
        }
        out.push_str(
            "      <button id=\"cooked-theme-toggle\" title=\"Toggle theme\">&#x25D1;</button>\n",
        );
        out.push_str("    </div>\n  </header>\n");
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

fn theme_css(themes: &ThemeSet, name: &str) -> String {
    themes
        .themes
        .get(name)
        .and_then(|theme| css_for_theme_with_class_style(theme, ClassStyle::Spaced).ok())
        .unwrap_or_default()
}

fn write_toc(out: &mut String, headings: &[Heading]) {
    out.push_str("  <nav id=\"cooked-toc\" hidden>\n    <ul>\n");
    for heading in headings {
        let _ = writeln!(
            out,
            "      <li data-level=\"{}\"><a href=\"#{}\">{}</a></li>",
            heading.level,
            escape_html(&heading.id),
            escape_html(&heading.text),
        );
    }
    out.push_str("    </ul>\n  </nav>\n");
}

fn http_status_text(code: u16) -> &'static str {
    match code {
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        408 => "Request Timeout",
        413 => "Payload Too Large",
        415 => "Unsupported Media Type",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        504 => "Gateway Timeout",
        _ => "Error",
    }
}

/// Truncates a URL for display, keeping the full value in href/title.
fn truncate_url(url: &str, max_len: usize) -> String {
    if url.chars().count() <= max_len {
        return url.to_string();
    }
    let mut out: String = url.chars().take(max_len.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    match bytes {
        b if b >= MB => format!("{:.1} MB", b as f64 / MB as f64),
        b if b >= KB => format!("{:.1} KB", b as f64 / KB as f64),
        b => format!("{b} B"),
    }
}

/// Formats an HTTP date (or RFC 3339 timestamp) as a coarse relative time,
/// falling back to the raw string when it does not parse.
fn format_relative_time(raw: &str) -> String {
    let parsed = httpdate::parse_http_date(raw)
        .ok()
        .or_else(|| humantime::parse_rfc3339(raw).ok());
    let Some(then) = parsed else {
        return raw.to_string();
    };
    let Ok(diff) = SystemTime::now().duration_since(then) else {
        return "just now".to_string();
    };

    let secs = diff.as_secs();
    match secs {
        s if s < 60 => "just now".to_string(),
        s if s < 3600 => plural(s / 60, "minute"),
        s if s < 86400 => plural(s / 3600, "hour"),
        s => plural(s / 86400, "day"),
    }
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> Renderer {
        Renderer::new()
    }

    fn sample_headings() -> Vec<Heading> {
        vec![
            Heading { level: 1, text: "One".into(), id: "one".into() },
            Heading { level: 2, text: "Two".into(), id: "two".into() },
            Heading { level: 2, text: "Three & Co".into(), id: "three--co".into() },
        ]
    }

    fn sample_page<'a>(headings: &'a [Heading]) -> PageData<'a> {
        PageData {
            version: "0.3.0",
            upstream_url: "https://cgit.internal/repo/plain/README.md",
            content_type: "markdown",
            type_label: "Markdown",
            cache_status: "miss",
            upstream_status: 200,
            file_size: 2048,
            last_modified: Some("Wed, 01 Jan 2025 00:00:00 GMT"),
            default_theme: "auto",
            title: Some("My Doc"),
            content: b"<h1>My Doc</h1><p>body</p>",
            has_mermaid: false,
            heading_count: headings.len(),
            code_block_count: 1,
            headings,
            mermaid_path: "/_cooked/mermaid.min.js",
        }
    }

    #[test]
    fn page_carries_all_test_hooks() {
        let headings = sample_headings();
        let html = renderer().render_page(&sample_page(&headings), "", "");
        let html = String::from_utf8(html).unwrap();

        for hook in [
            r#"data-theme="auto""#,
            r#"data-cooked-version="0.3.0""#,
            r#"data-upstream-url="https://cgit.internal/repo/plain/README.md""#,
            r#"data-content-type="markdown""#,
            r#"data-cache-status="miss""#,
            r#"id="cooked-header""#,
            r#"data-upstream-status="200""#,
            r#"data-file-size="2048""#,
            r#"data-last-modified="Wed, 01 Jan 2025 00:00:00 GMT""#,
            r#"id="cooked-source-link""#,
            r#"id="cooked-theme-toggle""#,
            r#"id="cooked-toc-toggle""#,
            r#"id="cooked-content""#,
            r#"data-has-mermaid="false""#,
            r#"data-has-toc="true""#,
            r#"data-heading-count="3""#,
            r#"data-code-block-count="1""#,
            "<!-- cooked: header -->",
            "<!-- cooked: table of contents -->",
            "<!-- cooked: content -->",
            "<!-- cooked: scripts -->",
        ] {
            assert!(html.contains(hook), "missing {hook}");
        }
    }

    #[test]
    fn toc_renders_when_headings_reach_threshold() {
        let headings = sample_headings();
        let html = renderer().render_page(&sample_page(&headings), "", "");
        let html = String::from_utf8(html).unwrap();

        assert!(html.contains(r#"<nav id="cooked-toc" hidden>"#));
        assert!(html.contains(r##"<li data-level="2"><a href="#two">Two</a></li>"##));
        assert!(html.contains("Three &amp; Co"));
    }

    #[test]
    fn toc_absent_below_threshold() {
        let headings = vec![Heading { level: 1, text: "Only".into(), id: "only".into() }];
        let mut data = sample_page(&headings);
        data.heading_count = 1;
        let html = String::from_utf8(renderer().render_page(&data, "", "")).unwrap();

        assert!(!html.contains(r#"id="cooked-toc""#));
        assert!(!html.contains(r#"id="cooked-toc-toggle""#));
        assert!(html.contains(r#"data-has-toc="false""#));
    }

    #[test]
    fn mermaid_script_emitted_only_when_detected() {
        let headings = sample_headings();
        let mut data = sample_page(&headings);
        let html = String::from_utf8(renderer().render_page(&data, "", "")).unwrap();
        assert!(!html.contains("mermaid.min.js"));

        data.has_mermaid = true;
        let html = String::from_utf8(renderer().render_page(&data, "", "")).unwrap();
        assert!(html.contains(r#"<script src="/_cooked/mermaid.min.js"></script>"#));
        assert!(html.contains("mermaid.initialize"));
    }

    #[test]
    fn no_external_urls_besides_source_link() {
        let headings = sample_headings();
        let html = String::from_utf8(renderer().render_page(&sample_page(&headings), "", "")).unwrap();

        // The upstream URL appears exactly four times: the html data
        // attribute, and the source link's href, title, and text. Nothing
        // else in the page may reference an external URL.
        let occurrences = html.matches("https://").count();
        assert_eq!(occurrences, 4, "unexpected external URL in page");
    }

    #[test]
    fn theme_css_is_scoped_per_theme() {
        let headings = sample_headings();
        let html = String::from_utf8(renderer().render_page(
            &sample_page(&headings),
            ".markdown-body { color: #111; }",
            ".markdown-body { color: #eee; }",
        ))
        .unwrap();

        assert!(html.contains(r#"[data-theme="light"] .markdown-body"#));
        assert!(html.contains(r#"[data-theme="dark"] .markdown-body"#));
        assert!(html.contains(r#"[data-theme="auto"] .markdown-body"#));
        assert!(html.contains("@media (prefers-color-scheme: dark)"));
    }

    #[test]
    fn error_page_hooks() {
        let html = renderer().render_error(&ErrorData {
            version: "0.3.0",
            upstream_url: "https://example.com/missing.md",
            status_code: 404,
            error_type: "upstream-error",
            message: "Upstream returned 404",
            default_theme: "auto",
        });
        let html = String::from_utf8(html).unwrap();

        assert!(html.contains(r#"data-error-type="upstream-error""#));
        assert!(html.contains(r#"data-status-code="404""#));
        assert!(html.contains("404 Not Found"));
        assert!(html.contains("Upstream returned 404"));
        assert!(html.contains(r#"id="cooked-theme-toggle""#));
    }

    #[test]
    fn title_falls_back_to_filename() {
        let headings = vec![];
        let mut data = sample_page(&headings);
        data.title = None;
        let html = String::from_utf8(renderer().render_page(&data, "", "")).unwrap();
        assert!(html.contains("<title>README.md — cooked</title>"));
    }

    #[test]
    fn long_urls_are_truncated_for_display() {
        let url = format!("https://host/{}", "x".repeat(200));
        let truncated = truncate_url(&url, 80);
        assert_eq!(truncated.chars().count(), 80);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncate_url("short", 80), "short");
    }

    #[test]
    fn file_sizes_format_humanely() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(2048), "2.0 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn relative_time_handles_unparseable_input() {
        assert_eq!(format_relative_time("not a date"), "not a date");
    }
}
