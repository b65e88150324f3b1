//! Content rendering: format detection and the per-format renderers that
//! turn raw upstream bytes into HTML fragments.

pub mod asciidoc;
pub mod code;
pub mod markdown;
pub mod mdx;
pub mod org;

mod detect;

pub use asciidoc::AsciidocRenderer;
pub use code::{render_plaintext, CodeRenderer};
pub use detect::{detect_file, is_markdown_link, ContentType, FileInfo};
pub use markdown::MarkdownRenderer;
pub use org::OrgRenderer;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("render markdown: {0}")]
    Markdown(String),

    #[error("highlight code: {0}")]
    Highlight(#[from] syntect::Error),
}

/// Metadata extracted while rendering a document, used by the page
/// template for the title, TOC, and `data-*` test hooks.
#[derive(Debug, Default, Clone)]
pub struct DocumentMeta {
    pub title: Option<String>,
    pub heading_count: usize,
    pub code_block_count: usize,
    pub has_mermaid: bool,
    pub headings: Vec<Heading>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: u8,
    pub text: String,
    pub id: String,
}

/// Decodes upstream body bytes to a string, honoring the charset parameter
/// of the upstream Content-Type when present. Unknown labels fall back to
/// UTF-8 with lossy replacement.
pub fn decode_body(bytes: &[u8], content_type: &str) -> String {
    let label = extract_charset(content_type).unwrap_or_else(|| "utf-8".to_string());
    let encoding =
        encoding_rs::Encoding::for_label(label.as_bytes()).unwrap_or(encoding_rs::UTF_8);
    if encoding == encoding_rs::UTF_8 {
        return String::from_utf8_lossy(bytes).into_owned();
    }
    let (decoded, _, _) = encoding.decode(bytes);
    decoded.into_owned()
}

fn extract_charset(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let lower = param.trim().to_ascii_lowercase();
        let value = lower.strip_prefix("charset=")?.trim().trim_matches('"');
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    })
}

pub(crate) fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// GitHub-style anchor slug: lowercased, alphanumerics kept, runs of
/// whitespace and hyphens collapsed to a single hyphen.
pub(crate) fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            for lc in c.to_lowercase() {
                out.push(lc);
            }
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_hyphen = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_body_honors_charset_parameter() {
        let (shift_jis, _, _) = encoding_rs::SHIFT_JIS.encode("テスト");
        assert_eq!(
            decode_body(&shift_jis, "text/plain; charset=Shift_JIS"),
            "テスト"
        );
        assert_eq!(decode_body("plain".as_bytes(), "text/plain"), "plain");
        assert_eq!(
            decode_body("日本語".as_bytes(), "text/markdown; charset=utf-8"),
            "日本語"
        );
    }

    #[test]
    fn decode_body_falls_back_on_unknown_charset() {
        assert_eq!(
            decode_body(b"hello", "text/plain; charset=not-a-charset"),
            "hello"
        );
    }

    #[test]
    fn escape_html_covers_specials() {
        assert_eq!(
            escape_html(r#"<a href="x">&'"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn slugify_matches_github_style() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Getting Started!"), "getting-started");
        assert_eq!(slugify("A  -  B"), "a-b");
        assert_eq!(slugify("Déjà Vu"), "déjà-vu");
    }
}
