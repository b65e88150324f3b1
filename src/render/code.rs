//! Syntax-highlighted rendering of standalone code files, plus the shared
//! code-block wrapper used by the markdown pipeline.

use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use super::{escape_html, RenderError};

/// Renders source files as highlighted, pre-formatted blocks.
pub struct CodeRenderer {
    syntax_set: SyntaxSet,
}

impl CodeRenderer {
    pub fn new() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
        }
    }

    /// Highlights `source` using the lexer for `language` (falling back to
    /// plain text when the token is empty or unknown) and wraps it in the
    /// code-block envelope with a line count.
    pub fn render(&self, source: &[u8], language: &str) -> Result<Vec<u8>, RenderError> {
        let code = String::from_utf8_lossy(source);
        let line_count = count_lines(source);
        let highlighted = highlight(&self.syntax_set, &code, language)?;
        Ok(wrap_code_block(&highlighted, language, Some(line_count)).into_bytes())
    }
}

impl Default for CodeRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Tokenizes `code` into HTML spans carrying scope classes (no inline
/// styles; the page template ships the matching theme CSS).
pub(crate) fn highlight(
    syntax_set: &SyntaxSet,
    code: &str,
    language: &str,
) -> Result<String, RenderError> {
    let syntax = Some(language)
        .filter(|l| !l.is_empty())
        .and_then(|l| syntax_set.find_syntax_by_token(l))
        .unwrap_or_else(|| syntax_set.find_syntax_plain_text());

    let mut generator =
        ClassedHTMLGenerator::new_with_class_style(syntax, syntax_set, ClassStyle::Spaced);
    for line in LinesWithEndings::from(code) {
        generator.parse_html_for_line_which_includes_newline(line)?;
    }
    Ok(generator.finalize())
}

/// Wraps highlighted HTML in the `cooked-code-block` envelope: a header
/// with the language badge and copy button, then the untouched
/// `<pre><code>` body.
pub(crate) fn wrap_code_block(
    highlighted: &str,
    language: &str,
    line_count: Option<usize>,
) -> String {
    let mut out = String::with_capacity(highlighted.len() + 256);
    out.push_str(&format!(
        r#"<div class="cooked-code-block" data-language="{}""#,
        escape_html(language)
    ));
    if let Some(n) = line_count {
        out.push_str(&format!(r#" data-line-count="{n}""#));
    }
    out.push_str(">\n  <div class=\"cooked-code-header\">\n");
    out.push_str(&format!(
        "    <span class=\"cooked-code-language\">{}</span>\n",
        escape_html(language)
    ));
    out.push_str("    <button class=\"cooked-copy-btn\" data-state=\"idle\">Copy</button>\n");
    out.push_str("  </div>\n");
    out.push_str("<pre class=\"highlight\"><code>");
    out.push_str(highlighted);
    out.push_str("</code></pre>\n</div>");
    out
}

/// Escapes plain text and wraps it in `<pre><code>`.
pub fn render_plaintext(source: &[u8]) -> Vec<u8> {
    let mut out = String::with_capacity(source.len() + 32);
    out.push_str("<pre><code>");
    out.push_str(&escape_html(&String::from_utf8_lossy(source)));
    out.push_str("</code></pre>");
    out.into_bytes()
}

/// Newline count, plus one for a trailing partial line. Empty input has
/// zero lines.
fn count_lines(source: &[u8]) -> usize {
    if source.is_empty() {
        return 0;
    }
    let newlines = source.iter().filter(|&&b| b == b'\n').count();
    if source[source.len() - 1] == b'\n' {
        newlines
    } else {
        newlines + 1
    }
}
