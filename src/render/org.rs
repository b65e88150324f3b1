//! Minimal Org-mode-to-HTML conversion: headlines, paragraphs, lists,
//! source/example blocks, links, and basic inline markup. Top-level `*`
//! headlines map to `<h1>`.

use once_cell::sync::Lazy;
use regex::Regex;
use syntect::parsing::SyntaxSet;

use super::code::{highlight, wrap_code_block};
use super::{escape_html, slugify, DocumentMeta, Heading, RenderError};

static LINK_DESC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\]\[]+)\]\[([^\]\[]+)\]\]").unwrap());
static LINK_BARE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[([^\]\[]+)\]\]").unwrap());
static BOLD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*\n]+)\*").unwrap());
static ITALIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|\s)/([^/\n]+)/(?:\s|$)").unwrap());
static CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[~=]([^~=\n]+)[~=]").unwrap());

pub struct OrgRenderer {
    syntax_set: SyntaxSet,
}

impl OrgRenderer {
    pub fn new() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
        }
    }

    pub fn render(&self, source: &[u8]) -> Result<(Vec<u8>, DocumentMeta), RenderError> {
        let text = String::from_utf8_lossy(source);
        let lines: Vec<&str> = text.lines().collect();

        let mut out = String::new();
        let mut meta = DocumentMeta::default();
        let mut paragraph: Vec<&str> = Vec::new();
        let mut in_list = false;

        let mut i = 0;
        while i < lines.len() {
            let line = lines[i];
            let trimmed = line.trim_end();
            let lower = trimmed.to_ascii_lowercase();

            if let Some(title) = lower
                .starts_with("#+title:")
                .then(|| trimmed[8..].trim())
                .filter(|t| !t.is_empty())
            {
                meta.title = Some(title.to_string());
                i += 1;
                continue;
            }

            if lower.starts_with("#+begin_src") {
                flush_paragraph(&mut out, &mut paragraph);
                close_list(&mut out, &mut in_list);
                let lang = trimmed[11..].split_whitespace().next().unwrap_or("").to_string();
                let mut body = String::new();
                i += 1;
                while i < lines.len()
                    && !lines[i].trim().to_ascii_lowercase().starts_with("#+end_src")
                {
                    body.push_str(lines[i]);
                    body.push('\n');
                    i += 1;
                }
                i += 1;
                meta.code_block_count += 1;
                let highlighted = highlight(&self.syntax_set, &body, &lang)?;
                out.push_str(&wrap_code_block(&highlighted, &lang, None));
                out.push('\n');
                continue;
            }

            if lower.starts_with("#+begin_example") {
                flush_paragraph(&mut out, &mut paragraph);
                close_list(&mut out, &mut in_list);
                let mut body = String::new();
                i += 1;
                while i < lines.len()
                    && !lines[i].trim().to_ascii_lowercase().starts_with("#+end_example")
                {
                    body.push_str(lines[i]);
                    body.push('\n');
                    i += 1;
                }
                i += 1;
                out.push_str("<pre><code>");
                out.push_str(&escape_html(&body));
                out.push_str("</code></pre>\n");
                continue;
            }

            // Other keyword lines (#+OPTIONS, #+AUTHOR, ...) are dropped.
            if trimmed.starts_with("#+") {
                i += 1;
                continue;
            }

            // Headlines: one star per level, star run followed by a space.
            if trimmed.starts_with('*') {
                let level = trimmed.chars().take_while(|&c| c == '*').count();
                if level <= 6 && trimmed.as_bytes().get(level) == Some(&b' ') {
                    let heading_text = trimmed[level..].trim();
                    flush_paragraph(&mut out, &mut paragraph);
                    close_list(&mut out, &mut in_list);
                    let id = slugify(heading_text);
                    if meta.title.is_none() {
                        meta.title = Some(heading_text.to_string());
                    }
                    meta.heading_count += 1;
                    meta.headings.push(Heading {
                        level: level as u8,
                        text: heading_text.to_string(),
                        id: id.clone(),
                    });
                    out.push_str(&format!(
                        "<h{level} id=\"{id}\">{}</h{level}>\n",
                        inline(heading_text)
                    ));
                    i += 1;
                    continue;
                }
            }

            let item = trimmed
                .trim_start()
                .strip_prefix("- ")
                .or_else(|| trimmed.trim_start().strip_prefix("+ "));
            if let Some(item) = item {
                flush_paragraph(&mut out, &mut paragraph);
                if !in_list {
                    out.push_str("<ul>\n");
                    in_list = true;
                }
                out.push_str(&format!("<li>{}</li>\n", inline(item.trim())));
                i += 1;
                continue;
            }

            if trimmed.is_empty() {
                flush_paragraph(&mut out, &mut paragraph);
                close_list(&mut out, &mut in_list);
            } else {
                paragraph.push(trimmed);
            }
            i += 1;
        }

        flush_paragraph(&mut out, &mut paragraph);
        close_list(&mut out, &mut in_list);
        Ok((out.into_bytes(), meta))
    }
}

impl Default for OrgRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn close_list(out: &mut String, in_list: &mut bool) {
    if *in_list {
        out.push_str("</ul>\n");
        *in_list = false;
    }
}

fn flush_paragraph(out: &mut String, paragraph: &mut Vec<&str>) {
    if paragraph.is_empty() {
        return;
    }
    out.push_str("<p>");
    out.push_str(&inline(&paragraph.join(" ")));
    out.push_str("</p>\n");
    paragraph.clear();
}

fn inline(text: &str) -> String {
    let escaped = escape_html(text);
    let linked = LINK_DESC_RE.replace_all(&escaped, "<a href=\"$1\">$2</a>");
    let linked = LINK_BARE_RE.replace_all(&linked, "<a href=\"$1\">$1</a>");
    let coded = CODE_RE.replace_all(&linked, "<code>$1</code>");
    let bolded = BOLD_RE.replace_all(&coded, "<strong>$1</strong>");
    ITALIC_RE
        .replace_all(&bolded, |caps: &regex::Captures| {
            format!(" <em>{}</em> ", &caps[1])
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(source: &str) -> (String, DocumentMeta) {
        let renderer = OrgRenderer::new();
        let (html, meta) = renderer.render(source.as_bytes()).unwrap();
        (String::from_utf8(html).unwrap(), meta)
    }

    #[test]
    fn title_keyword_wins_over_headline() {
        let (_, meta) = render("#+TITLE: Project Notes\n\n* First Headline\n");
        assert_eq!(meta.title.as_deref(), Some("Project Notes"));
    }

    #[test]
    fn first_headline_is_fallback_title() {
        let (html, meta) = render("* Overview\n\nsome text\n");
        assert_eq!(meta.title.as_deref(), Some("Overview"));
        assert!(html.contains("<h1 id=\"overview\">Overview</h1>"));
    }

    #[test]
    fn headline_levels_map_to_heading_tags() {
        let (html, meta) = render("* One\n** Two\n*** Three\n");
        assert!(html.contains("<h1"));
        assert!(html.contains("<h2"));
        assert!(html.contains("<h3"));
        assert_eq!(meta.heading_count, 3);
    }

    #[test]
    fn src_blocks_are_highlighted() {
        let (html, meta) = render("#+BEGIN_SRC python\nx = 1\n#+END_SRC\n");
        assert_eq!(meta.code_block_count, 1);
        assert!(html.contains(r#"data-language="python""#));
        assert!(html.contains("cooked-code-block"));
    }

    #[test]
    fn example_blocks_are_preformatted() {
        let (html, _) = render("#+BEGIN_EXAMPLE\nliteral <text>\n#+END_EXAMPLE\n");
        assert!(html.contains("<pre><code>literal &lt;text&gt;\n</code></pre>"));
    }

    #[test]
    fn lists_and_links() {
        let (html, _) = render("- item one\n- see [[https://example.com][the site]]\n");
        assert!(html.contains("<ul>"));
        assert!(html.contains("<li>item one</li>"));
        assert!(html.contains("<a href=\"https://example.com\">the site</a>"));
    }

    #[test]
    fn keyword_lines_are_dropped() {
        let (html, _) = render("#+OPTIONS: toc:nil\n#+AUTHOR: someone\n\ntext\n");
        assert!(!html.contains("OPTIONS"));
        assert!(!html.contains("AUTHOR"));
        assert!(html.contains("<p>text</p>"));
    }

    #[test]
    fn inline_markup() {
        let (html, _) = render("mix of *bold* and ~verbatim~ text\n");
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<code>verbatim</code>"));
    }
}
