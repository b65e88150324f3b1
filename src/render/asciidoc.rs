//! Minimal AsciiDoc-to-HTML conversion covering the subset that shows up
//! in raw-hosted docs: section titles, paragraphs, bullet/numbered lists,
//! source and literal blocks, links, and basic inline markup. `include::`
//! directives are dropped — remote documents cannot resolve local files.

use once_cell::sync::Lazy;
use regex::Regex;
use syntect::parsing::SyntaxSet;

use super::code::{highlight, wrap_code_block};
use super::{escape_html, slugify, DocumentMeta, Heading, RenderError};

static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(https?://[^\s\[\]]+)\[([^\]]*)\]").unwrap());
static BOLD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*\n]+)\*").unwrap());
static ITALIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b_([^_\n]+)_\b").unwrap());
static CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`\n]+)`").unwrap());

pub struct AsciidocRenderer {
    syntax_set: SyntaxSet,
}

impl AsciidocRenderer {
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
        let mut list: Option<&'static str> = None;
        let mut pending_lang: Option<String> = None;

        let mut i = 0;
        while i < lines.len() {
            let line = lines[i];
            let trimmed = line.trim_end();

            if trimmed.starts_with("include::") || trimmed.starts_with("//") {
                i += 1;
                continue;
            }

            // [source,lang] attribute line announcing a listing block.
            if let Some(rest) = trimmed.strip_prefix("[source") {
                flush_paragraph(&mut out, &mut paragraph);
                close_list(&mut out, &mut list);
                pending_lang = Some(
                    rest.trim_start_matches(',')
                        .trim_end_matches(']')
                        .trim()
                        .to_string(),
                );
                i += 1;
                continue;
            }

            if trimmed == "----" {
                flush_paragraph(&mut out, &mut paragraph);
                close_list(&mut out, &mut list);
                let mut body = String::new();
                i += 1;
                while i < lines.len() && lines[i].trim_end() != "----" {
                    body.push_str(lines[i]);
                    body.push('\n');
                    i += 1;
                }
                i += 1; // closing delimiter
                match pending_lang.take() {
                    Some(lang) => {
                        meta.code_block_count += 1;
                        let highlighted = highlight(&self.syntax_set, &body, &lang)?;
                        out.push_str(&wrap_code_block(&highlighted, &lang, None));
                        out.push('\n');
                    }
                    None => {
                        out.push_str("<pre><code>");
                        out.push_str(&escape_html(&body));
                        out.push_str("</code></pre>\n");
                    }
                }
                continue;
            }

            // Section titles: "= Doc Title", "== Section", ...
            if trimmed.starts_with('=') {
                let level = trimmed.chars().take_while(|&c| c == '=').count();
                let heading_text = trimmed[level..].trim();
                if level <= 6 && !heading_text.is_empty() && trimmed.as_bytes().get(level) == Some(&b' ') {
                    flush_paragraph(&mut out, &mut paragraph);
                    close_list(&mut out, &mut list);
                    let id = slugify(heading_text);
                    if meta.title.is_none() && level == 1 {
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

            if let Some(item) = trimmed.strip_prefix("* ").or_else(|| trimmed.strip_prefix("** ")) {
                flush_paragraph(&mut out, &mut paragraph);
                open_list(&mut out, &mut list, "ul");
                out.push_str(&format!("<li>{}</li>\n", inline(item.trim())));
                i += 1;
                continue;
            }
            if let Some(item) = trimmed.strip_prefix(". ") {
                flush_paragraph(&mut out, &mut paragraph);
                open_list(&mut out, &mut list, "ol");
                out.push_str(&format!("<li>{}</li>\n", inline(item.trim())));
                i += 1;
                continue;
            }

            if trimmed.is_empty() {
                flush_paragraph(&mut out, &mut paragraph);
                close_list(&mut out, &mut list);
            } else {
                paragraph.push(trimmed);
            }
            i += 1;
        }

        flush_paragraph(&mut out, &mut paragraph);
        close_list(&mut out, &mut list);
        Ok((out.into_bytes(), meta))
    }
}

impl Default for AsciidocRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn open_list(out: &mut String, list: &mut Option<&'static str>, tag: &'static str) {
    match list {
        Some(current) if *current == tag => {}
        _ => {
            close_list(out, list);
            out.push_str(&format!("<{tag}>\n"));
            *list = Some(tag);
        }
    }
}

fn close_list(out: &mut String, list: &mut Option<&'static str>) {
    if let Some(tag) = list.take() {
        out.push_str(&format!("</{tag}>\n"));
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

/// Inline markup on HTML-escaped text: links, monospace, bold, italic.
fn inline(text: &str) -> String {
    let escaped = escape_html(text);
    let linked = LINK_RE.replace_all(&escaped, |caps: &regex::Captures| {
        let url = &caps[1];
        let label = if caps[2].is_empty() { url } else { &caps[2] };
        format!("<a href=\"{url}\">{label}</a>")
    });
    let coded = CODE_RE.replace_all(&linked, "<code>$1</code>");
    let bolded = BOLD_RE.replace_all(&coded, "<strong>$1</strong>");
    ITALIC_RE.replace_all(&bolded, "<em>$1</em>").into_owned()
}
