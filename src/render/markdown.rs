//! CommonMark + GFM rendering through comrak, with metadata extraction
//! and post-processing of fenced code blocks into the cooked envelope.

use comrak::nodes::{AstNode, NodeHtmlBlock, NodeValue};
use comrak::{format_html, parse_document, Anchorizer, Arena, Options};
use syntect::parsing::SyntaxSet;

use super::code::{highlight, wrap_code_block};
use super::{escape_html, DocumentMeta, Heading, RenderError};

/// Renders markdown (and preprocessed MDX) to HTML.
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
        }
    }

    pub fn render(&self, source: &[u8]) -> Result<(Vec<u8>, DocumentMeta), RenderError> {
        self.render_str(&String::from_utf8_lossy(source))
    }

    pub fn render_str(&self, source: &str) -> Result<(Vec<u8>, DocumentMeta), RenderError> {
        let options = markdown_options();
        let arena = Arena::new();
        let root = parse_document(&arena, source, &options);

        let meta = extract_meta(root);
        self.rewrite_code_blocks(root)?;

        let mut html = Vec::new();
        format_html(root, &options, &mut html)
            .map_err(|e| RenderError::Markdown(e.to_string()))?;
        Ok((html, meta))
    }

    /// Replaces fenced code blocks in the AST with pre-rendered HTML:
    /// mermaid blocks become `<div class="mermaid">` for the client-side
    /// script, everything else is highlighted and wrapped.
    fn rewrite_code_blocks<'a>(&self, root: &'a AstNode<'a>) -> Result<(), RenderError> {
        for node in root.descendants() {
            let replacement = {
                let data = node.data.borrow();
                match &data.value {
                    NodeValue::CodeBlock(cb) if cb.fenced => {
                        let language = cb.info.split_whitespace().next().unwrap_or("");
                        if language == "mermaid" {
                            Some(format!(
                                "<div class=\"mermaid\">\n{}</div>\n",
                                escape_html(&cb.literal)
                            ))
                        } else {
                            let highlighted =
                                highlight(&self.syntax_set, &cb.literal, language)?;
                            let mut block = wrap_code_block(&highlighted, language, None);
                            block.push('\n');
                            Some(block)
                        }
                    }
                    _ => None,
                }
            };

            if let Some(literal) = replacement {
                node.data.borrow_mut().value = NodeValue::HtmlBlock(NodeHtmlBlock {
                    block_type: 0,
                    literal,
                });
            }
        }
        Ok(())
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn markdown_options() -> Options<'static> {
    let mut options = Options::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.tasklist = true;
    options.extension.autolink = true;
    options.extension.footnotes = true;
    options.extension.description_lists = true;
    options.extension.front_matter_delimiter = Some("---".to_string());
    options.extension.header_ids = Some(String::new());
    options.parse.smart = true;
    // Raw HTML passes through here; the sanitizer strips anything unsafe
    // before the page is assembled.
    options.render.unsafe_ = true;
    options
}

/// Walks the parsed tree for the title, headings (with the same anchor
/// slugs the renderer will emit), fenced-block count, and mermaid flag.
fn extract_meta<'a>(root: &'a AstNode<'a>) -> DocumentMeta {
    let mut meta = DocumentMeta::default();
    let mut anchorizer = Anchorizer::new();

    for node in root.descendants() {
        let data = node.data.borrow();
        match &data.value {
            NodeValue::FrontMatter(raw) => {
                if meta.title.is_none() {
                    meta.title = frontmatter_title(raw);
                }
            }
            NodeValue::Heading(heading) => {
                let text = collect_text(node);
                let id = anchorizer.anchorize(text.clone());
                if meta.title.is_none() && heading.level == 1 {
                    meta.title = Some(text.clone());
                }
                meta.heading_count += 1;
                meta.headings.push(Heading {
                    level: heading.level,
                    text,
                    id,
                });
            }
            NodeValue::CodeBlock(cb) if cb.fenced => {
                if cb.info.split_whitespace().next() == Some("mermaid") {
                    meta.has_mermaid = true;
                } else {
                    meta.code_block_count += 1;
                }
            }
            _ => {}
        }
    }

    meta
}

fn collect_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut text = String::new();
    for child in node.descendants().skip(1) {
        let data = child.data.borrow();
        match &data.value {
            NodeValue::Text(t) => text.push_str(t),
            NodeValue::Code(c) => text.push_str(&c.literal),
            NodeValue::SoftBreak | NodeValue::LineBreak => text.push(' '),
            _ => {}
        }
    }
    text
}

/// Pulls a `title:` value out of raw frontmatter text, trimming matching
/// quotes.
fn frontmatter_title(raw: &str) -> Option<String> {
    for line in raw.lines() {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("title:") {
            let title = value.trim().trim_matches(|c| c == '"' || c == '\'');
            if !title.is_empty() {
                return Some(title.to_string());
            }
        }
    }
    None
}
