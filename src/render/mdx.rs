//! MDX preprocessing: strips the JSX layer so the markdown renderer can
//! handle the rest. Heuristic by design — import/export lines go away,
//! component tags are elided (promoting a label/title/value attribute to a
//! bold line when present), and `{…}` expressions are removed. Fenced code
//! blocks are left untouched so JSX-looking code samples survive.

use once_cell::sync::Lazy;
use regex::Regex;

static IMPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^import\s+(?:(?:\{[^}]*\}|\w+|\*\s+as\s+\w+)\s+from\s+)?['"][^'"]+['"];?\s*$"#)
        .unwrap()
});

static EXPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^export\s+(?:default\s+|const\s+|let\s+|function\s+|class\s+)").unwrap());

static SELF_CLOSING_JSX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[A-Z]\w*\s*[^>]*/\s*>").unwrap());

static JSX_EXPR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^{}]*\}").unwrap());

static CONTAINER_OPEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<([A-Z]\w*)\s*([^>]*)>").unwrap());

static CONTAINER_CLOSE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"</[A-Z]\w*>").unwrap());

static LABEL_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:label|title|value)\s*=\s*(?:"([^"]*)"|'([^']*)'|\{[^}]*\})"#).unwrap()
});

fn is_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

/// Transforms MDX into markdown the renderer can parse. The leading
/// frontmatter block is preserved verbatim.
pub fn preprocess(source: &str) -> String {
    let stripped = strip_import_export(source, true);
    let transformed = transform_outside_fences(&stripped);
    // JSX removal can expose import/export lines that were wrapped in
    // components; sweep them again.
    strip_import_export(&transformed, false)
}

/// Removes import/export declaration lines outside fenced code blocks.
/// When `keep_frontmatter` is set, a leading `---` block passes through
/// untouched.
fn strip_import_export(source: &str, keep_frontmatter: bool) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut in_frontmatter = false;
    let mut in_fence = false;

    for (i, line) in source.split('\n').enumerate() {
        let trimmed = line.trim();

        if keep_frontmatter && i == 0 && trimmed == "---" {
            in_frontmatter = true;
            out.push(line);
            continue;
        }
        if in_frontmatter {
            out.push(line);
            if trimmed == "---" {
                in_frontmatter = false;
            }
            continue;
        }

        if is_fence(line) {
            in_fence = !in_fence;
            out.push(line);
            continue;
        }
        if in_fence {
            out.push(line);
            continue;
        }

        if IMPORT_RE.is_match(trimmed) || EXPORT_RE.is_match(trimmed) {
            continue;
        }
        out.push(line);
    }

    out.join("\n")
}

/// Applies the JSX tag and expression stripping to narrative text only,
/// copying fenced code blocks through verbatim.
fn transform_outside_fences(source: &str) -> String {
    let mut out_lines: Vec<String> = Vec::new();
    let mut narrative: Vec<&str> = Vec::new();
    let mut in_fence = false;

    fn flush(narrative: &mut Vec<&str>, out_lines: &mut Vec<String>) {
        if narrative.is_empty() {
            return;
        }
        let transformed = transform_chunk(&narrative.join("\n"));
        out_lines.extend(transformed.split('\n').map(str::to_string));
        narrative.clear();
    }

    for line in source.split('\n') {
        if is_fence(line) {
            if !in_fence {
                flush(&mut narrative, &mut out_lines);
            }
            in_fence = !in_fence;
            out_lines.push(line.to_string());
        } else if in_fence {
            out_lines.push(line.to_string());
        } else {
            narrative.push(line);
        }
    }
    flush(&mut narrative, &mut out_lines);

    out_lines.join("\n")
}

fn transform_chunk(chunk: &str) -> String {
    let chunk = SELF_CLOSING_JSX_RE.replace_all(chunk, "");
    let chunk = process_container_tags(&chunk);
    JSX_EXPR_RE.replace_all(&chunk, "").into_owned()
}

/// Strips JSX container tags. Opening tags carrying a label/title/value
/// attribute are promoted to a bold line so section structure survives.
fn process_container_tags(content: &str) -> String {
    let content = CONTAINER_OPEN_RE.replace_all(content, |caps: &regex::Captures| {
        if let Some(attr) = LABEL_ATTR_RE.captures(&caps[0]) {
            let label = attr
                .get(1)
                .or_else(|| attr.get(2))
                .map(|m| m.as_str())
                .unwrap_or("");
            if !label.is_empty() {
                return format!("\n**{label}**\n");
            }
        }
        String::new()
    });
    CONTAINER_CLOSE_RE.replace_all(&content, "").into_owned()
}
