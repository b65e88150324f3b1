//! Inline CSS for the rendered page: theme scoping of the embedded
//! github-markdown stylesheets, prefixing of the highlighter CSS, and the
//! cooked layout rules.

use std::fmt::Write;

/// Inline SVG favicon, pre-encoded for a data: URL.
pub(super) const FAVICON_SVG: &str = "%3Csvg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'%3E%3Ctext y='.9em' font-size='90'%3E%F0%9F%8D%B3%3C/text%3E%3C/svg%3E";

/// Prefixes every `.markdown-body` selector in the embedded theme CSS with
/// a theme scope, e.g. `[data-theme="light"] .markdown-body hr { ... }`.
/// Wrapping the whole sheet in a block would nest selectors and produce
/// rules that never match.
pub(super) fn prefix_theme_css(css: &str, theme_selector: &str) -> String {
    css.replace(".markdown-body", &format!("{theme_selector} .markdown-body"))
}

/// Prefixes every top-level class selector in the syntect-generated
/// highlight CSS with a theme scope.
pub(super) fn prefix_highlight_css(css: &str, theme_selector: &str) -> String {
    css.lines()
        .map(|line| {
            if line.starts_with('.') {
                format!("{theme_selector} {line}")
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub(super) fn write_theme_css(
    out: &mut String,
    light_css: &str,
    dark_css: &str,
    highlight_light: &str,
    highlight_dark: &str,
) {
    let _ = writeln!(out, "    /* Theme: light */");
    let _ = writeln!(out, "    [data-theme=\"light\"] {{ color-scheme: light; }}");
    if !light_css.is_empty() {
        out.push_str(&prefix_theme_css(light_css, "[data-theme=\"light\"]"));
    }
    out.push_str(&prefix_highlight_css(highlight_light, "[data-theme=\"light\"]"));
    out.push('\n');

    let _ = writeln!(out, "    /* Theme: dark */");
    let _ = writeln!(out, "    [data-theme=\"dark\"] {{ color-scheme: dark; }}");
    if !dark_css.is_empty() {
        out.push_str(&prefix_theme_css(dark_css, "[data-theme=\"dark\"]"));
    }
    out.push_str(&prefix_highlight_css(highlight_dark, "[data-theme=\"dark\"]"));
    out.push('\n');

    // Auto theme follows the system preference.
    let _ = writeln!(out, "    /* Theme: auto (system preference) */");
    let _ = writeln!(out, "    [data-theme=\"auto\"] {{ color-scheme: light dark; }}");
    if !light_css.is_empty() {
        out.push_str(&prefix_theme_css(light_css, "[data-theme=\"auto\"]"));
    }
    out.push_str(&prefix_highlight_css(highlight_light, "[data-theme=\"auto\"]"));
    out.push('\n');

    let _ = writeln!(out, "    @media (prefers-color-scheme: dark) {{");
    let _ = writeln!(out, "      [data-theme=\"auto\"] {{ color-scheme: dark; }}");
    if !dark_css.is_empty() {
        out.push_str(&prefix_theme_css(dark_css, "[data-theme=\"auto\"]"));
    }
    out.push_str(&prefix_highlight_css(highlight_dark, "[data-theme=\"auto\"]"));
    let _ = writeln!(out, "\n    }}");
}

pub(super) fn write_layout_css(out: &mut String) {
    out.push_str(LAYOUT_CSS);
}

const LAYOUT_CSS: &str = r#"
    /* cooked layout */
    * { box-sizing: border-box; }
    body { margin: 0; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif; }

    #cooked-header {
      position: sticky; top: 0; z-index: 100;
      display: flex; align-items: center; justify-content: space-between;
      padding: 4px 16px; font-size: 12px;
      border-bottom: 1px solid rgba(128,128,128,0.2);
      background: rgba(246,248,250,0.95); color: #656d76;
    }
    [data-theme="dark"] #cooked-header {
      background: rgba(22,27,34,0.95); color: #8b949e;
    }
    @media (prefers-color-scheme: dark) {
      [data-theme="auto"] #cooked-header {
        background: rgba(22,27,34,0.95); color: #8b949e;
      }
    }

    .cooked-meta { display: flex; align-items: center; gap: 8px; overflow: hidden; flex: 1; }
    .cooked-meta a { color: inherit; text-decoration: none; overflow: hidden; text-overflow: ellipsis; white-space: nowrap; }
    .cooked-meta a:hover { text-decoration: underline; }
    .cooked-meta span, .cooked-meta time { white-space: nowrap; }
    .cooked-controls { display: flex; gap: 4px; }
    .cooked-controls button {
      background: none; border: 1px solid rgba(128,128,128,0.3); border-radius: 4px;
      cursor: pointer; padding: 2px 6px; font-size: 14px; color: inherit;
    }
    .cooked-controls button:hover { background: rgba(128,128,128,0.1); }

    main { max-width: 1012px; margin: 0 auto; padding: 32px 16px; }
    .markdown-body {
      font-size: 16px; line-height: 1.5; word-wrap: break-word;
      border: 1px solid #d0d7de; border-radius: 6px;
      padding: 32px 40px;
    }
    [data-theme="dark"] .markdown-body { border-color: #30363d; }
    @media (prefers-color-scheme: dark) {
      [data-theme="auto"] .markdown-body { border-color: #30363d; }
    }

    #cooked-toc {
      position: fixed; top: 32px; left: 0; bottom: 0; width: 280px;
      overflow-y: auto; padding: 16px; font-size: 13px;
      background: rgba(246,248,250,0.98); border-right: 1px solid rgba(128,128,128,0.2);
      z-index: 50;
    }
    [data-theme="dark"] #cooked-toc {
      background: rgba(22,27,34,0.98); border-color: rgba(128,128,128,0.2);
    }
    @media (prefers-color-scheme: dark) {
      [data-theme="auto"] #cooked-toc {
        background: rgba(22,27,34,0.98);
      }
    }
    #cooked-toc ul { list-style: none; padding: 0; margin: 0; }
    #cooked-toc li { padding: 2px 0; }
    #cooked-toc li[data-level="2"] { padding-left: 12px; }
    #cooked-toc li[data-level="3"] { padding-left: 24px; }
    #cooked-toc li[data-level="4"] { padding-left: 36px; }
    #cooked-toc li[data-level="5"] { padding-left: 48px; }
    #cooked-toc li[data-level="6"] { padding-left: 60px; }
    #cooked-toc a { color: inherit; text-decoration: none; }
    #cooked-toc a:hover { text-decoration: underline; }
    #cooked-toc li.active > a { color: #0969da; font-weight: 600; }
    [data-theme="dark"] #cooked-toc li.active > a { color: #58a6ff; }
    @media (prefers-color-scheme: dark) {
      [data-theme="auto"] #cooked-toc li.active > a { color: #58a6ff; }
    }

    .cooked-code-block {
      position: relative; margin: 16px 0;
      border: 1px solid #d0d7de; border-radius: 6px; overflow: hidden;
    }
    .cooked-code-block pre { margin: 0 !important; border-radius: 0 !important; border: none !important; }
    .cooked-code-block pre code { padding: 16px !important; display: block; overflow-x: auto; }
    .cooked-code-block pre.highlight { background: #f8f8f8; }
    [data-theme="dark"] .cooked-code-block pre.highlight { background: #1e1e1e; }
    @media (prefers-color-scheme: dark) {
      [data-theme="auto"] .cooked-code-block pre.highlight { background: #1e1e1e; }
    }
    .cooked-code-header {
      display: flex; justify-content: flex-end; align-items: center; gap: 8px;
      padding: 4px 12px; font-size: 12px; color: #656d76;
      background: #f6f8fa; border-bottom: 1px solid #d0d7de;
    }
    .cooked-copy-btn {
      background: none; border: 1px solid rgba(128,128,128,0.3); border-radius: 4px;
      cursor: pointer; padding: 2px 8px; font-size: 11px; color: inherit;
    }
    .cooked-copy-btn:hover { background: rgba(128,128,128,0.15); }
    [data-theme="dark"] .cooked-code-block { border-color: #30363d; }
    [data-theme="dark"] .cooked-code-header { background: #161b22; border-color: #30363d; color: #8b949e; }
    @media (prefers-color-scheme: dark) {
      [data-theme="auto"] .cooked-code-block { border-color: #30363d; }
      [data-theme="auto"] .cooked-code-header { background: #161b22; border-color: #30363d; color: #8b949e; }
    }

    .mermaid { display: flex; justify-content: center; margin: 16px 0; }

    #cooked-error {
      text-align: center; padding: 80px 16px;
    }
    #cooked-error h1 { font-size: 48px; margin: 0 0 16px; color: #656d76; }
    #cooked-error p { color: #656d76; font-size: 16px; }
    #cooked-error a { color: #0969da; }

    @media print {
      #cooked-header, #cooked-toc { display: none !important; }
      .cooked-code-header { display: none !important; }
      .cooked-copy-btn { display: none !important; }
      main { max-width: 100%; padding: 0; }
      .markdown-body {
        max-width: 100%; padding: 0;
        border: none; border-radius: 0;
        font-size: 12px;
      }
      .markdown-body h1 { font-size: 1.6em; }
      .markdown-body h2 { font-size: 1.3em; }
      .markdown-body h3 { font-size: 1.15em; }
      .cooked-code-block { border: 1px solid #ccc; border-radius: 0; break-inside: avoid; }
      .cooked-code-block pre code {
        white-space: pre-wrap !important;
        word-break: break-all;
        font-size: 10px !important;
        padding: 8px !important;
      }
      .markdown-body img { max-width: 100%; max-height: 300px; object-fit: contain; }
      html { color: #000 !important; background: #fff !important; }
      .markdown-body { color: #000 !important; background: #fff !important; }
      h1, h2, h3, h4, h5, h6 { break-after: avoid; }
    }

    @media (max-width: 768px) {
      #cooked-toc { width: 100%; }
      main { padding: 16px 8px; }
      .markdown-body { padding: 16px; border-radius: 0; border-left: 0; border-right: 0; }
    }
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_prefix_scopes_every_selector() {
        let css = ".markdown-body { color: red; }\n.markdown-body hr { border: 0; }";
        let out = prefix_theme_css(css, "[data-theme=\"light\"]");
        assert_eq!(out.matches("[data-theme=\"light\"] .markdown-body").count(), 2);
    }

    #[test]
    fn highlight_prefix_only_touches_class_rules() {
        let css = ".keyword {\n  color: #00f;\n}\n.string {\n  color: #080;\n}";
        let out = prefix_highlight_css(css, "[data-theme=\"dark\"]");
        assert!(out.contains("[data-theme=\"dark\"] .keyword {"));
        assert!(out.contains("[data-theme=\"dark\"] .string {"));
        assert!(!out.contains("[data-theme=\"dark\"]   color"));
    }
}
