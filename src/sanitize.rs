//! HTML sanitization for rendered markdown/MDX output. Runs after the
//! renderer and before cooked's own chrome is added, so the page scripts
//! are never subject to this policy. Built on ammonia (html5ever
//! tokenization), which makes the cleaning pass idempotent and immune to
//! nested-tag reconstruction like `<scr<script>ipt>`.

use std::borrow::Cow;
use std::collections::HashSet;

use ammonia::Builder;
use once_cell::sync::Lazy;

static POLICY: Lazy<Builder<'static>> = Lazy::new(|| {
    let mut builder = Builder::default();

    // Heading anchors, footnote refs, syntax-highlight spans, and the
    // cooked code-block wrappers all rely on these.
    builder.add_generic_attributes(["id", "class", "role"]);
    builder.generic_attribute_prefixes(HashSet::from(["data-"]));
    builder.add_tag_attributes("pre", ["tabindex"]);

    // Copy buttons inside code-block wrappers.
    builder.add_tags(["button"]);

    // GFM strikethrough/insert, definition lists, disclosure widgets.
    builder.add_tags(["del", "ins", "dl", "dt", "dd", "details", "summary"]);

    // GFM task lists render inert checkboxes; no other input survives.
    builder.add_tags(["input"]);
    builder.add_tag_attributes("input", ["type", "checked", "disabled"]);

    // data: is admitted for inline images; the filter below rejects the
    // text/html payloads that would smuggle active content.
    let mut schemes = HashSet::new();
    for scheme in ["http", "https", "mailto", "ftp", "data"] {
        schemes.insert(scheme);
    }
    builder.url_schemes(schemes);

    builder.attribute_filter(|_element, attribute, value| {
        if attribute == "href" || attribute == "src" {
            let compact: String = value
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_ascii_lowercase();
            if compact.starts_with("data:text/html") {
                return None;
            }
        }
        Some(Cow::Borrowed(value))
    });

    builder
});

/// Strips dangerous elements, attributes, and URI schemes from HTML.
pub fn html(input: &[u8]) -> Vec<u8> {
    POLICY
        .clean(&String::from_utf8_lossy(input))
        .to_string()
        .into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(input: &str) -> String {
        String::from_utf8(html(input.as_bytes())).unwrap()
    }

    #[test]
    fn strips_script_tags() {
        let out = clean("<p>before</p><script>alert('xss')</script><p>after</p>");
        assert!(!out.contains("<script"));
        assert!(!out.contains("alert"));
        assert!(out.contains("before"));
        assert!(out.contains("after"));
    }

    #[test]
    fn strips_embedding_elements() {
        for input in [
            r#"<iframe src="https://evil.example"></iframe>"#,
            r#"<object data="x"></object>"#,
            r#"<embed src="x">"#,
            r#"<form action="/steal"><input name="pw"></form>"#,
            r#"<style>body{display:none}</style>"#,
            r#"<base href="https://evil.example/">"#,
            r#"<link rel="stylesheet" href="x">"#,
            r#"<meta http-equiv="refresh" content="0">"#,
        ] {
            let out = clean(input);
            for tag in ["<iframe", "<object", "<embed", "<form", "<style", "<base", "<link", "<meta"] {
                assert!(!out.contains(tag), "input {input:?} left {tag} in {out:?}");
            }
        }
    }

    #[test]
    fn strips_event_handlers() {
        let out = clean(r##"<img src="https://h/x.png" onerror="alert(1)"><a href="#x" onclick="go()">t</a>"##);
        assert!(!out.contains("onerror"));
        assert!(!out.contains("onclick"));
        assert!(out.contains("<img"));
    }

    #[test]
    fn strips_dangerous_uri_schemes() {
        for input in [
            r#"<a href="javascript:alert(1)">x</a>"#,
            r#"<a href="JaVaScRiPt:alert(1)">x</a>"#,
            r#"<a href="vbscript:msgbox(1)">x</a>"#,
            r#"<a href="java&#115;cript:alert(1)">x</a>"#,
            r#"<a href="data:text/html,<script>alert(1)</script>">x</a>"#,
        ] {
            let out = clean(input);
            assert!(!out.contains("javascript:"), "{input:?} -> {out:?}");
            assert!(!out.contains("vbscript:"), "{input:?} -> {out:?}");
            assert!(!out.contains("data:text/html"), "{input:?} -> {out:?}");
        }
    }

    #[test]
    fn keeps_data_image_uris() {
        let out = clean(r#"<img src="data:image/png;base64,iVBORw0KGgo=">"#);
        assert!(out.contains("data:image/png"));
    }

    #[test]
    fn keeps_safe_content_and_hooks() {
        let input = concat!(
            r#"<h1 id="title">T</h1>"#,
            r#"<div class="cooked-code-block" data-language="rust">"#,
            r#"<button class="cooked-copy-btn" data-state="idle">Copy</button>"#,
            r#"<pre tabindex="0"><code><span class="keyword">fn</span></code></pre></div>"#,
            r#"<table><tbody><tr><td>c</td></tr></tbody></table>"#,
            r#"<del>s</del><dl><dt>t</dt><dd>d</dd></dl>"#,
            r#"<details><summary>more</summary>body</details>"#,
            r#"<input type="checkbox" checked disabled>"#,
        );
        let out = clean(input);
        for fragment in [
            r#"id="title""#,
            r#"data-language="rust""#,
            "<button",
            r#"tabindex="0""#,
            r#"class="keyword""#,
            "<table>",
            "<del>s</del>",
            "<dt>t</dt>",
            "<summary>more</summary>",
            r#"type="checkbox""#,
        ] {
            assert!(out.contains(fragment), "missing {fragment} in {out:?}");
        }
    }

    #[test]
    fn resists_nested_tag_reconstruction() {
        let out = clean("<scr<script>ipt>alert('xss')</scr</script>ipt>");
        assert!(!out.contains("<script"));
        let again = clean(&out);
        assert!(!again.contains("<script"));
    }

    #[test]
    fn sanitize_is_idempotent() {
        for input in [
            "<p>plain</p>",
            "<p>a<script>b</script>c</p>",
            r#"<a href="javascript:x">y</a>"#,
            r#"<div class="x" data-y="z"><button>b</button></div>"#,
            "<scr<script>ipt>nested</script>",
        ] {
            let once = clean(input);
            let twice = clean(&once);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn preserves_images_with_absolute_sources() {
        let out = clean(r#"<img src="https://host/diagram.png" alt="d">"#);
        assert!(out.contains(r#"src="https://host/diagram.png""#));
        assert!(out.contains(r#"alt="d""#));
    }
}
