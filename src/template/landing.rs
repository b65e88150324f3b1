//! Landing page for GET /: a form that navigates to /<upstream-url>.

use std::fmt::Write;

use super::css::{write_layout_css, FAVICON_SVG};
use super::scripts::write_scripts;
use super::Renderer;
use crate::render::escape_html;

impl Renderer {
    pub fn render_landing(&self, version: &str, default_theme: &str) -> Vec<u8> {
        let mut out = String::with_capacity(16 * 1024);

        let _ = write!(
            out,
            concat!(
                "<!DOCTYPE html>\n",
                "<html lang=\"en\" data-theme=\"{theme}\" data-cooked-version=\"{version}\">\n",
                "<head>\n",
                "  <meta charset=\"utf-8\">\n",
                "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
                "  <title>cooked — rendering proxy</title>\n",
                "  <link rel=\"icon\" type=\"image/svg+xml\" href=\"data:image/svg+xml,{favicon}\">\n",
                "  <style>\n"
            ),
            theme = escape_html(default_theme),
            version = escape_html(version),
            favicon = FAVICON_SVG,
        );

        write_layout_css(&mut out);
        out.push_str(LANDING_CSS);
        out.push_str("\n  </style>\n</head>\n<body>\n");

        let _ = write!(
            out,
            concat!(
                "  <div class=\"cooked-landing\">\n",
                "    <h1>cooked</h1>\n",
                "    <p>Paste a raw document URL to view it rendered with styling.</p>\n",
                "    <form class=\"cooked-landing-form\" onsubmit=\"event.preventDefault(); var u=this.querySelector('input').value.trim(); if(u) window.location.href='/'+u;\">\n",
                "      <input type=\"url\" placeholder=\"https://example.com/path/to/README.md\" autofocus>\n",
                "      <button type=\"submit\">Cook it</button>\n",
                "    </form>\n",
                "    <p style=\"margin-top:16px;font-size:13px;\">cooked {version}</p>\n",
                "  </div>\n",
                "  <!-- cooked: scripts -->\n"
            ),
            version = escape_html(version),
        );

        write_scripts(&mut out);
        out.push_str("</body>\n</html>\n");
        out.into_bytes()
    }
}

const LANDING_CSS: &str = r#"
    .cooked-landing {
      max-width: 600px; margin: 80px auto; padding: 0 16px; text-align: center;
    }
    .cooked-landing h1 { font-size: 48px; margin: 0 0 8px; }
    .cooked-landing p { color: #656d76; font-size: 16px; margin: 0 0 32px; }
    .cooked-landing-form { display: flex; gap: 8px; }
    .cooked-landing-form input {
      flex: 1; padding: 10px 14px; font-size: 14px;
      border: 1px solid rgba(128,128,128,0.3); border-radius: 6px;
      background: inherit; color: inherit;
    }
    .cooked-landing-form button {
      padding: 10px 20px; font-size: 14px; font-weight: 600;
      background: #0969da; color: white; border: none; border-radius: 6px;
      cursor: pointer;
    }
    .cooked-landing-form button:hover { background: #0860ca; }
    [data-theme="dark"] .cooked-landing p { color: #8b949e; }
    [data-theme="dark"] .cooked-landing-form input {
      border-color: rgba(128,128,128,0.3); background: #161b22; color: #e6edf3;
    }
    @media (prefers-color-scheme: dark) {
      [data-theme="auto"] .cooked-landing p { color: #8b949e; }
      [data-theme="auto"] .cooked-landing-form input {
        border-color: rgba(128,128,128,0.3); background: #161b22; color: #e6edf3;
      }
    }
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landing_has_form_and_version() {
        let html = Renderer::new().render_landing("0.3.0", "auto");
        let html = String::from_utf8(html).unwrap();

        assert!(html.contains("cooked-landing-form"));
        assert!(html.contains("Cook it"));
        assert!(html.contains("cooked 0.3.0"));
        assert!(html.contains(r#"data-theme="auto""#));
    }

    #[test]
    fn landing_respects_configured_theme() {
        let html = Renderer::new().render_landing("dev", "dark");
        assert!(String::from_utf8(html)
            .unwrap()
            .contains(r#"data-theme="dark""#));
    }
}
