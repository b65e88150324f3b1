//! Embedded static assets served under `/_cooked/`. Everything the
//! rendered pages depend on ships inside the binary so deployments into
//! air-gapped networks need no external resources. The store is a plain
//! map so tests can supply fixture assets.

use std::borrow::Cow;
use std::collections::HashMap;

#[derive(Clone, Default)]
pub struct AssetStore {
    files: HashMap<&'static str, Cow<'static, [u8]>>,
}

impl AssetStore {
    /// The production store: assets compiled into the binary. The mermaid
    /// bundle and theme CSS under `assets/` are refreshed by `make deps`
    /// (pinned downloads); the copies committed in-tree keep the binary
    /// self-contained.
    pub fn embedded() -> Self {
        let mut store = Self::default();
        store.insert(
            "mermaid.min.js",
            &include_bytes!("../assets/mermaid.min.js")[..],
        );
        store.insert(
            "github-markdown-light.css",
            &include_bytes!("../assets/github-markdown-light.css")[..],
        );
        store.insert(
            "github-markdown-dark.css",
            &include_bytes!("../assets/github-markdown-dark.css")[..],
        );
        store.insert("README.md", &include_bytes!("../README.md")[..]);
        store
    }

    pub fn insert(&mut self, name: &'static str, bytes: impl Into<Cow<'static, [u8]>>) {
        self.files.insert(name, bytes.into());
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Cow::as_ref)
    }

    /// Asset content as a string, empty when absent or non-UTF-8.
    pub fn get_str(&self, name: &str) -> String {
        self.get(name)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default()
    }
}
