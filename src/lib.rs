//! cooked — a rendering reverse proxy. The inbound request path embeds a
//! full upstream URL; cooked fetches the raw document, renders it to a
//! self-contained styled HTML page, and serves it with no external
//! resource references.

pub mod assets;
pub mod cache;
pub mod config;
pub mod fetch;
pub mod render;
pub mod rewrite;
pub mod sanitize;
pub mod server;
pub mod ssrf;
pub mod template;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const USER_AGENT: &str = concat!("cooked/", env!("CARGO_PKG_VERSION"));
