//! SSRF-safe HTTP forwarding proxy library.
//!
//! A caller names a target with `GET /?uri=<target>`. The target is parsed,
//! its host resolved once, the resulting address checked against reserved
//! address space, and only then fetched, dialing exactly that address.

pub mod config;
pub mod error;
pub mod guard;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pipeline::{ProxyOutcome, ProxyPipeline};
