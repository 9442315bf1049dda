//! Upstream retrieval subsystem.
//!
//! # Data Flow
//! ```text
//! VettedTarget (target + cleared address)
//!     → fetcher.rs (deadline, redirect loop, per-hop guard)
//!     → transport.rs (one GET dialed to the pinned address)
//!     → Fetched { content_type, body }
//! ```

pub mod fetcher;
pub mod transport;

pub use fetcher::{Fetched, SafeFetcher, DEFAULT_CONTENT_TYPE};
pub use transport::{
    HttpTransport, ReqwestTransport, TransportError, TransportSettings, UpstreamRequest, UpstreamResponse,
};
