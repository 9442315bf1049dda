//! HTTP front end.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, `uri` query parameter)
//!     → pipeline (parse, resolve, classify, fetch)
//!     → response.rs (status code, body, JSON errors)
//!     → cors.rs (headers on every response)
//!     → Send to client
//! ```

pub mod cors;
pub mod request;
pub mod response;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
