//! HTTP transport adapter.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout, body limit)
//!     → Call { method: "/{service}/{method}", peer, headers, body }
//!     → pipeline (rate limit → response timer → authentication → handler)
//!     → response.rs (status code mapping, metadata headers)
//!     → Send to client
//! ```

pub mod response;
pub mod server;

pub use response::{http_status, into_http_response, ErrorBody};
pub use server::GatewayServer;
