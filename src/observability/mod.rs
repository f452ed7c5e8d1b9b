//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every call:
//!     → response_time.rs (clock, x-response-time, completion log line)
//!     → metrics.rs (counters, histograms, gauges)
//!
//! Process start:
//!     → logging.rs (subscriber, filter, format)
//!     → metrics.rs (Prometheus scrape listener, optional)
//! ```
//!
//! # Design Decisions
//! - Structured logging via tracing; JSON for production, pretty for development
//! - Credential text and secrets never appear in log fields

pub mod logging;
pub mod metrics;
pub mod response_time;

pub use response_time::{ResponseTimer, X_RESPONSE_TIME};
