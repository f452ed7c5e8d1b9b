//! Call pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound call (any transport)
//!     → call.rs (method, peer, metadata, payload, identity)
//!     → chain.rs (interceptors, outermost first)
//!     → terminal handler (service registry)
//!     → Result<Reply, Status> ascends back through the chain
//! ```
//!
//! # Design Decisions
//! - Transport agnostic: HTTP is one adapter, tests drive calls directly
//! - Identity is a typed field on the call, never a string-keyed bag
//! - `Status` is the only error a caller ever sees

pub mod call;
pub mod chain;
pub mod status;

pub use call::{Call, CallIdentity, Reply};
pub use chain::{BoxFuture, CallResult, Chain, Handler, Interceptor, Next, Pipeline};
pub use status::{Code, Status};
