//! Gatehouse: an interceptor pipeline in front of RPC-style business
//! handlers.
//!
//! Every call passes a per-client rate limiter, a response timer and a
//! bearer-token authenticator before reaching the handler registered for
//! its operation name. Handlers apply role checks with
//! [`security::authorize`].

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod query;
pub mod security;
pub mod service;

pub use config::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use pipeline::{Call, CallIdentity, Chain, Code, Handler, Interceptor, Reply, Status};
