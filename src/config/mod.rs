//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (JWT_SECRET / JWT_EXPIRES_IN / GATEHOUSE_BIND overrides)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → handed to each component at construction
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - The environment wins over the file so secrets stay out of it

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{finalize, load_config, parse_config, ConfigError};
pub use schema::{
    AuthConfig, GatewayConfig, ListenerConfig, LogFormat, ObservabilityConfig, RateLimitConfig,
    RevocationConfig, SecurityConfig, TimeoutConfig,
};
pub use validation::ValidationError;
