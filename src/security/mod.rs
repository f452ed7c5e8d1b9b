//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming call:
//!     → rate_limit.rs (count per client IP, reject over limit)
//!     → [response timer]
//!     → authentication.rs (skip-list, bearer token, revocation.rs, verify)
//!     → business handler
//!         → authorization.rs (role allow-list)
//!
//! Login:   token.rs signs a new credential
//! Logout:  revocation.rs records the token until it expires
//! ```
//!
//! # Design Decisions
//! - Fail closed: a call with no resolvable client address is rejected
//! - Only the HMAC algorithm family is accepted
//! - Each piece of shared state sits behind its own mutex, never held across an await

pub mod authentication;
pub mod authorization;
pub mod rate_limit;
pub mod revocation;
pub mod token;

pub use authentication::{bearer_token, AuthError, Authenticator};
pub use authorization::{authorize, AuthorizationError};
pub use rate_limit::{RateLimitError, RateLimiter};
pub use revocation::RevocationStore;
pub use token::{IssuedToken, TokenClaims, TokenError, TokenIssuer};
