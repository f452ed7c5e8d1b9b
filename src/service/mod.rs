//! Business operations reachable through the pipeline.
//!
//! Only session management lives here; record CRUD belongs to the
//! persistence service that registers its own handlers.

pub mod registry;
pub mod session;

pub use registry::ServiceRegistry;
pub use session::{
    Account, CredentialVerifier, LoginHandler, LogoutHandler, VerifyError, WhoAmIHandler,
};
