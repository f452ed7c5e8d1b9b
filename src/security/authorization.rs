//! Role-based authorization for business handlers.

use thiserror::Error;

use crate::pipeline::{Call, CallIdentity, Status};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    #[error("user not authorized for access: role not found")]
    MissingIdentity,
    #[error("user not authorized for access")]
    RoleNotPermitted { role: String },
}

impl From<AuthorizationError> for Status {
    fn from(err: AuthorizationError) -> Self {
        tracing::debug!(error = %err, "Authorization refused");
        Status::unavailable("user is not authorized for this function")
    }
}

/// Check that the call's authenticated role is one of `allowed_roles`.
///
/// Returns the identity so handlers can use it without a second lookup.
pub fn authorize<'a>(
    call: &'a Call,
    allowed_roles: &[&str],
) -> Result<&'a CallIdentity, AuthorizationError> {
    let identity = call.identity().ok_or(AuthorizationError::MissingIdentity)?;

    if allowed_roles.iter().any(|role| *role == identity.role) {
        Ok(identity)
    } else {
        Err(AuthorizationError::RoleNotPermitted {
            role: identity.role.clone(),
        })
    }
}
