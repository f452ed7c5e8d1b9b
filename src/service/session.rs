//! Session operations: login, logout and identity introspection.
//!
//! Credential storage and password hashing live outside this crate and are
//! reached through [`CredentialVerifier`].

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::pipeline::{BoxFuture, Call, CallResult, Handler, Reply, Status};
use crate::security::{bearer_token, RevocationStore, TokenIssuer};

pub const LOGIN: &str = "/main.ExecsService/Login";
pub const LOGOUT: &str = "/main.ExecsService/Logout";
pub const WHO_AM_I: &str = "/main.ExecsService/WhoAmI";

/// Account record returned by a successful credential check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub subject_id: String,
    pub username: String,
    pub role: String,
    pub inactive: bool,
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("unknown user or wrong password")]
    BadCredentials,
    #[error("credential backend failure: {0}")]
    Backend(String),
}

/// Checks a username/password pair against the account store.
pub trait CredentialVerifier: Send + Sync + 'static {
    fn verify<'a>(
        &'a self,
        username: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<Account, VerifyError>>;
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub status: bool,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub logged_out: bool,
}

/// Exchanges a username and password for a signed credential.
pub struct LoginHandler<V> {
    verifier: V,
    issuer: Arc<TokenIssuer>,
}

impl<V: CredentialVerifier> LoginHandler<V> {
    pub fn new(verifier: V, issuer: Arc<TokenIssuer>) -> Self {
        Self { verifier, issuer }
    }
}

impl<V: CredentialVerifier> Handler for LoginHandler<V> {
    fn call(&self, call: Call) -> BoxFuture<'_, CallResult> {
        Box::pin(async move {
            let request: LoginRequest = call.json()?;
            if request.username.is_empty() || request.password.is_empty() {
                return Err(Status::invalid_argument("username and password are required"));
            }

            let account = match self.verifier.verify(&request.username, &request.password).await {
                Ok(account) => account,
                Err(VerifyError::BadCredentials) => {
                    return Err(Status::unauthenticated("incorrect username or password"));
                }
                Err(err) => return Err(Status::internal(err)),
            };

            if account.inactive {
                return Err(Status::unauthenticated("account is inactive"));
            }

            let issued = self
                .issuer
                .issue(&account.subject_id, &account.username, &account.role)
                .map_err(Status::internal)?;

            tracing::info!(uid = %account.subject_id, role = %account.role, "User logged in");
            Reply::json(&LoginResponse {
                status: true,
                token: issued.token,
            })
        })
    }
}

/// Revokes the presented credential until its natural expiry.
pub struct LogoutHandler {
    revocations: Arc<RevocationStore>,
}

impl LogoutHandler {
    pub fn new(revocations: Arc<RevocationStore>) -> Self {
        Self { revocations }
    }
}

impl Handler for LogoutHandler {
    fn call(&self, call: Call) -> BoxFuture<'_, CallResult> {
        Box::pin(async move {
            let identity = call
                .identity()
                .ok_or_else(|| Status::unauthenticated("missing identity"))?;
            let token = bearer_token(call.metadata()).map_err(Status::from)?;

            self.revocations.add_token(token, identity.expires_at);
            tracing::info!(uid = %identity.subject_id, "User logged out");

            Reply::json(&LogoutResponse { logged_out: true })
        })
    }
}

/// Returns the caller's resolved identity.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhoAmIHandler;

impl Handler for WhoAmIHandler {
    fn call(&self, call: Call) -> BoxFuture<'_, CallResult> {
        Box::pin(async move {
            let identity = call
                .identity()
                .ok_or_else(|| Status::unauthenticated("missing identity"))?;
            Reply::json(identity)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Code;
    use std::time::Duration;

    struct OneUser;

    impl CredentialVerifier for OneUser {
        fn verify<'a>(
            &'a self,
            username: &'a str,
            password: &'a str,
        ) -> BoxFuture<'a, Result<Account, VerifyError>> {
            Box::pin(async move {
                match (username, password) {
                    ("ada", "lovelace") => Ok(Account {
                        subject_id: "64f0c0ffee".into(),
                        username: "ada".into(),
                        role: "admin".into(),
                        inactive: false,
                    }),
                    ("grace", "hopper") => Ok(Account {
                        subject_id: "64f0decade".into(),
                        username: "grace".into(),
                        role: "manager".into(),
                        inactive: true,
                    }),
                    ("boom", _) => Err(VerifyError::Backend("mongo timeout".into())),
                    _ => Err(VerifyError::BadCredentials),
                }
            })
        }
    }

    fn login() -> LoginHandler<OneUser> {
        let issuer = TokenIssuer::new("session-test-secret-0123456789", Duration::from_secs(60)).unwrap();
        LoginHandler::new(OneUser, Arc::new(issuer))
    }

    #[tokio::test]
    async fn login_issues_token() {
        let reply = login()
            .call(Call::new(LOGIN, r#"{"username":"ada","password":"lovelace"}"#))
            .await
            .unwrap();
        let body: LoginResponse = reply.decode().unwrap();
        assert!(body.status);
        assert_eq!(body.token.split('.').count(), 3);
    }

    #[tokio::test]
    async fn login_refusals() {
        let handler = login();

        let wrong = handler
            .call(Call::new(LOGIN, r#"{"username":"ada","password":"nope"}"#))
            .await
            .unwrap_err();
        assert_eq!(wrong.code(), Code::Unauthenticated);

        let inactive = handler
            .call(Call::new(LOGIN, r#"{"username":"grace","password":"hopper"}"#))
            .await
            .unwrap_err();
        assert_eq!(inactive.message(), "account is inactive");

        let backend = handler
            .call(Call::new(LOGIN, r#"{"username":"boom","password":"x"}"#))
            .await
            .unwrap_err();
        assert_eq!(backend.code(), Code::Internal);
        assert_eq!(backend.message(), "internal error");

        let malformed = handler.call(Call::new(LOGIN, "username=ada")).await.unwrap_err();
        assert_eq!(malformed.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn logout_requires_identity() {
        let handler = LogoutHandler::new(Arc::new(RevocationStore::new()));
        let status = handler.call(Call::new(LOGOUT, "")).await.unwrap_err();
        assert_eq!(status.code(), Code::Unauthenticated);
    }
}
