//! Bearer credential authentication.
//!
//! Calls to exempt operations pass straight through. Every other call must
//! present `authorization: Bearer <token>`; the token is checked against the
//! revocation store, verified with the shared HMAC secret, and turned into a
//! typed `CallIdentity` on the call.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

use crate::config::AuthConfig;
use crate::observability::metrics;
use crate::pipeline::{BoxFuture, Call, CallIdentity, CallResult, Interceptor, Next, Status};
use crate::security::revocation::RevocationStore;
use crate::security::token::TokenClaims;

/// The only algorithm family accepted. Anything else, including asymmetric
/// algorithms presented with a valid HMAC over the secret, is refused.
const HMAC_FAMILY: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Why a credential was refused. Messages never include token text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing authorization metadata")]
    MissingCredential,
    #[error("malformed credential")]
    MalformedCredential,
    #[error("credential has been revoked")]
    Revoked,
    #[error("credential has expired")]
    Expired,
    #[error("unsupported signing algorithm")]
    UnsupportedAlgorithm,
    #[error("invalid credential signature")]
    InvalidSignature,
    #[error("credential claims are invalid")]
    InvalidClaims,
}

impl AuthError {
    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing",
            AuthError::MalformedCredential => "malformed",
            AuthError::Revoked => "revoked",
            AuthError::Expired => "expired",
            AuthError::UnsupportedAlgorithm => "algorithm",
            AuthError::InvalidSignature => "signature",
            AuthError::InvalidClaims => "claims",
        }
    }
}

impl From<AuthError> for Status {
    fn from(err: AuthError) -> Self {
        Status::unauthenticated(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                AuthError::UnsupportedAlgorithm
            }
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::Json(_) | ErrorKind::MissingRequiredClaim(_) => AuthError::InvalidClaims,
            _ => AuthError::MalformedCredential,
        }
    }
}

/// Extract the token from `authorization: Bearer <token>`.
pub fn bearer_token(metadata: &HeaderMap) -> Result<&str, AuthError> {
    let value = metadata
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?
        .to_str()
        .map_err(|_| AuthError::MalformedCredential)?
        .trim();

    if value.is_empty() {
        return Err(AuthError::MissingCredential);
    }

    let (scheme, token) = value.split_once(' ').unwrap_or((value, ""));
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MalformedCredential);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingCredential);
    }
    Ok(token)
}

/// Interceptor validating bearer credentials.
pub struct Authenticator {
    skip_methods: HashSet<String>,
    key: DecodingKey,
    validation: Validation,
    revocations: Arc<RevocationStore>,
}

impl Authenticator {
    pub fn new<I, S>(secret: &str, skip_methods: I, revocations: Arc<RevocationStore>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = HMAC_FAMILY.to_vec();
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            skip_methods: skip_methods.into_iter().map(Into::into).collect(),
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            revocations,
        }
    }

    pub fn from_config(config: &AuthConfig, revocations: Arc<RevocationStore>) -> Self {
        Self::new(&config.jwt_secret, config.skip_methods.iter().cloned(), revocations)
    }

    /// Whether `method` bypasses authentication.
    pub fn is_exempt(&self, method: &str) -> bool {
        self.skip_methods.contains(method)
    }

    /// Resolve the identity behind the call's metadata.
    pub fn authenticate(&self, metadata: &HeaderMap) -> Result<CallIdentity, AuthError> {
        let token = bearer_token(metadata)?;

        if self.revocations.is_revoked(token) {
            return Err(AuthError::Revoked);
        }

        self.verify(token)
    }

    /// Verify signature, algorithm and expiry, then map claims to an identity.
    pub fn verify(&self, token: &str) -> Result<CallIdentity, AuthError> {
        let claims = decode::<TokenClaims>(token, &self.key, &self.validation)?.claims;

        if claims.uid.is_empty() || claims.role.trim().is_empty() {
            return Err(AuthError::InvalidClaims);
        }
        let expires_at = claims.expires_at().ok_or(AuthError::InvalidClaims)?;

        Ok(CallIdentity {
            subject_id: claims.uid,
            username: claims.username,
            role: claims.role,
            expires_at,
        })
    }
}

impl Interceptor for Authenticator {
    fn intercept<'a>(&'a self, mut call: Call, next: Next<'a>) -> BoxFuture<'a, CallResult> {
        Box::pin(async move {
            if self.is_exempt(call.method()) {
                return next.run(call).await;
            }

            match self.authenticate(call.metadata()) {
                Ok(identity) => {
                    tracing::debug!(
                        method = %call.method(),
                        uid = %identity.subject_id,
                        role = %identity.role,
                        "Call authenticated"
                    );
                    call.set_identity(identity);
                    next.run(call).await
                }
                Err(err) => {
                    tracing::debug!(method = %call.method(), reason = err.reason(), "Authentication failed");
                    metrics::record_auth_failure(err.reason());
                    Err(err.into())
                }
            }
        })
    }
}
