//! Bearer credential format and issuance.

use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::AuthConfig;

/// Claims carried by every credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub uid: String,
    pub username: String,
    pub role: String,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("signing secret is missing")]
    EmptySecret,
    #[error("token lifetime is out of range")]
    Lifetime,
    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// A freshly signed credential.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs credentials with the shared HMAC secret.
#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, lifetime: Duration) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        Ok(Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
            lifetime,
        })
    }

    /// Issuer signing with the configured secret and default lifetime.
    pub fn from_config(config: &AuthConfig) -> Result<Self, TokenError> {
        Self::new(&config.jwt_secret, config.token_lifetime())
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issue a credential valid for the configured lifetime.
    pub fn issue(&self, uid: &str, username: &str, role: &str) -> Result<IssuedToken, TokenError> {
        let lifetime = chrono::Duration::from_std(self.lifetime).map_err(|_| TokenError::Lifetime)?;
        let expires_at = Utc::now()
            .checked_add_signed(lifetime)
            .ok_or(TokenError::Lifetime)?;

        let claims = TokenClaims {
            uid: uid.to_string(),
            username: username.to_string(),
            role: role.to_string(),
            exp: expires_at.timestamp(),
        };
        let token = self.sign(&claims)?;

        tracing::debug!(uid = %uid, role = %role, expires_at = %expires_at, "Issued credential");
        Ok(IssuedToken { token, expires_at })
    }

    /// Sign arbitrary claims with HS256.
    pub fn sign(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(
            TokenIssuer::new("", Duration::from_secs(60)),
            Err(TokenError::EmptySecret)
        ));
    }

    #[test]
    fn issued_token_expires_after_lifetime() {
        let issuer = TokenIssuer::new("issuer-test-secret-0123456789", Duration::from_secs(3600)).unwrap();
        let before = Utc::now().timestamp();
        let issued = issuer.issue("64f0c0ffee", "ada", "admin").unwrap();

        let exp = issued.expires_at.timestamp();
        assert!(exp >= before + 3600 && exp <= before + 3601);
        assert_eq!(issued.token.split('.').count(), 3);
    }

    #[test]
    fn configured_lifetime_sets_exp_claim() {
        let config = AuthConfig {
            jwt_secret: "issuer-test-secret-0123456789".into(),
            token_lifetime_secs: 5400,
            ..Default::default()
        };
        let issuer = TokenIssuer::from_config(&config).unwrap();
        assert_eq!(issuer.lifetime(), Duration::from_secs(5400));

        let before = Utc::now().timestamp();
        let issued = issuer.issue("64f0c0ffee", "ada", "admin").unwrap();

        let claims = jsonwebtoken::decode::<TokenClaims>(
            &issued.token,
            &jsonwebtoken::DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &jsonwebtoken::Validation::new(Algorithm::HS256),
        )
        .unwrap()
        .claims;
        assert!(claims.exp >= before + 5400 && claims.exp <= before + 5401);
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn from_config_requires_secret() {
        assert!(matches!(
            TokenIssuer::from_config(&AuthConfig::default()),
            Err(TokenError::EmptySecret)
        ));
    }

    #[test]
    fn claims_expiry_converts_to_datetime() {
        let claims = TokenClaims {
            uid: "u".into(),
            username: "n".into(),
            role: "r".into(),
            exp: 1_700_000_000,
        };
        assert_eq!(claims.expires_at().unwrap().timestamp(), 1_700_000_000);
    }
}
