//! Configuration validation.
//!
//! Serde handles syntax; this module checks semantics and reports every
//! problem at once rather than stopping at the first.

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// Minimum secret length accepted for HMAC signing.
pub const MIN_SECRET_LEN: usize = 16;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),
    #[error("rate_limit.limit must be greater than zero")]
    ZeroLimit,
    #[error("rate_limit.window_secs must be greater than zero")]
    ZeroWindow,
    #[error("auth.jwt_secret must be at least {} bytes", MIN_SECRET_LEN)]
    WeakSecret,
    #[error("auth.token_lifetime_secs must be greater than zero")]
    ZeroTokenLifetime,
    #[error("auth.skip_methods entry '{0}' is not of the form /package.Service/Method")]
    SkipMethod(String),
    #[error("revocation.sweep_interval_secs must be greater than zero")]
    ZeroSweepInterval,
    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,
    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),
}

/// Validate a configuration, returning all problems found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.rate_limit.enabled {
        if config.rate_limit.limit == 0 {
            errors.push(ValidationError::ZeroLimit);
        }
        if config.rate_limit.window_secs == 0 {
            errors.push(ValidationError::ZeroWindow);
        }
    }

    if config.auth.jwt_secret.len() < MIN_SECRET_LEN {
        errors.push(ValidationError::WeakSecret);
    }
    if config.auth.token_lifetime_secs == 0 {
        errors.push(ValidationError::ZeroTokenLifetime);
    }
    for method in &config.auth.skip_methods {
        if !is_qualified_method(method) {
            errors.push(ValidationError::SkipMethod(method.clone()));
        }
    }

    if config.revocation.sweep_interval_secs == 0 {
        errors.push(ValidationError::ZeroSweepInterval);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// `/package.Service/Method`
fn is_qualified_method(method: &str) -> bool {
    let Some(rest) = method.strip_prefix('/') else {
        return false;
    };
    match rest.split_once('/') {
        Some((service, name)) => {
            !service.is_empty() && !name.is_empty() && !name.contains('/')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.auth.jwt_secret = "0123456789abcdef0123456789abcdef".to_string();
        config
    }

    #[test]
    fn defaults_with_secret_are_valid() {
        assert_eq!(validate_config(&valid()), Ok(()));
    }

    #[test]
    fn reports_every_error() {
        let mut config = valid();
        config.auth.jwt_secret.clear();
        config.rate_limit.limit = 0;
        config.revocation.sweep_interval_secs = 0;
        config.auth.skip_methods.push("Login".to_string());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::WeakSecret));
        assert!(errors.contains(&ValidationError::ZeroLimit));
        assert!(errors.contains(&ValidationError::ZeroSweepInterval));
        assert!(errors.contains(&ValidationError::SkipMethod("Login".to_string())));
    }

    #[test]
    fn disabled_rate_limit_is_not_checked() {
        let mut config = valid();
        config.rate_limit.enabled = false;
        config.rate_limit.limit = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn qualified_method_shape() {
        assert!(is_qualified_method("/main.ExecsService/Login"));
        assert!(!is_qualified_method("main.ExecsService/Login"));
        assert!(!is_qualified_method("/main.ExecsService/"));
        assert!(!is_qualified_method("/main.ExecsService"));
        assert!(!is_qualified_method("/a/b/c"));
    }
}
