//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Signing/verification secret.
pub const ENV_JWT_SECRET: &str = "JWT_SECRET";
/// Default credential lifetime, e.g. `1h` or `90m`.
pub const ENV_JWT_EXPIRES_IN: &str = "JWT_EXPIRES_IN";
/// Listener address.
pub const ENV_BIND: &str = "GATEHOUSE_BIND";
/// Older deployments name the secret this way. Read when `JWT_SECRET` is unset.
pub const ENV_JWT_SECRET_LEGACY: &str = "JWT_SECRETE_STRING";
/// Older deployments give only a port. Read when `GATEHOUSE_BIND` is unset
/// and bound on all interfaces.
pub const ENV_PORT_LEGACY: &str = "GRPC_SERVER_PORT";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid duration in {var}: '{value}'")]
    Duration { var: &'static str, value: String },
    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a configuration from TOML text without validating it.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Load a configuration file, apply process environment overrides, and
/// validate the result.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    finalize(config)
}

/// Apply process environment overrides to `config` and validate it.
pub fn finalize(mut config: GatewayConfig) -> Result<GatewayConfig, ConfigError> {
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay environment values onto `config`. `lookup` abstracts the
/// environment so callers can supply their own source.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(secret) = lookup(ENV_JWT_SECRET).or_else(|| lookup(ENV_JWT_SECRET_LEGACY)) {
        config.auth.jwt_secret = secret;
    }

    if let Some(raw) = lookup(ENV_JWT_EXPIRES_IN).filter(|v| !v.trim().is_empty()) {
        let lifetime = parse_duration(&raw).ok_or(ConfigError::Duration {
            var: ENV_JWT_EXPIRES_IN,
            value: raw.clone(),
        })?;
        config.auth.token_lifetime_secs = lifetime.as_secs();
    }

    if let Some(bind) = lookup(ENV_BIND) {
        config.listener.bind_address = bind;
    } else if let Some(port) = lookup(ENV_PORT_LEGACY) {
        config.listener.bind_address = format!("0.0.0.0:{}", port.trim());
    }

    Ok(())
}

/// Parse a duration in Go's `time.ParseDuration` form: a sequence of
/// decimal numbers, each with an optional fraction and a unit suffix
/// (`1.5h`, `2h45m`, `300us`). Valid units are `ns`, `us` (or `µs`), `ms`,
/// `s`, `m` and `h`. A bare integer is read as seconds. Negative durations
/// are rejected.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let input = input.trim();
    let input = input.strip_prefix('+').unwrap_or(input);
    if input.is_empty() || input.starts_with('-') {
        return None;
    }
    if let Ok(secs) = input.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let mut total_nanos: u128 = 0;
    let mut rest = input;
    while !rest.is_empty() {
        let int_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let (int_part, after) = rest.split_at(int_len);
        let (frac_part, after) = match after.strip_prefix('.') {
            Some(after) => {
                let len = after.find(|c: char| !c.is_ascii_digit()).unwrap_or(after.len());
                after.split_at(len)
            }
            None => ("", after),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }

        let unit_len = after
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after.len());
        let (unit, after) = after.split_at(unit_len);
        let scale: u128 = match unit {
            "ns" => 1,
            "us" | "\u{b5}s" | "\u{3bc}s" => 1_000,
            "ms" => 1_000_000,
            "s" => NANOS_PER_SEC,
            "m" => 60 * NANOS_PER_SEC,
            "h" => 3_600 * NANOS_PER_SEC,
            _ => return None,
        };

        let whole: u128 = if int_part.is_empty() { 0 } else { int_part.parse().ok()? };
        let mut part = whole.checked_mul(scale)?;
        if !frac_part.is_empty() {
            // Digits past 18 are below nanosecond precision for every unit.
            let digits = &frac_part[..frac_part.len().min(18)];
            let fraction: u128 = digits.parse().ok()?;
            part = part.checked_add(fraction * scale / 10u128.pow(digits.len() as u32))?;
        }
        total_nanos = total_nanos.checked_add(part)?;
        rest = after;
    }

    let secs = u64::try_from(total_nanos / NANOS_PER_SEC).ok()?;
    Some(Duration::new(secs, (total_nanos % NANOS_PER_SEC) as u32))
}

const NANOS_PER_SEC: u128 = 1_000_000_000;
