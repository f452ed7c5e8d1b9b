//! Periods for background jobs.

use std::time::Duration;
use thiserror::Error;

/// A job period of zero. `tokio::time::interval` cannot tick at that rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{what} must be greater than zero")]
pub struct ZeroPeriod {
    pub what: &'static str,
}

/// Accept `period` for the job described by `what` if it is non-zero.
pub fn non_zero(period: Duration, what: &'static str) -> Result<Duration, ZeroPeriod> {
    if period.is_zero() {
        Err(ZeroPeriod { what })
    } else {
        Ok(period)
    }
}
