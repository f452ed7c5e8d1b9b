//! Response time measurement for every call.
//!
//! Wraps the rest of the chain, attaches `x-response-time` to the outcome
//! and logs `{method, status, duration}`. Payloads and errors pass through
//! untouched.

use axum::http::{HeaderName, HeaderValue};
use std::time::{Duration, Instant};

use crate::observability::metrics;
use crate::pipeline::{BoxFuture, Call, CallResult, Interceptor, Next};

/// Outbound metadata key carrying the measured duration.
pub const X_RESPONSE_TIME: HeaderName = HeaderName::from_static("x-response-time");

/// Interceptor recording how long the inner chain took.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseTimer;

impl ResponseTimer {
    pub fn new() -> Self {
        Self
    }
}

impl Interceptor for ResponseTimer {
    fn intercept<'a>(&'a self, call: Call, next: Next<'a>) -> BoxFuture<'a, CallResult> {
        Box::pin(async move {
            let mut timing = Timing::start(call.method().to_string());

            let mut result = next.run(call).await;

            let elapsed = timing.finish(match &result {
                Ok(_) => "Ok",
                Err(status) => status.code().as_str(),
            });

            let value = duration_header(elapsed);
            match &mut result {
                Ok(reply) => {
                    reply.metadata_mut().insert(X_RESPONSE_TIME, value);
                }
                Err(status) => status.insert_metadata(X_RESPONSE_TIME, value),
            }
            result
        })
    }
}

fn duration_header(elapsed: Duration) -> HeaderValue {
    // Debug output of a Duration is always ASCII, e.g. "1.5ms".
    HeaderValue::from_str(&format!("{:?}", elapsed))
        .unwrap_or_else(|_| HeaderValue::from_static("unknown"))
}

/// Clock for one call. If the call future is dropped before `finish`
/// (caller went away, deadline hit) the drop still records the elapsed time.
struct Timing {
    method: String,
    start: Instant,
    finished: bool,
}

impl Timing {
    fn start(method: String) -> Self {
        Self {
            method,
            start: Instant::now(),
            finished: false,
        }
    }

    fn finish(&mut self, status: &str) -> Duration {
        self.finished = true;
        let elapsed = self.start.elapsed();
        tracing::info!(
            method = %self.method,
            status = %status,
            duration = ?elapsed,
            "Call completed"
        );
        metrics::record_call(&self.method, status, elapsed);
        elapsed
    }
}

impl Drop for Timing {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let elapsed = self.start.elapsed();
        tracing::warn!(
            method = %self.method,
            status = "cancelled",
            duration = ?elapsed,
            "Call cancelled before completion"
        );
        metrics::record_call(&self.method, "cancelled", elapsed);
    }
}
