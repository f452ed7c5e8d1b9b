//! Fixed-window per-client rate limiting.
//!
//! Every call increments its client's counter, admitted or not. The whole
//! counter map is swapped for an empty one each window, so a reset is a hard
//! cut rather than a sliding decay.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::config::RateLimitConfig;
use crate::lifecycle::period::{non_zero, ZeroPeriod};
use crate::observability::metrics;
use crate::pipeline::{BoxFuture, Call, CallResult, Interceptor, Next, Status};

/// Calls seen per client in the current window.
pub type VisitorCounter = HashMap<IpAddr, u64>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateLimitError {
    #[error("unable to identify client")]
    ClientUnidentified,
    #[error("too many requests, retry later")]
    Exceeded { client: IpAddr, count: u64, limit: u64 },
}

impl From<RateLimitError> for Status {
    fn from(err: RateLimitError) -> Self {
        match err {
            RateLimitError::ClientUnidentified => Status::unauthenticated(err.to_string()),
            RateLimitError::Exceeded { .. } => Status::resource_exhausted(err.to_string()),
        }
    }
}

/// Shared limiter state. One instance serves every concurrent call.
pub struct RateLimiter {
    visitors: Mutex<VisitorCounter>,
    limit: u64,
    window: Duration,
}

impl RateLimiter {
    /// Build a limiter without its reset job. The window must be non-zero.
    pub fn new(limit: u64, window: Duration) -> Result<Self, ZeroPeriod> {
        Ok(Self {
            visitors: Mutex::new(HashMap::new()),
            limit,
            window: non_zero(window, "rate limit window")?,
        })
    }

    /// Build a limiter and start its window reset job on the current runtime.
    pub fn start(
        config: &RateLimitConfig,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<Arc<Self>, ZeroPeriod> {
        let limiter = Arc::new(Self::new(config.limit, config.window())?);
        limiter.spawn_reset_job(shutdown);
        Ok(limiter)
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Count one call from `client` and decide whether it is admitted.
    ///
    /// Increment and comparison happen under one lock acquisition, so two
    /// concurrent calls can never both observe the last free slot.
    pub fn check_and_count(&self, client: IpAddr) -> Result<u64, RateLimitError> {
        let count = {
            let mut visitors = self.visitors.lock().unwrap_or_else(PoisonError::into_inner);
            let count = visitors.entry(client).or_insert(0);
            *count += 1;
            *count
        };

        if count > self.limit {
            Err(RateLimitError::Exceeded {
                client,
                count,
                limit: self.limit,
            })
        } else {
            Ok(count)
        }
    }

    /// Calls counted for `client` in the current window.
    pub fn count(&self, client: IpAddr) -> u64 {
        let visitors = self.visitors.lock().unwrap_or_else(PoisonError::into_inner);
        visitors.get(&client).copied().unwrap_or(0)
    }

    /// Start a new window by replacing the counter map wholesale.
    pub fn reset(&self) {
        let fresh = VisitorCounter::new();
        let previous = {
            let mut visitors = self.visitors.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *visitors, fresh)
        };
        tracing::trace!(clients = previous.len(), "Rate limit window reset");
    }

    /// Spawn the job that calls `reset` once per window until shutdown.
    pub fn spawn_reset_job(self: &Arc<Self>, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + limiter.window, limiter.window);
            loop {
                tokio::select! {
                    _ = ticker.tick() => limiter.reset(),
                    _ = shutdown.recv() => {
                        tracing::debug!("Rate limit reset job stopping");
                        break;
                    }
                }
            }
        })
    }
}

impl Interceptor for RateLimiter {
    fn intercept<'a>(&'a self, call: Call, next: Next<'a>) -> BoxFuture<'a, CallResult> {
        Box::pin(async move {
            let Some(peer) = call.peer() else {
                tracing::warn!(method = %call.method(), "Rejecting call without peer address");
                return Err(RateLimitError::ClientUnidentified.into());
            };

            match self.check_and_count(peer.ip()) {
                Ok(count) => {
                    tracing::debug!(client = %peer.ip(), count, "Visitor count");
                    next.run(call).await
                }
                Err(err) => {
                    tracing::warn!(client = %peer.ip(), limit = self.limit, "Rate limit exceeded");
                    metrics::record_rate_limited();
                    Err(err.into())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Chain, Code, Handler, Reply, Status};
    use std::net::{Ipv4Addr, SocketAddr};

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn admits_up_to_limit_then_denies() {
        let limiter = RateLimiter::new(3, Duration::from_secs(10)).unwrap();
        assert_eq!(limiter.check_and_count(ip(1)), Ok(1));
        assert_eq!(limiter.check_and_count(ip(1)), Ok(2));
        assert_eq!(limiter.check_and_count(ip(1)), Ok(3));
        assert!(matches!(
            limiter.check_and_count(ip(1)),
            Err(RateLimitError::Exceeded { count: 4, limit: 3, .. })
        ));
    }

    #[test]
    fn zero_window_is_rejected() {
        let err = RateLimiter::new(5, Duration::ZERO).err().unwrap();
        assert_eq!(err.what, "rate limit window");

        let config = RateLimitConfig {
            window_secs: 0,
            ..Default::default()
        };
        let (_tx, rx) = broadcast::channel(1);
        assert!(RateLimiter::start(&config, rx).is_err());
    }

    #[test]
    fn denied_calls_still_count() {
        let limiter = RateLimiter::new(1, Duration::from_secs(10)).unwrap();
        for _ in 0..5 {
            let _ = limiter.check_and_count(ip(1));
        }
        assert_eq!(limiter.count(ip(1)), 5);
    }

    #[test]
    fn clients_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(10)).unwrap();
        assert!(limiter.check_and_count(ip(1)).is_ok());
        assert!(limiter.check_and_count(ip(1)).is_err());
        assert!(limiter.check_and_count(ip(2)).is_ok());
    }

    #[test]
    fn reset_starts_a_new_window() {
        let limiter = RateLimiter::new(2, Duration::from_secs(10)).unwrap();
        for _ in 0..4 {
            let _ = limiter.check_and_count(ip(1));
        }
        limiter.reset();
        assert_eq!(limiter.count(ip(1)), 0);
        assert_eq!(limiter.check_and_count(ip(1)), Ok(1));
        assert_eq!(limiter.check_and_count(ip(1)), Ok(2));
    }

    #[test]
    fn concurrent_calls_never_over_admit() {
        let limiter = Arc::new(RateLimiter::new(100, Duration::from_secs(10)).unwrap());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || {
                    (0..50).filter(|_| limiter.check_and_count(ip(9)).is_ok()).count()
                })
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 100);
        assert_eq!(limiter.count(ip(9)), 400);
    }

    #[tokio::test]
    async fn missing_peer_fails_closed() {
        let limiter = Arc::new(RateLimiter::new(10, Duration::from_secs(10)).unwrap());
        let pipeline = Chain::new()
            .with(limiter)
            .wrap(|_call: Call| async { Ok::<_, Status>(Reply::default()) });

        let status = pipeline.call(Call::new("/t.S/M", "")).await.unwrap_err();
        assert_eq!(status.code(), Code::Unauthenticated);
        assert_eq!(status.message(), "unable to identify client");
    }

    #[tokio::test]
    async fn interceptor_denies_with_resource_exhausted() {
        let limiter = Arc::new(RateLimiter::new(1, Duration::from_secs(10)).unwrap());
        let pipeline = Chain::new()
            .with(limiter)
            .wrap(|_call: Call| async { Ok::<_, Status>(Reply::default()) });

        let peer: SocketAddr = "10.0.0.7:4000".parse().unwrap();
        assert!(pipeline.call(Call::new("/t.S/M", "").with_peer(peer)).await.is_ok());

        // Same host, different source port: same client.
        let other_port: SocketAddr = "10.0.0.7:4001".parse().unwrap();
        let status = pipeline
            .call(Call::new("/t.S/M", "").with_peer(other_port))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::ResourceExhausted);
    }

    #[tokio::test]
    async fn reset_job_clears_counts_and_stops_on_shutdown() {
        let (tx, rx) = broadcast::channel(1);
        let limiter = Arc::new(RateLimiter::new(1, Duration::from_millis(50)).unwrap());
        let job = limiter.spawn_reset_job(rx);

        assert!(limiter.check_and_count(ip(3)).is_ok());
        assert!(limiter.check_and_count(ip(3)).is_err());

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(limiter.check_and_count(ip(3)).is_ok());

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), job)
            .await
            .expect("reset job did not stop")
            .unwrap();
    }
}
