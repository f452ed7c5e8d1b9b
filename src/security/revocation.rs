//! Revoked credential registry.
//!
//! Holds tokens that were logged out before their natural expiry. Entries
//! are added by logout and only removed by the periodic sweep once that
//! expiry has passed; after that the signature check rejects the token on
//! its own.
//!
//! The registry is in-memory only. A restart forgets every revocation, so
//! a logged-out token becomes usable again until it expires.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::config::RevocationConfig;
use crate::lifecycle::period::{non_zero, ZeroPeriod};
use crate::observability::metrics;

/// Process-wide store of revoked bearer tokens and their natural expiry.
pub struct RevocationStore {
    tokens: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl RevocationStore {
    /// Build an empty store without its sweep job.
    pub fn new() -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
        }
    }

    /// Build a store and start its sweep job on the current runtime.
    pub fn start(
        config: &RevocationConfig,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<Arc<Self>, ZeroPeriod> {
        let store = Arc::new(Self::new());
        store.spawn_sweeper(config.sweep_interval(), shutdown)?;
        Ok(store)
    }

    /// Record `token` as revoked until `expires_at`.
    pub fn add_token(&self, token: impl Into<String>, expires_at: DateTime<Utc>) {
        let len = {
            let mut tokens = self.tokens.lock().unwrap_or_else(PoisonError::into_inner);
            tokens.insert(token.into(), expires_at);
            tokens.len()
        };
        metrics::record_revoked_tokens(len);
    }

    /// Whether `token` is currently tracked as revoked.
    ///
    /// This is a presence check only. A token that was swept out is
    /// reported as not tracked, which says nothing about its validity.
    pub fn is_revoked(&self, token: &str) -> bool {
        let tokens = self.tokens.lock().unwrap_or_else(PoisonError::into_inner);
        tokens.contains_key(token)
    }

    /// Drop every entry whose expiry has passed. Returns how many went.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }

    /// Drop every entry whose expiry is before `now`.
    pub fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let (removed, len) = {
            let mut tokens = self.tokens.lock().unwrap_or_else(PoisonError::into_inner);
            let before = tokens.len();
            tokens.retain(|_, expires_at| *expires_at >= now);
            (before - tokens.len(), tokens.len())
        };
        metrics::record_revoked_tokens(len);
        removed
    }

    pub fn len(&self) -> usize {
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawn the job that sweeps every `interval` until shutdown. The
    /// interval must be non-zero.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<JoinHandle<()>, ZeroPeriod> {
        let interval = non_zero(interval, "revocation sweep interval")?;
        let store = Arc::clone(self);
        Ok(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = store.sweep();
                        if removed > 0 {
                            tracing::debug!(removed, remaining = store.len(), "Swept expired revocations");
                        }
                    }
                    _ = shutdown.recv() => {
                        tracing::debug!("Revocation sweep job stopping");
                        break;
                    }
                }
            }
        }))
    }
}

impl Default for RevocationStore {
    fn default() -> Self {
        Self::new()
    }
}
