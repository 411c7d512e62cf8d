//! Proxy identity rotation
//!
//! The rotator owns the live transport session. Fetches borrow the current
//! session as an `Arc` handle; a rotation builds a brand-new session and swaps
//! the handle, so a fetch still holding the old one finishes on it undisturbed.
//! Rotation is best effort: a failure is logged and the old session stays live.

use crate::config::IdentityConfig;
use crate::crawler::fetcher::{FetchError, SessionFactory};
use std::sync::Arc;
use std::time::Duration;

/// Owns the current transport session and replaces it on a fetch-count cadence
pub struct IdentityRotator<F: SessionFactory> {
    factory: F,
    session: Arc<F::Session>,
    cadence: u64,
    settle_delay: Duration,
    rotations: u64,
    failed_rotations: u64,
}

impl<F: SessionFactory> IdentityRotator<F> {
    /// Creates a rotator and connects the first session
    ///
    /// Failing to build the very first session is an error: there is no
    /// identity to fall back on.
    pub fn new(factory: F, config: &IdentityConfig) -> Result<Self, FetchError> {
        let session = Arc::new(factory.connect()?);
        Ok(Self {
            factory,
            session,
            cadence: config.rotate_every.max(1),
            settle_delay: config.settle_delay(),
            rotations: 0,
            failed_rotations: 0,
        })
    }

    /// Handle to the live session
    pub fn session(&self) -> Arc<F::Session> {
        Arc::clone(&self.session)
    }

    /// Rotates if `fetch_count` lands on the cadence
    ///
    /// Returns `None` when no rotation was due, otherwise whether it succeeded.
    pub async fn maybe_rotate(&mut self, fetch_count: u64) -> Option<bool> {
        if fetch_count == 0 || fetch_count % self.cadence != 0 {
            return None;
        }
        Some(self.rotate().await)
    }

    /// Replaces the live session with a fresh identity
    ///
    /// Waits for the settle delay, then connects a new session. The previous
    /// session is released once the new one is in place.
    pub async fn rotate(&mut self) -> bool {
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        match self.factory.connect() {
            Ok(session) => {
                self.session = Arc::new(session);
                self.rotations += 1;
                tracing::info!("New proxy identity obtained (rotation {})", self.rotations);
                true
            }
            Err(e) => {
                self.failed_rotations += 1;
                tracing::warn!("Failed to refresh proxy identity, keeping current one: {}", e);
                false
            }
        }
    }

    pub fn cadence(&self) -> u64 {
        self.cadence
    }

    /// Successful rotations since creation
    pub fn rotations(&self) -> u64 {
        self.rotations
    }

    pub fn failed_rotations(&self) -> u64 {
        self.failed_rotations
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }
}
