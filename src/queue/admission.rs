//! Admission queue bounding concurrent backend calls behind a shared
//! cooldown gate.
//!
//! The queue is the single serialization point for backend concurrency.
//! Waiters are served in arrival order; a rate-limit cooldown is a hard
//! global gate that holds every grant until the deadline passes.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{AppError, Result};
use crate::queue::retry::CooldownGate;

/// One unit of granted backend-call capacity.
///
/// Dropping the permit returns the slot to the pool; the semaphore hands it
/// directly to the longest-waiting caller. Drop runs on every exit path, so
/// a slot is released exactly once whatever the call outcome.
pub struct SlotPermit {
    _permit: OwnedSemaphorePermit,
}

pub struct AdmissionQueue {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    cooldown_until: Mutex<Option<Instant>>,
}

impl AdmissionQueue {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            cooldown_until: Mutex::new(None),
        }
    }

    /// Wait for a concurrency slot.
    ///
    /// Completes once a slot is free and any active cooldown has elapsed;
    /// there is no queue-side wait limit. Dropping the returned future
    /// abandons the wait without consuming a slot and without disturbing
    /// the order of the remaining waiters.
    pub async fn acquire(&self) -> Result<SlotPermit> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| AppError::Internal("admission queue closed".to_string()))?;

        // The permit is held while waiting out the cooldown so that arrival
        // order is preserved. The deadline may be extended while we sleep.
        loop {
            let remaining = self.cooldown_remaining();
            if remaining.is_zero() {
                break;
            }
            debug!(
                remaining_ms = remaining.as_millis() as u64,
                "cooldown active, holding admission"
            );
            tokio::time::sleep(remaining).await;
        }

        Ok(SlotPermit { _permit: permit })
    }

    /// Extend the shared cooldown deadline to at least `now + duration`.
    ///
    /// A shorter duration never shrinks an already-longer pending cooldown.
    pub fn trigger_cooldown(&self, duration: Duration) {
        let candidate = Instant::now() + duration;
        let mut until = self.cooldown_until.lock();
        match *until {
            Some(current) if current >= candidate => {
                debug!(
                    requested_secs = duration.as_secs(),
                    "cooldown already covers requested window"
                );
            }
            _ => {
                *until = Some(candidate);
                warn!(cooldown_secs = duration.as_secs(), "admission cooldown engaged");
            }
        }
    }

    /// Time left before new slots may be granted, zero when the gate is open
    pub fn cooldown_remaining(&self) -> Duration {
        match *self.cooldown_until.lock() {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()),
            None => Duration::ZERO,
        }
    }

    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }
}

impl CooldownGate for AdmissionQueue {
    fn trigger_cooldown(&self, duration: Duration) {
        AdmissionQueue::trigger_cooldown(self, duration);
    }
}
