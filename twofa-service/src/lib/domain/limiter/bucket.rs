use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::errors::LimiterError;
use super::leak::spawn_leak_task;
use super::leak::LeakHandle;
use super::models::BucketConfig;
use crate::domain::two_factor::ports::AdmissionControl;

/// Leaky-bucket admission controller.
///
/// `level` only grows through [`LeakyBucket::admit`] and only shrinks through
/// [`LeakyBucket::leak`]; both are single atomic read-modify-write operations,
/// so the level stays within `0..=capacity` under any interleaving.
///
/// Without a running leak task nothing drains the bucket and a full bucket
/// keeps rejecting.
#[derive(Debug)]
pub struct LeakyBucket {
    level: AtomicU32,
    leaking: AtomicBool,
    config: BucketConfig,
}

impl LeakyBucket {
    /// Create an empty bucket.
    pub fn new(config: BucketConfig) -> Self {
        Self {
            level: AtomicU32::new(0),
            leaking: AtomicBool::new(false),
            config,
        }
    }

    /// Take one slot if the bucket is not full.
    ///
    /// # Returns
    /// `true` when admitted, `false` when the bucket is at capacity
    pub fn admit(&self) -> bool {
        let capacity = self.config.capacity;
        self.level
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |level| {
                (level < capacity).then(|| level + 1)
            })
            .is_ok()
    }

    /// Release `leak_amount` slots, floored at zero.
    ///
    /// # Returns
    /// Level after the leak
    pub fn leak(&self) -> u32 {
        let amount = self.config.leak_amount;
        let previous = self
            .level
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |level| {
                Some(level.saturating_sub(amount))
            })
            .unwrap_or_else(|level| level);
        previous.saturating_sub(amount)
    }

    pub fn level(&self) -> u32 {
        self.level.load(Ordering::Acquire)
    }

    pub fn capacity(&self) -> u32 {
        self.config.capacity
    }

    pub fn is_full(&self) -> bool {
        self.level() >= self.config.capacity
    }

    pub fn config(&self) -> &BucketConfig {
        &self.config
    }

    /// Whether a leak task currently drains this bucket.
    pub fn is_leaking(&self) -> bool {
        self.leaking.load(Ordering::Acquire)
    }

    /// Start the periodic leak task.
    ///
    /// The task stops when the returned handle is stopped or when `shutdown`
    /// is cancelled. Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// * `AlreadyLeaking` - A leak task is already running for this bucket
    pub fn start_leaking(
        self: &Arc<Self>,
        shutdown: &CancellationToken,
    ) -> Result<LeakHandle, LimiterError> {
        spawn_leak_task(Arc::clone(self), shutdown)
    }

    pub(super) fn claim_leak_task(&self) -> Result<(), LimiterError> {
        self.leaking
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| LimiterError::AlreadyLeaking)
    }

    pub(super) fn release_leak_task(&self) {
        self.leaking.store(false, Ordering::Release);
    }
}

impl Default for LeakyBucket {
    fn default() -> Self {
        Self::new(BucketConfig::default())
    }
}

impl AdmissionControl for LeakyBucket {
    fn admit(&self) -> bool {
        LeakyBucket::admit(self)
    }
}
