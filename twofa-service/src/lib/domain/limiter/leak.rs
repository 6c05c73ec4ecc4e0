//! Background leak task draining a [`LeakyBucket`].
//!
//! One task per bucket. The first tick fires one full interval after start,
//! every tick releases `leak_amount` slots. The task stops on its own
//! cancellation token, which is a child of the service shutdown token.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::interval_at;
use tokio::time::Instant;
use tokio::time::Interval;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::bucket::LeakyBucket;
use super::errors::LimiterError;

/// Handle to a running leak task.
///
/// Dropping the handle detaches the task; it keeps running until the parent
/// shutdown token is cancelled.
#[derive(Debug)]
pub struct LeakHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl LeakHandle {
    /// Signal the task to stop and wait for it to exit.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "Leak task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Releases the bucket's leak-task claim however the task ends.
struct LeakClaim(Arc<LeakyBucket>);

impl Drop for LeakClaim {
    fn drop(&mut self) {
        self.0.release_leak_task();
    }
}

/// Spawn the leak task for `bucket`.
///
/// # Errors
/// * `AlreadyLeaking` - The bucket already has a running leak task
pub fn spawn_leak_task(
    bucket: Arc<LeakyBucket>,
    shutdown: &CancellationToken,
) -> Result<LeakHandle, LimiterError> {
    bucket.claim_leak_task()?;
    let claim = LeakClaim(Arc::clone(&bucket));

    let period = bucket.config().leak_interval;
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let cancel = shutdown.child_token();
    let task_cancel = cancel.clone();

    let task = tokio::spawn(async move {
        let _claim = claim;
        run_leak_loop(bucket, ticker, task_cancel).await;
    });

    Ok(LeakHandle { cancel, task })
}

async fn run_leak_loop(bucket: Arc<LeakyBucket>, mut ticker: Interval, cancel: CancellationToken) {
    let config = *bucket.config();
    info!(
        capacity = config.capacity,
        leak_amount = config.leak_amount,
        interval_ms = config.leak_interval.as_millis() as u64,
        "Leak task started"
    );

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Leak task shutting down");
                break;
            }
            _ = ticker.tick() => {
                if bucket.is_full() {
                    warn!(
                        status = 429,
                        level = bucket.level(),
                        capacity = bucket.capacity(),
                        "Bucket full, blocking requests"
                    );
                }
                bucket.leak();
            }
        }
    }
}
