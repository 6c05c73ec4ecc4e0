use std::time::Duration;

use super::errors::LimiterError;

/// Leaky-bucket parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketConfig {
    /// Maximum number of admitted requests held by the bucket
    pub capacity: u32,
    /// Slots released per tick
    pub leak_amount: u32,
    /// Time between ticks
    pub leak_interval: Duration,
}

impl BucketConfig {
    pub const DEFAULT_CAPACITY: u32 = 10;
    pub const DEFAULT_LEAK_AMOUNT: u32 = 1;
    pub const DEFAULT_LEAK_INTERVAL: Duration = Duration::from_millis(500);

    /// Create a validated bucket configuration.
    ///
    /// # Errors
    /// * `InvalidConfig` - Capacity, leak amount or interval is zero
    pub fn new(
        capacity: u32,
        leak_amount: u32,
        leak_interval: Duration,
    ) -> Result<Self, LimiterError> {
        if capacity == 0 {
            return Err(LimiterError::InvalidConfig(
                "capacity must be greater than zero".to_string(),
            ));
        }
        if leak_amount == 0 {
            return Err(LimiterError::InvalidConfig(
                "leak amount must be greater than zero".to_string(),
            ));
        }
        if leak_interval.is_zero() {
            return Err(LimiterError::InvalidConfig(
                "leak interval must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            capacity,
            leak_amount,
            leak_interval,
        })
    }
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            capacity: Self::DEFAULT_CAPACITY,
            leak_amount: Self::DEFAULT_LEAK_AMOUNT,
            leak_interval: Self::DEFAULT_LEAK_INTERVAL,
        }
    }
}
