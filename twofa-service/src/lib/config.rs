use std::env;
use std::time::Duration;

use auth::HashCost;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::domain::limiter::BucketConfig;
use crate::domain::limiter::LimiterError;

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub limiter: LimiterConfig,
    #[serde(default)]
    pub hasher: HasherConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub http_port: u16,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            request_timeout_secs: 10,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LimiterConfig {
    pub capacity: u32,
    pub leak_amount: u32,
    pub leak_interval_ms: u64,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            capacity: BucketConfig::DEFAULT_CAPACITY,
            leak_amount: BucketConfig::DEFAULT_LEAK_AMOUNT,
            leak_interval_ms: BucketConfig::DEFAULT_LEAK_INTERVAL.as_millis() as u64,
        }
    }
}

impl LimiterConfig {
    /// Validated bucket parameters.
    ///
    /// # Errors
    /// * `InvalidConfig` - Capacity, leak amount or interval is zero
    pub fn bucket(&self) -> Result<BucketConfig, LimiterError> {
        BucketConfig::new(
            self.capacity,
            self.leak_amount,
            Duration::from_millis(self.leak_interval_ms),
        )
    }
}

/// Argon2id cost for hashing 2FA codes
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct HasherConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HasherConfig {
    fn default() -> Self {
        let cost = HashCost::default();
        Self {
            memory_kib: cost.memory_kib,
            iterations: cost.iterations,
            parallelism: cost.parallelism,
        }
    }
}

impl From<&HasherConfig> for HashCost {
    fn from(config: &HasherConfig) -> Self {
        HashCost {
            memory_kib: config.memory_kib,
            iterations: config.iterations,
            parallelism: config.parallelism,
        }
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (TWOFA_SERVER__HTTP_PORT, TWOFA_LIMITER__CAPACITY, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    /// 4. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on environment-specific configuration
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Layer on environment variables (with __ as separator)
            // Example: TWOFA_LIMITER__CAPACITY=20 overrides limiter.capacity
            .add_source(
                Environment::with_prefix("TWOFA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = configuration.try_deserialize()?;

        Ok(config)
    }
}
