pub mod bucket;
pub mod errors;
pub mod leak;
pub mod models;

pub use bucket::LeakyBucket;
pub use errors::LimiterError;
pub use leak::LeakHandle;
pub use models::BucketConfig;
