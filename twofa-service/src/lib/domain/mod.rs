pub mod limiter;
pub mod two_factor;
