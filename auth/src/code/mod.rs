pub mod errors;
pub mod generator;
pub mod sanitizer;

pub use errors::CodeError;
pub use generator::generate_code;
pub use generator::generate_code_with_rng;
pub use sanitizer::sanitize;

/// Characters a 2FA code is drawn from.
pub const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Number of characters in a 2FA code.
pub const CODE_LENGTH: usize = 5;
