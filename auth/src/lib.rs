//! Authentication utilities library
//!
//! Provides the building blocks for short-lived second-factor codes:
//! - Secret hashing (Argon2id) with configurable cost
//! - 2FA code generation from a CSPRNG
//! - 2FA code sanitization against the fixed alphabet and length
//!
//! Services define their own ports and adapt these implementations.
//!
//! # Examples
//!
//! ## Secret Hashing
//! ```
//! use auth::{HashCost, SecretHasher};
//!
//! let hasher = SecretHasher::with_cost(HashCost::minimal()).unwrap();
//! let hash = hasher.hash("K7Q2Z").unwrap();
//! assert!(hasher.verify("K7Q2Z", &hash).unwrap());
//! ```
//!
//! ## Codes
//! ```
//! use auth::code::{generate_code, sanitize, CODE_LENGTH};
//!
//! let code = generate_code();
//! assert_eq!(code.len(), CODE_LENGTH);
//! assert_eq!(sanitize(&format!(" {code} ")).unwrap(), code);
//! assert!(sanitize("nope!").is_err());
//! ```

pub mod code;
pub mod hasher;

// Re-export commonly used items
pub use code::CodeError;
pub use hasher::HashCost;
pub use hasher::HashError;
pub use hasher::SecretHasher;
