use rand::rngs::OsRng;
use rand::CryptoRng;
use rand::Rng;

use super::CHARSET;
use super::CODE_LENGTH;

/// Generate a fresh 2FA code from the operating system CSPRNG.
///
/// # Returns
/// Code of `CODE_LENGTH` characters drawn uniformly from `CHARSET`
pub fn generate_code() -> String {
    generate_code_with_rng(&mut OsRng)
}

/// Generate a 2FA code from the given cryptographically secure RNG.
pub fn generate_code_with_rng<R: Rng + CryptoRng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LENGTH)
        .map(|_| char::from(CHARSET[rng.gen_range(0..CHARSET.len())]))
        .collect()
}
