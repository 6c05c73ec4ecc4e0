use super::errors::CodeError;
use super::CHARSET;
use super::CODE_LENGTH;

/// Validate a candidate 2FA code.
///
/// Surrounding whitespace is trimmed; everything else must already be in
/// canonical form. No case folding is done.
///
/// # Arguments
/// * `candidate` - Raw code as received from the caller
///
/// # Returns
/// The normalized code
///
/// # Errors
/// * `InvalidLength` - Not exactly `CODE_LENGTH` characters
/// * `InvalidCharacters` - Contains characters outside `CHARSET`
pub fn sanitize(candidate: &str) -> Result<String, CodeError> {
    let candidate = candidate.trim();

    let length = candidate.chars().count();
    if length != CODE_LENGTH {
        return Err(CodeError::InvalidLength {
            expected: CODE_LENGTH,
            actual: length,
        });
    }

    if !candidate.bytes().all(|b| CHARSET.contains(&b)) {
        return Err(CodeError::InvalidCharacters);
    }

    Ok(candidate.to_string())
}
