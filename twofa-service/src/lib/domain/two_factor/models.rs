use std::fmt;
use std::str::FromStr;

/// Single-slot token record.
///
/// The hash only exists inside `Pending`, so a pending state without a hash
/// (or a hash without a pending state) cannot be represented.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum TokenState {
    /// No challenge outstanding
    #[default]
    Idle,
    /// A challenge was issued and awaits verification
    Pending { hash: String },
}

impl TokenState {
    pub fn is_pending(&self) -> bool {
        matches!(self, TokenState::Pending { .. })
    }
}

impl fmt::Debug for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenState::Idle => f.write_str("Idle"),
            TokenState::Pending { .. } => f.write_str("Pending { hash: <redacted> }"),
        }
    }
}

/// Plaintext 2FA code handed out by a successful generate.
///
/// Only exists on its way back to the caller; `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct TwoFactorCode(String);

impl TwoFactorCode {
    pub fn new(code: String) -> Self {
        Self(code)
    }

    /// Get code as string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for TwoFactorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TwoFactorCode(<redacted>)")
    }
}

/// Action requested on the 2FA endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwoFactorAction {
    Generate,
    Verify,
    Expire,
}

impl TwoFactorAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TwoFactorAction::Generate => "generate",
            TwoFactorAction::Verify => "verify",
            TwoFactorAction::Expire => "expire",
        }
    }
}

impl fmt::Display for TwoFactorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unknown action names
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown 2FA action: {0}")]
pub struct UnknownAction(pub String);

impl FromStr for TwoFactorAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "generate" => Ok(TwoFactorAction::Generate),
            "verify" => Ok(TwoFactorAction::Verify),
            "expire" => Ok(TwoFactorAction::Expire),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}
