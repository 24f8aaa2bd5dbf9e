//! Wallet key material handed to the backend for proof of eligibility.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A wallet seed phrase or unified viewing key, as typed by the user.
///
/// This type intentionally does not implement `Clone` or `Serialize`, and its
/// `Debug` output is redacted. The text is zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial(String);

impl KeyMaterial {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrow the raw key text for a backend call.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyMaterial(<redacted>)")
    }
}

impl From<String> for KeyMaterial {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for KeyMaterial {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
