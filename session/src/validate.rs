//! Form validators for the election setup fields.
//!
//! Both validators are safe to run on every keystroke: they only read from
//! the backend and never change its state.

use std::fmt;
use thiserror::Error;

use zvote_gateway::{Backend, Url};
use zvote_types::KeyMaterial;

pub const INVALID_URL: &str = "Invalid URL";
pub const INVALID_KEY: &str =
    "Invalid Key. Key must be either a 24 seed phrase or a unified viewing key with an Orchard receiver";

/// The form field an error belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Url,
    Key,
    Address,
    Amount,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Url => "url",
            Self::Key => "key",
            Self::Address => "address",
            Self::Amount => "amount",
        })
    }
}

/// A message to show inline next to a field.
///
/// `Display` shows only the user-facing message. The underlying cause, when
/// there is one, is kept in `detail` for diagnostics.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct FieldError {
    pub field: Field,
    pub message: String,
    pub detail: Option<String>,
}

impl FieldError {
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Local URL check: non-empty and parseable as an absolute URL.
pub fn check_url_syntax(url: &str) -> Result<Url, FieldError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(FieldError::new(Field::Url, INVALID_URL).with_detail("empty URL"));
    }
    Url::parse(url).map_err(|e| FieldError::new(Field::Url, INVALID_URL).with_detail(e.to_string()))
}

/// Check that `url` is well formed and that the backend can fetch it.
pub async fn validate_url(backend: &dyn Backend, url: &str) -> Result<(), FieldError> {
    let parsed = check_url_syntax(url)?;
    match backend.http_get(parsed.as_str()).await {
        Ok(_) => Ok(()),
        Err(e) => {
            tracing::debug!(url = %parsed, error = %e, "election URL not reachable");
            Err(FieldError::new(Field::Url, INVALID_URL).with_detail(e.to_string()))
        }
    }
}

/// Check that the backend accepts `key` as a seed phrase or viewing key.
pub async fn validate_key(backend: &dyn Backend, key: &KeyMaterial) -> Result<(), FieldError> {
    if key.is_empty() {
        return Err(FieldError::new(Field::Key, INVALID_KEY).with_detail("empty key"));
    }
    match backend.validate_key(key).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(FieldError::new(Field::Key, INVALID_KEY)),
        Err(e) => {
            tracing::debug!(error = %e, "key validation call failed");
            Err(FieldError::new(Field::Key, INVALID_KEY).with_detail(e.to_string()))
        }
    }
}
