//! Chain heights and registration-window progress.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The wallet's synchronized chain height as last observed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncHeight {
    /// No sync attempt has reported a height yet.
    #[default]
    Unknown,
    /// The backend answered, but has no height yet (reference data not downloaded).
    NotSynced,
    /// The backend's synchronized height.
    At(u32),
}

impl SyncHeight {
    /// Map the backend's `integer | null` answer.
    pub fn from_backend(height: Option<u32>) -> Self {
        match height {
            Some(h) => Self::At(h),
            None => Self::NotSynced,
        }
    }

    pub fn value(&self) -> Option<u32> {
        match self {
            Self::At(h) => Some(*h),
            _ => None,
        }
    }

    /// True while the height is not a number, i.e. reference data still
    /// has to be downloaded.
    pub fn needs_download(&self) -> bool {
        self.value().is_none()
    }
}

impl fmt::Display for SyncHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("unknown"),
            Self::NotSynced => f.write_str("not synced"),
            Self::At(h) => write!(f, "{h}"),
        }
    }
}

/// Where a height falls relative to the registration window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowPosition {
    BeforeWindow,
    InWindow,
    AfterWindow,
}

/// A progress percentage together with its window classification.
///
/// The percentage is never clamped: values below 0 or above 100 are kept
/// and reported through [`WindowPosition`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressReading {
    pub pct: f64,
    pub position: WindowPosition,
}

/// `100 * (height - start) / (end - start)`, or `None` when the height is
/// not known or the window is empty.
pub fn progress_pct(height: SyncHeight, start_height: u32, end_height: u32) -> Option<f64> {
    let height = height.value()?;
    if start_height == end_height {
        return None;
    }
    let elapsed = 100 * (i64::from(height) - i64::from(start_height));
    let span = i64::from(end_height) - i64::from(start_height);
    Some(elapsed as f64 / span as f64)
}

/// Like [`progress_pct`], classified against the [0, 100] range.
pub fn progress(height: SyncHeight, start_height: u32, end_height: u32) -> Option<ProgressReading> {
    let pct = progress_pct(height, start_height, end_height)?;
    let position = if pct < 0.0 {
        WindowPosition::BeforeWindow
    } else if pct > 100.0 {
        WindowPosition::AfterWindow
    } else {
        WindowPosition::InWindow
    };
    Some(ProgressReading { pct, position })
}
