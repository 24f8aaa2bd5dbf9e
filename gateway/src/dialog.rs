//! File prompt collaborator.

use async_trait::async_trait;
use std::path::PathBuf;

/// Save/open prompts for the election database file.
///
/// `None` means the user dismissed the prompt, which is a cancellation and
/// never an error.
#[async_trait]
pub trait FileDialog: Send + Sync {
    /// Ask where to save a new election database, suggesting `default_name`.
    async fn save_file(&self, default_name: &str) -> Option<PathBuf>;

    /// Ask which existing election database to open.
    async fn open_file(&self) -> Option<PathBuf>;
}
