//! File prompts answered from command-line arguments.

use async_trait::async_trait;
use std::path::PathBuf;

use zvote_gateway::FileDialog;

/// A [`FileDialog`] that answers with the `--db` path given on the command
/// line. Without one, the prompt counts as cancelled.
pub struct PresetDialog {
    path: Option<PathBuf>,
}

impl PresetDialog {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

#[async_trait]
impl FileDialog for PresetDialog {
    async fn save_file(&self, default_name: &str) -> Option<PathBuf> {
        if self.path.is_none() {
            tracing::debug!(default_name, "no --db given, election will not be saved");
        }
        self.path.clone()
    }

    async fn open_file(&self) -> Option<PathBuf> {
        self.path.clone()
    }
}
