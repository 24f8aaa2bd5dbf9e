//! Nullable file dialog — answers prompts with preset paths.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Notify;

use zvote_gateway::FileDialog;

/// A dialog that returns preset answers and records each prompt.
///
/// With nothing preset, every prompt behaves like the user dismissed it.
#[derive(Default)]
pub struct NullDialog {
    save_path: Option<PathBuf>,
    open_path: Option<PathBuf>,
    prompts: Mutex<Vec<String>>,
    save_gate: Mutex<Option<Arc<Notify>>>,
}

impl NullDialog {
    /// A dialog whose prompts are all cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer save prompts with `path`.
    pub fn saving_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_path = Some(path.into());
        self
    }

    /// Answer open prompts with `path`.
    pub fn opening(mut self, path: impl Into<PathBuf>) -> Self {
        self.open_path = Some(path.into());
        self
    }

    /// Keep the next save prompts open until the returned handle is notified.
    pub fn hold_save(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.save_gate.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&gate));
        gate
    }

    /// Prompts shown so far: `save:<default name>` or `open`.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, prompt: String) {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt);
    }
}

#[async_trait]
impl FileDialog for NullDialog {
    async fn save_file(&self, default_name: &str) -> Option<PathBuf> {
        self.record(format!("save:{default_name}"));
        let gate = self
            .save_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.save_path.clone()
    }

    async fn open_file(&self) -> Option<PathBuf> {
        self.record("open".to_string());
        self.open_path.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unset_dialog_cancels() {
        let dialog = NullDialog::new();
        assert_eq!(dialog.save_file("Grant round").await, None);
        assert_eq!(dialog.open_file().await, None);
        assert_eq!(dialog.prompts(), vec!["save:Grant round", "open"]);
    }

    #[tokio::test]
    async fn preset_paths_are_returned() {
        let dialog = NullDialog::new().saving_to("/tmp/a.db").opening("/tmp/b.db");
        assert_eq!(dialog.save_file("x").await, Some(PathBuf::from("/tmp/a.db")));
        assert_eq!(dialog.open_file().await, Some(PathBuf::from("/tmp/b.db")));
    }
}
