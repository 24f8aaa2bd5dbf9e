//! Mutual exclusion of backend operations that touch the wallet's notes.
//!
//! Syncs and submissions both move the spendable balance. With an exclusive
//! gate they take turns: a submission issued during a download waits for
//! the download to settle, and the reverse.

use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone, Debug, Default)]
pub struct LedgerGate {
    lock: Option<Arc<Mutex<()>>>,
}

impl LedgerGate {
    pub fn exclusive() -> Self {
        Self {
            lock: Some(Arc::new(Mutex::new(()))),
        }
    }

    /// A gate that never blocks.
    pub fn disabled() -> Self {
        Self { lock: None }
    }

    pub fn is_exclusive(&self) -> bool {
        self.lock.is_some()
    }

    /// Wait for exclusive access. The returned guard holds it until dropped.
    pub async fn enter(&self) -> Option<OwnedMutexGuard<()>> {
        match &self.lock {
            Some(lock) => Some(Arc::clone(lock).lock_owned().await),
            None => None,
        }
    }
}
