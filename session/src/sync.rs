//! Sync coordinator: quick syncs, the reference-data download and roots.
//!
//! Owns the store's `height`, `balance`, `roots` and `sync` fields. Only one
//! sync-like operation runs at a time; a second trigger while one is active
//! returns [`SyncOutcome::AlreadyRunning`] without touching the backend.

use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use zvote_gateway::{progress_channel, Backend, GatewayError};
use zvote_types::{CommitmentRoot, CommitmentRoots, SyncHeight};

use crate::ledger_gate::LedgerGate;
use crate::store::{Activity, SessionStore, SyncKind, SyncPhase};
use crate::SessionError;

pub const NF_ROOT_PROP: &str = "nf_root";
pub const CMX_ROOT_PROP: &str = "cmx_root";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Quick sync succeeded and the reads were refreshed.
    Synced,
    /// Quick sync failed; whatever reads succeeded were still applied.
    Unsynced,
    /// Download or root computation finished.
    Completed,
    /// Another sync-like operation was already in flight.
    AlreadyRunning,
    /// The local wait on a download was abandoned.
    Cancelled,
}

struct Inner {
    backend: Arc<dyn Backend>,
    store: SessionStore,
    gate: LedgerGate,
    cancel: broadcast::Sender<()>,
}

/// Cheap to clone; clones share the same in-flight state.
#[derive(Clone)]
pub struct SyncCoordinator {
    inner: Arc<Inner>,
}

impl SyncCoordinator {
    pub fn new(backend: Arc<dyn Backend>, store: SessionStore, gate: LedgerGate) -> Self {
        let (cancel, _) = broadcast::channel(1);
        Self {
            inner: Arc::new(Inner {
                backend,
                store,
                gate,
                cancel,
            }),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.inner.store.sync_phase().is_syncing()
    }

    /// Best-effort incremental sync, then one height read and one balance
    /// read. Never fails: problems are logged and leave fields as they were.
    pub async fn quick_sync(&self) -> SyncOutcome {
        let Some(_busy) = self.inner.store.try_claim(Activity::Sync(SyncKind::Quick)) else {
            tracing::debug!("sync already running, quick sync skipped");
            return SyncOutcome::AlreadyRunning;
        };
        let _ledger = self.inner.gate.enter().await;

        let synced = match self.inner.backend.sync().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "quick sync failed");
                false
            }
        };

        match self.inner.backend.get_sync_height().await {
            Ok(height) => self.inner.store.set_height(SyncHeight::from_backend(height)),
            Err(e) => tracing::warn!(error = %e, "could not read sync height"),
        }
        match self.inner.backend.get_available_balance().await {
            Ok(balance) => self.inner.store.set_balance(balance),
            Err(e) => tracing::warn!(error = %e, "could not read balance"),
        }

        if synced {
            self.inner.store.set_sync_phase(SyncPhase::Synced);
            SyncOutcome::Synced
        } else {
            SyncOutcome::Unsynced
        }
    }

    /// Run a quick sync on its own task.
    pub fn spawn_refresh(&self) -> JoinHandle<SyncOutcome> {
        let this = self.clone();
        tokio::spawn(async move { this.quick_sync().await })
    }

    /// Download the election's reference data.
    ///
    /// Every height the backend reports is written to the store in arrival
    /// order while the download runs. Once it returns, the height and
    /// balance are read back and the commitment roots are recomputed.
    pub async fn download(&self) -> Result<SyncOutcome, SessionError> {
        let store = &self.inner.store;
        if !store.has_election() {
            return Err(SessionError::NoElection);
        }
        let Some(_busy) = store.try_claim(Activity::Sync(SyncKind::Download)) else {
            tracing::debug!("sync already running, download not started");
            return Ok(SyncOutcome::AlreadyRunning);
        };
        let mut cancelled = self.inner.cancel.subscribe();
        let _ledger = tokio::select! {
            biased;
            _ = cancelled.recv() => {
                tracing::info!("reference data download cancelled before it started");
                return Ok(SyncOutcome::Cancelled);
            }
            ledger = self.inner.gate.enter() => ledger,
        };

        tracing::info!(election = %store.election().id, "reference data download started");
        let (tx, mut rx) = progress_channel();
        let mut producer = self.inner.backend.download_reference_data(tx);

        let finished = loop {
            tokio::select! {
                biased;
                Some(height) = rx.next() => store.set_height(SyncHeight::At(height)),
                _ = cancelled.recv() => break None,
                result = &mut producer => break Some(result),
            }
        };
        drop(producer);
        rx.close();

        let Some(result) = finished else {
            tracing::info!("reference data download cancelled");
            return Ok(SyncOutcome::Cancelled);
        };
        while let Some(height) = rx.next().await {
            store.set_height(SyncHeight::At(height));
        }
        if let Err(e) = result {
            return Err(self.fail(e));
        }

        let height = self
            .inner
            .backend
            .get_sync_height()
            .await
            .map_err(|e| self.fail(e))?;
        store.set_height(SyncHeight::from_backend(height));
        let balance = self
            .inner
            .backend
            .get_available_balance()
            .await
            .map_err(|e| self.fail(e))?;
        store.set_balance(balance);

        if let Err(e) = self.compute_roots().await {
            tracing::warn!(error = %e, "could not refresh commitment roots");
        }

        tracing::info!(height = ?height, balance = %balance, "reference data download complete");
        store.set_sync_phase(SyncPhase::Synced);
        Ok(SyncOutcome::Completed)
    }

    /// Stop waiting for an in-flight download. A download still queued on
    /// the ledger gate never reaches the backend; one already running may
    /// keep going there. Returns whether a download was waiting.
    pub fn cancel(&self) -> bool {
        self.inner.cancel.send(()).is_ok()
    }

    /// Recompute the commitment roots on their own.
    pub async fn refresh_roots(&self) -> Result<SyncOutcome, SessionError> {
        let previous = self.inner.store.sync_phase();
        let Some(_busy) = self.inner.store.try_claim(Activity::Sync(SyncKind::Roots)) else {
            return Ok(SyncOutcome::AlreadyRunning);
        };
        let _ledger = self.inner.gate.enter().await;
        let result = self.compute_roots().await;
        self.inner.store.set_sync_phase(previous);
        result.map_err(SessionError::Backend)?;
        Ok(SyncOutcome::Completed)
    }

    async fn compute_roots(&self) -> Result<(), GatewayError> {
        self.inner.backend.compute_roots().await?;
        let roots = CommitmentRoots {
            nf_root: self.read_root(NF_ROOT_PROP).await?,
            cmx_root: self.read_root(CMX_ROOT_PROP).await?,
        };
        self.inner.store.set_roots(roots);
        Ok(())
    }

    async fn read_root(&self, name: &str) -> Result<Option<CommitmentRoot>, GatewayError> {
        match self.inner.backend.get_prop(name).await {
            Ok(value) => CommitmentRoot::from_hex(&value)
                .map(Some)
                .map_err(|e| GatewayError::Decode(format!("{name}: {e}"))),
            Err(GatewayError::UnknownProperty(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn fail(&self, error: GatewayError) -> SessionError {
        tracing::error!(error = %error, "reference data download failed");
        self.inner
            .store
            .set_sync_phase(SyncPhase::Failed(error.to_string()));
        SessionError::Sync(error)
    }
}
