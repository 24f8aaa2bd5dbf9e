//! The election session: one store shared by every workflow.

use rust_decimal::Decimal;
use std::sync::Arc;

use zvote_gateway::{Backend, FileDialog};
use zvote_types::{CommitmentRoots, Election, ProgressReading, SyncHeight};

use crate::config::SessionConfig;
use crate::history::HistoryProjection;
use crate::screen::{gate, Screen, ScreenGate};
use crate::setup::ElectionSetup;
use crate::store::{SessionStore, SyncPhase};
use crate::submit::SubmissionController;
use crate::sync::{SyncCoordinator, SyncOutcome};

/// What the Overview screen renders.
#[derive(Clone, Debug, PartialEq)]
pub struct OverviewSnapshot {
    pub election: Election,
    pub height: SyncHeight,
    pub progress: Option<ProgressReading>,
    /// Spendable voting power in whole units, if it has been read.
    pub balance: Option<Decimal>,
    pub roots: CommitmentRoots,
    pub phase: SyncPhase,
    /// The reference data has not been downloaded yet.
    pub needs_download: bool,
}

/// Wires the setup, sync, submission and history workflows to one backend,
/// one file dialog and one [`SessionStore`].
#[derive(Clone)]
pub struct ElectionSession {
    store: SessionStore,
    setup: ElectionSetup,
    sync: SyncCoordinator,
    submissions: SubmissionController,
    history: HistoryProjection,
}

impl ElectionSession {
    pub fn new(
        backend: Arc<dyn Backend>,
        dialog: Arc<dyn FileDialog>,
        config: &SessionConfig,
    ) -> Self {
        let store = SessionStore::new();
        let gate = config.ledger_gate();
        let setup = ElectionSetup::new(
            Arc::clone(&backend),
            dialog,
            store.clone(),
            gate.clone(),
        );
        let sync = SyncCoordinator::new(Arc::clone(&backend), store.clone(), gate.clone());
        let submissions = SubmissionController::new(
            Arc::clone(&backend),
            store.clone(),
            gate,
            sync.clone(),
            config.refresh_after_submission,
        );
        let history = HistoryProjection::new(backend, store.clone());
        Self {
            store,
            setup,
            sync,
            submissions,
            history,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn setup(&self) -> &ElectionSetup {
        &self.setup
    }

    pub fn sync(&self) -> &SyncCoordinator {
        &self.sync
    }

    pub fn submissions(&self) -> &SubmissionController {
        &self.submissions
    }

    pub fn history(&self) -> &HistoryProjection {
        &self.history
    }

    pub fn gate(&self, screen: Screen) -> ScreenGate {
        gate(screen, &self.store.election())
    }

    /// Overview mount: quick sync, then the snapshot to render. Without an
    /// election nothing is synced.
    pub async fn mount_overview(&self) -> ScreenGate {
        let screen = self.gate(Screen::Overview);
        if let ScreenGate::Ready(_) = screen {
            if self.sync.quick_sync().await == SyncOutcome::AlreadyRunning {
                tracing::debug!("overview mounted during a running sync");
            }
        }
        screen
    }

    pub fn overview(&self) -> OverviewSnapshot {
        let state = self.store.snapshot();
        OverviewSnapshot {
            progress: state.election.progress(state.height),
            needs_download: state.height.needs_download(),
            balance: state.balance.map(|b| b.to_decimal()),
            election: state.election,
            height: state.height,
            roots: state.roots,
            phase: state.sync,
        }
    }

    /// Delegate mount: read the wallet's own address for display.
    pub async fn mount_delegate(&self) -> Option<String> {
        if let ScreenGate::Ready(_) = self.gate(Screen::Delegate) {
            self.setup.refresh_address().await;
        }
        self.own_address()
    }

    pub fn own_address(&self) -> Option<String> {
        self.store.address()
    }
}
