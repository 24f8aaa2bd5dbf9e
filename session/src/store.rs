//! The election session store.
//!
//! One [`SessionState`] value behind a `tokio::sync::watch` channel. Readers
//! take snapshots or subscribe; only the orchestrator components write, each
//! to its own fields:
//!
//! | Field | Writer |
//! |---|---|
//! | `election`, `address`, `setting_up` | election setup |
//! | `height`, `balance`, `roots`, `sync` | sync coordinator |
//! | `submitting` | submission controller |
//!
//! Every write is also published on the store's [`EventBus`].

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

use zvote_types::{CommitmentRoots, Election, SyncHeight, VotingPower};

use crate::event::{EventBus, SessionEvent};

/// What the sync coordinator is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncKind {
    /// Incremental sync on Overview mount or after a submission.
    Quick,
    /// Full reference-data download with progress.
    Download,
    /// Root recomputation on its own.
    Roots,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SyncPhase {
    #[default]
    Idle,
    Syncing(SyncKind),
    Synced,
    Failed(String),
}

impl SyncPhase {
    pub fn is_syncing(&self) -> bool {
        matches!(self, Self::Syncing(_))
    }
}

/// An operation that at most one caller may run at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activity {
    Setup,
    Sync(SyncKind),
    Submission,
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup => f.write_str("election setup"),
            Self::Sync(SyncKind::Quick) => f.write_str("sync"),
            Self::Sync(SyncKind::Download) => f.write_str("download"),
            Self::Sync(SyncKind::Roots) => f.write_str("root computation"),
            Self::Submission => f.write_str("submission"),
        }
    }
}

impl Activity {
    fn is_running(&self, state: &SessionState) -> bool {
        match self {
            Self::Setup => state.setting_up,
            Self::Sync(_) => state.sync.is_syncing(),
            Self::Submission => state.submitting,
        }
    }

    fn raise(&self, state: &mut SessionState) {
        match self {
            Self::Setup => state.setting_up = true,
            Self::Sync(kind) => state.sync = SyncPhase::Syncing(*kind),
            Self::Submission => state.submitting = true,
        }
    }

    /// Clear the flag. A sync still marked as running falls back to idle;
    /// a sync that already settled keeps its final phase.
    fn clear(&self, state: &mut SessionState) {
        match self {
            Self::Setup => state.setting_up = false,
            Self::Sync(_) => {
                if state.sync.is_syncing() {
                    state.sync = SyncPhase::Idle;
                }
            }
            Self::Submission => state.submitting = false,
        }
    }
}

/// A consistent view of the session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub election: Election,
    pub height: SyncHeight,
    pub balance: Option<VotingPower>,
    pub roots: CommitmentRoots,
    /// The wallet's own vote address, shown on the Delegate screen.
    pub address: Option<String>,
    pub sync: SyncPhase,
    pub submitting: bool,
    pub setting_up: bool,
}

/// Shared handle to the session state. Cheap to clone.
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<watch::Sender<SessionState>>,
    events: Arc<EventBus>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::default());
        Self {
            state: Arc::new(tx),
            events: Arc::new(EventBus::new()),
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receive the latest state whenever it changes. Intermediate values may
    /// be skipped; use [`SessionStore::events`] to see every write.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn election(&self) -> Election {
        self.state.borrow().election.clone()
    }

    pub fn has_election(&self) -> bool {
        self.state.borrow().election.is_loaded()
    }

    pub fn height(&self) -> SyncHeight {
        self.state.borrow().height
    }

    pub fn balance(&self) -> Option<VotingPower> {
        self.state.borrow().balance
    }

    pub fn roots(&self) -> CommitmentRoots {
        self.state.borrow().roots
    }

    pub fn address(&self) -> Option<String> {
        self.state.borrow().address.clone()
    }

    pub fn sync_phase(&self) -> SyncPhase {
        self.state.borrow().sync.clone()
    }

    pub fn is_busy(&self, activity: Activity) -> bool {
        activity.is_running(&self.state.borrow())
    }

    // ── Writers ────────────────────────────────────────────────────────

    /// Replace the election. Loading a different election discards the
    /// height, balance, roots and address derived for the previous one.
    pub(crate) fn set_election(&self, election: Election) {
        let id = election.id.clone();
        let mut replaced = false;
        self.state.send_modify(|s| {
            if s.election.id != election.id {
                s.height = SyncHeight::Unknown;
                s.balance = None;
                s.roots = CommitmentRoots::default();
                s.address = None;
                replaced = true;
            }
            s.election = election;
        });
        if replaced {
            tracing::debug!(election = %id, "election replaced, derived state reset");
        }
        self.events.emit(&SessionEvent::ElectionChanged { id });
    }

    pub(crate) fn set_height(&self, height: SyncHeight) {
        self.state.send_modify(|s| s.height = height);
        self.events.emit(&SessionEvent::HeightChanged(height));
    }

    pub(crate) fn set_balance(&self, balance: VotingPower) {
        self.state.send_modify(|s| s.balance = Some(balance));
        self.events.emit(&SessionEvent::BalanceChanged(balance));
    }

    pub(crate) fn set_roots(&self, roots: CommitmentRoots) {
        self.state.send_modify(|s| s.roots = roots);
        self.events.emit(&SessionEvent::RootsChanged(roots));
    }

    pub(crate) fn set_address(&self, address: Option<String>) {
        self.state.send_modify(|s| s.address = address.clone());
        self.events.emit(&SessionEvent::AddressChanged(address));
    }

    pub(crate) fn set_sync_phase(&self, phase: SyncPhase) {
        self.state.send_modify(|s| s.sync = phase.clone());
        self.events.emit(&SessionEvent::SyncPhaseChanged(phase));
    }

    /// Atomically raise the flag for `activity` unless it is already raised.
    ///
    /// The flag stays raised until the returned guard is dropped, on every
    /// exit path of the caller.
    pub(crate) fn try_claim(&self, activity: Activity) -> Option<ActivityGuard> {
        let claimed = self.state.send_if_modified(|s| {
            if activity.is_running(s) {
                false
            } else {
                activity.raise(s);
                true
            }
        });
        if !claimed {
            return None;
        }
        self.emit_activity(activity, true);
        Some(ActivityGuard {
            store: self.clone(),
            activity,
        })
    }

    fn release(&self, activity: Activity) {
        self.state.send_modify(|s| activity.clear(s));
        self.emit_activity(activity, false);
    }

    fn emit_activity(&self, activity: Activity, busy: bool) {
        if let Activity::Sync(_) = activity {
            self.events
                .emit(&SessionEvent::SyncPhaseChanged(self.sync_phase()));
        }
        self.events
            .emit(&SessionEvent::ActivityChanged { activity, busy });
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds an activity flag raised; clears it on drop.
pub(crate) struct ActivityGuard {
    store: SessionStore,
    activity: Activity,
}

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.store.release(self.activity);
    }
}
