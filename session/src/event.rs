//! Events published on every session store write.

use std::sync::{PoisonError, RwLock};

use zvote_types::{CommitmentRoots, SyncHeight, VotingPower};

use crate::store::{Activity, SyncPhase};

/// Session-level changes that observers can subscribe to via the [`EventBus`].
///
/// Unlike a `watch` receiver, a listener sees every intermediate value, in
/// the order the writes happened.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// A different election was loaded (an empty id means none).
    ElectionChanged { id: String },
    /// The synchronized height changed, including each download progress step.
    HeightChanged(SyncHeight),
    BalanceChanged(VotingPower),
    RootsChanged(CommitmentRoots),
    AddressChanged(Option<String>),
    SyncPhaseChanged(SyncPhase),
    /// An activity flag was raised or cleared.
    ActivityChanged { activity: Activity, busy: bool },
}

type Listener = Box<dyn Fn(&SessionEvent) + Send + Sync>;

/// Synchronous fan-out event bus for session events.
///
/// Listeners are invoked inline on the writing task; keep handlers fast and
/// do not subscribe from inside a handler.
pub struct EventBus {
    listeners: RwLock<Vec<Listener>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, listener: Box<dyn Fn(&SessionEvent) + Send + Sync>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    pub fn emit(&self, event: &SessionEvent) {
        let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        for listener in listeners.iter() {
            listener(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
