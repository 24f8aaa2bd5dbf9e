//! Nullable backend — scripted wallet/ledger responses for testing.
//!
//! Holds an in-memory stand-in for everything the real backend persists:
//! the registered election, saved databases, height, balance and recorded
//! votes. Each operation counts its calls and can be told to fail or panic.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

use zvote_gateway::{Backend, GatewayError, ProgressSender};
use zvote_types::{Election, KeyMaterial, SubmissionKind, VoteRecord, VotingPower};

const DEFAULT_ADDRESS: &str = "zvote1nullwallet";

#[derive(Default)]
struct NullState {
    documents: HashMap<String, String>,
    /// Keys accepted by `validate_key`. Empty means any non-blank key.
    valid_keys: HashSet<String>,
    election: Election,
    registered_url: Option<String>,
    registered_key: Option<String>,
    databases: HashMap<PathBuf, Election>,
    address: Option<String>,
    height: Option<u32>,
    balance: u64,
    progress: Vec<u32>,
    height_after_download: Option<u32>,
    props: HashMap<String, String>,
    votes: Vec<VoteRecord>,
    submissions: Vec<(SubmissionKind, String, VotingPower)>,
    failures: HashMap<String, String>,
    panics: HashSet<String>,
}

/// A [`Backend`] that answers from memory.
///
/// Configure it with the `with_*` builders before handing it out, and steer
/// it afterwards through the `&self` controls (`fail`, `recover`,
/// `panic_on`, `hold_download`).
#[derive(Default)]
pub struct NullBackend {
    state: Mutex<NullState>,
    calls: Mutex<HashMap<String, usize>>,
    download_gate: Mutex<Option<Arc<Notify>>>,
}

impl NullBackend {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Builders ───────────────────────────────────────────────────────

    /// Serve `body` for `http_get(url)`. Unknown URLs answer 404.
    pub fn with_document(self, url: &str, body: &str) -> Self {
        self.state().documents.insert(url.to_string(), body.to_string());
        self
    }

    /// Accept `key` in `validate_key`. Once any key is listed, others are rejected.
    pub fn accepting_key(self, key: &str) -> Self {
        self.state().valid_keys.insert(key.to_string());
        self
    }

    /// Start with `election` already registered, as after a restart.
    pub fn with_election(self, election: Election) -> Self {
        self.state().election = election;
        self
    }

    /// A database file that `open_db(path)` restores `election` from.
    pub fn with_database(self, path: impl Into<PathBuf>, election: Election) -> Self {
        self.state().databases.insert(path.into(), election);
        self
    }

    pub fn with_height(self, height: u32) -> Self {
        self.state().height = Some(height);
        self
    }

    pub fn with_balance(self, balance: VotingPower) -> Self {
        self.state().balance = balance.subunits();
        self
    }

    pub fn with_address(self, address: &str) -> Self {
        self.state().address = Some(address.to_string());
        self
    }

    /// Heights the download reports, in order.
    pub fn with_progress(self, heights: &[u32]) -> Self {
        self.state().progress = heights.to_vec();
        self
    }

    /// Height the backend reports once the download finishes. Defaults to
    /// the last progress height.
    pub fn with_height_after_download(self, height: u32) -> Self {
        self.state().height_after_download = Some(height);
        self
    }

    pub fn with_prop(self, name: &str, value: &str) -> Self {
        self.state().props.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_votes(self, votes: Vec<VoteRecord>) -> Self {
        self.state().votes = votes;
        self
    }

    // ── Controls ───────────────────────────────────────────────────────

    /// Make every later call to `op` fail with `message`.
    pub fn fail(&self, op: &str, message: &str) {
        self.state()
            .failures
            .insert(op.to_string(), message.to_string());
    }

    /// Undo [`NullBackend::fail`] and [`NullBackend::panic_on`] for `op`.
    pub fn recover(&self, op: &str) {
        let mut state = self.state();
        state.failures.remove(op);
        state.panics.remove(op);
    }

    /// Make every later call to `op` panic.
    pub fn panic_on(&self, op: &str) {
        self.state().panics.insert(op.to_string());
    }

    /// Stall the next downloads until the returned handle is notified.
    pub fn hold_download(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self
            .download_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&gate));
        gate
    }

    // ── Inspection ─────────────────────────────────────────────────────

    /// How many times `op` was called, including calls that failed.
    pub fn calls(&self, op: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(op)
            .copied()
            .unwrap_or(0)
    }

    /// Accepted submissions as `(kind, address, amount)`.
    pub fn submissions(&self) -> Vec<(SubmissionKind, String, VotingPower)> {
        self.state().submissions.clone()
    }

    pub fn saved_paths(&self) -> Vec<PathBuf> {
        self.state().databases.keys().cloned().collect()
    }

    pub fn registered_url(&self) -> Option<String> {
        self.state().registered_url.clone()
    }

    pub fn registered_key(&self) -> Option<String> {
        self.state().registered_key.clone()
    }

    pub fn height(&self) -> Option<u32> {
        self.state().height
    }

    fn state(&self) -> MutexGuard<'_, NullState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count the call, then apply any scripted panic or failure.
    fn enter(&self, op: &str) -> Result<(), GatewayError> {
        *self
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(op.to_string())
            .or_insert(0) += 1;
        let (panics, failure) = {
            let state = self.state();
            (state.panics.contains(op), state.failures.get(op).cloned())
        };
        if panics {
            panic!("null backend: scripted panic in {op}");
        }
        match failure {
            Some(message) => Err(GatewayError::Backend(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Backend for NullBackend {
    async fn http_get(&self, url: &str) -> Result<String, GatewayError> {
        self.enter("http_get")?;
        self.state()
            .documents
            .get(url)
            .cloned()
            .ok_or(GatewayError::Status(404))
    }

    async fn set_election(
        &self,
        url: &str,
        election: &Election,
        key: &KeyMaterial,
    ) -> Result<(), GatewayError> {
        self.enter("set_election")?;
        let mut state = self.state();
        state.election = election.clone();
        state.registered_url = Some(url.to_string());
        state.registered_key = Some(key.expose().to_string());
        Ok(())
    }

    async fn save_db(&self, path: &Path) -> Result<(), GatewayError> {
        self.enter("save_db")?;
        let mut state = self.state();
        let election = state.election.clone();
        state.databases.insert(path.to_path_buf(), election);
        Ok(())
    }

    async fn open_db(&self, path: &Path) -> Result<(), GatewayError> {
        self.enter("open_db")?;
        let mut state = self.state();
        let election = state
            .databases
            .get(path)
            .cloned()
            .ok_or_else(|| GatewayError::Backend(format!("no database at {}", path.display())))?;
        state.election = election;
        Ok(())
    }

    async fn get_election(&self) -> Result<Election, GatewayError> {
        self.enter("get_election")?;
        Ok(self.state().election.clone())
    }

    async fn validate_key(&self, key: &KeyMaterial) -> Result<bool, GatewayError> {
        self.enter("validate_key")?;
        let state = self.state();
        if state.valid_keys.is_empty() {
            return Ok(!key.is_empty());
        }
        Ok(state.valid_keys.contains(key.expose()))
    }

    async fn get_address(&self) -> Result<String, GatewayError> {
        self.enter("get_address")?;
        Ok(self
            .state()
            .address
            .clone()
            .unwrap_or_else(|| DEFAULT_ADDRESS.to_string()))
    }

    async fn sync(&self) -> Result<(), GatewayError> {
        self.enter("sync")
    }

    async fn get_sync_height(&self) -> Result<Option<u32>, GatewayError> {
        self.enter("get_sync_height")?;
        Ok(self.state().height)
    }

    async fn get_available_balance(&self) -> Result<VotingPower, GatewayError> {
        self.enter("get_available_balance")?;
        Ok(VotingPower::from_subunits(self.state().balance))
    }

    async fn download_reference_data(
        &self,
        progress: ProgressSender,
    ) -> Result<(), GatewayError> {
        self.enter("download_reference_data")?;
        let gate = self
            .download_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let heights = self.state().progress.clone();
        for height in &heights {
            progress.report(*height).await?;
        }
        let mut state = self.state();
        if let Some(final_height) = state.height_after_download.or(heights.last().copied()) {
            state.height = Some(final_height);
        }
        Ok(())
    }

    async fn compute_roots(&self) -> Result<(), GatewayError> {
        self.enter("compute_roots")
    }

    async fn get_prop(&self, name: &str) -> Result<String, GatewayError> {
        self.enter("get_prop")?;
        self.state()
            .props
            .get(name)
            .cloned()
            .ok_or_else(|| GatewayError::UnknownProperty(name.to_string()))
    }

    async fn submit(
        &self,
        kind: SubmissionKind,
        address: &str,
        amount: VotingPower,
    ) -> Result<String, GatewayError> {
        self.enter(kind.as_str())?;
        let mut state = self.state();
        let remaining = VotingPower::from_subunits(state.balance)
            .checked_sub(amount)
            .ok_or_else(|| GatewayError::Backend("Not enough funds".to_string()))?;
        state.balance = remaining.subunits();

        let id = u32::try_from(state.votes.len() + 1).unwrap_or(u32::MAX);
        let hash = format!("{id:064x}");
        state.votes.push(VoteRecord {
            id,
            hash: hash.clone(),
            address: address.to_string(),
            amount,
            choice: None,
        });
        state.submissions.push((kind, address.to_string(), amount));
        Ok(hash)
    }

    async fn fetch_votes(&self) -> Result<Vec<VoteRecord>, GatewayError> {
        self.enter("fetch_votes")?;
        Ok(self.state().votes.clone())
    }
}
