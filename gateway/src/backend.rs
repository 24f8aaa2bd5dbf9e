//! The backend gateway contract.

use async_trait::async_trait;
use std::path::Path;

use zvote_types::{Election, KeyMaterial, SubmissionKind, VoteRecord, VotingPower};

use crate::progress::ProgressSender;
use crate::GatewayError;

/// Operations of the wallet/ledger backend that the session orchestrator
/// drives.
///
/// The backend owns everything that must survive a restart: the registered
/// election, the key material, the downloaded chain data and the election
/// database file. Every call is a request/response pair except
/// [`Backend::download_reference_data`], which also streams heights.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Fetch a document over HTTP. Network failures and non-2xx statuses are errors.
    async fn http_get(&self, url: &str) -> Result<String, GatewayError>;

    /// Register an election together with the key used to prove eligibility.
    async fn set_election(
        &self,
        url: &str,
        election: &Election,
        key: &KeyMaterial,
    ) -> Result<(), GatewayError>;

    /// Persist the session database to `path`.
    async fn save_db(&self, path: &Path) -> Result<(), GatewayError>;

    /// Reopen a previously saved session database.
    async fn open_db(&self, path: &Path) -> Result<(), GatewayError>;

    /// The registered election, or the absent sentinel.
    async fn get_election(&self) -> Result<Election, GatewayError>;

    /// Whether `key` is a seed phrase or viewing key the backend accepts.
    async fn validate_key(&self, key: &KeyMaterial) -> Result<bool, GatewayError>;

    /// The wallet's own vote address.
    async fn get_address(&self) -> Result<String, GatewayError>;

    /// Best-effort incremental sync.
    async fn sync(&self) -> Result<(), GatewayError>;

    /// Synchronized height, or `None` before any reference data exists.
    async fn get_sync_height(&self) -> Result<Option<u32>, GatewayError>;

    /// Spendable voting power in subunits.
    async fn get_available_balance(&self) -> Result<VotingPower, GatewayError>;

    /// Download the election's reference data, pushing heights to `progress`
    /// as they are reached. Returns once the download has finished.
    async fn download_reference_data(&self, progress: ProgressSender)
        -> Result<(), GatewayError>;

    /// Recompute the nullifier and commitment roots.
    async fn compute_roots(&self) -> Result<(), GatewayError>;

    /// Read a named session property.
    async fn get_prop(&self, name: &str) -> Result<String, GatewayError>;

    /// Submit a vote or delegation and return its receipt hash.
    async fn submit(
        &self,
        kind: SubmissionKind,
        address: &str,
        amount: VotingPower,
    ) -> Result<String, GatewayError>;

    /// Every submission made from this wallet.
    async fn fetch_votes(&self) -> Result<Vec<VoteRecord>, GatewayError>;
}
