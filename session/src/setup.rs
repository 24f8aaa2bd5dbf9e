//! Election setup: fetch, register and persist an election, or reopen one.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use zvote_gateway::{Backend, FileDialog};
use zvote_types::{Election, KeyMaterial};

use crate::ledger_gate::LedgerGate;
use crate::screen::Screen;
use crate::store::{Activity, SessionStore};
use crate::validate::check_url_syntax;
use crate::SessionError;

/// Result of a setup workflow that got as far as loading an election.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetupOutcome {
    pub election: Election,
    /// Where the election database was saved or opened from. `None` when
    /// the save prompt was cancelled.
    pub file: Option<PathBuf>,
    /// Screen to navigate to, or `None` to stay on the setup screen.
    pub next: Option<Screen>,
}

/// Runs the setup workflows. Owns the store's `election`, `address` and
/// `setting_up` fields.
#[derive(Clone)]
pub struct ElectionSetup {
    backend: Arc<dyn Backend>,
    dialog: Arc<dyn FileDialog>,
    store: SessionStore,
    gate: LedgerGate,
}

impl ElectionSetup {
    pub fn new(
        backend: Arc<dyn Backend>,
        dialog: Arc<dyn FileDialog>,
        store: SessionStore,
        gate: LedgerGate,
    ) -> Self {
        Self {
            backend,
            dialog,
            store,
            gate,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.store.is_busy(Activity::Setup)
    }

    /// Fetch the election published at `url`, register it with `key`, then
    /// offer to save the election database.
    ///
    /// The store's election is replaced as soon as registration succeeds, so
    /// a cancelled save prompt leaves the election loaded but unsaved. The
    /// ledger gate is held around `set_election` and `save_db` only, never
    /// while the prompt is open.
    pub async fn load_election_from_url(
        &self,
        url: &str,
        key: &KeyMaterial,
    ) -> Result<SetupOutcome, SessionError> {
        let _busy = self
            .store
            .try_claim(Activity::Setup)
            .ok_or(SessionError::Busy(Activity::Setup))?;
        let url = check_url_syntax(url)?;

        let body = self
            .backend
            .http_get(url.as_str())
            .await
            .map_err(SessionError::Fetch)?;
        let election = Election::from_document(&body).map_err(SessionError::Parse)?;
        {
            let _ledger = self.gate.enter().await;
            self.backend
                .set_election(url.as_str(), &election, key)
                .await
                .map_err(SessionError::Registration)?;
        }

        tracing::info!(
            election = %election.id,
            name = %election.name,
            candidates = election.candidates.len(),
            "election registered"
        );
        self.store.set_election(election.clone());
        self.refresh_address().await;

        let Some(path) = self.dialog.save_file(&election.name).await else {
            tracing::info!(election = %election.id, "save prompt cancelled, election not saved");
            return Ok(SetupOutcome {
                election,
                file: None,
                next: None,
            });
        };
        {
            let _ledger = self.gate.enter().await;
            self.backend
                .save_db(&path)
                .await
                .map_err(SessionError::Persist)?;
        }
        tracing::info!(path = %path.display(), "election database saved");

        Ok(SetupOutcome {
            election,
            file: Some(path),
            next: Some(Screen::Overview),
        })
    }

    /// Ask for a saved election database and open it. A cancelled prompt
    /// yields `Ok(None)`.
    pub async fn open_election(&self) -> Result<Option<SetupOutcome>, SessionError> {
        if self.is_busy() {
            return Err(SessionError::Busy(Activity::Setup));
        }
        match self.dialog.open_file().await {
            Some(path) => self.open_election_from_file(&path).await.map(Some),
            None => {
                tracing::debug!("open prompt cancelled");
                Ok(None)
            }
        }
    }

    /// Open the election database at `path` and load its election.
    pub async fn open_election_from_file(
        &self,
        path: &Path,
    ) -> Result<SetupOutcome, SessionError> {
        let _busy = self
            .store
            .try_claim(Activity::Setup)
            .ok_or(SessionError::Busy(Activity::Setup))?;
        let election = {
            let _ledger = self.gate.enter().await;
            self.backend
                .open_db(path)
                .await
                .map_err(SessionError::Open)?;
            self.backend
                .get_election()
                .await
                .map_err(SessionError::Backend)?
        };
        if election.is_absent() {
            tracing::warn!(path = %path.display(), "opened database holds no election");
        } else {
            tracing::info!(election = %election.id, path = %path.display(), "election opened");
        }
        self.store.set_election(election.clone());
        self.refresh_address().await;

        Ok(SetupOutcome {
            election,
            file: Some(path.to_path_buf()),
            next: Some(Screen::Overview),
        })
    }

    /// Load whatever election the backend already holds into the store.
    pub async fn restore(&self) -> Result<Election, SessionError> {
        let election = self
            .backend
            .get_election()
            .await
            .map_err(SessionError::Backend)?;
        self.store.set_election(election.clone());
        if election.is_loaded() {
            tracing::info!(election = %election.id, "restored election from backend");
            self.refresh_address().await;
        }
        Ok(election)
    }

    /// Read the wallet's own vote address into the store. Best effort.
    pub async fn refresh_address(&self) {
        match self.backend.get_address().await {
            Ok(address) => self.store.set_address(Some(address)),
            Err(e) => tracing::warn!(error = %e, "could not read wallet address"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zvote_nullables::{NullBackend, NullDialog};

    const URL: &str = "https://vote.example.org/e1.json";
    const DOC: &str = r#"{"id": "e1", "name": "Grant round", "start_height": 10,
        "end_height": 20, "candidates": [{"address": "A", "choice": "Yes"}]}"#;

    fn harness(backend: &Arc<NullBackend>, dialog: NullDialog) -> (ElectionSetup, SessionStore) {
        let store = SessionStore::new();
        let setup = ElectionSetup::new(
            Arc::clone(backend) as Arc<dyn Backend>,
            Arc::new(dialog),
            store.clone(),
            LedgerGate::exclusive(),
        );
        (setup, store)
    }

    #[tokio::test]
    async fn full_setup_saves_and_moves_to_overview() {
        let backend = Arc::new(NullBackend::new().with_document(URL, DOC));
        let (setup, store) = harness(&backend, NullDialog::new().saving_to("/tmp/e1.db"));

        let outcome = setup
            .load_election_from_url(URL, &KeyMaterial::new("uview1x"))
            .await
            .unwrap();
        assert_eq!(outcome.next, Some(Screen::Overview));
        assert_eq!(outcome.file, Some(PathBuf::from("/tmp/e1.db")));
        assert_eq!(store.election().id, "e1");
        assert_eq!(backend.registered_key().as_deref(), Some("uview1x"));
        assert_eq!(store.address().as_deref(), Some("zvote1nullwallet"));
        assert!(!setup.is_busy());
    }

    #[tokio::test]
    async fn malformed_url_fails_before_fetch() {
        let backend = Arc::new(NullBackend::new());
        let (setup, store) = harness(&backend, NullDialog::new());
        let err = setup
            .load_election_from_url("", &KeyMaterial::new("k"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)));
        assert_eq!(backend.calls("http_get"), 0);
        assert!(!store.has_election());
    }

    #[tokio::test]
    async fn each_step_maps_to_its_own_error() {
        let backend = Arc::new(NullBackend::new().with_document(URL, "not json"));
        let (setup, store) = harness(&backend, NullDialog::new().saving_to("/tmp/x.db"));
        let key = KeyMaterial::new("k");

        let missing = "https://vote.example.org/missing.json";
        let err = setup.load_election_from_url(missing, &key).await.unwrap_err();
        assert!(matches!(err, SessionError::Fetch(_)));

        let err = setup.load_election_from_url(URL, &key).await.unwrap_err();
        assert!(matches!(err, SessionError::Parse(_)));
        assert_eq!(backend.calls("set_election"), 0);
        assert!(!store.has_election());
    }

    #[tokio::test]
    async fn registration_failure_leaves_store_untouched() {
        let backend = Arc::new(NullBackend::new().with_document(URL, DOC));
        backend.fail("set_election", "invalid viewing key");
        let (setup, store) = harness(&backend, NullDialog::new());
        let err = setup
            .load_election_from_url(URL, &KeyMaterial::new("k"))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to register election: invalid viewing key"
        );
        assert!(!store.has_election());
    }

    #[tokio::test]
    async fn save_failure_is_a_persist_error() {
        let backend = Arc::new(NullBackend::new().with_document(URL, DOC));
        backend.fail("save_db", "disk full");
        let (setup, store) = harness(&backend, NullDialog::new().saving_to("/tmp/e1.db"));
        let err = setup
            .load_election_from_url(URL, &KeyMaterial::new("k"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Persist(_)));
        // Registration already happened.
        assert!(store.has_election());
    }

    #[tokio::test]
    async fn setup_is_refused_while_another_runs() {
        let backend = Arc::new(NullBackend::new().with_document(URL, DOC));
        let (setup, store) = harness(&backend, NullDialog::new());
        let _held = store.try_claim(Activity::Setup).unwrap();
        let err = setup
            .load_election_from_url(URL, &KeyMaterial::new("k"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Busy(Activity::Setup)));
        assert_eq!(backend.calls("http_get"), 0);
    }

    #[tokio::test]
    async fn open_reads_election_back_from_backend() {
        let election = Election::from_document(DOC).unwrap();
        let backend = Arc::new(NullBackend::new().with_database("/tmp/e1.db", election.clone()));
        let (setup, store) = harness(&backend, NullDialog::new().opening("/tmp/e1.db"));

        let outcome = setup.open_election().await.unwrap().unwrap();
        assert_eq!(outcome.election, election);
        assert_eq!(outcome.next, Some(Screen::Overview));
        assert_eq!(store.election(), election);
    }

    #[tokio::test]
    async fn cancelled_open_prompt_is_a_no_op() {
        let backend = Arc::new(NullBackend::new());
        let (setup, _store) = harness(&backend, NullDialog::new());
        assert_eq!(setup.open_election().await.unwrap(), None);
        assert_eq!(backend.calls("open_db"), 0);
    }

    #[tokio::test]
    async fn open_of_unknown_file_is_an_open_error() {
        let backend = Arc::new(NullBackend::new());
        let (setup, _store) = harness(&backend, NullDialog::new());
        let err = setup
            .open_election_from_file(Path::new("/tmp/nope.db"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Open(_)));
    }

    #[tokio::test]
    async fn restore_picks_up_registered_election() {
        let election = Election::from_document(DOC).unwrap();
        let backend = Arc::new(
            NullBackend::new()
                .with_election(election.clone())
                .with_address("zvote1me"),
        );
        let (setup, store) = harness(&backend, NullDialog::new());
        assert_eq!(setup.restore().await.unwrap(), election);
        assert_eq!(store.address().as_deref(), Some("zvote1me"));
    }

    #[tokio::test]
    async fn address_failure_is_not_fatal() {
        let backend = Arc::new(NullBackend::new().with_document(URL, DOC));
        backend.fail("get_address", "wallet locked");
        let (setup, store) = harness(&backend, NullDialog::new());
        let outcome = setup
            .load_election_from_url(URL, &KeyMaterial::new("k"))
            .await
            .unwrap();
        assert_eq!(outcome.next, None);
        assert_eq!(store.address(), None);
    }
}
