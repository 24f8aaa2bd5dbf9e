//! Integration tests driving an `ElectionSession` end to end against the
//! nullable backend: setup → sync → submission → history.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rust_decimal_macros::dec;

use zvote_nullables::{NullBackend, NullDialog};
use zvote_session::{
    ElectionSession, Screen, ScreenGate, SessionConfig, SessionError, SessionEvent, SyncOutcome,
    SyncPhase,
};
use zvote_types::{
    Election, KeyMaterial, SubmissionKind, SubmissionResult, SyncHeight, VoteRecord, VoteRequest,
    VotingPower,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const URL: &str = "https://vote.example.org/grant-round.json";
const DOC: &str = r#"{
    "id": "grant-round",
    "name": "Grant round",
    "question": "Fund the grant?",
    "start_height": 0,
    "end_height": 400,
    "candidates": [
        {"address": "A", "choice": "Yes"},
        {"address": "B", "choice": "No"}
    ]
}"#;

fn election() -> Election {
    Election::from_document(DOC).expect("valid document")
}

fn session_with(backend: &Arc<NullBackend>, dialog: NullDialog, config: &SessionConfig) -> ElectionSession {
    ElectionSession::new(backend.clone(), Arc::new(dialog), config)
}

/// A session whose backend already holds the election and some funds.
async fn loaded_session(backend: NullBackend, config: &SessionConfig) -> (ElectionSession, Arc<NullBackend>) {
    let backend = Arc::new(
        backend
            .with_election(election())
            .with_balance(VotingPower::from_subunits(10_000_000)),
    );
    let session = session_with(&backend, NullDialog::new(), config);
    session.setup().restore().await.expect("restore");
    (session, backend)
}

fn no_refresh() -> SessionConfig {
    SessionConfig {
        refresh_after_submission: false,
        ..Default::default()
    }
}

async fn wait_for_call(backend: &NullBackend, op: &str) {
    while backend.calls(op) == 0 {
        tokio::task::yield_now().await;
    }
}

// ---------------------------------------------------------------------------
// 1. Screen gating
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fresh_session_gates_election_screens() {
    let backend = Arc::new(NullBackend::new());
    let session = session_with(&backend, NullDialog::new(), &SessionConfig::default());
    session.setup().restore().await.unwrap();

    for screen in [Screen::Overview, Screen::Vote, Screen::Delegate] {
        assert_eq!(session.gate(screen), ScreenGate::NoElection, "{screen:?}");
    }
    assert!(matches!(session.gate(Screen::Setup), ScreenGate::Ready(_)));

    let err = session
        .submissions()
        .submit_request(SubmissionKind::Vote, &VoteRequest::new("A", dec!(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::NoElection));
}

// ---------------------------------------------------------------------------
// 2. Setup
// ---------------------------------------------------------------------------

#[tokio::test]
async fn setup_then_overview() {
    let backend = Arc::new(
        NullBackend::new()
            .with_document(URL, DOC)
            .with_height(100)
            .with_balance(VotingPower::from_subunits(123_456)),
    );
    let session = session_with(
        &backend,
        NullDialog::new().saving_to("/tmp/grant-round.db"),
        &SessionConfig::default(),
    );

    let outcome = session
        .setup()
        .load_election_from_url(URL, &KeyMaterial::new("uview1abc"))
        .await
        .unwrap();
    assert_eq!(outcome.next, Some(Screen::Overview));
    assert_eq!(backend.saved_paths(), vec![PathBuf::from("/tmp/grant-round.db")]);
    assert_eq!(backend.registered_url().as_deref(), Some(URL));

    assert_eq!(session.mount_overview().await, ScreenGate::Ready(election()));
    let overview = session.overview();
    assert_eq!(overview.height, SyncHeight::At(100));
    assert_eq!(overview.progress.map(|p| p.pct), Some(25.0));
    assert_eq!(overview.balance, Some(dec!(1.23456)));
}

#[tokio::test]
async fn cancelled_save_prompt_keeps_registration() {
    let dialog = NullDialog::new();
    let backend = Arc::new(NullBackend::new().with_document(URL, DOC));
    let session = ElectionSession::new(backend.clone(), Arc::new(dialog), &SessionConfig::default());

    let outcome = session
        .setup()
        .load_election_from_url(URL, &KeyMaterial::new("uview1abc"))
        .await
        .unwrap();
    assert_eq!(outcome.next, None);
    assert_eq!(outcome.file, None);
    assert_eq!(backend.calls("set_election"), 1);
    assert_eq!(backend.calls("save_db"), 0);
    assert!(session.store().has_election());
    assert!(!session.setup().is_busy());
}

#[tokio::test]
async fn reopen_saved_election_in_new_session() {
    let first = Arc::new(NullBackend::new().with_document(URL, DOC));
    let session = session_with(
        &first,
        NullDialog::new().saving_to("/tmp/saved.db"),
        &SessionConfig::default(),
    );
    session
        .setup()
        .load_election_from_url(URL, &KeyMaterial::new("uview1abc"))
        .await
        .unwrap();

    let second = Arc::new(NullBackend::new().with_database("/tmp/saved.db", election()));
    let reopened = session_with(
        &second,
        NullDialog::new().opening("/tmp/saved.db"),
        &SessionConfig::default(),
    );
    let outcome = reopened.setup().open_election().await.unwrap().unwrap();
    assert_eq!(outcome.next, Some(Screen::Overview));
    assert_eq!(reopened.store().election(), election());
}

#[tokio::test]
async fn open_save_prompt_does_not_block_sync() {
    let dialog = Arc::new(NullDialog::new().saving_to("/tmp/slow.db"));
    let release = dialog.hold_save();
    let backend = Arc::new(
        NullBackend::new()
            .with_document(URL, DOC)
            .with_height(5)
            .with_balance(VotingPower::from_subunits(42)),
    );
    let session = ElectionSession::new(backend.clone(), dialog.clone(), &SessionConfig::default());

    let setup = tokio::spawn({
        let session = session.clone();
        async move {
            session
                .setup()
                .load_election_from_url(URL, &KeyMaterial::new("uview1abc"))
                .await
        }
    });
    while dialog.prompts().is_empty() {
        tokio::task::yield_now().await;
    }
    assert_eq!(backend.calls("set_election"), 1);
    assert_eq!(backend.calls("save_db"), 0);

    let outcome = tokio::time::timeout(Duration::from_secs(1), session.sync().quick_sync())
        .await
        .expect("quick sync stalled behind the save prompt");
    assert_eq!(outcome, SyncOutcome::Synced);
    assert_eq!(backend.calls("sync"), 1);
    assert_eq!(session.overview().height, SyncHeight::At(5));

    release.notify_one();
    let outcome = setup.await.unwrap().unwrap();
    assert_eq!(outcome.next, Some(Screen::Overview));
    assert_eq!(backend.saved_paths(), vec![PathBuf::from("/tmp/slow.db")]);
}

// ---------------------------------------------------------------------------
// 3. Download
// ---------------------------------------------------------------------------

#[tokio::test]
async fn progress_heights_apply_in_order_before_settlement() {
    let (session, _backend) = loaded_session(
        NullBackend::new()
            .with_progress(&[100, 250, 400])
            .with_height_after_download(402),
        &SessionConfig::default(),
    )
    .await;

    let heights = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&heights);
    session.store().events().subscribe(Box::new(move |event| {
        if let SessionEvent::HeightChanged(height) = event {
            sink.lock().unwrap().push(*height);
        }
    }));

    assert_eq!(session.sync().download().await.unwrap(), SyncOutcome::Completed);
    assert_eq!(
        *heights.lock().unwrap(),
        vec![
            SyncHeight::At(100),
            SyncHeight::At(250),
            SyncHeight::At(400),
            SyncHeight::At(402),
        ]
    );
    assert_eq!(session.store().sync_phase(), SyncPhase::Synced);
}

#[tokio::test]
async fn second_download_trigger_starts_no_backend_call() {
    let (session, backend) =
        loaded_session(NullBackend::new().with_progress(&[10]), &SessionConfig::default()).await;
    let release = backend.hold_download();

    let first = tokio::spawn({
        let session = session.clone();
        async move { session.sync().download().await }
    });
    wait_for_call(&backend, "download_reference_data").await;

    assert_eq!(
        session.sync().download().await.unwrap(),
        SyncOutcome::AlreadyRunning
    );
    assert_eq!(backend.calls("download_reference_data"), 1);

    release.notify_one();
    assert_eq!(first.await.unwrap().unwrap(), SyncOutcome::Completed);
    assert_eq!(backend.calls("download_reference_data"), 1);
}

#[tokio::test]
async fn cancelled_download_returns_to_idle() {
    let (session, backend) =
        loaded_session(NullBackend::new().with_progress(&[10]), &SessionConfig::default()).await;
    let _release = backend.hold_download();

    let running = tokio::spawn({
        let session = session.clone();
        async move { session.sync().download().await }
    });
    wait_for_call(&backend, "download_reference_data").await;
    assert!(session.sync().cancel());

    assert_eq!(running.await.unwrap().unwrap(), SyncOutcome::Cancelled);
    assert_eq!(session.store().sync_phase(), SyncPhase::Idle);
}

// ---------------------------------------------------------------------------
// 4. Submission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn amount_is_scaled_once_across_a_retry() {
    let (session, backend) = loaded_session(NullBackend::new(), &no_refresh()).await;
    let controller = session.submissions();

    let prepared = controller
        .prepare(SubmissionKind::Vote, &VoteRequest::new("A", dec!(1.23456)))
        .unwrap();
    assert_eq!(prepared.amount(), VotingPower::from_subunits(123_456));

    backend.fail("vote", "lightwalletd unreachable");
    let first = controller.submit(&prepared).await.unwrap();
    assert_eq!(first.reason(), Some("lightwalletd unreachable"));

    backend.recover("vote");
    let retry = controller.submit(&prepared).await.unwrap();
    assert!(retry.is_success());

    assert_eq!(backend.calls("vote"), 2);
    assert_eq!(
        backend.submissions(),
        vec![(
            SubmissionKind::Vote,
            "A".to_string(),
            VotingPower::from_subunits(123_456)
        )]
    );
}

#[tokio::test]
async fn busy_flag_clears_after_failure_and_panic() {
    let (session, backend) = loaded_session(NullBackend::new(), &no_refresh()).await;
    let request = VoteRequest::new("zvote1friend", dec!(1));

    backend.fail("delegate", "Not enough funds");
    let result = session
        .submissions()
        .submit_request(SubmissionKind::Delegate, &request)
        .await
        .unwrap();
    assert_eq!(
        result,
        SubmissionResult::Failure {
            reason: "Not enough funds".into()
        }
    );
    assert!(!session.submissions().is_busy());

    backend.panic_on("delegate");
    let joined = tokio::spawn({
        let session = session.clone();
        let request = request.clone();
        async move {
            session
                .submissions()
                .submit_request(SubmissionKind::Delegate, &request)
                .await
        }
    })
    .await;
    assert!(joined.unwrap_err().is_panic());
    assert!(!session.submissions().is_busy());

    backend.recover("delegate");
    let result = session
        .submissions()
        .submit_request(SubmissionKind::Delegate, &request)
        .await
        .unwrap();
    assert!(result.is_success());
}

#[tokio::test]
async fn identical_submissions_are_not_deduplicated() {
    let (session, backend) = loaded_session(NullBackend::new(), &no_refresh()).await;
    let request = VoteRequest::new("B", dec!(0.5));
    for _ in 0..2 {
        let result = session
            .submissions()
            .submit_request(SubmissionKind::Vote, &request)
            .await
            .unwrap();
        assert!(result.is_success());
    }
    assert_eq!(backend.submissions().len(), 2);
}

#[tokio::test]
async fn submission_waits_for_running_download() {
    let (session, backend) =
        loaded_session(NullBackend::new().with_progress(&[10]), &no_refresh()).await;
    let release = backend.hold_download();

    let download = tokio::spawn({
        let session = session.clone();
        async move { session.sync().download().await }
    });
    wait_for_call(&backend, "download_reference_data").await;

    let vote = tokio::spawn({
        let session = session.clone();
        async move {
            session
                .submissions()
                .submit_request(SubmissionKind::Vote, &VoteRequest::new("A", dec!(1)))
                .await
        }
    });
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(backend.calls("vote"), 0);
    assert!(session.submissions().is_busy());

    release.notify_one();
    assert_eq!(download.await.unwrap().unwrap(), SyncOutcome::Completed);
    assert!(vote.await.unwrap().unwrap().is_success());
    assert_eq!(backend.calls("vote"), 1);
}

#[tokio::test]
async fn disabled_ledger_gate_lets_submission_overlap_download() {
    let config = SessionConfig {
        serialize_ledger_operations: false,
        ..no_refresh()
    };
    let (session, backend) =
        loaded_session(NullBackend::new().with_progress(&[10]), &config).await;
    let release = backend.hold_download();

    let download = tokio::spawn({
        let session = session.clone();
        async move { session.sync().download().await }
    });
    wait_for_call(&backend, "download_reference_data").await;

    let result = session
        .submissions()
        .submit_request(SubmissionKind::Vote, &VoteRequest::new("A", dec!(1)))
        .await
        .unwrap();
    assert!(result.is_success());

    release.notify_one();
    assert_eq!(download.await.unwrap().unwrap(), SyncOutcome::Completed);
}

// ---------------------------------------------------------------------------
// 5. History
// ---------------------------------------------------------------------------

#[tokio::test]
async fn history_labels_votes_with_candidate_choice() {
    let votes = vec![VoteRecord {
        id: 1,
        hash: "9f".into(),
        address: "A".into(),
        amount: VotingPower::from_subunits(500_000),
        choice: None,
    }];
    let (session, _backend) =
        loaded_session(NullBackend::new().with_votes(votes), &SessionConfig::default()).await;

    let rows = session.history().load().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].choice.as_deref(), Some("Yes"));
    assert_eq!(rows[0].display_amount(), dec!(5));
}

#[tokio::test]
async fn history_includes_new_submissions() {
    let (session, _backend) = loaded_session(NullBackend::new(), &no_refresh()).await;
    session
        .submissions()
        .submit_request(SubmissionKind::Delegate, &VoteRequest::new("zvote1friend", dec!(2)))
        .await
        .unwrap();
    session
        .submissions()
        .submit_request(SubmissionKind::Vote, &VoteRequest::new("B", dec!(1.5)))
        .await
        .unwrap();

    let rows = session.history().load().await.unwrap();
    let labels: Vec<_> = rows.iter().map(|r| r.choice.as_deref()).collect();
    assert_eq!(labels, vec![None, Some("No")]);
    assert_eq!(rows[1].display_amount(), dec!(1.5));
}
