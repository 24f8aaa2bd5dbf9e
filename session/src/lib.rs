//! Election session workflow orchestrator.
//!
//! Drives an election through its client-side lifecycle against a wallet
//! backend: load and register an election, download the chain data it
//! needs, submit votes and delegations, and show past submissions.
//!
//! - [`ElectionSession`]: the entry point, wiring every workflow to one store
//! - [`SessionStore`]: the shared session state and its [`EventBus`]
//! - [`ElectionSetup`], [`SyncCoordinator`], [`SubmissionController`],
//!   [`HistoryProjection`]: the workflows
//! - [`validate_url`] / [`validate_key`]: setup form validators
//! - [`SessionConfig`] and [`init_logging`]: ambient configuration

pub mod config;
pub mod error;
pub mod event;
pub mod history;
pub mod ledger_gate;
pub mod logging;
pub mod screen;
pub mod session;
pub mod setup;
pub mod store;
pub mod submit;
pub mod sync;
pub mod validate;

pub use config::SessionConfig;
pub use error::SessionError;
pub use event::{EventBus, SessionEvent};
pub use history::{project_history, HistoryProjection};
pub use ledger_gate::LedgerGate;
pub use logging::{init_logging, LogFormat};
pub use screen::{gate, Screen, ScreenGate};
pub use session::{ElectionSession, OverviewSnapshot};
pub use setup::{ElectionSetup, SetupOutcome};
pub use store::{Activity, SessionState, SessionStore, SyncKind, SyncPhase};
pub use submit::{PreparedSubmission, SubmissionController};
pub use sync::{SyncCoordinator, SyncOutcome};
pub use validate::{validate_key, validate_url, Field, FieldError, INVALID_KEY, INVALID_URL};
