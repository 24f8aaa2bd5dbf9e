//! Data model for the zvote election client.
//!
//! Shared by the backend gateway, the session orchestrator and the CLI:
//! elections and candidates, chain heights, voting power amounts, vote
//! requests and their outcomes, history rows, commitment roots and wallet
//! key material.

pub mod amount;
pub mod election;
pub mod error;
pub mod height;
pub mod keys;
pub mod roots;
pub mod vote;

pub use amount::{VotingPower, SUBUNIT_DECIMALS, SUBUNIT_SCALE};
pub use election::{Candidate, Election};
pub use error::TypesError;
pub use height::{progress, progress_pct, ProgressReading, SyncHeight, WindowPosition};
pub use keys::KeyMaterial;
pub use roots::{CommitmentRoot, CommitmentRoots};
pub use vote::{HistoryRow, SubmissionKind, SubmissionResult, VoteRecord, VoteRequest};
