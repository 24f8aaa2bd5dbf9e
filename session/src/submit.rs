//! Submission controller: votes and delegations.
//!
//! A request is turned into a [`PreparedSubmission`] once, which is when the
//! amount is scaled to subunits. Retrying passes the same prepared value
//! back in, so the amount is never scaled twice.

use std::sync::Arc;

use zvote_gateway::Backend;
use zvote_types::{SubmissionKind, SubmissionResult, VoteRequest, VotingPower};

use crate::ledger_gate::LedgerGate;
use crate::store::{Activity, SessionStore};
use crate::sync::SyncCoordinator;
use crate::validate::{Field, FieldError};
use crate::SessionError;

pub const ADDRESS_REQUIRED: &str = "Address is required";
pub const NOT_A_CANDIDATE: &str = "Address is not a candidate of this election";
pub const INVALID_AMOUNT: &str = "Invalid amount";
pub const ZERO_AMOUNT: &str = "Amount must be greater than zero";

/// A checked request with its amount already in subunits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedSubmission {
    kind: SubmissionKind,
    address: String,
    amount: VotingPower,
}

impl PreparedSubmission {
    pub fn kind(&self) -> SubmissionKind {
        self.kind
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// The amount as sent to the backend.
    pub fn amount(&self) -> VotingPower {
        self.amount
    }
}

#[derive(Clone)]
pub struct SubmissionController {
    backend: Arc<dyn Backend>,
    store: SessionStore,
    gate: LedgerGate,
    sync: SyncCoordinator,
    refresh_after_submission: bool,
}

impl SubmissionController {
    pub fn new(
        backend: Arc<dyn Backend>,
        store: SessionStore,
        gate: LedgerGate,
        sync: SyncCoordinator,
        refresh_after_submission: bool,
    ) -> Self {
        Self {
            backend,
            store,
            gate,
            sync,
            refresh_after_submission,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.store.is_busy(Activity::Submission)
    }

    /// Check `request` against the loaded election and scale its amount.
    ///
    /// A vote must go to one of the election's candidates; a delegation may
    /// go to any address.
    pub fn prepare(
        &self,
        kind: SubmissionKind,
        request: &VoteRequest,
    ) -> Result<PreparedSubmission, SessionError> {
        let election = self.store.election();
        if election.is_absent() {
            return Err(SessionError::NoElection);
        }

        let address = request.address.trim();
        if address.is_empty() {
            return Err(FieldError::new(Field::Address, ADDRESS_REQUIRED).into());
        }
        if kind == SubmissionKind::Vote && election.candidate(address).is_none() {
            return Err(FieldError::new(Field::Address, NOT_A_CANDIDATE)
                .with_detail(address.to_string())
                .into());
        }

        let amount = VotingPower::from_decimal(request.amount).map_err(|e| {
            FieldError::new(Field::Amount, INVALID_AMOUNT).with_detail(e.to_string())
        })?;
        if amount.is_zero() {
            return Err(FieldError::new(Field::Amount, ZERO_AMOUNT)
                .with_detail(request.amount.to_string())
                .into());
        }

        Ok(PreparedSubmission {
            kind,
            address: address.to_string(),
            amount,
        })
    }

    /// Send a prepared submission.
    ///
    /// A backend rejection is not an `Err`: it comes back as
    /// [`SubmissionResult::Failure`] carrying the backend's message verbatim.
    /// After a success the balance refresh runs on its own task.
    pub async fn submit(
        &self,
        prepared: &PreparedSubmission,
    ) -> Result<SubmissionResult, SessionError> {
        let result = self.send(prepared).await?;
        if result.is_success() && self.refresh_after_submission {
            self.sync.spawn_refresh();
        }
        Ok(result)
    }

    /// Like [`SubmissionController::submit`], but the refresh is awaited
    /// before returning. For callers that exit right after submitting.
    pub async fn submit_and_refresh(
        &self,
        prepared: &PreparedSubmission,
    ) -> Result<SubmissionResult, SessionError> {
        let result = self.send(prepared).await?;
        if result.is_success() && self.refresh_after_submission {
            self.sync.quick_sync().await;
        }
        Ok(result)
    }

    async fn send(&self, prepared: &PreparedSubmission) -> Result<SubmissionResult, SessionError> {
        if !self.store.has_election() {
            return Err(SessionError::NoElection);
        }
        let _busy = self
            .store
            .try_claim(Activity::Submission)
            .ok_or(SessionError::Busy(Activity::Submission))?;
        let _ledger = self.gate.enter().await;

        tracing::info!(
            kind = %prepared.kind,
            address = %prepared.address,
            amount = prepared.amount.subunits(),
            "submitting"
        );
        match self
            .backend
            .submit(prepared.kind, &prepared.address, prepared.amount)
            .await
        {
            Ok(receipt) => {
                tracing::info!(kind = %prepared.kind, receipt = %receipt, "submission accepted");
                Ok(SubmissionResult::Success { receipt })
            }
            Err(e) => {
                tracing::warn!(kind = %prepared.kind, error = %e, "submission rejected");
                Ok(SubmissionResult::Failure {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// [`SubmissionController::prepare`] followed by [`SubmissionController::submit`].
    pub async fn submit_request(
        &self,
        kind: SubmissionKind,
        request: &VoteRequest,
    ) -> Result<SubmissionResult, SessionError> {
        let prepared = self.prepare(kind, request)?;
        self.submit(&prepared).await
    }
}
