//! Vote and delegation requests, their outcomes, and past submissions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::amount::VotingPower;
use crate::error::TypesError;

/// Which backend submission primitive a request goes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionKind {
    /// Cast voting power for a candidate of the current election.
    Vote,
    /// Hand voting power to another address.
    Delegate,
}

impl SubmissionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vote => "vote",
            Self::Delegate => "delegate",
        }
    }
}

impl fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vote or delegation as entered by the user, amount still in whole units.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteRequest {
    pub address: String,
    pub amount: Decimal,
}

impl VoteRequest {
    pub fn new(address: impl Into<String>, amount: Decimal) -> Self {
        Self {
            address: address.into(),
            amount,
        }
    }

    /// Build a request from the raw text of an amount field.
    pub fn parse(address: impl Into<String>, amount: &str) -> Result<Self, TypesError> {
        let amount = Decimal::from_str(amount.trim())
            .map_err(|e| TypesError::InvalidAmount(format!("{amount:?}: {e}")))?;
        Ok(Self::new(address, amount))
    }
}

/// Outcome of one submission: a receipt, or the backend's reason verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SubmissionResult {
    Success { receipt: String },
    Failure { reason: String },
}

impl SubmissionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn receipt(&self) -> Option<&str> {
        match self {
            Self::Success { receipt } => Some(receipt),
            Self::Failure { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { reason } => Some(reason),
        }
    }
}

/// A past submission as recorded by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub id: u32,
    pub hash: String,
    pub address: String,
    pub amount: VotingPower,
    #[serde(default)]
    pub choice: Option<String>,
}

/// A history table row: a [`VoteRecord`] with its choice label resolved
/// against the current election.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HistoryRow {
    pub id: u32,
    pub hash: String,
    pub address: String,
    pub amount: VotingPower,
    pub choice: Option<String>,
}

impl HistoryRow {
    pub fn display_amount(&self) -> Decimal {
        self.amount.to_decimal()
    }
}
