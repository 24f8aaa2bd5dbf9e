//! Error type for data-model construction and conversion.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("amount must not be negative: {0}")]
    NegativeAmount(String),

    #[error("amount is too large: {0}")]
    AmountOverflow(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("election has no id")]
    MissingElectionId,

    #[error("duplicate candidate address: {0}")]
    DuplicateCandidate(String),

    #[error("invalid election document: {0}")]
    InvalidElection(String),

    #[error("invalid commitment root: {0}")]
    InvalidRoot(String),
}
