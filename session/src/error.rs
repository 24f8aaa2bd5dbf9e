use thiserror::Error;

use zvote_gateway::GatewayError;
use zvote_types::TypesError;

use crate::store::Activity;
use crate::validate::FieldError;

#[derive(Debug, Error)]
pub enum SessionError {
    /// Input rejected before any backend call; shown next to the field.
    #[error(transparent)]
    Validation(#[from] FieldError),

    #[error("failed to fetch election: {0}")]
    Fetch(GatewayError),

    #[error("failed to parse election: {0}")]
    Parse(TypesError),

    #[error("failed to register election: {0}")]
    Registration(GatewayError),

    #[error("failed to save election database: {0}")]
    Persist(GatewayError),

    #[error("failed to open election database: {0}")]
    Open(GatewayError),

    #[error("download failed: {0}")]
    Sync(GatewayError),

    #[error("backend error: {0}")]
    Backend(GatewayError),

    #[error("no election loaded")]
    NoElection,

    #[error("{0} already in progress")]
    Busy(Activity),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
