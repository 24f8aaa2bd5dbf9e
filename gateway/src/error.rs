use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("backend returned HTTP {0}")]
    Status(u16),

    #[error("invalid response: {0}")]
    Decode(String),

    #[error("unknown property: {0}")]
    UnknownProperty(String),

    #[error("progress channel closed")]
    ChannelClosed,

    /// An error value produced by the backend itself, kept verbatim.
    #[error("{0}")]
    Backend(String),
}
