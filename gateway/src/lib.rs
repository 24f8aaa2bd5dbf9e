//! Backend gateway for the zvote election client.
//!
//! The wallet/ledger backend does all cryptography, chain synchronization
//! and persistence. This crate describes what the client needs from it:
//! - [`Backend`]: request/response operations plus the streamed download
//! - [`ProgressSender`] / [`ProgressReceiver`]: the ordered height stream
//! - [`FileDialog`]: save/open prompts, where `None` means cancelled
//! - [`HttpBackend`]: a JSON-RPC client for a backend running as a service

pub mod backend;
pub mod dialog;
pub mod error;
pub mod http;
pub mod progress;

pub use backend::Backend;
pub use dialog::FileDialog;
pub use error::GatewayError;
pub use http::HttpBackend;
pub use progress::{progress_channel, ProgressReceiver, ProgressSender, PROGRESS_BUFFER};

/// URL type used for election document links.
pub use reqwest::Url;
