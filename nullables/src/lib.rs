//! Nullable infrastructure for deterministic testing.
//!
//! The session orchestrator reaches the outside world only through the
//! `Backend` and `FileDialog` traits. This crate provides test-friendly
//! implementations that:
//! - Return scripted values and record every call
//! - Can be switched to fail, panic or stall per operation
//! - Never touch the filesystem or network
//!
//! Usage: hand an `Arc<NullBackend>` and `Arc<NullDialog>` to the session
//! instead of the HTTP backend and a real prompt.

pub mod backend;
pub mod dialog;

pub use backend::NullBackend;
pub use dialog::NullDialog;
