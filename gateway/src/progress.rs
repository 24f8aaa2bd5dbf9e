//! Download progress channel.
//!
//! The backend owns the producing half and pushes each synchronized height
//! as it goes; the sync coordinator owns the consuming half. Heights arrive
//! in the order they were sent.

use tokio::sync::mpsc;

use crate::GatewayError;

/// Channel buffer size for progress events.
pub const PROGRESS_BUFFER: usize = 64;

/// Producing half, handed to [`crate::Backend::download_reference_data`].
#[derive(Clone, Debug)]
pub struct ProgressSender {
    tx: mpsc::Sender<u32>,
}

/// Consuming half. Yields `None` once every sender has been dropped.
#[derive(Debug)]
pub struct ProgressReceiver {
    rx: mpsc::Receiver<u32>,
}

/// Create a connected progress sender/receiver pair.
pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    let (tx, rx) = mpsc::channel(PROGRESS_BUFFER);
    (ProgressSender { tx }, ProgressReceiver { rx })
}

impl ProgressSender {
    /// Push a height. Fails once the receiver is gone.
    pub async fn report(&self, height: u32) -> Result<(), GatewayError> {
        self.tx
            .send(height)
            .await
            .map_err(|_| GatewayError::ChannelClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl ProgressReceiver {
    pub async fn next(&mut self) -> Option<u32> {
        self.rx.recv().await
    }

    /// Stop accepting heights; pending ones can still be drained.
    pub fn close(&mut self) {
        self.rx.close();
    }
}
