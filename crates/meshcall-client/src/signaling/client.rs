//! Public handle for the signaling channel.

use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tracing::debug;

use crate::protocol::ClientSignal;

use super::connection::connection_loop;
use super::types::{SignalingCommand, SignalingConfig, SignalingEvent};

/// Handle for the signaling channel.
///
/// All methods are non-blocking and hand work to the background
/// connection task.
pub struct SignalingClient {
    command_tx: mpsc::Sender<SignalingCommand>,
    connected: Arc<RwLock<bool>>,
}

impl SignalingClient {
    /// Open the channel and start the background connection task.
    /// Returns `(client, event_receiver)`.
    pub fn connect(config: SignalingConfig) -> (Self, mpsc::Receiver<SignalingEvent>) {
        let (event_tx, event_rx) = mpsc::channel(256);
        let (command_tx, command_rx) = mpsc::channel(64);
        let connected = Arc::new(RwLock::new(false));

        let client = Self {
            command_tx,
            connected: Arc::clone(&connected),
        };

        tokio::spawn(connection_loop(config, connected, event_tx, command_rx));

        (client, event_rx)
    }

    /// Clone this handle; both handles drive the same connection.
    pub fn clone_handle(&self) -> Self {
        Self {
            command_tx: self.command_tx.clone(),
            connected: Arc::clone(&self.connected),
        }
    }

    /// Serialize and transmit one envelope.
    ///
    /// When the channel is not open the envelope is dropped: no error, no
    /// queueing.
    pub async fn send(&self, signal: ClientSignal) {
        if !*self.connected.read().await {
            debug!(?signal, "Signaling channel not open, dropping envelope");
            return;
        }
        let _ = self.command_tx.send(SignalingCommand::Send(signal)).await;
    }

    /// Pump an outbound envelope queue into this channel. Envelopes arriving
    /// while the channel is closed are dropped by [`send`](Self::send).
    pub fn forward_outbound(
        &self,
        mut outbound_rx: mpsc::Receiver<ClientSignal>,
    ) -> tokio::task::JoinHandle<()> {
        let client = self.clone_handle();
        tokio::spawn(async move {
            while let Some(signal) = outbound_rx.recv().await {
                client.send(signal).await;
            }
        })
    }

    /// Check if the channel is open.
    pub async fn is_connected(&self) -> bool {
        *self.connected.read().await
    }

    /// Close the channel.
    pub async fn close(&self) {
        let _ = self.command_tx.send(SignalingCommand::Close).await;
    }
}
