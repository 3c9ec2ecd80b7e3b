//! Background WebSocket connection task.
//!
//! One connection attempt per session. A dropped channel halts signaling;
//! session resumption is deliberately out of scope.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, RwLock};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, error, info, warn};

use crate::protocol::ServerSignal;

use super::types::{SignalingCommand, SignalingConfig, SignalingEvent};

pub(crate) async fn connection_loop(
    config: SignalingConfig,
    connected: Arc<RwLock<bool>>,
    event_tx: mpsc::Sender<SignalingEvent>,
    mut command_rx: mpsc::Receiver<SignalingCommand>,
) {
    let url = config.ws_url();
    info!(url = %url, "Connecting to signaling relay");

    let ws_stream = match tokio::time::timeout(
        Duration::from_secs(config.connect_timeout_secs),
        tokio_tungstenite::connect_async(&url),
    )
    .await
    {
        Ok(Ok((ws_stream, _))) => ws_stream,
        Ok(Err(e)) => {
            error!(error = %e, "Failed to connect to signaling relay");
            let _ = event_tx
                .send(SignalingEvent::Error(format!("Connection failed: {e}")))
                .await;
            let _ = event_tx.send(SignalingEvent::Disconnected).await;
            return;
        }
        Err(_elapsed) => {
            error!(
                timeout = config.connect_timeout_secs,
                "Signaling connection timed out"
            );
            let _ = event_tx
                .send(SignalingEvent::Error(format!(
                    "Connection timed out after {}s",
                    config.connect_timeout_secs
                )))
                .await;
            let _ = event_tx.send(SignalingEvent::Disconnected).await;
            return;
        }
    };

    *connected.write().await = true;
    let _ = event_tx.send(SignalingEvent::Connected).await;

    let (mut ws_write, mut ws_read) = ws_stream.split();

    loop {
        tokio::select! {
            frame = ws_read.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    match serde_json::from_str::<ServerSignal>(&text) {
                        Ok(signal) => {
                            let _ = event_tx.send(SignalingEvent::Signal(signal)).await;
                        }
                        Err(e) => {
                            debug!(error = %e, text = %text, "Unrecognized signaling frame");
                        }
                    }
                }
                Some(Ok(WsMessage::Close(_))) => {
                    info!("Signaling relay closed the connection");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "WebSocket error");
                    break;
                }
                None => break,
            },
            command = command_rx.recv() => match command {
                Some(SignalingCommand::Send(signal)) => {
                    match serde_json::to_string(&signal) {
                        Ok(json) => {
                            if ws_write.send(WsMessage::Text(json.into())).await.is_err() {
                                warn!("WebSocket write failed");
                                break;
                            }
                        }
                        Err(e) => warn!(error = %e, "Failed to serialize envelope"),
                    }
                }
                Some(SignalingCommand::Close) | None => {
                    let _ = ws_write.send(WsMessage::Close(None)).await;
                    break;
                }
            },
        }
    }

    *connected.write().await = false;
    let _ = event_tx.send(SignalingEvent::Disconnected).await;
}
