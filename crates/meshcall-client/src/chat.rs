//! Chat relay and in-memory transcript.
//!
//! A thin pass-through over the signaling channel: outbound messages carry
//! only their content (the relay attaches the sender), inbound messages and
//! system notices append to an ordered, unbounded transcript. No acks, no
//! persistence.

use meshcall_common::new_id;
use tokio::sync::mpsc;

use crate::protocol::ClientSignal;

/// One transcript line.
#[derive(Debug, Clone)]
pub struct ChatEntry {
    pub id: String,
    pub sender: String,
    pub content: String,
    /// Roster notices ("x joined the room.") rather than user messages.
    pub system: bool,
}

pub struct ChatRelay {
    outbound: mpsc::Sender<ClientSignal>,
    transcript: Vec<ChatEntry>,
}

impl ChatRelay {
    pub fn new(outbound: mpsc::Sender<ClientSignal>) -> Self {
        Self {
            outbound,
            transcript: Vec::new(),
        }
    }

    /// Send a text message to the room. Empty or whitespace-only input
    /// produces no envelope.
    pub async fn send(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let _ = self
            .outbound
            .send(ClientSignal::Chat {
                content: text.to_string(),
            })
            .await;
    }

    /// Append an inbound message to the transcript.
    pub fn push_message(&mut self, sender: impl Into<String>, content: impl Into<String>) {
        self.transcript.push(ChatEntry {
            id: new_id(),
            sender: sender.into(),
            content: content.into(),
            system: false,
        });
    }

    /// Append a system notice to the transcript.
    pub fn push_system(&mut self, content: impl Into<String>) {
        self.transcript.push(ChatEntry {
            id: new_id(),
            sender: "System".to_string(),
            content: content.into(),
            system: true,
        });
    }

    pub fn transcript(&self) -> &[ChatEntry] {
        &self.transcript
    }

    pub fn clear(&mut self) {
        self.transcript.clear();
    }
}
