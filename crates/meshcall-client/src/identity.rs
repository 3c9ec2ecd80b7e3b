use serde::{Deserialize, Serialize};

/// Local identity, set once at login and immutable thereafter. The relay
/// assigns the session's peer id; the client only knows its username.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
}

impl Identity {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}
