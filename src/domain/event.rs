use crate::domain::user::UserId;
use serde::{Deserialize, Serialize};

/// Inbound WebSocket envelope. Envelopes with an unrecognized `type` are
/// accepted and ignored rather than rejected.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    Chat {
        message: String,
    },
    Typing {
        #[serde(default)]
        is_typing: bool,
    },
    #[serde(other)]
    Unknown,
}

/// Outbound WebSocket envelope, fanned out to every connection in a
/// broadcast group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    Chat {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender_id: Option<UserId>,
        message: String,
    },
    Typing {
        user_id: UserId,
        is_typing: bool,
    },
}

impl ServerEvent {
    /// The acknowledgment pushed to a client right after its connection
    /// joins a broadcast group.
    #[must_use]
    pub fn connection_established() -> Self {
        Self::Chat { sender_id: None, message: "Connection Established".to_owned() }
    }

    #[must_use]
    pub const fn chat(sender_id: UserId, message: String) -> Self {
        Self::Chat { sender_id: Some(sender_id), message }
    }

    #[must_use]
    pub const fn typing(user_id: UserId, is_typing: bool) -> Self {
        Self::Typing { user_id, is_typing }
    }
}
