//! Inbound client frames.
//!
//! Clients send JSON text frames tagged by `type`. Only the kinds below are
//! recognized; anything else decodes to `None` and is ignored by the gateway.

use crate::shared::event::Scope;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Frame sent by a client over its WebSocket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientFrame {
    /// Typing indicator for a channel or DM session
    #[serde(rename = "user.typing")]
    Typing {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        channel_id: Option<Uuid>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dm_id: Option<Uuid>,
        is_typing: bool,
    },

    /// Ask to receive events for a scope
    #[serde(rename = "subscribe")]
    Subscribe { scope: Scope },

    /// Stop receiving events for a scope
    #[serde(rename = "unsubscribe")]
    Unsubscribe { scope: Scope },
}

impl ClientFrame {
    /// Decode a text frame, returning `None` for anything unrecognized
    pub fn decode(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }

    /// Target scope of a typing frame
    ///
    /// Exactly one of `channel_id` and `dm_id` must be set.
    pub fn typing_scope(&self) -> Option<Scope> {
        match self {
            Self::Typing {
                channel_id: Some(id),
                dm_id: None,
                ..
            } => Some(Scope::Channel(*id)),
            Self::Typing {
                channel_id: None,
                dm_id: Some(id),
                ..
            } => Some(Scope::Dm(*id)),
            _ => None,
        }
    }
}
