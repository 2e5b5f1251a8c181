/**
 * Real-time Event Model
 *
 * This module defines the events the gateway fans out to connections and the
 * scopes they are addressed to.
 *
 * An `OutboundEvent` is immutable once built. Its payload is JSON that the
 * caller has already serialized; the gateway never inspects it. The wire frame
 * is rendered once at construction, so fanning an event out to many
 * connections only bumps reference counts.
 *
 * # Wire Envelope
 *
 * ```json
 * {"type":"message.new","payload":{...},"channel_id":"..."}
 * ```
 *
 * Exactly one of `workspace_id`, `channel_id`, `dm_id` or `user_id` is present.
 */
use crate::shared::error::SharedError;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::fmt;
use uuid::Uuid;

/// Identity of an authenticated user
pub type SubjectId = Uuid;

/// Kind of real-time event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "message.new")]
    MessageCreated,
    #[serde(rename = "message.updated")]
    MessageUpdated,
    #[serde(rename = "message.deleted")]
    MessageDeleted,
    #[serde(rename = "reaction.added")]
    ReactionAdded,
    #[serde(rename = "reaction.removed")]
    ReactionRemoved,
    #[serde(rename = "user.typing")]
    Typing,
    #[serde(rename = "user.presence")]
    PresenceChanged,
    #[serde(rename = "channel.joined")]
    ChannelJoined,
    #[serde(rename = "workspace.joined")]
    WorkspaceJoined,
}

impl EventKind {
    /// Wire name of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MessageCreated => "message.new",
            Self::MessageUpdated => "message.updated",
            Self::MessageDeleted => "message.deleted",
            Self::ReactionAdded => "reaction.added",
            Self::ReactionRemoved => "reaction.removed",
            Self::Typing => "user.typing",
            Self::PresenceChanged => "user.presence",
            Self::ChannelJoined => "channel.joined",
            Self::WorkspaceJoined => "workspace.joined",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Addressing mode of a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    Workspace,
    Channel,
    Dm,
    Subject,
}

/// Fanout address: one workspace, channel, DM session or subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Scope {
    Workspace(Uuid),
    Channel(Uuid),
    Dm(Uuid),
    Subject(SubjectId),
}

impl Scope {
    /// Compose a scope from its kind and id
    pub fn new(kind: ScopeKind, id: Uuid) -> Self {
        match kind {
            ScopeKind::Workspace => Self::Workspace(id),
            ScopeKind::Channel => Self::Channel(id),
            ScopeKind::Dm => Self::Dm(id),
            ScopeKind::Subject => Self::Subject(id),
        }
    }

    pub fn kind(&self) -> ScopeKind {
        match self {
            Self::Workspace(_) => ScopeKind::Workspace,
            Self::Channel(_) => ScopeKind::Channel,
            Self::Dm(_) => ScopeKind::Dm,
            Self::Subject(_) => ScopeKind::Subject,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::Workspace(id) | Self::Channel(id) | Self::Dm(id) | Self::Subject(id) => *id,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind() {
            ScopeKind::Workspace => "workspace",
            ScopeKind::Channel => "channel",
            ScopeKind::Dm => "dm",
            ScopeKind::Subject => "subject",
        };
        write!(f, "{}:{}", kind, self.id())
    }
}

/// Payload of a `user.typing` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingPayload {
    pub user_id: SubjectId,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub channel_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub dm_id: Option<Uuid>,
    pub is_typing: bool,
}

/// Payload of a `user.presence` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresencePayload {
    pub user_id: SubjectId,
    /// online, offline or away
    pub status: String,
}

#[derive(Serialize)]
struct WireEnvelope<'a> {
    #[serde(rename = "type")]
    kind: EventKind,
    payload: &'a RawValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    workspace_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dm_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<Uuid>,
}

/// Immutable event addressed to exactly one scope
///
/// Cloning is cheap: the payload and the rendered frame are shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEvent {
    kind: EventKind,
    scope: Scope,
    payload: Bytes,
    frame: Bytes,
}

impl OutboundEvent {
    /// Build an event from an already-serialized JSON payload
    ///
    /// Fails with a validation error if `payload` is not a JSON document.
    pub fn new(kind: EventKind, scope: Scope, payload: impl Into<Bytes>) -> Result<Self, SharedError> {
        let payload = payload.into();
        let frame = render_frame(kind, scope, &payload)?;
        Ok(Self {
            kind,
            scope,
            payload,
            frame: Bytes::from(frame),
        })
    }

    /// Build an event by serializing `payload` to JSON
    pub fn json<T: Serialize>(kind: EventKind, scope: Scope, payload: &T) -> Result<Self, SharedError> {
        let bytes = serde_json::to_vec(payload)?;
        Self::new(kind, scope, bytes)
    }

    /// Create a typing indicator event for a channel or DM scope
    pub fn typing(user_id: SubjectId, scope: Scope, is_typing: bool) -> Result<Self, SharedError> {
        let (channel_id, dm_id) = match scope {
            Scope::Channel(id) => (Some(id), None),
            Scope::Dm(id) => (None, Some(id)),
            other => {
                return Err(SharedError::validation(
                    "scope",
                    format!("typing indicators target a channel or DM, not {}", other),
                ))
            }
        };
        let payload = TypingPayload {
            user_id,
            channel_id,
            dm_id,
            is_typing,
        };
        Self::json(EventKind::Typing, scope, &payload)
    }

    /// Create a presence change event
    pub fn presence(user_id: SubjectId, status: impl Into<String>, scope: Scope) -> Result<Self, SharedError> {
        let payload = PresencePayload {
            user_id,
            status: status.into(),
        };
        Self::json(EventKind::PresenceChanged, scope, &payload)
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Raw JSON payload as supplied by the caller
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Rendered wire envelope, UTF-8 JSON
    ///
    /// Clones share one buffer, so writers can hand it to the socket without
    /// copying.
    pub fn frame(&self) -> &Bytes {
        &self.frame
    }
}

fn render_frame(kind: EventKind, scope: Scope, payload: &[u8]) -> Result<String, SharedError> {
    let raw: &RawValue = serde_json::from_slice(payload)
        .map_err(|e| SharedError::validation("payload", format!("payload must be valid JSON: {}", e)))?;

    let mut envelope = WireEnvelope {
        kind,
        payload: raw,
        workspace_id: None,
        channel_id: None,
        dm_id: None,
        user_id: None,
    };
    match scope {
        Scope::Workspace(id) => envelope.workspace_id = Some(id),
        Scope::Channel(id) => envelope.channel_id = Some(id),
        Scope::Dm(id) => envelope.dm_id = Some(id),
        Scope::Subject(id) => envelope.user_id = Some(id),
    }

    Ok(serde_json::to_string(&envelope)?)
}
