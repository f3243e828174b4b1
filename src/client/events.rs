use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::room::Room;

/// State event announcing a device's membership in a room's call
pub const CALL_MEMBER_EVENT_TYPE: &str = "org.matrix.msc3401.call.member";

/// Timeline event carrying call media encryption keys
pub const CALL_ENCRYPTION_KEYS_EVENT_TYPE: &str = "io.element.call.encryption_keys";

/// Wire type of an event that still needs decrypting
pub const ENCRYPTED_EVENT_TYPE: &str = "m.room.encrypted";

/// A room event as delivered by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixEvent {
    pub event_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    pub sender: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_key: Option<String>,
    #[serde(default)]
    pub content: serde_json::Value,
}

impl MatrixEvent {
    pub fn new(
        event_id: impl Into<String>,
        room_id: impl Into<String>,
        sender: impl Into<String>,
        event_type: impl Into<String>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            room_id: Some(room_id.into()),
            sender: sender.into(),
            event_type: event_type.into(),
            state_key: None,
            content: serde_json::Value::Null,
        }
    }

    pub fn with_state_key(mut self, state_key: impl Into<String>) -> Self {
        self.state_key = Some(state_key.into());
        self
    }

    pub fn with_content(mut self, content: serde_json::Value) -> Self {
        self.content = content;
        self
    }

    pub fn is_encrypted(&self) -> bool {
        self.event_type == ENCRYPTED_EVENT_TYPE
    }

    pub fn is_state(&self) -> bool {
        self.state_key.is_some()
    }
}

/// Events the client emits to its subscribers
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// A room became visible to the client
    Room(Room),

    /// An event was added to a room's timeline, possibly still encrypted
    Timeline(MatrixEvent),

    /// A state event was applied to a room
    RoomState(MatrixEvent),
}

impl ClientEvent {
    /// Get a human-readable description of the event kind
    pub fn kind(&self) -> &'static str {
        match self {
            ClientEvent::Room(_) => "room",
            ClientEvent::Timeline(_) => "timeline",
            ClientEvent::RoomState(_) => "room_state",
        }
    }
}

/// Reasons the client could not decrypt an event
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecryptionError {
    #[error("Missing room key for session {0}")]
    MissingRoomKey(String),

    #[error("Unknown sending device: {0}")]
    UnknownDevice(String),

    #[error("Decryption failed: {0}")]
    Failed(String),
}

impl DecryptionError {
    /// Short machine-friendly reason, used as a log field
    pub fn reason(&self) -> &'static str {
        match self {
            DecryptionError::MissingRoomKey(_) => "missing_room_key",
            DecryptionError::UnknownDevice(_) => "unknown_device",
            DecryptionError::Failed(_) => "failed",
        }
    }
}
