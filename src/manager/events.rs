use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

use crate::session::RtcSession;

/// Notifications raised when a room's call changes between inactive and active
///
/// Each variant fires once per edge; membership changes while a call is
/// already running do not produce notifications.
#[derive(Clone)]
pub enum SessionManagerEvent {
    /// The room's session gained its first member
    SessionStarted {
        room_id: String,
        session: Arc<dyn RtcSession>,
    },

    /// The room's session lost its last member
    SessionEnded {
        room_id: String,
        session: Arc<dyn RtcSession>,
    },
}

impl SessionManagerEvent {
    pub fn room_id(&self) -> &str {
        match self {
            SessionManagerEvent::SessionStarted { room_id, .. } => room_id,
            SessionManagerEvent::SessionEnded { room_id, .. } => room_id,
        }
    }

    pub fn session(&self) -> &Arc<dyn RtcSession> {
        match self {
            SessionManagerEvent::SessionStarted { session, .. } => session,
            SessionManagerEvent::SessionEnded { session, .. } => session,
        }
    }

    /// Get a human-readable description of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionManagerEvent::SessionStarted { .. } => "session_started",
            SessionManagerEvent::SessionEnded { .. } => "session_ended",
        }
    }
}

impl fmt::Debug for SessionManagerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.event_type())
            .field("room_id", &self.room_id())
            .field("members", &self.session().memberships().len())
            .finish()
    }
}

/// Broadcast channel for session start/end notifications
#[derive(Debug, Clone)]
pub struct SessionEventBus {
    sender: broadcast::Sender<SessionManagerEvent>,
}

impl SessionEventBus {
    /// Creates a new bus buffering up to `capacity` undelivered notifications
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Emits a notification to every current subscriber
    pub fn emit(&self, event: SessionManagerEvent) {
        let event_type = event.event_type();
        let room_id = event.room_id().to_string();

        match self.sender.send(event) {
            Ok(receiver_count) => {
                debug!(
                    room_id = %room_id,
                    event_type,
                    receivers = receiver_count,
                    "Session event emitted"
                );
            }
            Err(_) => {
                debug!(room_id = %room_id, event_type, "Session event emitted with no receivers");
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionManagerEvent> {
        self.sender.subscribe()
    }
}
