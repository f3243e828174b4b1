use std::sync::Arc;

use super::types::CallMembership;
use crate::client::{MatrixEvent, Room};

/// A room's MatrixRTC session
///
/// The manager keeps exactly one of these per room and hands out shared
/// references, so implementations use interior mutability.
pub trait RtcSession: Send + Sync {
    /// The room this session belongs to
    fn room_id(&self) -> &str;

    /// Current call memberships, oldest first
    fn memberships(&self) -> Vec<CallMembership>;

    /// Recompute memberships from the room's latest state
    fn on_rtc_session_member_update(&self);

    /// Ingest one decrypted call encryption event
    fn on_call_encryption(&self, event: &MatrixEvent);

    /// Release timers and other resources held by the session
    fn stop(&self);

    /// A session is active while it has at least one member
    fn is_active(&self) -> bool {
        !self.memberships().is_empty()
    }
}

/// Builds the session object for a room
///
/// Initial memberships are computed from the room's current state, so a
/// freshly built session may already be active.
pub trait SessionFactory: Send + Sync {
    fn session_for_room(&self, room: &Room) -> Arc<dyn RtcSession>;
}
