use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::client::Room;
use crate::session::{RtcSession, SessionFactory};

/// The one session object per room
///
/// Entries are created lazily and never replaced, so anyone holding a session
/// reference is holding the current one. The only removal is the wholesale
/// `remove_all` on shutdown.
#[derive(Default)]
pub(crate) struct SessionRegistry {
    // room_id -> session
    sessions: HashMap<String, Arc<dyn RtcSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, room_id: &str) -> bool {
        self.sessions.contains_key(room_id)
    }

    /// Non-creating lookup
    pub fn get_active(&self, room_id: &str) -> Option<Arc<dyn RtcSession>> {
        self.sessions.get(room_id).cloned()
    }

    /// Returns the room's session, building it through the factory on first use
    pub fn get_or_create(
        &mut self,
        room: &Room,
        factory: &dyn SessionFactory,
    ) -> Arc<dyn RtcSession> {
        self.sessions
            .entry(room.room_id.clone())
            .or_insert_with(|| {
                debug!(room_id = %room.room_id, "Creating RTC session for room");
                factory.session_for_room(room)
            })
            .clone()
    }

    /// Builds an untracked room's session and keeps it only if it already has members
    ///
    /// A session built without members is stopped and dropped, so the room is
    /// not tracked until something asks for it. An already tracked room
    /// returns its session unchanged.
    pub fn create_if_active(
        &mut self,
        room: &Room,
        factory: &dyn SessionFactory,
    ) -> Option<Arc<dyn RtcSession>> {
        match self.sessions.entry(room.room_id.clone()) {
            Entry::Occupied(entry) => Some(entry.get().clone()),
            Entry::Vacant(entry) => {
                let session = factory.session_for_room(room);
                if !session.is_active() {
                    debug!(room_id = %room.room_id, "No RTC session members, not tracking room");
                    session.stop();
                    return None;
                }
                debug!(room_id = %room.room_id, "Tracking active RTC session for room");
                Some(entry.insert(session).clone())
            }
        }
    }

    /// Stops every tracked session and empties the registry
    pub fn remove_all(&mut self) -> usize {
        let count = self.sessions.len();
        for (room_id, session) in self.sessions.drain() {
            debug!(room_id = %room_id, "Stopping RTC session");
            session.stop();
        }
        info!(count, "Removed all RTC sessions");
        count
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }
}
