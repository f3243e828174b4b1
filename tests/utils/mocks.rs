use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use matrixrtc_sessions::{CallMembership, MatrixEvent, Room, RtcSession, SessionFactory};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Shared stand-in for the call member state of every room
#[derive(Clone, Default)]
pub struct MockRoomState {
    members: Arc<Mutex<HashMap<String, Vec<CallMembership>>>>,
}

impl MockRoomState {
    pub fn set_members(&self, room_id: &str, user_ids: &[&str]) {
        let memberships = user_ids
            .iter()
            .map(|user_id| CallMembership::new(*user_id, format!("{}-DEVICE", user_id)))
            .collect();
        self.members
            .lock()
            .unwrap()
            .insert(room_id.to_string(), memberships);
    }

    pub fn members(&self, room_id: &str) -> Vec<CallMembership> {
        self.members
            .lock()
            .unwrap()
            .get(room_id)
            .cloned()
            .unwrap_or_default()
    }
}

pub struct MockSession {
    room_id: String,
    state: MockRoomState,
    memberships: Mutex<Vec<CallMembership>>,
    member_updates: AtomicUsize,
    stop_calls: AtomicUsize,
    encryption_events: Mutex<Vec<MatrixEvent>>,
}

impl MockSession {
    pub fn stop_count(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub fn member_update_count(&self) -> usize {
        self.member_updates.load(Ordering::SeqCst)
    }

    pub fn encryption_event_ids(&self) -> Vec<String> {
        self.encryption_events
            .lock()
            .unwrap()
            .iter()
            .map(|event| event.event_id.clone())
            .collect()
    }

    pub fn encryption_events(&self) -> Vec<MatrixEvent> {
        self.encryption_events.lock().unwrap().clone()
    }
}

impl RtcSession for MockSession {
    fn room_id(&self) -> &str {
        &self.room_id
    }

    fn memberships(&self) -> Vec<CallMembership> {
        self.memberships.lock().unwrap().clone()
    }

    fn on_rtc_session_member_update(&self) {
        self.member_updates.fetch_add(1, Ordering::SeqCst);
        *self.memberships.lock().unwrap() = self.state.members(&self.room_id);
    }

    fn on_call_encryption(&self, event: &MatrixEvent) {
        self.encryption_events.lock().unwrap().push(event.clone());
    }

    fn stop(&self) {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct MockSessionFactory {
    state: MockRoomState,
    created: Mutex<Vec<Arc<MockSession>>>,
}

impl MockSessionFactory {
    pub fn new(state: MockRoomState) -> Self {
        Self {
            state,
            created: Mutex::new(Vec::new()),
        }
    }

    pub fn created(&self) -> Vec<Arc<MockSession>> {
        self.created.lock().unwrap().clone()
    }

    pub fn created_for(&self, room_id: &str) -> Vec<Arc<MockSession>> {
        self.created()
            .into_iter()
            .filter(|session| session.room_id == room_id)
            .collect()
    }

    /// Sessions built for the room that have not been stopped
    pub fn live_for(&self, room_id: &str) -> Vec<Arc<MockSession>> {
        self.created_for(room_id)
            .into_iter()
            .filter(|session| session.stop_count() == 0)
            .collect()
    }
}

impl SessionFactory for MockSessionFactory {
    fn session_for_room(&self, room: &Room) -> Arc<dyn RtcSession> {
        let session = Arc::new(MockSession {
            room_id: room.room_id.clone(),
            state: self.state.clone(),
            memberships: Mutex::new(self.state.members(&room.room_id)),
            member_updates: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
            encryption_events: Mutex::new(Vec::new()),
        });
        self.created.lock().unwrap().push(session.clone());
        session
    }
}
