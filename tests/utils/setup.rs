use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use matrixrtc_sessions::{
    InMemoryMatrixClient, ManagerConfig, MatrixEvent, MatrixRtcSessionManager, Room,
    SessionManagerEvent, CALL_ENCRYPTION_KEYS_EVENT_TYPE, CALL_MEMBER_EVENT_TYPE,
};

use super::mocks::{MockRoomState, MockSession, MockSessionFactory};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub client: Arc<InMemoryMatrixClient>,
    pub factory: Arc<MockSessionFactory>,
    pub state: MockRoomState,
    pub manager: MatrixRtcSessionManager,
    pub notifications: broadcast::Receiver<SessionManagerEvent>,
}

impl TestSetup {
    /// Lets the listener task drain the client event stream
    ///
    /// Tests run on a paused clock, so the sleep only completes once every
    /// other task is idle.
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    /// Notifications received since the last call
    pub fn take_notifications(&mut self) -> Vec<SessionManagerEvent> {
        let mut received = Vec::new();
        while let Ok(event) = self.notifications.try_recv() {
            received.push(event);
        }
        received
    }

    pub fn take_notification_types(&mut self) -> Vec<&'static str> {
        self.take_notifications()
            .iter()
            .map(|event| event.event_type())
            .collect()
    }

    /// Change the room's call members and announce it through the client
    pub fn announce_members(&self, room_id: &str, user_ids: &[&str]) {
        self.state.set_members(room_id, user_ids);
        self.client.send_state_event(member_event(room_id));
    }

    /// The room's one live session
    pub fn session_for(&self, room_id: &str) -> Arc<MockSession> {
        let mut sessions = self.factory.live_for(room_id);
        assert_eq!(sessions.len(), 1, "expected exactly one live session for {}", room_id);
        sessions.remove(0)
    }
}

pub fn member_event(room_id: &str) -> MatrixEvent {
    MatrixEvent::new(
        format!("$member-{}", room_id),
        room_id,
        "@alice:example.org",
        CALL_MEMBER_EVENT_TYPE,
    )
    .with_state_key("_@alice:example.org_ALICEDEVICE")
    .with_content(serde_json::json!({ "application": "m.call", "call_id": "" }))
}

pub fn encryption_keys_event(event_id: &str, room_id: &str) -> MatrixEvent {
    MatrixEvent::new(
        event_id,
        room_id,
        "@alice:example.org",
        CALL_ENCRYPTION_KEYS_EVENT_TYPE,
    )
    .with_content(serde_json::json!({
        "keys": [{ "index": 0, "key": "c2VjcmV0" }],
        "device_id": "ALICEDEVICE",
        "call_id": ""
    }))
}

pub struct TestSetupBuilder {
    rooms: Vec<(String, Vec<String>)>,
    retry_delay: Duration,
    start: bool,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            rooms: vec![],
            retry_delay: Duration::from_millis(10),
            start: true,
        }
    }

    /// A room the client knows about before the manager starts
    pub fn with_room(mut self, room_id: &str) -> Self {
        self.rooms.push((room_id.to_string(), vec![]));
        self
    }

    /// A known room that already has a call running
    pub fn with_active_room(mut self, room_id: &str, user_ids: &[&str]) -> Self {
        self.rooms.push((
            room_id.to_string(),
            user_ids.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn without_start(mut self) -> Self {
        self.start = false;
        self
    }

    pub async fn build(self) -> TestSetup {
        let client = Arc::new(InMemoryMatrixClient::new());
        let state = MockRoomState::default();
        let factory = Arc::new(MockSessionFactory::new(state.clone()));

        for (room_id, user_ids) in &self.rooms {
            let user_ids: Vec<&str> = user_ids.iter().map(String::as_str).collect();
            state.set_members(room_id, &user_ids);
            client.insert_room(Room::new(room_id.as_str()));
        }

        let manager = MatrixRtcSessionManager::new(
            client.clone(),
            factory.clone(),
            ManagerConfig::default().with_decryption_retry_delay(self.retry_delay),
        );
        let notifications = manager.subscribe();

        if self.start {
            manager.start().await.unwrap();
        }

        TestSetup {
            client,
            factory,
            state,
            manager,
            notifications,
        }
    }
}
