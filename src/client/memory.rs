use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, instrument};

use super::{
    events::{ClientEvent, DecryptionError, MatrixEvent, ENCRYPTED_EVENT_TYPE},
    matrix_client::MatrixClient,
    room::Room,
};

const MEGOLM_ALGORITHM: &str = "m.megolm.v1.aes-sha2";

/// In-memory implementation of MatrixClient for development and testing
///
/// Rooms and events are pushed in by the host. Encrypted events are backed by
/// a plaintext table, and decryption can be scripted to fail a fixed number
/// of times per event.
pub struct InMemoryMatrixClient {
    rooms: Mutex<HashMap<String, Room>>,
    rooms_unavailable: AtomicBool,
    sender: broadcast::Sender<ClientEvent>,
    plaintexts: Mutex<HashMap<String, MatrixEvent>>,
    // event_id -> failures still to report
    scripted_failures: Mutex<HashMap<String, u32>>,
    // event_id -> number of decrypt calls seen
    decryption_attempts: Mutex<HashMap<String, u32>>,
}

impl Default for InMemoryMatrixClient {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InMemoryMatrixClient {
    /// Creates a client with no rooms and the default event stream capacity
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            rooms: Mutex::new(HashMap::new()),
            rooms_unavailable: AtomicBool::new(false),
            sender,
            plaintexts: Mutex::new(HashMap::new()),
            scripted_failures: Mutex::new(HashMap::new()),
            decryption_attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Adds a room without announcing it, as if it was loaded before anyone subscribed
    pub fn insert_room(&self, room: Room) {
        debug!(room_id = %room.room_id, "Inserting room");
        lock(&self.rooms).insert(room.room_id.clone(), room);
    }

    /// Adds a room and announces it to subscribers
    pub fn add_room(&self, room: Room) {
        self.insert_room(room.clone());
        self.emit(ClientEvent::Room(room));
    }

    /// Makes `rooms()` report that rooms cannot be enumerated
    pub fn set_rooms_unavailable(&self, unavailable: bool) {
        self.rooms_unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn send_timeline_event(&self, event: MatrixEvent) {
        self.emit(ClientEvent::Timeline(event));
    }

    pub fn send_state_event(&self, event: MatrixEvent) {
        self.emit(ClientEvent::RoomState(event));
    }

    /// Registers the clear form of an event and returns its encrypted wrapper
    pub fn encrypt(&self, clear: MatrixEvent) -> MatrixEvent {
        let encrypted = MatrixEvent {
            event_id: clear.event_id.clone(),
            room_id: clear.room_id.clone(),
            sender: clear.sender.clone(),
            event_type: ENCRYPTED_EVENT_TYPE.to_string(),
            state_key: None,
            content: serde_json::json!({
                "algorithm": MEGOLM_ALGORITHM,
                "session_id": session_id_for(&clear.event_id),
            }),
        };
        lock(&self.plaintexts).insert(clear.event_id.clone(), clear);
        encrypted
    }

    /// The next `times` decryption attempts for this event fail
    pub fn fail_decryption(&self, event_id: &str, times: u32) {
        lock(&self.scripted_failures).insert(event_id.to_string(), times);
    }

    /// How many times decryption was requested for this event
    pub fn decryption_attempts(&self, event_id: &str) -> u32 {
        lock(&self.decryption_attempts)
            .get(event_id)
            .copied()
            .unwrap_or(0)
    }

    fn emit(&self, event: ClientEvent) {
        let kind = event.kind();
        match self.sender.send(event) {
            Ok(receivers) => debug!(kind, receivers, "Client event emitted"),
            Err(_) => debug!(kind, "Client event emitted with no receivers"),
        }
    }
}

fn session_id_for(event_id: &str) -> String {
    format!("megolm-{}", event_id.trim_start_matches('$'))
}

#[async_trait]
impl MatrixClient for InMemoryMatrixClient {
    fn rooms(&self) -> Option<Vec<Room>> {
        if self.rooms_unavailable.load(Ordering::SeqCst) {
            return None;
        }
        Some(lock(&self.rooms).values().cloned().collect())
    }

    fn get_room(&self, room_id: &str) -> Option<Room> {
        lock(&self.rooms).get(room_id).cloned()
    }

    fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.sender.subscribe()
    }

    #[instrument(skip(self, event), fields(event_id = %event.event_id))]
    async fn decrypt_event_if_needed(
        &self,
        event: &MatrixEvent,
    ) -> Result<MatrixEvent, DecryptionError> {
        *lock(&self.decryption_attempts)
            .entry(event.event_id.clone())
            .or_insert(0) += 1;

        if !event.is_encrypted() {
            return Ok(event.clone());
        }

        let session_id = session_id_for(&event.event_id);

        {
            let mut failures = lock(&self.scripted_failures);
            if let Some(remaining) = failures.get_mut(&event.event_id) {
                if *remaining > 0 {
                    *remaining -= 1;
                    debug!("Scripted decryption failure");
                    return Err(DecryptionError::MissingRoomKey(session_id));
                }
            }
        }

        lock(&self.plaintexts)
            .get(&event.event_id)
            .cloned()
            .ok_or(DecryptionError::MissingRoomKey(session_id))
    }
}
