use async_trait::async_trait;
use tokio::sync::broadcast;

use super::{
    events::{ClientEvent, DecryptionError, MatrixEvent},
    room::Room,
};

/// Trait for the messaging client the session manager rides on
///
/// Implementations own the room model, the sync loop and the crypto store.
/// The session manager only reads from them.
#[async_trait]
pub trait MatrixClient: Send + Sync {
    /// All rooms the client currently knows about
    ///
    /// Returns `None` when the client cannot enumerate rooms yet; callers
    /// treat that the same as an empty list.
    fn rooms(&self) -> Option<Vec<Room>>;

    /// Look up a single room, `None` if the client does not know it
    fn get_room(&self, room_id: &str) -> Option<Room>;

    /// Subscribe to room-appeared, timeline and room-state events
    ///
    /// Events arrive in the order the client delivers them. Dropping the
    /// receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<ClientEvent>;

    /// Decrypt an event if it is encrypted
    ///
    /// Returns the clear event. Events that are not encrypted are returned
    /// unchanged.
    async fn decrypt_event_if_needed(
        &self,
        event: &MatrixEvent,
    ) -> Result<MatrixEvent, DecryptionError>;
}
