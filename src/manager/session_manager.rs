use futures::future::{BoxFuture, FutureExt};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, instrument, trace, warn, Instrument};

use super::{
    config::ManagerConfig,
    decryption::{DecryptionAttempt, DecryptionGate},
    events::{SessionEventBus, SessionManagerEvent},
    registry::SessionRegistry,
    transition::MembershipRefresh,
};
use crate::client::{ClientEvent, MatrixClient, MatrixEvent, Room};
use crate::session::{RtcSession, SessionFactory};
use crate::shared::SessionError;

/// Tracks the MatrixRTC session of every room the client knows about
///
/// Holds exactly one session object per room for as long as the manager runs,
/// keeps each session's membership current as client events arrive, and
/// emits `SessionStarted` / `SessionEnded` when a room's call comes and goes.
///
/// Cloning is cheap and every clone shares the same registry.
#[derive(Clone)]
pub struct MatrixRtcSessionManager {
    client: Arc<dyn MatrixClient>,
    factory: Arc<dyn SessionFactory>,
    config: ManagerConfig,
    registry: Arc<RwLock<SessionRegistry>>,
    decryption: Arc<DecryptionGate>,
    event_bus: SessionEventBus,
    running: Arc<AtomicBool>,
    // bumped by every stop(); events carry the value they arrived under
    stop_generation: Arc<AtomicU64>,
    listener: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl MatrixRtcSessionManager {
    pub fn new(
        client: Arc<dyn MatrixClient>,
        factory: Arc<dyn SessionFactory>,
        config: ManagerConfig,
    ) -> Self {
        let decryption = Arc::new(DecryptionGate::new(
            client.clone(),
            config.decryption_retry_delay,
        ));
        let event_bus = SessionEventBus::new(config.notification_capacity);

        Self {
            client,
            factory,
            config,
            registry: Arc::new(RwLock::new(SessionRegistry::new())),
            decryption,
            event_bus,
            running: Arc::new(AtomicBool::new(false)),
            stop_generation: Arc::new(AtomicU64::new(0)),
            listener: Arc::new(Mutex::new(None)),
        }
    }

    /// Seed the registry from the client's rooms and start following its events
    ///
    /// The event stream is subscribed before seeding, so events delivered
    /// while seeding are handled afterwards rather than lost.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<(), SessionError> {
        let mut listener = self.listener.lock().await;
        if listener.is_some() || self.running.swap(true, Ordering::SeqCst) {
            warn!("Session manager start called while already running");
            return Err(SessionError::AlreadyRunning);
        }

        let receiver = self.client.subscribe();

        let rooms = self.client.rooms().unwrap_or_else(|| {
            debug!("Client could not enumerate rooms, starting with none");
            Vec::new()
        });
        info!(room_count = rooms.len(), "Starting session manager");

        for room in &rooms {
            self.on_room(room).await;
        }

        *listener = Some(self.spawn_listener(receiver));
        Ok(())
    }

    /// Stop every session, clear the registry and unsubscribe from the client
    ///
    /// Returns once the listener task has finished, so no event handled
    /// before or during the call can add a session afterwards.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        if let Some(handle) = self.listener.lock().await.take() {
            handle.abort();
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    error!(error = %e, "Client event listener failed");
                }
            }
        }
        self.running.store(false, Ordering::SeqCst);

        let mut registry = self.registry.write().await;
        self.stop_generation.fetch_add(1, Ordering::SeqCst);
        let removed = registry.remove_all();
        info!(removed, "Session manager stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Subscribe to session start/end notifications
    pub fn subscribe(&self) -> broadcast::Receiver<SessionManagerEvent> {
        self.event_bus.subscribe()
    }

    /// The room's session if it is already tracked; never creates one
    pub async fn get_active_session(&self, room: &Room) -> Option<Arc<dyn RtcSession>> {
        self.registry.read().await.get_active(&room.room_id)
    }

    /// The room's session, created on first use and stable afterwards
    pub async fn get_session(&self, room: &Room) -> Arc<dyn RtcSession> {
        self.registry
            .write()
            .await
            .get_or_create(room, self.factory.as_ref())
    }

    /// Number of rooms with a tracked session
    pub async fn session_count(&self) -> usize {
        self.registry.read().await.len()
    }

    /// Route one client event to its handler
    pub async fn handle_client_event(&self, event: ClientEvent) {
        match event {
            ClientEvent::Room(room) => self.on_room(&room).await,
            ClientEvent::Timeline(event) => self.on_timeline_event(event).await,
            ClientEvent::RoomState(event) => self.on_room_state_event(&event).await,
        }
    }

    /// A room became visible: track its session if a call is already running
    ///
    /// A call already running when the room is first seen is pre-existing
    /// state, not a transition, so nothing is announced. Rooms without
    /// members stay untracked. Seeing the same room again is a no-op.
    #[instrument(skip(self, room), fields(room_id = %room.room_id))]
    pub async fn on_room(&self, room: &Room) {
        let mut registry = self.registry.write().await;
        if registry.contains(&room.room_id) {
            debug!("Room already tracked");
            return;
        }

        if let Some(session) = registry.create_if_active(room, self.factory.as_ref()) {
            info!(
                members = session.memberships().len(),
                "Found existing RTC session in room"
            );
        }
    }

    /// A timeline event arrived: decrypt it and pass call encryption keys to the session
    #[instrument(skip(self, event), fields(event_id = %event.event_id))]
    pub async fn on_timeline_event(&self, event: MatrixEvent) {
        let generation = self.stop_generation.load(Ordering::SeqCst);
        self.consume_call_encryption_event(event, DecryptionAttempt::First, generation)
            .await;
    }

    /// A state event was applied: refresh the room's membership on call member changes
    #[instrument(skip(self, event), fields(event_id = %event.event_id))]
    pub async fn on_room_state_event(&self, event: &MatrixEvent) {
        if event.event_type != self.config.call_member_event_type {
            trace!(event_type = %event.event_type, "Ignoring state event");
            return;
        }

        match self.resolve_room(event) {
            Ok(room) => self.refresh_room(&room).await,
            Err(e) => error!(error = %e, "Got room state event for unknown room"),
        }
    }

    // Boxed so the scheduled retry can call back into it
    fn consume_call_encryption_event(
        &self,
        event: MatrixEvent,
        attempt: DecryptionAttempt,
        generation: u64,
    ) -> BoxFuture<'static, ()> {
        let manager = self.clone();

        async move {
            let retry_manager = manager.clone();
            let retry = move |event: MatrixEvent| {
                retry_manager.consume_call_encryption_event(
                    event,
                    DecryptionAttempt::Retry,
                    generation,
                )
            };

            let Some(event) = manager.decryption.decrypt(event, attempt, retry).await else {
                return;
            };

            if event.event_type != manager.config.call_encryption_event_type {
                trace!(event_type = %event.event_type, "Ignoring timeline event");
                return;
            }

            match manager.dispatch_call_encryption(&event, generation).await {
                Ok(true) => {}
                Ok(false) => debug!(
                    event_id = %event.event_id,
                    retried = attempt.is_retry(),
                    "Dropping call encryption event, manager stopped since it arrived"
                ),
                Err(e) => error!(
                    event_id = %event.event_id,
                    error = %e,
                    "Got call encryption event for unknown room"
                ),
            }
        }
        .boxed()
    }

    /// Hands the event to the room's session unless `stop()` ran after `generation`
    async fn dispatch_call_encryption(
        &self,
        event: &MatrixEvent,
        generation: u64,
    ) -> Result<bool, SessionError> {
        let room = self.resolve_room(event)?;
        let session = {
            let mut registry = self.registry.write().await;
            if self.stop_generation.load(Ordering::SeqCst) != generation {
                return Ok(false);
            }
            registry.get_or_create(&room, self.factory.as_ref())
        };

        debug!(
            room_id = %room.room_id,
            event_id = %event.event_id,
            "Passing call encryption event to session"
        );
        session.on_call_encryption(event);
        Ok(true)
    }

    /// Recompute the room's membership and announce start/end edges
    async fn refresh_room(&self, room: &Room) {
        let (refresh, session) = {
            let mut registry = self.registry.write().await;
            let is_new_session = !registry.contains(&room.room_id);
            let session = registry.get_or_create(room, self.factory.as_ref());
            let refresh = MembershipRefresh::apply(session.as_ref(), is_new_session);
            (refresh, session)
        };

        debug!(
            room_id = %room.room_id,
            was_active = refresh.was_active,
            is_active = refresh.is_active,
            "Refreshed RTC session membership"
        );

        if let Some(transition) = refresh.transition() {
            info!(room_id = %room.room_id, transition = ?transition, "RTC session transition");
            self.event_bus
                .emit(transition.into_event(room.room_id.clone(), session));
        }
    }

    fn resolve_room(&self, event: &MatrixEvent) -> Result<Room, SessionError> {
        let room_id = event
            .room_id
            .as_deref()
            .ok_or_else(|| SessionError::MissingRoomId(event.event_id.clone()))?;

        self.client
            .get_room(room_id)
            .ok_or_else(|| SessionError::unknown_room(room_id))
    }

    fn spawn_listener(&self, mut receiver: broadcast::Receiver<ClientEvent>) -> JoinHandle<()> {
        let manager = self.clone();

        let listener = async move {
            debug!("Client event listener started");

            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        trace!(kind = event.kind(), "Received client event");
                        manager.handle_client_event(event).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Session manager fell behind the client event stream");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            info!("Client event stream closed");
        };

        tokio::spawn(listener.instrument(info_span!("client_event_listener")))
    }
}
