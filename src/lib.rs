// Library crate for tracking MatrixRTC sessions per room
// This file exposes the public API for hosts and integration tests

pub mod client;
pub mod manager;
pub mod session;
pub mod shared;

// Re-export commonly used types for easier access in tests
pub use client::{
    ClientEvent, DecryptionError, InMemoryMatrixClient, MatrixClient, MatrixEvent, Room,
    CALL_ENCRYPTION_KEYS_EVENT_TYPE, CALL_MEMBER_EVENT_TYPE, ENCRYPTED_EVENT_TYPE,
};
pub use manager::{
    ManagerConfig, MatrixRtcSessionManager, SessionEventBus, SessionManagerEvent,
};
pub use session::{CallMembership, RtcSession, SessionFactory};
pub use shared::SessionError;
