// Session lifecycle tracking
//
// The manager owns the per-room session registry, routes client events to
// the right session, and announces when a room's call starts or ends.

// Public API - what other modules can use
pub use config::ManagerConfig;
pub use events::{SessionEventBus, SessionManagerEvent};
pub use session_manager::MatrixRtcSessionManager;

// Internal modules
mod config;
mod decryption;
mod events;
mod registry;
mod session_manager;
mod transition;
