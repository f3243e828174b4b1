// Boundary to the per-room session object
//
// How a session computes its membership from room state and decrypted key
// events is up to the implementation. The manager only needs the operations
// declared here.

// Public API - what other modules can use
pub use rtc_session::{RtcSession, SessionFactory};
pub use types::CallMembership;

// Internal modules
mod rtc_session;
mod types;
