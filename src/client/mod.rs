// Boundary to the messaging client
//
// The session manager never talks to the network or the crypto store itself.
// Everything it needs from the client (rooms, the event stream, decryption)
// goes through the `MatrixClient` trait defined here.

// Public API - what other modules can use
pub use events::{
    ClientEvent, DecryptionError, MatrixEvent, CALL_ENCRYPTION_KEYS_EVENT_TYPE,
    CALL_MEMBER_EVENT_TYPE, ENCRYPTED_EVENT_TYPE,
};
pub use matrix_client::MatrixClient;
pub use memory::InMemoryMatrixClient;
pub use room::Room;

// Internal modules
mod events;
mod matrix_client;
mod memory;
mod room;
