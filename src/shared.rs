use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Unknown room: {0}")]
    UnknownRoom(String),

    #[error("Event {0} has no room id")]
    MissingRoomId(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidConfig { key: &'static str, value: String },

    #[error("Session manager is already running")]
    AlreadyRunning,
}

impl SessionError {
    /// Create an unknown room error
    pub fn unknown_room(room_id: impl Into<String>) -> Self {
        SessionError::UnknownRoom(room_id.into())
    }
}
