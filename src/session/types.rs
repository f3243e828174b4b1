use serde::{Deserialize, Serialize};

/// One device's participation in a room's call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallMembership {
    pub user_id: String,
    pub device_id: String,
    pub call_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,
    /// Lifetime of the membership, relative to its creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_ms: Option<u64>,
}

impl CallMembership {
    pub fn new(user_id: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            device_id: device_id.into(),
            call_id: String::new(),
            application: Some("m.call".to_string()),
            expires_ms: None,
        }
    }
}
