use std::time::Duration;

use crate::client::{CALL_ENCRYPTION_KEYS_EVENT_TYPE, CALL_MEMBER_EVENT_TYPE};
use crate::shared::SessionError;

const RETRY_DELAY_ENV: &str = "MATRIXRTC_DECRYPTION_RETRY_MS";
const CALL_MEMBER_ENV: &str = "MATRIXRTC_CALL_MEMBER_EVENT_TYPE";
const CALL_ENCRYPTION_ENV: &str = "MATRIXRTC_CALL_ENCRYPTION_EVENT_TYPE";
const NOTIFICATION_CAPACITY_ENV: &str = "MATRIXRTC_NOTIFICATION_CAPACITY";

/// Configuration for the session manager
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// How long to wait before the single decryption retry
    pub decryption_retry_delay: Duration,
    /// State event type that announces call membership
    pub call_member_event_type: String,
    /// Timeline event type carrying call encryption keys
    pub call_encryption_event_type: String,
    /// Buffer size of the start/end notification channel
    pub notification_capacity: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            decryption_retry_delay: Duration::from_secs(1),
            call_member_event_type: CALL_MEMBER_EVENT_TYPE.to_string(),
            call_encryption_event_type: CALL_ENCRYPTION_KEYS_EVENT_TYPE.to_string(),
            notification_capacity: 100,
        }
    }
}

impl ManagerConfig {
    /// Build a config from `MATRIXRTC_*` environment variables, falling back to defaults
    pub fn from_env() -> Result<Self, SessionError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SessionError> {
        let mut config = Self::default();

        if let Some(value) = lookup(RETRY_DELAY_ENV) {
            let millis = parse_number(RETRY_DELAY_ENV, &value)?;
            config.decryption_retry_delay = Duration::from_millis(millis);
        }
        if let Some(value) = lookup(CALL_MEMBER_ENV) {
            config.call_member_event_type = value;
        }
        if let Some(value) = lookup(CALL_ENCRYPTION_ENV) {
            config.call_encryption_event_type = value;
        }
        if let Some(value) = lookup(NOTIFICATION_CAPACITY_ENV) {
            let capacity = parse_number(NOTIFICATION_CAPACITY_ENV, &value)?;
            // broadcast channels panic on zero capacity
            if capacity == 0 {
                return Err(SessionError::InvalidConfig {
                    key: NOTIFICATION_CAPACITY_ENV,
                    value,
                });
            }
            config.notification_capacity = capacity as usize;
        }

        Ok(config)
    }

    /// Set the delay before the decryption retry
    pub fn with_decryption_retry_delay(mut self, delay: Duration) -> Self {
        self.decryption_retry_delay = delay;
        self
    }

    /// Set the membership state event type
    pub fn with_call_member_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.call_member_event_type = event_type.into();
        self
    }

    /// Set the call encryption timeline event type
    pub fn with_call_encryption_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.call_encryption_event_type = event_type.into();
        self
    }

    /// Set the notification channel capacity
    pub fn with_notification_capacity(mut self, capacity: usize) -> Self {
        self.notification_capacity = capacity.max(1);
        self
    }
}

fn parse_number(key: &'static str, value: &str) -> Result<u64, SessionError> {
    value
        .trim()
        .parse()
        .map_err(|_| SessionError::InvalidConfig {
            key,
            value: value.to_string(),
        })
}
