use chrono::DateTime;
use chrono::Utc;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::Speaker;

/// One mirrored transcript line. The timestamp is assigned by the store that
/// persists it and is therefore empty on records that haven't been written yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub speaker: Speaker,
    pub text: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl LogRecord {
    pub fn new(speaker: Speaker, text: &str, display_name: &str) -> LogRecord {
        return LogRecord {
            speaker,
            text: text.to_string(),
            display_name: display_name.to_string(),
            timestamp: None,
        };
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub identity: String,
    pub display_name: String,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_salt: Option<String>,
}

impl UserRecord {
    pub fn new(identity: &str, display_name: &str, now: DateTime<Utc>) -> UserRecord {
        return UserRecord {
            identity: identity.to_string(),
            display_name: display_name.to_string(),
            first_seen_at: now,
            last_seen_at: now,
            password_hash: None,
            password_salt: None,
        };
    }
}
