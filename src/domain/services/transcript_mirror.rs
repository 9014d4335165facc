#[cfg(test)]
#[path = "transcript_mirror_test.rs"]
mod tests;

use chrono::DateTime;
use chrono::Utc;

use super::identity;
use crate::domain::models::LogRecord;
use crate::domain::models::MirrorError;
use crate::domain::models::Speaker;
use crate::domain::models::StoreBox;
use crate::domain::models::UserRecord;

pub const DEFAULT_RECENT_LIMIT: usize = 50;

pub type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Best effort copy of the conversation and its users in a transcript store.
/// Nothing here is allowed to interrupt the conversation itself.
pub struct TranscriptMirror {
    store: StoreBox,
    clock: Clock,
}

impl TranscriptMirror {
    pub fn new(store: StoreBox) -> TranscriptMirror {
        return TranscriptMirror::with_clock(store, Box::new(Utc::now));
    }

    pub fn with_clock(store: StoreBox, clock: Clock) -> TranscriptMirror {
        return TranscriptMirror { store, clock };
    }

    pub fn store(&self) -> &StoreBox {
        return &self.store;
    }

    pub fn now(&self) -> DateTime<Utc> {
        return (self.clock)();
    }

    /// Appends one line to the log collection. Failures are logged and
    /// dropped.
    pub async fn record(&self, speaker: Speaker, text: &str, display_name: &str) {
        let record = LogRecord::new(speaker, text, display_name);
        if let Err(err) = self.store.append_log(record).await {
            tracing::warn!(
                store = %self.store.name(),
                speaker = %speaker,
                error = ?err,
                "failed to mirror log record"
            );
        }
    }

    /// Creates the user on first sight, otherwise refreshes when it was last
    /// seen. Concurrent upserts of the same user race and the last write wins.
    pub async fn upsert_user(&self, display_name: &str) -> Result<UserRecord, MirrorError> {
        let display_name = display_name.trim();
        let identity = identity::derive(display_name)?;
        let now = self.now();

        let existing = self
            .store
            .get_user(&identity)
            .await
            .map_err(|err| return MirrorError::Store(format!("{err:#}")))?;

        let record = match existing {
            Some(mut record) => {
                record.display_name = display_name.to_string();
                record.last_seen_at = now;
                record
            }
            None => UserRecord::new(&identity, display_name, now),
        };

        self.store
            .put_user(&record)
            .await
            .map_err(|err| return MirrorError::Store(format!("{err:#}")))?;

        tracing::debug!(identity = %record.identity, "user upserted");

        return Ok(record);
    }

    /// The newest log records first.
    pub async fn recent(&self, limit: usize) -> Result<Vec<LogRecord>, MirrorError> {
        return self
            .store
            .recent_logs(limit)
            .await
            .map_err(|err| return MirrorError::Store(format!("{err:#}")));
    }
}
