use anyhow::Result;
use async_trait::async_trait;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

use super::LogRecord;
use super::UserRecord;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum StoreName {
    Memory,
    File,
    Firestore,
}

impl StoreName {
    pub fn parse(text: String) -> Option<StoreName> {
        return StoreName::iter().find(|e| return e.to_string() == text);
    }
}

/// Durable sink for mirrored transcripts and user records. Stores are shared
/// process wide and must tolerate concurrent best effort writes.
#[async_trait]
pub trait TranscriptStore {
    fn name(&self) -> StoreName;

    async fn health_check(&self) -> Result<()>;

    /// Appends a log record. The store stamps it with its own notion of now.
    async fn append_log(&self, record: LogRecord) -> Result<()>;

    /// Newest records first.
    async fn recent_logs(&self, limit: usize) -> Result<Vec<LogRecord>>;

    async fn get_user(&self, identity: &str) -> Result<Option<UserRecord>>;

    async fn put_user(&self, record: &UserRecord) -> Result<()>;
}

pub type StoreBox = Box<dyn TranscriptStore + Send + Sync>;
