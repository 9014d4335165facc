#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::models::LogRecord;
use crate::domain::models::StoreName;
use crate::domain::models::TranscriptStore;
use crate::domain::models::UserRecord;

/// Keeps everything in process. Nothing survives a restart.
#[derive(Default)]
pub struct Memory {
    logs: RwLock<Vec<LogRecord>>,
    users: RwLock<HashMap<String, UserRecord>>,
}

#[async_trait]
impl TranscriptStore for Memory {
    fn name(&self) -> StoreName {
        return StoreName::Memory;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn append_log(&self, mut record: LogRecord) -> Result<()> {
        record.timestamp = Some(Utc::now());
        self.logs.write().await.push(record);

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn recent_logs(&self, limit: usize) -> Result<Vec<LogRecord>> {
        let logs = self.logs.read().await;

        return Ok(logs.iter().rev().take(limit).cloned().collect());
    }

    #[allow(clippy::implicit_return)]
    async fn get_user(&self, identity: &str) -> Result<Option<UserRecord>> {
        return Ok(self.users.read().await.get(identity).cloned());
    }

    #[allow(clippy::implicit_return)]
    async fn put_user(&self, record: &UserRecord) -> Result<()> {
        self.users
            .write()
            .await
            .insert(record.identity.to_string(), record.clone());

        return Ok(());
    }
}
