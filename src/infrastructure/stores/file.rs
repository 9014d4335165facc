#[cfg(test)]
#[path = "file_test.rs"]
mod tests;

use std::path;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::LogRecord;
use crate::domain::models::StoreName;
use crate::domain::models::TranscriptStore;
use crate::domain::models::UserRecord;

/// Stores logs as JSON lines in `{dir}/{log-collection}.jsonl` and every user
/// as `{dir}/{users-collection}/{identity}.yaml`.
pub struct File {
    dir: path::PathBuf,
    log_collection: String,
    users_collection: String,
    append_lock: Mutex<()>,
}

impl Default for File {
    fn default() -> File {
        return File::new(
            path::PathBuf::from(Config::get(ConfigKey::StoreDir)),
            &Config::get(ConfigKey::LogCollection),
            &Config::get(ConfigKey::UsersCollection),
        );
    }
}

impl File {
    pub fn new(dir: path::PathBuf, log_collection: &str, users_collection: &str) -> File {
        return File {
            dir,
            log_collection: log_collection.to_string(),
            users_collection: users_collection.to_string(),
            append_lock: Mutex::new(()),
        };
    }

    fn logs_path(&self) -> path::PathBuf {
        return self.dir.join(format!("{}.jsonl", self.log_collection));
    }

    fn users_dir(&self) -> path::PathBuf {
        return self.dir.join(&self.users_collection);
    }

    fn user_path(&self, identity: &str) -> Result<path::PathBuf> {
        if identity.is_empty()
            || !identity
                .chars()
                .all(|c| return c.is_ascii_alphanumeric() || c == '_')
        {
            bail!("'{identity}' can't be used as a file name");
        }

        return Ok(self.users_dir().join(format!("{identity}.yaml")));
    }
}

#[async_trait]
impl TranscriptStore for File {
    fn name(&self) -> StoreName {
        return StoreName::File;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if self.dir.as_os_str().is_empty() {
            bail!("Store directory is not defined");
        }

        fs::create_dir_all(self.users_dir()).await?;

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn append_log(&self, mut record: LogRecord) -> Result<()> {
        record.timestamp = Some(Utc::now());
        let line = format!("{}\n", serde_json::to_string(&record)?);

        let _guard = self.append_lock.lock().await;
        fs::create_dir_all(&self.dir).await?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.logs_path())
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn recent_logs(&self, limit: usize) -> Result<Vec<LogRecord>> {
        let logs_path = self.logs_path();
        if !logs_path.exists() {
            return Ok(vec![]);
        }

        let content = fs::read_to_string(logs_path).await?;
        let logs = content
            .lines()
            .rev()
            .filter(|line| return !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<LogRecord>(line) {
                Ok(record) => return Some(record),
                Err(err) => {
                    tracing::warn!(error = ?err, "skipping unreadable log line");
                    return None;
                }
            })
            .take(limit)
            .collect();

        return Ok(logs);
    }

    #[allow(clippy::implicit_return)]
    async fn get_user(&self, identity: &str) -> Result<Option<UserRecord>> {
        let user_path = self.user_path(identity)?;
        if !user_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(user_path).await?;

        return Ok(Some(serde_yaml::from_str(&content)?));
    }

    #[allow(clippy::implicit_return)]
    async fn put_user(&self, record: &UserRecord) -> Result<()> {
        let user_path = self.user_path(&record.identity)?;
        fs::create_dir_all(self.users_dir()).await?;
        fs::write(user_path, serde_yaml::to_string(record)?).await?;

        return Ok(());
    }
}
