#[cfg(test)]
#[path = "firestore_test.rs"]
mod tests;

use std::collections::HashMap;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use chrono::DateTime;
use chrono::SecondsFormat;
use chrono::Utc;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::LogRecord;
use crate::domain::models::Speaker;
use crate::domain::models::StoreName;
use crate::domain::models::TranscriptStore;
use crate::domain::models::UserRecord;

type Fields = HashMap<String, serde_json::Value>;

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    name: String,
    #[serde(default)]
    fields: Fields,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
struct QueryResult {
    document: Option<Document>,
}

fn string_value(text: &str) -> serde_json::Value {
    return json!({ "stringValue": text });
}

fn timestamp_value(time: &DateTime<Utc>) -> serde_json::Value {
    return json!({ "timestampValue": time.to_rfc3339_opts(SecondsFormat::Micros, true) });
}

fn get_string(fields: &Fields, key: &str) -> Option<String> {
    return fields
        .get(key)?
        .get("stringValue")?
        .as_str()
        .map(|text| return text.to_string());
}

fn get_timestamp(fields: &Fields, key: &str) -> Option<DateTime<Utc>> {
    let text = fields.get(key)?.get("timestampValue")?.as_str()?;
    return DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|time| return time.with_timezone(&Utc));
}

fn log_from_fields(fields: &Fields) -> Option<LogRecord> {
    let speaker = Speaker::parse(&get_string(fields, "speaker")?)?;
    let mut record = LogRecord::new(
        speaker,
        &get_string(fields, "message").unwrap_or_default(),
        &get_string(fields, "username").unwrap_or_else(|| return "System".to_string()),
    );
    record.timestamp = get_timestamp(fields, "timestamp");

    return Some(record);
}

fn user_from_fields(identity: &str, fields: &Fields) -> Result<UserRecord> {
    let first_seen_at = match get_timestamp(fields, "first_seen") {
        Some(time) => time,
        None => bail!("User '{identity}' has no first_seen timestamp"),
    };

    let mut record = UserRecord::new(
        identity,
        &get_string(fields, "original_username").unwrap_or_else(|| return identity.to_string()),
        first_seen_at,
    );
    record.last_seen_at = get_timestamp(fields, "last_seen").unwrap_or(first_seen_at);
    record.password_hash = get_string(fields, "password_hash");
    record.password_salt = get_string(fields, "password_salt");

    return Ok(record);
}

fn user_to_fields(record: &UserRecord) -> Fields {
    let mut fields = Fields::new();
    fields.insert(
        "original_username".to_string(),
        string_value(&record.display_name),
    );
    fields.insert(
        "first_seen".to_string(),
        timestamp_value(&record.first_seen_at),
    );
    fields.insert(
        "last_seen".to_string(),
        timestamp_value(&record.last_seen_at),
    );
    if let Some(hash) = &record.password_hash {
        fields.insert("password_hash".to_string(), string_value(hash));
    }
    if let Some(salt) = &record.password_salt {
        fields.insert("password_salt".to_string(), string_value(salt));
    }

    return fields;
}

/// Cloud Firestore through its REST API, authenticated with an OAuth access
/// token. Log documents get their timestamp from the server.
pub struct Firestore {
    url: String,
    project: String,
    token: String,
    log_collection: String,
    users_collection: String,
    timeout: String,
}

impl Default for Firestore {
    fn default() -> Firestore {
        return Firestore {
            url: Config::get(ConfigKey::FirestoreURL),
            project: Config::get(ConfigKey::FirestoreProject),
            token: Config::get(ConfigKey::FirestoreToken),
            log_collection: Config::get(ConfigKey::LogCollection),
            users_collection: Config::get(ConfigKey::UsersCollection),
            timeout: Config::get(ConfigKey::BackendHealthCheckTimeout),
        };
    }
}

impl Firestore {
    fn database(&self) -> String {
        return format!("projects/{}/databases/(default)", self.project);
    }

    fn documents_url(&self) -> String {
        return format!("{}/v1/{}/documents", self.url, self.database());
    }

    fn user_url(&self, identity: &str) -> String {
        return format!(
            "{}/{}/{identity}",
            self.documents_url(),
            self.users_collection
        );
    }

    async fn check_status(res: reqwest::Response, action: &str) -> Result<reqwest::Response> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let body = res.text().await.unwrap_or_default();
        tracing::error!(status = status.as_u16(), body = %body, action, "Firestore request failed");
        bail!("Firestore failed to {action}, {}", status.as_u16());
    }
}

#[async_trait]
impl TranscriptStore for Firestore {
    fn name(&self) -> StoreName {
        return StoreName::Firestore;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if self.project.is_empty() {
            bail!("Firestore project is not defined");
        }
        if self.token.is_empty() {
            bail!("Firestore token is not defined");
        }

        let res = reqwest::Client::new()
            .get(format!(
                "{}/{}?pageSize=1",
                self.documents_url(),
                self.users_collection
            ))
            .bearer_auth(&self.token)
            .timeout(Duration::from_millis(self.timeout.parse::<u64>()?))
            .send()
            .await;

        let res = match res {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = ?err, "Firestore is not reachable");
                bail!("Firestore is not reachable");
            }
        };

        Firestore::check_status(res, "health check").await?;

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn append_log(&self, record: LogRecord) -> Result<()> {
        let name = format!(
            "{}/documents/{}/{}",
            self.database(),
            self.log_collection,
            Uuid::new_v4().simple()
        );
        let body = json!({
            "writes": [{
                "update": {
                    "name": name,
                    "fields": {
                        "speaker": string_value(&record.speaker.to_string()),
                        "message": string_value(&record.text),
                        "username": string_value(&record.display_name),
                    },
                },
                "updateTransforms": [{
                    "fieldPath": "timestamp",
                    "setToServerValue": "REQUEST_TIME",
                }],
            }],
        });

        let res = reqwest::Client::new()
            .post(format!("{}:commit", self.documents_url()))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        Firestore::check_status(res, "append a log").await?;

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn recent_logs(&self, limit: usize) -> Result<Vec<LogRecord>> {
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": self.log_collection }],
                "orderBy": [{
                    "field": { "fieldPath": "timestamp" },
                    "direction": "DESCENDING",
                }],
                "limit": limit,
            },
        });

        let res = reqwest::Client::new()
            .post(format!("{}:runQuery", self.documents_url()))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        let results = Firestore::check_status(res, "query logs")
            .await?
            .json::<Vec<QueryResult>>()
            .await?;

        let logs = results
            .iter()
            .filter_map(|result| return result.document.as_ref())
            .filter_map(|document| {
                let record = log_from_fields(&document.fields);
                if record.is_none() {
                    tracing::debug!(document = %document.name, "skipping unreadable log");
                }
                return record;
            })
            .collect();

        return Ok(logs);
    }

    #[allow(clippy::implicit_return)]
    async fn get_user(&self, identity: &str) -> Result<Option<UserRecord>> {
        let res = reqwest::Client::new()
            .get(self.user_url(identity))
            .bearer_auth(&self.token)
            .send()
            .await?;

        if res.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let document = Firestore::check_status(res, "read a user")
            .await?
            .json::<Document>()
            .await?;

        return Ok(Some(user_from_fields(identity, &document.fields)?));
    }

    #[allow(clippy::implicit_return)]
    async fn put_user(&self, record: &UserRecord) -> Result<()> {
        let res = reqwest::Client::new()
            .patch(self.user_url(&record.identity))
            .bearer_auth(&self.token)
            .json(&json!({ "fields": user_to_fields(record) }))
            .send()
            .await?;
        Firestore::check_status(res, "write a user").await?;

        return Ok(());
    }
}
