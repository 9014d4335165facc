use std::io::Write;

use anyhow::Result;
use chrono::TimeZone;
use chrono::Utc;

use super::File;
use crate::domain::models::LogRecord;
use crate::domain::models::Speaker;
use crate::domain::models::TranscriptStore;
use crate::domain::models::UserRecord;

fn store(dir: &tempfile::TempDir) -> File {
    return File::new(dir.path().join("store"), "chat_logs", "users");
}

#[tokio::test]
async fn it_health_checks_by_creating_the_directories() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = store(&dir);

    store.health_check().await?;

    assert!(dir.path().join("store/users").is_dir());

    return Ok(());
}

#[tokio::test]
async fn it_appends_logs_as_json_lines() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = store(&dir);

    store
        .append_log(LogRecord::new(Speaker::User, "Hallo", "Max"))
        .await?;
    store
        .append_log(LogRecord::new(Speaker::Assistant, "Hi there", "Max"))
        .await?;

    let content = std::fs::read_to_string(dir.path().join("store/chat_logs.jsonl"))?;
    let lines = content.lines().collect::<Vec<&str>>();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with(r#"{"speaker":"user","text":"Hallo","display_name":"Max","timestamp":"#));

    let logs = store.recent_logs(50).await?;
    assert_eq!(
        logs.iter()
            .map(|log| return (log.speaker, log.text.as_str()))
            .collect::<Vec<(Speaker, &str)>>(),
        vec![(Speaker::Assistant, "Hi there"), (Speaker::User, "Hallo")]
    );
    assert!(logs.iter().all(|log| return log.timestamp.is_some()));

    return Ok(());
}

#[tokio::test]
async fn it_limits_and_skips_unreadable_logs() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = store(&dir);

    store
        .append_log(LogRecord::new(Speaker::User, "eins", "Max"))
        .await?;
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(dir.path().join("store/chat_logs.jsonl"))?;
    file.write_all(b"not json\n")?;
    store
        .append_log(LogRecord::new(Speaker::User, "zwei", "Max"))
        .await?;
    store
        .append_log(LogRecord::new(Speaker::User, "drei", "Max"))
        .await?;

    let logs = store.recent_logs(3).await?;
    assert_eq!(
        logs.iter()
            .map(|log| return log.text.as_str())
            .collect::<Vec<&str>>(),
        vec!["drei", "zwei", "eins"]
    );

    assert_eq!(store.recent_logs(1).await?.len(), 1);

    return Ok(());
}

#[tokio::test]
async fn it_returns_no_logs_before_anything_was_written() -> Result<()> {
    let dir = tempfile::tempdir()?;
    assert!(store(&dir).recent_logs(50).await?.is_empty());

    return Ok(());
}

#[tokio::test]
async fn it_stores_users_as_yaml() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = store(&dir);
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    assert_eq!(store.get_user("max_mustermann").await?, None);

    let record = UserRecord::new("max_mustermann", "Max Mustermann", now);
    store.put_user(&record).await?;

    let content = std::fs::read_to_string(dir.path().join("store/users/max_mustermann.yaml"))?;
    assert!(content.starts_with("identity: max_mustermann\ndisplay_name: Max Mustermann\n"));
    assert!(!content.contains("password"));
    assert_eq!(store.get_user("max_mustermann").await?, Some(record));

    return Ok(());
}

#[tokio::test]
async fn it_rejects_identities_that_are_not_file_names() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = store(&dir);

    assert!(store.get_user("../escape").await.is_err());
    assert!(store.get_user("").await.is_err());

    return Ok(());
}
