use anyhow::Result;

use super::Config;
use super::ConfigKey;
use crate::application::cli;

#[test]
fn it_serializes_to_valid_toml() -> Result<()> {
    let res = Config::serialize_default(cli::build());
    let doc = res.parse::<toml_edit::Document>()?;

    assert_eq!(doc["backend"].as_str(), Some("gemini"));
    assert_eq!(doc["store"].as_str(), Some("memory"));
    assert_eq!(doc["backend-health-check-timeout"].as_integer(), Some(1000));
    assert_eq!(doc["primer-echo"].as_bool(), Some(true));
    assert_eq!(doc["log-collection"].as_str(), Some("chat_logs"));
    assert!(doc.get("gemini-token").is_none());
    assert!(doc.get("config-file").is_none());
    assert!(res.contains("# username = \"\""));

    return Ok(());
}

#[test]
fn it_serializes_primer_text() -> Result<()> {
    let res = Config::serialize_default(cli::build());
    let doc = res.parse::<toml_edit::Document>()?;
    let instruction = doc["primer-instruction"].as_str().unwrap_or_default();

    assert!(instruction.starts_with("Hallo Chatty!"));

    return Ok(());
}

#[test]
fn it_defaults_to_the_chatty_primer() -> Result<()> {
    assert!(Config::default(ConfigKey::PrimerInstruction).starts_with("Hallo Chatty!"));
    assert!(Config::default(ConfigKey::PrimerReply).starts_with("Hallo! Ich bin Chatty"));

    return Ok(());
}

#[tokio::test]
async fn it_loads_config_from_file() -> Result<()> {
    let matches = cli::build().try_get_matches_from(vec!["chatty", "-c", "./config.example.toml"])?;
    Config::load(cli::build(), vec![&matches]).await?;
    return Ok(());
}

#[tokio::test]
async fn it_fails_to_loads_config_from_file() -> Result<()> {
    let matches =
        cli::build().try_get_matches_from(vec!["chatty", "-c", "./test/bad-config.toml"])?;
    let res = Config::load(cli::build(), vec![&matches]).await;
    assert!(res.is_err());
    return Ok(());
}
