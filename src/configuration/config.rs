#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::env;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::ArgMatches;
use clap::Command;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::fs;

use crate::domain::models::BackendName;
use crate::domain::models::Primer;
use crate::domain::models::StoreName;
use crate::domain::models::DEFAULT_INSTRUCTION;
use crate::domain::models::DEFAULT_REPLY;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    AssistantName,
    Backend,
    BackendHealthCheckTimeout,
    ConfigFile,
    FirestoreProject,
    FirestoreToken,
    FirestoreURL,
    GeminiToken,
    GeminiURL,
    LogCollection,
    Model,
    PrimerEcho,
    PrimerInstruction,
    PrimerReply,
    Store,
    StoreDir,
    Username,
    UsersCollection,
}

pub struct Config {}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    pub fn cache_dir() -> path::PathBuf {
        return dirs::cache_dir()
            .unwrap_or_else(env::temp_dir)
            .join("chatty");
    }

    pub fn default(key: ConfigKey) -> String {
        if key == ConfigKey::Username {
            let mut user = env::var("USER").unwrap_or_else(|_| return "".to_string());
            if user.is_empty() {
                user = "User".to_string();
            }

            return user;
        }

        if key == ConfigKey::GeminiToken {
            return env::var("GOOGLE_API_KEY").unwrap_or_else(|_| return "".to_string());
        }

        let default_backend = BackendName::Gemini.to_string();
        let default_store = StoreName::Memory.to_string();
        let store_dir = Config::cache_dir().join("store");

        #[cfg(not(target_os = "macos"))]
        let config_path = dirs::config_dir()
            .unwrap_or_else(env::temp_dir)
            .join("chatty/config.toml");
        #[cfg(target_os = "macos")]
        let config_path = path::PathBuf::from(env::var("HOME").unwrap_or_default())
            .join(".config/chatty/config.toml");

        let res = match key {
            ConfigKey::AssistantName => "Chatty",
            ConfigKey::Backend => &default_backend,
            ConfigKey::BackendHealthCheckTimeout => "1000",
            ConfigKey::FirestoreProject => "",
            ConfigKey::FirestoreToken => "",
            ConfigKey::FirestoreURL => "https://firestore.googleapis.com",
            ConfigKey::GeminiURL => "https://generativelanguage.googleapis.com",
            ConfigKey::LogCollection => "chat_logs",
            ConfigKey::Model => "models/gemini-1.5-pro-latest",
            ConfigKey::PrimerEcho => "true",
            ConfigKey::PrimerInstruction => DEFAULT_INSTRUCTION,
            ConfigKey::PrimerReply => DEFAULT_REPLY,
            ConfigKey::Store => &default_store,
            ConfigKey::StoreDir => store_dir.to_str().unwrap_or_default(),
            ConfigKey::UsersCollection => "users",

            // Special
            ConfigKey::ConfigFile => config_path.to_str().unwrap_or_default(),
            ConfigKey::GeminiToken => "",
            ConfigKey::Username => "",
        };

        return res.to_string();
    }

    /// The primer assembled from the configured instruction and reply.
    pub fn primer() -> Result<Primer> {
        let primer = Primer::new(
            &Config::get(ConfigKey::PrimerInstruction),
            &Config::get(ConfigKey::PrimerReply),
        )?;

        return Ok(primer);
    }

    pub fn primer_echo() -> bool {
        return Config::get(ConfigKey::PrimerEcho) == "true";
    }

    pub async fn load(cmd: Command, clap_arg_matches: Vec<&ArgMatches>) -> Result<()> {
        for key in ConfigKey::iter() {
            Config::set(key, &Config::default(key))
        }

        let mut config_file = Config::default(ConfigKey::ConfigFile);
        for matches in clap_arg_matches.as_slice() {
            if let Ok(Some(arg_config_file)) =
                matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config_file = arg_config_file.to_string();
            }
        }

        let config_path = path::PathBuf::from(config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(config_path).await?;
            let doc = toml_str.parse::<toml_edit::Document>()?;

            for key in ConfigKey::iter() {
                if let Some(val) = doc.get(&key.to_string()) {
                    // Use clap value parsers to do validation.
                    let mut possible_values = vec![];
                    if let Some(arg) = cmd
                        .get_arguments()
                        .find(|e| return e.get_long() == Some(key.to_string().as_str()))
                    {
                        if !arg.get_possible_values().is_empty() {
                            possible_values = arg
                                .get_possible_values()
                                .iter()
                                .map(|e| return e.get_name().to_string())
                                .collect::<Vec<String>>();
                        }
                    }

                    if let Some(val_int) = val.as_integer() {
                        Config::set(key, &val_int.to_string());
                    } else if let Some(val_bool) = val.as_bool() {
                        Config::set(key, &val_bool.to_string());
                    } else if let Some(val_str) = val.as_str() {
                        if val_str.is_empty() {
                            continue;
                        }
                        if !possible_values.is_empty()
                            && !possible_values.contains(&val_str.to_string())
                        {
                            bail!(format!("config.toml has an invalid value for key '{key}': {val_str}\nPossible values are: {}", possible_values.join(", ")));
                        }
                        Config::set(key, val_str);
                    }
                }
            }
        }

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    Config::set(key, val)
                }
            }
        }

        tracing::debug!(
            username = Config::get(ConfigKey::Username),
            backend = Config::get(ConfigKey::Backend),
            model = Config::get(ConfigKey::Model),
            store = Config::get(ConfigKey::Store),
            primer_echo = Config::get(ConfigKey::PrimerEcho),
            "config"
        );

        return Ok(());
    }

    /// Fails when a credential the selected backend or store can't work
    /// without is missing. Runs before any session is created.
    pub fn validate_credentials() -> Result<()> {
        if Config::get(ConfigKey::Backend) == BackendName::Gemini.to_string()
            && Config::get(ConfigKey::GeminiToken).is_empty()
        {
            bail!("No Gemini API key found. Set `gemini-token` in the config file, or export CHATTY_GEMINI_TOKEN or GOOGLE_API_KEY.");
        }

        if Config::get(ConfigKey::Store) == StoreName::Firestore.to_string() {
            if Config::get(ConfigKey::FirestoreProject).is_empty() {
                bail!("The firestore store requires `firestore-project` to be set.");
            }
            if Config::get(ConfigKey::FirestoreToken).is_empty() {
                bail!("The firestore store requires an access token in `firestore-token`.");
            }
        }

        return Ok(());
    }

    pub fn serialize_default(cmd: Command) -> String {
        let toml_str = ConfigKey::iter()
            .filter_map(|key| {
                if key == ConfigKey::ConfigFile {
                    return None;
                }

                if key == ConfigKey::Username {
                    return Some(
                        "# Your user name, shown in the chat and attached to mirrored transcripts.\n# username = \"\""
                            .to_string(),
                    );
                }

                let arg = cmd
                    .get_arguments()
                    .find(|e| return e.get_long() == Some(key.to_string().as_str()))?;

                let mut description = arg
                    .get_help()
                    .map(|help| return help.to_string())
                    .unwrap_or_default();

                description = description
                    .split("[default:")
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();

                if !arg.get_possible_values().is_empty() {
                    let possible_values = arg
                        .get_possible_values()
                        .iter()
                        .map(|e| return e.get_name())
                        .collect::<Vec<_>>()
                        .join(", ");
                    description = format!("{description} [possible values: {}]", possible_values);
                }

                let mut val = Config::default(key);
                if key == ConfigKey::GeminiToken {
                    val = "".to_string();
                }

                if val.is_empty() {
                    val = format!("# {key} = \"\"");
                } else if val.parse::<i32>().is_ok() || val == "true" || val == "false" {
                    val = format!("{key} = {val}");
                } else {
                    val = format!("{key} = {}", toml_edit::Value::from(val));
                }

                return Some(format!("# {description}\n{val}"));
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }
}
