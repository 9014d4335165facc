#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgMatches;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;
use dialoguer::Password;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendName;
use crate::domain::models::LogRecord;
use crate::domain::models::StoreName;
use crate::domain::services::actions::help_text;
use crate::domain::services::Accounts;
use crate::domain::services::TranscriptMirror;
use crate::domain::services::DEFAULT_RECENT_LIMIT;

/// What the process should do once the command line has been parsed and the
/// configuration loaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Launch {
    Chat,
    Register,
    Login,
    Logs(usize),
}

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

pub fn format_log(log: &LogRecord) -> String {
    let timestamp = match log.timestamp {
        Some(timestamp) => timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "N/A".to_string(),
    };

    return format!(
        "[{timestamp}] {}/{}: {}",
        log.display_name, log.speaker, log.text
    );
}

pub async fn print_logs(mirror: &TranscriptMirror, limit: usize) -> Result<()> {
    let mut logs = mirror.recent(limit).await?;
    if logs.is_empty() {
        println!("There are no logs yet. Start chatting first!");
        return Ok(());
    }

    // Oldest first reads like a conversation.
    logs.reverse();
    let lines = logs.iter().map(format_log).collect::<Vec<String>>();
    println!("{}", lines.join("\n"));

    return Ok(());
}

fn prompt_username() -> Result<String> {
    let username: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Username")
        .default(Config::get(ConfigKey::Username))
        .interact_text()?;

    return Ok(username);
}

/// Prompts for a new account and makes it the active user.
pub async fn register(accounts: &Accounts) -> Result<()> {
    let username = prompt_username()?;
    let password = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Password")
        .with_confirmation("Repeat password", "The passwords don't match.")
        .interact()?;

    let record = accounts.register(&username, &password).await?;
    Config::set(ConfigKey::Username, &record.display_name);
    println!("Registered {}", Paint::green(&record.display_name));

    return Ok(());
}

/// Prompts for credentials and makes the verified account the active user.
pub async fn login(accounts: &Accounts) -> Result<()> {
    let username = prompt_username()?;
    let password = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Password")
        .interact()?;

    let record = accounts.verify(&username, &password).await?;
    Config::set(ConfigKey::Username, &record.display_name);

    return Ok(());
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_debug() -> Command {
    let mut cmd = Command::new("debug");
    cmd = cmd.about("Debug helpers for Chatty")
        .hide(true)
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when running Chatty with environment variable RUST_LOG=chatty")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        );

    return cmd;
}

fn subcommand_logs() -> Command {
    return Command::new("logs")
        .about("Prints the most recent mirrored chat logs, oldest first.")
        .arg(
            Arg::new("limit")
                .short('l')
                .long("limit")
                .help(format!(
                    "How many log records to print. [default: {DEFAULT_RECENT_LIMIT}]"
                ))
                .num_args(1)
                .value_parser(value_parser!(usize)),
        );
}

fn env_name(key: ConfigKey) -> String {
    return format!("CHATTY_{}", key.to_string().to_uppercase().replace('-', "_"));
}

fn arg_config(key: ConfigKey, help: &str) -> Arg {
    return Arg::new(key.to_string())
        .long(key.to_string())
        .env(env_name(key))
        .num_args(1)
        .help(help.to_string())
        .global(true);
}

fn with_default(key: ConfigKey, help: &str) -> String {
    return format!("{help} [default: {}]", Config::default(key));
}

fn arg_backend() -> Arg {
    return arg_config(
        ConfigKey::Backend,
        &with_default(ConfigKey::Backend, "The completion backend to chat with."),
    )
    .short('b')
    .value_parser(PossibleValuesParser::new(BackendName::VARIANTS));
}

fn arg_model() -> Arg {
    return arg_config(
        ConfigKey::Model,
        &with_default(ConfigKey::Model, "The model on the backend to chat with."),
    )
    .short('m');
}

fn arg_store() -> Arg {
    return arg_config(
        ConfigKey::Store,
        &with_default(
            ConfigKey::Store,
            "Where chat logs and users are mirrored to.",
        ),
    )
    .short('s')
    .value_parser(PossibleValuesParser::new(StoreName::VARIANTS));
}

fn arg_username() -> Arg {
    return arg_config(
        ConfigKey::Username,
        "Your user name, shown in the chat and attached to mirrored transcripts. [default: $USER]",
    )
    .short('u');
}

fn arg_primer_echo() -> Arg {
    return arg_config(
        ConfigKey::PrimerEcho,
        &with_default(
            ConfigKey::PrimerEcho,
            "Show the primer's reply as the opening line of every conversation.",
        ),
    )
    .value_parser(PossibleValuesParser::new(["true", "false"]));
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") || line.starts_with("HOTKEYS:") {
                return Paint::new(format!("CHAT {line}"))
                    .underline()
                    .bold()
                    .to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}\nCommit: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    );

    return Command::new("chatty")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(Command::new("chat").about("Start a new chat session."))
        .subcommand(Command::new("register").about("Create a password protected account, then start chatting."))
        .subcommand(Command::new("login").about("Log in to an account, then start chatting."))
        .subcommand(subcommand_logs())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_debug())
        .arg(arg_backend())
        .arg(arg_model())
        .arg(arg_store())
        .arg(arg_username())
        .arg(arg_primer_echo())
        .arg(
            arg_config(
                ConfigKey::ConfigFile,
                &with_default(ConfigKey::ConfigFile, "Path to configuration file"),
            )
            .short('c'),
        )
        .arg(arg_config(
            ConfigKey::AssistantName,
            &with_default(ConfigKey::AssistantName, "Name the assistant is shown with."),
        ))
        .arg(arg_config(
            ConfigKey::BackendHealthCheckTimeout,
            &with_default(
                ConfigKey::BackendHealthCheckTimeout,
                "Time to wait in milliseconds before timing out when doing a healthcheck for a backend or store.",
            ),
        ))
        .arg(arg_config(
            ConfigKey::GeminiURL,
            &with_default(ConfigKey::GeminiURL, "Gemini API URL when using the Gemini backend."),
        ))
        .arg(arg_config(
            ConfigKey::GeminiToken,
            "Google Gemini API key when using the Gemini backend. Falls back to GOOGLE_API_KEY.",
        ))
        .arg(arg_config(
            ConfigKey::PrimerInstruction,
            "The instruction sent to the assistant ahead of every conversation.",
        ))
        .arg(arg_config(
            ConfigKey::PrimerReply,
            "The assistant's acknowledgement of the primer instruction.",
        ))
        .arg(arg_config(
            ConfigKey::StoreDir,
            &with_default(ConfigKey::StoreDir, "Directory used by the file store."),
        ))
        .arg(arg_config(
            ConfigKey::LogCollection,
            &with_default(ConfigKey::LogCollection, "Collection chat logs are mirrored to."),
        ))
        .arg(arg_config(
            ConfigKey::UsersCollection,
            &with_default(ConfigKey::UsersCollection, "Collection user records are kept in."),
        ))
        .arg(arg_config(
            ConfigKey::FirestoreURL,
            &with_default(ConfigKey::FirestoreURL, "Firestore API URL when using the firestore store."),
        ))
        .arg(arg_config(
            ConfigKey::FirestoreProject,
            "Google Cloud project id when using the firestore store.",
        ))
        .arg(arg_config(
            ConfigKey::FirestoreToken,
            "OAuth access token when using the firestore store, such as the output of `gcloud auth print-access-token`.",
        ));
}

fn limit_from(matches: &ArgMatches) -> usize {
    return matches
        .get_one::<usize>("limit")
        .copied()
        .unwrap_or(DEFAULT_RECENT_LIMIT);
}

pub async fn parse() -> Result<Option<Launch>> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("log-path", _)) => {
                    let log_path = Config::cache_dir().join("debug.log");
                    println!("{}", log_path.to_string_lossy());
                }
                Some(("enum-config", _)) => {
                    let res = ConfigKey::VARIANTS.join("\n");
                    println!("{}", res);
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }

            return Ok(None);
        }
        Some(("chat", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
        }
        Some(("register", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            return Ok(Some(Launch::Register));
        }
        Some(("login", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            return Ok(Some(Launch::Login));
        }
        Some(("logs", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            return Ok(Some(Launch::Logs(limit_from(subcmd_matches))));
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
            return Ok(None);
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(None);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(None);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(None);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(None);
            }
        },
        _ => {
            Config::load(build(), vec![&matches]).await?;
        }
    }

    return Ok(Some(Launch::Chat));
}
