#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::process;
use std::sync::Arc;

use anyhow::bail;
use anyhow::Error;
use anyhow::Result;
use domain::models::Action;
use domain::models::BackendName;
use domain::models::Event;
use domain::models::Speaker;
use domain::models::StoreName;
use infrastructure::backends::BackendManager;
use infrastructure::stores::StoreManager;
use tokio::sync::mpsc;
use tokio::task;
use yansi::Paint;

use crate::application::cli;
use crate::application::cli::Launch;
use crate::application::ui;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::services::actions::ActionsService;
use crate::domain::services::Accounts;
use crate::domain::services::SessionManager;
use crate::domain::services::TranscriptMirror;

fn handle_error(err: Error) {
    eprintln!(
        "{}",
        Paint::red(format!(
            "Oh no! Chatty has failed with the following app version and error.\n\nVersion: {}\nCommit: {}\nError: {:#}",
            env!("CARGO_PKG_VERSION"),
            env!("VERGEN_GIT_DESCRIBE"),
            err
        ))
    );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!("\nRunning the following can help explain further what the issue is:");
        eprintln!("\nRUST_BACKTRACE=1 {args}");
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

async fn build_mirror() -> Result<Arc<TranscriptMirror>> {
    let store_name = match StoreName::parse(Config::get(ConfigKey::Store)) {
        Some(name) => name,
        None => bail!("Unknown store '{}'", Config::get(ConfigKey::Store)),
    };
    let store = StoreManager::get(store_name)?;
    if let Err(err) = store.health_check().await {
        // Mirroring is best effort, the chat works without it.
        tracing::warn!(store = %store_name, error = ?err, "transcript store failed its health check");
    }

    return Ok(Arc::new(TranscriptMirror::new(store)));
}

async fn run(launch: Launch) -> Result<()> {
    let mirror = build_mirror().await?;

    match launch {
        Launch::Logs(limit) => {
            return cli::print_logs(&mirror, limit).await;
        }
        Launch::Register => {
            cli::register(&Accounts::new(mirror.clone())).await?;
        }
        Launch::Login => {
            cli::login(&Accounts::new(mirror.clone())).await?;
        }
        Launch::Chat => {
            if let Err(err) = mirror.upsert_user(&Config::get(ConfigKey::Username)).await {
                tracing::warn!(error = ?err, "failed to upsert user");
            }
        }
    }

    let username = Config::get(ConfigKey::Username);
    mirror
        .record(Speaker::System, "Application started", &username)
        .await;

    Config::validate_credentials()?;
    let primer = Config::primer()?;
    let backend_name = match BackendName::parse(Config::get(ConfigKey::Backend)) {
        Some(name) => name,
        None => bail!("Unknown backend '{}'", Config::get(ConfigKey::Backend)),
    };
    let session = Arc::new(SessionManager::new(BackendManager::get(backend_name)?));

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

    let actions_service = ActionsService::new(
        session,
        mirror.clone(),
        &username,
        primer,
        Config::primer_echo(),
        event_tx,
    );

    let mut background_futures = task::JoinSet::new();
    background_futures.spawn(async move {
        return actions_service.start(&mut action_rx).await;
    });

    let ui_future = ui::start(action_tx, event_rx);

    let res = tokio::select!(
        res = background_futures.join_next() => match res {
            Some(Ok(res)) => res,
            Some(Err(err)) => Err(err.into()),
            None => Ok(()),
        },
        res = ui_future => res,
    );

    if res.is_ok() {
        // Let the controller record the end of the session.
        while background_futures.join_next().await.is_some() {}
    }

    mirror
        .record(Speaker::System, "Application closed", &username)
        .await;

    return res;
}

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        ui::destruct_terminal_for_panic();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let debug_log_dir = env::var("CHATTY_LOG_DIR").unwrap_or_else(|_| {
        return Config::cache_dir().to_string_lossy().to_string();
    });

    let file_appender = tracing_appender::rolling::never(debug_log_dir, "debug.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    if env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("chatty")
    {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(writer)
            .init();
    }

    let launch = match cli::parse().await {
        Ok(Some(launch)) => launch,
        Ok(None) => process::exit(0),
        Err(err) => {
            handle_error(err);
            return;
        }
    };

    if let Err(err) = run(launch).await {
        ui::destruct_terminal_for_panic();
        handle_error(err);
    }

    process::exit(0);
}
