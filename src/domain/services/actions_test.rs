use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use super::help_text;
use super::ActionsService;
use crate::domain::models::Action;
use crate::domain::models::Backend;
use crate::domain::models::BackendHandle;
use crate::domain::models::BackendName;
use crate::domain::models::Event;
use crate::domain::models::Message;
use crate::domain::models::Primer;
use crate::domain::models::SessionState;
use crate::domain::models::Speaker;
use crate::domain::services::SessionManager;
use crate::domain::services::TranscriptMirror;
use crate::infrastructure::stores::memory::Memory;

struct EchoBackend {
    reachable: bool,
}

#[async_trait]
impl Backend for EchoBackend {
    fn name(&self) -> BackendName {
        return BackendName::Gemini;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if !self.reachable {
            bail!("Gemini is not reachable");
        }
        Ok(())
    }

    #[allow(clippy::implicit_return)]
    async fn open(&self, _primer: &Primer) -> Result<BackendHandle> {
        self.health_check().await?;
        Ok(BackendHandle::new("".to_string()))
    }

    #[allow(clippy::implicit_return)]
    async fn exchange(&self, _handle: &mut BackendHandle, text: &str) -> Result<String> {
        if text == "fail" {
            bail!("connection refused");
        }
        Ok(format!("echo: {text}"))
    }
}

struct Harness {
    actions: mpsc::UnboundedSender<Action>,
    events: mpsc::UnboundedReceiver<Event>,
    mirror: Arc<TranscriptMirror>,
}

impl Harness {
    fn new(reachable: bool, primer_echo: bool) -> Harness {
        let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
        let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();
        let mirror = Arc::new(TranscriptMirror::new(Box::<Memory>::default()));

        let service = ActionsService::new(
            Arc::new(SessionManager::new(Box::new(EchoBackend { reachable }))),
            mirror.clone(),
            "Max",
            Primer::new("Nur Smalltalk bitte.", "Gerne, worüber reden wir?").unwrap(),
            primer_echo,
            event_tx,
        );
        tokio::spawn(async move {
            return service.start(&mut action_rx).await;
        });

        return Harness {
            actions: action_tx,
            events: event_rx,
            mirror,
        };
    }

    async fn message(&mut self) -> Message {
        match self.events.recv().await {
            Some(Event::SessionMessage(message)) => return message,
            _ => panic!("expected a session message"),
        }
    }

    async fn state(&mut self) -> SessionState {
        match self.events.recv().await {
            Some(Event::SessionStateChanged(state)) => return state,
            _ => panic!("expected a session state change"),
        }
    }

    async fn logs(&self) -> Vec<(Speaker, String)> {
        let mut logs = self
            .mirror
            .recent(50)
            .await
            .unwrap()
            .iter()
            .map(|log| return (log.speaker, log.text.to_string()))
            .collect::<Vec<(Speaker, String)>>();
        logs.reverse();

        return logs;
    }
}

#[tokio::test]
async fn it_starts_with_the_primer_echo() -> Result<()> {
    let mut harness = Harness::new(true, true);
    harness.actions.send(Action::StartSession())?;

    assert_eq!(
        harness.message().await,
        Message::new(Speaker::Assistant, "Gerne, worüber reden wir?")
    );
    assert_eq!(harness.state().await, SessionState::Ready);
    assert_eq!(
        harness.logs().await,
        vec![
            (Speaker::System, "Session started".to_string()),
            (Speaker::Assistant, "Gerne, worüber reden wir?".to_string()),
        ]
    );

    return Ok(());
}

#[tokio::test]
async fn it_starts_without_the_primer_echo() -> Result<()> {
    let mut harness = Harness::new(true, false);
    harness.actions.send(Action::StartSession())?;

    assert_eq!(harness.state().await, SessionState::Ready);
    assert_eq!(
        harness.logs().await,
        vec![(Speaker::System, "Session started".to_string())]
    );

    return Ok(());
}

#[tokio::test]
async fn it_reports_sessions_that_fail_to_start() -> Result<()> {
    let mut harness = Harness::new(false, true);
    harness.actions.send(Action::StartSession())?;

    let message = harness.message().await;
    assert_eq!(message.speaker, Speaker::Error);
    assert_eq!(
        message.text,
        "The completion backend is unavailable: Gemini is not reachable"
    );
    assert_eq!(harness.state().await, SessionState::Failed);

    harness
        .actions
        .send(Action::SubmitUserText("Hallo".to_string()))?;
    let message = harness.message().await;
    assert_eq!(message.speaker, Speaker::Error);
    assert_eq!(
        message.text,
        "There is no active conversation, start one first"
    );
    assert_eq!(harness.state().await, SessionState::Failed);

    return Ok(());
}

#[tokio::test]
async fn it_exchanges_and_mirrors_messages() -> Result<()> {
    let mut harness = Harness::new(true, false);
    harness.actions.send(Action::StartSession())?;
    assert_eq!(harness.state().await, SessionState::Ready);

    harness
        .actions
        .send(Action::SubmitUserText("Hallo".to_string()))?;

    assert_eq!(
        harness.message().await,
        Message::new(Speaker::Assistant, "echo: Hallo")
    );
    assert_eq!(harness.state().await, SessionState::Ready);
    assert_eq!(
        harness.logs().await,
        vec![
            (Speaker::System, "Session started".to_string()),
            (Speaker::User, "Hallo".to_string()),
            (Speaker::Assistant, "echo: Hallo".to_string()),
        ]
    );

    return Ok(());
}

#[tokio::test]
async fn it_renders_failed_exchanges_as_errors() -> Result<()> {
    let mut harness = Harness::new(true, false);
    harness.actions.send(Action::StartSession())?;
    assert_eq!(harness.state().await, SessionState::Ready);

    harness
        .actions
        .send(Action::SubmitUserText("fail".to_string()))?;

    assert_eq!(
        harness.message().await,
        Message::new(Speaker::Error, "connection refused")
    );
    assert_eq!(harness.state().await, SessionState::Ready);
    assert_eq!(
        harness.logs().await,
        vec![
            (Speaker::System, "Session started".to_string()),
            (Speaker::User, "fail".to_string()),
            (Speaker::Error, "connection refused".to_string()),
        ]
    );

    return Ok(());
}

#[tokio::test]
async fn it_ignores_empty_submissions() -> Result<()> {
    let mut harness = Harness::new(true, false);
    harness.actions.send(Action::StartSession())?;
    assert_eq!(harness.state().await, SessionState::Ready);

    harness
        .actions
        .send(Action::SubmitUserText("   ".to_string()))?;

    assert_eq!(harness.state().await, SessionState::Ready);
    assert_eq!(harness.logs().await.len(), 1);

    return Ok(());
}

#[tokio::test]
async fn it_shows_help() -> Result<()> {
    let mut harness = Harness::new(true, false);
    harness
        .actions
        .send(Action::SubmitUserText("/help".to_string()))?;

    assert_eq!(
        harness.message().await,
        Message::new(Speaker::System, &help_text())
    );
    assert_eq!(harness.state().await, SessionState::Uninitialized);

    return Ok(());
}

#[tokio::test]
async fn it_restarts_sessions() -> Result<()> {
    let mut harness = Harness::new(true, false);
    harness.actions.send(Action::StartSession())?;
    assert_eq!(harness.state().await, SessionState::Ready);

    harness.actions.send(Action::RestartSession())?;
    assert_eq!(harness.state().await, SessionState::Ready);

    harness.actions.send(Action::EndSession())?;
    assert_eq!(harness.state().await, SessionState::Uninitialized);

    assert_eq!(
        harness.logs().await,
        vec![
            (Speaker::System, "Session started".to_string()),
            (Speaker::System, "Session ended".to_string()),
            (Speaker::System, "Session started".to_string()),
            (Speaker::System, "Session ended".to_string()),
        ]
    );

    return Ok(());
}
