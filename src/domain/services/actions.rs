#[cfg(test)]
#[path = "actions_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use super::SessionManager;
use super::TranscriptMirror;
use crate::domain::models::Action;
use crate::domain::models::Event;
use crate::domain::models::Message;
use crate::domain::models::Primer;
use crate::domain::models::SessionError;
use crate::domain::models::SlashCommand;
use crate::domain::models::Speaker;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /new (/n) - Ends the current conversation and starts a fresh one.
- /quit /exit (/q) - Exit Chatty.
- /help (/h) - Provides this help menu.

HOTKEYS:
- Up arrow - Scroll up
- Down arrow - Scroll down
- CTRL+U - Page up
- CTRL+D - Page down
- CTRL+C - Exit.

While a reply is pending the input box is disabled. If a message fails to send,
the error is shown in the chat and you can simply send it again.
        "#;

    return text.trim().to_string();
}

/// Everything a worker needs to run one exchange away from the action loop.
#[derive(Clone)]
struct Conversation {
    session: Arc<SessionManager>,
    mirror: Arc<TranscriptMirror>,
    display_name: String,
    tx: mpsc::UnboundedSender<Event>,
}

impl Conversation {
    fn emit(&self, speaker: Speaker, text: &str) -> Result<()> {
        self.tx
            .send(Event::SessionMessage(Message::new(speaker, text)))?;
        return Ok(());
    }

    async fn emit_state(&self) -> Result<()> {
        self.tx
            .send(Event::SessionStateChanged(self.session.state().await))?;
        return Ok(());
    }

    async fn record(&self, speaker: Speaker, text: &str) {
        self.mirror.record(speaker, text, &self.display_name).await;
    }

    async fn start(&self, primer: &Primer, primer_echo: bool) -> Result<()> {
        match self.session.start_session(primer).await {
            Ok(()) => {
                self.record(Speaker::System, "Session started").await;
                if primer_echo {
                    self.record(Speaker::Assistant, primer.acknowledgement())
                        .await;
                    self.emit(Speaker::Assistant, primer.acknowledgement())?;
                }
            }
            Err(err) => {
                let text = err.to_string();
                self.record(Speaker::System, &format!("Session failed to start: {text}"))
                    .await;
                self.emit(Speaker::Error, &text)?;
            }
        }

        return self.emit_state().await;
    }

    async fn end(&self) {
        self.session.end_session().await;
        self.record(Speaker::System, "Session ended").await;
    }

    async fn submit(&self, text: &str) -> Result<()> {
        match self.session.submit_user_text(text).await {
            Ok(exchange) => {
                self.record(Speaker::User, exchange.user.text()).await;
                self.record(Speaker::Assistant, exchange.assistant.text())
                    .await;
                self.tx
                    .send(Event::SessionMessage(Message::from_turn(&exchange.assistant)))?;
            }
            Err(SessionError::Exchange { user, detail }) => {
                self.record(Speaker::User, user.text()).await;
                self.record(Speaker::Error, &detail).await;
                self.emit(Speaker::Error, &detail)?;
            }
            Err(SessionError::EmptyInput) => {}
            Err(err) => {
                tracing::debug!(error = ?err, "submission rejected");
                self.emit(Speaker::Error, &err.to_string())?;
            }
        }

        return self.emit_state().await;
    }
}

/// Turns actions from the terminal into session operations and reports the
/// outcome back as events. Every turn and lifecycle milestone is mirrored.
pub struct ActionsService {
    conversation: Conversation,
    primer: Primer,
    primer_echo: bool,
}

impl ActionsService {
    pub fn new(
        session: Arc<SessionManager>,
        mirror: Arc<TranscriptMirror>,
        display_name: &str,
        primer: Primer,
        primer_echo: bool,
        tx: mpsc::UnboundedSender<Event>,
    ) -> ActionsService {
        return ActionsService {
            conversation: Conversation {
                session,
                mirror,
                display_name: display_name.to_string(),
                tx,
            },
            primer,
            primer_echo,
        };
    }

    pub async fn start(self, rx: &mut mpsc::UnboundedReceiver<Action>) -> Result<()> {
        let conversation = self.conversation;

        loop {
            let action = match rx.recv().await {
                Some(action) => action,
                None => return Ok(()),
            };

            match action {
                Action::StartSession() => {
                    conversation.start(&self.primer, self.primer_echo).await?;
                }
                Action::EndSession() => {
                    conversation.end().await;
                    conversation.emit_state().await?;
                }
                Action::RestartSession() => {
                    conversation.end().await;
                    conversation.start(&self.primer, self.primer_echo).await?;
                }
                Action::SubmitUserText(text) => {
                    if let Some(command) = SlashCommand::parse(&text) {
                        if command.is_help() {
                            conversation.emit(Speaker::System, &help_text())?;
                            conversation.emit_state().await?;
                            continue;
                        }
                    }

                    let worker = conversation.clone();
                    tokio::spawn(async move {
                        if let Err(err) = worker.submit(&text).await {
                            tracing::error!(error = ?err, "failed to report exchange");
                        }
                    });
                }
            }
        }
    }
}
