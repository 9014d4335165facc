#[cfg(test)]
#[path = "session_manager_test.rs"]
mod tests;

use tokio::sync::Mutex;

use crate::domain::models::BackendBox;
use crate::domain::models::BackendHandle;
use crate::domain::models::Exchange;
use crate::domain::models::Primer;
use crate::domain::models::SessionError;
use crate::domain::models::SessionState;
use crate::domain::models::Speaker;
use crate::domain::models::Turn;

struct Session {
    state: SessionState,
    transcript: Vec<Turn>,
    handle: Option<BackendHandle>,
    next_sequence: u64,
    // Bumped whenever the session is reset, so replies that arrive for an
    // earlier session can be recognised and dropped.
    epoch: u64,
}

impl Session {
    fn reset(&mut self, state: SessionState) {
        self.handle = None;
        self.transcript.clear();
        self.next_sequence = 1;
        self.epoch += 1;
        self.state = state;
    }

    fn append(&mut self, speaker: Speaker, text: &str) -> Turn {
        let turn = Turn::new(speaker, text, self.next_sequence);
        self.next_sequence += 1;
        self.transcript.push(turn.clone());

        return turn;
    }
}

/// Owns one conversation and serializes every exchange with the completion
/// backend through it.
///
/// The session lock is never held while the backend is working. Instead the
/// state moves to `AwaitingResponse` and the handle is moved out for the
/// duration of the call, so a second caller is turned away with
/// [`SessionError::Busy`] rather than queued.
pub struct SessionManager {
    backend: BackendBox,
    session: Mutex<Session>,
}

impl SessionManager {
    pub fn new(backend: BackendBox) -> SessionManager {
        return SessionManager {
            backend,
            session: Mutex::new(Session {
                state: SessionState::Uninitialized,
                transcript: vec![],
                handle: None,
                next_sequence: 1,
                epoch: 0,
            }),
        };
    }

    pub async fn state(&self) -> SessionState {
        return self.session.lock().await.state;
    }

    pub async fn transcript(&self) -> Vec<Turn> {
        return self.session.lock().await.transcript.clone();
    }

    pub async fn handle_id(&self) -> Option<String> {
        return self
            .session
            .lock()
            .await
            .handle
            .as_ref()
            .map(|handle| return handle.id.to_string());
    }

    /// Opens a fresh conversation seeded with the primer. Any previous
    /// conversation is released first, whatever state it was in.
    pub async fn start_session(&self, primer: &Primer) -> Result<(), SessionError> {
        let epoch = {
            let mut session = self.session.lock().await;
            session.reset(SessionState::Uninitialized);
            session.epoch
        };

        let res = self.backend.open(primer).await;

        let mut session = self.session.lock().await;
        if session.epoch != epoch {
            tracing::debug!(epoch, "session was reset while opening, dropping handle");
            return Err(SessionError::NotReady);
        }

        match res {
            Ok(handle) => {
                tracing::debug!(
                    backend = %self.backend.name(),
                    handle = %handle.id,
                    "session started"
                );
                session.handle = Some(handle);
                session.state = SessionState::Ready;

                return Ok(());
            }
            Err(err) => {
                tracing::error!(
                    backend = %self.backend.name(),
                    error = ?err,
                    "failed to open backend session"
                );
                session.state = SessionState::Failed;

                return Err(SessionError::BackendUnavailable(format!("{err:#}")));
            }
        }
    }

    /// Sends the trimmed text to the backend and appends the resulting turns.
    ///
    /// A failed exchange keeps the user turn, appends nothing else and leaves
    /// the session `Ready` so the user can try again.
    pub async fn submit_user_text(&self, text: &str) -> Result<Exchange, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyInput);
        }

        let (mut handle, epoch, user) = {
            let mut session = self.session.lock().await;
            match session.state {
                SessionState::Ready => {}
                SessionState::AwaitingResponse => return Err(SessionError::Busy),
                SessionState::Uninitialized | SessionState::Failed => {
                    return Err(SessionError::NotReady);
                }
            }

            let handle = match session.handle.take() {
                Some(handle) => handle,
                None => {
                    session.reset(SessionState::Uninitialized);
                    return Err(SessionError::NotReady);
                }
            };

            let user = session.append(Speaker::User, text);
            session.state = SessionState::AwaitingResponse;
            tracing::debug!(handle = %handle.id, sequence = user.sequence(), "awaiting response");

            (handle, session.epoch, user)
        };

        let res = self.backend.exchange(&mut handle, text).await;

        let mut session = self.session.lock().await;
        if session.epoch != epoch {
            tracing::debug!(handle = %handle.id, "session ended while awaiting response");
            return Err(SessionError::NotReady);
        }

        session.handle = Some(handle);
        session.state = SessionState::Ready;

        let reply = match res {
            Ok(reply) => reply,
            Err(err) => {
                tracing::error!(error = ?err, "exchange failed");
                return Err(SessionError::Exchange {
                    user,
                    detail: format!("{err:#}"),
                });
            }
        };

        let reply = reply.trim();
        if reply.is_empty() {
            tracing::error!("exchange returned an empty response");
            return Err(SessionError::Exchange {
                user,
                detail: "The backend returned an empty response.".to_string(),
            });
        }

        let assistant = session.append(Speaker::Assistant, reply);

        return Ok(Exchange { user, assistant });
    }

    /// Releases the backend handle and clears the transcript. Calling it on a
    /// session that was never started, or already ended, does nothing harmful.
    pub async fn end_session(&self) {
        let mut session = self.session.lock().await;
        if session.handle.is_some() || session.state != SessionState::Uninitialized {
            tracing::debug!(state = %session.state, "session ended");
        }
        session.reset(SessionState::Uninitialized);
    }
}
