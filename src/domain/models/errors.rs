#[cfg(test)]
#[path = "errors_test.rs"]
mod tests;

use thiserror::Error;

use super::Turn;

/// Failures returned by the session manager. None of these escape as a panic;
/// every operation hands one back as a value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("The completion backend is unavailable: {0}")]
    BackendUnavailable(String),

    #[error("A response is still pending, wait for it before sending again")]
    Busy,

    #[error("There is no active conversation, start one first")]
    NotReady,

    #[error("Nothing to send")]
    EmptyInput,

    #[error("Invalid primer: {0}")]
    InvalidPrimer(String),

    #[error("{detail}")]
    Exchange { user: Turn, detail: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MirrorError {
    #[error("'{0}' does not produce a usable identity")]
    InvalidIdentity(String),

    #[error("Transcript store failed: {0}")]
    Store(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("Username and password are required")]
    EmptyCredentials,

    #[error("'{0}' is not a valid username")]
    InvalidIdentity(String),

    #[error("The username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("No user named '{0}' exists")]
    UnknownUser(String),

    #[error("Wrong password")]
    WrongPassword,

    #[error("The account '{0}' has no stored password")]
    MissingCredential(String),

    #[error("Transcript store failed: {0}")]
    Store(String),
}
