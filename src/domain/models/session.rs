use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::Turn;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum SessionState {
    #[default]
    Uninitialized,
    Ready,
    AwaitingResponse,
    Failed,
}

/// The turns appended by one successful submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Exchange {
    pub user: Turn,
    pub assistant: Turn,
}
