#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;

use anyhow::Result;
use async_trait::async_trait;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use uuid::Uuid;

use super::Primer;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum BackendName {
    Gemini,
}

impl BackendName {
    pub fn parse(text: String) -> Option<BackendName> {
        return BackendName::iter().find(|e| return e.to_string() == text);
    }
}

/// An open conversation with a completion backend. The context is private to
/// the backend that produced it and carries everything it needs to continue
/// the conversation on the next exchange.
#[derive(Debug, PartialEq, Eq)]
pub struct BackendHandle {
    pub id: String,
    pub context: String,
}

impl BackendHandle {
    pub fn new(context: String) -> BackendHandle {
        return BackendHandle {
            id: BackendHandle::create_id(),
            context,
        };
    }

    fn create_id() -> String {
        return Uuid::new_v4()
            .to_string()
            .split('-')
            .enumerate()
            .filter_map(|(idx, str)| {
                if idx > 1 {
                    return None;
                }
                return Some(str);
            })
            .collect::<Vec<&str>>()
            .join("-");
    }
}

#[async_trait]
pub trait Backend {
    fn name(&self) -> BackendName;

    /// Used at startup to verify all configurations are available to work with
    /// the backend.
    async fn health_check(&self) -> Result<()>;

    /// Opens a fresh conversation seeded with the primer. Fails when the
    /// credentials are missing or the service can't be reached.
    async fn open(&self, primer: &Primer) -> Result<BackendHandle>;

    /// Sends one user message within the conversation held by the handle and
    /// returns the complete reply. The handle's context is only extended when
    /// the exchange succeeds.
    async fn exchange(&self, handle: &mut BackendHandle, text: &str) -> Result<String>;
}

pub type BackendBox = Box<dyn Backend + Send + Sync>;
