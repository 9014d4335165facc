#[cfg(test)]
#[path = "turn_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumVariantNames,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
    System,
    Error,
}

impl Speaker {
    /// Parses a stored speaker label, ignoring case. Besides our own labels it
    /// accepts the ones the desktop app wrote (`Du`, `Chatty`, `Bot`, `Fehler`)
    /// so shared collections stay readable.
    pub fn parse(text: &str) -> Option<Speaker> {
        let label = text.trim().to_lowercase();
        if let Some(speaker) = Speaker::iter().find(|e| return e.to_string() == label) {
            return Some(speaker);
        }

        let speaker = match label.as_str() {
            "du" => Speaker::User,
            "chatty" | "bot" => Speaker::Assistant,
            "fehler" => Speaker::Error,
            _ => return None,
        };

        return Some(speaker);
    }
}

/// One speaker attributed entry of a session transcript. Turns are only
/// created by the session manager when it appends to the transcript, which is
/// also where the sequence number is assigned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    speaker: Speaker,
    text: String,
    sequence: u64,
}

impl Turn {
    pub(crate) fn new(speaker: Speaker, text: &str, sequence: u64) -> Turn {
        return Turn {
            speaker,
            text: text.to_string(),
            sequence,
        };
    }

    pub fn speaker(&self) -> Speaker {
        return self.speaker;
    }

    pub fn text(&self) -> &str {
        return &self.text;
    }

    pub fn sequence(&self) -> u64 {
        return self.sequence;
    }
}
