#[cfg(test)]
#[path = "primer_test.rs"]
mod tests;

use super::SessionError;
use super::Speaker;

pub const DEFAULT_INSTRUCTION: &str = "Hallo Chatty! Für unser Gespräch gilt: Du bist ein freundlicher Chatbot, der sich ausschließlich auf lockere, alltägliche Unterhaltung konzentriert. Bitte vermeide es, Code zu schreiben, komplexe Probleme zu lösen, detaillierte technische Erklärungen zu geben oder spezifische Anweisungen auszuführen, die über eine normale Unterhaltung hinausgehen. Wenn du nach solchen Dingen gefragt wirst, weise bitte höflich darauf hin, dass du nur zum Plaudern da bist. Halte deine Antworten gesprächig und freundlich.";

pub const DEFAULT_REPLY: &str = "Hallo! Ich bin Chatty und freue mich auf eine nette, lockere Unterhaltung mit dir. Worüber möchtest du gerne quatschen?";

/// Seed pair sent ahead of every conversation: a user authored instruction
/// followed by the assistant's acknowledgement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Primer {
    instruction: String,
    acknowledgement: String,
}

impl Default for Primer {
    fn default() -> Primer {
        return Primer {
            instruction: DEFAULT_INSTRUCTION.to_string(),
            acknowledgement: DEFAULT_REPLY.to_string(),
        };
    }
}

impl Primer {
    pub fn new(instruction: &str, acknowledgement: &str) -> Result<Primer, SessionError> {
        let instruction = instruction.trim();
        let acknowledgement = acknowledgement.trim();
        if instruction.is_empty() {
            return Err(SessionError::InvalidPrimer(
                "the instruction is empty".to_string(),
            ));
        }
        if acknowledgement.is_empty() {
            return Err(SessionError::InvalidPrimer(
                "the acknowledgement is empty".to_string(),
            ));
        }

        return Ok(Primer {
            instruction: instruction.to_string(),
            acknowledgement: acknowledgement.to_string(),
        });
    }

    /// Builds a primer from an ordered seed history, which must be exactly one
    /// user turn followed by one assistant turn.
    pub fn from_seed(seed: &[(Speaker, String)]) -> Result<Primer, SessionError> {
        match seed {
            [(Speaker::User, instruction), (Speaker::Assistant, acknowledgement)] => {
                return Primer::new(instruction, acknowledgement);
            }
            _ => {
                let speakers = seed
                    .iter()
                    .map(|(speaker, _)| return speaker.to_string())
                    .collect::<Vec<String>>()
                    .join(", ");

                return Err(SessionError::InvalidPrimer(format!(
                    "expected [user, assistant], got [{speakers}]"
                )));
            }
        }
    }

    pub fn instruction(&self) -> &str {
        return &self.instruction;
    }

    pub fn acknowledgement(&self) -> &str {
        return &self.acknowledgement;
    }

    pub fn turns(&self) -> [(Speaker, &str); 2] {
        return [
            (Speaker::User, self.instruction.as_str()),
            (Speaker::Assistant, self.acknowledgement.as_str()),
        ];
    }
}
