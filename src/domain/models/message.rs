#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use super::Speaker;
use super::Turn;
use crate::configuration::Config;
use crate::configuration::ConfigKey;

/// A rendered entry on the chat screen. Transcript turns become messages, but
/// so do notices that never enter the transcript, such as the primer echo or
/// a failed exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub speaker: Speaker,
    pub text: String,
}

impl Message {
    pub fn new(speaker: Speaker, text: &str) -> Message {
        return Message {
            speaker,
            text: text.to_string().replace('\t', "  "),
        };
    }

    pub fn from_turn(turn: &Turn) -> Message {
        return Message::new(turn.speaker(), turn.text());
    }

    pub fn author_name(&self) -> String {
        match self.speaker {
            Speaker::User => return Config::get(ConfigKey::Username),
            Speaker::Assistant => return Config::get(ConfigKey::AssistantName),
            Speaker::System => return String::from("System"),
            Speaker::Error => {
                return format!("{} Error", Config::get(ConfigKey::AssistantName));
            }
        }
    }

    pub fn as_string_lines(&self, line_max_width: usize) -> Vec<String> {
        let mut lines: Vec<String> = Vec::new();

        for full_line in self.text.split('\n') {
            if full_line.trim().is_empty() {
                lines.push(" ".to_string());
                continue;
            }

            let mut char_count = 0;
            let mut current_lines: Vec<&str> = vec![];

            for word in full_line.split(' ') {
                let word_len = word.chars().count();
                if word_len + char_count + 1 > line_max_width && !current_lines.is_empty() {
                    lines.push(current_lines.join(" ").trim_end().to_string());
                    current_lines = vec![word];
                    char_count = word_len + 1;
                } else {
                    current_lines.push(word);
                    char_count += word_len + 1;
                }
            }
            if !current_lines.is_empty() {
                lines.push(current_lines.join(" ").trim_end().to_string());
            }
        }

        return lines;
    }
}
