pub fn primer_instruction_fixture() -> &'static str {
    return "Hallo Chatty! Für unser Gespräch gilt: Du bist ein freundlicher Chatbot, der sich ausschließlich auf lockere, alltägliche Unterhaltung konzentriert.";
}

pub fn primer_reply_fixture() -> &'static str {
    return "Hallo! Ich bin Chatty und freue mich auf eine nette, lockere Unterhaltung mit dir. Worüber möchtest du gerne quatschen?";
}

/// A complete, non-streamed generateContent response carrying one candidate.
pub fn gemini_reply_fixture(text: &str) -> String {
    return format!(
        r#"{{
  "candidates": [
    {{
      "content": {{
        "parts": [{{ "text": {text:?} }}],
        "role": "model"
      }},
      "finishReason": "STOP",
      "index": 0
    }}
  ]
}}"#
    );
}
