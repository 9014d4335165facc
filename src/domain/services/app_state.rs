#[cfg(test)]
#[path = "app_state_test.rs"]
mod tests;

use ratatui::prelude::Rect;

use super::ChatView;
use super::Scroll;
use crate::domain::models::Message;
use crate::domain::models::SessionState;

pub struct AppState {
    pub chat_view: ChatView,
    pub last_known_height: u16,
    pub last_known_width: u16,
    pub messages: Vec<Message>,
    pub scroll: Scroll,
    pub session_state: SessionState,
    pub waiting_for_session: bool,
}

impl Default for AppState {
    fn default() -> AppState {
        return AppState {
            chat_view: ChatView::default(),
            last_known_height: 0,
            last_known_width: 0,
            messages: vec![],
            scroll: Scroll::default(),
            session_state: SessionState::Uninitialized,
            // Input stays disabled until the first session has been started.
            waiting_for_session: true,
        };
    }
}

impl AppState {
    pub fn set_rect(&mut self, rect: Rect) {
        self.last_known_width = rect.width;
        self.last_known_height = rect.height;
        self.sync_dependants();
    }

    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
        self.sync_dependants();
    }

    pub fn clear_messages(&mut self) {
        self.messages.clear();
        self.sync_dependants();
    }

    pub fn handle_state_changed(&mut self, state: SessionState) {
        tracing::debug!(state = %state, "session state changed");
        self.session_state = state;
        self.waiting_for_session = state == SessionState::AwaitingResponse;
    }

    fn sync_dependants(&mut self) {
        self.chat_view
            .set_messages(&self.messages, self.last_known_width.into());

        let lines_len = u16::try_from(self.chat_view.len()).unwrap_or(u16::MAX);
        self.scroll.set_state(lines_len, self.last_known_height);
    }
}
