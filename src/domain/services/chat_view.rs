#[cfg(test)]
#[path = "chat_view_test.rs"]
mod tests;

use ratatui::prelude::Backend;
use ratatui::prelude::Rect;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::domain::models::Message;
use crate::domain::models::Speaker;

// Left padding + scrollbar.
const BORDER_ELEMENTS_LENGTH: usize = 4;

fn speaker_colour(speaker: Speaker) -> Color {
    match speaker {
        Speaker::User => return Color::Cyan,
        Speaker::Assistant => return Color::Green,
        Speaker::System => return Color::Yellow,
        Speaker::Error => return Color::Red,
    }
}

/// The scrolling list of chat messages, pre-wrapped to the width of the
/// window.
#[derive(Default)]
pub struct ChatView {
    lines: Vec<Line<'static>>,
    line_width: usize,
}

impl ChatView {
    pub fn message_lines(message: &Message, line_width: usize) -> Vec<Line<'static>> {
        let colour = speaker_colour(message.speaker);
        let mut lines = vec![Line::from(Span::styled(
            format!("{}:", message.author_name()),
            Style::default().fg(colour).add_modifier(Modifier::BOLD),
        ))];

        let text_style = match message.speaker {
            Speaker::Error => Style::default().fg(colour),
            _ => Style::default(),
        };
        let max_line_length = line_width
            .saturating_sub(BORDER_ELEMENTS_LENGTH)
            .max(1);
        for line in message.as_string_lines(max_line_length) {
            lines.push(Line::from(vec![
                Span::from("  "),
                Span::styled(line, text_style),
            ]));
        }

        lines.push(Line::from(""));

        return lines;
    }

    pub fn set_messages(&mut self, messages: &[Message], line_width: usize) {
        self.line_width = line_width;
        self.lines = messages
            .iter()
            .flat_map(|message| return ChatView::message_lines(message, line_width))
            .collect();
    }

    pub fn len(&self) -> usize {
        return self.lines.len();
    }

    pub fn render<B: Backend>(&self, frame: &mut Frame<B>, rect: Rect, scroll: u16) {
        frame.render_widget(
            Paragraph::new(self.lines.clone())
                .block(Block::default())
                .scroll((scroll, 0)),
            rect,
        );
    }
}
