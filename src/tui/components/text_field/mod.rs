//! # TextField Component
//!
//! Bordered text input used by the search prompts and the record form.
//!
//! ## Responsibilities
//!
//! - Capture text input (typing, paste, backspace/delete)
//! - Cursor movement by char, word, line and wrapped row
//! - Emit `Submit` on Enter and `Changed` after every edit
//!
//! ## State Management
//!
//! The buffer is internal state. `title`, `error` and `focused` are props set
//! by the parent each frame. Single-line fields drop newlines; multi-line
//! fields accept them via Ctrl+J and wrap with `textwrap`.

mod cursor;
mod text_wrap;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Paragraph};

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

use cursor::CursorState;
use text_wrap::{
    VERTICAL_OVERHEAD, inner_width, next_char_boundary, next_word_boundary, prev_char_boundary,
    prev_word_boundary, wrap_line_count, wrap_options,
};

/// Visible rows of a multi-line field before it scrolls
const MULTILINE_ROWS: u16 = 4;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldEvent {
    /// Enter pressed; carries the current text. The buffer is kept.
    Submit(String),
    /// Text content changed; carries the new text.
    Changed(String),
    /// Cursor moved without changing the text
    Moved,
}

pub struct TextField {
    /// Text buffer (Internal State)
    pub buffer: String,
    /// Block title (Prop)
    pub title: String,
    /// Validation message shown under the border (Prop)
    pub error: Option<String>,
    /// Whether the field owns the terminal cursor (Prop)
    pub focused: bool,
    multiline: bool,
    cursor: CursorState,
}

impl TextField {
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_text(title, "")
    }

    /// A field pre-filled with `text`, cursor at the end.
    pub fn with_text(title: impl Into<String>, text: &str) -> Self {
        Self {
            buffer: text.to_string(),
            title: title.into(),
            error: None,
            focused: true,
            multiline: false,
            cursor: CursorState::at(text.len()),
        }
    }

    pub fn multiline(mut self) -> Self {
        self.multiline = true;
        self
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    fn visible_rows(&self) -> u16 {
        if self.multiline { MULTILINE_ROWS } else { 1 }
    }

    /// Height for the current content, borders included.
    pub fn calculate_height(&self, content_width: u16) -> u16 {
        let lines = wrap_line_count(&self.buffer, inner_width(content_width));
        lines.min(self.visible_rows()) + VERTICAL_OVERHEAD
    }

    fn visible_text(&self, content_width: u16) -> String {
        let width = inner_width(content_width);
        if width == 0 {
            return String::new();
        }
        if !self.multiline {
            // Single line: show the tail that holds the cursor
            let before = self.buffer[..self.cursor.pos].chars().count();
            let skip = before.saturating_sub(width as usize - 1);
            return self.buffer.chars().skip(skip).collect();
        }
        if self.cursor.scroll_offset == 0 {
            return self.buffer.clone();
        }
        let lines = textwrap::wrap(&self.buffer, wrap_options(width));
        let start = (self.cursor.scroll_offset as usize).min(lines.len());
        let end = (start + MULTILINE_ROWS as usize).min(lines.len());
        lines[start..end].join("\n")
    }

    fn edited(&self) -> Option<FieldEvent> {
        Some(FieldEvent::Changed(self.buffer.clone()))
    }

    fn moved_to(&mut self, pos: usize) -> Option<FieldEvent> {
        if pos == self.cursor.pos {
            return None;
        }
        self.cursor.pos = pos;
        Some(FieldEvent::Moved)
    }

    fn insert(&mut self, text: &str) -> Option<FieldEvent> {
        let text: String = if self.multiline {
            text.to_string()
        } else {
            text.chars().filter(|c| *c != '\n' && *c != '\r').collect()
        };
        if text.is_empty() {
            return None;
        }
        self.buffer.insert_str(self.cursor.pos, &text);
        self.cursor.pos += text.len();
        self.edited()
    }
}

impl Component for TextField {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        self.cursor.last_content_width = area.width;
        if self.multiline {
            self.cursor
                .update_scroll_offset(&self.buffer, area.width, self.visible_rows());
        }

        let border = match (&self.error, self.focused) {
            (Some(_), _) => Style::default().fg(Color::Red),
            (None, true) => Style::default().fg(Color::Cyan),
            (None, false) => Style::default().fg(Color::DarkGray),
        };
        let mut block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border)
            .title(self.title.as_str());
        if let Some(error) = &self.error {
            block = block.title_bottom(Line::from(format!(" {error} ")).style(border));
        }

        let paragraph = Paragraph::new(self.visible_text(area.width)).block(block);
        frame.render_widget(paragraph, area);

        if self.focused {
            let (x, y) = if self.multiline {
                self.cursor.screen_pos(&self.buffer, area)
            } else {
                let before = self.buffer[..self.cursor.pos].chars().count() as u16;
                let width = inner_width(area.width).max(1);
                (area.x + 1 + before.min(width - 1), area.y + 1)
            };
            frame.set_cursor_position((x, y));
        }
    }
}

impl EventHandler for TextField {
    type Event = FieldEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::InputChar(c) => self.insert(c.encode_utf8(&mut [0; 4])),
            TuiEvent::Paste(text) => self.insert(text),
            TuiEvent::Backspace => {
                if self.cursor.pos == 0 {
                    return None;
                }
                let prev = prev_char_boundary(&self.buffer, self.cursor.pos);
                self.buffer.drain(prev..self.cursor.pos);
                self.cursor.pos = prev;
                self.edited()
            }
            TuiEvent::Delete => {
                if self.cursor.pos >= self.buffer.len() {
                    return None;
                }
                let next = next_char_boundary(&self.buffer, self.cursor.pos);
                self.buffer.drain(self.cursor.pos..next);
                self.edited()
            }
            TuiEvent::CursorLeft if self.cursor.pos > 0 => {
                let pos = prev_char_boundary(&self.buffer, self.cursor.pos);
                self.moved_to(pos)
            }
            TuiEvent::CursorRight if self.cursor.pos < self.buffer.len() => {
                let pos = next_char_boundary(&self.buffer, self.cursor.pos);
                self.moved_to(pos)
            }
            TuiEvent::WordLeft => {
                let pos = prev_word_boundary(&self.buffer, self.cursor.pos);
                self.moved_to(pos)
            }
            TuiEvent::WordRight => {
                let pos = next_word_boundary(&self.buffer, self.cursor.pos);
                self.moved_to(pos)
            }
            TuiEvent::CursorHome => {
                let start = self.buffer[..self.cursor.pos]
                    .rfind('\n')
                    .map(|i| i + 1)
                    .unwrap_or(0);
                self.moved_to(start)
            }
            TuiEvent::CursorEnd => {
                let end = self.buffer[self.cursor.pos..]
                    .find('\n')
                    .map(|i| self.cursor.pos + i)
                    .unwrap_or(self.buffer.len());
                self.moved_to(end)
            }
            TuiEvent::CursorUp if self.multiline => self
                .cursor
                .move_vertically(&self.buffer, -1)
                .then_some(FieldEvent::Moved),
            TuiEvent::CursorDown if self.multiline => self
                .cursor
                .move_vertically(&self.buffer, 1)
                .then_some(FieldEvent::Moved),
            TuiEvent::Submit => Some(FieldEvent::Submit(self.buffer.clone())),
            _ => None,
        }
    }
}
