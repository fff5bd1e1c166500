//! # TitleBar Component
//!
//! Top status bar: where you are, who you are, and the last toast.
//!
//! ## Conditional Formatting
//!
//! 1. **Model open + user**: `"Portail · Actualités · Salma Bennani (admin) | Élément créé"`
//! 2. **No model**: `"Portail · Salma Bennani (admin) | Bienvenue ..."`
//! 3. **Loading**: the status is followed by a spinner frame
//!
//! TitleBar is stateless: every field is a prop copied from `App` each frame.

use crate::tui::component::Component;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

const SPINNER: [&str; 4] = ["◐", "◓", "◑", "◒"];

pub struct TitleBar {
    /// Plural label of the open model, if any
    pub model_label: Option<String>,
    /// "Name (role)" of the signed-in user
    pub user: Option<String>,
    /// Toast text
    pub status_message: String,
    /// A background call is in flight
    pub is_loading: bool,
    /// Animation frame for the spinner
    pub spinner_frame: usize,
}

impl TitleBar {
    pub fn new(model_label: Option<String>, user: Option<String>, status_message: String) -> Self {
        Self {
            model_label,
            user,
            status_message,
            is_loading: false,
            spinner_frame: 0,
        }
    }

    fn title_text(&self) -> String {
        let mut parts = vec!["Portail"];
        if let Some(label) = &self.model_label {
            parts.push(label);
        }
        if let Some(user) = &self.user {
            parts.push(user);
        }
        let head = parts.join(" · ");
        if self.status_message.is_empty() {
            head
        } else {
            format!("{head} | {}", self.status_message)
        }
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::raw(self.title_text())];
        if self.is_loading {
            spans.push(Span::styled(
                format!(" {}", SPINNER[self.spinner_frame % SPINNER.len()]),
                Style::default().fg(Color::Yellow),
            ));
        }
        frame.render_widget(Line::from(spans), area);
    }
}
