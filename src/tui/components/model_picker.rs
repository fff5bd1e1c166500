//! # Model Picker Component
//!
//! The entity list: every admin page in menu order. Shown full-screen until a
//! model is open, then as an overlay on Ctrl+O or Esc.
//!
//! Follows the persistent state + transient wrapper pattern:
//! - `ModelPickerState` lives in `TuiState`
//! - `ModelPicker` is created each frame with borrowed state

use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Padding};

use crate::core::model::ModelConfig;
use crate::tui::event::TuiEvent;

pub struct PickerEntry {
    pub name: String,
    pub label: String,
}

/// Persistent state for the model picker.
pub struct ModelPickerState {
    pub entries: Vec<PickerEntry>,
    pub selected: usize,
    pub list_state: ListState,
}

impl ModelPickerState {
    pub fn new(models: &[ModelConfig], current: Option<&str>) -> Self {
        let entries: Vec<PickerEntry> = models
            .iter()
            .map(|m| PickerEntry {
                name: m.name.clone(),
                label: m.label_plural.clone(),
            })
            .collect();
        let selected = current
            .and_then(|name| entries.iter().position(|e| e.name == name))
            .unwrap_or(0);
        let mut list_state = ListState::default();
        if !entries.is_empty() {
            list_state.select(Some(selected));
        }
        Self {
            entries,
            selected,
            list_state,
        }
    }

    fn select(&mut self, index: usize) {
        self.selected = index;
        self.list_state.select(Some(index));
    }

    /// Handle a key event, returning a PickerEvent if the picker should act.
    pub fn handle_event(&mut self, event: &TuiEvent) -> Option<PickerEvent> {
        if self.entries.is_empty() {
            return matches!(event, TuiEvent::Escape).then_some(PickerEvent::Dismiss);
        }
        let last = self.entries.len() - 1;
        match event {
            TuiEvent::Escape => Some(PickerEvent::Dismiss),
            TuiEvent::CursorUp => {
                self.select(self.selected.saturating_sub(1));
                None
            }
            TuiEvent::CursorDown => {
                self.select((self.selected + 1).min(last));
                None
            }
            TuiEvent::CursorHome => {
                self.select(0);
                None
            }
            TuiEvent::CursorEnd => {
                self.select(last);
                None
            }
            TuiEvent::Submit => self
                .entries
                .get(self.selected)
                .map(|e| PickerEvent::Open(e.name.clone())),
            _ => None,
        }
    }
}

/// Events emitted by the model picker.
#[derive(Debug, PartialEq)]
pub enum PickerEvent {
    Open(String),
    Dismiss,
}

/// Transient render wrapper for the model picker.
pub struct ModelPicker<'a> {
    state: &'a mut ModelPickerState,
    current: Option<&'a str>,
}

impl<'a> ModelPicker<'a> {
    pub fn new(state: &'a mut ModelPickerState, current: Option<&'a str>) -> Self {
        Self { state, current }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(Clear, area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Administration ")
            .title_alignment(Alignment::Left)
            .title_bottom(Line::from(" Enter Ouvrir  Esc Retour ").centered())
            .padding(Padding::horizontal(1));

        let items: Vec<ListItem> = self
            .state
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let is_current = self.current == Some(entry.name.as_str());
                let style = if i == self.state.selected {
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                } else if is_current {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default().fg(Color::Gray)
                };
                let marker = if is_current { " *" } else { "" };
                ListItem::new(Line::from(vec![
                    Span::styled(entry.label.clone(), style),
                    Span::styled(marker, style),
                ]))
            })
            .collect();

        let list = List::new(items).block(block);
        frame.render_stateful_widget(list, area, &mut self.state.list_state);
    }
}
