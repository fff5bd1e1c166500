//! # RecordForm Component
//!
//! Create/edit/preview overlay for the open `FormState`. One widget per field
//! kind:
//!
//! - text-like kinds: a `TextField` (multi-line for `Textarea`/`RichText`)
//! - `Select`: `‹ label ›`, cycled with ←/→
//! - `Boolean`: `[x] Oui`, toggled with Space or ←/→
//!
//! Values live in core (`FormState::values`); this component only tracks
//! which field has focus and edits it through `FormEvent::Set`. Errors come
//! from the last validation and render under each field. A preview form only
//! moves focus; it emits no `Set` or `Submit`.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Clear, Paragraph};

use crate::core::model::{FieldConfig, FieldKind};
use crate::core::state::FormState;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::centered_rect;
use crate::tui::components::text_field::{FieldEvent, TextField};
use crate::tui::event::TuiEvent;

const CHOICE_HEIGHT: u16 = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
    Set { name: String, value: String },
    Submit,
    Close,
}

fn is_multiline(kind: &FieldKind) -> bool {
    matches!(kind, FieldKind::Textarea | FieldKind::RichText)
}

fn label_of(field: &FieldConfig) -> String {
    if field.required {
        format!("{} *", field.label)
    } else {
        field.label.clone()
    }
}

fn text_field(field: &FieldConfig, value: &str) -> TextField {
    let editor = TextField::with_text(label_of(field), value);
    if is_multiline(&field.kind) {
        editor.multiline()
    } else {
        editor
    }
}

/// Persistent focus state for the form overlay.
pub struct RecordFormState {
    pub focus: usize,
    pub editor: TextField,
    /// First visible row inside the overlay
    scroll: u16,
}

impl RecordFormState {
    pub fn new(form: &FormState) -> Self {
        let mut state = Self {
            focus: 0,
            editor: TextField::new(""),
            scroll: 0,
        };
        state.focus_to(form, 0);
        state
    }

    fn focused_field<'f>(&self, form: &'f FormState) -> Option<&'f FieldConfig> {
        form.model.fields.get(self.focus)
    }

    fn focus_to(&mut self, form: &FormState, index: usize) {
        let Some(field) = form.model.fields.get(index) else {
            return;
        };
        self.focus = index;
        self.editor = text_field(field, form.value(&field.name));
    }

    fn next(&mut self, form: &FormState) {
        if self.focus + 1 < form.model.fields.len() {
            self.focus_to(form, self.focus + 1);
        }
    }

    fn prev(&mut self, form: &FormState) {
        if self.focus > 0 {
            self.focus_to(form, self.focus - 1);
        }
    }

    /// Handle a key event against the current form values.
    pub fn handle_event(&mut self, form: &FormState, event: &TuiEvent) -> Option<FormEvent> {
        match event {
            TuiEvent::Escape => return Some(FormEvent::Close),
            TuiEvent::Tab => {
                self.next(form);
                return None;
            }
            TuiEvent::BackTab => {
                self.prev(form);
                return None;
            }
            _ => {}
        }
        if form.is_read_only() {
            match event {
                TuiEvent::CursorUp => self.prev(form),
                TuiEvent::CursorDown => self.next(form),
                _ => {}
            }
            return None;
        }
        if *event == TuiEvent::SaveForm {
            return Some(FormEvent::Submit);
        }

        let field = self.focused_field(form)?;
        let name = field.name.clone();
        let current = form.value(&name);
        let set = |value: String| Some(FormEvent::Set { name: name.clone(), value });

        match (&field.kind, event) {
            (_, TuiEvent::Submit) => Some(FormEvent::Submit),
            (FieldKind::Boolean, TuiEvent::InputChar(' ') | TuiEvent::CursorLeft | TuiEvent::CursorRight) => {
                set((current != "true").to_string())
            }
            (FieldKind::Select(options), TuiEvent::CursorLeft | TuiEvent::CursorRight) => {
                let mut values: Vec<&str> = Vec::new();
                if !field.required {
                    values.push("");
                }
                values.extend(options.iter().map(|o| o.value.as_str()));
                if values.is_empty() {
                    return None;
                }
                let step = if *event == TuiEvent::CursorRight { 1 } else { values.len() - 1 };
                let next = match values.iter().position(|v| *v == current) {
                    Some(i) => values[(i + step) % values.len()],
                    None if step == 1 => values[0],
                    None => values[values.len() - 1],
                };
                set(next.to_string())
            }
            (FieldKind::Boolean | FieldKind::Select(_), TuiEvent::CursorUp) => {
                self.prev(form);
                None
            }
            (FieldKind::Boolean | FieldKind::Select(_), TuiEvent::CursorDown) => {
                self.next(form);
                None
            }
            (FieldKind::Boolean | FieldKind::Select(_), _) => None,
            (_, _) => match self.editor.handle_event(event) {
                Some(FieldEvent::Changed(text)) => set(text),
                Some(FieldEvent::Submit(_)) => Some(FormEvent::Submit),
                Some(FieldEvent::Moved) => None,
                // Up/Down past the first or last line leave the field
                None => {
                    match event {
                        TuiEvent::CursorUp => self.prev(form),
                        TuiEvent::CursorDown => self.next(form),
                        _ => {}
                    }
                    None
                }
            },
        }
    }

    /// Keeps the focused field inside a viewport of `height` rows.
    fn scroll_to_focus(&mut self, heights: &[u16], height: u16) {
        let top: u16 = heights[..self.focus].iter().sum();
        let bottom = top + heights.get(self.focus).copied().unwrap_or(0);
        if top < self.scroll {
            self.scroll = top;
        } else if bottom > self.scroll + height {
            self.scroll = bottom.saturating_sub(height);
        }
    }
}

/// Transient render wrapper for the form overlay.
pub struct RecordForm<'a> {
    state: &'a mut RecordFormState,
    form: &'a FormState,
}

impl<'a> RecordForm<'a> {
    pub fn new(state: &'a mut RecordFormState, form: &'a FormState) -> Self {
        Self { state, form }
    }

    fn field_height(&self, index: usize, field: &FieldConfig, width: u16) -> u16 {
        match field.kind {
            FieldKind::Boolean | FieldKind::Select(_) => CHOICE_HEIGHT,
            _ if index == self.state.focus => self.state.editor.calculate_height(width),
            _ => text_field(field, self.form.value(&field.name)).calculate_height(width),
        }
    }

    fn render_choice(&self, frame: &mut Frame, area: Rect, field: &FieldConfig, focused: bool) {
        let value = self.form.value(&field.name);
        let error = self.form.errors.get(&field.name);
        let text = match &field.kind {
            FieldKind::Boolean if value == "true" => "[x] Oui".to_string(),
            FieldKind::Boolean => "[ ] Non".to_string(),
            _ if value.is_empty() => "‹ — ›".to_string(),
            kind => format!("‹ {} ›", kind.option_label(value)),
        };
        let border = match (error, focused) {
            (Some(_), _) => Style::default().fg(Color::Red),
            (None, true) => Style::default().fg(Color::Cyan),
            (None, false) => Style::default().fg(Color::DarkGray),
        };
        let mut block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border)
            .title(label_of(field));
        if let Some(error) = error {
            block = block.title_bottom(Line::from(format!(" {error} ")).style(border));
        }
        frame.render_widget(Paragraph::new(text).block(block), area);
    }
}

impl Component for RecordForm<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let overlay = centered_rect(80, 90, area);
        frame.render_widget(Clear, overlay);

        let hints = if self.form.is_read_only() {
            " Tab Champ suivant  Esc Fermer "
        } else {
            " Tab Champ suivant  Ctrl+S Enregistrer  Esc Fermer "
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!(" {} ", self.form.title()))
            .title_bottom(Line::from(hints).centered());
        let inner = block.inner(overlay);
        frame.render_widget(block, overlay);

        let form = self.form;
        let fields = &form.model.fields;
        let heights: Vec<u16> = fields
            .iter()
            .enumerate()
            .map(|(i, f)| self.field_height(i, f, inner.width))
            .collect();
        self.state.scroll_to_focus(&heights, inner.height);

        let mut top = 0u16;
        for (i, (field, height)) in fields.iter().zip(&heights).enumerate() {
            let (start, end) = (top, top + height);
            top = end;
            if start < self.state.scroll || end > self.state.scroll + inner.height {
                continue;
            }
            let field_area = Rect {
                x: inner.x,
                y: inner.y + start - self.state.scroll,
                width: inner.width,
                height: *height,
            };
            let focused = i == self.state.focus;
            let error = form.errors.get(&field.name).map(str::to_string);
            match field.kind {
                FieldKind::Boolean | FieldKind::Select(_) => {
                    self.render_choice(frame, field_area, field, focused)
                }
                _ if focused => {
                    self.state.editor.error = error;
                    self.state.editor.focused = true;
                    self.state.editor.render(frame, field_area);
                }
                _ => {
                    let mut view = text_field(field, form.value(&field.name));
                    view.focused = false;
                    view.error = error;
                    view.render(frame, field_area);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog;
    use crate::core::model::ModelConfig;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::sync::Arc;

    fn news_form() -> FormState {
        FormState::new(Arc::new(catalog::news()), None)
    }

    /// Applies emitted `Set` events the way the reducer would.
    fn send(state: &mut RecordFormState, form: &mut FormState, event: TuiEvent) -> Option<FormEvent> {
        let out = state.handle_event(form, &event);
        if let Some(FormEvent::Set { name, value }) = &out {
            form.set(name, value.clone());
        }
        out
    }

    #[test]
    fn test_typing_sets_focused_field() {
        let mut form = news_form();
        let mut state = RecordFormState::new(&form);
        for c in "Port".chars() {
            send(&mut state, &mut form, TuiEvent::InputChar(c));
        }
        assert_eq!(form.value("title"), "Port");
        assert_eq!(send(&mut state, &mut form, TuiEvent::Submit), Some(FormEvent::Submit));
        assert_eq!(send(&mut state, &mut form, TuiEvent::Escape), Some(FormEvent::Close));
    }

    #[test]
    fn test_select_cycles_with_optional_blank() {
        let mut form = news_form();
        let mut state = RecordFormState::new(&form);
        for _ in 0..3 {
            send(&mut state, &mut form, TuiEvent::Tab);
        }
        assert_eq!(state.focus, 3);
        send(&mut state, &mut form, TuiEvent::CursorRight);
        assert_eq!(form.value("category"), "actualite");
        send(&mut state, &mut form, TuiEvent::CursorLeft);
        assert_eq!(form.value("category"), "");
        send(&mut state, &mut form, TuiEvent::CursorLeft);
        assert_eq!(form.value("category"), "discours");

        // Required select: no blank entry
        send(&mut state, &mut form, TuiEvent::CursorDown);
        send(&mut state, &mut form, TuiEvent::CursorRight);
        assert_eq!(form.value("status"), "draft");
    }

    #[test]
    fn test_select_without_options_is_inert() {
        let model = ModelConfig::builder("empty")
            .field(FieldConfig::new("kind", "Type", FieldKind::Select(Vec::new())).required())
            .build();
        let mut form = FormState::new(Arc::new(model), None);
        let mut state = RecordFormState::new(&form);
        assert_eq!(send(&mut state, &mut form, TuiEvent::CursorLeft), None);
        assert_eq!(send(&mut state, &mut form, TuiEvent::CursorRight), None);
        assert_eq!(form.value("kind"), "");
    }

    #[test]
    fn test_preview_ignores_edits() {
        let record = crate::test_support::rec(serde_json::json!({"id": "n1", "title": "Port"}));
        let mut form = FormState::preview(Arc::new(catalog::news()), &record);
        let mut state = RecordFormState::new(&form);
        assert_eq!(send(&mut state, &mut form, TuiEvent::InputChar('x')), None);
        assert_eq!(send(&mut state, &mut form, TuiEvent::SaveForm), None);
        assert_eq!(send(&mut state, &mut form, TuiEvent::Submit), None);
        assert_eq!(form.value("title"), "Port");
        send(&mut state, &mut form, TuiEvent::CursorDown);
        assert_eq!(state.focus, 1);
        assert_eq!(send(&mut state, &mut form, TuiEvent::Escape), Some(FormEvent::Close));
    }

    #[test]
    fn test_boolean_toggles() {
        let mut form = FormState::new(Arc::new(catalog::users()), None);
        let mut state = RecordFormState::new(&form);
        let index = form
            .model
            .fields
            .iter()
            .position(|f| f.kind == FieldKind::Boolean)
            .unwrap();
        state.focus_to(&form, index);
        let before = form.value(&form.model.fields[index].name).to_string();
        send(&mut state, &mut form, TuiEvent::InputChar(' '));
        assert_ne!(form.value(&form.model.fields[index].name), before);
    }

    #[test]
    fn test_focus_change_loads_value() {
        let mut form = news_form();
        form.set("excerpt", "Résumé court".into());
        let mut state = RecordFormState::new(&form);
        send(&mut state, &mut form, TuiEvent::CursorDown);
        assert_eq!(state.focus, 1);
        assert_eq!(state.editor.text(), "Résumé court");
        send(&mut state, &mut form, TuiEvent::BackTab);
        assert_eq!(state.focus, 0);
    }

    #[test]
    fn test_render_shows_labels_and_errors() {
        let backend = TestBackend::new(100, 60);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut form = news_form();
        form.validate();
        let mut state = RecordFormState::new(&form);

        terminal
            .draw(|f| RecordForm::new(&mut state, &form).render(f, f.area()))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let text = buffer.content().iter().map(|c| c.symbol()).collect::<String>();
        assert!(text.contains("Nouveau : Actualité"));
        assert!(text.contains("Titre *"));
        assert!(text.contains("Titre est requis"));
        assert!(text.contains("Statut *"));
    }
}
