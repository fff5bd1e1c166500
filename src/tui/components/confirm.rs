//! # ConfirmDialog Component
//!
//! Small centered box asking before a delete runs. `o`/`y`/Enter confirm,
//! `n`/Esc cancel.

use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Clear, Paragraph, Wrap};

use crate::tui::component::Component;
use crate::tui::components::centered_rect;
use crate::tui::event::TuiEvent;

pub struct ConfirmDialog {
    pub message: String,
}

impl ConfirmDialog {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// `Some(true)` to run the change, `Some(false)` to drop it.
    pub fn answer(event: &TuiEvent) -> Option<bool> {
        match event {
            TuiEvent::Submit | TuiEvent::InputChar('o' | 'O' | 'y' | 'Y') => Some(true),
            TuiEvent::Escape | TuiEvent::InputChar('n' | 'N') => Some(false),
            _ => None,
        }
    }
}

impl Component for ConfirmDialog {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let overlay = centered_rect(50, 30, area);
        frame.render_widget(Clear, overlay);

        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Red))
            .title(" Confirmation ")
            .title_bottom(Line::from(" o Confirmer  n Annuler ").centered());
        let paragraph = Paragraph::new(self.message.as_str())
            .style(Style::default().add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(paragraph, overlay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    #[test]
    fn test_answers() {
        assert_eq!(ConfirmDialog::answer(&TuiEvent::InputChar('o')), Some(true));
        assert_eq!(ConfirmDialog::answer(&TuiEvent::Submit), Some(true));
        assert_eq!(ConfirmDialog::answer(&TuiEvent::Escape), Some(false));
        assert_eq!(ConfirmDialog::answer(&TuiEvent::InputChar('d')), None);
    }

    #[test]
    fn test_render_shows_question() {
        let backend = TestBackend::new(80, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut dialog = ConfirmDialog::new("Supprimer 2 élément(s) ?");
        terminal.draw(|f| dialog.render(f, f.area())).unwrap();

        let buffer = terminal.backend().buffer();
        let text = buffer.content().iter().map(|c| c.symbol()).collect::<String>();
        assert!(text.contains("Confirmation"));
        assert!(text.contains("Supprimer 2 élément(s) ?"));
    }
}
