//! # TUI Components
//!
//! ## Component Architecture
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Receive everything they draw as props and hold nothing between frames:
//! - `TitleBar`: model, user and toast
//! - `DataTable`: stat cards, tabs, rows and footer of an `AdminPage`
//! - `ConfirmDialog`: the question for a pending destructive change
//! - `DashboardView`: collection counts and top search terms
//!
//! ### Stateful Components (Event-Driven)
//!
//! Keep presentation state in `TuiState` and emit high-level events:
//! - `TextField`: text input used by prompts and forms
//! - `ModelPicker`: the entity list
//! - `RecordForm`: field focus and editor for the open `FormState`
//! - `SearchPanel`: tab and cursor over global search results
//!
//! Stateful overlays follow the persistent state + transient wrapper pattern:
//! `XState` lives in `TuiState`, `X<'a>` borrows it for one frame.
//!
//! ## Module Structure
//!
//! ```text
//! components/
//! ├── mod.rs           (this file, shared helpers)
//! ├── title_bar.rs
//! ├── model_picker.rs
//! ├── data_table.rs
//! ├── record_form.rs
//! ├── confirm.rs
//! ├── search_panel.rs
//! ├── dashboard.rs
//! └── text_field/      (input, cursor, wrapping)
//! ```

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};

use crate::core::format::Tone;

mod title_bar;
pub use title_bar::TitleBar;

pub mod confirm;
pub mod dashboard;
pub mod data_table;
pub mod model_picker;
pub mod record_form;
pub mod search_panel;
pub mod text_field;

pub use confirm::ConfirmDialog;
pub use dashboard::DashboardView;
pub use data_table::DataTable;
pub use model_picker::{ModelPicker, ModelPickerState, PickerEvent};
pub use record_form::{FormEvent, RecordForm, RecordFormState};
pub use search_panel::{SearchEvent, SearchPanel, SearchPanelState};
pub use text_field::{FieldEvent, TextField};

/// Colour of a status badge.
pub fn tone_style(tone: Tone) -> Style {
    Style::default().fg(match tone {
        Tone::Success => Color::Green,
        Tone::Warning => Color::Yellow,
        Tone::Info => Color::Cyan,
        Tone::Muted => Color::Gray,
        Tone::Danger => Color::Red,
    })
}

/// Compute a centered rect using percentage of the outer rect.
pub fn centered_rect(percent_x: u16, percent_y: u16, outer: Rect) -> Rect {
    let [_, center_v, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(outer);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(center_v);
    center
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_is_inside() {
        let outer = Rect::new(0, 0, 100, 40);
        let inner = centered_rect(60, 50, outer);
        assert_eq!(inner.width, 60);
        assert_eq!(inner.height, 20);
        assert_eq!(inner.x, 20);
        assert_eq!(inner.y, 10);
    }
}
