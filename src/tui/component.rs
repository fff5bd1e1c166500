use ratatui::Frame;
use ratatui::layout::Rect;

use crate::tui::event::TuiEvent;

/// A piece of the admin console that draws itself.
///
/// Overlays and views (table, form, dashboard, confirmation) are built as a
/// short-lived wrapper borrowing `App` data plus, when they need one, a
/// persistent state struct kept in `TuiState`:
/// - data the component shows arrives through its fields;
/// - presentation state (focus, scroll offset) lives in the borrowed state;
/// - `render` draws into the given `Rect` of the frame.
///
/// `render` takes `&mut self` so a component can adjust its presentation
/// state while drawing, e.g. scrolling the form to keep the focused field in
/// view.
pub trait Component {
    fn render(&mut self, frame: &mut Frame, area: Rect);
}

/// An input widget that turns terminal events into its own events, such as
/// `FieldEvent::Changed` from a text field.
pub trait EventHandler {
    type Event;

    /// `None` when the key was consumed without anything to report, or ignored.
    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event>;
}
