//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the admin
//! screens, and translates keyboard events into core::Action values.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Keyboard routing
//!
//! Exactly one thing owns the keyboard at a time, checked top-down:
//! confirmation dialog, search prompt, record form, search results,
//! dashboard, model picker, and finally the table. [`route`] is pure over
//! `(App, TuiState)` and returns the actions to dispatch, so the routing is
//! testable without a terminal.
//!
//! ## Redraw Strategy
//!
//! - **Animating** (a load is in flight): draws every ~80ms for the spinner.
//! - **Idle**: sleeps up to 500ms, only redraws on events, resizes, or
//!   actions arriving from background tasks.

mod component;
mod components;
mod event;
mod ui;

use log::{debug, info, warn};
use std::io::stdout;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, EnableBracketedPaste, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;

use crate::core::action::{Action, Effect, EffectContext, perform, update};
use crate::core::model::{BulkAction, RowAction};
use crate::core::state::App;
use crate::tui::component::EventHandler;
use crate::tui::components::{
    ConfirmDialog, FieldEvent, FormEvent, ModelPickerState, PickerEvent, RecordFormState,
    SearchEvent, SearchPanelState, TextField,
};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// Which part of the screen receives the next key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Confirm,
    Prompt,
    Form,
    Search,
    Dashboard,
    Picker,
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Narrow the open table (`/`)
    ModelSearch,
    /// Search every public collection (Ctrl+F)
    GlobalSearch,
}

pub struct Prompt {
    pub kind: PromptKind,
    pub field: TextField,
}

impl Prompt {
    fn model_search(current: &str) -> Self {
        Self {
            kind: PromptKind::ModelSearch,
            field: TextField::with_text(" Filtrer la liste ", current),
        }
    }

    fn global_search() -> Self {
        Self {
            kind: PromptKind::GlobalSearch,
            field: TextField::new(" Rechercher dans le portail "),
        }
    }
}

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    /// Model picker; always shown when no page is open
    pub picker: Option<ModelPickerState>,
    pub prompt: Option<Prompt>,
    /// Editor state mirroring `App::form`
    pub form: Option<RecordFormState>,
    pub search: SearchPanelState,
}

impl TuiState {
    pub fn new(app: &App) -> Self {
        let current = app.page.as_ref().map(|p| p.model().name.as_str());
        Self {
            picker: Some(ModelPickerState::new(&app.models, current)),
            prompt: None,
            form: None,
            search: SearchPanelState::new(),
        }
    }

    /// Brings overlay states in line with the core state after an update.
    pub fn sync(&mut self, app: &App) {
        match (&app.form, &self.form) {
            (None, Some(_)) => self.form = None,
            (Some(form), None) => self.form = Some(RecordFormState::new(form)),
            _ => {}
        }
        if app.page.is_none() && self.picker.is_none() {
            self.picker = Some(ModelPickerState::new(&app.models, None));
        }
    }

    pub fn focus(&self, app: &App) -> Focus {
        if app.pending.is_some() {
            Focus::Confirm
        } else if self.prompt.is_some() {
            Focus::Prompt
        } else if app.form.is_some() {
            Focus::Form
        } else if app.search.is_some() {
            Focus::Search
        } else if app.dashboard.is_some() {
            Focus::Dashboard
        } else if self.picker.is_some() || app.page.is_none() {
            Focus::Picker
        } else {
            Focus::Table
        }
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        execute!(
            stdout(),
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (bracketed paste, steady block cursor, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableBracketedPaste,
            Hide
        );
    }
}

// ============================================================================
// Key routing
// ============================================================================

/// Table keys. `/` and Esc are handled by [`route`] since they touch
/// presentation state.
pub fn table_action(event: &TuiEvent) -> Option<Action> {
    let action = match event {
        TuiEvent::CursorUp => Action::MoveUp,
        TuiEvent::CursorDown => Action::MoveDown,
        TuiEvent::CursorLeft => Action::MoveLeft,
        TuiEvent::CursorRight => Action::MoveRight,
        TuiEvent::PageDown | TuiEvent::InputChar(']') => Action::NextPage,
        TuiEvent::PageUp | TuiEvent::InputChar('[') => Action::PrevPage,
        TuiEvent::Tab | TuiEvent::InputChar('t') => Action::CycleTab,
        TuiEvent::Submit | TuiEvent::InputChar('e') => Action::Row(RowAction::Edit),
        TuiEvent::InputChar(c) => match c {
            ' ' => Action::ToggleSelect,
            'a' => Action::SelectAll,
            's' | 'S' => Action::SortFocused,
            'f' => Action::CycleFilter,
            'n' => Action::NewRecord,
            'v' => Action::Row(RowAction::Preview),
            'd' => Action::Row(RowAction::Delete),
            'c' => Action::Row(RowAction::Duplicate),
            'p' => Action::Row(RowAction::Publish),
            'x' => Action::Row(RowAction::Archive),
            'P' => Action::Bulk(BulkAction::Publish),
            'X' => Action::Bulk(BulkAction::Archive),
            'D' => Action::Bulk(BulkAction::Delete),
            'E' => Action::Export,
            'r' => Action::Refresh,
            _ => return None,
        },
        _ => return None,
    };
    Some(action)
}

/// Routes one key to whichever part of the screen owns the keyboard.
pub fn route(app: &App, tui: &mut TuiState, event: TuiEvent) -> Vec<Action> {
    if event == TuiEvent::ForceQuit {
        return vec![Action::Quit];
    }

    match tui.focus(app) {
        Focus::Confirm => match ConfirmDialog::answer(&event) {
            Some(true) => vec![Action::Confirm],
            Some(false) => vec![Action::Cancel],
            None => Vec::new(),
        },

        Focus::Prompt => {
            if event == TuiEvent::Escape {
                tui.prompt = None;
                return Vec::new();
            }
            let Some(prompt) = tui.prompt.as_mut() else {
                return Vec::new();
            };
            let Some(FieldEvent::Submit(text)) = prompt.field.handle_event(&event) else {
                return Vec::new();
            };
            let kind = prompt.kind;
            tui.prompt = None;
            match kind {
                PromptKind::ModelSearch => vec![Action::SearchInModel(text.trim().to_string())],
                PromptKind::GlobalSearch => {
                    tui.search = SearchPanelState::new();
                    vec![Action::GlobalSearch {
                        query: text.trim().to_string(),
                        only: None,
                    }]
                }
            }
        }

        Focus::Form => {
            let (Some(form), Some(state)) = (app.form.as_ref(), tui.form.as_mut()) else {
                return Vec::new();
            };
            match state.handle_event(form, &event) {
                Some(FormEvent::Set { name, value }) => vec![Action::SetField { name, value }],
                Some(FormEvent::Submit) => vec![Action::SubmitForm],
                Some(FormEvent::Close) => vec![Action::CloseForm],
                None => Vec::new(),
            }
        }

        focus => {
            if let Some(actions) = global_shortcut(app, tui, &event) {
                return actions;
            }
            match focus {
                Focus::Search => route_search(app, tui, &event),
                Focus::Dashboard => match event {
                    TuiEvent::Escape => vec![Action::CloseDashboard],
                    _ => Vec::new(),
                },
                Focus::Picker => route_picker(app, tui, &event),
                _ => route_table(app, tui, event),
            }
        }
    }
}

fn global_shortcut(app: &App, tui: &mut TuiState, event: &TuiEvent) -> Option<Vec<Action>> {
    match event {
        TuiEvent::OpenSearch => {
            tui.prompt = Some(Prompt::global_search());
            Some(Vec::new())
        }
        TuiEvent::OpenDashboard => Some(vec![Action::OpenDashboard]),
        TuiEvent::OpenPicker => {
            let current = app.page.as_ref().map(|p| p.model().name.as_str());
            tui.picker = Some(ModelPickerState::new(&app.models, current));
            Some(Vec::new())
        }
        _ => None,
    }
}

fn route_search(app: &App, tui: &mut TuiState, event: &TuiEvent) -> Vec<Action> {
    let Some(results) = app.search.as_ref() else {
        return Vec::new();
    };
    match tui.search.handle_event(results, event) {
        Some(SearchEvent::Close) => vec![Action::CloseSearch],
        Some(SearchEvent::Open {
            content_type,
            title,
        }) => {
            let model = app.models.iter().find(|m| m.table == content_type.table());
            match model {
                Some(model) => {
                    tui.picker = None;
                    vec![
                        Action::CloseSearch,
                        Action::OpenModel(model.name.clone()),
                        Action::SearchInModel(title),
                    ]
                }
                None => {
                    warn!("No admin model for table {}", content_type.table());
                    vec![Action::CloseSearch]
                }
            }
        }
        None => Vec::new(),
    }
}

fn route_picker(app: &App, tui: &mut TuiState, event: &TuiEvent) -> Vec<Action> {
    let Some(picker) = tui.picker.as_mut() else {
        return Vec::new();
    };
    match picker.handle_event(event) {
        Some(PickerEvent::Open(name)) => {
            tui.picker = None;
            vec![Action::OpenModel(name)]
        }
        Some(PickerEvent::Dismiss) => {
            if app.page.is_some() {
                tui.picker = None;
            }
            Vec::new()
        }
        None => Vec::new(),
    }
}

fn route_table(app: &App, tui: &mut TuiState, event: TuiEvent) -> Vec<Action> {
    match event {
        TuiEvent::Escape => {
            let current = app.page.as_ref().map(|p| p.model().name.as_str());
            tui.picker = Some(ModelPickerState::new(&app.models, current));
            Vec::new()
        }
        TuiEvent::InputChar('/') => {
            let current = app
                .page
                .as_ref()
                .map(|p| p.table.options.search.as_str())
                .unwrap_or_default();
            tui.prompt = Some(Prompt::model_search(current));
            Vec::new()
        }
        other => table_action(&other).into_iter().collect(),
    }
}

// ============================================================================
// Event loop
// ============================================================================

/// Applies one action and spawns its effect. Returns true to quit.
fn dispatch(app: &mut App, action: Action, tx: &mpsc::Sender<Action>) -> bool {
    match update(app, action) {
        Effect::Quit => true,
        Effect::None => false,
        effect => {
            spawn_effect(effect, EffectContext::from_app(app), tx.clone());
            false
        }
    }
}

fn spawn_effect(effect: Effect, ctx: EffectContext, tx: mpsc::Sender<Action>) {
    debug!("Spawning effect: {:?}", effect);
    tokio::spawn(async move {
        for action in perform(effect, ctx).await {
            if tx.send(action).is_err() {
                warn!("Failed to deliver effect result: receiver dropped");
                return;
            }
        }
    });
}

pub fn run(mut app: App) -> std::io::Result<()> {
    let mut tui = TuiState::new(&app);

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    // Channel for actions from background tasks
    let (tx, rx) = mpsc::channel();

    let start_time = Instant::now();
    let mut needs_redraw = true;

    loop {
        tui.sync(&app);
        let animating =
            app.is_loading || app.page.as_ref().is_some_and(|p| p.table.loading);
        if animating {
            needs_redraw = true;
        }

        if needs_redraw {
            let spinner_frame = (start_time.elapsed().as_secs_f32() * 8.0) as usize;
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui, spinner_frame))?;
            needs_redraw = false;
        }

        let timeout = if animating {
            Duration::from_millis(80)
        } else {
            Duration::from_millis(500)
        };
        let first_event = poll_event_timeout(timeout);
        if first_event.is_some() {
            needs_redraw = true;
        }

        let mut should_quit = false;
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            if event == TuiEvent::Resize {
                continue;
            }
            for action in route(&app, &mut tui, event) {
                should_quit |= dispatch(&mut app, action, &tx);
            }
            tui.sync(&app);
            if should_quit {
                break;
            }
        }

        // Results from background effects
        while !should_quit && let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {:?}", action);
            should_quit = dispatch(&mut app, action, &tx);
        }

        if should_quit {
            break;
        }
    }

    info!("Leaving admin console");
    ratatui::restore();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::action::Mutation;
    use crate::test_support::test_app;

    fn open_news(app: &mut App, tui: &mut TuiState) {
        let actions = route(app, tui, TuiEvent::Submit);
        assert_eq!(actions, vec![Action::OpenModel("news".into())]);
        for action in actions {
            update(app, action);
        }
        tui.sync(app);
    }

    fn type_text(app: &App, tui: &mut TuiState, text: &str) {
        for c in text.chars() {
            assert!(route(app, tui, TuiEvent::InputChar(c)).is_empty());
        }
    }

    #[test]
    fn test_table_keys() {
        assert_eq!(table_action(&TuiEvent::InputChar('d')), Some(Action::Row(RowAction::Delete)));
        assert_eq!(table_action(&TuiEvent::InputChar('D')), Some(Action::Bulk(BulkAction::Delete)));
        assert_eq!(table_action(&TuiEvent::Submit), Some(Action::Row(RowAction::Edit)));
        assert_eq!(table_action(&TuiEvent::InputChar('f')), Some(Action::CycleFilter));
        assert_eq!(table_action(&TuiEvent::InputChar(']')), Some(Action::NextPage));
        assert_eq!(table_action(&TuiEvent::InputChar('?')), None);
        assert_eq!(table_action(&TuiEvent::Escape), None);
    }

    #[test]
    fn test_picker_opens_first_model() {
        let mut app = test_app();
        let mut tui = TuiState::new(&app);
        assert_eq!(tui.focus(&app), Focus::Picker);
        open_news(&mut app, &mut tui);
        assert_eq!(tui.focus(&app), Focus::Table);
    }

    #[test]
    fn test_picker_cannot_be_dismissed_without_a_page() {
        let app = test_app();
        let mut tui = TuiState::new(&app);
        route(&app, &mut tui, TuiEvent::Escape);
        assert!(tui.picker.is_some());
    }

    #[test]
    fn test_escape_on_table_reopens_picker() {
        let mut app = test_app();
        let mut tui = TuiState::new(&app);
        open_news(&mut app, &mut tui);
        route(&app, &mut tui, TuiEvent::Escape);
        assert_eq!(tui.focus(&app), Focus::Picker);
        route(&app, &mut tui, TuiEvent::Escape);
        assert_eq!(tui.focus(&app), Focus::Table);
    }

    #[test]
    fn test_slash_prompt_searches_the_table() {
        let mut app = test_app();
        let mut tui = TuiState::new(&app);
        open_news(&mut app, &mut tui);

        assert!(route(&app, &mut tui, TuiEvent::InputChar('/')).is_empty());
        assert_eq!(tui.focus(&app), Focus::Prompt);
        type_text(&app, &mut tui, "port ");
        let actions = route(&app, &mut tui, TuiEvent::Submit);
        assert_eq!(actions, vec![Action::SearchInModel("port".into())]);
        assert!(tui.prompt.is_none());
    }

    #[test]
    fn test_global_search_prompt() {
        let app = test_app();
        let mut tui = TuiState::new(&app);
        route(&app, &mut tui, TuiEvent::OpenSearch);
        type_text(&app, &mut tui, "safi");
        assert_eq!(
            route(&app, &mut tui, TuiEvent::Submit),
            vec![Action::GlobalSearch {
                query: "safi".into(),
                only: None
            }]
        );
    }

    #[test]
    fn test_escape_closes_prompt_without_action() {
        let app = test_app();
        let mut tui = TuiState::new(&app);
        route(&app, &mut tui, TuiEvent::OpenSearch);
        assert!(route(&app, &mut tui, TuiEvent::Escape).is_empty());
        assert!(tui.prompt.is_none());
    }

    #[test]
    fn test_confirmation_owns_the_keyboard() {
        let mut app = test_app();
        let mut tui = TuiState::new(&app);
        open_news(&mut app, &mut tui);
        app.pending = Some(Mutation::Delete("n1".into()));
        assert!(route(&app, &mut tui, TuiEvent::InputChar('d')).is_empty());
        assert_eq!(route(&app, &mut tui, TuiEvent::InputChar('o')), vec![Action::Confirm]);
        assert_eq!(route(&app, &mut tui, TuiEvent::Escape), vec![Action::Cancel]);
    }

    #[test]
    fn test_form_keys_become_field_actions() {
        let mut app = test_app();
        let mut tui = TuiState::new(&app);
        open_news(&mut app, &mut tui);
        update(&mut app, Action::NewRecord);
        tui.sync(&app);
        assert_eq!(tui.focus(&app), Focus::Form);

        assert_eq!(
            route(&app, &mut tui, TuiEvent::InputChar('A')),
            vec![Action::SetField {
                name: "title".into(),
                value: "A".into()
            }]
        );
        assert_eq!(route(&app, &mut tui, TuiEvent::SaveForm), vec![Action::SubmitForm]);
        assert_eq!(route(&app, &mut tui, TuiEvent::Escape), vec![Action::CloseForm]);

        update(&mut app, Action::CloseForm);
        tui.sync(&app);
        assert!(tui.form.is_none());
    }

    #[test]
    fn test_force_quit_always_wins() {
        let mut app = test_app();
        let mut tui = TuiState::new(&app);
        app.pending = Some(Mutation::Delete("n1".into()));
        assert_eq!(route(&app, &mut tui, TuiEvent::ForceQuit), vec![Action::Quit]);
    }
}
