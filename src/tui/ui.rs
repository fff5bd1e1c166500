//! Frame composition: title bar, main view, key hints, then overlays from
//! bottom to top (picker, form, search, dashboard, prompt, confirmation).

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::Line;

use crate::core::state::App;
use crate::tui::component::Component;
use crate::tui::components::{
    ConfirmDialog, DashboardView, DataTable, ModelPicker, RecordForm, SearchPanel, TitleBar,
    centered_rect,
};
use crate::tui::{Focus, TuiState};

pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState, spinner_frame: usize) {
    use Constraint::{Length, Min};
    let [title_area, main_area, help_area] =
        Layout::vertical([Length(1), Min(0), Length(1)]).areas(frame.area());

    let mut title_bar = TitleBar::new(
        app.page.as_ref().map(|p| p.model().label_plural.clone()),
        app.user
            .as_ref()
            .map(|u| format!("{} ({})", u.display_name(), u.role)),
        app.status_message.clone(),
    );
    title_bar.is_loading =
        app.is_loading || app.page.as_ref().is_some_and(|p| p.table.loading);
    title_bar.spinner_frame = spinner_frame;
    title_bar.render(frame, title_area);

    let current = app.page.as_ref().map(|p| p.model().name.as_str());
    match app.page.as_ref() {
        Some(page) => {
            DataTable::new(page).render(frame, main_area);
            if let Some(picker) = tui.picker.as_mut() {
                ModelPicker::new(picker, current).render(frame, centered_rect(50, 70, main_area));
            }
        }
        None => {
            if let Some(picker) = tui.picker.as_mut() {
                ModelPicker::new(picker, current).render(frame, main_area);
            }
        }
    }

    if let (Some(form), Some(state)) = (app.form.as_ref(), tui.form.as_mut()) {
        RecordForm::new(state, form).render(frame, main_area);
    }
    if let Some(results) = app.search.as_ref() {
        SearchPanel::new(&mut tui.search, results).render(frame, main_area);
    }
    if let Some(dashboard) = app.dashboard.as_ref() {
        DashboardView::new(dashboard, app.is_loading).render(frame, main_area);
    }
    if let Some(prompt) = tui.prompt.as_mut() {
        let width = main_area.width.saturating_sub(4).min(70);
        let height = prompt.field.calculate_height(width);
        let area = Rect {
            x: main_area.x + (main_area.width.saturating_sub(width)) / 2,
            y: main_area.y + 1,
            width,
            height,
        };
        frame.render_widget(ratatui::widgets::Clear, area);
        prompt.field.render(frame, area);
    }
    if let Some(pending) = app.pending.as_ref() {
        ConfirmDialog::new(pending.confirmation()).render(frame, main_area);
    }

    frame.render_widget(
        Line::from(help_text(tui.focus(app))).style(Style::default().fg(Color::DarkGray)),
        help_area,
    );
}

/// Key hints for whatever currently has the keyboard.
pub fn help_text(focus: Focus) -> &'static str {
    match focus {
        Focus::Confirm => " o Confirmer  n Annuler",
        Focus::Prompt => " Enter Valider  Esc Annuler",
        Focus::Form => " Tab/↑↓ Champ  ←→ Choix  Ctrl+S Enregistrer  Esc Fermer",
        Focus::Search => " Tab Type  ↑↓ Choisir  Enter Ouvrir  Esc Fermer",
        Focus::Dashboard => " Esc Fermer",
        Focus::Picker => " ↑↓ Choisir  Enter Ouvrir  Ctrl+F Rechercher  Ctrl+D Tableau de bord  Ctrl+C Quitter",
        Focus::Table => {
            " Esc Menu  ↑↓←→ Naviguer  Espace Sélection  s Trier  f Filtrer  / Chercher  n Nouveau  e Modifier  d Supprimer  p Publier  x Archiver  E Exporter"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::action::{Action, EffectContext, perform, update};
    use crate::test_support::test_app;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn draw(app: &App, tui: &mut TuiState) -> String {
        let backend = TestBackend::new(140, 40);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw_ui(f, app, tui, 0)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    #[test]
    fn test_start_screen_is_the_picker() {
        let app = test_app();
        let mut tui = TuiState::new(&app);
        let text = draw(&app, &mut tui);
        assert!(text.contains("Portail | Bienvenue"));
        assert!(text.contains("Administration"));
        assert!(text.contains("Ctrl+F Rechercher"));
    }

    #[test]
    fn test_open_model_shows_table_and_form_overlay() {
        let mut app = test_app();
        update(&mut app, Action::OpenModel("news".into()));
        let mut tui = TuiState::new(&app);
        tui.picker = None;
        let text = draw(&app, &mut tui);
        assert!(text.contains("Portail · Actualités"));
        assert!(text.contains("Titre"));
        assert!(text.contains("Esc Menu"));

        update(&mut app, Action::NewRecord);
        tui.sync(&app);
        let text = draw(&app, &mut tui);
        assert!(text.contains("Nouveau : Actualité"));
        assert!(text.contains("Ctrl+S Enregistrer"));
    }

    #[test]
    fn test_loaded_page_shows_rows_and_stats() {
        let mut app = App::new(crate::test_support::demo_store());
        let effect = update(&mut app, Action::OpenModel("news".into()));
        let ctx = EffectContext::from_app(&app);
        for action in tokio_test::block_on(perform(effect, ctx)) {
            update(&mut app, action);
        }
        let mut tui = TuiState::new(&app);
        tui.picker = None;
        let text = draw(&app, &mut tui);
        assert!(text.contains("Lancement"));
        assert!(text.contains("Page 1"));
    }

    #[test]
    fn test_confirmation_is_on_top() {
        let mut app = test_app();
        update(&mut app, Action::OpenModel("news".into()));
        app.pending = Some(crate::core::action::Mutation::Delete("n1".into()));
        let mut tui = TuiState::new(&app);
        tui.picker = None;
        let text = draw(&app, &mut tui);
        assert!(text.contains("Supprimer cet élément ?"));
        assert!(text.contains("o Confirmer"));
    }
}
