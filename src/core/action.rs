//! # Actions
//!
//! Everything that can happen in the console becomes an `Action`.
//! User presses `]`? That's `Action::NextPage`.
//! The store answers? That's `Action::PageLoaded { .. }`.
//!
//! The `update()` function takes the current state and an action, mutates
//! the state and returns an `Effect` describing the I/O to run next. No side
//! effects here. [`perform`] runs an effect against the store and yields the
//! follow-up action; the TUI spawns it on the runtime.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//!                                              │
//!                   Action  ◄──  perform()  ◄──┘
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::Utc;
use log::{debug, info, warn};
use serde_json::Value;

use crate::backend::{DataStore, Record};
use crate::core::analytics::{self, Dashboard};
use crate::core::crud::{CrudError, CrudService, Page};
use crate::core::form::FormMode;
use crate::core::model::{BulkAction, ModelConfig, RowAction};
use crate::core::pages::{AdminPage, StatCard, stat_cards};
use crate::core::search::{ContentType, SearchResults, SearchService};
use crate::core::state::{App, FormState};
use crate::core::table::ListRequest;

// ============================================================================
// Mutations
// ============================================================================

/// A change to one model's rows.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Create(Record),
    Update { id: String, record: Record },
    Delete(String),
    Duplicate(String),
    Bulk { action: BulkAction, ids: Vec<String> },
}

impl Mutation {
    /// Completes "Erreur lors ...".
    pub fn phrase(&self) -> &'static str {
        match self {
            Mutation::Create(_) | Mutation::Update { .. } => "de l'enregistrement",
            Mutation::Delete(_) => "de la suppression",
            Mutation::Duplicate(_) => "de la duplication",
            Mutation::Bulk { action: BulkAction::Delete, .. } => "de la suppression groupée",
            Mutation::Bulk { .. } => "de l'action groupée",
        }
    }

    pub fn is_bulk(&self) -> bool {
        matches!(self, Mutation::Bulk { .. })
    }

    /// Question shown before a destructive mutation runs.
    pub fn confirmation(&self) -> String {
        match self {
            Mutation::Delete(_) => "Supprimer cet élément ? Cette action est irréversible.".into(),
            Mutation::Bulk { ids, .. } => format!(
                "Supprimer {} élément(s) ? Cette action est irréversible.",
                ids.len()
            ),
            _ => "Confirmer ?".into(),
        }
    }

    /// Runs against the service; the `Ok` string is the success toast.
    pub async fn run(self, service: &CrudService) -> Result<String, CrudError> {
        match self {
            Mutation::Create(record) => {
                service.create(record).await?;
                Ok("Élément créé".into())
            }
            Mutation::Update { id, record } => {
                service.update(&id, record).await?;
                Ok("Modifications enregistrées".into())
            }
            Mutation::Delete(id) => {
                service.delete(&id).await?;
                Ok("Élément supprimé".into())
            }
            Mutation::Duplicate(id) => {
                service.duplicate(&id).await?;
                Ok("Élément dupliqué".into())
            }
            Mutation::Bulk { action, ids } => {
                service.bulk_action(action, &ids).await?;
                Ok(format!("{} : {} élément(s) traité(s)", action.label(), ids.len()))
            }
        }
    }
}

// ============================================================================
// Actions / Effects
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Quit,

    // Navigation
    OpenModel(String),
    // Results carry the id of the page they were fetched for.
    PageLoaded { page: u64, generation: u64, result: Result<Page, CrudError> },
    StatsLoaded { page: u64, result: Result<Vec<StatCard>, CrudError> },

    // Table
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    SortFocused,
    CycleFilter,
    ToggleSelect,
    SelectAll,
    NextPage,
    PrevPage,
    CycleTab,
    SearchInModel(String),
    Refresh,

    // Row and bulk actions
    Row(RowAction),
    Bulk(BulkAction),
    Confirm,
    Cancel,
    MutationDone { page: u64, mutation: Mutation, result: Result<String, CrudError> },

    // Form
    NewRecord,
    SetField { name: String, value: String },
    SubmitForm,
    CloseForm,

    // Export
    Export,
    ExportDone(Result<PathBuf, CrudError>),

    // Overlays
    GlobalSearch { query: String, only: Option<ContentType> },
    SearchDone(SearchResults),
    CloseSearch,
    OpenDashboard,
    DashboardLoaded(Dashboard),
    CloseDashboard,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    Quit,
    /// Fetch a page; `stats` also refreshes the stat cards.
    Load { request: ListRequest, stats: bool },
    Mutate(Mutation),
    Export(BTreeMap<String, Value>),
    Search { query: String, only: Option<ContentType> },
    LoadDashboard,
}

fn reload(page: &mut AdminPage, stats: bool) -> Effect {
    Effect::Load {
        request: page.table.request(),
        stats,
    }
}

fn refetch_if(page: &mut AdminPage, changed: bool) -> Effect {
    if changed { reload(page, false) } else { Effect::None }
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::Quit => Effect::Quit,

        Action::OpenModel(name) => {
            let Some(model) = app.models.iter().find(|m| m.name == name).cloned() else {
                app.status_message = format!("Modèle inconnu : {name}");
                return Effect::None;
            };
            info!("Opening model {}", model.name);
            let service = app.service_for(&model);
            app.pages_opened += 1;
            let mut page = AdminPage::new(service, app.page_size).with_id(app.pages_opened);
            let effect = reload(&mut page, true);
            app.status_message = model.label_plural.clone();
            app.page = Some(page);
            app.form = None;
            app.pending = None;
            effect
        }

        Action::PageLoaded { page, generation, result } => {
            if let Some(page) = open_page(&mut app.page, page)
                && page.table.receive(generation, result)
                && let Some(error) = &page.table.error
            {
                app.status_message = error.clone();
            }
            Effect::None
        }

        Action::StatsLoaded { page, result } => {
            if let Some(page) = open_page(&mut app.page, page) {
                match result {
                    Ok(cards) => page.stats = cards,
                    Err(e) => warn!("stat cards failed: {}", e),
                }
            }
            Effect::None
        }

        Action::MoveUp => with_page(app, |p| {
            p.table.move_up();
            Effect::None
        }),
        Action::MoveDown => with_page(app, |p| {
            p.table.move_down();
            Effect::None
        }),
        Action::MoveLeft => with_page(app, |p| {
            p.table.move_left();
            Effect::None
        }),
        Action::MoveRight => with_page(app, |p| {
            p.table.move_right();
            Effect::None
        }),
        Action::ToggleSelect => with_page(app, |p| {
            p.table.toggle_focused();
            Effect::None
        }),
        Action::SelectAll => with_page(app, |p| {
            p.table.select_all();
            Effect::None
        }),
        Action::SortFocused => with_page(app, |p| {
            let changed = p.table.sort_focused_column();
            refetch_if(p, changed)
        }),
        Action::CycleFilter => with_page(app, |p| {
            let changed = p.table.cycle_filter_focused();
            refetch_if(p, changed)
        }),
        Action::NextPage => with_page(app, |p| {
            let changed = p.table.next_page();
            refetch_if(p, changed)
        }),
        Action::PrevPage => with_page(app, |p| {
            let changed = p.table.prev_page();
            refetch_if(p, changed)
        }),
        Action::CycleTab => with_page(app, |p| {
            let changed = p.cycle_tab();
            refetch_if(p, changed)
        }),
        Action::SearchInModel(text) => with_page(app, |p| {
            let changed = p.table.set_search(text.trim());
            refetch_if(p, changed)
        }),
        Action::Refresh => with_page(app, |p| reload(p, true)),

        Action::Row(row_action) => row(app, row_action),

        Action::Bulk(bulk) => {
            let Some(page) = app.page.as_ref() else {
                return Effect::None;
            };
            let ids = page.table.selection();
            if ids.is_empty() {
                app.status_message = "Aucun élément sélectionné".into();
                return Effect::None;
            }
            if !page.model().bulk_actions.contains(&bulk) {
                app.status_message = "Action non disponible".into();
                return Effect::None;
            }
            let mutation = Mutation::Bulk { action: bulk, ids };
            if bulk == BulkAction::Delete {
                app.pending = Some(mutation);
                return Effect::None;
            }
            start(app, mutation)
        }

        Action::Confirm => match app.pending.take() {
            Some(mutation) => start(app, mutation),
            None => Effect::None,
        },

        Action::Cancel => {
            app.pending = None;
            Effect::None
        }

        Action::MutationDone { page, mutation, result } => {
            app.is_loading = false;
            let Some(page) = open_page(&mut app.page, page) else {
                // Page left while the change ran: only the toast is updated.
                app.status_message = match &result {
                    Ok(message) => message.clone(),
                    Err(e) => e.user_message(mutation.phrase()),
                };
                return Effect::None;
            };
            if mutation.is_bulk() {
                page.table.clear_selection();
            }
            match result {
                Ok(message) => {
                    info!("{}", message);
                    app.status_message = message;
                    app.form = None;
                }
                Err(CrudError::Validation(errors)) => {
                    app.status_message = CrudError::Validation(errors.clone()).user_message(mutation.phrase());
                    if let Some(form) = app.form.as_mut() {
                        form.errors = errors;
                    }
                    return Effect::None;
                }
                Err(e) => {
                    warn!("mutation failed: {}", e);
                    app.status_message = e.user_message(mutation.phrase());
                    // A failed single-row change leaves nothing to refresh.
                    if !mutation.is_bulk() {
                        return Effect::None;
                    }
                }
            }
            reload(page, true)
        }

        Action::NewRecord => {
            if let Some(model) = app.page.as_ref().map(|p| p.table.model().clone()) {
                app.form = Some(FormState::new(model, None));
            }
            Effect::None
        }

        Action::SetField { name, value } => {
            if let Some(form) = app.form.as_mut() {
                form.set(&name, value);
            }
            Effect::None
        }

        Action::SubmitForm => {
            if app.is_loading {
                return Effect::None;
            }
            let Some(form) = app.form.as_mut() else {
                return Effect::None;
            };
            if form.is_read_only() {
                app.status_message = "Aperçu en lecture seule".into();
                return Effect::None;
            }
            let Some(record) = form.validate() else {
                debug!("form invalid: {}", form.errors);
                app.status_message = format!("{} champ(s) à corriger", form.errors.len());
                return Effect::None;
            };
            let mutation = match &form.mode {
                FormMode::Create => Mutation::Create(record),
                FormMode::Edit(id) => Mutation::Update {
                    id: id.clone(),
                    record,
                },
                FormMode::Preview(_) => return Effect::None,
            };
            start(app, mutation)
        }

        Action::CloseForm => {
            app.form = None;
            Effect::None
        }

        Action::Export => {
            let Some(page) = app.page.as_ref() else {
                return Effect::None;
            };
            if !page.model().features.export {
                app.status_message = "Export non disponible".into();
                return Effect::None;
            }
            app.is_loading = true;
            app.status_message = "Export en cours…".into();
            Effect::Export(page.table.options.filters.clone())
        }

        Action::ExportDone(result) => {
            app.is_loading = false;
            app.status_message = match result {
                Ok(path) => format!("Export enregistré : {}", path.display()),
                Err(e) => {
                    warn!("export failed: {}", e);
                    e.user_message("de l'export")
                }
            };
            Effect::None
        }

        Action::GlobalSearch { query, only } => {
            if query.trim().is_empty() {
                app.search = Some(SearchResults::default());
                return Effect::None;
            }
            app.is_loading = true;
            Effect::Search { query, only }
        }

        Action::SearchDone(results) => {
            app.is_loading = false;
            app.status_message = format!("{} résultat(s) pour « {} »", results.hits.len(), results.query);
            app.search = Some(results);
            Effect::None
        }

        Action::CloseSearch => {
            app.search = None;
            Effect::None
        }

        Action::OpenDashboard => {
            app.is_loading = true;
            app.dashboard = Some(Dashboard::default());
            Effect::LoadDashboard
        }

        Action::DashboardLoaded(dashboard) => {
            app.is_loading = false;
            if app.dashboard.is_some() {
                app.dashboard = Some(dashboard);
            }
            Effect::None
        }

        Action::CloseDashboard => {
            app.dashboard = None;
            Effect::None
        }
    }
}

/// The open page, if it is the one with id `page`.
fn open_page(open: &mut Option<AdminPage>, page: u64) -> Option<&mut AdminPage> {
    match open.as_mut() {
        Some(current) if current.id == page => Some(current),
        Some(current) => {
            debug!("dropping result for page {} (open: {})", page, current.id);
            None
        }
        None => None,
    }
}

fn with_page(app: &mut App, f: impl FnOnce(&mut AdminPage) -> Effect) -> Effect {
    match app.page.as_mut() {
        Some(page) => f(page),
        None => Effect::None,
    }
}

fn start(app: &mut App, mutation: Mutation) -> Effect {
    app.is_loading = true;
    Effect::Mutate(mutation)
}

fn row(app: &mut App, action: RowAction) -> Effect {
    let Some(page) = app.page.as_ref() else {
        return Effect::None;
    };
    let model = page.model();
    if !model.supports(action) {
        app.status_message = format!("{} : action non disponible", action.label());
        return Effect::None;
    }
    let Some(record) = page.table.focused().cloned() else {
        return Effect::None;
    };
    let Some(id) = crate::backend::record_id(&record) else {
        return Effect::None;
    };

    match action {
        RowAction::Edit => {
            app.form = Some(FormState::new(page.table.model().clone(), Some(&record)));
            Effect::None
        }
        RowAction::Preview => {
            app.form = Some(FormState::preview(page.table.model().clone(), &record));
            Effect::None
        }
        RowAction::Delete => {
            app.pending = Some(Mutation::Delete(id));
            Effect::None
        }
        RowAction::Duplicate => start(app, Mutation::Duplicate(id)),
        RowAction::Publish | RowAction::Archive => {
            let bulk = if action == RowAction::Publish {
                BulkAction::Publish
            } else {
                BulkAction::Archive
            };
            let field = model.status_field.as_deref().unwrap_or("status");
            match bulk.patch(field) {
                Some(record) => start(app, Mutation::Update { id, record }),
                None => Effect::None,
            }
        }
    }
}

// ============================================================================
// Effect execution
// ============================================================================

/// What an effect needs to run, cloned out of `App` so it can move into a task.
#[derive(Clone)]
pub struct EffectContext {
    pub store: std::sync::Arc<dyn DataStore>,
    pub service: Option<CrudService>,
    /// Id of the page the effect was started from.
    pub page: u64,
    pub search: SearchService,
    pub models: Vec<ModelConfig>,
    pub export_dir: PathBuf,
}

impl EffectContext {
    pub fn from_app(app: &App) -> Self {
        Self {
            store: app.store.clone(),
            service: app.service(),
            page: app.page.as_ref().map_or(0, |p| p.id),
            search: app.search_service.clone(),
            models: app.models.clone(),
            export_dir: PathBuf::from("."),
        }
    }
}

/// Runs one effect and returns the actions reporting its outcome.
pub async fn perform(effect: Effect, ctx: EffectContext) -> Vec<Action> {
    match effect {
        Effect::None | Effect::Quit => Vec::new(),

        Effect::Load { request, stats } => {
            let Some(service) = ctx.service else {
                return Vec::new();
            };
            let mut actions = vec![Action::PageLoaded {
                page: ctx.page,
                generation: request.generation,
                result: service.list(&request.options).await,
            }];
            if stats {
                actions.push(Action::StatsLoaded {
                    page: ctx.page,
                    result: stat_cards(&service).await,
                });
            }
            actions
        }

        Effect::Mutate(mutation) => {
            let Some(service) = ctx.service else {
                return Vec::new();
            };
            let result = mutation.clone().run(&service).await;
            vec![Action::MutationDone {
                page: ctx.page,
                mutation,
                result,
            }]
        }

        Effect::Export(filters) => {
            let Some(service) = ctx.service else {
                return Vec::new();
            };
            let result = export_to_file(&service, &filters, &ctx.export_dir).await;
            vec![Action::ExportDone(result)]
        }

        Effect::Search { query, only } => {
            vec![Action::SearchDone(ctx.search.search(&query, only).await)]
        }

        Effect::LoadDashboard => {
            vec![Action::DashboardLoaded(
                analytics::load(ctx.store.as_ref(), &ctx.models).await,
            )]
        }
    }
}

async fn export_to_file(
    service: &CrudService,
    filters: &BTreeMap<String, Value>,
    dir: &std::path::Path,
) -> Result<PathBuf, CrudError> {
    let csv = service.export(filters).await?;
    let path = dir.join(format!(
        "{}-{}.csv",
        service.model().name,
        Utc::now().format("%Y%m%d-%H%M%S")
    ));
    tokio::fs::write(&path, csv)
        .await
        .map_err(|e| CrudError::Export(e.to_string()))?;
    info!("exported {} to {}", service.model().name, path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryStore;
    use crate::test_support::{demo_store, rec};
    use serde_json::json;
    use std::sync::Arc;

    /// Runs effects until the app settles, feeding results back through update.
    async fn drive(app: &mut App, effect: Effect) {
        let mut queue = vec![effect];
        while let Some(effect) = queue.pop() {
            if effect == Effect::None || effect == Effect::Quit {
                continue;
            }
            let mut ctx = EffectContext::from_app(app);
            ctx.export_dir = std::env::temp_dir();
            for action in perform(effect, ctx).await {
                queue.push(update(app, action));
            }
        }
    }

    fn demo_app() -> App {
        let mut app = App::new(demo_store());
        app.search_service = SearchService::new(app.store.clone()).with_logging(false);
        app
    }

    async fn open(app: &mut App, model: &str) {
        let effect = update(app, Action::OpenModel(model.into()));
        drive(app, effect).await;
    }

    #[tokio::test]
    async fn test_open_model_loads_page_and_stats() {
        let mut app = demo_app();
        open(&mut app, "news").await;
        let page = app.page.as_ref().unwrap();
        assert_eq!(page.table.page.total, 5);
        assert!(!page.table.loading);
        assert_eq!(page.stats[0].value, 5);
        assert_eq!(page.stats.len(), 4);
    }

    #[tokio::test]
    async fn test_late_results_from_a_left_page_are_dropped() {
        let mut app = demo_app();
        let news_effect = update(&mut app, Action::OpenModel("news".into()));
        let news_ctx = EffectContext::from_app(&app);
        let projects_effect = update(&mut app, Action::OpenModel("projects".into()));
        let projects_ctx = EffectContext::from_app(&app);

        for action in perform(projects_effect, projects_ctx).await {
            update(&mut app, action);
        }
        // The news fetch answers last
        for action in perform(news_effect, news_ctx).await {
            assert_eq!(update(&mut app, action), Effect::None);
        }

        let page = app.page.as_ref().unwrap();
        assert_eq!(page.model().name, "projects");
        assert_eq!(page.table.page.total, 4);
        assert!(page.table.page.ids().iter().all(|id| id.starts_with("proj-")));
        assert_eq!(page.stats[0].label, "Total projets");
        assert_eq!(page.stats[0].value, 4);
    }

    #[tokio::test]
    async fn test_mutation_done_after_leaving_the_page() {
        let store = demo_store();
        let mut app = App::new(store.clone());
        open(&mut app, "news").await;
        update(&mut app, Action::Row(RowAction::Delete));
        let delete = update(&mut app, Action::Confirm);
        let news_ctx = EffectContext::from_app(&app);

        open(&mut app, "partners").await;
        for action in perform(delete, news_ctx).await {
            assert_eq!(update(&mut app, action), Effect::None);
        }

        assert_eq!(store.rows("news").len(), 4);
        assert_eq!(app.status_message, "Élément supprimé");
        assert!(!app.is_loading);
        let page = app.page.as_ref().unwrap();
        assert_eq!(page.model().name, "partners");
        assert_eq!(page.table.page.total, 2);
    }

    #[tokio::test]
    async fn test_preview_never_mutates() {
        let mut app = demo_app();
        open(&mut app, "news").await;
        assert_eq!(update(&mut app, Action::Row(RowAction::Preview)), Effect::None);
        let form = app.form.as_ref().unwrap();
        assert!(matches!(form.mode, FormMode::Preview(_)));
        let title = form.value("title").to_string();

        update(&mut app, Action::SetField { name: "title".into(), value: "Autre".into() });
        assert_eq!(update(&mut app, Action::SubmitForm), Effect::None);
        assert_eq!(app.status_message, "Aperçu en lecture seule");
        assert_eq!(app.form.as_ref().unwrap().value("title"), title);
        assert!(!app.is_loading);
    }

    #[tokio::test]
    async fn test_unknown_model_is_reported() {
        let mut app = demo_app();
        assert_eq!(update(&mut app, Action::OpenModel("nope".into())), Effect::None);
        assert_eq!(app.status_message, "Modèle inconnu : nope");
    }

    #[tokio::test]
    async fn test_invalid_form_never_reaches_the_store() {
        let store = Arc::new(MemoryStore::new());
        let mut app = App::new(store.clone());
        open(&mut app, "news").await;
        let calls = store.call_count();

        update(&mut app, Action::NewRecord);
        let effect = update(&mut app, Action::SubmitForm);
        assert_eq!(effect, Effect::None);
        assert_eq!(store.call_count(), calls);
        let form = app.form.as_ref().unwrap();
        assert_eq!(form.errors.get("title"), Some("Titre est requis"));
    }

    #[tokio::test]
    async fn test_form_create_closes_and_reloads() {
        let mut app = demo_app();
        open(&mut app, "statistics").await;
        update(&mut app, Action::NewRecord);
        update(&mut app, Action::SetField { name: "label".into(), value: "Aéroports".into() });
        update(&mut app, Action::SetField { name: "value".into(), value: "19".into() });
        let effect = update(&mut app, Action::SubmitForm);
        assert!(matches!(effect, Effect::Mutate(Mutation::Create(_))));
        drive(&mut app, effect).await;

        assert!(app.form.is_none());
        assert_eq!(app.status_message, "Élément créé");
        assert_eq!(app.page.as_ref().unwrap().table.page.total, 3);
    }

    #[tokio::test]
    async fn test_delete_waits_for_confirmation() {
        let mut app = demo_app();
        open(&mut app, "partners").await;
        assert_eq!(update(&mut app, Action::Row(RowAction::Delete)), Effect::None);
        assert!(matches!(app.pending, Some(Mutation::Delete(_))));

        update(&mut app, Action::Cancel);
        assert!(app.pending.is_none());

        update(&mut app, Action::Row(RowAction::Delete));
        let effect = update(&mut app, Action::Confirm);
        drive(&mut app, effect).await;
        assert_eq!(app.page.as_ref().unwrap().table.page.total, 1);
        assert_eq!(app.status_message, "Élément supprimé");
    }

    #[tokio::test]
    async fn test_partial_bulk_delete_is_not_reported_as_success() {
        let store = Arc::new(MemoryStore::new());
        store.seed(
            "news",
            vec![rec(json!({"id": "a", "title": "A"})), rec(json!({"id": "b", "title": "B"}))],
        );
        let mut app = App::new(store.clone());
        open(&mut app, "news").await;
        {
            let table = &mut app.page.as_mut().unwrap().table;
            table.selected.insert("a".into());
            table.selected.insert("missing".into());
        }
        update(&mut app, Action::Bulk(BulkAction::Delete));
        let effect = update(&mut app, Action::Confirm);
        drive(&mut app, effect).await;

        assert_eq!(store.rows("news").len(), 1);
        assert_eq!(
            app.status_message,
            "Erreur lors de la suppression groupée : 1 sur 2 en échec"
        );
        let table = &app.page.as_ref().unwrap().table;
        assert!(table.selected.is_empty());
        assert_eq!(table.page.total, 1);
    }

    #[tokio::test]
    async fn test_bulk_without_selection() {
        let mut app = demo_app();
        open(&mut app, "news").await;
        assert_eq!(update(&mut app, Action::Bulk(BulkAction::Publish)), Effect::None);
        assert_eq!(app.status_message, "Aucun élément sélectionné");
    }

    #[tokio::test]
    async fn test_publish_focused_row() {
        let mut app = demo_app();
        open(&mut app, "news").await;
        update(&mut app, Action::SortFocused);
        // Sorted by title ascending: "Bilan 2022 ..." (archived) is first.
        let effect = update(&mut app, Action::Row(RowAction::Publish));
        drive(&mut app, effect).await;
        let first = &app.page.as_ref().unwrap().table.page.data[0];
        assert_eq!(first["status"], json!("published"));
    }

    #[tokio::test]
    async fn test_row_action_not_supported() {
        let mut app = demo_app();
        open(&mut app, "users").await;
        assert_eq!(update(&mut app, Action::Row(RowAction::Publish)), Effect::None);
        assert_eq!(app.status_message, "Publier : action non disponible");
    }

    #[tokio::test]
    async fn test_search_in_model_and_tab() {
        let mut app = demo_app();
        open(&mut app, "news").await;
        let effect = update(&mut app, Action::SearchInModel("port".into()));
        drive(&mut app, effect).await;
        // "transport" and "portuaires" match too
        assert_eq!(app.page.as_ref().unwrap().table.page.total, 4);

        let effect = update(&mut app, Action::CycleTab);
        drive(&mut app, effect).await;
        assert_eq!(app.page.as_ref().unwrap().table.filter_value("status"), Some("draft"));
        assert_eq!(app.page.as_ref().unwrap().table.page.total, 1);
    }

    #[tokio::test]
    async fn test_export_writes_csv_file() {
        let mut app = demo_app();
        open(&mut app, "tenders").await;
        let effect = update(&mut app, Action::Export);
        drive(&mut app, effect).await;
        assert!(app.status_message.starts_with("Export enregistré"));
        assert!(!app.is_loading);
    }

    #[tokio::test]
    async fn test_export_disabled_for_roles() {
        let mut app = demo_app();
        open(&mut app, "roles").await;
        assert_eq!(update(&mut app, Action::Export), Effect::None);
    }

    #[tokio::test]
    async fn test_global_search_and_dashboard() {
        let mut app = demo_app();
        let effect = update(
            &mut app,
            Action::GlobalSearch { query: "port".into(), only: None },
        );
        drive(&mut app, effect).await;
        let results = app.search.as_ref().unwrap();
        assert!(results.types().contains(&ContentType::News));

        let effect = update(&mut app, Action::OpenDashboard);
        drive(&mut app, effect).await;
        let dashboard = app.dashboard.as_ref().unwrap();
        assert_eq!(dashboard.counts.len(), 12);
        assert_eq!(dashboard.top_terms[0].0, "port");
    }

    #[test]
    fn test_quit() {
        let mut app = crate::test_support::test_app();
        assert_eq!(update(&mut app, Action::Quit), Effect::Quit);
    }
}
