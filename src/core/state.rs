//! # Application State
//!
//! Core business state for the admin console. This module contains domain
//! logic only, no TUI-specific types. Presentation state (cursor in a
//! picker, focused form field) lives in the `tui` module.
//!
//! ```text
//! App
//! ├── store: Arc<dyn DataStore>     // hosted backend or memory store
//! ├── models: Vec<ModelConfig>      // catalog, menu order
//! ├── page: Option<AdminPage>       // open model: table, tabs, stat cards
//! ├── form: Option<FormState>       // create/edit overlay
//! ├── pending: Option<Mutation>     // destructive change awaiting confirmation
//! ├── search: Option<SearchResults> // global search overlay
//! ├── dashboard: Option<Dashboard>  // analytics overlay
//! ├── user: Option<AdminSession>    // signed-in, role-checked user
//! ├── pages_opened: u64             // id source for AdminPage
//! ├── status_message: String        // toast text
//! └── is_loading: bool              // a mutation or overlay fetch is in flight
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use std::sync::Arc;

use crate::backend::{DataStore, Record};
use crate::core::action::Mutation;
use crate::core::analytics::Dashboard;
use crate::core::auth::AdminSession;
use crate::core::catalog;
use crate::core::config::{DEFAULT_EXPORT_LIMIT, ResolvedConfig};
use crate::core::crud::{AuditTrail, CrudService};
use crate::core::form::{FormErrors, FormMode, FormSchema, FormValues, initial_values};
use crate::core::model::ModelConfig;
use crate::core::pages::AdminPage;
use crate::core::search::{SearchResults, SearchService};

/// Raw inputs, mode and last validation errors of the open form.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub model: Arc<ModelConfig>,
    pub mode: FormMode,
    pub values: FormValues,
    pub errors: FormErrors,
}

impl FormState {
    pub fn new(model: Arc<ModelConfig>, initial: Option<&Record>) -> Self {
        Self {
            mode: FormMode::from_initial(initial),
            values: initial_values(&model, initial),
            errors: FormErrors::default(),
            model,
        }
    }

    /// Read-only view of an existing row.
    pub fn preview(model: Arc<ModelConfig>, record: &Record) -> Self {
        let mut form = Self::new(model, Some(record));
        if let FormMode::Edit(id) = &form.mode {
            form.mode = FormMode::Preview(id.clone());
        }
        form
    }

    pub fn title(&self) -> String {
        match self.mode {
            FormMode::Create => format!("Nouveau : {}", self.model.label),
            FormMode::Edit(_) => format!("Modifier : {}", self.model.label),
            FormMode::Preview(_) => format!("Aperçu : {}", self.model.label),
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.mode.is_read_only()
    }

    /// Ignored on a read-only form.
    pub fn set(&mut self, field: &str, value: String) {
        if self.is_read_only() {
            return;
        }
        self.values.insert(field.to_string(), value);
    }

    pub fn value(&self, field: &str) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or("")
    }

    /// Validates the current inputs, keeping the errors for display.
    pub fn validate(&mut self) -> Option<Record> {
        match FormSchema::from_model(&self.model).validate(&self.values) {
            Ok(record) => {
                self.errors = FormErrors::default();
                Some(record)
            }
            Err(errors) => {
                self.errors = errors;
                None
            }
        }
    }
}

pub struct App {
    pub store: Arc<dyn DataStore>,
    pub models: Vec<ModelConfig>,
    pub page: Option<AdminPage>,
    pub form: Option<FormState>,
    pub pending: Option<Mutation>,
    pub search: Option<SearchResults>,
    pub dashboard: Option<Dashboard>,
    pub user: Option<AdminSession>,
    pub status_message: String,
    pub is_loading: bool,
    /// Overrides every model's page size when set.
    pub page_size: Option<usize>,
    /// Pages opened so far; the latest one's id is this count.
    pub pages_opened: u64,
    pub export_limit: usize,
    pub audit: bool,
    pub search_service: SearchService,
}

impl App {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self {
            search_service: SearchService::new(store.clone()),
            store,
            models: catalog::all(),
            page: None,
            form: None,
            pending: None,
            search: None,
            dashboard: None,
            user: None,
            status_message: String::from("Bienvenue dans l'administration du portail"),
            is_loading: false,
            page_size: None,
            pages_opened: 0,
            export_limit: DEFAULT_EXPORT_LIMIT,
            audit: false,
        }
    }

    pub fn from_config(
        store: Arc<dyn DataStore>,
        config: &ResolvedConfig,
        user: Option<AdminSession>,
    ) -> Self {
        let mut app = Self::new(store.clone());
        app.search_service = SearchService::new(store)
            .with_limit(config.per_collection_limit)
            .with_logging(config.log_searches);
        app.page_size = config.page_size;
        app.export_limit = config.export_limit;
        app.audit = config.audit;
        app.user = user;
        app
    }

    /// A service for `model`, carrying the audit trail when enabled.
    pub fn service_for(&self, model: &ModelConfig) -> CrudService {
        let service = CrudService::new(self.store.clone(), Arc::new(model.clone()))
            .with_export_limit(self.export_limit);
        match (&self.user, self.audit) {
            (Some(user), true) => service.with_audit(AuditTrail {
                user_id: user.user_id().to_string(),
            }),
            _ => service,
        }
    }

    pub fn service(&self) -> Option<CrudService> {
        self.page.as_ref().map(|p| p.service.clone())
    }

    pub fn has_overlay(&self) -> bool {
        self.form.is_some()
            || self.pending.is_some()
            || self.search.is_some()
            || self.dashboard.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{rec, test_app};
    use serde_json::json;

    #[test]
    fn test_app_new_defaults() {
        let app = test_app();
        assert_eq!(app.status_message, "Bienvenue dans l'administration du portail");
        assert!(!app.is_loading);
        assert!(app.page.is_none());
        assert_eq!(app.models.len(), 12);
    }

    #[test]
    fn test_form_state_modes() {
        let model = Arc::new(catalog::news());
        let form = FormState::new(model.clone(), None);
        assert_eq!(form.mode, FormMode::Create);
        assert_eq!(form.title(), "Nouveau : Actualité");

        let record = rec(json!({"id": "n1", "title": "T", "published_at": "2024-01-10T08:00:00Z"}));
        let form = FormState::new(model, Some(&record));
        assert_eq!(form.mode, FormMode::Edit("n1".into()));
        assert_eq!(form.value("published_at"), "2024-01-10");
    }

    #[test]
    fn test_preview_is_read_only() {
        let record = rec(json!({"id": "n1", "title": "Port"}));
        let mut form = FormState::preview(Arc::new(catalog::news()), &record);
        assert_eq!(form.mode, FormMode::Preview("n1".into()));
        assert_eq!(form.title(), "Aperçu : Actualité");
        form.set("title", "Autre".into());
        assert_eq!(form.value("title"), "Port");
    }

    #[test]
    fn test_form_state_keeps_errors() {
        let mut form = FormState::new(Arc::new(catalog::statistics()), None);
        assert!(form.validate().is_none());
        assert_eq!(form.errors.get("label"), Some("Libellé est requis"));
        form.set("label", "Ports".into());
        form.set("value", "3".into());
        assert!(form.validate().is_some());
        assert!(form.errors.is_empty());
    }
}
