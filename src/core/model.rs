//! # Model Configuration
//!
//! Declarative description of one entity type: its fields, default sort,
//! enabled features and row/bulk actions. Pure data. A `ModelConfig` is built
//! once per admin page and never mutated afterwards; the generic table, form
//! and CRUD service all read from it.
//!
//! ```text
//! ModelConfig ──► CrudService ──► TableState / FormSchema ──► AdminPage
//! ```

use serde_json::{Value, json};

use crate::backend::{Record, SortOrder};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Closed set of field kinds. Rendering and validation match on this
/// exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Url,
    Number,
    Date,
    Boolean,
    Select(Vec<SelectOption>),
    /// List of strings, edited as comma-separated text.
    Array,
    Textarea,
    /// HTML body.
    RichText,
}

impl FieldKind {
    pub fn options(&self) -> &[SelectOption] {
        match self {
            FieldKind::Select(options) => options,
            _ => &[],
        }
    }

    /// Label for a stored select value, falling back to the raw value.
    pub fn option_label<'a>(&'a self, value: &'a str) -> &'a str {
        self.options()
            .iter()
            .find(|o| o.value == value)
            .map(|o| o.label.as_str())
            .unwrap_or(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldConfig {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    pub show_in_list: bool,
    pub sortable: bool,
    pub filterable: bool,
    pub searchable: bool,
    pub placeholder: Option<String>,
}

impl FieldConfig {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            required: false,
            show_in_list: false,
            sortable: false,
            filterable: false,
            searchable: false,
            placeholder: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Shown as a column in the list view.
    pub fn listed(mut self) -> Self {
        self.show_in_list = true;
        self
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    pub fn placeholder(mut self, text: impl Into<String>) -> Self {
        self.placeholder = Some(text.into());
        self
    }
}

/// Optional features of the generic admin page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Features {
    pub search: bool,
    pub filters: bool,
    pub export: bool,
    pub import: bool,
    pub pagination: bool,
    pub bulk_actions: bool,
    pub duplicate: bool,
    pub preview: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            search: true,
            filters: true,
            export: true,
            import: false,
            pagination: true,
            bulk_actions: false,
            duplicate: false,
            preview: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Edit,
    Delete,
    Duplicate,
    Preview,
    Publish,
    Archive,
}

impl RowAction {
    pub fn label(self) -> &'static str {
        match self {
            RowAction::Edit => "Modifier",
            RowAction::Delete => "Supprimer",
            RowAction::Duplicate => "Dupliquer",
            RowAction::Preview => "Aperçu",
            RowAction::Publish => "Publier",
            RowAction::Archive => "Archiver",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    Publish,
    Archive,
    Delete,
}

impl BulkAction {
    pub fn label(self) -> &'static str {
        match self {
            BulkAction::Publish => "Publier",
            BulkAction::Archive => "Archiver",
            BulkAction::Delete => "Supprimer",
        }
    }

    /// Patch applied to every selected row, or `None` for deletion.
    pub fn patch(self, status_field: &str) -> Option<Record> {
        let status = match self {
            BulkAction::Publish => "published",
            BulkAction::Archive => "archived",
            BulkAction::Delete => return None,
        };
        let mut patch = Record::new();
        patch.insert(status_field.to_string(), json!(status));
        Some(patch)
    }
}

/// Rows per page for a model that does not set its own size.
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Logical model name (`news`, `projects`, ...).
    pub name: String,
    /// Backing collection in the hosted store.
    pub table: String,
    pub label: String,
    pub label_plural: String,
    pub fields: Vec<FieldConfig>,
    pub default_sort: (String, SortOrder),
    pub page_size: usize,
    pub features: Features,
    pub row_actions: Vec<RowAction>,
    pub bulk_actions: Vec<BulkAction>,
    /// Columns OR-matched by the search box.
    pub search_fields: Vec<String>,
    /// Select field driving tabs, stat cards and publish/archive.
    pub status_field: Option<String>,
    /// Field used as the human title (duplicate suffix, search hits).
    pub title_field: Option<String>,
}

impl ModelConfig {
    pub fn builder(name: impl Into<String>) -> ModelConfigBuilder {
        ModelConfigBuilder::new(name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldConfig> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn list_fields(&self) -> impl Iterator<Item = &FieldConfig> {
        self.fields.iter().filter(|f| f.show_in_list)
    }

    pub fn filterable_fields(&self) -> impl Iterator<Item = &FieldConfig> {
        self.fields.iter().filter(|f| f.filterable)
    }

    pub fn is_sortable(&self, name: &str) -> bool {
        self.field(name).is_some_and(|f| f.sortable)
    }

    /// Fields written to CSV exports. Rich-text bodies are left out.
    pub fn export_fields(&self) -> impl Iterator<Item = &FieldConfig> {
        self.fields
            .iter()
            .filter(|f| !matches!(f.kind, FieldKind::RichText))
    }

    pub fn status(&self) -> Option<&FieldConfig> {
        self.status_field.as_deref().and_then(|name| self.field(name))
    }

    pub fn supports(&self, action: RowAction) -> bool {
        let enabled = match action {
            RowAction::Duplicate => self.features.duplicate,
            RowAction::Preview => self.features.preview,
            RowAction::Publish | RowAction::Archive => self.status_field.is_some(),
            RowAction::Edit | RowAction::Delete => true,
        };
        enabled && self.row_actions.contains(&action)
    }

    /// Title of a record, or its id when the model has no title field.
    pub fn title_of(&self, record: &Record) -> String {
        self.title_field
            .as_deref()
            .and_then(|f| record.get(f))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| crate::backend::record_id(record))
            .unwrap_or_default()
    }
}

/// Fluent builder; the finished `ModelConfig` is immutable.
pub struct ModelConfigBuilder {
    config: ModelConfig,
}

impl ModelConfigBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            config: ModelConfig {
                table: name.clone(),
                label: name.clone(),
                label_plural: name.clone(),
                name,
                fields: Vec::new(),
                default_sort: ("created_at".to_string(), SortOrder::Desc),
                page_size: DEFAULT_PAGE_SIZE,
                features: Features::default(),
                row_actions: vec![RowAction::Edit, RowAction::Delete],
                bulk_actions: Vec::new(),
                search_fields: Vec::new(),
                status_field: None,
                title_field: None,
            },
        }
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.config.table = table.into();
        self
    }

    pub fn labels(mut self, singular: impl Into<String>, plural: impl Into<String>) -> Self {
        self.config.label = singular.into();
        self.config.label_plural = plural.into();
        self
    }

    pub fn field(mut self, field: FieldConfig) -> Self {
        self.config.fields.push(field);
        self
    }

    pub fn default_sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.config.default_sort = (field.into(), order);
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.config.page_size = size.max(1);
        self
    }

    pub fn features(mut self, features: Features) -> Self {
        self.config.features = features;
        self
    }

    pub fn row_actions(mut self, actions: Vec<RowAction>) -> Self {
        self.config.row_actions = actions;
        self
    }

    pub fn bulk_actions(mut self, actions: Vec<BulkAction>) -> Self {
        self.config.bulk_actions = actions;
        self
    }

    pub fn status_field(mut self, field: impl Into<String>) -> Self {
        self.config.status_field = Some(field.into());
        self
    }

    pub fn title_field(mut self, field: impl Into<String>) -> Self {
        self.config.title_field = Some(field.into());
        self
    }

    /// Explicit search columns. Without this, fields marked `searchable` are used.
    pub fn search_fields(mut self, fields: &[&str]) -> Self {
        self.config.search_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn build(mut self) -> ModelConfig {
        if self.config.search_fields.is_empty() {
            self.config.search_fields = self
                .config
                .fields
                .iter()
                .filter(|f| f.searchable)
                .map(|f| f.name.clone())
                .collect();
        }
        if !self.config.features.bulk_actions {
            self.config.bulk_actions.clear();
        }
        self.config
    }
}
