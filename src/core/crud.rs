//! # Generic CRUD Service
//!
//! Turns a model's `ListOptions` into store queries and passes mutations
//! through. The service adds no retries and no rollback: bulk operations
//! attempt every id in order and report the ids that failed.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use serde_json::{Value, json};

use crate::backend::{DataStore, Filter, Query, Record, SortOrder, StoreError, record_id};
use crate::core::export;
use crate::core::form::{FormErrors, FormSchema};
use crate::core::model::{BulkAction, ModelConfig};

/// Rows above this are never fetched by a single export.
pub const DEFAULT_EXPORT_LIMIT: usize = 10_000;

// ============================================================================
// Error Type
// ============================================================================

/// Ids that went through and ids that did not, for a bulk operation.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkFailure {
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, StoreError)>,
}

impl BulkFailure {
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CrudError {
    Store(StoreError),
    Validation(FormErrors),
    Bulk(BulkFailure),
    Export(String),
    Import(String),
}

impl fmt::Display for CrudError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrudError::Store(e) => write!(f, "{e}"),
            CrudError::Validation(errors) => write!(f, "validation failed: {errors}"),
            CrudError::Bulk(failure) => write!(
                f,
                "{} of {} operations failed",
                failure.failed.len(),
                failure.attempted()
            ),
            CrudError::Export(msg) => write!(f, "export error: {msg}"),
            CrudError::Import(msg) => write!(f, "import error: {msg}"),
        }
    }
}

impl std::error::Error for CrudError {}

impl From<StoreError> for CrudError {
    fn from(e: StoreError) -> Self {
        CrudError::Store(e)
    }
}

impl CrudError {
    /// Generic toast text: `"de la suppression"` gives "Erreur lors de la
    /// suppression". Bulk failures say how many ids failed.
    pub fn user_message(&self, action: &str) -> String {
        match self {
            CrudError::Validation(errors) => {
                format!("Formulaire invalide ({} champ(s) à corriger)", errors.len())
            }
            CrudError::Bulk(failure) => format!(
                "Erreur lors {action} : {} sur {} en échec",
                failure.failed.len(),
                failure.attempted()
            ),
            _ => format!("Erreur lors {action}"),
        }
    }
}

// ============================================================================
// List Options / Page
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ListOptions {
    pub page: usize,
    pub limit: usize,
    /// `None` falls back to the model's default sort.
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
    pub search: String,
    /// Equality filters. Empty values mean "all" and are skipped.
    pub filters: BTreeMap<String, Value>,
}

impl ListOptions {
    pub fn for_model(model: &ModelConfig) -> Self {
        Self {
            page: 1,
            limit: model.page_size,
            sort_by: Some(model.default_sort.0.clone()),
            sort_order: model.default_sort.1,
            search: String::new(),
            filters: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub data: Vec<Record>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Page {
    pub fn ids(&self) -> Vec<String> {
        self.data.iter().filter_map(record_id).collect()
    }
}

/// Rows created by an import and the rows that were rejected (1-based data
/// row numbers, header excluded).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub created: usize,
    pub failed: Vec<(usize, String)>,
    pub ignored_columns: Vec<String>,
}

/// Writes one `audit_logs` row per successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditTrail {
    pub user_id: String,
}

fn equality_filters(filters: &BTreeMap<String, Value>) -> impl Iterator<Item = Filter> + '_ {
    filters
        .iter()
        .filter(|(_, v)| !v.is_null() && v.as_str() != Some(""))
        .map(|(k, v)| Filter::Eq(k.clone(), v.clone()))
}

// ============================================================================
// Service
// ============================================================================

#[derive(Clone)]
pub struct CrudService {
    store: Arc<dyn DataStore>,
    model: Arc<ModelConfig>,
    export_limit: usize,
    audit: Option<AuditTrail>,
}

impl CrudService {
    pub fn new(store: Arc<dyn DataStore>, model: Arc<ModelConfig>) -> Self {
        Self {
            store,
            model,
            export_limit: DEFAULT_EXPORT_LIMIT,
            audit: None,
        }
    }

    pub fn with_export_limit(mut self, limit: usize) -> Self {
        self.export_limit = limit.max(1);
        self
    }

    pub fn with_audit(mut self, audit: AuditTrail) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn model(&self) -> &ModelConfig {
        &self.model
    }

    pub fn store(&self) -> Arc<dyn DataStore> {
        self.store.clone()
    }

    fn table(&self) -> &str {
        &self.model.table
    }

    /// One page of rows for the given options.
    pub async fn list(&self, options: &ListOptions) -> Result<Page, CrudError> {
        let paginate = self.model.features.pagination;
        let page = if paginate { options.page.max(1) } else { 1 };
        let limit = options.limit.max(1);

        let mut query = Query::table(self.table());
        for filter in equality_filters(&options.filters) {
            query = query.filter(filter);
        }
        if self.model.features.search {
            query = query.search(&self.model.search_fields, &options.search);
        }
        let (default_field, default_order) = &self.model.default_sort;
        query = match &options.sort_by {
            Some(field) => query.order(field.clone(), options.sort_order),
            None => query.order(default_field.clone(), *default_order),
        };
        if paginate {
            let from = (page - 1) * limit;
            query = query.range(from, from + limit - 1);
        }

        let selection = self.store.select(&query).await?;
        let limit = if paginate { limit } else { selection.total.max(1) };
        let total_pages = selection.total.div_ceil(limit);
        debug!(
            "list {}: page {}/{} ({} rows, total {})",
            self.model.name,
            page,
            total_pages,
            selection.rows.len(),
            selection.total
        );

        Ok(Page {
            data: selection.rows,
            total: selection.total,
            page,
            limit,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        })
    }

    /// Number of rows matching the equality filters.
    pub async fn count(&self, filters: &BTreeMap<String, Value>) -> Result<usize, CrudError> {
        let mut query = Query::table(self.table()).head();
        for filter in equality_filters(filters) {
            query = query.filter(filter);
        }
        Ok(self.store.select(&query).await?.total)
    }

    pub async fn get(&self, id: &str) -> Result<Record, CrudError> {
        let query = Query::table(self.table()).eq("id", id).limit(1);
        self.store
            .select(&query)
            .await?
            .rows
            .into_iter()
            .next()
            .ok_or_else(|| {
                CrudError::Store(StoreError::NotFound {
                    table: self.table().to_string(),
                    id: id.to_string(),
                })
            })
    }

    pub async fn create(&self, data: Record) -> Result<Record, CrudError> {
        let created = self.store.insert(self.table(), data).await?;
        self.audit("create", record_id(&created).as_deref().unwrap_or("")).await;
        Ok(created)
    }

    pub async fn update(&self, id: &str, data: Record) -> Result<Record, CrudError> {
        let updated = self.store.update(self.table(), id, data).await?;
        self.audit("update", id).await;
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<(), CrudError> {
        self.store.delete(self.table(), id).await?;
        self.audit("delete", id).await;
        Ok(())
    }

    /// Applies `patch` to each id in turn. No rollback.
    pub async fn bulk_update(&self, ids: &[String], patch: &Record) -> Result<(), CrudError> {
        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        for id in ids {
            match self.update(id, patch.clone()).await {
                Ok(_) => succeeded.push(id.clone()),
                Err(CrudError::Store(e)) => failed.push((id.clone(), e)),
                Err(e) => failed.push((id.clone(), StoreError::Parse(e.to_string()))),
            }
        }
        Self::bulk_outcome("bulk_update", succeeded, failed)
    }

    /// Deletes each id in turn. No rollback.
    pub async fn bulk_delete(&self, ids: &[String]) -> Result<(), CrudError> {
        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        for id in ids {
            match self.delete(id).await {
                Ok(()) => succeeded.push(id.clone()),
                Err(CrudError::Store(e)) => failed.push((id.clone(), e)),
                Err(e) => failed.push((id.clone(), StoreError::Parse(e.to_string()))),
            }
        }
        Self::bulk_outcome("bulk_delete", succeeded, failed)
    }

    fn bulk_outcome(
        op: &str,
        succeeded: Vec<String>,
        failed: Vec<(String, StoreError)>,
    ) -> Result<(), CrudError> {
        if failed.is_empty() {
            info!("{}: {} ids", op, succeeded.len());
            return Ok(());
        }
        warn!(
            "{}: {} of {} failed",
            op,
            failed.len(),
            failed.len() + succeeded.len()
        );
        Err(CrudError::Bulk(BulkFailure { succeeded, failed }))
    }

    pub async fn bulk_action(&self, action: BulkAction, ids: &[String]) -> Result<(), CrudError> {
        let status_field = self.model.status_field.as_deref().unwrap_or("status");
        match action.patch(status_field) {
            Some(patch) => self.bulk_update(ids, &patch).await,
            None => self.bulk_delete(ids).await,
        }
    }

    /// Copies a row: drops id and timestamps, suffixes the title, resets the
    /// status to draft when the model has one.
    pub async fn duplicate(&self, id: &str) -> Result<Record, CrudError> {
        let mut copy = self.get(id).await?;
        for key in ["id", "created_at", "updated_at"] {
            copy.remove(key);
        }
        if let Some(title_field) = &self.model.title_field
            && let Some(Value::String(title)) = copy.get_mut(title_field)
        {
            title.push_str(" (copie)");
        }
        if let Some(status) = self.model.status()
            && status.kind.options().iter().any(|o| o.value == "draft")
        {
            copy.insert(status.name.clone(), json!("draft"));
        }
        self.create(copy).await
    }

    /// CSV of every row matching `filters` (up to the export limit), header
    /// first. The whole result is held in memory.
    pub async fn export(&self, filters: &BTreeMap<String, Value>) -> Result<String, CrudError> {
        if !self.model.features.export {
            return Err(CrudError::Export(format!(
                "export disabled for {}",
                self.model.name
            )));
        }
        let options = ListOptions {
            page: 1,
            limit: self.export_limit,
            filters: filters.clone(),
            ..ListOptions::for_model(&self.model)
        };
        let page = self.list(&options).await?;
        info!("export {}: {} rows", self.model.name, page.data.len());
        export::to_csv(&self.model, &page.data)
    }

    /// Creates one row per CSV line. Rows failing validation or insertion
    /// are reported; earlier rows stay created.
    pub async fn import(&self, csv_text: &str) -> Result<ImportReport, CrudError> {
        if !self.model.features.import {
            return Err(CrudError::Import(format!(
                "import disabled for {}",
                self.model.name
            )));
        }
        let parsed = export::parse_csv(&self.model, csv_text)?;
        let schema = FormSchema::from_model(&self.model);
        let mut report = ImportReport {
            ignored_columns: parsed.ignored_columns,
            ..ImportReport::default()
        };
        for (index, values) in parsed.rows.iter().enumerate() {
            let row_number = index + 1;
            let record = match schema.validate(values) {
                Ok(record) => record,
                Err(errors) => {
                    report.failed.push((row_number, errors.to_string()));
                    continue;
                }
            };
            match self.create(record).await {
                Ok(_) => report.created += 1,
                Err(e) => report.failed.push((row_number, e.to_string())),
            }
        }
        info!(
            "import {}: {} created, {} failed",
            self.model.name,
            report.created,
            report.failed.len()
        );
        Ok(report)
    }

    async fn audit(&self, action: &str, record_id: &str) {
        let Some(audit) = &self.audit else { return };
        if self.model.table == "audit_logs" {
            return;
        }
        let mut entry = Record::new();
        entry.insert("action".into(), json!(action));
        entry.insert("table_name".into(), json!(self.model.table));
        entry.insert("record_id".into(), json!(record_id));
        entry.insert("user_id".into(), json!(audit.user_id));
        entry.insert("created_at".into(), json!(Utc::now().to_rfc3339()));
        if let Err(e) = self.store.insert("audit_logs", entry).await {
            debug!("audit log write failed (ignored): {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryStore;
    use crate::core::catalog;
    use crate::test_support::rec;

    fn news_service(store: Arc<MemoryStore>) -> CrudService {
        CrudService::new(store, Arc::new(catalog::news()))
    }

    fn seeded(n: usize) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let rows = (0..n)
            .map(|i| {
                rec(json!({
                    "id": format!("n{i}"),
                    "title": format!("Actualité {i}"),
                    "status": if i % 2 == 0 { "published" } else { "draft" },
                    "published_at": format!("2024-01-{:02}", i + 1),
                }))
            })
            .collect();
        store.seed("news", rows);
        store
    }

    #[tokio::test]
    async fn test_list_returns_at_most_limit_and_page_math() {
        for (total, limit) in [(0, 3), (1, 3), (7, 3), (9, 3), (10, 1)] {
            let service = news_service(seeded(total));
            let options = ListOptions {
                limit,
                ..ListOptions::for_model(service.model())
            };
            let page = service.list(&options).await.unwrap();
            assert!(page.data.len() <= limit);
            assert_eq!(page.total, total);
            assert_eq!(page.total_pages, total.div_ceil(limit));
            assert_eq!(page.has_next, page.total_pages > 1);
            assert!(!page.has_prev);
        }
    }

    #[tokio::test]
    async fn test_news_sorted_by_published_at_desc() {
        let store = Arc::new(MemoryStore::new());
        store.seed(
            "news",
            vec![
                rec(json!({"id": "old", "title": "A", "published_at": "2024-01-05"})),
                rec(json!({"id": "new", "title": "B", "published_at": "2024-01-10"})),
            ],
        );
        let service = news_service(store);
        let options = ListOptions {
            page: 1,
            limit: 2,
            sort_by: Some("published_at".into()),
            sort_order: SortOrder::Desc,
            ..ListOptions::for_model(service.model())
        };
        let page = service.list(&options).await.unwrap();
        assert_eq!(page.ids(), vec!["new", "old"]);
        assert_eq!(page.total, 2);
        assert_eq!(page.total_pages, 1);
    }

    #[tokio::test]
    async fn test_list_filters_and_searches() {
        let service = news_service(seeded(6));
        let mut options = ListOptions::for_model(service.model());
        options.filters.insert("status".into(), json!("published"));
        let page = service.list(&options).await.unwrap();
        assert_eq!(page.total, 3);

        options.filters.insert("status".into(), json!(""));
        options.search = "actualité 4".into();
        let page = service.list(&options).await.unwrap();
        assert_eq!(page.ids(), vec!["n4"]);
    }

    #[tokio::test]
    async fn test_second_page_has_prev() {
        let service = news_service(seeded(5));
        let options = ListOptions {
            page: 2,
            limit: 2,
            ..ListOptions::for_model(service.model())
        };
        let page = service.list(&options).await.unwrap();
        assert!(page.has_prev);
        assert!(page.has_next);
        assert_eq!(page.data.len(), 2);
    }

    #[tokio::test]
    async fn test_unpaginated_model_returns_everything() {
        let store = Arc::new(MemoryStore::new());
        store.seed(
            "roles",
            (0..15).map(|i| rec(json!({"id": i.to_string(), "name": format!("r{i:02}")}))).collect(),
        );
        let service = CrudService::new(store, Arc::new(catalog::roles()));
        let page = service.list(&ListOptions::for_model(service.model())).await.unwrap();
        assert_eq!(page.data.len(), 15);
        assert_eq!(page.total_pages, 1);
    }

    #[tokio::test]
    async fn test_bulk_delete_with_missing_id_reports_failure() {
        let store = seeded(2);
        let service = news_service(store.clone());
        let ids = vec!["gone".to_string(), "n1".to_string()];
        let err = service.bulk_delete(&ids).await.unwrap_err();

        let CrudError::Bulk(failure) = &err else {
            panic!("expected bulk failure, got {err:?}");
        };
        assert_eq!(failure.succeeded, vec!["n1"]);
        assert_eq!(failure.failed.len(), 1);
        assert_eq!(failure.failed[0].0, "gone");
        assert_eq!(store.rows("news").len(), 1);
        assert_eq!(
            err.user_message("de la suppression"),
            "Erreur lors de la suppression : 1 sur 2 en échec"
        );
    }

    #[tokio::test]
    async fn test_bulk_publish_patches_status() {
        let store = seeded(4);
        let service = news_service(store.clone());
        service
            .bulk_action(BulkAction::Publish, &["n1".into(), "n3".into()])
            .await
            .unwrap();
        assert!(store.rows("news").iter().all(|r| r["status"] == json!("published")));
    }

    #[tokio::test]
    async fn test_duplicate_resets_status_and_suffixes_title() {
        let store = seeded(1);
        let service = news_service(store.clone());
        let copy = service.duplicate("n0").await.unwrap();
        assert_eq!(copy["title"], json!("Actualité 0 (copie)"));
        assert_eq!(copy["status"], json!("draft"));
        assert_ne!(record_id(&copy).as_deref(), Some("n0"));
        assert_eq!(store.rows("news").len(), 2);
    }

    #[tokio::test]
    async fn test_export_has_header_plus_one_line_per_row() {
        let service = news_service(seeded(4));
        let csv = service.export(&BTreeMap::new()).await.unwrap();
        assert_eq!(csv.lines().count(), 5);
        assert!(csv.lines().next().unwrap().starts_with("ID,Titre"));
    }

    #[tokio::test]
    async fn test_export_respects_limit() {
        let service = news_service(seeded(4)).with_export_limit(3);
        let csv = service.export(&BTreeMap::new()).await.unwrap();
        assert_eq!(csv.lines().count(), 4);
    }

    #[tokio::test]
    async fn test_import_reports_invalid_rows() {
        let store = Arc::new(MemoryStore::new());
        let service = CrudService::new(store.clone(), Arc::new(catalog::statistics()));
        let csv = "Libellé,value,Année,colonne\nPorts,12,2023,x\n,5,2023,y\nRoutes,abc,2024,z\n";
        let report = service.import(csv).await.unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.failed[0].0, 2);
        assert_eq!(report.ignored_columns, vec!["colonne"]);
        assert_eq!(store.rows("statistics")[0]["value"], json!(12));
    }

    #[tokio::test]
    async fn test_import_requires_the_feature() {
        let store = Arc::new(MemoryStore::new());
        let service = CrudService::new(store.clone(), Arc::new(catalog::partners()));
        let err = service.import("name\nPartenaire importé\n").await.unwrap_err();
        assert!(matches!(err, CrudError::Import(_)));
        assert!(store.rows("partners").is_empty());
    }

    #[tokio::test]
    async fn test_export_requires_the_feature() {
        let store = Arc::new(MemoryStore::new());
        store.seed("roles", vec![rec(json!({"id": "r1", "name": "admin"}))]);
        let service = CrudService::new(store.clone(), Arc::new(catalog::roles()));
        let err = service.export(&BTreeMap::new()).await.unwrap_err();
        assert_eq!(err, CrudError::Export("export disabled for roles".into()));
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_audit_trail_records_mutations() {
        let store = seeded(1);
        let service = news_service(store.clone()).with_audit(AuditTrail {
            user_id: "u1".into(),
        });
        service.delete("n0").await.unwrap();
        let logs = store.rows("audit_logs");
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0]["action"], json!("delete"));
        assert_eq!(logs[0]["table_name"], json!("news"));
    }

    #[tokio::test]
    async fn test_store_errors_pass_through() {
        let store = seeded(1);
        store.fail_table("news");
        let service = news_service(store);
        let err = service.list(&ListOptions::for_model(service.model())).await.unwrap_err();
        assert!(matches!(err, CrudError::Store(StoreError::Api { status: 500, .. })));
        assert_eq!(err.user_message("du chargement"), "Erreur lors du chargement");
    }

    #[tokio::test]
    async fn test_count_with_filters() {
        let service = news_service(seeded(5));
        let mut filters = BTreeMap::new();
        filters.insert("status".to_string(), json!("draft"));
        assert_eq!(service.count(&filters).await.unwrap(), 2);
        assert_eq!(service.count(&BTreeMap::new()).await.unwrap(), 5);
    }
}
