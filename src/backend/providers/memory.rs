//! In-process store with the same filter/search/sort/range semantics as the
//! hosted backend. Backs the test-suite and `--demo` mode.
//!
//! Ordering follows PostgreSQL defaults: NULLs sort last ascending and first
//! descending, ties keep insertion order.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use serde_json::Value;

use crate::backend::store::{AuthProvider, AuthSession, AuthUser, DataStore, StoreError};
use crate::backend::types::{Filter, Query, Record, Selection, SortOrder, record_id, value_to_plain};

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Record>>>,
    failing_tables: Mutex<HashSet<String>>,
    accounts: Mutex<Vec<(AuthUser, String)>>,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends rows to a table as-is (no id generation).
    pub fn seed(&self, table: &str, rows: Vec<Record>) {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables.entry(table.to_string()).or_default().extend(rows);
    }

    /// Snapshot of a table's rows in insertion order.
    pub fn rows(&self, table: &str) -> Vec<Record> {
        let tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables.get(table).cloned().unwrap_or_default()
    }

    /// Every subsequent call touching `table` fails with HTTP 500.
    pub fn fail_table(&self, table: &str) {
        let mut failing = self.failing_tables.lock().unwrap_or_else(|e| e.into_inner());
        failing.insert(table.to_string());
    }

    /// Registers an account for `sign_in`.
    pub fn add_account(&self, id: &str, email: &str, password: &str) {
        let mut accounts = self.accounts.lock().unwrap_or_else(|e| e.into_inner());
        accounts.push((
            AuthUser {
                id: id.to_string(),
                email: email.to_string(),
            },
            password.to_string(),
        ));
    }

    /// Number of store calls issued so far (select/insert/update/delete).
    pub fn call_count(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    fn check(&self, table: &str) -> Result<(), StoreError> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        let failing = self.failing_tables.lock().unwrap_or_else(|e| e.into_inner());
        if failing.contains(table) {
            return Err(StoreError::Api {
                status: 500,
                message: format!("relation \"{table}\" is unavailable"),
            });
        }
        Ok(())
    }
}

/// Total order over JSON scalars, NULL greatest.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .unwrap_or_default()
            .partial_cmp(&y.as_f64().unwrap_or_default())
            .unwrap_or(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => value_to_plain(a).cmp(&value_to_plain(b)),
    }
}

fn loosely_equal(a: &Value, b: &Value) -> bool {
    a == b || (!a.is_null() && !b.is_null() && value_to_plain(a) == value_to_plain(b))
}

fn matches(record: &Record, filter: &Filter) -> bool {
    let field = |name: &str| record.get(name).unwrap_or(&Value::Null);
    match filter {
        Filter::Eq(col, v) => loosely_equal(field(col), v),
        Filter::Neq(col, v) => !loosely_equal(field(col), v),
        Filter::Gte(col, v) => {
            !field(col).is_null() && compare_values(field(col), v) != Ordering::Less
        }
        Filter::Lte(col, v) => {
            !field(col).is_null() && compare_values(field(col), v) != Ordering::Greater
        }
        Filter::In(col, values) => values.iter().any(|v| loosely_equal(field(col), v)),
        Filter::Search { columns, term } => {
            let needle = term.to_lowercase();
            columns
                .iter()
                .any(|c| value_to_plain(field(c)).to_lowercase().contains(&needle))
        }
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn select(&self, query: &Query) -> Result<Selection, StoreError> {
        self.check(&query.table)?;
        let tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        let mut rows: Vec<Record> = tables
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|r| query.filters.iter().all(|f| matches(r, f)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(tables);

        if let Some((column, order)) = &query.order {
            rows.sort_by(|a, b| {
                let a = a.get(column).unwrap_or(&Value::Null);
                let b = b.get(column).unwrap_or(&Value::Null);
                match order {
                    SortOrder::Asc => compare_values(a, b),
                    SortOrder::Desc => compare_values(b, a),
                }
            });
        }

        let total = rows.len();
        if query.head {
            return Ok(Selection { rows: Vec::new(), total });
        }
        if let Some(range) = query.range {
            let take = range.to.saturating_sub(range.from) + 1;
            rows = rows.into_iter().skip(range.from).take(take).collect();
        }
        debug!("memory select {}: {} of {}", query.table, rows.len(), total);
        Ok(Selection { rows, total })
    }

    async fn insert(&self, table: &str, mut record: Record) -> Result<Record, StoreError> {
        self.check(table)?;
        let id = record_id(&record).unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        record.insert("id".into(), Value::String(id.clone()));
        record
            .entry("created_at")
            .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));

        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        let rows = tables.entry(table.to_string()).or_default();
        if rows.iter().any(|r| record_id(r).as_deref() == Some(id.as_str())) {
            return Err(StoreError::Api {
                status: 409,
                message: format!("duplicate key value violates unique constraint \"{table}_pkey\""),
            });
        }
        rows.push(record.clone());
        Ok(record)
    }

    async fn update(&self, table: &str, id: &str, patch: Record) -> Result<Record, StoreError> {
        self.check(table)?;
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        let row = tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|r| record_id(r).as_deref() == Some(id)))
            .ok_or_else(|| StoreError::NotFound {
                table: table.to_string(),
                id: id.to_string(),
            })?;
        for (key, value) in patch {
            if key != "id" {
                row.insert(key, value);
            }
        }
        Ok(row.clone())
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError> {
        self.check(table)?;
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        let rows = tables.get_mut(table).ok_or_else(|| StoreError::NotFound {
            table: table.to_string(),
            id: id.to_string(),
        })?;
        let before = rows.len();
        rows.retain(|r| record_id(r).as_deref() != Some(id));
        if rows.len() == before {
            return Err(StoreError::NotFound {
                table: table.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for MemoryStore {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, StoreError> {
        let accounts = self.accounts.lock().unwrap_or_else(|e| e.into_inner());
        accounts
            .iter()
            .find(|(user, pw)| user.email.eq_ignore_ascii_case(email) && pw == password)
            .map(|(user, _)| AuthSession {
                access_token: format!("memory-{}", user.id),
                user_id: user.id.clone(),
                email: user.email.clone(),
            })
            .ok_or_else(|| StoreError::Unauthorized("Invalid login credentials".into()))
    }

    async fn sign_out(&self, _session: &AuthSession) -> Result<(), StoreError> {
        Ok(())
    }

    async fn current_user(&self, session: &AuthSession) -> Result<AuthUser, StoreError> {
        let accounts = self.accounts.lock().unwrap_or_else(|e| e.into_inner());
        accounts
            .iter()
            .find(|(user, _)| user.id == session.user_id)
            .map(|(user, _)| user.clone())
            .ok_or_else(|| StoreError::Unauthorized("session expired".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::rec;
    use serde_json::json;

    fn store_with_news() -> MemoryStore {
        let store = MemoryStore::new();
        store.seed(
            "news",
            vec![
                rec(json!({"id": "1", "title": "Budget 2024", "published_at": "2024-01-05", "status": "published"})),
                rec(json!({"id": "2", "title": "Nouveau port", "published_at": "2024-01-10", "status": "draft"})),
                rec(json!({"id": "3", "title": "Budget rectificatif", "published_at": null, "status": "published"})),
            ],
        );
        store
    }

    #[tokio::test]
    async fn test_select_filters_sorts_and_counts() {
        let store = store_with_news();
        let q = Query::table("news")
            .eq("status", "published")
            .order("published_at", SortOrder::Desc);
        let sel = store.select(&q).await.unwrap();
        assert_eq!(sel.total, 2);
        // NULL first when descending
        assert_eq!(record_id(&sel.rows[0]).as_deref(), Some("3"));
        assert_eq!(record_id(&sel.rows[1]).as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_or() {
        let store = store_with_news();
        let q = Query::table("news").search(&["title".into(), "excerpt".into()], "BUDGET");
        let sel = store.select(&q).await.unwrap();
        assert_eq!(sel.total, 2);
    }

    #[tokio::test]
    async fn test_range_keeps_total() {
        let store = store_with_news();
        let sel = store.select(&Query::table("news").range(1, 1)).await.unwrap();
        assert_eq!(sel.rows.len(), 1);
        assert_eq!(sel.total, 3);
        assert_eq!(record_id(&sel.rows[0]).as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_gte_skips_nulls() {
        let store = store_with_news();
        let q = Query::table("news").filter(Filter::Gte("published_at".into(), json!("2024-01-06")));
        let sel = store.select(&q).await.unwrap();
        assert_eq!(sel.total, 1);
    }

    #[tokio::test]
    async fn test_insert_generates_id_and_rejects_duplicates() {
        let store = MemoryStore::new();
        let created = store.insert("news", rec(json!({"title": "x"}))).await.unwrap();
        let id = record_id(&created).unwrap();
        assert!(created.contains_key("created_at"));

        let dup = store.insert("news", rec(json!({"id": id, "title": "y"}))).await;
        assert!(matches!(dup, Err(StoreError::Api { status: 409, .. })));
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_row() {
        let store = store_with_news();
        let err = store.update("news", "nope", Record::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        let err = store.delete("news", "nope").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));

        let updated = store
            .update("news", "2", rec(json!({"status": "published"})))
            .await
            .unwrap();
        assert_eq!(updated["status"], json!("published"));
        assert_eq!(updated["title"], json!("Nouveau port"));
    }

    #[tokio::test]
    async fn test_failing_table() {
        let store = store_with_news();
        store.fail_table("news");
        let err = store.select(&Query::table("news")).await.unwrap_err();
        assert!(matches!(err, StoreError::Api { status: 500, .. }));
        assert_eq!(store.call_count(), 1);
    }

    #[tokio::test]
    async fn test_sign_in() {
        let store = MemoryStore::new();
        store.add_account("u1", "admin@ministere.gov", "secret");
        let session = store.sign_in("ADMIN@ministere.gov", "secret").await.unwrap();
        assert_eq!(session.user_id, "u1");
        assert!(store.sign_in("admin@ministere.gov", "wrong").await.is_err());
        let user = store.current_user(&session).await.unwrap();
        assert_eq!(user.email, "admin@ministere.gov");
    }
}
