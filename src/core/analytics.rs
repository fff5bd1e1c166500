//! Dashboard figures: row counts per collection and the most searched terms.

use std::collections::HashMap;

use futures::future::join_all;
use log::warn;

use crate::backend::{DataStore, Query, SortOrder, StoreError, value_to_plain};
use crate::core::model::ModelConfig;

const RECENT_SEARCHES: usize = 500;
const TOP_TERMS: usize = 10;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dashboard {
    /// `(label, count)`; `None` when that collection could not be counted.
    pub counts: Vec<(String, Option<usize>)>,
    pub top_terms: Vec<(String, usize)>,
}

pub async fn collection_counts(
    store: &dyn DataStore,
    models: &[ModelConfig],
) -> Vec<(String, Option<usize>)> {
    let results = join_all(models.iter().map(|m| async move {
        store.select(&Query::table(&m.table).head()).await
    }))
    .await;
    models
        .iter()
        .zip(results)
        .map(|(m, result)| {
            let count = result
                .map_err(|e| warn!("count {} failed: {}", m.table, e))
                .ok()
                .map(|s| s.total);
            (m.label_plural.clone(), count)
        })
        .collect()
}

/// Most frequent terms among the latest search log entries, compared
/// case-insensitively. Ties are broken alphabetically.
pub async fn top_search_terms(store: &dyn DataStore) -> Result<Vec<(String, usize)>, StoreError> {
    let query = Query::table("search_logs")
        .order("created_at", SortOrder::Desc)
        .limit(RECENT_SEARCHES);
    let selection = store.select(&query).await?;

    let mut counts: HashMap<String, usize> = HashMap::new();
    for row in &selection.rows {
        let term = row
            .get("query")
            .map(value_to_plain)
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        if !term.is_empty() {
            *counts.entry(term).or_default() += 1;
        }
    }
    let mut terms: Vec<_> = counts.into_iter().collect();
    terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    terms.truncate(TOP_TERMS);
    Ok(terms)
}

pub async fn load(store: &dyn DataStore, models: &[ModelConfig]) -> Dashboard {
    let (counts, top_terms) = futures::join!(
        collection_counts(store, models),
        top_search_terms(store)
    );
    Dashboard {
        counts,
        top_terms: top_terms
            .map_err(|e| warn!("search log summary failed: {}", e))
            .unwrap_or_default(),
    }
}
