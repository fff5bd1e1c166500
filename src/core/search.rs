//! # Site-wide Search
//!
//! Fans one query out to the six public collections in parallel, tags each
//! hit with its content type and merges everything into one list, most
//! recent first.
//!
//! ```text
//!             ┌─► news ─────────┐
//!             ├─► projects ─────┤
//!   query ────┼─► tenders ──────┼──► tag ──► merge (created_at desc) ──► tabs
//!             ├─► careers ──────┤
//!             ├─► events ───────┤
//!             └─► publications ─┘
//! ```

use std::sync::Arc;

use futures::future::join_all;
use log::{debug, info, warn};
use serde_json::json;

use crate::backend::{DataStore, Query, Record, SortOrder, record_id, value_to_plain};
use crate::core::format;

pub const DEFAULT_PER_COLLECTION: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContentType {
    News,
    Project,
    Tender,
    Career,
    Event,
    Publication,
}

impl ContentType {
    pub const ALL: [ContentType; 6] = [
        ContentType::News,
        ContentType::Project,
        ContentType::Tender,
        ContentType::Career,
        ContentType::Event,
        ContentType::Publication,
    ];

    pub fn table(self) -> &'static str {
        match self {
            ContentType::News => "news",
            ContentType::Project => "projects",
            ContentType::Tender => "tenders",
            ContentType::Career => "careers",
            ContentType::Event => "events",
            ContentType::Publication => "publications",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ContentType::News => "Actualités",
            ContentType::Project => "Projets",
            ContentType::Tender => "Appels d'offres",
            ContentType::Career => "Carrières",
            ContentType::Event => "Événements",
            ContentType::Publication => "Publications",
        }
    }

    /// Column holding the short summary shown under the title.
    fn summary_column(self) -> &'static str {
        match self {
            ContentType::News => "excerpt",
            _ => "description",
        }
    }

    fn search_columns(self) -> Vec<String> {
        vec!["title".to_string(), self.summary_column().to_string()]
    }

    /// Accepts the table name or the singular (`news`, `project`, `tenders`).
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.table() == name || t.table().trim_end_matches('s') == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub content_type: ContentType,
    pub id: String,
    pub title: String,
    pub summary: String,
    pub created_at: String,
}

impl SearchHit {
    fn from_record(content_type: ContentType, record: &Record) -> Self {
        let text = |key: &str| record.get(key).map(value_to_plain).unwrap_or_default();
        Self {
            content_type,
            id: record_id(record).unwrap_or_default(),
            title: text("title"),
            summary: format::truncate(&format::strip_tags(&text(content_type.summary_column())), 120),
            created_at: text("created_at"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub query: String,
    pub hits: Vec<SearchHit>,
}

impl SearchResults {
    /// "Tous" first, then one tab per content type that has hits.
    pub fn tabs(&self) -> Vec<(Option<ContentType>, usize)> {
        let mut tabs = vec![(None, self.hits.len())];
        for ty in ContentType::ALL {
            let count = self.hits.iter().filter(|h| h.content_type == ty).count();
            if count > 0 {
                tabs.push((Some(ty), count));
            }
        }
        tabs
    }

    pub fn types(&self) -> Vec<ContentType> {
        self.tabs().into_iter().filter_map(|(ty, _)| ty).collect()
    }

    pub fn filtered(&self, tab: Option<ContentType>) -> Vec<&SearchHit> {
        self.hits
            .iter()
            .filter(|h| tab.is_none_or(|ty| h.content_type == ty))
            .collect()
    }
}

#[derive(Clone)]
pub struct SearchService {
    store: Arc<dyn DataStore>,
    per_collection: usize,
    log_searches: bool,
}

impl SearchService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self {
            store,
            per_collection: DEFAULT_PER_COLLECTION,
            log_searches: true,
        }
    }

    pub fn with_limit(mut self, per_collection: usize) -> Self {
        self.per_collection = per_collection.max(1);
        self
    }

    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.log_searches = enabled;
        self
    }

    /// A blank query returns no results without touching the store. A
    /// collection that fails contributes nothing.
    pub async fn search(&self, query: &str, only: Option<ContentType>) -> SearchResults {
        let term = query.trim();
        if term.is_empty() {
            return SearchResults::default();
        }

        let types: Vec<ContentType> = match only {
            Some(ty) => vec![ty],
            None => ContentType::ALL.to_vec(),
        };
        let requests = types.iter().map(|&ty| {
            let query = Query::table(ty.table())
                .search(&ty.search_columns(), term)
                .order("created_at", SortOrder::Desc)
                .limit(self.per_collection);
            let store = self.store.clone();
            async move { (ty, store.select(&query).await) }
        });

        let mut hits = Vec::new();
        for (ty, result) in join_all(requests).await {
            match result {
                Ok(selection) => {
                    debug!("search {}: {} hits", ty.table(), selection.rows.len());
                    hits.extend(selection.rows.iter().map(|r| SearchHit::from_record(ty, r)));
                }
                Err(e) => warn!("search {} failed: {}", ty.table(), e),
            }
        }
        // Stable, so equal timestamps keep collection order.
        hits.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        info!("search '{}': {} hits", term, hits.len());
        self.log(term, only, hits.len());

        SearchResults {
            query: term.to_string(),
            hits,
        }
    }

    fn log(&self, term: &str, only: Option<ContentType>, count: usize) {
        if !self.log_searches {
            return;
        }
        let mut entry = Record::new();
        entry.insert("query".into(), json!(term));
        entry.insert("content_type".into(), json!(only.map(ContentType::table)));
        entry.insert("results_count".into(), json!(count));
        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(e) = store.insert("search_logs", entry).await {
                debug!("search log write failed (ignored): {}", e);
            }
        });
    }
}
