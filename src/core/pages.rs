//! Per-model admin page: the list state plus the stat cards and status tabs
//! shown above it.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use serde_json::json;

use crate::core::crud::{CrudError, CrudService};
use crate::core::format::{Tone, tone_for};
use crate::core::model::ModelConfig;
use crate::core::table::TableState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCard {
    pub label: String,
    pub value: usize,
    pub tone: Tone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub label: String,
    /// Status value to filter on; `None` is "Tous".
    pub value: Option<String>,
}

pub fn tabs(model: &ModelConfig) -> Vec<Tab> {
    let mut tabs = vec![Tab {
        label: "Tous".to_string(),
        value: None,
    }];
    if let Some(status) = model.status() {
        tabs.extend(status.kind.options().iter().map(|o| Tab {
            label: o.label.clone(),
            value: Some(o.value.clone()),
        }));
    }
    tabs
}

/// Total, then one count per status value. Count-only queries, run in
/// parallel.
pub async fn stat_cards(service: &CrudService) -> Result<Vec<StatCard>, CrudError> {
    let model = service.model();
    let mut specs = vec![(format!("Total {}", model.label_plural.to_lowercase()), None)];
    if let Some(status) = model.status() {
        specs.extend(
            status
                .kind
                .options()
                .iter()
                .map(|o| (o.label.clone(), Some((status.name.clone(), o.value.clone())))),
        );
    }

    let counts = join_all(specs.iter().map(|(_, filter)| {
        let mut filters = BTreeMap::new();
        if let Some((field, value)) = filter {
            filters.insert(field.clone(), json!(value));
        }
        async move { service.count(&filters).await }
    }))
    .await;

    specs
        .into_iter()
        .zip(counts)
        .map(|((label, filter), count)| {
            Ok(StatCard {
                label,
                value: count?,
                tone: filter.map_or(Tone::Info, |(_, v)| tone_for(&v)),
            })
        })
        .collect()
}

pub struct AdminPage {
    /// Distinguishes this opening of the page from earlier ones, so results
    /// fetched for a previous page are never applied to this one.
    pub id: u64,
    pub service: CrudService,
    pub table: TableState,
    pub tabs: Vec<Tab>,
    pub tab: usize,
    pub stats: Vec<StatCard>,
}

impl AdminPage {
    /// `page_size` overrides the model's own size when set.
    pub fn new(service: CrudService, page_size: Option<usize>) -> Self {
        let model = Arc::new(service.model().clone());
        let table = match page_size {
            Some(limit) => TableState::new(model.clone()).with_page_size(limit),
            None => TableState::new(model.clone()),
        };
        Self {
            id: 0,
            tabs: tabs(&model),
            table,
            service,
            tab: 0,
            stats: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    pub fn model(&self) -> &ModelConfig {
        self.service.model()
    }

    /// Moves to the next tab and applies its status filter. Returns `true`
    /// when the list must be refetched.
    pub fn cycle_tab(&mut self) -> bool {
        if self.tabs.len() < 2 {
            return false;
        }
        self.tab = (self.tab + 1) % self.tabs.len();
        self.apply_tab()
    }

    pub fn select_tab(&mut self, index: usize) -> bool {
        if index >= self.tabs.len() {
            return false;
        }
        self.tab = index;
        self.apply_tab()
    }

    fn apply_tab(&mut self) -> bool {
        let Some(field) = self.service.model().status().map(|f| f.name.clone()) else {
            return false;
        };
        let value = self.tabs[self.tab].value.clone().unwrap_or_default();
        self.table.set_filter(&field, &value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryStore;
    use crate::core::catalog;
    use crate::test_support::rec;

    #[test]
    fn test_tabs_follow_status_options() {
        let labels: Vec<_> = tabs(&catalog::news()).into_iter().map(|t| t.label).collect();
        assert_eq!(labels, vec!["Tous", "Brouillon", "Publié", "Archivé"]);
        assert_eq!(tabs(&catalog::users()).len(), 1);
    }

    #[tokio::test]
    async fn test_stat_cards_count_by_status() {
        let store = Arc::new(MemoryStore::new());
        store.seed(
            "tenders",
            vec![
                rec(json!({"id": "1", "status": "open"})),
                rec(json!({"id": "2", "status": "open"})),
                rec(json!({"id": "3", "status": "awarded"})),
            ],
        );
        let service = CrudService::new(store, Arc::new(catalog::tenders()));
        let cards = stat_cards(&service).await.unwrap();
        let values: Vec<_> = cards.iter().map(|c| (c.label.as_str(), c.value)).collect();
        assert_eq!(
            values,
            vec![
                ("Total appels d'offres", 3),
                ("Ouvert", 2),
                ("Clôturé", 0),
                ("Attribué", 1),
            ]
        );
    }

    #[test]
    fn test_cycle_tab_sets_and_clears_status_filter() {
        let service = CrudService::new(Arc::new(MemoryStore::new()), Arc::new(catalog::news()));
        let mut page = AdminPage::new(service, None);
        assert!(page.cycle_tab());
        assert_eq!(page.table.filter_value("status"), Some("draft"));
        page.select_tab(3);
        assert_eq!(page.table.filter_value("status"), Some("archived"));
        assert!(page.cycle_tab());
        assert_eq!(page.table.filter_value("status"), None);
    }

    #[test]
    fn test_page_size_defaults_to_the_model() {
        let store = Arc::new(MemoryStore::new());
        let service = CrudService::new(store.clone(), Arc::new(catalog::partners()));
        assert_eq!(AdminPage::new(service, None).table.options.limit, 20);

        let service = CrudService::new(store, Arc::new(catalog::partners()));
        assert_eq!(AdminPage::new(service, Some(5)).table.options.limit, 5);
    }
}
