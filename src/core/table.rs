//! # List View State
//!
//! Holds what the table shows and what the next fetch should ask for.
//! Mutators return `true` when the page must be refetched; the caller turns
//! that into a `list` call tagged with [`TableState::request`].
//!
//! ```text
//!   toggle_sort / set_search / set_filter / next_page
//!        │ true
//!        ▼
//!   request() ──► ListRequest { generation, options } ──► CrudService::list
//!                                                              │
//!   receive(generation, result) ◄──────────────────────────────┘
//!        (older generations are dropped)
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;

use crate::backend::{Record, SortOrder, record_id};
use crate::core::crud::{CrudError, ListOptions, Page};
use crate::core::format::{self, Cell};
use crate::core::model::{FieldConfig, ModelConfig};

#[derive(Debug, Clone, PartialEq)]
pub struct ListRequest {
    pub generation: u64,
    pub options: ListOptions,
}

#[derive(Debug, Clone)]
pub struct TableState {
    model: Arc<ModelConfig>,
    pub options: ListOptions,
    pub page: Page,
    pub selected: BTreeSet<String>,
    /// Row under the cursor, index into `page.data`.
    pub cursor: usize,
    /// Column under the cursor, index into `model.list_fields()`.
    pub column: usize,
    pub loading: bool,
    pub error: Option<String>,
    generation: u64,
}

impl TableState {
    pub fn new(model: Arc<ModelConfig>) -> Self {
        let options = ListOptions::for_model(&model);
        Self {
            model,
            options,
            page: Page::default(),
            selected: BTreeSet::new(),
            cursor: 0,
            column: 0,
            loading: false,
            error: None,
            generation: 0,
        }
    }

    pub fn with_page_size(mut self, limit: usize) -> Self {
        self.options.limit = limit.max(1);
        self
    }

    pub fn model(&self) -> &Arc<ModelConfig> {
        &self.model
    }

    pub fn columns(&self) -> Vec<&FieldConfig> {
        self.model.list_fields().collect()
    }

    /// Starts a fetch. Any response for an earlier generation is now stale.
    pub fn request(&mut self) -> ListRequest {
        self.generation += 1;
        self.loading = true;
        ListRequest {
            generation: self.generation,
            options: self.options.clone(),
        }
    }

    /// Applies a fetch result. Returns `false` (and changes nothing) when the
    /// response belongs to a superseded request.
    pub fn receive(&mut self, generation: u64, result: Result<Page, CrudError>) -> bool {
        if generation != self.generation {
            return false;
        }
        self.loading = false;
        match result {
            Ok(page) => {
                self.cursor = self.cursor.min(page.data.len().saturating_sub(1));
                self.page = page;
                self.error = None;
            }
            Err(e) => {
                self.error = Some(e.user_message("du chargement"));
            }
        }
        true
    }

    /// Same field flips the direction, another sortable field sorts ascending.
    pub fn toggle_sort(&mut self, field: &str) -> bool {
        if !self.model.is_sortable(field) {
            return false;
        }
        if self.options.sort_by.as_deref() == Some(field) {
            self.options.sort_order = self.options.sort_order.flipped();
        } else {
            self.options.sort_by = Some(field.to_string());
            self.options.sort_order = SortOrder::Asc;
        }
        self.options.page = 1;
        true
    }

    pub fn sort_focused_column(&mut self) -> bool {
        match self.focused_field().map(|f| f.name.clone()) {
            Some(name) => self.toggle_sort(&name),
            None => false,
        }
    }

    pub fn set_search(&mut self, text: &str) -> bool {
        if self.options.search == text {
            return false;
        }
        self.options.search = text.to_string();
        self.options.page = 1;
        true
    }

    /// Empty `value` removes the filter.
    pub fn set_filter(&mut self, field: &str, value: &str) -> bool {
        let changed = if value.is_empty() {
            self.options.filters.remove(field).is_some()
        } else {
            let new = Value::String(value.to_string());
            self.options.filters.insert(field.to_string(), new.clone()) != Some(new)
        };
        if changed {
            self.options.page = 1;
        }
        changed
    }

    pub fn filter_value(&self, field: &str) -> Option<&str> {
        self.options.filters.get(field).and_then(Value::as_str)
    }

    /// Steps the focused column's filter through its options, then back to
    /// no filter. Only filterable select columns take part, and only when the
    /// model has filters enabled.
    pub fn cycle_filter_focused(&mut self) -> bool {
        if !self.model.features.filters {
            return false;
        }
        let Some(field) = self.focused_field().filter(|f| f.filterable) else {
            return false;
        };
        let options = field.kind.options();
        if options.is_empty() {
            return false;
        }
        let name = field.name.clone();
        let next = match self.filter_value(&name) {
            None => options[0].value.clone(),
            Some(current) => options
                .iter()
                .position(|o| o.value == current)
                .and_then(|i| options.get(i + 1))
                .map(|o| o.value.clone())
                .unwrap_or_default(),
        };
        self.set_filter(&name, &next)
    }

    pub fn next_page(&mut self) -> bool {
        if !self.page.has_next {
            return false;
        }
        self.options.page = self.page.page + 1;
        self.cursor = 0;
        true
    }

    pub fn prev_page(&mut self) -> bool {
        if !self.page.has_prev {
            return false;
        }
        self.options.page = self.page.page - 1;
        self.cursor = 0;
        true
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.cursor + 1 < self.page.data.len() {
            self.cursor += 1;
        }
    }

    pub fn move_left(&mut self) {
        self.column = self.column.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.column + 1 < self.columns().len() {
            self.column += 1;
        }
    }

    pub fn focused_field(&self) -> Option<&FieldConfig> {
        self.model.list_fields().nth(self.column)
    }

    pub fn focused(&self) -> Option<&Record> {
        self.page.data.get(self.cursor)
    }

    pub fn focused_id(&self) -> Option<String> {
        self.focused().and_then(record_id)
    }

    pub fn toggle_select(&mut self, id: &str) {
        if !self.selected.remove(id) {
            self.selected.insert(id.to_string());
        }
    }

    pub fn toggle_focused(&mut self) {
        if let Some(id) = self.focused_id() {
            self.toggle_select(&id);
        }
    }

    /// Selects every id on the loaded page; when they are all selected
    /// already, deselects them. Ids from other pages are untouched.
    pub fn select_all(&mut self) {
        let ids = self.page.ids();
        if !ids.is_empty() && ids.iter().all(|id| self.selected.contains(id)) {
            for id in &ids {
                self.selected.remove(id);
            }
        } else {
            self.selected.extend(ids);
        }
    }

    pub fn selection(&self) -> Vec<String> {
        self.selected.iter().cloned().collect()
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, record: &Record) -> bool {
        record_id(record).is_some_and(|id| self.selected.contains(&id))
    }

    pub fn cells(&self, record: &Record) -> Vec<Cell> {
        self.model
            .list_fields()
            .map(|f| format::cell(f, record.get(&f.name)))
            .collect()
    }

    /// `Page 2/5 · 47 éléments`
    pub fn footer(&self) -> String {
        format!(
            "Page {}/{} · {} élément{}",
            self.page.page.max(1),
            self.page.total_pages.max(1),
            self.page.total,
            if self.page.total > 1 { "s" } else { "" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog;
    use crate::test_support::rec;
    use serde_json::json;

    fn page_of(ids: &[&str], page: usize, total_pages: usize) -> Page {
        Page {
            data: ids.iter().map(|id| rec(json!({"id": id, "title": id}))).collect(),
            total: ids.len() * total_pages,
            page,
            limit: ids.len(),
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }

    fn news_table() -> TableState {
        TableState::new(Arc::new(catalog::news()))
    }

    #[test]
    fn test_repeated_sort_toggles_alternate() {
        let mut table = news_table();
        assert!(table.toggle_sort("title"));
        assert_eq!(table.options.sort_order, SortOrder::Asc);
        table.toggle_sort("title");
        assert_eq!(table.options.sort_order, SortOrder::Desc);
        table.toggle_sort("title");
        assert_eq!(table.options.sort_order, SortOrder::Asc);
    }

    #[test]
    fn test_sort_other_field_resets_to_ascending() {
        let mut table = news_table();
        table.toggle_sort("title");
        table.toggle_sort("title");
        table.toggle_sort("published_at");
        assert_eq!(table.options.sort_by.as_deref(), Some("published_at"));
        assert_eq!(table.options.sort_order, SortOrder::Asc);
    }

    #[test]
    fn test_non_sortable_field_is_ignored() {
        let mut table = news_table();
        let before = table.options.clone();
        assert!(!table.toggle_sort("category"));
        assert_eq!(table.options, before);
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut table = news_table();
        let first = table.request();
        table.set_search("port");
        let second = table.request();

        assert!(table.receive(second.generation, Ok(page_of(&["fresh"], 1, 1))));
        assert!(!table.receive(first.generation, Ok(page_of(&["stale"], 1, 1))));
        assert_eq!(table.page.ids(), vec!["fresh"]);
        assert!(!table.loading);
    }

    #[test]
    fn test_select_all_only_touches_current_page() {
        let mut table = news_table();
        table.selected.insert("other-page".into());
        let req = table.request();
        table.receive(req.generation, Ok(page_of(&["a", "b"], 1, 2)));

        table.select_all();
        assert_eq!(table.selection(), vec!["a", "b", "other-page"]);
        table.select_all();
        assert_eq!(table.selection(), vec!["other-page"]);
    }

    #[test]
    fn test_filter_and_search_reset_page() {
        let mut table = news_table();
        table.options.page = 3;
        assert!(table.set_filter("status", "published"));
        assert_eq!(table.options.page, 1);
        assert!(!table.set_filter("status", "published"));
        assert_eq!(table.filter_value("status"), Some("published"));
        assert!(table.set_filter("status", ""));
        assert_eq!(table.filter_value("status"), None);
    }

    #[test]
    fn test_paging_follows_page_flags() {
        let mut table = news_table();
        let req = table.request();
        table.receive(req.generation, Ok(page_of(&["a"], 1, 2)));
        assert!(!table.prev_page());
        assert!(table.next_page());
        assert_eq!(table.options.page, 2);
    }

    #[test]
    fn test_error_sets_toast_and_keeps_rows() {
        let mut table = news_table();
        let req = table.request();
        table.receive(req.generation, Ok(page_of(&["a"], 1, 1)));
        let req = table.request();
        table.receive(
            req.generation,
            Err(CrudError::Store(crate::backend::StoreError::Network("down".into()))),
        );
        assert_eq!(table.page.ids(), vec!["a"]);
        assert_eq!(table.error.as_deref(), Some("Erreur lors du chargement"));
    }

    #[test]
    fn test_cycle_filter_walks_options_then_clears() {
        let mut table = news_table();
        assert!(!table.cycle_filter_focused());

        table.move_right();
        assert!(table.cycle_filter_focused());
        assert_eq!(table.filter_value("category"), Some("actualite"));
        table.cycle_filter_focused();
        table.cycle_filter_focused();
        assert_eq!(table.filter_value("category"), Some("discours"));
        assert!(table.cycle_filter_focused());
        assert_eq!(table.filter_value("category"), None);
    }

    #[test]
    fn test_cycle_filter_needs_filters_feature() {
        let mut model = catalog::news();
        model.features.filters = false;
        let mut table = TableState::new(Arc::new(model));
        table.move_right();
        assert!(!table.cycle_filter_focused());
        assert_eq!(table.filter_value("category"), None);
    }
}
