use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A flat row as returned by the hosted store.
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortOrder::Asc => "▲",
            SortOrder::Desc => "▼",
        }
    }
}

/// A single row predicate. `Search` is an OR of case-insensitive substring
/// matches over `columns`.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    Neq(String, Value),
    Gte(String, Value),
    Lte(String, Value),
    In(String, Vec<Value>),
    Search { columns: Vec<String>, term: String },
}

/// Inclusive row window, `from..=to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub from: usize,
    pub to: usize,
}

/// A select against one table. Built fluently:
///
/// ```rust,ignore
/// let q = Query::table("news")
///     .filter(Filter::Eq("status".into(), json!("published")))
///     .order("published_at", SortOrder::Desc)
///     .range(0, 9);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    pub filters: Vec<Filter>,
    pub order: Option<(String, SortOrder)>,
    pub range: Option<Range>,
    /// Ask for the exact total alongside the rows.
    pub count: bool,
    /// Only the total is wanted; rows may be skipped.
    pub head: bool,
}

impl Query {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            order: None,
            range: None,
            count: true,
            head: false,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::Eq(column.into(), value.into()))
    }

    pub fn search(self, columns: &[String], term: &str) -> Self {
        let term = term.trim();
        if term.is_empty() || columns.is_empty() {
            return self;
        }
        self.filter(Filter::Search {
            columns: columns.to_vec(),
            term: term.to_string(),
        })
    }

    pub fn order(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.order = Some((column.into(), order));
        self
    }

    pub fn range(mut self, from: usize, to: usize) -> Self {
        self.range = Some(Range { from, to });
        self
    }

    pub fn limit(self, limit: usize) -> Self {
        self.range(0, limit.saturating_sub(1))
    }

    /// Count-only query (stat cards, dashboards).
    pub fn head(mut self) -> Self {
        self.head = true;
        self.count = true;
        self
    }
}

/// Rows plus the exact total matching the query's filters (ignoring range).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub rows: Vec<Record>,
    pub total: usize,
}

/// Reads the `id` of a record as a string, whatever its JSON type.
pub fn record_id(record: &Record) -> Option<String> {
    match record.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Renders a scalar value the way it appears in a query string or CSV cell.
pub fn value_to_plain(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(value_to_plain).collect::<Vec<_>>().join(", "),
        Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sort_order_flip() {
        assert_eq!(SortOrder::Asc.flipped(), SortOrder::Desc);
        assert_eq!(SortOrder::Desc.flipped(), SortOrder::Asc);
    }

    #[test]
    fn test_query_builder_collects_parts() {
        let q = Query::table("news")
            .eq("status", "published")
            .order("published_at", SortOrder::Desc)
            .range(10, 19);
        assert_eq!(q.table, "news");
        assert_eq!(q.filters, vec![Filter::Eq("status".into(), json!("published"))]);
        assert_eq!(q.order, Some(("published_at".to_string(), SortOrder::Desc)));
        assert_eq!(q.range, Some(Range { from: 10, to: 19 }));
    }

    #[test]
    fn test_blank_search_is_dropped() {
        let q = Query::table("news").search(&["title".to_string()], "   ");
        assert!(q.filters.is_empty());
    }

    #[test]
    fn test_record_id_accepts_numbers() {
        let mut r = Record::new();
        r.insert("id".into(), json!(42));
        assert_eq!(record_id(&r).as_deref(), Some("42"));
    }

    #[test]
    fn test_value_to_plain_joins_arrays() {
        assert_eq!(value_to_plain(&json!(["a", "b"])), "a, b");
        assert_eq!(value_to_plain(&Value::Null), "");
    }
}
