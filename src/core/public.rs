//! Public listings read straight from the store, plus the plain-text
//! renderers the CLI prints them with.

use chrono::NaiveDate;
use serde_json::Value;

use crate::backend::{DataStore, Filter, Query, Record, SortOrder, StoreError, value_to_plain};
use crate::core::format;

fn text(record: &Record, key: &str) -> String {
    record.get(key).map(value_to_plain).unwrap_or_default()
}

fn day(today: NaiveDate) -> Value {
    Value::String(today.format("%Y-%m-%d").to_string())
}

async fn rows(store: &dyn DataStore, query: Query) -> Result<Vec<Record>, StoreError> {
    Ok(store.select(&query).await?.rows)
}

pub async fn latest_news(store: &dyn DataStore, limit: usize) -> Result<Vec<Record>, StoreError> {
    let query = Query::table("news")
        .eq("status", "published")
        .order("published_at", SortOrder::Desc)
        .limit(limit.max(1));
    rows(store, query).await
}

/// Published article by id. Drafts are not visible.
pub async fn news_detail(store: &dyn DataStore, id: &str) -> Result<Record, StoreError> {
    let query = Query::table("news")
        .eq("id", id)
        .eq("status", "published")
        .limit(1);
    rows(store, query)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::NotFound {
            table: "news".into(),
            id: id.into(),
        })
}

pub async fn projects(
    store: &dyn DataStore,
    status: Option<&str>,
    limit: usize,
) -> Result<Vec<Record>, StoreError> {
    let mut query = Query::table("projects")
        .order("start_date", SortOrder::Desc)
        .limit(limit.max(1));
    if let Some(status) = status {
        query = query.eq("status", status);
    }
    rows(store, query).await
}

/// Open tenders whose deadline is today or later, closest deadline first.
pub async fn open_tenders(
    store: &dyn DataStore,
    today: NaiveDate,
    limit: usize,
) -> Result<Vec<Record>, StoreError> {
    let query = Query::table("tenders")
        .eq("status", "open")
        .filter(Filter::Gte("deadline".into(), day(today)))
        .order("deadline", SortOrder::Asc)
        .limit(limit.max(1));
    rows(store, query).await
}

pub async fn open_careers(
    store: &dyn DataStore,
    today: NaiveDate,
    limit: usize,
) -> Result<Vec<Record>, StoreError> {
    let query = Query::table("careers")
        .eq("status", "open")
        .filter(Filter::Gte("deadline".into(), day(today)))
        .order("deadline", SortOrder::Asc)
        .limit(limit.max(1));
    rows(store, query).await
}

pub async fn upcoming_events(
    store: &dyn DataStore,
    today: NaiveDate,
    limit: usize,
) -> Result<Vec<Record>, StoreError> {
    let query = Query::table("events")
        .eq("status", "published")
        .filter(Filter::Gte("start_date".into(), day(today)))
        .order("start_date", SortOrder::Asc)
        .limit(limit.max(1));
    rows(store, query).await
}

pub async fn publications(
    store: &dyn DataStore,
    category: Option<&str>,
    limit: usize,
) -> Result<Vec<Record>, StoreError> {
    let mut query = Query::table("publications")
        .eq("status", "published")
        .order("published_at", SortOrder::Desc)
        .limit(limit.max(1));
    if let Some(category) = category {
        query = query.eq("category", category);
    }
    rows(store, query).await
}

// ============================================================================
// Plain-text renderers
// ============================================================================

pub fn render_news(items: &[Record]) -> String {
    render(items, |r| {
        let date = format::long_date(&text(r, "published_at"));
        let excerpt = text(r, "excerpt");
        let mut out = format!("{}  {}", date, text(r, "title"));
        if !excerpt.is_empty() {
            out.push_str(&format!("\n    {}", format::truncate(&excerpt, 100)));
        }
        out
    })
}

/// One article in full: title, date line, then the body as plain text.
pub fn render_news_detail(item: &Record) -> String {
    let mut out = format!(
        "{}\n{}\n\n{}\n",
        text(item, "title"),
        format::long_date(&text(item, "published_at")),
        format::strip_tags(&text(item, "content"))
    );
    let tags = text(item, "tags");
    if !tags.is_empty() {
        out.push_str(&format!("\nMots-clés : {tags}\n"));
    }
    out
}

pub fn render_projects(items: &[Record]) -> String {
    render(items, |r| {
        let budget = r
            .get("budget")
            .and_then(Value::as_f64)
            .map(|b| format::money(b, format::CURRENCY))
            .unwrap_or_else(|| "budget n.c.".into());
        let progress = r
            .get("progress")
            .and_then(Value::as_i64)
            .map(|p| format!(" · {p}%"))
            .unwrap_or_default();
        format!(
            "{}\n    {} · {}{}",
            text(r, "title"),
            text(r, "region"),
            budget,
            progress
        )
    })
}

pub fn render_tenders(items: &[Record]) -> String {
    render(items, |r| {
        format!(
            "[{}] {}\n    Date limite : {}",
            text(r, "reference"),
            text(r, "title"),
            format::long_date(&text(r, "deadline"))
        )
    })
}

pub fn render_careers(items: &[Record]) -> String {
    render(items, |r| {
        format!(
            "{} ({})\n    {} · {} · jusqu'au {}",
            text(r, "title"),
            text(r, "contract_type").to_uppercase(),
            text(r, "department"),
            text(r, "location"),
            format::short_date(&text(r, "deadline"))
        )
    })
}

pub fn render_events(items: &[Record]) -> String {
    render(items, |r| {
        format!(
            "{}  {}\n    {}",
            format::long_date(&text(r, "start_date")),
            text(r, "title"),
            text(r, "location")
        )
    })
}

pub fn render_publications(items: &[Record]) -> String {
    render(items, |r| {
        format!(
            "{}  {}\n    {}",
            format::short_date(&text(r, "published_at")),
            text(r, "title"),
            text(r, "file_url")
        )
    })
}

fn render(items: &[Record], line: impl Fn(&Record) -> String) -> String {
    if items.is_empty() {
        return "Aucun résultat.\n".to_string();
    }
    let mut out = String::new();
    for item in items {
        out.push_str(&line(item));
        out.push('\n');
    }
    out
}
