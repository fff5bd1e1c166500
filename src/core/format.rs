//! Display formatting for table cells, detail views and the CLI.
//!
//! Everything here returns plain strings plus an optional badge tone; the
//! TUI decides the colours.

use chrono::{DateTime, Datelike, NaiveDate};
use serde_json::Value;
use unicode_width::UnicodeWidthChar;

use crate::backend::value_to_plain;
use crate::core::model::{FieldConfig, FieldKind};

pub const CURRENCY: &str = "MAD";

const MONTHS: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Warning,
    Info,
    Muted,
    Danger,
}

/// Badge colour for a status-like value.
pub fn tone_for(value: &str) -> Tone {
    match value {
        "published" | "open" | "completed" | "true" | "admin" => Tone::Success,
        "draft" | "planned" | "new" | "editor" => Tone::Warning,
        "in_progress" | "awarded" | "read" => Tone::Info,
        "false" => Tone::Danger,
        _ => Tone::Muted,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub badge: Option<Tone>,
}

impl Cell {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            badge: None,
        }
    }
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| raw.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

/// `10/01/2024`
pub fn short_date(raw: &str) -> String {
    parse_date(raw)
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// `10 janvier 2024`
pub fn long_date(raw: &str) -> String {
    match parse_date(raw) {
        Some(d) => format!("{} {} {}", d.day(), MONTHS[d.month0() as usize], d.year()),
        None => raw.to_string(),
    }
}

/// `1 250 000 MAD`. Fractions are rounded to the unit.
pub fn money(amount: f64, currency: &str) -> String {
    let rounded = amount.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    let sign = if rounded < 0 { "-" } else { "" };
    format!("{sign}{grouped} {currency}")
}

/// Plain text of an HTML fragment: tags dropped, entities decoded, runs of
/// whitespace collapsed.
pub fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    let text = html_escape::decode_html_entities(&out);
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cuts `text` to `max` terminal columns, ending with `…` when cut.
pub fn truncate(text: &str, max: usize) -> String {
    let total: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}

/// Renders one record value for the list view.
pub fn cell(field: &FieldConfig, value: Option<&Value>) -> Cell {
    let value = match value {
        None | Some(Value::Null) => return Cell::plain("—"),
        Some(v) => v,
    };
    let raw = value_to_plain(value);

    if field.name.contains("budget")
        && let Some(amount) = value.as_f64().or_else(|| raw.replace(' ', "").parse().ok())
    {
        return Cell::plain(money(amount, CURRENCY));
    }

    match &field.kind {
        FieldKind::Date => Cell::plain(short_date(&raw)),
        FieldKind::Select(_) => Cell {
            text: field.kind.option_label(&raw).to_string(),
            badge: Some(tone_for(&raw)),
        },
        FieldKind::Boolean => {
            let on = matches!(value, Value::Bool(true)) || raw == "true";
            Cell {
                text: if on { "Oui" } else { "Non" }.to_string(),
                badge: Some(tone_for(if on { "true" } else { "false" })),
            }
        }
        FieldKind::RichText => Cell::plain(truncate(&strip_tags(&raw), 60)),
        FieldKind::Textarea => Cell::plain(truncate(&raw, 60)),
        _ => Cell::plain(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog;
    use serde_json::json;

    #[test]
    fn test_dates() {
        assert_eq!(short_date("2024-01-10"), "10/01/2024");
        assert_eq!(short_date("2024-01-10T08:30:00+00:00"), "10/01/2024");
        assert_eq!(long_date("2024-08-03"), "3 août 2024");
        assert_eq!(short_date("bientôt"), "bientôt");
    }

    #[test]
    fn test_money_grouping() {
        assert_eq!(money(1_250_000.0, "MAD"), "1 250 000 MAD");
        assert_eq!(money(999.4, "MAD"), "999 MAD");
        assert_eq!(money(-1000.0, "EUR"), "-1 000 EUR");
        assert_eq!(money(0.0, "MAD"), "0 MAD");
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(
            strip_tags("<p>Le <strong>port</strong>&nbsp;ouvre.</p>"),
            "Le port ouvre."
        );
        assert_eq!(
            strip_tags("<p>Routes &amp; &quot;ponts&quot; &#39;2024&#39; &lt;b&gt;</p>"),
            "Routes & \"ponts\" '2024' <b>"
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abcdef", 10), "abcdef");
        assert_eq!(truncate("abcdef", 4), "abc…");
    }

    #[test]
    fn test_cells_by_kind() {
        let model = catalog::projects();
        let budget = model.field("budget").unwrap();
        assert_eq!(cell(budget, Some(&json!(2500000))).text, "2 500 000 MAD");

        let status = model.field("status").unwrap();
        let c = cell(status, Some(&json!("in_progress")));
        assert_eq!(c.text, "En cours");
        assert_eq!(c.badge, Some(Tone::Info));

        let users = catalog::users();
        let active = users.field("is_active").unwrap();
        assert_eq!(cell(active, Some(&json!(false))).text, "Non");
        assert_eq!(cell(active, None).text, "—");

        let news = catalog::news();
        let tags = news.field("tags").unwrap();
        assert_eq!(cell(tags, Some(&json!(["a", "b"]))).text, "a, b");
    }
}
