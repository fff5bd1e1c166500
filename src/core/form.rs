//! # Generic Form
//!
//! Derives a validation schema from a model's field list and turns raw text
//! inputs into a typed `Record`. Validation is purely local: a form that fails
//! it never reaches the store.
//!
//! ```text
//! FieldKind::Text      → required non-empty string
//! FieldKind::Email     → well-formed address
//! FieldKind::Url       → optional http(s) URL
//! FieldKind::Number    → coerced number ("1 250,5" → 1250.5)
//! FieldKind::Date      → YYYY-MM-DD
//! FieldKind::Select    → one of the declared options
//! FieldKind::Array     → comma-separated list
//! ```
//!
//! Optional fields left empty become `null`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use reqwest::Url;
use serde_json::{Number, Value};

use crate::backend::{Record, record_id, value_to_plain};
use crate::core::model::{FieldKind, ModelConfig};

/// Raw text per field name, as typed by the user.
pub type FormValues = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRule {
    Text,
    Email,
    Url,
    Number,
    Date,
    Boolean,
    Choice(Vec<String>),
    List,
}

impl From<&FieldKind> for FieldRule {
    fn from(kind: &FieldKind) -> Self {
        match kind {
            FieldKind::Text | FieldKind::Textarea | FieldKind::RichText => FieldRule::Text,
            FieldKind::Email => FieldRule::Email,
            FieldKind::Url => FieldRule::Url,
            FieldKind::Number => FieldRule::Number,
            FieldKind::Date => FieldRule::Date,
            FieldKind::Boolean => FieldRule::Boolean,
            FieldKind::Select(options) => {
                FieldRule::Choice(options.iter().map(|o| o.value.clone()).collect())
            }
            FieldKind::Array => FieldRule::List,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleEntry {
    pub name: String,
    pub label: String,
    pub rule: FieldRule,
    pub required: bool,
}

/// First validation error per field, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<String, String>);

impl FormErrors {
    /// Keeps the first message recorded for a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Whether a submit creates a new row or patches an existing one. A preview
/// shows an existing row read-only and never writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(String),
    Preview(String),
}

impl FormMode {
    /// Edit when the initial data carries an id, create otherwise.
    pub fn from_initial(initial: Option<&Record>) -> Self {
        initial
            .and_then(record_id)
            .map(FormMode::Edit)
            .unwrap_or(FormMode::Create)
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self, FormMode::Preview(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSchema {
    pub entries: Vec<RuleEntry>,
}

impl FormSchema {
    pub fn from_model(model: &ModelConfig) -> Self {
        Self {
            entries: model
                .fields
                .iter()
                .map(|f| RuleEntry {
                    name: f.name.clone(),
                    label: f.label.clone(),
                    rule: FieldRule::from(&f.kind),
                    required: f.required,
                })
                .collect(),
        }
    }

    pub fn validate(&self, values: &FormValues) -> Result<Record, FormErrors> {
        let mut record = Record::new();
        let mut errors = FormErrors::default();

        for entry in &self.entries {
            let raw = values.get(&entry.name).map(|s| s.trim()).unwrap_or("");
            match coerce(entry, raw) {
                Ok(value) => {
                    record.insert(entry.name.clone(), value);
                }
                Err(message) => errors.add(&entry.name, message),
            }
        }

        if errors.is_empty() { Ok(record) } else { Err(errors) }
    }
}

static EMAIL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

fn is_valid_email(raw: &str) -> bool {
    EMAIL.as_ref().is_some_and(|re| re.is_match(raw))
}

fn parse_number(raw: &str) -> Option<Number> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{202f}')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if let Ok(n) = cleaned.parse::<i64>() {
        return Some(Number::from(n));
    }
    cleaned.parse::<f64>().ok().and_then(Number::from_f64)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "true" | "1" | "oui" | "yes" | "on" => Some(true),
        "false" | "0" | "non" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn coerce(entry: &RuleEntry, raw: &str) -> Result<Value, String> {
    if raw.is_empty() {
        return match entry.rule {
            FieldRule::Boolean => Ok(Value::Bool(false)),
            _ if entry.required => Err(format!("{} est requis", entry.label)),
            _ => Ok(Value::Null),
        };
    }

    match &entry.rule {
        FieldRule::Text => Ok(Value::String(raw.to_string())),
        FieldRule::Email => is_valid_email(raw)
            .then(|| Value::String(raw.to_string()))
            .ok_or_else(|| "Adresse e-mail invalide".to_string()),
        FieldRule::Url => Url::parse(raw)
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https"))
            .map(|_| Value::String(raw.to_string()))
            .ok_or_else(|| "URL invalide".to_string()),
        FieldRule::Number => parse_number(raw)
            .map(Value::Number)
            .ok_or_else(|| format!("{} doit être un nombre", entry.label)),
        FieldRule::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .map_err(|_| "Date invalide (AAAA-MM-JJ)".to_string()),
        FieldRule::Boolean => parse_bool(raw)
            .map(Value::Bool)
            .ok_or_else(|| "Valeur attendue : oui ou non".to_string()),
        FieldRule::Choice(options) => options
            .iter()
            .any(|o| o == raw)
            .then(|| Value::String(raw.to_string()))
            .ok_or_else(|| "Valeur non autorisée".to_string()),
        FieldRule::List => Ok(Value::Array(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| Value::String(s.to_string()))
                .collect(),
        )),
    }
}

/// Pre-fills raw inputs from an existing record (edit mode).
pub fn initial_values(model: &ModelConfig, record: Option<&Record>) -> FormValues {
    model
        .fields
        .iter()
        .map(|f| {
            let value = record.and_then(|r| r.get(&f.name)).unwrap_or(&Value::Null);
            let text = match (&f.kind, value) {
                (FieldKind::Date, Value::String(s)) => s.chars().take(10).collect(),
                (FieldKind::Boolean, Value::Null) => "false".to_string(),
                _ => value_to_plain(value),
            };
            (f.name.clone(), text)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog;
    use serde_json::json;

    fn values(pairs: &[(&str, &str)]) -> FormValues {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_schema_maps_kinds_to_rules() {
        let schema = FormSchema::from_model(&catalog::users());
        let email = schema.entries.iter().find(|e| e.name == "email").unwrap();
        assert_eq!(email.rule, FieldRule::Email);
        assert!(email.required);
        let role = schema.entries.iter().find(|e| e.name == "role").unwrap();
        assert!(matches!(&role.rule, FieldRule::Choice(opts) if opts.len() == 3));
    }

    #[test]
    fn test_required_empty_fields_are_rejected() {
        let schema = FormSchema::from_model(&catalog::users());
        let errors = schema.validate(&values(&[("full_name", "   ")])).unwrap_err();
        assert_eq!(errors.get("full_name"), Some("Nom complet est requis"));
        assert_eq!(errors.get("email"), Some("E-mail est requis"));
        assert!(errors.get("department").is_none());
    }

    #[test]
    fn test_valid_user_coerces_types() {
        let schema = FormSchema::from_model(&catalog::users());
        let record = schema
            .validate(&values(&[
                ("full_name", "Amina Idrissi"),
                ("email", "a.idrissi@ministere.gov"),
                ("role", "editor"),
                ("is_active", "oui"),
            ]))
            .unwrap();
        assert_eq!(record["is_active"], json!(true));
        assert_eq!(record["department"], Value::Null);
        assert_eq!(record["role"], json!("editor"));
    }

    #[test]
    fn test_invalid_formats() {
        let schema = FormSchema::from_model(&catalog::projects());
        let errors = schema
            .validate(&values(&[
                ("title", "Port"),
                ("description", "Extension"),
                ("status", "unknown"),
                ("budget", "beaucoup"),
                ("start_date", "10/01/2024"),
                ("image_url", "ftp://files"),
            ]))
            .unwrap_err();
        assert_eq!(errors.get("status"), Some("Valeur non autorisée"));
        assert_eq!(errors.get("budget"), Some("Budget doit être un nombre"));
        assert_eq!(errors.get("start_date"), Some("Date invalide (AAAA-MM-JJ)"));
        assert_eq!(errors.get("image_url"), Some("URL invalide"));
    }

    #[test]
    fn test_number_coercion() {
        assert_eq!(parse_number("1 250 000"), Some(Number::from(1_250_000)));
        assert_eq!(parse_number("12,5").and_then(|n| n.as_f64()), Some(12.5));
        assert_eq!(parse_number("abc"), None);
    }

    #[test]
    fn test_email_check() {
        assert!(is_valid_email("contact@ministere.gov"));
        assert!(!is_valid_email("contact@"));
        assert!(!is_valid_email("contact ministere@gov.ma"));
        assert!(!is_valid_email("nobody"));
        assert!(!is_valid_email("a@b@c.ma"));
        assert!(!is_valid_email("contact@ministere"));
    }

    #[test]
    fn test_list_field_splits() {
        let schema = FormSchema::from_model(&catalog::roles());
        let record = schema
            .validate(&values(&[("name", "editor"), ("permissions", "news.read, news.write,")]))
            .unwrap();
        assert_eq!(record["permissions"], json!(["news.read", "news.write"]));
    }

    #[test]
    fn test_form_mode_from_initial() {
        assert_eq!(FormMode::from_initial(None), FormMode::Create);
        let mut r = Record::new();
        r.insert("id".into(), json!("abc"));
        assert_eq!(FormMode::from_initial(Some(&r)), FormMode::Edit("abc".into()));
    }

    #[test]
    fn test_initial_values_trim_timestamps() {
        let model = catalog::news();
        let mut r = Record::new();
        r.insert("published_at".into(), json!("2024-01-10T08:00:00Z"));
        r.insert("tags".into(), json!(["port", "mer"]));
        let v = initial_values(&model, Some(&r));
        assert_eq!(v["published_at"], "2024-01-10");
        assert_eq!(v["tags"], "port, mer");
        assert_eq!(v["title"], "");
    }
}
