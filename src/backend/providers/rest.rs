//! Hosted backend provider speaking PostgREST conventions.
//!
//! Tables live under `/rest/v1/{table}`, auth under `/auth/v1/*`.
//! Pagination uses `Range` headers with `Prefer: count=exact`; the total comes
//! back in `Content-Range: from-to/total`.

use std::sync::RwLock;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::header::{CONTENT_RANGE, HeaderMap};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use crate::backend::store::{AuthProvider, AuthSession, AuthUser, DataStore, StoreError};
use crate::backend::types::{Filter, Query, Record, Selection, value_to_plain};

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Deserialize, Debug)]
struct TokenResponse {
    access_token: String,
    user: UserResponse,
}

#[derive(Deserialize, Debug)]
struct UserResponse {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// PostgREST / GoTrue error body. Either field may carry the text.
#[derive(Deserialize, Debug)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

// ============================================================================
// Translation Layer
// ============================================================================

/// Quotes a value for use inside `or=(...)` / `in.(...)` when it contains
/// PostgREST-reserved characters.
fn quote_reserved(value: &str) -> String {
    if value.contains([',', '(', ')', '"', ':']) {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

/// Translates filters to PostgREST query parameters.
fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|filter| match filter {
            Filter::Eq(col, v) => (col.clone(), format!("eq.{}", value_to_plain(v))),
            Filter::Neq(col, v) => (col.clone(), format!("neq.{}", value_to_plain(v))),
            Filter::Gte(col, v) => (col.clone(), format!("gte.{}", value_to_plain(v))),
            Filter::Lte(col, v) => (col.clone(), format!("lte.{}", value_to_plain(v))),
            Filter::In(col, values) => {
                let list = values
                    .iter()
                    .map(|v| quote_reserved(&value_to_plain(v)))
                    .collect::<Vec<_>>()
                    .join(",");
                (col.clone(), format!("in.({list})"))
            }
            Filter::Search { columns, term } => {
                let pattern = quote_reserved(&format!("*{term}*"));
                let clauses = columns
                    .iter()
                    .map(|c| format!("{c}.ilike.{pattern}"))
                    .collect::<Vec<_>>()
                    .join(",");
                ("or".to_string(), format!("({clauses})"))
            }
        })
        .collect()
}

/// Builds the full parameter list for a select.
pub fn query_params(query: &Query) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    params.extend(filter_params(&query.filters));
    if let Some((column, order)) = &query.order {
        params.push(("order".to_string(), format!("{column}.{}", order.as_str())));
    }
    params
}

/// Extracts the total from `Content-Range` (`0-9/42`, `*/0`). `*` totals are
/// unknown and read as `None`.
pub fn parse_content_range(header: &str) -> Option<usize> {
    header.rsplit_once('/')?.1.trim().parse().ok()
}

async fn error_from(response: Response) -> StoreError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown error".to_string());
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message.or(b.error_description))
        .unwrap_or(body);
    warn!("Backend error: {} - {}", status, message);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Unauthorized(message),
        _ => StoreError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Hosted backend over HTTP. Holds the anon key and, once signed in, the
/// user's access token, which then authorises every table call.
pub struct RestStore {
    base_url: String,
    anon_key: String,
    access_token: RwLock<Option<String>>,
    client: reqwest::Client,
}

impl RestStore {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            access_token: RwLock::new(None),
            client: reqwest::Client::new(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn bearer(&self) -> String {
        let token = self
            .access_token
            .read()
            .map(|t| t.clone())
            .unwrap_or_default();
        format!("Bearer {}", token.unwrap_or_else(|| self.anon_key.clone()))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .header("Authorization", self.bearer())
    }

    fn set_token(&self, token: Option<String>) {
        if let Ok(mut slot) = self.access_token.write() {
            *slot = token;
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, StoreError> {
        if self.base_url.is_empty() {
            return Err(StoreError::Config("backend URL is not set".into()));
        }
        let response = builder
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        debug!("Backend response status: {}", response.status());
        Ok(response)
    }

    async fn representation(response: Response) -> Result<Vec<Record>, StoreError> {
        if !response.status().is_success() {
            return Err(error_from(response).await);
        }
        response
            .json::<Vec<Record>>()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))
    }
}

fn total_from(headers: &HeaderMap, fallback: usize) -> usize {
    headers
        .get(CONTENT_RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_content_range)
        .unwrap_or(fallback)
}

#[async_trait]
impl DataStore for RestStore {
    fn name(&self) -> &str {
        "rest"
    }

    async fn select(&self, query: &Query) -> Result<Selection, StoreError> {
        let url = self.table_url(&query.table);
        let params = query_params(query);
        info!(
            "Backend select: table={}, filters={}, order={:?}, range={:?}",
            query.table,
            query.filters.len(),
            query.order,
            query.range
        );

        let mut builder = if query.head {
            self.client.head(&url)
        } else {
            self.client.get(&url)
        };
        builder = self.authorized(builder).query(&params);
        if query.count {
            builder = builder.header("Prefer", "count=exact");
        }
        if let Some(range) = query.range {
            builder = builder
                .header("Range-Unit", "items")
                .header("Range", format!("{}-{}", range.from, range.to));
        }

        let response = self.send(builder).await?;
        let status = response.status();

        // Offset past the end: no rows, but the total is still reported.
        if status == StatusCode::RANGE_NOT_SATISFIABLE {
            return Ok(Selection {
                rows: Vec::new(),
                total: total_from(response.headers(), 0),
            });
        }
        if !status.is_success() {
            return Err(error_from(response).await);
        }

        let headers = response.headers().clone();
        if query.head {
            return Ok(Selection {
                rows: Vec::new(),
                total: total_from(&headers, 0),
            });
        }

        let rows = response
            .json::<Vec<Record>>()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))?;
        let total = total_from(&headers, rows.len());
        debug!("Backend select {}: {} rows of {}", query.table, rows.len(), total);
        Ok(Selection { rows, total })
    }

    async fn insert(&self, table: &str, record: Record) -> Result<Record, StoreError> {
        info!("Backend insert: table={}", table);
        let builder = self
            .authorized(self.client.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(&record);
        let response = self.send(builder).await?;
        Self::representation(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Parse("insert returned no row".into()))
    }

    async fn update(&self, table: &str, id: &str, patch: Record) -> Result<Record, StoreError> {
        info!("Backend update: table={}, id={}", table, id);
        let builder = self
            .authorized(self.client.patch(self.table_url(table)))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(&patch);
        let response = self.send(builder).await?;
        Self::representation(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound {
                table: table.to_string(),
                id: id.to_string(),
            })
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError> {
        info!("Backend delete: table={}, id={}", table, id);
        let builder = self
            .authorized(self.client.delete(self.table_url(table)))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation");
        let response = self.send(builder).await?;
        if Self::representation(response).await?.is_empty() {
            return Err(StoreError::NotFound {
                table: table.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for RestStore {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, StoreError> {
        info!("Auth sign-in for {}", email);
        let builder = self
            .client
            .post(format!("{}/auth/v1/token", self.base_url))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }));
        let response = self.send(builder).await?;
        if !response.status().is_success() {
            return Err(error_from(response).await);
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))?;
        self.set_token(Some(token.access_token.clone()));
        Ok(AuthSession {
            access_token: token.access_token,
            user_id: token.user.id,
            email: token.user.email.unwrap_or_else(|| email.to_string()),
        })
    }

    async fn sign_out(&self, session: &AuthSession) -> Result<(), StoreError> {
        info!("Auth sign-out for {}", session.email);
        let builder = self
            .client
            .post(format!("{}/auth/v1/logout", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token);
        let response = self.send(builder).await?;
        self.set_token(None);
        if !response.status().is_success() {
            return Err(error_from(response).await);
        }
        Ok(())
    }

    async fn current_user(&self, session: &AuthSession) -> Result<AuthUser, StoreError> {
        let builder = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token);
        let response = self.send(builder).await?;
        if !response.status().is_success() {
            return Err(error_from(response).await);
        }
        let user: UserResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))?;
        Ok(AuthUser {
            id: user.id,
            email: user.email.unwrap_or_default(),
        })
    }
}
