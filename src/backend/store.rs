use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::types::{Query, Record, Selection};

/// Errors surfaced by the hosted store. They are passed up to callers
/// uninterpreted; nothing here is retried.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Store misconfigured (missing URL or key).
    Config(String),
    /// Network-level failure (DNS, connection refused, reset).
    Network(String),
    /// The store answered with a non-success status.
    Api { status: u16, message: String },
    /// The store's response body could not be decoded.
    Parse(String),
    /// Update/delete targeted a row that does not exist.
    NotFound { table: String, id: String },
    /// Missing or rejected credentials (HTTP 401/403).
    Unauthorized(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Config(msg) => write!(f, "config error: {msg}"),
            StoreError::Network(msg) => write!(f, "network error: {msg}"),
            StoreError::Api { status, message } => {
                write!(f, "API error (HTTP {status}): {message}")
            }
            StoreError::Parse(msg) => write!(f, "parse error: {msg}"),
            StoreError::NotFound { table, id } => write!(f, "{table}/{id} not found"),
            StoreError::Unauthorized(msg) => write!(f, "unauthorized: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Query-builder access to the hosted relational store.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Returns the name of the backend (for logs and the title bar).
    fn name(&self) -> &str;

    /// Runs a filtered/sorted/ranged select. `total` counts every row matching
    /// the filters, regardless of the range.
    async fn select(&self, query: &Query) -> Result<Selection, StoreError>;

    /// Inserts one row and returns it as stored (with generated columns).
    async fn insert(&self, table: &str, record: Record) -> Result<Record, StoreError>;

    /// Patches one row by id and returns it as stored.
    async fn update(&self, table: &str, id: &str, patch: Record) -> Result<Record, StoreError>;

    /// Deletes one row by id.
    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError>;
}

/// Tokens returned by a successful sign-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub user_id: String,
    pub email: String,
}

/// The authenticated account as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

/// The hosted auth subsystem: sign-in, sign-out, current user.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, StoreError>;

    async fn sign_out(&self, session: &AuthSession) -> Result<(), StoreError>;

    async fn current_user(&self, session: &AuthSession) -> Result<AuthUser, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let e = StoreError::Api {
            status: 409,
            message: "duplicate key".into(),
        };
        assert_eq!(e.to_string(), "API error (HTTP 409): duplicate key");

        let e = StoreError::NotFound {
            table: "news".into(),
            id: "abc".into(),
        };
        assert_eq!(e.to_string(), "news/abc not found");
    }
}
