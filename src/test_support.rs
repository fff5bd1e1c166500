//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::Arc;

use serde_json::Value;

use crate::backend::{MemoryStore, Record, seed};
use crate::core::state::App;

/// Converts a `json!({...})` object into a `Record`.
pub fn rec(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("rec() expects a JSON object, got {other}"),
    }
}

/// A memory store filled with the demo data set.
pub fn demo_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    seed::populate(&store);
    store
}

/// Creates a test App over an empty memory store.
pub fn test_app() -> App {
    App::new(Arc::new(MemoryStore::new()))
}
