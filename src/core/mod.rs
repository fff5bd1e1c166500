//! # Core Application Logic
//!
//! The admin layer of the portal: model configurations, the generic CRUD
//! service, list and form state, search, page composition, and the
//! reducer that drives the console. It knows nothing about any specific
//! UI technology.
//!
//! ```text
//!     ┌─────────────────────────────────────────────┐
//!     │                   CORE                      │
//!     │                                             │
//!     │  catalog ──► model ──► crud ──► table/form  │
//!     │                  │                          │
//!     │                  └──► pages, search, public │
//!     │                                             │
//!     │  state + action: App, update(), perform()   │
//!     └──────────────┬───────────────┬──────────────┘
//!                    ▼               ▼
//!             ┌────────────┐  ┌────────────┐
//!             │    TUI     │  │    CLI     │
//!             │ (ratatui)  │  │ (main.rs)  │
//!             └────────────┘  └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`model`]: `ModelConfig`, fields, columns and actions
//! - [`catalog`]: the twelve administered models
//! - [`crud`]: `CrudService` over any `DataStore`
//! - [`table`] / [`form`]: list view state and form validation
//! - [`search`]: cross-collection search
//! - [`pages`]: tabs and stat cards for admin pages
//! - [`public`]: read-only queries for the public site
//! - [`state`] / [`action`]: the `App` struct and its reducer

pub mod action;
pub mod analytics;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod crud;
pub mod export;
pub mod form;
pub mod format;
pub mod model;
pub mod pages;
pub mod public;
pub mod search;
pub mod state;
pub mod table;
