pub mod providers;
pub mod seed;
pub mod store;
pub mod types;

pub use providers::{MemoryStore, RestStore};
pub use store::{AuthProvider, AuthSession, AuthUser, DataStore, StoreError};
pub use types::{Filter, Query, Record, Selection, SortOrder, record_id, value_to_plain};
