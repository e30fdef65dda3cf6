//! Location persistence for Cirrus
//!
//! Tracked locations with their last-known forecasts, stored either in SQLite
//! (one row per location) or in a single JSON document, plus the one-way
//! migration from the latter to the former.

pub mod backend;
pub mod codec;
pub mod handle;
pub mod json_store;
pub mod location;
pub mod migrate;
pub mod sqlite_store;

pub use backend::{LocationStore, StoreResult};
pub use handle::StoreHandle;
pub use json_store::JsonLocationStore;
pub use location::{LocationId, TrackedLocation};
pub use migrate::{migrate_from_json, migrate_legacy_file, MigrationResult};
pub use sqlite_store::SqliteLocationStore;
