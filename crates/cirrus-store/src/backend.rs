//! Location storage backend trait.
//!
//! Two implementations exist: [`crate::SqliteLocationStore`] (row per
//! location) and [`crate::JsonLocationStore`] (single flat document).

use cirrus_core::StoreError;

use crate::location::{LocationId, TrackedLocation};

/// Result type for location store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Durable keyed storage of tracked locations.
///
/// Implementations are blocking and don't need to be Sync; the
/// [`crate::StoreHandle`] wrapper serializes access through a mutex.
pub trait LocationStore: Send {
    /// All persisted locations in store order.
    fn list_all(&self) -> StoreResult<Vec<TrackedLocation>>;

    /// Persist a new location and return its id.
    ///
    /// A location that already carries an id keeps it; otherwise a fresh id
    /// is assigned that has never been handed out before.
    fn insert(&self, location: &TrackedLocation) -> StoreResult<LocationId>;

    /// Overwrite every field of an already persisted location.
    ///
    /// # Errors
    /// `StoreError::NotFound` when no row has the location's id.
    fn update(&self, location: &TrackedLocation) -> StoreResult<()>;

    /// # Errors
    /// `StoreError::NotFound` when no row has this id.
    fn delete_by_id(&self, id: LocationId) -> StoreResult<()>;
}

pub(crate) fn require_id(location: &TrackedLocation) -> StoreResult<LocationId> {
    location.id.ok_or_else(|| {
        StoreError::persistence(format!(
            "Location '{}' has not been persisted yet",
            location.name
        ))
    })
}
