//! Location synchronization for Cirrus
//!
//! [`LocationSync`] owns the list of tracked locations, deduplicates new
//! entries by name or proximity, refreshes stale forecasts, and publishes the
//! list and a single-shot [`TransientStatus`] to subscribers.

pub mod clock;
pub mod geo;
pub mod status;
pub mod sync;
pub mod visited;

pub use clock::{Clock, SystemClock};
pub use geo::{distance_km, is_nearby};
pub use status::TransientStatus;
pub use sync::{LocationSync, SyncSettings};
pub use visited::VisitedPages;
