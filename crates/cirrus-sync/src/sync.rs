//! The location synchronization core.
//!
//! Owns the ordered list of tracked locations, decides when a forecast is
//! stale, and keeps the store in step with the in-memory list. Every
//! mutating operation holds the state lock for its whole duration, network
//! calls included, so operations never interleave.

use std::sync::Arc;

use cirrus_core::{FetchError, SyncConfig};
use cirrus_store::{StoreHandle, TrackedLocation};
use cirrus_weather::{validate_coordinates, ReverseGeocoder, WeatherFetcher};
use tokio::sync::{watch, Mutex};

use crate::clock::{Clock, SystemClock};
use crate::geo::is_nearby;
use crate::status::TransientStatus;
use crate::visited::VisitedPages;

const CURRENT_LOCATION_FALLBACK: &str = "Current Location";
const UNKNOWN_LOCATION_FALLBACK: &str = "Unknown Location";

/// Staleness and dedup tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncSettings {
    /// A forecast younger than this is not refetched.
    pub freshness_ttl_ms: i64,
    /// Coordinates closer than this are the same place.
    pub nearby_threshold_km: f64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            freshness_ttl_ms: 120_000,
            nearby_threshold_km: 10.0,
        }
    }
}

impl From<&SyncConfig> for SyncSettings {
    fn from(config: &SyncConfig) -> Self {
        Self {
            freshness_ttl_ms: i64::try_from(config.freshness_ttl_secs)
                .unwrap_or(i64::MAX / 1000)
                .saturating_mul(1000),
            nearby_threshold_km: config.nearby_threshold_km,
        }
    }
}

#[derive(Default)]
struct SyncState {
    locations: Vec<TrackedLocation>,
    visited: VisitedPages,
}

pub struct LocationSync {
    fetcher: Arc<dyn WeatherFetcher>,
    geocoder: Arc<dyn ReverseGeocoder>,
    store: StoreHandle,
    clock: Arc<dyn Clock>,
    settings: SyncSettings,
    state: Mutex<SyncState>,
    locations_tx: watch::Sender<Vec<TrackedLocation>>,
    status_tx: watch::Sender<TransientStatus>,
}

impl LocationSync {
    pub fn new(
        fetcher: Arc<dyn WeatherFetcher>,
        geocoder: Arc<dyn ReverseGeocoder>,
        store: StoreHandle,
        settings: SyncSettings,
    ) -> Self {
        let (locations_tx, _) = watch::channel(Vec::new());
        let (status_tx, _) = watch::channel(TransientStatus::Idle);

        Self {
            fetcher,
            geocoder,
            store,
            clock: Arc::new(SystemClock),
            settings,
            state: Mutex::new(SyncState::default()),
            locations_tx,
            status_tx,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> SyncSettings {
        self.settings
    }

    /// Snapshot of the tracked list, in page order.
    pub fn locations(&self) -> Vec<TrackedLocation> {
        self.locations_tx.borrow().clone()
    }

    pub fn subscribe_locations(&self) -> watch::Receiver<Vec<TrackedLocation>> {
        self.locations_tx.subscribe()
    }

    pub fn status(&self) -> TransientStatus {
        self.status_tx.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<TransientStatus> {
        self.status_tx.subscribe()
    }

    /// Pages already refreshed this session, ascending.
    pub async fn visited_pages(&self) -> Vec<usize> {
        self.state.lock().await.visited.to_vec()
    }

    /// Load persisted locations and eagerly refresh the first page.
    ///
    /// Other pages stay as loaded until they are first shown.
    pub async fn start(&self) {
        let mut state = self.state.lock().await;

        state.locations = match self.store.list_all().await {
            Ok(locations) => locations,
            Err(e) => {
                tracing::error!("Failed to load saved locations, starting empty: {}", e);
                Vec::new()
            }
        };
        state.visited = VisitedPages::default();
        tracing::info!("Loaded {} saved locations", state.locations.len());
        self.publish(&state);

        if !state.locations.is_empty() {
            self.refresh_and_mark(&mut state, 0).await;
        }
    }

    /// Add a city by name, or jump to it if a page with that name exists.
    pub async fn add_by_name(&self, city_name: &str) {
        let mut state = self.state.lock().await;
        let query = city_name.trim();

        if let Some(index) = state.locations.iter().position(|l| l.has_name(query)) {
            tracing::debug!("{} is already tracked at page {}", query, index);
            self.emit(TransientStatus::NavigateToPage { index });
            if !state.visited.contains(index) {
                self.refresh_and_mark(&mut state, index).await;
            }
            return;
        }

        self.emit(TransientStatus::Loading);

        let city = match self.fetcher.resolve_city(query).await {
            Ok(city) => city,
            Err(FetchError::NotFound(_)) => {
                self.emit(TransientStatus::error(format!("City not found: {}", query)));
                return;
            }
            Err(e) => {
                tracing::warn!("Failed to resolve {}: {}", query, e);
                self.emit(TransientStatus::error(e.to_string()));
                return;
            }
        };

        let forecast = match self.fetcher.fetch_forecast(city.latitude, city.longitude).await {
            Ok(forecast) => forecast,
            Err(e) => {
                tracing::warn!("Failed to fetch forecast for {}: {}", city.name, e);
                self.emit(TransientStatus::error(e.to_string()));
                return;
            }
        };

        let location = TrackedLocation::new(
            city.name,
            city.latitude,
            city.longitude,
            forecast,
            self.clock.now_millis(),
        );
        let index = self.append(&mut state, location).await;

        tracing::info!("Added {} at page {}", query, index);
        self.emit(TransientStatus::success(format!("Added {}", query)));
    }

    /// Track the device position, or jump to an existing page within the
    /// nearby threshold and make it the current-location page.
    pub async fn add_current_location(&self, latitude: f64, longitude: f64) {
        if let Err(e) = validate_coordinates(latitude, longitude) {
            self.emit(TransientStatus::error(e.to_string()));
            return;
        }

        let mut state = self.state.lock().await;
        let threshold = self.settings.nearby_threshold_km;

        let nearby = state.locations.iter().position(|l| {
            is_nearby(l.latitude, l.longitude, latitude, longitude, threshold)
        });

        if let Some(index) = nearby {
            tracing::debug!("Current position matches page {}", index);
            if !state.locations[index].is_current_location {
                self.clear_current_flags(&mut state).await;
                state.locations[index].is_current_location = true;
                self.persist(&mut state.locations[index]).await;
                self.publish(&state);
            }
            self.emit(TransientStatus::NavigateToPage { index });
            if !state.visited.contains(index) {
                self.refresh_and_mark(&mut state, index).await;
            }
            return;
        }

        self.emit(TransientStatus::Loading);

        let name = match self.geocoder.reverse_geocode(latitude, longitude).await {
            Ok(Some(name)) => name,
            Ok(None) => CURRENT_LOCATION_FALLBACK.to_string(),
            Err(e) => {
                tracing::warn!("Reverse geocoding failed: {}", e);
                UNKNOWN_LOCATION_FALLBACK.to_string()
            }
        };

        // At most one current-location page, even if the fetch below fails.
        self.clear_current_flags(&mut state).await;
        self.publish(&state);

        let forecast = match self.fetcher.fetch_forecast(latitude, longitude).await {
            Ok(forecast) => forecast,
            Err(e) => {
                tracing::warn!("Failed to fetch forecast for current location: {}", e);
                self.emit(TransientStatus::error(e.to_string()));
                return;
            }
        };

        let location =
            TrackedLocation::new(name, latitude, longitude, forecast, self.clock.now_millis())
                .with_current_location(true);
        let index = self.append(&mut state, location).await;

        tracing::info!("Added current location at page {}", index);
        self.emit(TransientStatus::success("Added current location"));
    }

    /// Drop the page at `index`. Out-of-range indices are ignored.
    pub async fn remove_location(&self, index: usize) {
        let mut state = self.state.lock().await;
        if index >= state.locations.len() {
            tracing::debug!("Ignoring removal of page {}: out of range", index);
            return;
        }

        let removed = state.locations.remove(index);
        if let Some(id) = removed.id {
            if let Err(e) = self.store.delete_by_id(id).await {
                tracing::error!("Failed to delete {} ({}): {}", removed.name, id, e);
            }
        }
        state.visited.remove_and_shift(index);
        self.publish(&state);

        tracing::info!("Removed {} from page {}", removed.name, index);
    }

    /// Explicit refresh: ignores whether the page was already refreshed this
    /// session but still honours the freshness window.
    pub async fn refresh_location(&self, index: usize) {
        let mut state = self.state.lock().await;
        self.refresh_and_mark(&mut state, index).await;
    }

    /// Lazy refresh: only the first time a page becomes visible.
    pub async fn on_page_changed(&self, index: usize) {
        let mut state = self.state.lock().await;
        if !state.visited.contains(index) {
            self.refresh_and_mark(&mut state, index).await;
        }
    }

    /// The consumer has handled the current status.
    pub fn message_shown(&self) {
        self.emit(TransientStatus::Idle);
    }

    async fn refresh_and_mark(&self, state: &mut SyncState, index: usize) {
        if index >= state.locations.len() {
            return;
        }
        self.refresh_if_stale(state, index).await;
        state.visited.insert(index);
    }

    async fn refresh_if_stale(&self, state: &mut SyncState, index: usize) {
        let Some(location) = state.locations.get(index) else {
            return;
        };

        if location.is_fresh(self.clock.now_millis(), self.settings.freshness_ttl_ms) {
            self.emit(TransientStatus::success("Already up to date"));
            return;
        }

        let name = location.name.clone();
        let (latitude, longitude) = (location.latitude, location.longitude);

        self.emit(TransientStatus::Loading);
        match self.fetcher.fetch_forecast(latitude, longitude).await {
            Ok(forecast) => {
                let now = self.clock.now_millis();
                let entry = &mut state.locations[index];
                entry.forecast = forecast;
                entry.last_updated_at = entry.last_updated_at.max(now);

                self.persist(&mut state.locations[index]).await;
                self.publish(state);
                tracing::info!("Updated {}", name);
                self.emit(TransientStatus::success(format!("Updated {}", name)));
            }
            Err(e) => {
                tracing::warn!("Failed to refresh {}: {}", name, e);
                self.emit(TransientStatus::error(format!("Failed to refresh {}", name)));
            }
        }
    }

    /// Push a new page, persist it and mark it visited. Returns its index.
    async fn append(&self, state: &mut SyncState, location: TrackedLocation) -> usize {
        state.locations.push(location);
        let index = state.locations.len() - 1;

        self.persist(&mut state.locations[index]).await;
        state.visited.insert(index);
        self.publish(state);
        index
    }

    async fn clear_current_flags(&self, state: &mut SyncState) {
        for location in state.locations.iter_mut().filter(|l| l.is_current_location) {
            location.is_current_location = false;
            self.persist(location).await;
        }
    }

    /// Write `location` through to the store. Failures are logged; the
    /// in-memory entry stays authoritative. An entry that never received an
    /// id is inserted instead and adopts the new id.
    async fn persist(&self, location: &mut TrackedLocation) {
        match location.id {
            Some(id) => {
                if let Err(e) = self.store.update(location.clone()).await {
                    tracing::error!("Failed to save {} ({}): {}", location.name, id, e);
                }
            }
            None => match self.store.insert(location.clone()).await {
                Ok(id) => location.id = Some(id),
                Err(e) => tracing::error!("Failed to save {}: {}", location.name, e),
            },
        }
    }

    fn publish(&self, state: &SyncState) {
        self.locations_tx.send_replace(state.locations.clone());
    }

    fn emit(&self, status: TransientStatus) {
        tracing::debug!("Status: {:?}", status);
        self.status_tx.send_replace(status);
    }
}
