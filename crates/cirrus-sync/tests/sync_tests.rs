#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use cirrus_core::{FetchError, StoreError};
use cirrus_store::{
    LocationId, LocationStore, SqliteLocationStore, StoreHandle, StoreResult, TrackedLocation,
};
use cirrus_sync::{Clock, LocationSync, SyncSettings, TransientStatus};
use cirrus_weather::{
    CityCoordinates, CurrentConditions, DailySeries, ForecastBundle, HourlySeries,
    ReverseGeocoder, WeatherFetcher,
};

const T0: i64 = 1_714_557_600_000;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

struct ManualClock(AtomicI64);

impl ManualClock {
    fn advance_secs(&self, secs: i64) {
        self.0.fetch_add(secs * 1000, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

fn forecast(temperature: f64) -> ForecastBundle {
    ForecastBundle {
        current: CurrentConditions {
            temperature,
            humidity: 40,
            apparent_temperature: temperature - 1.0,
            wind_speed: 8.0,
            is_day: true,
            weather_code: 1,
            pressure_msl: 1015.0,
        },
        hourly: HourlySeries {
            time: (0..24).map(|h| format!("2024-05-01T{:02}:00", h)).collect(),
            temperature: vec![temperature; 24],
            humidity: vec![40; 24],
            wind_speed: vec![8.0; 24],
        },
        daily: DailySeries {
            time: (1..=7).map(|d| format!("2024-05-{:02}", d)).collect(),
            temperature_max: vec![temperature + 3.0; 7],
            temperature_min: vec![temperature - 5.0; 7],
            wind_speed_max: vec![15.0; 7],
        },
    }
}

#[derive(Default)]
struct FakeFetcher {
    cities: HashMap<String, CityCoordinates>,
    resolve_calls: AtomicUsize,
    forecast_calls: AtomicUsize,
    fail_forecast: AtomicBool,
    resolve_offline: AtomicBool,
    temperature: StdMutex<f64>,
    last_forecast_for: StdMutex<Option<(f64, f64)>>,
}

impl FakeFetcher {
    fn with_cities(cities: &[(&str, f64, f64)]) -> Self {
        let fetcher = Self {
            cities: cities
                .iter()
                .map(|(name, lat, lon)| {
                    (
                        name.to_lowercase(),
                        CityCoordinates {
                            name: (*name).to_string(),
                            latitude: *lat,
                            longitude: *lon,
                        },
                    )
                })
                .collect(),
            ..Self::default()
        };
        *fetcher.temperature.lock().unwrap() = 20.0;
        fetcher
    }

    fn forecast_calls(&self) -> usize {
        self.forecast_calls.load(Ordering::SeqCst)
    }

    fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    fn set_temperature(&self, temperature: f64) {
        *self.temperature.lock().unwrap() = temperature;
    }
}

#[async_trait]
impl WeatherFetcher for FakeFetcher {
    async fn resolve_city(&self, name: &str) -> Result<CityCoordinates, FetchError> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        if self.resolve_offline.load(Ordering::SeqCst) {
            return Err(FetchError::transport("network unreachable"));
        }
        self.cities
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| FetchError::NotFound(name.to_string()))
    }

    async fn fetch_forecast(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<ForecastBundle, FetchError> {
        self.forecast_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_forecast_for.lock().unwrap() = Some((latitude, longitude));
        if self.fail_forecast.load(Ordering::SeqCst) {
            return Err(FetchError::Upstream {
                status: 502,
                body: "bad gateway".into(),
            });
        }
        Ok(forecast(*self.temperature.lock().unwrap()))
    }
}

enum FakeGeocoder {
    Named(&'static str),
    Nothing,
    Failing,
}

#[async_trait]
impl ReverseGeocoder for FakeGeocoder {
    async fn reverse_geocode(&self, _: f64, _: f64) -> Result<Option<String>, FetchError> {
        match self {
            Self::Named(name) => Ok(Some((*name).to_string())),
            Self::Nothing => Ok(None),
            Self::Failing => Err(FetchError::timeout("reverse geocode timed out")),
        }
    }
}

/// Rejects every write; reads succeed with nothing.
struct BrokenStore;

impl LocationStore for BrokenStore {
    fn list_all(&self) -> StoreResult<Vec<TrackedLocation>> {
        Ok(Vec::new())
    }

    fn insert(&self, _: &TrackedLocation) -> StoreResult<LocationId> {
        Err(StoreError::persistence("disk full"))
    }

    fn update(&self, _: &TrackedLocation) -> StoreResult<()> {
        Err(StoreError::persistence("disk full"))
    }

    fn delete_by_id(&self, _: LocationId) -> StoreResult<()> {
        Err(StoreError::persistence("disk full"))
    }
}

struct Harness {
    sync: LocationSync,
    fetcher: Arc<FakeFetcher>,
    clock: Arc<ManualClock>,
    store: StoreHandle,
}

fn harness_with(store: StoreHandle, geocoder: FakeGeocoder) -> Harness {
    let fetcher = Arc::new(FakeFetcher::with_cities(&[
        ("Tokyo", 35.6895, 139.6917),
        ("Paris", 48.8566, 2.3522),
        ("London", 51.5074, -0.1278),
        ("Berlin", 52.52, 13.405),
        ("Madrid", 40.4168, -3.7038),
    ]));
    let clock = Arc::new(ManualClock(AtomicI64::new(T0)));
    let sync = LocationSync::new(
        fetcher.clone(),
        Arc::new(geocoder),
        store.clone(),
        SyncSettings::default(),
    )
    .with_clock(clock.clone());

    Harness {
        sync,
        fetcher,
        clock,
        store,
    }
}

fn harness() -> Harness {
    harness_with(
        StoreHandle::new(SqliteLocationStore::open_in_memory().unwrap()),
        FakeGeocoder::Named("Paris"),
    )
}

fn names(sync: &LocationSync) -> Vec<String> {
    sync.locations().into_iter().map(|l| l.name).collect()
}

// ---------------------------------------------------------------------------
// add_by_name
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_add_by_name_then_same_name_navigates() {
    let h = harness();

    h.sync.add_by_name("Tokyo").await;
    assert_eq!(h.sync.status(), TransientStatus::success("Added Tokyo"));

    let locations = h.sync.locations();
    assert_eq!(locations.len(), 1);
    assert_eq!(locations[0].name, "Tokyo");
    assert_eq!(locations[0].latitude, 35.6895);
    assert_eq!(locations[0].forecast.current.temperature, 20.0);
    assert!(locations[0].last_updated_at > 0);
    assert!(!locations[0].is_current_location);
    assert!(locations[0].id.is_some());

    h.sync.message_shown();
    h.sync.add_by_name("tokyo").await;
    assert_eq!(h.sync.status(), TransientStatus::NavigateToPage { index: 0 });
    assert_eq!(h.sync.locations().len(), 1);
    assert_eq!(h.fetcher.resolve_calls(), 1);
    assert_eq!(h.fetcher.forecast_calls(), 1);
}

#[tokio::test]
async fn test_add_by_name_persists_with_assigned_id() {
    let h = harness();
    h.sync.add_by_name("Paris").await;

    let stored = h.store.list_all().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0], h.sync.locations()[0]);
}

#[tokio::test]
async fn test_add_unknown_city() {
    let h = harness();
    h.sync.add_by_name("Nowhere").await;

    assert_eq!(
        h.sync.status(),
        TransientStatus::error("City not found: Nowhere")
    );
    assert!(h.sync.locations().is_empty());
    assert_eq!(h.fetcher.forecast_calls(), 0);
}

#[tokio::test]
async fn test_add_by_name_transport_error() {
    let h = harness();
    h.fetcher.resolve_offline.store(true, Ordering::SeqCst);
    h.sync.add_by_name("Tokyo").await;

    match h.sync.status() {
        TransientStatus::Error { message } => assert!(message.contains("network unreachable")),
        other => panic!("expected error, got {:?}", other),
    }
    assert!(h.sync.locations().is_empty());
}

#[tokio::test]
async fn test_add_by_name_forecast_failure_adds_nothing() {
    let h = harness();
    h.sync.add_by_name("Tokyo").await;
    h.fetcher.fail_forecast.store(true, Ordering::SeqCst);

    h.sync.add_by_name("Berlin").await;

    assert!(matches!(h.sync.status(), TransientStatus::Error { .. }));
    assert_eq!(names(&h.sync), vec!["Tokyo"]);
    assert_eq!(h.store.list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_navigate_to_unvisited_page_refreshes_it() {
    let h = harness();
    h.sync.add_by_name("Tokyo").await;
    h.sync.add_by_name("Paris").await;
    h.sync.remove_location(0).await;
    h.sync.add_by_name("Tokyo").await;
    // Paris (page 0) and Tokyo (page 1) are both visited after this
    assert_eq!(h.sync.visited_pages().await, vec![0, 1]);

    let store = StoreHandle::new(SqliteLocationStore::open_in_memory().unwrap());
    for name in ["Tokyo", "Paris"] {
        store
            .insert(TrackedLocation::new(name, 1.0, 1.0, forecast(5.0), 0))
            .await
            .unwrap();
    }
    let h = harness_with(store, FakeGeocoder::Nothing);
    h.sync.start().await;
    assert_eq!(h.fetcher.forecast_calls(), 1);

    h.sync.add_by_name("PARIS").await;
    assert_eq!(h.fetcher.forecast_calls(), 2);
    assert_eq!(h.sync.status(), TransientStatus::success("Updated Paris"));
    assert_eq!(h.sync.visited_pages().await, vec![0, 1]);
}

// ---------------------------------------------------------------------------
// add_current_location
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_current_location_nearby_navigates() {
    let h = harness();

    h.sync.add_current_location(48.85, 2.35).await;
    assert_eq!(h.sync.status(), TransientStatus::success("Added current location"));
    let first = h.sync.locations();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].name, "Paris");
    assert!(first[0].is_current_location);

    h.sync.add_current_location(48.86, 2.36).await;
    assert_eq!(h.sync.status(), TransientStatus::NavigateToPage { index: 0 });
    let second = h.sync.locations();
    assert_eq!(second.len(), 1);
    assert!(second[0].is_current_location);
    assert_eq!(h.fetcher.forecast_calls(), 1);
}

#[tokio::test]
async fn test_current_location_near_named_city_sets_flag() {
    let h = harness();
    h.sync.add_by_name("Paris").await;
    h.sync.add_current_location(48.86, 2.36).await;

    assert_eq!(h.sync.status(), TransientStatus::NavigateToPage { index: 0 });
    assert!(h.sync.locations()[0].is_current_location);
    assert!(h.store.list_all().await.unwrap()[0].is_current_location);
}

#[tokio::test]
async fn test_current_location_far_away_moves_flag() {
    let h = harness();
    h.sync.add_current_location(48.85, 2.35).await;
    h.sync.add_current_location(51.5074, -0.1278).await;

    let locations = h.sync.locations();
    assert_eq!(locations.len(), 2);
    assert!(!locations[0].is_current_location);
    assert!(locations[1].is_current_location);

    let stored = h.store.list_all().await.unwrap();
    assert_eq!(
        stored.iter().filter(|l| l.is_current_location).count(),
        1
    );
    assert!(stored[1].is_current_location);
}

#[tokio::test]
async fn test_nearby_existing_page_takes_flag_from_other() {
    let h = harness();
    h.sync.add_by_name("Berlin").await;
    h.sync.add_current_location(48.85, 2.35).await;
    h.sync.add_current_location(52.52, 13.40).await;

    let locations = h.sync.locations();
    assert_eq!(locations.len(), 2);
    assert!(locations[0].is_current_location);
    assert!(!locations[1].is_current_location);
    assert_eq!(h.sync.status(), TransientStatus::NavigateToPage { index: 0 });
}

#[tokio::test]
async fn test_current_location_name_fallbacks() {
    let h = harness_with(
        StoreHandle::new(SqliteLocationStore::open_in_memory().unwrap()),
        FakeGeocoder::Nothing,
    );
    h.sync.add_current_location(10.0, 10.0).await;
    assert_eq!(names(&h.sync), vec!["Current Location"]);

    let h = harness_with(
        StoreHandle::new(SqliteLocationStore::open_in_memory().unwrap()),
        FakeGeocoder::Failing,
    );
    h.sync.add_current_location(10.0, 10.0).await;
    assert_eq!(names(&h.sync), vec!["Unknown Location"]);
    assert_eq!(h.sync.status(), TransientStatus::success("Added current location"));
}

#[tokio::test]
async fn test_current_location_forecast_failure_adds_nothing() {
    let h = harness();
    h.sync.add_by_name("Tokyo").await;
    h.fetcher.fail_forecast.store(true, Ordering::SeqCst);

    h.sync.add_current_location(48.85, 2.35).await;

    assert!(matches!(h.sync.status(), TransientStatus::Error { .. }));
    assert_eq!(h.sync.locations().len(), 1);
}

#[tokio::test]
async fn test_current_location_rejects_invalid_coordinates() {
    let h = harness();
    h.sync.add_current_location(48.85, 2.35).await;

    h.sync.add_current_location(123.0, 2.35).await;

    assert!(matches!(h.sync.status(), TransientStatus::Error { .. }));
    assert_eq!(h.fetcher.forecast_calls(), 1);
    assert!(h.sync.locations()[0].is_current_location);
}

// ---------------------------------------------------------------------------
// refresh / paging
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_refresh_within_ttl_fetches_once() {
    let h = harness();
    h.sync.add_by_name("Tokyo").await;
    h.clock.advance_secs(300);
    h.fetcher.set_temperature(25.5);

    h.sync.refresh_location(0).await;
    assert_eq!(h.sync.status(), TransientStatus::success("Updated Tokyo"));
    h.clock.advance_secs(60);
    h.sync.refresh_location(0).await;
    assert_eq!(h.sync.status(), TransientStatus::success("Already up to date"));

    assert_eq!(h.fetcher.forecast_calls(), 2);
    let tokyo = &h.sync.locations()[0];
    assert_eq!(tokyo.forecast.current.temperature, 25.5);
    assert_eq!(tokyo.last_updated_at, T0 + 300_000);
    assert_eq!(h.store.list_all().await.unwrap()[0], *tokyo);
}

#[tokio::test]
async fn test_refresh_right_after_add_is_up_to_date() {
    let h = harness();
    h.sync.add_by_name("Tokyo").await;
    h.sync.refresh_location(0).await;

    assert_eq!(h.sync.status(), TransientStatus::success("Already up to date"));
    assert_eq!(h.fetcher.forecast_calls(), 1);
}

#[tokio::test]
async fn test_refresh_failure_keeps_stale_entry() {
    let h = harness();
    h.sync.add_by_name("Tokyo").await;
    let before = h.sync.locations()[0].clone();

    h.clock.advance_secs(600);
    h.fetcher.fail_forecast.store(true, Ordering::SeqCst);
    h.sync.refresh_location(0).await;

    assert_eq!(
        h.sync.status(),
        TransientStatus::error("Failed to refresh Tokyo")
    );
    assert_eq!(h.sync.locations()[0], before);
}

#[tokio::test]
async fn test_refresh_out_of_range_is_noop() {
    let h = harness();
    h.sync.refresh_location(3).await;
    h.sync.on_page_changed(3).await;

    assert!(h.sync.status().is_idle());
    assert!(h.sync.visited_pages().await.is_empty());
    assert_eq!(h.fetcher.forecast_calls(), 0);
}

#[tokio::test]
async fn test_page_change_refreshes_once_per_session() {
    let store = StoreHandle::new(SqliteLocationStore::open_in_memory().unwrap());
    for (name, lat, lon) in [("Tokyo", 35.6895, 139.6917), ("Paris", 48.8566, 2.3522)] {
        store
            .insert(TrackedLocation::new(name, lat, lon, forecast(3.0), 0))
            .await
            .unwrap();
    }
    let h = harness_with(store, FakeGeocoder::Nothing);

    h.sync.start().await;
    h.sync.on_page_changed(1).await;
    assert_eq!(h.fetcher.forecast_calls(), 2);
    assert_eq!(h.sync.status(), TransientStatus::success("Updated Paris"));

    h.clock.advance_secs(3600);
    h.sync.on_page_changed(1).await;
    assert_eq!(h.fetcher.forecast_calls(), 2);

    h.sync.refresh_location(1).await;
    assert_eq!(h.fetcher.forecast_calls(), 3);
}

#[tokio::test]
async fn test_failed_page_refresh_is_not_retried_lazily() {
    let store = StoreHandle::new(SqliteLocationStore::open_in_memory().unwrap());
    store
        .insert(TrackedLocation::new("Tokyo", 35.6895, 139.6917, forecast(3.0), 0))
        .await
        .unwrap();
    let h = harness_with(store, FakeGeocoder::Nothing);
    h.fetcher.fail_forecast.store(true, Ordering::SeqCst);

    h.sync.start().await;
    assert_eq!(h.sync.status(), TransientStatus::error("Failed to refresh Tokyo"));

    h.sync.on_page_changed(0).await;
    assert_eq!(h.fetcher.forecast_calls(), 1);
}

// ---------------------------------------------------------------------------
// remove_location
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_remove_shifts_visited_and_targets_correct_location() {
    let h = harness();
    for name in ["Tokyo", "Paris", "London"] {
        h.sync.add_by_name(name).await;
    }
    assert_eq!(h.sync.visited_pages().await, vec![0, 1, 2]);

    h.sync.remove_location(0).await;
    assert_eq!(names(&h.sync), vec!["Paris", "London"]);
    assert_eq!(h.sync.visited_pages().await, vec![0, 1]);

    h.clock.advance_secs(300);
    h.sync.refresh_location(1).await;
    assert_eq!(h.sync.status(), TransientStatus::success("Updated London"));
    assert_eq!(
        *h.fetcher.last_forecast_for.lock().unwrap(),
        Some((51.5074, -0.1278))
    );
}

#[tokio::test]
async fn test_remove_deletes_from_store() {
    let h = harness();
    h.sync.add_by_name("Tokyo").await;
    h.sync.add_by_name("Paris").await;

    h.sync.remove_location(1).await;

    let stored = h.store.list_all().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "Tokyo");
}

#[tokio::test]
async fn test_remove_out_of_range_is_noop() {
    let h = harness();
    h.sync.add_by_name("Tokyo").await;
    h.sync.remove_location(1).await;
    assert_eq!(h.sync.locations().len(), 1);
}

#[tokio::test]
async fn test_visited_index_follows_shifted_page() {
    let store = StoreHandle::new(SqliteLocationStore::open_in_memory().unwrap());
    for (name, lat, lon) in [
        ("Tokyo", 35.6895, 139.6917),
        ("Paris", 48.8566, 2.3522),
        ("Madrid", 40.4168, -3.7038),
    ] {
        store
            .insert(TrackedLocation::new(name, lat, lon, forecast(3.0), 0))
            .await
            .unwrap();
    }
    let h = harness_with(store, FakeGeocoder::Nothing);
    h.sync.start().await;
    h.sync.on_page_changed(2).await;
    assert_eq!(h.fetcher.forecast_calls(), 2);

    h.sync.remove_location(1).await;
    assert_eq!(h.sync.visited_pages().await, vec![0, 1]);

    // Madrid moved to page 1 and was already refreshed
    h.sync.on_page_changed(1).await;
    assert_eq!(h.fetcher.forecast_calls(), 2);
}

// ---------------------------------------------------------------------------
// startup / status / persistence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_start_refreshes_first_page_only() {
    let store = StoreHandle::new(SqliteLocationStore::open_in_memory().unwrap());
    for (name, lat, lon) in [
        ("Tokyo", 35.6895, 139.6917),
        ("Paris", 48.8566, 2.3522),
        ("Madrid", 40.4168, -3.7038),
    ] {
        store
            .insert(TrackedLocation::new(name, lat, lon, forecast(3.0), 0))
            .await
            .unwrap();
    }
    let h = harness_with(store, FakeGeocoder::Nothing);

    h.sync.start().await;

    assert_eq!(names(&h.sync), vec!["Tokyo", "Paris", "Madrid"]);
    assert_eq!(h.fetcher.forecast_calls(), 1);
    assert_eq!(h.sync.visited_pages().await, vec![0]);
    assert_eq!(h.sync.status(), TransientStatus::success("Updated Tokyo"));

    let locations = h.sync.locations();
    assert_eq!(locations[0].last_updated_at, T0);
    assert_eq!(locations[1].last_updated_at, 0);
}

#[tokio::test]
async fn test_start_with_fresh_first_page_skips_fetch() {
    let store = StoreHandle::new(SqliteLocationStore::open_in_memory().unwrap());
    store
        .insert(TrackedLocation::new("Tokyo", 35.6895, 139.6917, forecast(3.0), T0 - 30_000))
        .await
        .unwrap();
    let h = harness_with(store, FakeGeocoder::Nothing);

    h.sync.start().await;

    assert_eq!(h.fetcher.forecast_calls(), 0);
    assert_eq!(h.sync.status(), TransientStatus::success("Already up to date"));
    assert_eq!(h.sync.visited_pages().await, vec![0]);
}

#[tokio::test]
async fn test_start_empty_store() {
    let h = harness();
    h.sync.start().await;

    assert!(h.sync.locations().is_empty());
    assert!(h.sync.status().is_idle());
    assert_eq!(h.fetcher.forecast_calls(), 0);
}

#[tokio::test]
async fn test_message_shown_resets_status() {
    let h = harness();
    h.sync.add_by_name("Nowhere").await;
    assert!(!h.sync.status().is_idle());

    h.sync.message_shown();
    assert_eq!(h.sync.status(), TransientStatus::Idle);
}

#[tokio::test]
async fn test_subscribers_see_new_snapshots() {
    let h = harness();
    let mut locations_rx = h.sync.subscribe_locations();
    let mut status_rx = h.sync.subscribe_status();

    h.sync.add_by_name("Tokyo").await;

    assert!(locations_rx.has_changed().unwrap());
    assert_eq!(locations_rx.borrow_and_update().len(), 1);
    assert!(status_rx.has_changed().unwrap());
    assert_eq!(
        *status_rx.borrow_and_update(),
        TransientStatus::success("Added Tokyo")
    );
}

#[tokio::test]
async fn test_persistence_failure_is_not_fatal() {
    let h = harness_with(StoreHandle::new(BrokenStore), FakeGeocoder::Nothing);

    h.sync.add_by_name("Tokyo").await;
    assert_eq!(h.sync.status(), TransientStatus::success("Added Tokyo"));
    assert_eq!(h.sync.locations().len(), 1);
    assert_eq!(h.sync.locations()[0].id, None);

    h.sync.remove_location(0).await;
    assert!(h.sync.locations().is_empty());
}

#[tokio::test]
async fn test_unpersisted_entry_still_refreshes() {
    let h = harness_with(StoreHandle::new(BrokenStore), FakeGeocoder::Nothing);
    h.sync.add_by_name("Tokyo").await;
    assert_eq!(h.sync.locations()[0].id, None);

    // The id-less entry stays usable; a refresh keeps it in memory.
    h.clock.advance_secs(300);
    h.sync.refresh_location(0).await;
    assert_eq!(h.sync.status(), TransientStatus::success("Updated Tokyo"));
    assert_eq!(h.sync.locations()[0].last_updated_at, T0 + 300_000);
}

#[tokio::test]
async fn test_operations_are_serialized() {
    let h = Arc::new(harness());

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let h = h.clone();
        tasks.push(tokio::spawn(async move {
            h.sync.add_by_name("Tokyo").await;
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(h.sync.locations().len(), 1);
    assert_eq!(h.fetcher.resolve_calls(), 1);
    assert_eq!(h.store.list_all().await.unwrap().len(), 1);
}
