//! SQLite-based location storage.
//!
//! One row per location. Current conditions live in scalar columns; the
//! hourly and daily series are stored as encoded lists (see [`crate::codec`]).

use std::path::Path;

use cirrus_core::{RusqliteErrorExt, StoreError};
use cirrus_weather::{CurrentConditions, DailySeries, ForecastBundle, HourlySeries};
use rusqlite::{params, Connection, OptionalExtension};

use crate::backend::{require_id, LocationStore, StoreResult};
use crate::codec::{decode_list, encode_list};
use crate::location::{LocationId, TrackedLocation};

const SELECT_COLUMNS: &str = "id, city_name, latitude, longitude, is_current_location, \
     current_temp, current_humidity, current_apparent_temp, current_wind_speed, \
     current_is_day, current_weather_code, current_pressure, \
     hourly_time, hourly_temp, hourly_humidity, hourly_wind_speed, \
     daily_time, daily_temp_max, daily_temp_min, daily_wind_max, \
     last_updated";

/// SQLite-based location storage.
pub struct SqliteLocationStore {
    conn: Connection,
}

/// A row as read, before the list columns are decoded.
struct RawRow {
    id: i64,
    name: String,
    latitude: f64,
    longitude: f64,
    is_current_location: i32,
    current: CurrentConditions,
    hourly_time: Option<String>,
    hourly_temp: Option<String>,
    hourly_humidity: Option<String>,
    hourly_wind_speed: Option<String>,
    daily_time: Option<String>,
    daily_temp_max: Option<String>,
    daily_temp_min: Option<String>,
    daily_wind_max: Option<String>,
    last_updated: i64,
}

impl RawRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        let is_day: i32 = row.get(9)?;
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            latitude: row.get(2)?,
            longitude: row.get(3)?,
            is_current_location: row.get(4)?,
            current: CurrentConditions {
                temperature: row.get(5)?,
                humidity: row.get(6)?,
                apparent_temperature: row.get(7)?,
                wind_speed: row.get(8)?,
                is_day: is_day != 0,
                weather_code: row.get(10)?,
                pressure_msl: row.get(11)?,
            },
            hourly_time: row.get(12)?,
            hourly_temp: row.get(13)?,
            hourly_humidity: row.get(14)?,
            hourly_wind_speed: row.get(15)?,
            daily_time: row.get(16)?,
            daily_temp_max: row.get(17)?,
            daily_temp_min: row.get(18)?,
            daily_wind_max: row.get(19)?,
            last_updated: row.get(20)?,
        })
    }

    fn into_location(self) -> StoreResult<TrackedLocation> {
        let forecast = ForecastBundle {
            current: self.current,
            hourly: HourlySeries {
                time: decode_list(self.hourly_time.as_deref())?,
                temperature: decode_list(self.hourly_temp.as_deref())?,
                humidity: decode_list(self.hourly_humidity.as_deref())?,
                wind_speed: decode_list(self.hourly_wind_speed.as_deref())?,
            },
            daily: DailySeries {
                time: decode_list(self.daily_time.as_deref())?,
                temperature_max: decode_list(self.daily_temp_max.as_deref())?,
                temperature_min: decode_list(self.daily_temp_min.as_deref())?,
                wind_speed_max: decode_list(self.daily_wind_max.as_deref())?,
            },
        };
        forecast
            .validate()
            .map_err(|e| StoreError::parse(e.to_string()))?;

        Ok(TrackedLocation {
            id: Some(self.id),
            name: self.name,
            latitude: self.latitude,
            longitude: self.longitude,
            is_current_location: self.is_current_location != 0,
            forecast,
            last_updated_at: self.last_updated,
        })
    }
}

/// Encoded list columns for one forecast, in column order.
struct EncodedSeries([String; 8]);

impl EncodedSeries {
    fn new(forecast: &ForecastBundle) -> StoreResult<Self> {
        Ok(Self([
            encode_list(&forecast.hourly.time)?,
            encode_list(&forecast.hourly.temperature)?,
            encode_list(&forecast.hourly.humidity)?,
            encode_list(&forecast.hourly.wind_speed)?,
            encode_list(&forecast.daily.time)?,
            encode_list(&forecast.daily.temperature_max)?,
            encode_list(&forecast.daily.temperature_min)?,
            encode_list(&forecast.daily.wind_speed_max)?,
        ]))
    }
}

impl SqliteLocationStore {
    /// Open (or create) the location database at `path`.
    ///
    /// Creates the schema if it doesn't exist and upgrades older layouts.
    pub fn new<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory store, used by tests across the workspace.
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize the database schema.
    ///
    /// Tables written before staleness tracking existed have no `last_updated`
    /// column; it is added in place and existing rows read as never fetched.
    fn init_schema(&self) -> anyhow::Result<()> {
        if self.detect_missing_last_updated()? {
            tracing::info!("Upgrading locations table: adding last_updated column");
            self.conn
                .execute_batch(
                    "ALTER TABLE locations ADD COLUMN last_updated INTEGER NOT NULL DEFAULT 0;",
                )
                .map_err(|e| anyhow::anyhow!("Failed to add last_updated column: {}", e))?;
        }

        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS locations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                city_name TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                is_current_location INTEGER NOT NULL DEFAULT 0,
                current_temp REAL NOT NULL,
                current_humidity INTEGER NOT NULL,
                current_apparent_temp REAL NOT NULL,
                current_wind_speed REAL NOT NULL,
                current_is_day INTEGER NOT NULL,
                current_weather_code INTEGER NOT NULL,
                current_pressure REAL NOT NULL,
                hourly_time TEXT,
                hourly_temp TEXT,
                hourly_humidity TEXT,
                hourly_wind_speed TEXT,
                daily_time TEXT,
                daily_temp_max TEXT,
                daily_temp_min TEXT,
                daily_wind_max TEXT,
                last_updated INTEGER NOT NULL DEFAULT 0
            );
            "#,
        )?;
        Ok(())
    }

    fn detect_missing_last_updated(&self) -> anyhow::Result<bool> {
        let table_exists: i32 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='locations'",
            [],
            |row| row.get(0),
        )?;
        if table_exists == 0 {
            return Ok(false);
        }

        let columns: Vec<String> = self
            .conn
            .prepare("PRAGMA table_info(locations)")?
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(!columns.iter().any(|name| name == "last_updated"))
    }

    /// Check if a location exists by ID.
    pub fn exists(&self, id: LocationId) -> StoreResult<bool> {
        let count: i32 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM locations WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .map_err(RusqliteErrorExt::into_store_error)?;
        Ok(count > 0)
    }

    /// Highest id the table has ever handed out, deleted rows included.
    pub fn highest_assigned_id(&self) -> StoreResult<LocationId> {
        let has_sequence: bool = self
            .conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'sqlite_sequence')",
                [],
                |row| row.get(0),
            )
            .map_err(RusqliteErrorExt::into_store_error)?;

        let sequence: Option<LocationId> = if has_sequence {
            self.conn
                .query_row(
                    "SELECT seq FROM sqlite_sequence WHERE name = 'locations'",
                    [],
                    |row| row.get(0),
                )
                .optional()
                .map_err(RusqliteErrorExt::into_store_error)?
        } else {
            None
        };

        let max_id: Option<LocationId> = self
            .conn
            .query_row("SELECT MAX(id) FROM locations", [], |row| row.get(0))
            .map_err(RusqliteErrorExt::into_store_error)?;

        Ok(sequence.unwrap_or(0).max(max_id.unwrap_or(0)))
    }

    /// Id of a row with exactly this name and coordinates, if any.
    pub fn find_place(
        &self,
        name: &str,
        latitude: f64,
        longitude: f64,
    ) -> StoreResult<Option<LocationId>> {
        self.conn
            .query_row(
                "SELECT id FROM locations WHERE city_name = ?1 AND latitude = ?2 AND longitude = ?3",
                params![name, latitude, longitude],
                |row| row.get(0),
            )
            .optional()
            .map_err(RusqliteErrorExt::into_store_error)
    }

    /// Get the location count.
    pub fn count(&self) -> StoreResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM locations", [], |row| row.get(0))
            .map_err(RusqliteErrorExt::into_store_error)?;
        Ok(count as usize)
    }
}

impl LocationStore for SqliteLocationStore {
    fn list_all(&self) -> StoreResult<Vec<TrackedLocation>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM locations ORDER BY id", SELECT_COLUMNS))
            .map_err(RusqliteErrorExt::into_store_error)?;

        let rows = stmt
            .query_map([], RawRow::from_row)
            .map_err(RusqliteErrorExt::into_store_error)?;

        let mut locations = Vec::new();
        for row in rows {
            let raw = row.map_err(RusqliteErrorExt::into_store_error)?;
            let id = raw.id;
            match raw.into_location() {
                Ok(location) => locations.push(location),
                Err(e) => tracing::warn!("Skipping unreadable location row {}: {}", id, e),
            }
        }
        Ok(locations)
    }

    fn insert(&self, location: &TrackedLocation) -> StoreResult<LocationId> {
        let [ht, htemp, hhum, hwind, dt, dmax, dmin, dwind] =
            EncodedSeries::new(&location.forecast)?.0;
        let current = &location.forecast.current;

        self.conn
            .execute(
                "INSERT INTO locations (id, city_name, latitude, longitude, is_current_location,
                     current_temp, current_humidity, current_apparent_temp, current_wind_speed,
                     current_is_day, current_weather_code, current_pressure,
                     hourly_time, hourly_temp, hourly_humidity, hourly_wind_speed,
                     daily_time, daily_temp_max, daily_temp_min, daily_wind_max,
                     last_updated)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                         ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)",
                params![
                    location.id,
                    location.name,
                    location.latitude,
                    location.longitude,
                    location.is_current_location as i32,
                    current.temperature,
                    current.humidity,
                    current.apparent_temperature,
                    current.wind_speed,
                    current.is_day as i32,
                    current.weather_code,
                    current.pressure_msl,
                    ht,
                    htemp,
                    hhum,
                    hwind,
                    dt,
                    dmax,
                    dmin,
                    dwind,
                    location.last_updated_at,
                ],
            )
            .map_err(RusqliteErrorExt::into_store_error)?;

        let id = self.conn.last_insert_rowid();
        tracing::debug!("Inserted location {} ({})", id, location.name);
        Ok(id)
    }

    fn update(&self, location: &TrackedLocation) -> StoreResult<()> {
        let id = require_id(location)?;
        let [ht, htemp, hhum, hwind, dt, dmax, dmin, dwind] =
            EncodedSeries::new(&location.forecast)?.0;
        let current = &location.forecast.current;

        let rows_affected = self
            .conn
            .execute(
                "UPDATE locations SET city_name = ?2, latitude = ?3, longitude = ?4,
                     is_current_location = ?5, current_temp = ?6, current_humidity = ?7,
                     current_apparent_temp = ?8, current_wind_speed = ?9, current_is_day = ?10,
                     current_weather_code = ?11, current_pressure = ?12,
                     hourly_time = ?13, hourly_temp = ?14, hourly_humidity = ?15,
                     hourly_wind_speed = ?16, daily_time = ?17, daily_temp_max = ?18,
                     daily_temp_min = ?19, daily_wind_max = ?20, last_updated = ?21
                 WHERE id = ?1",
                params![
                    id,
                    location.name,
                    location.latitude,
                    location.longitude,
                    location.is_current_location as i32,
                    current.temperature,
                    current.humidity,
                    current.apparent_temperature,
                    current.wind_speed,
                    current.is_day as i32,
                    current.weather_code,
                    current.pressure_msl,
                    ht,
                    htemp,
                    hhum,
                    hwind,
                    dt,
                    dmax,
                    dmin,
                    dwind,
                    location.last_updated_at,
                ],
            )
            .map_err(RusqliteErrorExt::into_store_error)?;

        if rows_affected == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    fn delete_by_id(&self, id: LocationId) -> StoreResult<()> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM locations WHERE id = ?1", params![id])
            .map_err(RusqliteErrorExt::into_store_error)?;

        if rows_affected == 0 {
            return Err(StoreError::NotFound(id));
        }
        tracing::debug!("Deleted location {}", id);
        Ok(())
    }
}
