//! Point views and derived values over the parallel-array forecast series.

use chrono::{NaiveDate, NaiveDateTime, Timelike};

use crate::types::{check_lengths, DailySeries, HourlySeries, SeriesLengthMismatch};

/// Timestamp layout used by the forecast API for hourly entries.
pub const HOURLY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";
/// Date layout used for daily entries.
pub const DAILY_DATE_FORMAT: &str = "%Y-%m-%d";

/// One hour of an [`HourlySeries`].
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyPoint<'a> {
    pub time: &'a str,
    pub temperature: f64,
    pub humidity: i32,
    pub wind_speed: f64,
}

/// One day of a [`DailySeries`].
#[derive(Debug, Clone, PartialEq)]
pub struct DailyPoint<'a> {
    pub date: &'a str,
    pub temperature_max: f64,
    pub temperature_min: f64,
    pub wind_speed_max: f64,
}

impl HourlySeries {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn validate(&self) -> Result<(), SeriesLengthMismatch> {
        check_lengths(
            "hourly",
            vec![
                ("time", self.time.len()),
                ("temperature", self.temperature.len()),
                ("humidity", self.humidity.len()),
                ("wind_speed", self.wind_speed.len()),
            ],
        )
    }

    pub fn point(&self, index: usize) -> Option<HourlyPoint<'_>> {
        Some(HourlyPoint {
            time: self.time.get(index)?,
            temperature: *self.temperature.get(index)?,
            humidity: *self.humidity.get(index)?,
            wind_speed: *self.wind_speed.get(index)?,
        })
    }

    pub fn points(&self) -> impl Iterator<Item = HourlyPoint<'_>> {
        (0..self.len()).filter_map(|i| self.point(i))
    }

    /// Mean humidity (truncated) over the hours that fall on `date` (`YYYY-MM-DD`).
    ///
    /// Returns 0 when the date does not parse or no hour matches.
    pub fn daily_humidity_average(&self, date: &str) -> i32 {
        let Ok(target) = NaiveDate::parse_from_str(date, DAILY_DATE_FORMAT) else {
            return 0;
        };

        let matching: Vec<i32> = self
            .points()
            .filter(|p| {
                NaiveDateTime::parse_from_str(p.time, HOURLY_TIME_FORMAT)
                    .map(|t| t.date() == target)
                    .unwrap_or(false)
            })
            .map(|p| p.humidity)
            .collect();

        if matching.is_empty() {
            return 0;
        }

        let sum: i64 = matching.iter().map(|h| i64::from(*h)).sum();
        (sum / matching.len() as i64) as i32
    }

    /// Up to `limit` hours starting at the first entry whose hour of day is
    /// past the current one. Falls back to the start of the series.
    pub fn upcoming(&self, now: NaiveDateTime, limit: usize) -> Vec<HourlyPoint<'_>> {
        let next_hour = now.hour() + 1;

        let start = self
            .time
            .iter()
            .position(|t| {
                NaiveDateTime::parse_from_str(t, HOURLY_TIME_FORMAT)
                    .map(|parsed| parsed.hour() >= next_hour)
                    .unwrap_or(false)
            })
            .unwrap_or(0);

        (start..self.len())
            .filter_map(|i| self.point(i))
            .filter(|p| NaiveDateTime::parse_from_str(p.time, HOURLY_TIME_FORMAT).is_ok())
            .take(limit)
            .collect()
    }
}

impl DailySeries {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn validate(&self) -> Result<(), SeriesLengthMismatch> {
        check_lengths(
            "daily",
            vec![
                ("time", self.time.len()),
                ("temperature_max", self.temperature_max.len()),
                ("temperature_min", self.temperature_min.len()),
                ("wind_speed_max", self.wind_speed_max.len()),
            ],
        )
    }

    pub fn point(&self, index: usize) -> Option<DailyPoint<'_>> {
        Some(DailyPoint {
            date: self.time.get(index)?,
            temperature_max: *self.temperature_max.get(index)?,
            temperature_min: *self.temperature_min.get(index)?,
            wind_speed_max: *self.wind_speed_max.get(index)?,
        })
    }

    pub fn points(&self) -> impl Iterator<Item = DailyPoint<'_>> {
        (0..self.len()).filter_map(|i| self.point(i))
    }

    /// Short weekday name ("Mon") for the day at `index`; the raw date string
    /// when it does not parse.
    pub fn weekday_label(&self, index: usize) -> Option<String> {
        let raw = self.time.get(index)?;
        Some(
            NaiveDate::parse_from_str(raw, DAILY_DATE_FORMAT)
                .map(|d| d.format("%a").to_string())
                .unwrap_or_else(|_| raw.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn hourly_fixture() -> HourlySeries {
        HourlySeries {
            time: vec![
                "2024-05-01T22:00".into(),
                "2024-05-01T23:00".into(),
                "2024-05-02T00:00".into(),
                "2024-05-02T01:00".into(),
            ],
            temperature: vec![14.0, 13.5, 13.0, 12.5],
            humidity: vec![60, 65, 70, 71],
            wind_speed: vec![3.0, 2.5, 2.0, 1.5],
        }
    }

    #[test]
    fn test_mismatched_hourly_lengths() {
        let mut series = hourly_fixture();
        series.humidity.pop();
        let err = series.validate().unwrap_err();
        assert_eq!(err.series, "hourly");
    }

    #[test]
    fn test_points_align_by_index() {
        let series = hourly_fixture();
        let third = series.points().nth(2).unwrap();
        assert_eq!(third.time, "2024-05-02T00:00");
        assert_eq!(third.temperature, 13.0);
        assert_eq!(third.humidity, 70);
    }

    #[test]
    fn test_daily_humidity_average_truncates() {
        let series = hourly_fixture();
        assert_eq!(series.daily_humidity_average("2024-05-01"), 62);
        assert_eq!(series.daily_humidity_average("2024-05-02"), 70);
    }

    #[test]
    fn test_daily_humidity_average_no_match() {
        let series = hourly_fixture();
        assert_eq!(series.daily_humidity_average("2024-06-01"), 0);
        assert_eq!(series.daily_humidity_average("not a date"), 0);
    }

    #[test]
    fn test_upcoming_starts_after_current_hour() {
        let series = hourly_fixture();
        let now = NaiveDateTime::parse_from_str("2024-05-01T22:15", HOURLY_TIME_FORMAT).unwrap();
        let upcoming = series.upcoming(now, 24);
        assert_eq!(upcoming.len(), 3);
        assert_eq!(upcoming[0].time, "2024-05-01T23:00");
    }

    #[test]
    fn test_upcoming_falls_back_to_start_and_honours_limit() {
        let series = hourly_fixture();
        let now = NaiveDateTime::parse_from_str("2024-05-01T23:30", HOURLY_TIME_FORMAT).unwrap();
        let upcoming = series.upcoming(now, 2);
        assert_eq!(upcoming.len(), 2);
        assert_eq!(upcoming[0].time, "2024-05-01T22:00");
    }

    #[test]
    fn test_weekday_label() {
        let daily = DailySeries {
            time: vec!["2024-05-01".into(), "garbage".into()],
            temperature_max: vec![20.0, 21.0],
            temperature_min: vec![10.0, 11.0],
            wind_speed_max: vec![5.0, 6.0],
        };
        assert_eq!(daily.weekday_label(0).as_deref(), Some("Wed"));
        assert_eq!(daily.weekday_label(1).as_deref(), Some("garbage"));
        assert_eq!(daily.weekday_label(2), None);
    }
}
