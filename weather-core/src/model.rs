use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Payload of `GET /api/weather`.
///
/// When `error` is set the lookup failed and the remaining fields carry
/// defaults; consumers must check it first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub temperature: f64,
    #[serde(default)]
    pub humidity: f64,
    #[serde(default)]
    pub wind_speed: f64,
    #[serde(default)]
    pub conditions: String,
    /// Observation time, unix seconds.
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

impl WeatherReport {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// City metadata attached to a forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityInfo {
    pub name: String,
    pub country: String,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}

/// One 3-hour forecast slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub timestamp: DateTime<Utc>,
    pub date: NaiveDate,
    pub temperature: f64,
    pub feels_like: f64,
    pub description: String,
    pub humidity: f64,
    pub wind: f64,
    pub pressure: f64,
    /// Meters.
    pub visibility: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub city: CityInfo,
    pub entries: Vec<ForecastEntry>,
}

impl Forecast {
    /// Entries grouped by calendar date, in input order.
    pub fn by_day(&self) -> Vec<(NaiveDate, Vec<&ForecastEntry>)> {
        let mut days: Vec<(NaiveDate, Vec<&ForecastEntry>)> = Vec::new();
        for entry in &self.entries {
            match days.last_mut() {
                Some((date, slots)) if *date == entry.date => slots.push(entry),
                _ => days.push((entry.date, vec![entry])),
            }
        }
        days
    }
}
