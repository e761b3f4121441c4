use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::model::{CityInfo, Coordinates, Forecast, ForecastEntry, WeatherReport};

use super::{ProviderError, WeatherProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Visibility reported when the service omits it, in meters.
const DEFAULT_VISIBILITY: u32 = 10_000;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// GET `{base}/{endpoint}` for `city` in metric units.
    /// Returns the status and raw body so callers pick their own error.
    async fn get(
        &self,
        endpoint: &str,
        city: &str,
    ) -> Result<(reqwest::StatusCode, String), ProviderError> {
        let url = format!("{}/{endpoint}", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[("q", city), ("units", "metric"), ("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(transport)?;

        let status = res.status();
        let body = res.text().await.map_err(transport)?;
        debug!(%status, endpoint, city, "OpenWeather responded");

        Ok((status, body))
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, city: &str) -> Result<WeatherReport, ProviderError> {
        let (status, body) = self.get("weather", city).await?;

        if !status.is_success() {
            warn!(
                %status,
                city,
                body = %truncate_body(&body),
                "OpenWeather current lookup failed"
            );
            return Err(ProviderError::CityNotFound { status });
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body)?;
        Ok(report_from_current(parsed))
    }

    async fn forecast(&self, city: &str) -> Result<Forecast, ProviderError> {
        let (status, body) = self.get("forecast", city).await?;

        if !status.is_success() {
            warn!(
                %status,
                city,
                body = %truncate_body(&body),
                "OpenWeather forecast lookup failed"
            );
            return Err(ProviderError::ForecastUnavailable { status });
        }

        let parsed: OwForecastResponse = serde_json::from_str(&body)?;
        Ok(forecast_from_response(parsed))
    }
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    #[serde(default)]
    feels_like: f64,
    humidity: f64,
    #[serde(default)]
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    #[serde(default)]
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    coord: OwCoord,
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    name: String,
    country: String,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    #[serde(default)]
    dt_txt: Option<String>,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    #[serde(default)]
    visibility: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    list: Vec<OwForecastEntry>,
}

fn report_from_current(parsed: OwCurrentResponse) -> WeatherReport {
    let first = parsed.weather.into_iter().next();
    let (conditions, icon) = match first {
        Some(w) => (w.description, w.icon),
        None => ("Unknown".to_string(), None),
    };

    WeatherReport {
        error: None,
        icon,
        temperature: round1(parsed.main.temp),
        humidity: parsed.main.humidity,
        wind_speed: round1(parsed.wind.speed),
        conditions,
        timestamp: parsed.dt,
        coordinates: Some(Coordinates::new(parsed.coord.lat, parsed.coord.lon)),
    }
}

fn forecast_from_response(parsed: OwForecastResponse) -> Forecast {
    let entries = parsed
        .list
        .into_iter()
        .map(|item| {
            // `dt_txt` is the slot start in UTC; fall back to `dt` if it is missing or odd.
            let timestamp = item
                .dt_txt
                .as_deref()
                .and_then(|s| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok())
                .map(|ndt| ndt.and_utc())
                .unwrap_or_else(|| unix_to_utc(item.dt));

            let description = item
                .weather
                .into_iter()
                .next()
                .map(|w| w.description)
                .unwrap_or_else(|| "Unknown".to_string());

            ForecastEntry {
                timestamp,
                date: timestamp.date_naive(),
                temperature: round1(item.main.temp),
                feels_like: round1(item.main.feels_like),
                description,
                humidity: item.main.humidity,
                wind: round1(item.wind.speed),
                pressure: item.main.pressure,
                visibility: item.visibility.unwrap_or(DEFAULT_VISIBILITY),
            }
        })
        .collect();

    Forecast {
        city: CityInfo {
            name: parsed.city.name,
            country: parsed.city.country,
            sunrise: unix_to_utc(parsed.city.sunrise),
            sunset: unix_to_utc(parsed.city.sunset),
        },
        entries,
    }
}

// The request URL holds `appid`, so it must never reach a message.
fn transport(err: reqwest::Error) -> ProviderError {
    ProviderError::Transport(err.without_url())
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn unix_to_utc(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or(DateTime::UNIX_EPOCH)
}

fn truncate_body(body: &str) -> &str {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURRENT: &str = r#"{
        "coord": { "lon": 3.75, "lat": 6.5833 },
        "weather": [{ "id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d" }],
        "main": { "temp": 29.46, "feels_like": 33.1, "temp_min": 29.46, "temp_max": 29.46, "pressure": 1011, "humidity": 74 },
        "visibility": 10000,
        "wind": { "speed": 4.26, "deg": 220 },
        "dt": 1700049600,
        "name": "Lagos"
    }"#;

    const FORECAST: &str = r#"{
        "list": [
            {
                "dt": 1700060400,
                "main": { "temp": 28.04, "feels_like": 31.2, "pressure": 1010, "humidity": 80 },
                "weather": [{ "description": "light rain", "icon": "10n" }],
                "wind": { "speed": 3.04 },
                "visibility": 9000,
                "dt_txt": "2023-11-15 15:00:00"
            },
            {
                "dt": 1700071200,
                "main": { "temp": 26.5, "feels_like": 26.5, "pressure": 1011, "humidity": 88 },
                "weather": [],
                "wind": { "speed": 2.0 },
                "dt_txt": "2023-11-15 18:00:00"
            }
        ],
        "city": { "name": "Lagos", "country": "NG", "sunrise": 1700027000, "sunset": 1700069800 }
    }"#;

    #[test]
    fn current_response_maps_to_report() {
        let parsed: OwCurrentResponse = serde_json::from_str(CURRENT).unwrap();
        let report = report_from_current(parsed);

        assert_eq!(report.error, None);
        assert_eq!(report.icon.as_deref(), Some("04d"));
        assert_eq!(report.temperature, 29.5);
        assert_eq!(report.humidity, 74.0);
        assert_eq!(report.wind_speed, 4.3);
        assert_eq!(report.conditions, "broken clouds");
        assert_eq!(report.timestamp, 1_700_049_600);
        assert_eq!(report.coordinates, Some(Coordinates::new(6.5833, 3.75)));
    }

    #[test]
    fn current_without_weather_entry_is_unknown() {
        let json = CURRENT.replace(
            r#"[{ "id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d" }]"#,
            "[]",
        );
        let parsed: OwCurrentResponse = serde_json::from_str(&json).unwrap();
        let report = report_from_current(parsed);

        assert_eq!(report.conditions, "Unknown");
        assert!(report.icon.is_none());
    }

    #[test]
    fn forecast_response_maps_entries_and_city() {
        let parsed: OwForecastResponse = serde_json::from_str(FORECAST).unwrap();
        let forecast = forecast_from_response(parsed);

        assert_eq!(forecast.city.name, "Lagos");
        assert_eq!(forecast.city.country, "NG");
        assert_eq!(forecast.city.sunrise.timestamp(), 1_700_027_000);
        assert_eq!(forecast.entries.len(), 2);

        let first = &forecast.entries[0];
        assert_eq!(first.date.to_string(), "2023-11-15");
        assert_eq!(first.temperature, 28.0);
        assert_eq!(first.wind, 3.0);
        assert_eq!(first.visibility, 9000);
        assert_eq!(first.description, "light rain");

        let second = &forecast.entries[1];
        assert_eq!(second.visibility, DEFAULT_VISIBILITY);
        assert_eq!(second.description, "Unknown");
    }

    #[tokio::test]
    async fn unreachable_service_error_hides_api_key() {
        // Port 1 is never listening; the connect fails immediately.
        let provider =
            OpenWeatherProvider::with_base_url("SECRETKEY123".into(), "http://127.0.0.1:1");

        let err = provider.current("Lagos").await.unwrap_err();
        assert!(matches!(err, ProviderError::Transport(_)));
        let shown = WeatherReport::failure(err.to_string());
        assert!(!shown.error.as_deref().unwrap_or_default().contains("SECRETKEY123"));

        let err = provider.forecast("Lagos").await.unwrap_err();
        assert!(!err.to_string().contains("SECRETKEY123"));
        assert!(!format!("{err:?}").contains("SECRETKEY123"));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(300);
        assert_eq!(truncate_body(&long).chars().count(), 200);
        assert_eq!(truncate_body("short"), "short");
    }
}
