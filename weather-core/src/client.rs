use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use crate::model::{Forecast, WeatherReport};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid API base URL '{0}'")]
    BaseUrl(String),

    #[error("Weather request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Malformed weather response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The backend answered with an `{ "error": ... }` body.
    #[error("{0}")]
    Api(String),
}

/// Where the dashboard gets its `/api/weather` payloads from.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn weather(&self, city: &str) -> Result<WeatherReport, ClientError>;
}

/// HTTP client for the dashboard backend.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    base: Url,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl WeatherClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        // Without a trailing slash `join` would drop the last path segment.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base =
            Url::parse(&normalized).map_err(|_| ClientError::BaseUrl(base_url.to_string()))?;

        if base.cannot_be_a_base() {
            return Err(ClientError::BaseUrl(base_url.to_string()));
        }

        Ok(Self {
            base,
            http: Client::new(),
        })
    }

    /// `{base}/api/weather?city=<city>`
    pub fn weather_url(&self, city: &str) -> Result<Url, ClientError> {
        let mut url = self.join("api/weather")?;
        url.query_pairs_mut().append_pair("city", city);
        Ok(url)
    }

    /// `{base}/api/forecast/<city>`
    pub fn forecast_url(&self, city: &str) -> Result<Url, ClientError> {
        let mut url = self.join("api/forecast/")?;
        url.path_segments_mut()
            .map_err(|_| ClientError::BaseUrl(self.base.to_string()))?
            .pop_if_empty()
            .push(city);
        Ok(url)
    }

    pub async fn forecast(&self, city: &str) -> Result<Forecast, ClientError> {
        let url = self.forecast_url(city)?;
        debug!(%url, "requesting forecast");

        let res = self.http.get(url).send().await?;
        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or_else(|_| format!("Forecast request failed with status {status}"));
            return Err(ClientError::Api(message));
        }

        Ok(serde_json::from_str(&body)?)
    }

    fn join(&self, path: &str) -> Result<Url, ClientError> {
        self.base.join(path).map_err(|_| ClientError::BaseUrl(self.base.to_string()))
    }
}

#[async_trait]
impl WeatherSource for WeatherClient {
    /// One GET, no retries, no timeout. The status code is not inspected:
    /// lookup failures arrive as an `error` field in the body.
    async fn weather(&self, city: &str) -> Result<WeatherReport, ClientError> {
        let url = self.weather_url(city)?;
        debug!(%url, "requesting weather");

        let body = self.http.get(url).send().await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
