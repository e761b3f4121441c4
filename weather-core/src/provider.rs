use crate::model::{Forecast, WeatherReport};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::fmt::Debug;

pub mod openweather;

pub use openweather::OpenWeatherProvider;

/// Failure talking to the upstream weather service.
///
/// `Display` is what ends up in the `error` field shown to users.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("City not found or API error")]
    CityNotFound { status: StatusCode },

    #[error("Forecast data not available")]
    ForecastUnavailable { status: StatusCode },

    /// Built with the request URL stripped; it carries the API key.
    #[error("{0}")]
    Transport(reqwest::Error),

    #[error("Failed to parse weather service response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Source of current conditions and forecasts for a city.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current conditions, shaped as the `/api/weather` payload.
    async fn current(&self, city: &str) -> Result<WeatherReport, ProviderError>;

    /// 5-day forecast in 3-hour steps.
    async fn forecast(&self, city: &str) -> Result<Forecast, ProviderError>;
}

/// Build the provider the backend talks to.
pub fn provider_from_config(config: &crate::Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.require_api_key()?;
    Ok(Box::new(OpenWeatherProvider::new(api_key.to_owned())))
}
