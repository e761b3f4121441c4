//! The lookup handler: read the city, fetch, render, move the map.

use chrono::Local;
use tracing::{info, warn};

use crate::client::{ClientError, WeatherSource};
use crate::map::MapHandle;
use crate::model::WeatherReport;
use crate::render;

/// The two page elements the handler touches.
pub trait Page {
    /// Current value of the city input.
    fn city_input(&self) -> String;

    /// Replace the result container's content.
    fn set_content(&mut self, html: String);
}

/// What one lookup ended up showing.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Rendered {
        city: String,
        report: WeatherReport,
    },
    Failed { city: String, message: String },
}

#[derive(Debug)]
pub struct Dashboard<S> {
    source: S,
    default_city: String,
    map: MapHandle,
}

impl<S: WeatherSource> Dashboard<S> {
    pub fn new(source: S, default_city: impl Into<String>) -> Self {
        Self {
            source,
            default_city: default_city.into(),
            map: MapHandle::new(),
        }
    }

    /// City to look up for `input`.
    ///
    /// Leading and trailing whitespace is trimmed, so `"  Ikeja "` is
    /// requested and displayed as `"Ikeja"`. Blank input falls back to the
    /// default city.
    pub fn resolve_city(&self, input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            self.default_city.clone()
        } else {
            trimmed.to_string()
        }
    }

    /// Run one lookup against `page`.
    ///
    /// An `error` in the payload is rendered and the map is left alone.
    /// Transport and decode failures are returned without touching the page.
    pub async fn fetch_weather<P: Page>(&mut self, page: &mut P) -> Result<Outcome, ClientError> {
        let city = self.resolve_city(&page.city_input());
        let report = self.source.weather(&city).await?;

        if let Some(message) = report.error.clone() {
            info!(%city, %message, "weather lookup returned an error");
            page.set_content(render::error_fragment(&message).into_string());
            return Ok(Outcome::Failed { city, message });
        }

        page.set_content(render::weather_fragment(&city, &report, &Local).into_string());

        match report.coordinates {
            Some(at) => {
                self.map.update(at.lat, at.lon);
            }
            None => warn!(%city, "weather payload has no coordinates, map not updated"),
        }

        info!(%city, temperature = report.temperature, "weather rendered");
        Ok(Outcome::Rendered { city, report })
    }

    pub fn map(&self) -> &MapHandle {
        &self.map
    }
}
