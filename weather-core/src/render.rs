//! HTML rendering of weather results.
//!
//! Fragments are what the dashboard writes into its container; pages are
//! full documents served by the backend. Everything interpolated goes
//! through maud and is escaped.

use std::fmt::Display;

use chrono::{DateTime, TimeZone};
use maud::{DOCTYPE, Markup, html};

use crate::map::MapView;
use crate::model::{Forecast, WeatherReport};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn icon_url(icon: &str) -> String {
    format!("https://openweathermap.org/img/wn/{icon}@2x.png")
}

/// Unix seconds shown in `tz`. Out-of-range values are shown raw.
pub fn format_timestamp<Tz>(timestamp: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.with_timezone(tz).format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

// f64 Display drops a trailing ".0", which is how the numbers read in the UI.
fn num(value: f64) -> String {
    value.to_string()
}

pub fn error_fragment(message: &str) -> Markup {
    html! {
        p class="error" { "⚠️ " (message) }
    }
}

/// Successful lookup for `city`.
pub fn weather_fragment<Tz>(city: &str, report: &WeatherReport, tz: &Tz) -> Markup
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    html! {
        h2 { "📍 " (city.to_uppercase()) }
        @if let Some(icon) = &report.icon {
            img src=(icon_url(icon)) alt="Weather Icon";
        }
        p { strong { "Temperature:" } " " (num(report.temperature)) "°C" }
        p { strong { "Humidity:" } " " (num(report.humidity)) "%" }
        p { strong { "Wind Speed:" } " " (num(report.wind_speed)) " m/s" }
        p { strong { "Condition:" } " " (report.conditions) }
        p { strong { "Time:" } " " (format_timestamp(report.timestamp, tz)) }
    }
}

/// Static preview of the map: the tile under the center plus the marker list.
pub fn map_fragment(view: &MapView) -> Markup {
    let center = view.center();
    html! {
        figure
            id="map"
            data-lat=(num(center.lat))
            data-lon=(num(center.lon))
            data-zoom=(view.zoom())
        {
            img src=(view.center_tile_url()) alt="Map tile";
            figcaption {
                ul class="markers" {
                    @for marker in view.markers() {
                        li { "📌 " (num(marker.position.lat)) ", " (num(marker.position.lon)) }
                    }
                }
                small { (view.tile_layer().attribution) }
            }
        }
    }
}

fn layout(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (title) }
            }
            body { (body) }
        }
    }
}

/// Search form, the lookup result (if any) and the map preview.
pub fn index_page(city: &str, content: Option<Markup>, map: Option<&MapView>) -> Markup {
    layout(
        "Weather",
        html! {
            h1 { "Weather" }
            form method="get" action="/" {
                input id="cityInput" type="text" name="city" value=(city) placeholder="Enter city";
                button type="submit" { "Get Weather" }
            }
            div id="weatherData" {
                @if let Some(content) = content { (content) }
            }
            @if let Some(view) = map {
                (map_fragment(view))
            }
        },
    )
}

pub fn forecast_page<Tz>(forecast: &Forecast, tz: &Tz) -> Markup
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let city = &forecast.city;
    let title = format!("{}, {}", city.name, city.country);

    layout(
        &format!("Forecast for {title}"),
        html! {
            h1 { (title) }
            p {
                "Sunrise: " (city.sunrise.with_timezone(tz).format("%H:%M").to_string())
                " · Sunset: " (city.sunset.with_timezone(tz).format("%H:%M").to_string())
            }
            @for (date, entries) in forecast.by_day() {
                h2 { (date.format("%A, %Y-%m-%d").to_string()) }
                table {
                    thead {
                        tr {
                            th { "Time" } th { "Temp" } th { "Feels like" } th { "Conditions" }
                            th { "Humidity" } th { "Wind" } th { "Pressure" } th { "Visibility" }
                        }
                    }
                    tbody {
                        @for e in entries {
                            tr {
                                td { (e.timestamp.with_timezone(tz).format("%H:%M").to_string()) }
                                td { (num(e.temperature)) "°C" }
                                td { (num(e.feels_like)) "°C" }
                                td { (e.description) }
                                td { (num(e.humidity)) "%" }
                                td { (num(e.wind)) " m/s" }
                                td { (num(e.pressure)) " hPa" }
                                td { (num(f64::from(e.visibility) / 1000.0)) " km" }
                            }
                        }
                    }
                }
            }
        },
    )
}

pub fn error_page(message: &str) -> Markup {
    layout("Weather", error_fragment(message))
}
