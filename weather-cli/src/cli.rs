use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use tracing::info;

use weather_core::{
    Config, Dashboard, Outcome, Page, WeatherClient,
    provider::provider_from_config,
    server::{self, AppState},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the OpenWeatherMap API key and dashboard defaults.
    Configure,

    /// Run the backend serving /api/weather.
    Serve {
        /// Listen address; defaults to the configured one.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Look up a city and print the rendered result and map state.
    Show {
        /// City name; empty means the configured default.
        #[arg(default_value = "")]
        city: String,

        /// Backend base URL; defaults to the configured one.
        #[arg(long)]
        api_url: Option<String>,
    },

    /// Print the 5-day forecast for a city.
    Forecast {
        city: String,

        #[arg(long)]
        api_url: Option<String>,
    },
}

/// The terminal stands in for the page: the argument is the input field,
/// stdout is the container.
#[derive(Debug, Default)]
struct TerminalPage {
    input: String,
    content: Option<String>,
}

impl Page for TerminalPage {
    fn city_input(&self) -> String {
        self.input.clone()
    }

    fn set_content(&mut self, html: String) {
        self.content = Some(html);
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Configure => configure(config),
            Command::Serve { bind } => {
                let bind = bind.unwrap_or_else(|| config.server.bind.clone());
                let provider = provider_from_config(&config)?;
                let state = AppState::new(Arc::from(provider), config.default_city.clone());
                server::run(&bind, state).await
            }
            Command::Show { city, api_url } => {
                let api_url = api_url.unwrap_or_else(|| config.api_base_url.clone());
                show(&api_url, &config.default_city, city).await
            }
            Command::Forecast { city, api_url } => {
                let api_url = api_url.unwrap_or_else(|| config.api_base_url.clone());
                forecast(&api_url, &city).await
            }
        }
    }
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let api_key = Password::new("OpenWeatherMap API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let default_city = Text::new("Default city:")
        .with_default(&config.default_city)
        .prompt()
        .context("Failed to read default city")?;

    let bind = Text::new("Backend listen address:")
        .with_default(&config.server.bind)
        .prompt()
        .context("Failed to read listen address")?;

    let api_base_url = Text::new("Backend URL used by `weather show`:")
        .with_default(&config.api_base_url)
        .prompt()
        .context("Failed to read backend URL")?;

    if !api_key.trim().is_empty() {
        config.set_api_key(api_key.trim().to_string());
    }
    config.default_city = default_city;
    config.server.bind = bind;
    config.api_base_url = api_base_url;

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}

async fn show(api_url: &str, default_city: &str, input: String) -> anyhow::Result<()> {
    let client = WeatherClient::new(api_url)?;
    let mut dashboard = Dashboard::new(client, default_city);
    let mut page = TerminalPage {
        input,
        content: None,
    };

    let outcome = dashboard.fetch_weather(&mut page).await?;

    if let Some(html) = &page.content {
        println!("{html}");
    }

    if let Outcome::Rendered { city, .. } = &outcome {
        match dashboard.map().view() {
            Some(view) => {
                let center = view.center();
                info!(%city, "map updated");
                println!();
                println!("Map center:  {}, {} (zoom {})", center.lat, center.lon, view.zoom());
                println!("Markers:     {}", view.markers().len());
                println!("Center tile: {}", view.center_tile_url());
                println!("{}", view.tile_layer().attribution);
            }
            None => println!("\n(no coordinates returned, map not shown)"),
        }
    }

    Ok(())
}

async fn forecast(api_url: &str, city: &str) -> anyhow::Result<()> {
    let client = WeatherClient::new(api_url)?;
    let forecast = client.forecast(city).await?;

    let info = &forecast.city;
    println!("{}, {}", info.name, info.country);
    println!(
        "Sunrise {} · Sunset {}",
        info.sunrise.with_timezone(&Local).format("%H:%M"),
        info.sunset.with_timezone(&Local).format("%H:%M"),
    );

    for (date, entries) in forecast.by_day() {
        println!();
        println!("{}", date.format("%A, %Y-%m-%d"));
        for e in entries {
            println!(
                "  {}  {:>5.1}°C (feels {:>5.1}°C)  {:>3}%  {:>4.1} m/s  {}",
                e.timestamp.with_timezone(&Local).format("%H:%M"),
                e.temperature,
                e.feels_like,
                e.humidity,
                e.wind,
                e.description,
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_defaults_to_empty_city() {
        let cli = Cli::try_parse_from(["weather", "show"]).unwrap();
        match cli.command {
            Command::Show { city, api_url } => {
                assert_eq!(city, "");
                assert!(api_url.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn serve_accepts_bind_override() {
        let cli = Cli::try_parse_from(["weather", "serve", "--bind", "0.0.0.0:8080"]).unwrap();
        assert!(matches!(cli.command, Command::Serve { bind: Some(ref b) } if b == "0.0.0.0:8080"));
    }

    #[test]
    fn forecast_requires_city() {
        assert!(Cli::try_parse_from(["weather", "forecast"]).is_err());
    }

    #[test]
    fn terminal_page_holds_last_content() {
        let mut page = TerminalPage {
            input: "Lagos".into(),
            content: None,
        };
        page.set_content("<p>one</p>".into());
        page.set_content("<p>two</p>".into());
        assert_eq!(page.city_input(), "Lagos");
        assert_eq!(page.content.as_deref(), Some("<p>two</p>"));
    }
}
