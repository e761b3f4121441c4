//! Core library for the weather dashboard.
//!
//! This crate defines:
//! - The lookup handler (`dashboard`) that fetches `/api/weather`, renders the
//!   result and keeps the map widget in sync
//! - Map widget state (`map`) and HTML rendering (`render`)
//! - The backend (`server`) and the upstream provider it wraps (`provider`)
//! - Configuration & credentials handling
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod client;
pub mod config;
pub mod dashboard;
pub mod map;
pub mod model;
pub mod provider;
pub mod render;
pub mod server;

pub use client::{ClientError, WeatherClient, WeatherSource};
pub use config::Config;
pub use dashboard::{Dashboard, Outcome, Page};
pub use map::{MapHandle, MapView};
pub use model::{Coordinates, Forecast, WeatherReport};
pub use provider::{ProviderError, WeatherProvider};
