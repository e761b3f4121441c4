//! Backend serving `/api/weather` and friends.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::map::MapHandle;
use crate::model::WeatherReport;
use crate::provider::WeatherProvider;
use crate::render;

#[derive(Debug, Clone)]
pub struct AppState {
    provider: Arc<dyn WeatherProvider>,
    default_city: String,
}

impl AppState {
    pub fn new(provider: Arc<dyn WeatherProvider>, default_city: impl Into<String>) -> Self {
        Self {
            provider,
            default_city: default_city.into(),
        }
    }

    fn resolve_city(&self, city: Option<&str>) -> String {
        match city.map(str::trim) {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => self.default_city.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CityQuery {
    city: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/forecast/{city}", get(forecast_page))
        .route("/api/weather", get(api_weather))
        .route("/api/forecast/{city}", get(api_forecast))
        .layer(middleware::from_fn(log_request))
        .with_state(Arc::new(state))
}

/// Serve on an already bound listener until the process stops.
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    let addr = listener.local_addr().context("Listener has no local address")?;
    info!(%addr, "weather backend listening");

    axum::serve(listener, router(state)).await.context("Weather backend stopped with an error")
}

pub async fn run(bind: &str, state: AppState) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    serve(listener, state).await
}

async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let response = next.run(req).await;
    info!(%method, %path, status = %response.status(), "request");
    response
}

/// Always 200; lookup failures travel in the `error` field.
async fn api_weather(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CityQuery>,
) -> Json<WeatherReport> {
    let city = state.resolve_city(query.city.as_deref());

    match state.provider.current(&city).await {
        Ok(report) => Json(report),
        Err(err) => {
            warn!(%city, error = %err, "current weather lookup failed");
            Json(WeatherReport::failure(err.to_string()))
        }
    }
}

async fn api_forecast(State(state): State<Arc<AppState>>, Path(city): Path<String>) -> Response {
    match state.provider.forecast(&city).await {
        Ok(forecast) => Json(forecast).into_response(),
        Err(err) => {
            warn!(%city, error = %err, "forecast lookup failed");
            let body = ErrorResponse {
                error: err.to_string(),
            };
            (StatusCode::BAD_GATEWAY, Json(body)).into_response()
        }
    }
}

async fn index(State(state): State<Arc<AppState>>, Query(query): Query<CityQuery>) -> Html<String> {
    // No query means a fresh visit: show the empty form.
    let Some(input) = query.city else {
        return Html(render::index_page("", None, None).into_string());
    };

    let city = state.resolve_city(Some(&input));
    let page = match state.provider.current(&city).await {
        Ok(report) => {
            let content = render::weather_fragment(&city, &report, &Local);
            let mut map = MapHandle::new();
            if let Some(at) = report.coordinates {
                map.update(at.lat, at.lon);
            }
            render::index_page(&city, Some(content), map.view())
        }
        Err(err) => {
            warn!(%city, error = %err, "current weather lookup failed");
            render::index_page(&city, Some(render::error_fragment(&err.to_string())), None)
        }
    };

    Html(page.into_string())
}

async fn forecast_page(State(state): State<Arc<AppState>>, Path(city): Path<String>) -> Response {
    match state.provider.forecast(&city).await {
        Ok(forecast) => {
            Html(render::forecast_page(&forecast, &Local).into_string()).into_response()
        }
        Err(err) => {
            warn!(%city, error = %err, "forecast lookup failed");
            (StatusCode::BAD_GATEWAY, Html(render::error_page(&err.to_string()).into_string()))
                .into_response()
        }
    }
}
