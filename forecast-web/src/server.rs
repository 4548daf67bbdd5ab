use std::sync::Arc;

use anyhow::Context;
use axum::{
    Form, Router,
    extract::{State, rejection::FormRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use forecast_core::{ForecastService, WeatherContext};
use serde::Deserialize;

use crate::render::PageRenderer;

#[derive(Clone)]
struct AppState {
    service: Arc<ForecastService>,
    pages: Arc<PageRenderer>,
}

#[derive(Debug, Deserialize)]
struct SearchForm {
    city: Option<String>,
}

/// Rendering failures become a bare 500; forecast failures never reach here.
struct PageError(anyhow::Error);

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "page rendering failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}

impl From<anyhow::Error> for PageError {
    fn from(err: anyhow::Error) -> Self {
        Self(err)
    }
}

fn page(state: &AppState, ctx: &WeatherContext) -> Result<Html<String>, PageError> {
    Ok(Html(state.pages.render(ctx)?))
}

async fn landing(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    page(&state, &state.service.landing())
}

/// A POST without a usable form body is treated as a search with no city.
async fn search(
    State(state): State<AppState>,
    form: Result<Form<SearchForm>, FormRejection>,
) -> Result<Html<String>, PageError> {
    let city = match form {
        Ok(Form(form)) => form.city,
        Err(rejection) => {
            tracing::debug!(%rejection, "search posted without a form body");
            None
        }
    };

    let ctx = state.service.handle(city.as_deref()).await;
    page(&state, &ctx)
}

async fn health() -> &'static str {
    "ok"
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing).post(search))
        .route("/health", get(health))
        .with_state(state)
}

pub async fn serve(bind: &str, service: ForecastService) -> anyhow::Result<()> {
    let state = AppState {
        service: Arc::new(service),
        pages: Arc::new(PageRenderer::new()?),
    };

    state.service.warm_up().await;

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    tracing::info!(addr = %listener.local_addr()?, "serving forecast page");

    axum::serve(listener, router(state)).await.context("Server error")?;
    Ok(())
}
