use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::adapters::browser::client::PageScraper;
use crate::domain::checkin;
use crate::domain::listing::{ListingRecord, PageRequest, PageResult, ScrapeOutcome};
use crate::error::{Result, ScrapeError};

// ---------- Schemas ----------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRequest {
    pub airbnb_url: Option<String>,
    #[serde(default)]
    pub page: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResponse {
    pub data: Vec<ListingRecord>,
    pub requested_page_url: String,
    pub page: u32,
    pub outcome: ScrapeOutcome,
    pub available_accommodations_count: Option<u32>,
    pub loaded_listings_count: usize,
    pub element_text: Option<String>,
}

impl From<PageResult> for ScrapeResponse {
    fn from(result: PageResult) -> Self {
        Self {
            data: result.accommodations,
            requested_page_url: result.requested_url,
            page: result.page_index,
            outcome: result.outcome,
            available_accommodations_count: result.available_accommodations_count,
            loaded_listings_count: result.loaded_listings_count,
            element_text: result.element_text,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Error half of every handler: input problems are 400, the rest 500.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<ScrapeError> for ApiError {
    fn from(err: ScrapeError) -> Self {
        let status = if err.is_input_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

/// Malformed bodies get the same `{ error }` shape as every other 400.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

// ---------- Router ----------

#[derive(Clone)]
pub struct AppState {
    pub scraper: Arc<PageScraper>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/scrape", post(scrape))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl-C.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    info!(addr = %listener.local_addr()?, "Listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

// ---------- Handlers ----------

async fn health() -> &'static str {
    "OK"
}

async fn scrape(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ScrapeRequest>, JsonRejection>,
) -> std::result::Result<Json<ScrapeResponse>, ApiError> {
    let Json(body) = payload?;
    let request = PageRequest::new(body.airbnb_url.as_deref().unwrap_or_default(), body.page)?;

    if checkin::has_checkin(&request.base_url) {
        let today = chrono::Local::now().date_naive();
        checkin::validate_checkin(&request.base_url, today)?;
    }

    let result = state.scraper.scrape_page(&request).await?;
    Ok(Json(result.into()))
}
