use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::app::App;
use crate::error::AppError;
use crate::models::SummarizeRequest;

use super::response::{ApiErrorResponse, ApiResponse};

const API_KEY_HEADER: &str = "x-api-key";
const MAX_HISTORY_LIMIT: u32 = 100;

type ApiResult<T> = std::result::Result<T, ApiErrorResponse>;

#[derive(Clone)]
struct AppState {
    app: Arc<App>,
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    #[serde(default = "default_history_limit")]
    limit: u32,
    #[serde(default)]
    offset: u32,
}

fn default_history_limit() -> u32 {
    10
}

#[derive(Debug, Deserialize)]
struct AnalyticsQuery {
    #[serde(default = "default_analytics_days")]
    days: u32,
}

fn default_analytics_days() -> u32 {
    7
}

pub fn router(app: Arc<App>) -> Router {
    let state = AppState { app };

    Router::new()
        .route("/health", get(health_handler))
        .route("/summarize", post(summarize_handler))
        .route("/history", get(history_handler))
        .route(
            "/history/:id",
            get(history_item_handler).delete(delete_history_item_handler),
        )
        .route("/analytics", get(analytics_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl-C or SIGTERM.
pub async fn serve(app: Arc<App>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("API server listening on {}", listener.local_addr()?);

    axum::serve(listener, router(app))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutting down");
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn summarize_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SummarizeRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    let api_key = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|key| !key.is_empty());

    tracing::debug!("Summarize request for {}", request.url);
    let response = state.app.summarize(request, api_key).await?;
    Ok(ApiResponse::ok(response))
}

async fn history_handler(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    let limit = query.limit.clamp(1, MAX_HISTORY_LIMIT);

    let page = state.app.history(limit, query.offset).await?;
    Ok(ApiResponse::ok(page))
}

async fn history_item_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let summary = state.app.history_item(&id).await?;
    Ok(ApiResponse::ok(summary))
}

async fn delete_history_item_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.app.delete_history_item(&id).await?;
    Ok(ApiResponse::ok(json!({
        "message": "Summary deleted",
        "deletedId": id,
    })))
}

async fn analytics_handler(
    State(state): State<AppState>,
    query: Result<Query<AnalyticsQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    let aggregates = state.app.analytics(query.days).await?;
    Ok(ApiResponse::ok(aggregates))
}
