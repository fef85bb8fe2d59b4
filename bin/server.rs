// Valid Guard - Web Server
// REST API with Axum: submit text, read classified records, export reports

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use valid_guard::{
    classify, render_csv, summarize, validate_form, DisplayRecord, ExportLayout, Filter, FormData,
    FormValidation, Pipeline, RecordStore, RegistryConfig, ServerConfig, SimulatedRegistry,
    Submission, SummaryStats, ValidGuardError,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    pipeline: Pipeline,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn failure(status: StatusCode, message: impl Into<String>) -> Response {
        let body = Self {
            success: false,
            data: (),
            error: Some(message.into()),
        };
        (status, Json(body)).into_response()
    }
}

/// Submission response
#[derive(Serialize)]
struct SubmitResponse {
    accepted: usize,
    registry_checks: usize,
    record_ids: Vec<String>,
}

#[derive(Deserialize)]
struct FilterQuery {
    #[serde(default)]
    filter: Option<String>,
}

#[derive(Deserialize)]
struct ExportQuery {
    #[serde(default)]
    filter: Option<String>,
    #[serde(default)]
    layout: Option<String>,
}

fn parse_filter(raw: Option<&str>) -> Result<Filter, Response> {
    raw.unwrap_or("all")
        .parse()
        .map_err(|e: String| ApiResponse::failure(StatusCode::BAD_REQUEST, e))
}

fn accepted(submission: Result<Submission, ValidGuardError>) -> Response {
    match submission {
        Ok(submission) => {
            let body = SubmitResponse {
                accepted: submission.record_ids().len(),
                registry_checks: submission.outstanding(),
                record_ids: submission.record_ids().to_vec(),
            };
            // Checks resolve in the background and update the store
            submission.detach();
            (StatusCode::ACCEPTED, Json(ApiResponse::ok(body))).into_response()
        }
        Err(e @ ValidGuardError::EmptyInput) => {
            ApiResponse::failure(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
        Err(e) => ApiResponse::failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// POST /api/records - Person lines from a text body
async fn submit_records(State(state): State<AppState>, body: String) -> Response {
    accepted(state.pipeline.process_text(&body))
}

/// POST /api/id-numbers - Bare numbers from a text body
async fn submit_id_numbers(State(state): State<AppState>, body: String) -> Response {
    accepted(state.pipeline.process_id_list(&body))
}

/// GET /api/records?filter= - Classified records, newest first
async fn get_records(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> Response {
    let filter = match parse_filter(query.filter.as_deref()) {
        Ok(filter) => filter,
        Err(response) => return response,
    };

    let rows: Vec<DisplayRecord> = classify(&state.pipeline.store().snapshot(), filter);
    Json(ApiResponse::ok(rows)).into_response()
}

/// GET /api/stats - Summary over every record
async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    let stats: SummaryStats = summarize(&state.pipeline.store().snapshot());
    Json(ApiResponse::ok(stats))
}

/// GET /api/export?filter=&layout= - CSV download of the filtered rows
async fn export_records(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> Response {
    let filter = match parse_filter(query.filter.as_deref()) {
        Ok(filter) => filter,
        Err(response) => return response,
    };
    let layout: ExportLayout = match query.layout.as_deref().unwrap_or("registry").parse() {
        Ok(layout) => layout,
        Err(e) => return ApiResponse::failure(StatusCode::BAD_REQUEST, e),
    };

    let rows = classify(&state.pipeline.store().snapshot(), filter);
    let disposition = format!("attachment; filename=\"{}\"", layout.file_name());

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        render_csv(&rows, layout),
    )
        .into_response()
}

/// POST /api/form - Single person entry validation
async fn check_form(Json(form): Json<FormData>) -> impl IntoResponse {
    let result: FormValidation = validate_form(&form, Local::now().date_naive());
    let status = if result.is_valid {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    (status, Json(ApiResponse::ok(result)))
}

// ============================================================================
// Main Server
// ============================================================================

fn app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/records", get(get_records).post(submit_records))
        .route("/id-numbers", post(submit_id_numbers))
        .route("/stats", get(get_stats))
        .route("/export", get(export_records))
        .route("/form", post(check_form))
        .with_state(state);

    Router::new().nest("/api", api_routes).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("🌐 Valid Guard - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let server_config = ServerConfig::from_env();
    let registry_config = RegistryConfig::from_env();
    info!(?registry_config, "registry simulator configured");

    // Create shared state
    let state = AppState {
        pipeline: Pipeline::new(
            RecordStore::new(),
            Arc::new(SimulatedRegistry::new(registry_config)),
        ),
    };

    // Start server
    let listener = tokio::net::TcpListener::bind(&server_config.addr)
        .await
        .with_context(|| format!("Failed to bind to {}", server_config.addr))?;

    println!("\n🚀 Server running on http://{}", server_config.addr);
    println!("   API: http://{}/api/records", server_config.addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app(state))
        .await
        .context("Failed to start server")?;

    Ok(())
}
