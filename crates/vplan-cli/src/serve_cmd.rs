use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;

use vplan_core::auth::{self, ApiCredentials, TokenConfig};
use vplan_core::pdf::PdfRenderer;
use vplan_core::plan::service::{self, PlanError};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Everything a handler needs, passed explicitly through axum state.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub tokens: TokenConfig,
    pub credentials: ApiCredentials,
    pub renderer: Arc<dyn PdfRenderer>,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    body: serde_json::Value,
}

impl AppError {
    fn message(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "message": message.into() }),
        }
    }

    fn not_found() -> Self {
        Self::message(StatusCode::NOT_FOUND, "Record not found.")
    }

    fn unauthenticated() -> Self {
        Self::message(StatusCode::UNAUTHORIZED, "Unauthenticated.")
    }

    /// Map a service error to its response. Validation reports become the
    /// body directly, keyed by field.
    fn plan_error(err: PlanError) -> Self {
        match err {
            PlanError::NotFound => Self::not_found(),
            PlanError::Validation(errors) => Self {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                body: serde_json::to_value(&errors).unwrap_or_else(|_| json!({})),
            },
            PlanError::Internal(cause) => Self::message(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("{cause:#}"),
            ),
        }
    }

    /// Like [`Self::plan_error`], but internal failures carry the
    /// operation's fixed message template with the cause embedded.
    fn mutation_error(err: PlanError, failure_prefix: &str) -> Self {
        match err {
            PlanError::Internal(cause) => Self::message(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("{failure_prefix} ERROR: {cause:#}"),
            ),
            other => Self::plan_error(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/holiday-plans", get(list_plans))
        .route("/api/holiday-plan", post(create_plan))
        .route(
            "/api/holiday-plan/{id}",
            get(get_plan).put(update_plan).delete(delete_plan),
        )
        .route("/api/holiday-plan/{id}/pdf", get(export_plan_pdf))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_bearer,
        ));

    Router::new()
        .route("/api/login", post(login))
        .merge(protected)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("vplan serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("vplan serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
}

// ---------------------------------------------------------------------------
// Auth gate
// ---------------------------------------------------------------------------

/// Reject callers without a valid bearer token before any handler runs.
async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match token {
        Some(token) if auth::validate_token(&state.tokens, token).is_ok() => {
            Ok(next.run(request).await)
        }
        _ => Err(AppError::unauthenticated()),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, AppError> {
    if !state.credentials.verify(&body.username, &body.password) {
        return Err(AppError::message(
            StatusCode::UNAUTHORIZED,
            "Invalid credentials.",
        ));
    }

    let token = auth::generate_token(&state.tokens, &body.username);
    Ok(Json(json!({ "token": token })).into_response())
}

async fn list_plans(State(state): State<AppState>) -> Result<Response, AppError> {
    let plans = service::list(&state.pool)
        .await
        .map_err(AppError::plan_error)?;

    if plans.is_empty() {
        // Distinguishable "no records" outcome, not an error.
        return Ok((
            StatusCode::NO_CONTENT,
            Json(json!({ "message": "No records" })),
        )
            .into_response());
    }

    Ok(Json(plans).into_response())
}

async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let plan = service::get(&state.pool, id)
        .await
        .map_err(AppError::plan_error)?;

    Ok(Json(plan).into_response())
}

async fn create_plan(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, AppError> {
    service::create(&state.pool, &body)
        .await
        .map_err(|e| AppError::mutation_error(e, "Failed to register plan."))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Holiday plan created successfully!" })),
    )
        .into_response())
}

async fn update_plan(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, AppError> {
    service::update(&state.pool, id, &body)
        .await
        .map_err(|e| AppError::mutation_error(e, "Failed to update holiday plan."))?;

    Ok(Json(json!({ "message": "Holiday plan updated successfully!" })).into_response())
}

async fn delete_plan(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    service::delete(&state.pool, id)
        .await
        .map_err(|e| AppError::mutation_error(e, "Failed to delete holiday plan."))?;

    Ok(Json(json!({ "message": "Holiday plan removed successfully!" })).into_response())
}

async fn export_plan_pdf(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let bytes = service::export_pdf(&state.pool, id, state.renderer.as_ref())
        .await
        .map_err(|e| AppError::mutation_error(e, "Failed to generate PDF."))?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf"),
        (
            header::CONTENT_DISPOSITION,
            "attachment; filename=holiday_plan.pdf",
        ),
    ];
    Ok((headers, bytes).into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
