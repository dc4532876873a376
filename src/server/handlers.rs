//! Route handlers.

use crate::clock::format_timestamp;
use crate::history::QuoteEntry;
use crate::scheduler::{DailyTime, ScheduleSnapshot, SchedulerError};
use crate::server::AppState;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::info;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body accepted by `POST /schedule`.
#[derive(Debug, Clone, Deserialize)]
pub struct SetScheduleRequest {
    /// Daily time as `HH:MM`.
    pub time: String,
}

/// Response to a schedule update.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleSetResponse {
    pub message: String,
    /// Resolved `HH:MM`.
    pub schedule: String,
    pub hour: u8,
    pub minute: u8,
    /// Next fire time, `YYYY-MM-DD HH:MM:SS`.
    pub next_run: String,
}

/// Response to a schedule query.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CurrentScheduleResponse {
    /// A daily job is installed.
    Scheduled {
        next_run: String,
        schedule: String,
        hour: u8,
        minute: u8,
    },
    /// No job is installed.
    Unscheduled { message: String },
}

/// Message reported when no daily job is installed.
pub const NO_SCHEDULE_MESSAGE: &str = "No scheduled quote generation";

impl From<&ScheduleSnapshot> for CurrentScheduleResponse {
    fn from(snapshot: &ScheduleSnapshot) -> Self {
        Self::Scheduled {
            next_run: format_timestamp(&snapshot.next_run),
            schedule: snapshot.at.to_string(),
            hour: snapshot.at.hour(),
            minute: snapshot.at.minute(),
        }
    }
}

/// Client-facing error with a JSON body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<SchedulerError> for ApiError {
    fn from(e: SchedulerError) -> Self {
        let status = match e {
            SchedulerError::Stopped => StatusCode::SERVICE_UNAVAILABLE,
            SchedulerError::JobFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({"error": self.message})),
        )
            .into_response()
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "history_len": state.service.history_len().await,
        "scheduled": state.scheduler.is_scheduled().await,
    }))
}

/// `GET /quotes`: all stored quotes, oldest first.
pub async fn list_quotes(State(state): State<AppState>) -> Json<Vec<QuoteEntry>> {
    Json(state.service.quotes().await)
}

/// `GET /latest`: newest quote, generated on demand when none exist.
pub async fn latest_quote(State(state): State<AppState>) -> Json<QuoteEntry> {
    Json(state.service.latest().await)
}

/// `POST /generate-now` and `POST /quotes/generate`.
pub async fn generate_now(State(state): State<AppState>) -> Result<Json<QuoteEntry>, ApiError> {
    let entry = state.scheduler.trigger_now().await?;
    Ok(Json(entry))
}

/// `POST /schedule/{hour}/{minute}`
pub async fn set_schedule_path(
    State(state): State<AppState>,
    Path((hour, minute)): Path<(String, String)>,
) -> Result<(StatusCode, Json<ScheduleSetResponse>), ApiError> {
    let hour = parse_field("hour", &hour)?;
    let minute = parse_field("minute", &minute)?;
    let at = DailyTime::new(hour, minute).map_err(|e| ApiError::bad_request(e.to_string()))?;
    apply_schedule(&state, at).await
}

/// `POST /schedule` with `{"time": "HH:MM"}`.
pub async fn set_schedule_body(
    State(state): State<AppState>,
    body: Result<Json<SetScheduleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ScheduleSetResponse>), ApiError> {
    let Json(body) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let at = body
        .time
        .parse::<DailyTime>()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    apply_schedule(&state, at).await
}

/// `GET /current-schedule` and `GET /schedule`.
pub async fn current_schedule(State(state): State<AppState>) -> Json<CurrentScheduleResponse> {
    let response = match state.scheduler.current().await {
        Some(snapshot) => CurrentScheduleResponse::from(&snapshot),
        None => CurrentScheduleResponse::Unscheduled {
            message: NO_SCHEDULE_MESSAGE.to_owned(),
        },
    };
    Json(response)
}

async fn apply_schedule(
    state: &AppState,
    at: DailyTime,
) -> Result<(StatusCode, Json<ScheduleSetResponse>), ApiError> {
    let snapshot = state.scheduler.set(at).await?;
    info!("schedule updated via API to {at}");
    Ok((
        StatusCode::CREATED,
        Json(ScheduleSetResponse {
            message: format!("Quote generation scheduled for {at} every day"),
            schedule: at.to_string(),
            hour: at.hour(),
            minute: at.minute(),
            next_run: format_timestamp(&snapshot.next_run),
        }),
    ))
}

fn parse_field(name: &str, raw: &str) -> Result<u32, ApiError> {
    raw.parse::<u32>().map_err(|_| {
        ApiError::bad_request(format!("{name} must be a non-negative integer, got '{raw}'"))
    })
}
