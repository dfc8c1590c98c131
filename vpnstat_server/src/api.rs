//! HTTP handlers. Bodies are read as raw bytes so credential checks run before
//! any shape validation.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::gateway::{IngestError, ServerEntry, StatsView};
use crate::identity::{verify_init_data, IdentityError, WebAppUser};
use crate::state::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error("initData required")]
    MissingInitData,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Ingest(IngestError::Unauthorized)
            | ApiError::Identity(IdentityError::InvalidSignature) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!("rejected request ({status}): {self}");
        (status, Json(json!({ "ok": false, "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct Ack {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub ok: bool,
    pub user: WebAppUser,
}

#[derive(Debug, Serialize)]
pub struct ServersResponse {
    pub servers: Vec<ServerEntry>,
}

// Unparsable bodies become an empty object and fail the normal checks.
fn json_body(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap_or_else(|_| json!({}))
}

pub async fn report(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Ack>, ApiError> {
    let body = json_body(&body);
    let header_key = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
    state
        .collector
        .accept(&body, header_key, || chrono::Utc::now().timestamp_millis())
        .await?;
    Ok(Json(Ack { ok: true }))
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsView> {
    Json(state.collector.stats().await)
}

pub async fn servers(State(state): State<AppState>) -> Json<ServersResponse> {
    Json(ServersResponse {
        servers: state.collector.roster().await,
    })
}

pub async fn me(State(state): State<AppState>, body: Bytes) -> Result<Json<MeResponse>, ApiError> {
    let body = json_body(&body);
    let init_data = body
        .get("initData")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(ApiError::MissingInitData)?;
    let user = verify_init_data(init_data, &state.bot_token)?;
    Ok(Json(MeResponse { ok: true, user }))
}
