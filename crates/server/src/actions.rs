//! Assistant action routes.
//!
//! Identity comes from the `x-user-id` header, supplied by the upstream
//! identity provider and trusted as given. Error-to-status mapping:
//! validation 400, unauthenticated 401, forbidden 403, not found 404,
//! anything else 500.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use waypoint_agent::{ActionPipeline, AssistantTurn, BatchOutcome, GuardVerdict, TurnUsage};
use waypoint_core::errors::ActionError;
use waypoint_core::preview::{PreviewContext, PreviewResult};
use waypoint_core::store::UserId;

#[derive(Clone)]
pub struct ActionsState {
    pipeline: Arc<ActionPipeline>,
}

pub fn router(pipeline: Arc<ActionPipeline>) -> Router {
    Router::new()
        .route("/api/assistant/actions", post(submit))
        .route("/api/assistant/actions/preview", post(preview))
        .route("/api/assistant/screen", post(screen))
        .with_state(ActionsState { pipeline })
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

struct ApiError(ActionError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body =
            ErrorBody { error: ErrorDetail { code: self.0.code(), message: self.0.to_string() } };
        (status, Json(body)).into_response()
    }
}

fn require_user(headers: &HeaderMap) -> Result<UserId, ApiError> {
    headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| UserId(value.to_string()))
        .ok_or_else(|| ApiError(ActionError::Unauthorized("missing x-user-id header".to_string())))
}

async fn submit(
    State(state): State<ActionsState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<Json<BatchOutcome>, ApiError> {
    let user_id = require_user(&headers)?;
    let outcome = state.pipeline.submit_batch(&user_id, &payload).await.map_err(ApiError)?;
    Ok(Json(outcome))
}

/// Wire shape for the optional `context` object on preview requests.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreviewContextPayload {
    day_label: Option<String>,
    destination_name: Option<String>,
    from_day_label: Option<String>,
    to_day_label: Option<String>,
    trip_label: Option<String>,
}

impl From<PreviewContextPayload> for PreviewContext {
    fn from(payload: PreviewContextPayload) -> Self {
        Self {
            day_label: payload.day_label,
            destination_name: payload.destination_name,
            from_day_label: payload.from_day_label,
            to_day_label: payload.to_day_label,
            trip_label: payload.trip_label,
        }
    }
}

#[derive(Debug, Serialize)]
struct PreviewResponse {
    previews: Vec<PreviewResult>,
}

async fn preview(
    State(state): State<ActionsState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let user_id = require_user(&headers)?;
    let context: PreviewContext = payload
        .get("context")
        .cloned()
        .map(serde_json::from_value::<PreviewContextPayload>)
        .transpose()
        .map_err(|error| {
            ApiError(ActionError::Validation(format!("malformed preview context: {error}")))
        })?
        .unwrap_or_default()
        .into();
    let previews =
        state.pipeline.preview_batch(&user_id, &payload, &context).await.map_err(ApiError)?;
    Ok(Json(PreviewResponse { previews }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScreenRequest {
    text: String,
    conversation_id: Option<String>,
    message_id: String,
    model: String,
    input_tokens: Option<u32>,
    output_tokens: Option<u32>,
    cost_usd: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ScreenResponse {
    allow: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

async fn screen(
    State(state): State<ActionsState>,
    headers: HeaderMap,
    Json(request): Json<ScreenRequest>,
) -> Result<Json<ScreenResponse>, ApiError> {
    let user_id = require_user(&headers)?;
    let usage = match (request.input_tokens, request.output_tokens) {
        (Some(input_tokens), Some(output_tokens)) => {
            Some(TurnUsage { input_tokens, output_tokens, cost_usd: request.cost_usd })
        }
        _ => None,
    };
    let turn = AssistantTurn {
        text: request.text,
        conversation_id: request.conversation_id,
        message_id: request.message_id,
        model: request.model,
        usage,
    };
    let response = match state.pipeline.screen_turn(&user_id, &turn) {
        GuardVerdict::Allow => ScreenResponse { allow: true, reason: None, message: None },
        GuardVerdict::Block { reason, message } => {
            ScreenResponse { allow: false, reason: Some(reason), message: Some(message) }
        }
    };
    Ok(Json(response))
}
