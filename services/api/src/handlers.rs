//! Axum Handlers for the HTTP API
//!
//! This module answers Twilio's voice webhook and reports service health.
//! It uses `utoipa` doc comments to generate OpenAPI documentation.

use axum::{
    extract::{Form, State},
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Json, Response},
};
use silverline_core::questions::QUESTION_COUNT;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    models::{ErrorResponse, HealthResponse, VoiceWebhook},
    state::AppState,
};

pub enum ApiError {
    BadRequest(String),
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                warn!("Bad request: {}", message);
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { message })).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse { message })).into_response()
            }
        }
    }
}

/// Answer an incoming call.
///
/// Twilio speaks the greeting, then connects the call audio to the media
/// stream endpoint where the interview runs.
#[utoipa::path(
    post,
    path = "/voice",
    request_body(content = VoiceWebhook, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "TwiML instructions for the call", content_type = "text/xml", body = String),
        (status = 400, description = "Webhook without a CallSid", body = ErrorResponse)
    )
)]
pub async fn voice(
    State(state): State<Arc<AppState>>,
    Form(payload): Form<VoiceWebhook>,
) -> Result<impl IntoResponse, ApiError> {
    let call_sid = payload
        .call_sid
        .filter(|sid| !sid.is_empty())
        .ok_or_else(|| ApiError::BadRequest("CallSid is required".to_string()))?;
    info!(
        %call_sid,
        status = payload.call_status.as_deref().unwrap_or("unknown"),
        "Incoming call. Connecting media stream."
    );

    let twiml = render_twiml(&state.config.greeting, &state.config.stream_url());
    Ok(([(header::CONTENT_TYPE, "text/xml")], twiml))
}

/// Report service health.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        questions: QUESTION_COUNT,
    })
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}

/// Builds the TwiML that greets the caller and opens a bidirectional stream.
pub fn render_twiml(greeting: &str, stream_url: &str) -> String {
    format!(
        r#"<Response><Say voice="alice" language="en-US">{}</Say><Connect><Stream url="{}"/></Connect></Response>"#,
        escape_xml(greeting),
        escape_xml(stream_url)
    )
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
