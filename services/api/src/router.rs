//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the Twilio webhook, the media stream endpoint, and OpenAPI
//! documentation.

use crate::{
    handlers,
    models::{ErrorResponse, HealthResponse, VoiceWebhook},
    state::AppState,
    ws::stream_handler,
};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::voice, handlers::health),
    components(schemas(VoiceWebhook, HealthResponse, ErrorResponse)),
    tags(
        (name = "Silver-Line API", description = "Telephone PHQ-9 screening over Twilio")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Group all routes that require AppState into their own router.
    let api_router = Router::new()
        .route("/voice", post(handlers::voice))
        .route("/stream", get(stream_handler))
        .with_state(app_state);

    // Merge the stateful routes with the stateless ones (health, Swagger UI).
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(handlers::health))
        .merge(api_router)
        .fallback(handlers::not_found)
}
