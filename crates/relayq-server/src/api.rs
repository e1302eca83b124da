//! HTTP surface of the gateway: routes, handlers and error mapping.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use relayq_core::Gateway;
use relayq_types::{Error, SendRequest};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

/// Route of the send endpoint
pub const SEND_PATH: &str = "/api/ServiceBusSender/send";

// ==================== App State ====================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
}

// ==================== Response Types ====================

/// API Error response
#[derive(Debug, Serialize, ToSchema)]
struct ApiErrorBody {
    /// Error message
    error: String,
    /// Error code
    code: String,
}

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    /// Health status
    status: String,
    /// Server version
    version: String,
}

// ==================== Error Handling ====================

/// Wrapper for RelayQ errors to implement IntoResponse
struct AppError(Error);

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        AppError(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError(Error::InvalidRequest(rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = match &self.0 {
            Error::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            Error::Connection(_) => (StatusCode::SERVICE_UNAVAILABLE, "BROKER_UNAVAILABLE"),
            Error::Authentication(_) => (StatusCode::BAD_GATEWAY, "BROKER_AUTH_FAILED"),
            Error::Rejected { .. } => (StatusCode::BAD_GATEWAY, "BROKER_REJECTED"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = Json(ApiErrorBody {
            error: self.0.to_string(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}

// ==================== OpenAPI Documentation ====================

#[derive(OpenApi)]
#[openapi(
    info(
        title = "RelayQ API",
        version = "0.1.0",
        description = "RelayQ - HTTP send gateway for Azure Service Bus queues",
        license(name = "MIT OR Apache-2.0"),
        contact(name = "RelayQ Team", url = "https://github.com/relayq/relayq")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(health, send_message),
    components(schemas(HealthResponse, SendRequest, ApiErrorBody)),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "messages", description = "Message send endpoints")
    )
)]
struct ApiDoc;

// ==================== Handlers ====================

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Server is healthy", body = HealthResponse)
    )
)]
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Send a message to the configured queue
#[utoipa::path(
    post,
    path = "/api/ServiceBusSender/send",
    tag = "messages",
    request_body = SendRequest,
    responses(
        (status = 200, description = "Message enqueued", body = String, content_type = "text/plain"),
        (status = 400, description = "Malformed request", body = ApiErrorBody),
        (status = 502, description = "Broker refused the message", body = ApiErrorBody),
        (status = 503, description = "Broker unreachable", body = ApiErrorBody)
    )
)]
async fn send_message(
    State(state): State<AppState>,
    payload: Result<Json<SendRequest>, JsonRejection>,
) -> Result<String, AppError> {
    let Json(request) = payload?;

    state.gateway.send(&request).await?;

    Ok(format!("Sent message: {}", request.body_text()))
}

// ==================== Router ====================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Health
        .route("/health", get(health))
        // Messages
        .route(SEND_PATH, post(send_message))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
