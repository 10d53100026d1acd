//! HTTP route handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    extract::{Request, State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::bridge::FailureKind;
use crate::health::{Concurrency, Health};
use crate::service::{ChatError, ChatService, HealthSnapshot};
use crate::version::VersionInfo;

pub const PROMPT_REQUIRED: &str = "Prompt is required";
pub const LAUNCH_FAILED: &str = "Failed to start Ollama";
pub const WORKER_FAILED: &str = "Ollama failed to respond properly";
pub const WORKER_TIMED_OUT: &str = "Ollama timed out";
pub const OVERLOADED: &str = "Too many concurrent requests";
pub const SOMETHING_WENT_WRONG: &str = "Something went wrong!";

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: Health,
    pub concurrency: Concurrency,
    pub version: VersionInfo,
}

impl From<HealthSnapshot> for HealthCheckResponse {
    fn from(snapshot: HealthSnapshot) -> Self {
        Self {
            status: snapshot.state,
            concurrency: snapshot.concurrency,
            version: snapshot.version,
        }
    }
}

fn error_response(status: StatusCode, error: &'static str) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

/// Fixed, non-leaky status and message per failure category.
/// Details stay in the server log.
fn failure_response(err: &ChatError) -> (StatusCode, &'static str) {
    match err {
        ChatError::Bridge(e) => match e.kind() {
            FailureKind::InvalidInput => (StatusCode::BAD_REQUEST, PROMPT_REQUIRED),
            FailureKind::LaunchError => (StatusCode::INTERNAL_SERVER_ERROR, LAUNCH_FAILED),
            FailureKind::WorkerError => (StatusCode::INTERNAL_SERVER_ERROR, WORKER_FAILED),
            FailureKind::Timeout => (StatusCode::GATEWAY_TIMEOUT, WORKER_TIMED_OUT),
            FailureKind::RuntimeError => {
                (StatusCode::INTERNAL_SERVER_ERROR, SOMETHING_WENT_WRONG)
            }
        },
        ChatError::Overloaded(_) => (StatusCode::SERVICE_UNAVAILABLE, OVERLOADED),
        ChatError::ShuttingDown => (StatusCode::INTERNAL_SERVER_ERROR, SOMETHING_WENT_WRONG),
    }
}

/// Aborts the chat task when the HTTP request future is dropped first
/// (client disconnect). Aborting drops the worker handle, which kills it.
struct AbortOnDisconnect(Option<tokio::task::AbortHandle>);

impl AbortOnDisconnect {
    fn disarm(&mut self) {
        self.0 = None;
    }
}

impl Drop for AbortOnDisconnect {
    fn drop(&mut self) {
        if let Some(handle) = self.0.take() {
            tracing::info!("Client disconnected, abandoning worker");
            handle.abort();
        }
    }
}

async fn chat(
    State(service): State<Arc<ChatService>>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("chat", %request_id);

    let prompt = match body {
        Ok(Json(request)) => request.prompt.unwrap_or_default(),
        Err(rejection) => {
            span.in_scope(|| tracing::debug!(error = %rejection, "Rejected chat body"));
            String::new()
        }
    };

    // Run on its own task so a panic surfaces as a JoinError instead of
    // tearing down the connection.
    let started = Instant::now();
    let task = tokio::spawn({
        let service = Arc::clone(&service);
        async move { service.chat(prompt).await }.instrument(span.clone())
    });
    let mut guard = AbortOnDisconnect(Some(task.abort_handle()));
    let result = task.await;
    guard.disarm();

    let elapsed_ms = started.elapsed().as_millis() as u64;
    span.in_scope(|| match result {
        Ok(Ok(response)) => {
            tracing::info!(elapsed_ms, bytes = response.len(), "Chat succeeded");
            (StatusCode::OK, Json(ChatResponse { response })).into_response()
        }
        Ok(Err(e)) => {
            let (status, message) = failure_response(&e);
            if status.is_server_error() {
                tracing::error!(elapsed_ms, kind = e.label(), error = %e, %status, "Chat failed");
            } else {
                tracing::info!(elapsed_ms, kind = e.label(), error = %e, %status, "Chat rejected");
            }
            error_response(status, message)
        }
        Err(e) => {
            tracing::error!(elapsed_ms, error = %e, "Chat task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, SOMETHING_WENT_WRONG)
        }
    })
}

async fn health_check(State(service): State<Arc<ChatService>>) -> Json<HealthCheckResponse> {
    Json(service.health().into())
}

async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Allow cross-origin requests from any origin.
async fn cors(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("content-type"),
    );
    response
}

pub fn routes(service: Arc<ChatService>) -> Router {
    Router::new()
        .route("/chat", post(chat).options(preflight))
        .route("/health-check", get(health_check).options(preflight))
        .layer(middleware::from_fn(cors))
        .with_state(service)
}
