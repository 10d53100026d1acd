//! HTTP transport via axum.

mod routes;
mod server;

pub use routes::{ChatRequest, ChatResponse, ErrorResponse, HealthCheckResponse, routes};
pub use server::{ServerConfig, serve};
