//! Transport layer for promptrelay.
//!
//! Only HTTP is provided. Transports translate requests into
//! `ChatService` calls and outcomes back into responses.

pub mod http;

pub use http::{ServerConfig, serve};
