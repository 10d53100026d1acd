//! ChatService: transport-agnostic request handling.
//!
//! This service owns:
//! - The prompt handler (normally a `ProcessBridge`)
//! - Admission control (`PermitPool` bounding concurrent workers)
//! - Health and shutdown state
//!
//! Transports (HTTP) delegate to this service once per inbound request.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::bridge::{BridgeError, PromptHandler};
use crate::health::{Concurrency, Health};
use crate::permit::{PermitError, PermitPool};
use crate::version::VersionInfo;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error("Overloaded: {0}")]
    Overloaded(PermitError),
    #[error("Service is shutting down")]
    ShuttingDown,
}

impl ChatError {
    /// Stable failure label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            ChatError::Bridge(e) => e.kind().as_str(),
            ChatError::Overloaded(_) => "overloaded",
            ChatError::ShuttingDown => "shutting_down",
        }
    }
}

impl From<PermitError> for ChatError {
    fn from(e: PermitError) -> Self {
        match e {
            PermitError::QueueTimeout(_) => ChatError::Overloaded(e),
            PermitError::Closed => ChatError::ShuttingDown,
        }
    }
}

/// Snapshot of service health for transports to query.
#[derive(Debug, Clone)]
pub struct HealthSnapshot {
    pub state: Health,
    pub concurrency: Concurrency,
    pub version: VersionInfo,
}

pub struct ChatService {
    handler: Arc<dyn PromptHandler>,
    pool: Arc<PermitPool>,
    shutting_down: AtomicBool,
    version: VersionInfo,
}

impl ChatService {
    pub fn new(handler: Arc<dyn PromptHandler>, pool: PermitPool) -> Self {
        let version = VersionInfo::new().with_worker(handler.describe());
        Self {
            handler,
            pool: Arc::new(pool),
            shutting_down: AtomicBool::new(false),
            version,
        }
    }

    /// Relay one prompt to a worker and return its trimmed output.
    ///
    /// Empty prompts are rejected before taking a permit, so they never
    /// queue behind running workers.
    pub async fn chat(&self, prompt: String) -> Result<String, ChatError> {
        if prompt.is_empty() {
            return Err(BridgeError::InvalidInput.into());
        }
        if self.is_shutting_down() {
            return Err(ChatError::ShuttingDown);
        }

        let _permit = self.pool.acquire().await.map_err(|e| {
            tracing::warn!(error = %e, in_use = self.pool.in_use(), "Chat request not admitted");
            ChatError::from(e)
        })?;
        tracing::debug!(in_use = self.pool.in_use(), "Worker permit acquired");

        Ok(self.handler.handle(prompt).await?)
    }

    pub fn health(&self) -> HealthSnapshot {
        let concurrency = Concurrency {
            available: self.pool.available(),
            limit: self.pool.limit(),
        };
        let state = if self.is_shutting_down() {
            Health::ShuttingDown
        } else if concurrency.available == 0 {
            Health::Busy
        } else {
            Health::Ready
        };

        HealthSnapshot {
            state,
            concurrency,
            version: self.version.clone(),
        }
    }

    /// Refuse new requests. In-flight workers run to completion.
    pub fn begin_shutdown(&self) {
        if !self.shutting_down.swap(true, Ordering::SeqCst) {
            tracing::info!(in_flight = self.pool.in_use(), "Refusing new chat requests");
        }
        self.pool.close();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }
}
