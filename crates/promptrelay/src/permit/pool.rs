//! Semaphore-backed permit pool.
//!
//! One permit is held for the full lifetime of one worker process. Requests
//! beyond the limit queue on the semaphore (FIFO) for at most
//! `queue_timeout`; after that they are turned away instead of piling up.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Debug, Clone, thiserror::Error)]
pub enum PermitError {
    #[error("No worker slot freed up within {0:?}")]
    QueueTimeout(Duration),
    #[error("Permit pool closed")]
    Closed,
}

/// Right to run one worker. Capacity returns to the pool on drop.
#[must_use = "dropping the permit immediately releases the worker slot"]
#[derive(Debug)]
pub struct WorkerPermit {
    _permit: OwnedSemaphorePermit,
}

/// Caps the number of concurrently running worker processes.
#[derive(Debug)]
pub struct PermitPool {
    semaphore: Arc<Semaphore>,
    limit: usize,
    queue_timeout: Option<Duration>,
}

impl PermitPool {
    /// A pool of `limit` permits (at least one).
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
            queue_timeout: None,
        }
    }

    /// How long `acquire` may wait. `None` waits until a permit frees up.
    pub fn with_queue_timeout(mut self, queue_timeout: Option<Duration>) -> Self {
        self.queue_timeout = queue_timeout;
        self
    }

    pub async fn acquire(&self) -> Result<WorkerPermit, PermitError> {
        let acquire = Arc::clone(&self.semaphore).acquire_owned();
        let permit = match self.queue_timeout {
            Some(limit) => tokio::time::timeout(limit, acquire)
                .await
                .map_err(|_| PermitError::QueueTimeout(limit))?,
            None => acquire.await,
        };
        permit
            .map(|p| WorkerPermit { _permit: p })
            .map_err(|_| PermitError::Closed)
    }

    /// Stop handing out permits. Waiters and future callers get `Closed`;
    /// permits already held stay valid until dropped.
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn in_use(&self) -> usize {
        self.limit.saturating_sub(self.available())
    }
}
