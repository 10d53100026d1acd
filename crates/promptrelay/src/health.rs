//! Health status types for the relay.

use serde::{Deserialize, Serialize};

/// Health status reported by `/health-check`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Health {
    /// Accepting requests with spare worker capacity
    #[default]
    Ready,
    /// Accepting requests, but new ones will queue (all permits held)
    Busy,
    /// Draining; new requests are refused
    ShuttingDown,
}

/// Worker capacity as seen by the permit pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Concurrency {
    pub available: usize,
    pub limit: usize,
}
