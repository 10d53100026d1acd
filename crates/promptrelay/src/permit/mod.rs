//! Admission control for worker processes.
//!
//! Every request spawns a process, so the pool bounds how many run at once
//! and queues the rest with backpressure.

mod pool;

pub use pool::{PermitError, PermitPool, WorkerPermit};
