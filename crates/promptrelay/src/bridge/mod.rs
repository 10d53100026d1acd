//! Process bridge: one prompt in, one worker process, one outcome out.
//!
//! # Architecture
//!
//! - **spawner**: how the worker is launched (`WorkerSpawner`, `CommandSpawner`)
//! - **process**: lifecycle of a single worker run (`ProcessBridge`)
//! - **streams**: draining stdout into the response and stderr into the log
//! - **outcome**: `Outcome`, `BridgeError`, `FailureKind`

mod outcome;
mod process;
mod spawner;
mod streams;

use async_trait::async_trait;

pub use outcome::{BridgeError, FailureKind, Outcome};
pub use process::{BridgeConfig, ProcessBridge};
pub use spawner::{CommandSpawner, WorkerCommand, WorkerSpawner};

/// Turns a prompt into an outcome.
///
/// `ProcessBridge` is the production implementation; the seam exists so the
/// service and HTTP layers can be exercised without launching processes.
#[async_trait]
pub trait PromptHandler: Send + Sync {
    async fn handle(&self, prompt: String) -> Outcome;

    /// What this handler runs, for logs and health output.
    fn describe(&self) -> String;
}
