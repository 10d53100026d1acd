//! promptrelay: HTTP relay from chat prompts to a line-oriented inference tool.

mod health;
mod version;

pub mod bridge;
pub mod config;
pub mod logging;
pub mod permit;
pub mod service;
pub mod transport;

pub use bridge::{
    BridgeConfig, BridgeError, CommandSpawner, FailureKind, Outcome, ProcessBridge, PromptHandler,
    WorkerCommand, WorkerSpawner,
};
pub use config::{Config, ConfigError};
pub use health::{Concurrency, Health};
pub use permit::{PermitError, PermitPool, WorkerPermit};
pub use service::{ChatError, ChatService, HealthSnapshot};
pub use version::{PROMPTRELAY_VERSION, VersionInfo};
