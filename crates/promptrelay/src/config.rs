//! Command-line and environment configuration.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use crate::bridge::{BridgeConfig, ProcessBridge, WorkerCommand};
use crate::permit::PermitPool;
use crate::service::ChatService;
use crate::transport::ServerConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("worker program must not be empty")]
    EmptyWorkerProgram,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "promptrelay")]
#[command(version)]
#[command(about = "Relay chat prompts over HTTP to a line-oriented inference tool")]
pub struct Config {
    /// Address to bind the HTTP server to
    #[arg(long, env = "PROMPTRELAY_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PROMPTRELAY_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Program launched once per prompt
    #[arg(long, env = "PROMPTRELAY_WORKER_PROGRAM", default_value = "ollama")]
    pub worker_program: String,

    /// Arguments passed to the worker program (space separated)
    #[arg(
        long,
        env = "PROMPTRELAY_WORKER_ARGS",
        value_delimiter = ' ',
        num_args = 0..,
        allow_hyphen_values = true,
        default_values = ["run", "idea-refiner"]
    )]
    pub worker_args: Vec<String>,

    /// Maximum number of workers running at once
    #[arg(
        long,
        env = "PROMPTRELAY_MAX_CONCURRENCY",
        default_value_t = 4,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_concurrency: u32,

    /// Seconds a worker may run before it is killed (0 = no limit)
    #[arg(long, env = "PROMPTRELAY_TIMEOUT_SECS", default_value_t = 300)]
    pub timeout_secs: u64,

    /// Seconds a request may wait for a free worker slot (0 = wait forever)
    #[arg(long, env = "PROMPTRELAY_QUEUE_TIMEOUT_SECS", default_value_t = 30)]
    pub queue_timeout_secs: u64,
}

fn seconds(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_program.trim().is_empty() {
            return Err(ConfigError::EmptyWorkerProgram);
        }
        Ok(())
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
        }
    }

    pub fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig::default().with_timeout(seconds(self.timeout_secs))
    }

    /// Worker invocation. Empty fragments from repeated spaces are dropped.
    pub fn worker_command(&self) -> WorkerCommand {
        WorkerCommand::new(self.worker_program.trim()).with_args(
            self.worker_args
                .iter()
                .filter(|arg| !arg.is_empty())
                .cloned(),
        )
    }

    pub fn permit_pool(&self) -> PermitPool {
        PermitPool::new(self.max_concurrency as usize)
            .with_queue_timeout(seconds(self.queue_timeout_secs))
    }

    /// Wire a `ChatService` backed by a `ProcessBridge`.
    pub fn build_service(&self) -> Result<ChatService, ConfigError> {
        self.validate()?;
        let bridge = ProcessBridge::from_command(self.worker_command(), self.bridge_config());
        Ok(ChatService::new(Arc::new(bridge), self.permit_pool()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("promptrelay").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let config = parse(&[]);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.worker_command().to_string(), "ollama run idea-refiner");
        assert_eq!(config.max_concurrency, 4);
        assert_eq!(config.bridge_config().timeout, Some(Duration::from_secs(300)));

        let pool = config.permit_pool();
        assert_eq!(pool.limit(), 4);
        assert_eq!(pool.available(), 4);
    }

    #[test]
    fn worker_args_split_on_spaces() {
        let config = parse(&["--worker-program", "llama", "--worker-args", "chat  -m tiny"]);
        let command = config.worker_command();
        assert_eq!(command.program, "llama");
        assert_eq!(command.args, vec!["chat", "-m", "tiny"]);
    }

    #[test]
    fn zero_timeout_disables_limit() {
        let config = parse(&["--timeout-secs", "0"]);
        assert_eq!(config.bridge_config().timeout, None);
    }

    #[test]
    fn zero_concurrency_rejected() {
        let result = Config::try_parse_from(["promptrelay", "--max-concurrency", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn server_config_from_flags() {
        let server = parse(&["--host", "127.0.0.1", "--port", "8080"]).server_config();
        assert_eq!(server.host, "127.0.0.1");
        assert_eq!(server.port, 8080);
    }

    #[test]
    fn empty_worker_program_fails_validation() {
        let config = parse(&["--worker-program", " "]);
        assert!(matches!(config.validate(), Err(ConfigError::EmptyWorkerProgram)));
        assert!(config.build_service().is_err());
    }

    #[test]
    fn build_service_reports_worker_in_version() {
        let service = parse(&["--max-concurrency", "2"]).build_service().unwrap();
        let health = service.health();
        assert_eq!(health.concurrency.limit, 2);
        assert_eq!(
            health.version.worker.as_deref(),
            Some("ollama run idea-refiner")
        );
    }
}
