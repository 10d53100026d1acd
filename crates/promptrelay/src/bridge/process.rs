//! One worker process per prompt.
//!
//! Flow:
//! 1. Reject empty prompts before anything is launched
//! 2. Spawn the worker
//! 3. Write `prompt\n` to stdin once and close it, while draining stdout
//!    (accumulated) and stderr (logged) concurrently
//! 4. Wait for exit; code 0 resolves to the trimmed stdout
//!
//! The child is killed and reaped on every path that abandons it early
//! (timeout, communication failure). Dropping the bridge future kills it too,
//! via `kill_on_drop` on the spawned command.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin};

use super::outcome::{BridgeError, Outcome};
use super::spawner::{CommandSpawner, WorkerCommand, WorkerSpawner};
use super::streams::{collect_output, forward_diagnostics, response_text};
use super::PromptHandler;

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Upper bound on a single worker run. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(300)),
        }
    }
}

impl BridgeConfig {
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Stateless bridge between a prompt and a freshly spawned worker.
///
/// Safe to share across requests: each call owns its own child process and
/// output buffer.
pub struct ProcessBridge {
    spawner: Arc<dyn WorkerSpawner>,
    config: BridgeConfig,
}

impl ProcessBridge {
    pub fn new(spawner: Arc<dyn WorkerSpawner>, config: BridgeConfig) -> Self {
        Self { spawner, config }
    }

    pub fn from_command(command: WorkerCommand, config: BridgeConfig) -> Self {
        Self::new(Arc::new(CommandSpawner::new(command)), config)
    }

    async fn run(&self, prompt: String) -> Outcome {
        if prompt.is_empty() {
            return Err(BridgeError::InvalidInput);
        }

        let mut child = self.spawner.spawn().map_err(|e| {
            tracing::error!(worker = %self.spawner.describe(), error = %e, "Failed to start worker");
            BridgeError::Launch(e)
        })?;
        tracing::debug!(pid = ?child.id(), "Worker launched");

        let result = match self.config.timeout {
            Some(limit) => match tokio::time::timeout(limit, exchange(&mut child, prompt)).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(timeout = ?limit, "Worker timed out, killing");
                    Err(BridgeError::Timeout(limit))
                }
            },
            None => exchange(&mut child, prompt).await,
        };

        match &result {
            Ok(text) => tracing::debug!(bytes = text.len(), "Worker succeeded"),
            Err(BridgeError::Runtime(e)) => {
                tracing::error!(error = %e, "Worker communication failed");
                terminate(&mut child).await;
            }
            Err(BridgeError::Timeout(_)) => terminate(&mut child).await,
            Err(_) => {}
        }

        result
    }
}

#[async_trait]
impl PromptHandler for ProcessBridge {
    async fn handle(&self, prompt: String) -> Outcome {
        self.run(prompt).await
    }

    fn describe(&self) -> String {
        self.spawner.describe()
    }
}

/// Feed the prompt, drain both streams, then wait for exit.
///
/// Output is only turned into a result once the process has exited, so a
/// partial read never resolves the request.
async fn exchange(child: &mut Child, prompt: String) -> Outcome {
    let stdin = child.stdin.take().ok_or_else(|| not_captured("stdin"))?;
    let stdout = child.stdout.take().ok_or_else(|| not_captured("stdout"))?;
    let stderr = child.stderr.take().ok_or_else(|| not_captured("stderr"))?;

    let (_, output, stderr_lines) = tokio::try_join!(
        write_prompt(stdin, prompt),
        collect_output(stdout),
        async { Ok::<_, io::Error>(forward_diagnostics(stderr).await) },
    )
    .map_err(BridgeError::Runtime)?;

    let status = child.wait().await.map_err(BridgeError::Runtime)?;
    tracing::debug!(
        ?status,
        stdout_bytes = output.len(),
        stderr_lines,
        "Worker exited"
    );

    if status.success() {
        Ok(response_text(&output))
    } else {
        tracing::warn!(code = ?status.code(), "Worker exited with non-zero status");
        Err(BridgeError::Worker {
            code: status.code(),
        })
    }
}

/// Write the prompt line exactly once, then close stdin.
///
/// A worker that exits without reading its input closes the pipe first;
/// that is not a communication failure, the exit status decides.
async fn write_prompt(mut stdin: ChildStdin, prompt: String) -> io::Result<()> {
    let mut line = prompt;
    line.push('\n');

    let written = async {
        stdin.write_all(line.as_bytes()).await?;
        stdin.shutdown().await
    }
    .await;
    drop(stdin);

    match written {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            tracing::debug!("Worker closed stdin before reading the full prompt");
            Ok(())
        }
        other => other,
    }
}

async fn terminate(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        tracing::debug!(error = %e, "Worker already gone");
    }
    if let Err(e) = child.wait().await {
        tracing::warn!(error = %e, "Failed to reap worker");
    }
}

fn not_captured(stream: &str) -> BridgeError {
    BridgeError::Runtime(io::Error::other(format!("worker {stream} not captured")))
}
