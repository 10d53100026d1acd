//! Worker launch strategies.

use std::io;
use std::process::Stdio;

use tokio::process::{Child, Command};

/// Fixed invocation of the inference worker.
///
/// Set once at startup. Nothing about it varies per request; the prompt
/// only ever travels over stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for WorkerCommand {
    fn default() -> Self {
        Self {
            program: "ollama".to_string(),
            args: vec!["run".to_string(), "idea-refiner".to_string()],
        }
    }
}

impl WorkerCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

impl std::fmt::Display for WorkerCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Extension point for launching worker processes.
///
/// Implementations must hand back a child with stdin, stdout and stderr
/// all piped.
pub trait WorkerSpawner: Send + Sync {
    fn spawn(&self) -> io::Result<Child>;

    /// Human-readable description for logs and health output.
    fn describe(&self) -> String;
}

/// Spawns the configured command directly (no shell).
#[derive(Debug, Clone, Default)]
pub struct CommandSpawner {
    command: WorkerCommand,
}

impl CommandSpawner {
    pub fn new(command: WorkerCommand) -> Self {
        Self { command }
    }
}

impl WorkerSpawner for CommandSpawner {
    fn spawn(&self) -> io::Result<Child> {
        Command::new(&self.command.program)
            .args(&self.command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the handle (client gone, timeout, panic) must not orphan the worker.
            .kill_on_drop(true)
            .spawn()
    }

    fn describe(&self) -> String {
        self.command.to_string()
    }
}
