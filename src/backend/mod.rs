//! Execution backends
//!
//! An [`ExecutionBackend`] describes one concrete JavaScript engine and how to hand
//! it a program: either an external executable (see [`process`]) or an embedded
//! binding implementing [`Executor`]. Descriptors are immutable once built and are
//! shared between contexts behind an `Arc`.

pub mod discovery;
pub mod process;

pub use discovery::{known_backends, Discovery, KnownBackend, PathDiscovery};
pub use process::{CommandOutput, CommandTemplate, ProcessRunner, FILE_PLACEHOLDER};

use crate::error::Result;
use bitflags::bitflags;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

bitflags! {
    /// What a backend can do beyond running a synchronous script
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Timers keep the engine alive, so `compile_async` contexts can wait on `callback`
        const ASYNC_CALLBACKS = 0b0000_0001;
        /// Output is written through `process.stdout` rather than a global `print`
        const PROCESS_STDOUT = 0b0000_0010;
        /// Program text is evaluated as an ES module, which is always strict
        const MODULE_INPUT = 0b0000_0100;
    }
}

/// An engine embedded in (or simulated by) the host process
pub trait Executor: Send + Sync {
    /// Run a complete program and report what it printed and how it exited
    fn invoke(&self, program: &str) -> Result<CommandOutput>;
}

/// How a backend is reached
#[derive(Clone)]
pub enum Strategy {
    /// Spawn an executable per invocation
    Subprocess(CommandTemplate),
    /// Call into an in-process binding
    Embedded(Arc<dyn Executor>),
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Subprocess(template) => f.debug_tuple("Subprocess").field(template).finish(),
            Strategy::Embedded(_) => f.write_str("Embedded(..)"),
        }
    }
}

/// One concrete JavaScript engine adapter
#[derive(Debug, Clone)]
pub struct ExecutionBackend {
    name: String,
    strategy: Strategy,
    capabilities: Capabilities,
    env: Vec<(String, String)>,
    temp_dir: Option<PathBuf>,
}

impl ExecutionBackend {
    /// A backend reached by spawning `template`
    pub fn subprocess(name: impl Into<String>, template: CommandTemplate) -> Self {
        Self {
            name: name.into(),
            strategy: Strategy::Subprocess(template),
            capabilities: Capabilities::empty(),
            env: Vec::new(),
            temp_dir: None,
        }
    }

    /// A backend reached through an in-process executor
    pub fn embedded(name: impl Into<String>, executor: Arc<dyn Executor>) -> Self {
        Self {
            name: name.into(),
            strategy: Strategy::Embedded(executor),
            capabilities: Capabilities::empty(),
            env: Vec::new(),
            temp_dir: None,
        }
    }

    /// Set capability flags
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Add an environment variable for spawned processes
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Directory for program files of backends that read from a file
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Whether `compile_async` contexts can run on this backend
    pub fn supports_async(&self) -> bool {
        self.capabilities.contains(Capabilities::ASYNC_CALLBACKS)
    }

    /// Run a complete program.
    ///
    /// Never imposes a timeout; a process killed from outside comes back with
    /// `signal` set.
    pub fn invoke(&self, program: &str) -> Result<CommandOutput> {
        match &self.strategy {
            Strategy::Subprocess(template) => {
                let mut runner = ProcessRunner::new(template.clone());
                for (key, value) in &self.env {
                    runner = runner.env(key, value);
                }
                if let Some(ref dir) = self.temp_dir {
                    runner = runner.temp_dir(dir);
                }
                runner.run(program)
            }
            Strategy::Embedded(executor) => {
                tracing::trace!(
                    backend = %self.name,
                    bytes = program.len(),
                    "invoking embedded backend"
                );
                executor.invoke(program)
            }
        }
    }
}
