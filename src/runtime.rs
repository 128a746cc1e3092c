//! Runtime facade
//!
//! A [`Runtime`] owns one selected backend and offers the top-level operations.
//!
//! # Example
//!
//! ```no_run
//! use jsrelay::{Runtime, Value};
//!
//! let runtime = Runtime::new()?;
//! assert_eq!(runtime.eval("1 + 1")?, Value::Integer(2));
//!
//! let ctx = runtime.compile("function greet(name) { return 'hi ' + name }")?;
//! assert_eq!(ctx.call("greet", &[Value::from("bob")])?, Value::from("hi bob"));
//! # Ok::<(), jsrelay::Error>(())
//! ```

use crate::backend::{Discovery, ExecutionBackend, PathDiscovery};
use crate::config::RuntimeConfig;
use crate::context::CompiledContext;
use crate::encoding::Source;
use crate::error::{Error, Result, RuntimeErrorKind};
use crate::value::Value;
use crate::wrapper::Completion;
use std::sync::Arc;

/// Entry point for running JavaScript on a selected backend
#[derive(Debug, Clone)]
pub struct Runtime {
    backend: Arc<ExecutionBackend>,
}

impl Runtime {
    /// Select a backend using [`RuntimeConfig::from_env`] and the search path
    pub fn new() -> Result<Self> {
        Self::with_config(&RuntimeConfig::from_env())
    }

    /// Select a backend from `PATH` plus the configured search paths
    pub fn with_config(config: &RuntimeConfig) -> Result<Self> {
        let discovery = PathDiscovery::new().with_paths(config.search_paths.iter().cloned());
        Self::with_discovery(config, &discovery)
    }

    /// Select the first candidate of `discovery` that `config` allows
    pub fn with_discovery(config: &RuntimeConfig, discovery: &dyn Discovery) -> Result<Self> {
        let backend = discovery
            .candidates()
            .into_iter()
            .find(|candidate| config.selects(candidate.name()))
            .ok_or_else(|| {
                let message = match config.runtime {
                    Some(ref name) => format!("Could not find JavaScript runtime '{}'", name),
                    None => "Could not find a JavaScript runtime".to_string(),
                };
                Error::runtime(RuntimeErrorKind::Unavailable, message)
            })?;

        let mut backend = config
            .env
            .iter()
            .fold(backend, |backend, (key, value)| backend.with_env(key, value));
        if let Some(ref dir) = config.temp_dir {
            backend = backend.with_temp_dir(dir);
        }
        tracing::debug!(backend = %backend.name(), "selected JavaScript runtime");
        Ok(Self::with_backend(backend))
    }

    /// Use `backend` directly
    pub fn with_backend(backend: ExecutionBackend) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Every backend discoverable under `config`, most preferred first
    pub fn available(config: &RuntimeConfig) -> Vec<ExecutionBackend> {
        PathDiscovery::new()
            .with_paths(config.search_paths.iter().cloned())
            .candidates()
    }

    /// The selected backend
    pub fn backend(&self) -> &ExecutionBackend {
        &self.backend
    }

    /// Run statements as a function body; the value of a `return` is the result
    pub fn exec<'a>(&self, source: impl Into<Source<'a>>) -> Result<Value> {
        self.context(String::new(), Completion::Return).exec(source)
    }

    /// Evaluate one expression
    pub fn eval<'a>(&self, expression: impl Into<Source<'a>>) -> Result<Value> {
        self.context(String::new(), Completion::Return).eval(expression)
    }

    /// Load `source` into a context for later `exec`/`eval`/`call`
    pub fn compile<'a>(&self, source: impl Into<Source<'a>>) -> Result<CompiledContext> {
        let prelude = source.into().into_text()?.into_owned();
        Ok(self.context(prelude, Completion::Return))
    }

    /// Like [`compile`](Self::compile), but results are delivered through an
    /// injected `callback`
    ///
    /// Every operation on the returned context completes only when its program
    /// calls `callback`. One that never does, such as `eval("")` or
    /// `exec("return 1")`, blocks until the backend process is killed, which then
    /// fails with `RuntimeErrorKind::Killed`.
    pub fn compile_async<'a>(&self, source: impl Into<Source<'a>>) -> Result<CompiledContext> {
        if !self.backend.supports_async() {
            return Err(Error::runtime(
                RuntimeErrorKind::Unsupported,
                format!("{} does not support async callbacks", self.backend.name()),
            ));
        }
        let prelude = source.into().into_text()?.into_owned();
        Ok(self.context(prelude, Completion::Callback))
    }

    fn context(&self, prelude: String, completion: Completion) -> CompiledContext {
        CompiledContext::new(Arc::clone(&self.backend), prelude, completion)
    }
}
