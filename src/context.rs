//! Compiled contexts
//!
//! A [`CompiledContext`] remembers a prelude and runs every later operation as a
//! fresh backend execution with that prelude in scope, so functions and globals
//! the prelude defines are visible to `exec`, `eval` and `call`.

use crate::backend::ExecutionBackend;
use crate::classifier;
use crate::codec::ResultMarker;
use crate::encoding::Source;
use crate::error::{Error, Result, RuntimeErrorKind};
use crate::value::Value;
use crate::wrapper::{self, Completion, ScriptWrapper};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Lifecycle of a [`CompiledContext`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Prelude recorded, nothing run yet
    Created,
    /// At least one operation reached the backend
    Active,
    /// No further operations are accepted
    Closed,
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextState::Created => write!(f, "created"),
            ContextState::Active => write!(f, "active"),
            ContextState::Closed => write!(f, "closed"),
        }
    }
}

/// A backend session that has loaded some script text
pub struct CompiledContext {
    backend: Arc<ExecutionBackend>,
    prelude: String,
    wrapper: ScriptWrapper,
    // held for the whole operation, serializing use of one context
    state: Mutex<ContextState>,
}

impl CompiledContext {
    pub(crate) fn new(
        backend: Arc<ExecutionBackend>,
        prelude: String,
        completion: Completion,
    ) -> Self {
        let wrapper = ScriptWrapper::new(completion, backend.capabilities());
        Self {
            backend,
            prelude,
            wrapper,
            state: Mutex::new(ContextState::Created),
        }
    }

    /// Run statements; the value of a `return` is the result
    pub fn exec<'a>(&self, source: impl Into<Source<'a>>) -> Result<Value> {
        let source = source.into().into_text()?;
        self.run(&wrapper::exec_body(&source))
    }

    /// Evaluate a single expression
    pub fn eval<'a>(&self, expression: impl Into<Source<'a>>) -> Result<Value> {
        let expression = expression.into().into_text()?;
        self.run(&wrapper::eval_body(&expression))
    }

    /// Call the function `name` (a dotted path such as `"JSON.stringify"`) with `args`
    ///
    /// In an async context the function receives `callback` through scope and the
    /// call completes when it is invoked.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        if !wrapper::is_function_path(name) {
            return Err(Error::runtime(
                RuntimeErrorKind::UndefinedFunction,
                format!("'{}' is not a function name", name),
            ));
        }
        self.run(&wrapper::call_body(name, args)).map_err(|err| match err.kind() {
            Some(RuntimeErrorKind::UndefinedFunction) => Error::runtime(
                RuntimeErrorKind::UndefinedFunction,
                format!("'{}' is not a function", name),
            ),
            _ => err,
        })
    }

    /// Close the context; later operations fail with `ContextClosed`
    pub fn close(&self) {
        match self.state.lock() {
            Ok(mut state) => *state = ContextState::Closed,
            Err(poisoned) => *poisoned.into_inner() = ContextState::Closed,
        }
        tracing::trace!(backend = %self.backend.name(), "context closed");
    }

    pub fn state(&self) -> ContextState {
        match self.state.lock() {
            Ok(state) => *state,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn backend(&self) -> &ExecutionBackend {
        &self.backend
    }

    pub fn completion(&self) -> Completion {
        self.wrapper.completion()
    }

    fn run(&self, body: &str) -> Result<Value> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| Error::runtime(RuntimeErrorKind::Backend, "context lock poisoned"))?;
        if *state == ContextState::Closed {
            return Err(Error::context_closed());
        }

        let marker = ResultMarker::new();
        let program = self.wrapper.wrap(&self.prelude, body, &marker);
        tracing::trace!(backend = %self.backend.name(), bytes = program.len(), "running program");
        let output = self.backend.invoke(&program)?;
        if *state == ContextState::Created {
            *state = ContextState::Active;
        }

        let result = classifier::classify(&output, &marker);
        if let Err(ref err) = result {
            if err.kind() == Some(RuntimeErrorKind::Killed) {
                *state = ContextState::Closed;
            }
        }
        result
    }
}

impl Drop for CompiledContext {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for CompiledContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledContext")
            .field("backend", &self.backend.name())
            .field("completion", &self.wrapper.completion())
            .field("state", &self.state())
            .finish()
    }
}
