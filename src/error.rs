//! Error types for jsrelay
//!
//! Every operation that reaches a backend fails in one of two ways: the script
//! itself threw ([`Error::ProgramError`]) or the runtime/environment failed before a
//! value could be produced ([`Error::RuntimeError`]).

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// A single frame in a backend-reported stack trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Function name (or `"<anonymous>"` for anonymous functions)
    pub function_name: String,
    /// Source file name as reported by the backend (`[stdin]`, a temp path, ...)
    pub file_name: Option<String>,
    /// Line number in source (1-indexed)
    pub line: u32,
    /// Column number in source (1-indexed)
    pub column: u32,
    /// Whether the frame belongs to the engine's own internals
    pub is_native: bool,
}

impl StackFrame {
    /// Create a new stack frame
    pub fn new(function_name: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            function_name: function_name.into(),
            file_name: None,
            line,
            column,
            is_native: false,
        }
    }

    /// Create a stack frame with file name
    pub fn with_file(mut self, file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        self.is_native = file_name.starts_with("node:") || file_name == "native";
        self.file_name = Some(file_name);
        self
    }

    /// Parse one V8-style `at fn (file:line:col)` / `at file:line:col` line.
    pub fn parse(line: &str) -> Option<Self> {
        static FRAME: LazyLock<Option<Regex>> =
            LazyLock::new(|| Regex::new(r"^\s*at (?:(.+?) \()?(.+?):(\d+):(\d+)\)?$").ok());
        let caps = FRAME.as_ref()?.captures(line)?;
        let function_name = caps
            .get(1)
            .map(|m| m.as_str())
            .unwrap_or("<anonymous>");
        let line_no = caps[3].parse().ok()?;
        let column = caps[4].parse().ok()?;
        Some(StackFrame::new(function_name, line_no, column).with_file(&caps[2]))
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.file_name {
            Some(ref file) => write!(
                f,
                "    at {} ({}:{}:{})",
                self.function_name, file, self.line, self.column
            ),
            None => write!(
                f,
                "    at {} (<anonymous>:{}:{})",
                self.function_name, self.line, self.column
            ),
        }
    }
}

/// A stack trace as reported by the backend.
///
/// The raw text is kept verbatim; frames are whatever lines could be recognised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackTrace {
    /// The backend's text, unmodified
    pub text: String,
    /// Frames from innermost to outermost
    pub frames: Vec<StackFrame>,
}

impl StackTrace {
    /// Create an empty stack trace
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a stack trace from backend text
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let frames = text.lines().filter_map(StackFrame::parse).collect();
        Self { text, frames }
    }

    /// Check if the stack trace is empty
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

impl fmt::Display for StackTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text.trim_end())
    }
}

/// What went wrong when no value could be produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// The backend rejected the program text
    Syntax,
    /// The backend executable could not be started
    Spawn,
    /// The backend process was terminated by a signal
    Killed,
    /// The backend exited unsuccessfully without a recognisable diagnostic
    Backend,
    /// Source bytes are not valid under their declared encoding
    Encoding,
    /// The compiled context has been closed
    ContextClosed,
    /// The selected backend lacks a required capability
    Unsupported,
    /// No usable backend was found
    Unavailable,
    /// The runtime configuration could not be read
    Config,
    /// `call` named a function the context does not define
    UndefinedFunction,
    /// I/O failure while talking to the backend
    Io,
}

impl fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuntimeErrorKind::Syntax => "SyntaxError",
            RuntimeErrorKind::Spawn => "SpawnError",
            RuntimeErrorKind::Killed => "KilledError",
            RuntimeErrorKind::Backend => "BackendError",
            RuntimeErrorKind::Encoding => "EncodingError",
            RuntimeErrorKind::ContextClosed => "ContextClosedError",
            RuntimeErrorKind::Unsupported => "UnsupportedError",
            RuntimeErrorKind::Unavailable => "UnavailableError",
            RuntimeErrorKind::Config => "ConfigError",
            RuntimeErrorKind::UndefinedFunction => "ReferenceError",
            RuntimeErrorKind::Io => "IOError",
        };
        f.write_str(name)
    }
}

/// Main error type for jsrelay
#[derive(Error, Debug)]
pub enum Error {
    /// The backend failed before or without producing a value
    #[error("{kind}: {message}{}", stack_suffix(.stack_trace))]
    RuntimeError {
        kind: RuntimeErrorKind,
        message: String,
        stack_trace: StackTrace,
    },

    /// The evaluated script threw a value
    #[error("ProgramError: {message}{}", stack_suffix(.stack_trace))]
    ProgramError {
        message: String,
        stack_trace: StackTrace,
    },
}

impl Error {
    /// Create a runtime error of the given kind
    pub fn runtime(kind: RuntimeErrorKind, message: impl Into<String>) -> Self {
        Error::RuntimeError {
            kind,
            message: message.into(),
            stack_trace: StackTrace::new(),
        }
    }

    /// Create a SyntaxError with the backend's diagnostic text
    pub fn syntax_error(message: impl Into<String>, stack_trace: StackTrace) -> Self {
        Error::RuntimeError {
            kind: RuntimeErrorKind::Syntax,
            message: message.into(),
            stack_trace,
        }
    }

    /// Create a program error for a thrown value
    pub fn program_error(message: impl Into<String>, stack_trace: StackTrace) -> Self {
        Error::ProgramError {
            message: message.into(),
            stack_trace,
        }
    }

    /// Create an encoding error
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Error::runtime(RuntimeErrorKind::Encoding, message)
    }

    /// Create an error for an operation on a closed context
    pub fn context_closed() -> Self {
        Error::runtime(RuntimeErrorKind::ContextClosed, "context is closed")
    }

    /// Whether the script itself threw
    pub fn is_program_error(&self) -> bool {
        matches!(self, Error::ProgramError { .. })
    }

    /// Whether the runtime or environment failed
    pub fn is_runtime_error(&self) -> bool {
        matches!(self, Error::RuntimeError { .. })
    }

    /// The runtime error kind, if this is a runtime error
    pub fn kind(&self) -> Option<RuntimeErrorKind> {
        match self {
            Error::RuntimeError { kind, .. } => Some(*kind),
            Error::ProgramError { .. } => None,
        }
    }

    /// The error message without the kind prefix or stack
    pub fn message(&self) -> &str {
        match self {
            Error::RuntimeError { message, .. } | Error::ProgramError { message, .. } => message,
        }
    }

    /// The backend-reported stack trace
    pub fn stack_trace(&self) -> &StackTrace {
        match self {
            Error::RuntimeError { stack_trace, .. } | Error::ProgramError { stack_trace, .. } => {
                stack_trace
            }
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::runtime(RuntimeErrorKind::Io, source.to_string())
    }
}

fn stack_suffix(stack_trace: &StackTrace) -> String {
    if stack_trace.is_empty() {
        String::new()
    } else {
        format!("\n{}", stack_trace)
    }
}

/// Result type alias for jsrelay
pub type Result<T> = std::result::Result<T, Error>;
