//! Prelude module for convenient imports
//!
//! ```no_run
//! use jsrelay::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let runtime = Runtime::new()?;
//!     println!("{}", runtime.eval("1 + 2")?);
//!     Ok(())
//! }
//! ```

// Entry points
pub use crate::context::{CompiledContext, ContextState};
pub use crate::runtime::Runtime;
pub use crate::config::RuntimeConfig;

// Values and source text
pub use crate::encoding::Source;
pub use crate::value::Value;

// Error handling
pub use crate::error::{Error, Result, RuntimeErrorKind, StackFrame, StackTrace};

// Backends
pub use crate::backend::{
    Capabilities, CommandOutput, Discovery, ExecutionBackend, Executor, PathDiscovery,
};
pub use crate::codec::ResultMarker;
