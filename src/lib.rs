//! jsrelay: run JavaScript on whatever engine is installed
//!
//! jsrelay hands JavaScript source to an existing engine (Node.js, Bun, Deno, d8,
//! QuickJS, JavaScriptCore, SpiderMonkey, or an embedded binding) and brings the
//! result back as a native [`Value`]. Every operation is one complete program run
//! on a fresh backend process; results travel back as one marked JSON line.
//!
//! # Quick Start
//!
//! ```no_run
//! use jsrelay::{Runtime, Value};
//!
//! fn main() -> jsrelay::Result<()> {
//!     let runtime = Runtime::new()?;
//!     assert_eq!(runtime.eval("[1, 2].length")?, Value::Integer(2));
//!
//!     let ctx = runtime.compile("function add(a, b) { return a + b }")?;
//!     println!("{}", ctx.call("add", &[Value::from(1), Value::from(2)])?);
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! Source → [`wrapper`] → [`backend`] → [`classifier`] / [`codec`] → [`Value`] or [`Error`]
//!
//! | Category | Modules |
//! |----------|---------|
//! | **Entry** | [`runtime`], [`context`], [`config`] |
//! | **Wire** | [`wrapper`], [`codec`], [`value`], [`encoding`] |
//! | **Engines** | [`backend`], [`classifier`] |

pub mod backend;
pub mod classifier;
pub mod codec;
pub mod config;
pub mod context;
pub mod encoding;
pub mod prelude;
pub mod runtime;
pub mod value;
pub mod wrapper;

mod error;

pub use backend::{Capabilities, Discovery, ExecutionBackend, Executor};
pub use codec::ResultMarker;
pub use config::RuntimeConfig;
pub use context::{CompiledContext, ContextState};
pub use encoding::Source;
pub use error::{Error, Result, RuntimeErrorKind, StackFrame, StackTrace};
pub use runtime::Runtime;
pub use value::Value;

/// jsrelay version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
