//! Shared test helpers for integration tests

use jsrelay::backend::{CommandTemplate, PathDiscovery};
use jsrelay::{Capabilities, ExecutionBackend, Runtime, RuntimeConfig};
use std::sync::Once;

static TRACING: Once = Once::new();

/// Install a `RUST_LOG`-filtered subscriber once per test binary
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A runtime on the installed engine, or `None` (with a log line) when there is none
#[allow(dead_code)]
pub fn runtime() -> Option<Runtime> {
    init_tracing();
    match Runtime::with_config(&RuntimeConfig::from_env()) {
        Ok(runtime) => Some(runtime),
        Err(err) => {
            eprintln!("skipping: {}", err);
            None
        }
    }
}

/// Bind a runtime or return from the test
#[allow(unused_macros)]
macro_rules! require_runtime {
    () => {
        match common::runtime() {
            Some(runtime) => runtime,
            None => return,
        }
    };
}

/// A runtime whose engine supports `compile_async`, or `None`
#[allow(dead_code)]
pub fn async_runtime() -> Option<Runtime> {
    runtime().filter(|runtime| {
        let supported = runtime.backend().supports_async();
        if !supported {
            eprintln!("skipping: {} has no async callbacks", runtime.backend().name());
        }
        supported
    })
}

/// node loading stdin as an ES module, the way `bun run -` and `deno run -` do
#[allow(dead_code)]
pub fn module_runtime() -> Option<Runtime> {
    init_tracing();
    let Some(node) = PathDiscovery::new().which("node") else {
        eprintln!("skipping: node is not installed");
        return None;
    };
    let template = CommandTemplate::new(node).arg("--input-type=module");
    let capabilities =
        Capabilities::MODULE_INPUT | Capabilities::ASYNC_CALLBACKS | Capabilities::PROCESS_STDOUT;
    let backend = ExecutionBackend::subprocess("Node.js (module)", template);
    Some(Runtime::with_backend(backend.with_capabilities(capabilities)))
}
