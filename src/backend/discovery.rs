//! Backend discovery
//!
//! A [`Discovery`] produces candidate backends in preference order. The default,
//! [`PathDiscovery`], looks for the engines in [`known_backends`] on `PATH` plus any
//! extra directories from the configuration.

use super::{Capabilities, CommandTemplate, ExecutionBackend, FILE_PLACEHOLDER};
use std::env;
use std::path::{Path, PathBuf};

/// Source of candidate backends
pub trait Discovery {
    /// Usable backends, most preferred first
    fn candidates(&self) -> Vec<ExecutionBackend>;
}

/// An engine this crate knows how to drive
#[derive(Debug, Clone, Copy)]
pub struct KnownBackend {
    /// Display name, also used to select the backend by configuration
    pub name: &'static str,
    /// Executable names to look for, in order
    pub commands: &'static [&'static str],
    /// Arguments; [`FILE_PLACEHOLDER`] means the program is passed as a file
    pub args: &'static [&'static str],
    pub capabilities: Capabilities,
}

impl KnownBackend {
    /// Build a descriptor for this engine at `executable`
    pub fn at(&self, executable: impl Into<PathBuf>) -> ExecutionBackend {
        let template = CommandTemplate::new(executable).args(self.args.iter().copied());
        ExecutionBackend::subprocess(self.name, template).with_capabilities(self.capabilities)
    }
}

const NODE_CAPS: Capabilities = Capabilities::ASYNC_CALLBACKS.union(Capabilities::PROCESS_STDOUT);

// `bun run -` and `deno run -` load stdin as an ES module
const BUN_CAPS: Capabilities = NODE_CAPS.union(Capabilities::MODULE_INPUT);
const DENO_CAPS: Capabilities = Capabilities::ASYNC_CALLBACKS.union(Capabilities::MODULE_INPUT);

static KNOWN_BACKENDS: &[KnownBackend] = &[
    KnownBackend {
        name: "Node.js (V8)",
        commands: &["node", "nodejs"],
        args: &[],
        capabilities: NODE_CAPS,
    },
    KnownBackend {
        name: "Bun",
        commands: &["bun"],
        args: &["run", "-"],
        capabilities: BUN_CAPS,
    },
    KnownBackend {
        name: "Deno",
        commands: &["deno"],
        args: &["run", "--quiet", "-"],
        capabilities: DENO_CAPS,
    },
    KnownBackend {
        name: "V8",
        commands: &["d8"],
        args: &[FILE_PLACEHOLDER],
        capabilities: Capabilities::empty(),
    },
    KnownBackend {
        name: "QuickJS",
        commands: &["qjs"],
        args: &[FILE_PLACEHOLDER],
        capabilities: Capabilities::empty(),
    },
    KnownBackend {
        name: "JavaScriptCore",
        commands: &["jsc"],
        args: &[FILE_PLACEHOLDER],
        capabilities: Capabilities::empty(),
    },
    KnownBackend {
        name: "SpiderMonkey",
        commands: &["js"],
        args: &[FILE_PLACEHOLDER],
        capabilities: Capabilities::empty(),
    },
];

/// Every engine this crate knows, in preference order
pub fn known_backends() -> &'static [KnownBackend] {
    KNOWN_BACKENDS
}

/// Finds known engines on the search path
#[derive(Debug, Clone, Default)]
pub struct PathDiscovery {
    extra_paths: Vec<PathBuf>,
}

impl PathDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Search these directories before `PATH`
    pub fn with_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.extra_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    fn search_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = self.extra_paths.clone();
        if let Some(path) = env::var_os("PATH") {
            dirs.extend(env::split_paths(&path));
        }
        dirs
    }

    /// Locate `command` in the search directories
    pub fn which(&self, command: &str) -> Option<PathBuf> {
        let command = Path::new(command);
        if command.components().count() > 1 {
            return is_executable(command).then(|| command.to_path_buf());
        }
        self.search_dirs().into_iter().find_map(|dir| {
            executable_names(command)
                .into_iter()
                .map(|name| dir.join(name))
                .find(|candidate| is_executable(candidate))
        })
    }
}

impl Discovery for PathDiscovery {
    fn candidates(&self) -> Vec<ExecutionBackend> {
        let found: Vec<ExecutionBackend> = KNOWN_BACKENDS
            .iter()
            .filter_map(|known| {
                let executable = known.commands.iter().find_map(|c| self.which(c))?;
                tracing::debug!(
                    backend = known.name,
                    path = %executable.display(),
                    "found backend"
                );
                Some(known.at(executable))
            })
            .collect();
        if found.is_empty() {
            tracing::debug!("no JavaScript backend found on the search path");
        }
        found
    }
}

#[cfg(windows)]
fn executable_names(command: &Path) -> Vec<PathBuf> {
    vec![command.with_extension("exe"), command.with_extension("cmd"), command.to_path_buf()]
}

#[cfg(not(windows))]
fn executable_names(command: &Path) -> Vec<PathBuf> {
    vec![command.to_path_buf()]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
