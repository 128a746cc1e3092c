//! Subprocess invocation
//!
//! Runs one program on an external engine. The program goes in over stdin (or a
//! temporary file when the command template names [`FILE_PLACEHOLDER`]) and both
//! output streams are captured.
//!
//! Writing a large program while the engine is already producing output can fill
//! either pipe, so the program is written from its own thread while
//! `wait_with_output` drains stdout and stderr concurrently.

use crate::error::{Error, Result, RuntimeErrorKind};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

/// Argument placeholder replaced by the program file path
pub const FILE_PLACEHOLDER: &str = "{file}";

/// Command output
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub success: bool,
    pub code: Option<i32>,
    /// Signal that terminated the process, if any
    pub signal: Option<i32>,
}

impl CommandOutput {
    /// A successful exit with the given stdout
    pub fn success(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: stdout.into(),
            success: true,
            code: Some(0),
            ..Default::default()
        }
    }

    /// An unsuccessful exit with the given code and stderr
    pub fn failure(code: i32, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            stderr: stderr.into(),
            code: Some(code),
            ..Default::default()
        }
    }

    /// A process terminated by `signal`
    pub fn killed(signal: i32) -> Self {
        Self {
            signal: Some(signal),
            ..Default::default()
        }
    }

    pub fn stdout_string(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    pub fn stderr_string(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }

    fn from_output(output: std::process::Output) -> Self {
        Self {
            success: output.status.success(),
            code: output.status.code(),
            signal: exit_signal(&output.status),
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

#[cfg(unix)]
fn exit_signal(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &std::process::ExitStatus) -> Option<i32> {
    None
}

/// Executable plus arguments, optionally naming a program file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl CommandTemplate {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Whether the program is passed as a file rather than on stdin
    pub fn takes_file(&self) -> bool {
        self.args.iter().any(|a| a.contains(FILE_PLACEHOLDER))
    }

    fn resolve_args(&self, file: Option<&Path>) -> Vec<String> {
        match file {
            Some(path) => {
                let path = path.to_string_lossy();
                self.args.iter().map(|a| a.replace(FILE_PLACEHOLDER, &path)).collect()
            }
            None => self.args.clone(),
        }
    }
}

/// Spawns a template once per program
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    template: CommandTemplate,
    env: Vec<(String, String)>,
    temp_dir: Option<PathBuf>,
}

impl ProcessRunner {
    pub fn new(template: CommandTemplate) -> Self {
        Self {
            template,
            env: Vec::new(),
            temp_dir: None,
        }
    }

    /// Set an environment variable for the spawned process
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    /// Directory for program files
    pub fn temp_dir(mut self, dir: &Path) -> Self {
        self.temp_dir = Some(dir.to_path_buf());
        self
    }

    /// Run `program` to completion
    pub fn run(&self, program: &str) -> Result<CommandOutput> {
        if self.template.takes_file() {
            self.run_with_file(program)
        } else {
            self.run_with_stdin(program)
        }
    }

    fn command(&self, file: Option<&Path>) -> Command {
        let mut command = Command::new(&self.template.program);
        command.args(self.template.resolve_args(file));
        for (key, value) in &self.env {
            command.env(key, value);
        }
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        command
    }

    fn spawn(&self, mut command: Command) -> Result<std::process::Child> {
        tracing::debug!(program = %self.template.program.display(), "spawning backend");
        command.spawn().map_err(|e| {
            Error::runtime(
                RuntimeErrorKind::Spawn,
                format!("failed to start '{}': {}", self.template.program.display(), e),
            )
        })
    }

    fn run_with_stdin(&self, program: &str) -> Result<CommandOutput> {
        let mut command = self.command(None);
        command.stdin(Stdio::piped());
        let mut child = self.spawn(command)?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::runtime(RuntimeErrorKind::Io, "backend stdin unavailable"))?;

        let (output, written) = thread::scope(|scope| {
            let writer = scope.spawn(move || -> io::Result<()> {
                stdin.write_all(program.as_bytes())?;
                stdin.flush()
                // dropping stdin here sends EOF
            });
            let output = child.wait_with_output();
            (output, writer.join())
        });

        let output = CommandOutput::from_output(output?);
        match written {
            Ok(Ok(())) => {}
            // The engine quit before reading everything; its exit status says why
            Ok(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => {
                tracing::debug!("backend closed stdin early");
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                return Err(Error::runtime(RuntimeErrorKind::Io, "stdin writer thread panicked"))
            }
        }
        self.log_exit(&output);
        Ok(output)
    }

    fn run_with_file(&self, program: &str) -> Result<CommandOutput> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("jsrelay").suffix(".js");
        let mut file = match self.temp_dir {
            Some(ref dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(program.as_bytes())?;
        file.flush()?;

        let mut command = self.command(Some(file.path()));
        command.stdin(Stdio::null());
        let child = self.spawn(command)?;
        let output = CommandOutput::from_output(child.wait_with_output()?);
        self.log_exit(&output);
        // `file` lives until here, so the engine could always read it
        drop(file);
        Ok(output)
    }

    fn log_exit(&self, output: &CommandOutput) {
        tracing::debug!(
            program = %self.template.program.display(),
            code = ?output.code,
            signal = ?output.signal,
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "backend exited"
        );
    }
}
