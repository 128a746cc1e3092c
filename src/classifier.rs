//! Error classifier
//!
//! Maps one backend run (envelope, diagnostics, exit status) to exactly one of a
//! value, a [`ProgramError`](Error::ProgramError) or a
//! [`RuntimeError`](Error::RuntimeError).

use crate::backend::CommandOutput;
use crate::codec::{self, Envelope, ResultMarker};
use crate::error::{Error, Result, RuntimeErrorKind, StackTrace};
use crate::value::Value;
use regex::Regex;
use std::sync::LazyLock;

/// Known shapes of engine diagnostic output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The program text did not parse
    Syntax { message: String, stack: String },
    /// An exception escaped the program (e.g. thrown from a timer)
    Thrown { message: String, stack: String },
    /// Nothing recognisable
    Unrecognized(String),
}

// `TypeError: msg`, `Uncaught Error: msg`, `Exception: SyntaxError: msg`,
// `/tmp/x.js:3: SyntaxError: msg`, `error: Uncaught SyntaxError: msg` (deno)
static ERROR_LINE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?:\S+:\d+: )?(?:error: )?(?:Uncaught |Exception: )*",
        r"((?:[A-Z][\w$]*)?Error|Exception)(?::\s*(.*))?$"
    ))
    .ok()
});

// d8 and SpiderMonkey print non-Error throws as `Uncaught <value>`
static UNCAUGHT_VALUE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(?:error: )?(?:uncaught exception|Uncaught):?\s+(.*)$").ok());

/// node's hint line printed after a thrown non-Error value
const NODE_THROWN_VALUE_HINT: &str = "node --trace-uncaught";

impl Diagnostic {
    /// Recognise the diagnostic shape in `text`
    pub fn recognize(text: &str) -> Self {
        let lines: Vec<&str> = text.lines().collect();

        if let Some(re) = ERROR_LINE.as_ref() {
            for (i, line) in lines.iter().enumerate() {
                if let Some(caps) = re.captures(line.trim_end()) {
                    let name = &caps[1];
                    let detail = caps.get(2).map(|m| m.as_str()).unwrap_or("");
                    let stack = trailing_stack(&lines[i..]);
                    return if name == "SyntaxError" {
                        Diagnostic::Syntax {
                            message: detail.to_string(),
                            stack,
                        }
                    } else {
                        let message = if detail.is_empty() {
                            name.to_string()
                        } else {
                            format!("{}: {}", name, detail)
                        };
                        Diagnostic::Thrown { message, stack }
                    };
                }
            }
        }

        if let Some(i) = lines.iter().position(|l| l.contains(NODE_THROWN_VALUE_HINT)) {
            if let Some(value) = lines[..i].iter().rev().find(|l| !l.trim().is_empty()) {
                return Diagnostic::Thrown {
                    message: value.trim().to_string(),
                    stack: trailing_stack(&lines),
                };
            }
        }

        if let Some(re) = UNCAUGHT_VALUE.as_ref() {
            for (i, line) in lines.iter().enumerate() {
                if let Some(caps) = re.captures(line.trim_end()) {
                    return Diagnostic::Thrown {
                        message: caps[1].to_string(),
                        stack: trailing_stack(&lines[i + 1..]),
                    };
                }
            }
        }

        Diagnostic::Unrecognized(text.trim().to_string())
    }

    /// Convert to the error callers see
    pub fn into_error(self, output: &CommandOutput) -> Error {
        match self {
            Diagnostic::Syntax { message, stack } => {
                Error::syntax_error(message, StackTrace::from_text(stack))
            }
            Diagnostic::Thrown { message, stack } => {
                Error::program_error(message, StackTrace::from_text(stack))
            }
            Diagnostic::Unrecognized(text) => {
                let status = match output.code {
                    Some(code) => format!("exit status {}", code),
                    None => "unknown exit status".to_string(),
                };
                let message = if text.is_empty() {
                    format!("backend failed with {}", status)
                } else {
                    format!("backend failed with {}: {}", status, first_line(&text))
                };
                Error::RuntimeError {
                    kind: RuntimeErrorKind::Backend,
                    message,
                    stack_trace: StackTrace::from_text(text),
                }
            }
        }
    }
}

/// Lines after the error line, minus node's version footer
fn trailing_stack(lines: &[&str]) -> String {
    lines
        .iter()
        .skip(1)
        .filter(|l| !l.starts_with("Node.js v"))
        .copied()
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

/// Classify one backend run whose result line carries `marker`
pub fn classify(output: &CommandOutput, marker: &ResultMarker) -> Result<Value> {
    if let Some(signal) = output.signal {
        tracing::debug!(signal, "backend killed");
        return Err(Error::runtime(
            RuntimeErrorKind::Killed,
            format!("backend terminated by signal {}", signal),
        ));
    }

    let stdout = output.stdout_string();
    match codec::decode(&stdout, marker) {
        Envelope::Err { message, stack } => {
            tracing::trace!(%message, "program threw");
            return Err(Error::program_error(
                message,
                stack.map(StackTrace::from_text).unwrap_or_default(),
            ));
        }
        Envelope::UndefinedFunction => {
            return Err(Error::runtime(
                RuntimeErrorKind::UndefinedFunction,
                "function is not defined",
            ));
        }
        Envelope::Ok(value) if output.success => return Ok(value),
        Envelope::Missing if output.success => return Ok(Value::Null),
        Envelope::Ok(_) | Envelope::Missing => {}
    }

    // Some engines (jsc) report uncaught exceptions on stdout
    let stderr = output.stderr_string();
    let diagnostic = match Diagnostic::recognize(&stderr) {
        Diagnostic::Unrecognized(_) if stderr.trim().is_empty() => {
            let script_output: Vec<&str> = stdout.lines().filter(|l| !marker.marks(l)).collect();
            Diagnostic::recognize(&script_output.join("\n"))
        }
        diagnostic => diagnostic,
    };
    tracing::debug!(?diagnostic, code = ?output.code, "backend failed");
    Err(diagnostic.into_error(output))
}
