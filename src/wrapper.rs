//! Script wrapper
//!
//! Turns a fragment into a complete program whose result envelope (see
//! [`crate::codec`]) is printed on a line tagged with the run's
//! [`ResultMarker`]. The fragment runs as the body of a sloppy-mode function
//! called without a receiver, so `this` is the global object and undeclared
//! assignments create globals.
//!
//! Backends that evaluate their input as an ES module would force strict mode on
//! all of that, so for them the whole program is handed to an indirect `eval`,
//! which runs it as a classic global script.

use crate::backend::Capabilities;
use crate::codec::{self, ResultMarker};
use crate::value::Value;

/// How the fragment's value is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The body's `return` value is the result
    Return,
    /// The value passed to the injected `callback` is the result
    Callback,
}

/// Builds program text for one backend
#[derive(Debug, Clone, Copy)]
pub struct ScriptWrapper {
    completion: Completion,
    process_stdout: bool,
    module_input: bool,
}

impl ScriptWrapper {
    pub fn new(completion: Completion, capabilities: Capabilities) -> Self {
        Self {
            completion,
            process_stdout: capabilities.contains(Capabilities::PROCESS_STDOUT),
            module_input: capabilities.contains(Capabilities::MODULE_INPUT),
        }
    }

    pub fn completion(&self) -> Completion {
        self.completion
    }

    /// Wrap `body`, with `prelude` in scope, into a complete program that tags
    /// its result line with `marker`
    pub fn wrap(&self, prelude: &str, body: &str, marker: &ResultMarker) -> String {
        let source = if prelude.is_empty() {
            body.to_string()
        } else {
            format!("{}\n{}", prelude, body)
        };
        let runner = match self.completion {
            Completion::Return => SYNC_RUNNER,
            Completion::Callback => ASYNC_RUNNER,
        };
        let output = if self.process_stdout {
            PROCESS_STDOUT_PRINT
        } else {
            GLOBAL_PRINT
        };
        let program = format!(
            concat!(
                "(function(__print, __encode, __missing, __marker) {{\n{}\n{}\n}})",
                "(\n{},\n{},\n{{}},\n{}\n);\n"
            ),
            MARKED_OUTPUT,
            runner.replace(SOURCE_MARKER, &source),
            output,
            ENCODE,
            codec::encode_str(marker.as_str())
        );
        if self.module_input {
            format!("(0, eval)({});\n", codec::encode_str(&program))
        } else {
            program
        }
    }
}

/// Body for `exec`: the statements themselves
pub fn exec_body(source: &str) -> String {
    source.to_string()
}

/// Body for `eval`: the expression's value, or nothing for a blank expression
pub fn eval_body(expression: &str) -> String {
    if expression.trim().is_empty() {
        return String::new();
    }
    // direct eval keeps `this` and the prelude's locals in scope
    format!("return eval({})", codec::encode_str(&format!("({}\n)", expression)))
}

/// Body for `call`: invoke `name` with encoded arguments, or report it missing
pub fn call_body(name: &str, args: &[Value]) -> String {
    let args: Vec<String> = args.iter().map(codec::encode).collect();
    format!(
        "if (typeof {name} !== 'function') return __missing;\nreturn {name}({});",
        args.join(", "),
        name = name
    )
}

/// Whether `name` is a dotted path of identifiers
pub fn is_function_path(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        })
}

const SOURCE_MARKER: &str = "__JSRELAY_SOURCE__";

const MARKED_OUTPUT: &str = "  var __out = function(line) { __print(__marker + line); };";

const SYNC_RUNNER: &str = r#"  var __program = function() {
__JSRELAY_SOURCE__
  };
  try {
    var result = __program();
    if (result === __missing) {
      __out('["missing"]');
    } else if (typeof result === 'undefined') {
      __out('["ok"]');
    } else {
      try {
        __out(__encode(['ok', result]));
      } catch (err) {
        __out(__encode(['err', '' + err, err && err.stack]));
      }
    }
  } catch (err) {
    __out(__encode(['err', '' + err, err && err.stack]));
  }"#;

// A long interval keeps the engine alive until `callback` runs; only the first
// call counts.
const ASYNC_RUNNER: &str = r#"  var __done = false;
  var __keepalive = setInterval(function() {}, 2147483647);
  var __finish = function(line) {
    if (__done) return;
    __done = true;
    clearInterval(__keepalive);
    __out(line);
  };
  var __callback = function(result) {
    var line;
    try {
      line = typeof result === 'undefined' ? '["ok"]' : __encode(['ok', result]);
    } catch (err) {
      line = __encode(['err', '' + err, err && err.stack]);
    }
    __finish(line);
  };
  var __program = function(callback) {
__JSRELAY_SOURCE__
  };
  try {
    if (__program(__callback) === __missing) {
      __finish('["missing"]');
    }
  } catch (err) {
    __finish(__encode(['err', '' + err, err && err.stack]));
  }"#;

const PROCESS_STDOUT_PRINT: &str = r#"function(line) { process.stdout.write(line + '\n'); }"#;

const GLOBAL_PRINT: &str =
    r#"typeof print === 'function' ? print : function(line) { console.log(line); }"#;

// JSON.stringify, then every non-ASCII code unit as a \u escape
const ENCODE: &str = r#"function(value) {
  return JSON.stringify(value).replace(/[\u0080-\uffff]/g, function(ch) {
    return '\\u' + ('0000' + ch.charCodeAt(0).toString(16)).slice(-4);
  });
}"#;
