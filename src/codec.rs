//! Value codec
//!
//! Encodes native values as JavaScript literals (for `call` arguments) and decodes
//! the result envelope a wrapped program prints on its own stdout line:
//!
//! ```text
//! ["ok"]                 no value (undefined)
//! ["ok", <json>]         a value
//! ["err", <message>, <stack|null>]
//! ["missing"]            `call` target is not a function
//! ```
//!
//! The envelope line starts with a per-run [`ResultMarker`]; every other line on
//! stdout belongs to the script and is ignored.
//!
//! Both directions keep the wire ASCII: every non-ASCII code unit travels as a
//! `\uXXXX` escape, so nothing depends on the backend's stdout encoding.

use crate::value::Value;
use std::fmt::Write;

/// Sentinel line for "no value"
pub const NO_VALUE: &str = r#"["ok"]"#;

/// Start of every result marker
pub const MARKER_PREFIX: &str = "#jsrelay-";

/// Per-run tag printed in front of the envelope line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultMarker(String);

impl ResultMarker {
    /// A fresh random marker
    pub fn new() -> Self {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        Self(format!("{}{:016x}#", MARKER_PREFIX, rng.gen::<u64>()))
    }

    /// Recover the marker a wrapped program was built with
    pub fn find_in(program: &str) -> Option<Self> {
        let start = program.rfind(MARKER_PREFIX)? + MARKER_PREFIX.len();
        let id = program[start..].split('#').next()?;
        if id.len() != 16 || !id.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        Some(Self(format!("{}{}#", MARKER_PREFIX, id)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `envelope` as a wrapped program prints it
    pub fn line(&self, envelope: &str) -> String {
        format!("{}{}\n", self.0, envelope)
    }

    fn envelope_in<'a>(&self, line: &'a str) -> Option<&'a str> {
        line.rfind(self.0.as_str()).map(|at| &line[at + self.0.len()..])
    }

    /// Whether `line` carries an envelope
    pub fn marks(&self, line: &str) -> bool {
        line.contains(self.0.as_str())
    }
}

impl Default for ResultMarker {
    fn default() -> Self {
        Self::new()
    }
}

/// A decoded result envelope
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// The program produced a value (possibly `Null`)
    Ok(Value),
    /// The program threw
    Err {
        message: String,
        stack: Option<String>,
    },
    /// `call` named something that is not a function
    UndefinedFunction,
    /// No envelope line was found on stdout
    Missing,
}

/// Encode a native value as a JavaScript literal
pub fn encode(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

/// Encode a string as a double-quoted JavaScript string literal
pub fn encode_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    write_str(&mut out, s);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Integer(n) => {
            let _ = write!(out, "{}", n);
        }
        Value::Float(n) => write_float(out, *n),
        Value::String(s) => write_str(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_str(out, key);
                out.push(':');
                write_value(out, item);
            }
            out.push('}');
        }
    }
}

fn write_float(out: &mut String, n: f64) {
    if n.is_nan() {
        out.push_str("NaN");
    } else if n.is_infinite() {
        out.push_str(if n > 0.0 { "Infinity" } else { "-Infinity" });
    } else if n == n.trunc() && n.abs() < 1e21 {
        // JS prints integral doubles without a fraction
        let _ = write!(out, "{}", n as i128);
    } else {
        let _ = write!(out, "{:?}", n);
    }
}

fn write_str(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ' '..='~' => out.push(ch),
            _ => {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    let _ = write!(out, "\\u{:04x}", unit);
                }
            }
        }
    }
    out.push('"');
}

/// Decode the envelope from a backend's stdout.
///
/// Only the last line carrying `marker` is considered, so anything the script
/// printed (e.g. `console.log`, before or after the result) is ignored. A marked
/// line that is not a valid envelope decodes to `Ok(Null)`.
pub fn decode(stdout: &str, marker: &ResultMarker) -> Envelope {
    let line = match stdout.lines().rev().find_map(|l| marker.envelope_in(l)) {
        Some(line) => line.trim(),
        None => return Envelope::Missing,
    };
    if line == NO_VALUE {
        return Envelope::Ok(Value::Null);
    }

    let parsed: serde_json::Value = match serde_json::from_str(line) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::warn!(%err, "result line is not valid JSON; treating as no value");
            return Envelope::Ok(Value::Null);
        }
    };

    let items = match parsed.as_array() {
        Some(items) => items,
        None => return Envelope::Ok(Value::Null),
    };
    match items.first().and_then(|tag| tag.as_str()) {
        Some("missing") => Envelope::UndefinedFunction,
        Some("ok") => Envelope::Ok(items.get(1).map(Value::from).unwrap_or(Value::Null)),
        Some("err") => Envelope::Err {
            message: match items.get(1) {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            },
            stack: items.get(2).and_then(|s| s.as_str()).map(str::to_string),
        },
        _ => Envelope::Ok(Value::Null),
    }
}
