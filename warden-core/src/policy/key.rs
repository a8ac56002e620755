//! Policy keys and verdicts.
//!
//! A policy key is either a bare tool name (`write_file`) or a tool name
//! pinned to one exact argument combination
//! (`write_file:{"content": "x", "filepath": "a.txt"}`).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io;

/// The policy decision for a single tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Execute without asking.
    Allow,
    /// Never execute.
    Deny,
    /// Execute only after a human approves the call.
    #[default]
    Ask,
}

impl Verdict {
    /// Lowercase name as stored in the policy file.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Allow => "allow",
            Verdict::Deny => "deny",
            Verdict::Ask => "ask",
        }
    }

    /// Parse a verdict name (case-insensitive, surrounding whitespace ignored).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "allow" => Some(Verdict::Allow),
            "deny" => Some(Verdict::Deny),
            "ask" => Some(Verdict::Ask),
            _ => None,
        }
    }

    /// `ask` and `deny` both need a human before anything runs.
    pub fn requires_approval(&self) -> bool {
        matches!(self, Verdict::Ask | Verdict::Deny)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Verdict::parse(s).ok_or_else(|| format!("unknown verdict '{}' (expected allow, deny or ask)", s))
    }
}

/// Separates the tool name from its canonical arguments in a composite key.
const COMPOSITE_SEP: &str = ":{";

/// Key under which a verdict is stored.
///
/// # Example
///
/// ```rust
/// use warden_core::policy::PolicyKey;
///
/// let general = PolicyKey::tool("write_file");
/// assert_eq!(general.as_str(), "write_file");
///
/// let pinned = PolicyKey::with_arguments("write_file", &serde_json::json!({"filepath": "a"}));
/// assert_eq!(pinned.as_str(), r#"write_file:{"filepath": "a"}"#);
/// assert_eq!(pinned.tool_name(), "write_file");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PolicyKey(String);

impl PolicyKey {
    /// Key covering every invocation of a tool.
    pub fn tool(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Key covering exactly one argument combination of a tool.
    pub fn with_arguments(name: &str, arguments: &Value) -> Self {
        Self(format!("{}:{}", name, canonicalize(arguments)))
    }

    /// The raw key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this key pins specific arguments.
    pub fn is_composite(&self) -> bool {
        self.split().is_some()
    }

    /// The tool part of the key. Tool names may themselves contain `:`.
    pub fn tool_name(&self) -> &str {
        self.split().map(|(tool, _)| tool).unwrap_or(&self.0)
    }

    fn split(&self) -> Option<(&str, &str)> {
        let at = self.0.find(COMPOSITE_SEP)?;
        Some((&self.0[..at], &self.0[at + 1..]))
    }
}

impl std::fmt::Display for PolicyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PolicyKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PolicyKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Serialize arguments deterministically.
///
/// Object keys are sorted at every depth, the output uses `", "` and `": "`
/// separators, and characters outside printable ASCII are written as `\uXXXX` escapes
/// (surrogate pairs above U+FFFF). Logically equal arguments always produce
/// the same string regardless of construction order, and the text matches
/// policy files written by Python's `json.dumps(..., sort_keys=True)`.
pub fn canonicalize(arguments: &Value) -> String {
    let sorted = canonicalize_json(arguments);
    let mut buf = Vec::new();
    let written = {
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, CanonicalFormatter);
        sorted.serialize(&mut ser)
    };
    match written {
        Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
        Err(_) => sorted.to_string(),
    }
}

/// Convert a JSON value to canonical form with sorted keys.
fn canonicalize_json(value: &Value) -> Value {
    use std::collections::BTreeMap;

    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<_, _> = map
                .iter()
                .map(|(k, v)| (k.clone(), canonicalize_json(v)))
                .collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(arr) => Value::Array(arr.iter().map(canonicalize_json).collect()),
        other => other.clone(),
    }
}

/// Single-line JSON with a space after each separator.
struct CanonicalFormatter;

impl serde_json::ser::Formatter for CanonicalFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut rest = fragment;
        while let Some(at) = rest.find(|c: char| !matches!(c, ' '..='~')) {
            writer.write_all(rest[..at].as_bytes())?;
            let Some(c) = rest[at..].chars().next() else {
                break;
            };
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            rest = &rest[at + c.len_utf8()..];
        }
        writer.write_all(rest.as_bytes())
    }
}
