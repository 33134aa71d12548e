//! Data models for preference entries.
//!
//! This module defines the core data structures:
//! - `PrefValue` - Tagged union over the eight supported value kinds
//! - `PrefKind` - The kind tag by itself, used by the CLI `--type` flag
//! - `PrefEntry` - A (key, value) pair as shown in the editor
//! - `PreferenceFile` - The map + ordered-list store (in [`store`])

pub mod store;

pub use store::PreferenceFile;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A typed preference value.
///
/// The kind is part of the value's identity: an `Int` never turns into a
/// `Long` through a decode/encode round trip, and vice versa. Variant names
/// mirror the XML element names of the wire format.
#[derive(Debug, Clone, PartialEq)]
pub enum PrefValue {
    String(String),
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<u8>),
    StringSet(BTreeSet<String>),
}

impl PrefValue {
    /// The kind tag for this value.
    pub fn kind(&self) -> PrefKind {
        match self {
            PrefValue::String(_) => PrefKind::String,
            PrefValue::Boolean(_) => PrefKind::Boolean,
            PrefValue::Int(_) => PrefKind::Int,
            PrefValue::Long(_) => PrefKind::Long,
            PrefValue::Float(_) => PrefKind::Float,
            PrefValue::Double(_) => PrefKind::Double,
            PrefValue::ByteArray(_) => PrefKind::ByteArray,
            PrefValue::StringSet(_) => PrefKind::StringSet,
        }
    }

    /// Project the value into JSON for machine-readable output.
    ///
    /// Byte arrays become hex strings and sets become sorted arrays, so the
    /// projection is stable across runs.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            PrefValue::String(s) => serde_json::Value::from(s.as_str()),
            PrefValue::Boolean(b) => serde_json::Value::from(*b),
            PrefValue::Int(i) => serde_json::Value::from(*i),
            PrefValue::Long(l) => serde_json::Value::from(*l),
            PrefValue::Float(f) => serde_json::Value::from(*f),
            PrefValue::Double(d) => serde_json::Value::from(*d),
            PrefValue::ByteArray(bytes) => serde_json::Value::from(to_hex(bytes)),
            PrefValue::StringSet(set) => {
                serde_json::Value::from(set.iter().cloned().collect::<Vec<_>>())
            }
        }
    }

    /// Parse a CLI-supplied raw string into a value of the given kind.
    ///
    /// Byte arrays are given as hex (`"0a1b"`), sets as comma-separated
    /// elements. Everything else uses the standard literal forms.
    pub fn parse(kind: PrefKind, raw: &str) -> Result<Self> {
        match kind {
            PrefKind::String => Ok(PrefValue::String(raw.to_string())),
            PrefKind::Boolean => match raw {
                "true" => Ok(PrefValue::Boolean(true)),
                "false" => Ok(PrefValue::Boolean(false)),
                _ => Err(Error::InvalidInput(format!(
                    "expected 'true' or 'false', got '{raw}'"
                ))),
            },
            PrefKind::Int => raw
                .parse::<i32>()
                .map(PrefValue::Int)
                .map_err(|e| Error::InvalidInput(format!("invalid int '{raw}': {e}"))),
            PrefKind::Long => raw
                .parse::<i64>()
                .map(PrefValue::Long)
                .map_err(|e| Error::InvalidInput(format!("invalid long '{raw}': {e}"))),
            PrefKind::Float => raw
                .parse::<f32>()
                .map(PrefValue::Float)
                .map_err(|e| Error::InvalidInput(format!("invalid float '{raw}': {e}"))),
            PrefKind::Double => raw
                .parse::<f64>()
                .map(PrefValue::Double)
                .map_err(|e| Error::InvalidInput(format!("invalid double '{raw}': {e}"))),
            PrefKind::ByteArray => from_hex(raw)
                .map(PrefValue::ByteArray)
                .ok_or_else(|| Error::InvalidInput(format!("invalid hex string '{raw}'"))),
            PrefKind::StringSet => {
                if raw.is_empty() {
                    return Ok(PrefValue::StringSet(BTreeSet::new()));
                }
                Ok(PrefValue::StringSet(
                    raw.split(',').map(|s| s.to_string()).collect(),
                ))
            }
        }
    }
}

impl fmt::Display for PrefValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefValue::String(s) => write!(f, "{}", s),
            PrefValue::Boolean(b) => write!(f, "{}", b),
            PrefValue::Int(i) => write!(f, "{}", i),
            PrefValue::Long(l) => write!(f, "{}", l),
            PrefValue::Float(v) => write!(f, "{:?}", v),
            PrefValue::Double(v) => write!(f, "{:?}", v),
            PrefValue::ByteArray(bytes) => write!(f, "{}", to_hex(bytes)),
            PrefValue::StringSet(set) => {
                let items: Vec<&str> = set.iter().map(|s| s.as_str()).collect();
                write!(f, "{{{}}}", items.join(", "))
            }
        }
    }
}

/// The kind of a preference value, without the payload.
///
/// String forms match the XML element names, which is also what the CLI
/// accepts for `--type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PrefKind {
    String,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    ByteArray,
    #[value(name = "set")]
    #[serde(rename = "set")]
    StringSet,
}

impl PrefKind {
    /// The XML element name for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            PrefKind::String => "string",
            PrefKind::Boolean => "boolean",
            PrefKind::Int => "int",
            PrefKind::Long => "long",
            PrefKind::Float => "float",
            PrefKind::Double => "double",
            PrefKind::ByteArray => "byte-array",
            PrefKind::StringSet => "set",
        }
    }
}

impl fmt::Display for PrefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single named preference as presented in the editor.
#[derive(Debug, Clone, PartialEq)]
pub struct PrefEntry {
    pub key: String,
    pub value: PrefValue,
}

impl PrefEntry {
    pub fn new(key: impl Into<String>, value: PrefValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// JSON projection used by `cat` and `get`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "key": self.key,
            "type": self.value.kind().as_str(),
            "value": self.value.to_json(),
        })
    }
}

/// Lowercase hex encoding, two digits per byte.
pub(crate) fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

/// Decode a hex string; `None` on odd length or non-hex digits.
pub(crate) fn from_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok())
        .collect()
}
