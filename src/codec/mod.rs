//! XML codec for typed preference maps.
//!
//! The wire format is the `<map>` document used by shared-preference files:
//!
//! ```xml
//! <?xml version='1.0' encoding='utf-8' standalone='yes' ?>
//! <map>
//!     <string name="device">tablet</string>
//!     <int name="launch_count" value="4" />
//!     <set name="tags">
//!         <string>beta</string>
//!     </set>
//! </map>
//! ```
//!
//! `decode` and `encode` are pure functions over a plain map; display order
//! is a store concern and never reaches this layer. Empty and
//! whitespace-only documents decode to an empty map by policy. Anything
//! else that does not conform decodes to a [`DecodeError`] - never to a
//! partially filled map.

use std::collections::{BTreeSet, HashMap};

use roxmltree::{Document, Node};

use crate::models::{from_hex, to_hex, PrefValue};

/// A payload that does not conform to the preference map format.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("XML syntax error: {0}")]
    Syntax(#[from] roxmltree::Error),

    #[error("unexpected root element <{0}>, expected <map>")]
    UnexpectedRoot(String),

    #[error("unsupported element <{0}> in preference map")]
    UnsupportedElement(String),

    #[error("stray text {0:?} in preference map")]
    UnexpectedText(String),

    #[error("element <{element}> is missing its '{attribute}' attribute")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },

    #[error("invalid {kind} value {value:?} for key {key:?}")]
    InvalidValue {
        kind: &'static str,
        key: String,
        value: String,
    },
}

/// Decode an XML payload into a map of typed values.
///
/// Empty or whitespace-only input yields an empty map. Duplicate keys keep
/// the last occurrence, matching the reader the consuming apps use.
pub fn decode(xml: &str) -> Result<HashMap<String, PrefValue>, DecodeError> {
    if xml.trim().is_empty() {
        return Ok(HashMap::new());
    }

    let doc = Document::parse(xml)?;
    let root = doc.root_element();
    if root.tag_name().name() != "map" {
        return Err(DecodeError::UnexpectedRoot(
            root.tag_name().name().to_string(),
        ));
    }

    let mut prefs = HashMap::new();
    for child in root.children() {
        if child.is_comment() || child.is_pi() {
            continue;
        }
        if child.is_text() {
            let text = child.text().unwrap_or_default();
            if !text.trim().is_empty() {
                return Err(DecodeError::UnexpectedText(text.trim().to_string()));
            }
            continue;
        }
        if child.is_element() {
            let (key, value) = decode_entry(child)?;
            prefs.insert(key, value);
        }
    }
    Ok(prefs)
}

/// Decode one named child of `<map>`.
fn decode_entry(node: Node) -> Result<(String, PrefValue), DecodeError> {
    let element = node.tag_name().name();
    let key = node
        .attribute("name")
        .ok_or_else(|| DecodeError::MissingAttribute {
            element: element.to_string(),
            attribute: "name",
        })?
        .to_string();

    let value = match element {
        "string" => PrefValue::String(text_content(node)),
        "boolean" => PrefValue::Boolean(parse_attr(node, &key, "boolean", |raw| match raw {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        })?),
        "int" => PrefValue::Int(parse_attr(node, &key, "int", |raw| raw.parse().ok())?),
        "long" => PrefValue::Long(parse_attr(node, &key, "long", |raw| raw.parse().ok())?),
        "float" => PrefValue::Float(parse_attr(node, &key, "float", |raw| raw.parse().ok())?),
        "double" => PrefValue::Double(parse_attr(node, &key, "double", |raw| raw.parse().ok())?),
        "byte-array" => PrefValue::ByteArray(decode_byte_array(node, &key)?),
        "set" => PrefValue::StringSet(decode_set(node)?),
        other => return Err(DecodeError::UnsupportedElement(other.to_string())),
    };
    Ok((key, value))
}

/// Parse the `value` attribute of a primitive element.
fn parse_attr<T>(
    node: Node,
    key: &str,
    kind: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, DecodeError> {
    let raw = node
        .attribute("value")
        .ok_or_else(|| DecodeError::MissingAttribute {
            element: node.tag_name().name().to_string(),
            attribute: "value",
        })?;
    parse(raw).ok_or_else(|| DecodeError::InvalidValue {
        kind,
        key: key.to_string(),
        value: raw.to_string(),
    })
}

/// Hex body plus a `num` length attribute, as the reference writer emits.
fn decode_byte_array(node: Node, key: &str) -> Result<Vec<u8>, DecodeError> {
    let text = text_content(node);
    let text = text.trim();
    let bytes = from_hex(text).ok_or_else(|| DecodeError::InvalidValue {
        kind: "byte-array",
        key: key.to_string(),
        value: text.to_string(),
    })?;

    let num = node
        .attribute("num")
        .ok_or_else(|| DecodeError::MissingAttribute {
            element: "byte-array".to_string(),
            attribute: "num",
        })?;
    let expected: usize = num.parse().map_err(|_| DecodeError::InvalidValue {
        kind: "byte-array",
        key: key.to_string(),
        value: num.to_string(),
    })?;
    if expected != bytes.len() {
        return Err(DecodeError::InvalidValue {
            kind: "byte-array",
            key: key.to_string(),
            value: format!("num={} but {} bytes of data", expected, bytes.len()),
        });
    }
    Ok(bytes)
}

/// `<set>` children are unnamed `<string>` elements.
fn decode_set(node: Node) -> Result<BTreeSet<String>, DecodeError> {
    let mut set = BTreeSet::new();
    for child in node.children() {
        if child.is_comment() || child.is_pi() {
            continue;
        }
        if child.is_text() {
            let text = child.text().unwrap_or_default();
            if !text.trim().is_empty() {
                return Err(DecodeError::UnexpectedText(text.trim().to_string()));
            }
            continue;
        }
        if child.is_element() {
            if child.tag_name().name() != "string" {
                return Err(DecodeError::UnsupportedElement(
                    child.tag_name().name().to_string(),
                ));
            }
            set.insert(text_content(child));
        }
    }
    Ok(set)
}

/// Concatenated text children of an element; empty elements yield "".
fn text_content(node: Node) -> String {
    node.children()
        .filter(|c| c.is_text())
        .filter_map(|c| c.text())
        .collect()
}

/// Encode a map of typed values to the XML payload format.
///
/// Keys are emitted in sorted order so equal maps always produce identical
/// documents. Encoding cannot fail for values this crate can represent.
pub fn encode(prefs: &HashMap<String, PrefValue>) -> String {
    let mut out = String::from("<?xml version='1.0' encoding='utf-8' standalone='yes' ?>\n");
    if prefs.is_empty() {
        out.push_str("<map />\n");
        return out;
    }

    let mut keys: Vec<&String> = prefs.keys().collect();
    keys.sort();

    out.push_str("<map>\n");
    for key in keys {
        encode_entry(&mut out, key, &prefs[key]);
    }
    out.push_str("</map>\n");
    out
}

fn encode_entry(out: &mut String, key: &str, value: &PrefValue) {
    let name = escape_attr(key);
    match value {
        PrefValue::String(s) => {
            out.push_str(&format!(
                "    <string name=\"{}\">{}</string>\n",
                name,
                escape_text(s)
            ));
        }
        PrefValue::Boolean(b) => {
            out.push_str(&format!("    <boolean name=\"{}\" value=\"{}\" />\n", name, b));
        }
        PrefValue::Int(i) => {
            out.push_str(&format!("    <int name=\"{}\" value=\"{}\" />\n", name, i));
        }
        PrefValue::Long(l) => {
            out.push_str(&format!("    <long name=\"{}\" value=\"{}\" />\n", name, l));
        }
        PrefValue::Float(v) => {
            out.push_str(&format!("    <float name=\"{}\" value=\"{:?}\" />\n", name, v));
        }
        PrefValue::Double(v) => {
            out.push_str(&format!(
                "    <double name=\"{}\" value=\"{:?}\" />\n",
                name, v
            ));
        }
        PrefValue::ByteArray(bytes) => {
            out.push_str(&format!(
                "    <byte-array name=\"{}\" num=\"{}\">{}</byte-array>\n",
                name,
                bytes.len(),
                to_hex(bytes)
            ));
        }
        PrefValue::StringSet(set) => {
            if set.is_empty() {
                out.push_str(&format!("    <set name=\"{}\" />\n", name));
            } else {
                out.push_str(&format!("    <set name=\"{}\">\n", name));
                for item in set {
                    out.push_str(&format!(
                        "        <string>{}</string>\n",
                        escape_text(item)
                    ));
                }
                out.push_str("    </set>\n");
            }
        }
    }
}

/// Escape XML special characters in text content.
fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape XML special characters in an attribute value.
fn escape_attr(text: &str) -> String {
    escape_text(text).replace('"', "&quot;")
}
