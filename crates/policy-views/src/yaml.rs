//! Canonical YAML emitter
//!
//! Renders a JSON value as block-style YAML with a fixed indent and no line
//! wrapping. Nested collections under a sequence item open on the dash line
//! (`-   key: value`), so every nesting level sits on a multiple of the
//! indent. Scalars are quoted by `serde_yaml`; strings it would spread over
//! several lines are written as double-quoted single-line scalars instead.
//!
//! Parsing goes through `serde_yaml` directly.

use crate::error::{ParseError, SerializeError};
use serde_json::{Map, Value};

/// Render a value as YAML
pub fn to_string(value: &Value, indent: usize) -> Result<String, SerializeError> {
    let indent = indent.max(2);
    let mut out = String::new();
    match value {
        Value::Object(map) if !map.is_empty() => write_mapping(&mut out, map, 0, indent)?,
        Value::Array(items) if !items.is_empty() => write_sequence(&mut out, items, 0, indent)?,
        other => {
            out.push_str(&inline(other)?);
            out.push('\n');
        }
    }
    Ok(out)
}

/// Parse YAML into a JSON value
pub fn from_str(input: &str) -> Result<Value, ParseError> {
    serde_yaml::from_str(input).map_err(ParseError::yaml)
}

fn write_mapping(
    out: &mut String,
    map: &Map<String, Value>,
    level: usize,
    indent: usize,
) -> Result<(), SerializeError> {
    for (key, value) in map {
        pad(out, level);
        out.push_str(&string_scalar(key)?);
        out.push(':');
        match value {
            Value::Object(nested) if !nested.is_empty() => {
                out.push('\n');
                write_mapping(out, nested, level + indent, indent)?;
            }
            Value::Array(items) if !items.is_empty() => {
                out.push('\n');
                write_sequence(out, items, level + indent, indent)?;
            }
            other => {
                out.push(' ');
                out.push_str(&inline(other)?);
                out.push('\n');
            }
        }
    }
    Ok(())
}

fn write_sequence(
    out: &mut String,
    items: &[Value],
    level: usize,
    indent: usize,
) -> Result<(), SerializeError> {
    for item in items {
        let mut body = String::new();
        match item {
            Value::Object(nested) if !nested.is_empty() => {
                write_mapping(&mut body, nested, level + indent, indent)?;
            }
            Value::Array(nested) if !nested.is_empty() => {
                write_sequence(&mut body, nested, level + indent, indent)?;
            }
            other => {
                pad(out, level);
                out.push_str("- ");
                out.push_str(&inline(other)?);
                out.push('\n');
                continue;
            }
        }
        // First line of the body carries the dash in place of its padding
        pad(out, level);
        out.push('-');
        pad(out, indent - 1);
        out.push_str(&body[level + indent..]);
    }
    Ok(())
}

fn inline(value: &Value) -> Result<String, SerializeError> {
    Ok(match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => string_scalar(s)?,
        Value::Array(_) => "[]".to_string(),
        Value::Object(_) => "{}".to_string(),
    })
}

fn string_scalar(s: &str) -> Result<String, SerializeError> {
    let rendered = serde_yaml::to_string(s)?;
    let rendered = rendered.strip_suffix('\n').unwrap_or(&rendered);
    if rendered.contains('\n') || rendered.starts_with('|') || rendered.starts_with('>') {
        return Ok(serde_json::to_string(s)?);
    }
    Ok(rendered.to_string())
}

fn pad(out: &mut String, width: usize) {
    out.extend(std::iter::repeat(' ').take(width));
}
