//! JSON reader.
//!
//! A strict decode followed by a shape check. The expected shape is exactly
//! what the JSON writer produces:
//!
//! ```json
//! {"frontmatter": {"mode": "archive"}, "sections": {"NAME": {"Field": "value"}}}
//! ```

use super::ParseOutcome;
use crate::document::{Document, FieldValue, RAW_CONTENT_KEY, SectionBody};
use crate::error::{ParseError, Result};
use indexmap::IndexMap;
use serde_json::{Map, Value};

pub fn read(content: &str) -> Result<ParseOutcome> {
    let value: Value = serde_json::from_str(content).map_err(|e| syntax_error(content, &e))?;

    let Value::Object(root) = value else {
        return Err(structure("root must be an object"));
    };

    let mut document = Document::new();
    for (key, value) in root {
        match key.as_str() {
            "frontmatter" => read_frontmatter(value, &mut document)?,
            "sections" => read_sections(value, &mut document)?,
            other => tracing::debug!(key = other, "ignoring unknown top-level key"),
        }
    }

    Ok(ParseOutcome {
        document,
        skipped: Vec::new(),
    })
}

fn read_frontmatter(value: Value, document: &mut Document) -> Result<()> {
    match value {
        Value::Null => Ok(()),
        Value::Object(entries) => {
            for (key, value) in entries {
                let value = scalar_text(&value)
                    .ok_or_else(|| structure(format!("frontmatter '{}' must be a scalar", key)))?;
                document.set_frontmatter(key, value);
            }
            Ok(())
        }
        _ => Err(structure("'frontmatter' must be an object")),
    }
}

fn read_sections(value: Value, document: &mut Document) -> Result<()> {
    let Value::Object(sections) = value else {
        return Err(structure("'sections' must be an object"));
    };
    for (name, body) in sections {
        let Value::Object(body) = body else {
            return Err(structure(format!("section '{}' must be an object", name)));
        };
        let body = read_section(&name, body)?;
        document.push_section(name, body);
    }
    Ok(())
}

fn read_section(name: &str, body: Map<String, Value>) -> Result<SectionBody> {
    if let Some(raw) = body.get(RAW_CONTENT_KEY) {
        if body.len() > 1 {
            return Err(structure(format!(
                "section '{}' mixes '{}' with fields",
                name, RAW_CONTENT_KEY
            )));
        }
        let Some(text) = raw.as_str() else {
            return Err(structure(format!(
                "'{}' of section '{}' must be a string",
                RAW_CONTENT_KEY, name
            )));
        };
        return Ok(SectionBody::Raw(text.to_string()));
    }

    let mut fields = IndexMap::with_capacity(body.len());
    for (field, value) in body {
        let value = match value {
            Value::Null => FieldValue::Null,
            Value::Array(items) => {
                let items = items
                    .iter()
                    .map(|item| {
                        scalar_text(item).ok_or_else(|| {
                            structure(format!(
                                "items of '{}.{}' must be scalars",
                                name, field
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                FieldValue::List(items)
            }
            other => FieldValue::Scalar(scalar_text(&other).ok_or_else(|| {
                structure(format!("field '{}.{}' must be a scalar or a list", name, field))
            })?),
        };
        fields.insert(field, value);
    }
    Ok(SectionBody::Fields(fields))
}

/// Text of a JSON scalar; numbers and booleans keep their JSON spelling.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn structure(message: impl Into<String>) -> ParseError {
    ParseError::InvalidStructure(message.into())
}

fn syntax_error(content: &str, err: &serde_json::Error) -> ParseError {
    let line = err.line();
    let column = err.column();
    ParseError::InvalidJson {
        message: err.to_string(),
        line,
        column,
        offset: byte_offset(content, line, column),
    }
}

/// Convert serde_json's 1-based line/column into a byte offset.
fn byte_offset(content: &str, line: usize, column: usize) -> usize {
    let line_start: usize = content
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(content.len())
}
