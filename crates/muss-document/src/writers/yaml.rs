//! Writer for the two-level YAML subset.

use crate::document::{Document, FieldValue, RAW_CONTENT_KEY, SectionBody, is_bullet_line};
use std::borrow::Cow;
use std::fmt::Write;

const FIELD_INDENT: &str = "  ";
const ITEM_INDENT: &str = "    ";
const EMPTY_SCALAR: &str = "\"\"";

pub fn write(document: &Document) -> String {
    let mut out = String::new();

    for (key, value) in &document.frontmatter {
        let _ = writeln!(out, "{}: {}", yaml_key(key), inline_scalar(value));
    }

    for (index, (name, body)) in document.sections.iter().enumerate() {
        if index > 0 || !document.frontmatter.is_empty() {
            out.push('\n');
        }
        let _ = writeln!(out, "{}:", yaml_key(name));
        match body {
            SectionBody::Raw(text) => write_block(&mut out, RAW_CONTENT_KEY, text),
            SectionBody::Fields(fields) => {
                for (field, value) in fields {
                    write_field(&mut out, field, value);
                }
            }
        }
    }
    out
}

fn write_field(out: &mut String, name: &str, value: &FieldValue) {
    let key = yaml_key(name);
    match value {
        FieldValue::Scalar(text) if text.contains('\n') => write_block(out, &key, text),
        FieldValue::Scalar(text) => {
            let _ = writeln!(out, "{}{}: {}", FIELD_INDENT, key, inline_scalar(text));
        }
        FieldValue::Null => {
            let _ = writeln!(out, "{}{}: null", FIELD_INDENT, key);
        }
        FieldValue::List(items) => {
            let _ = writeln!(out, "{}{}:", FIELD_INDENT, key);
            for item in items {
                let _ = writeln!(out, "{}- {}", ITEM_INDENT, item);
            }
        }
    }
}

/// A literal block scalar; lines are re-indented, never re-wrapped.
fn write_block(out: &mut String, name: &str, text: &str) {
    let _ = writeln!(out, "{}{}: |", FIELD_INDENT, name);
    for line in text.trim_end().lines() {
        let line = line.trim_end();
        if line.is_empty() {
            out.push('\n');
        } else {
            let _ = writeln!(out, "{}{}", ITEM_INDENT, line);
        }
    }
}

/// Names that would split early, lose padding or read as a list item are
/// written as JSON strings.
fn yaml_key(name: &str) -> Cow<'_, str> {
    let needs_quotes = name.contains(':')
        || name.starts_with('"')
        || name.trim() != name
        || is_bullet_line(name);
    if needs_quotes {
        Cow::Owned(serde_json::Value::from(name).to_string())
    } else {
        Cow::Borrowed(name)
    }
}

/// An empty value would read back as a section or list opener.
fn inline_scalar(value: &str) -> &str {
    if value.trim().is_empty() { EMPTY_SCALAR } else { value }
}
