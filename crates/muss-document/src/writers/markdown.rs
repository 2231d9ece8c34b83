//! Markdown writer.
//!
//! Emits exactly the shape the Markdown reader recognizes, so that
//! `read(write(doc))` gives back `doc` for every fully structured document.

use crate::document::{Document, FieldValue, SectionBody, UNPARSED_FIELD};
use indexmap::IndexMap;
use std::fmt::Write;

const SECTION_SEPARATOR: &str = "\n---\n\n";

pub fn write(document: &Document) -> String {
    let mut out = String::new();

    if !document.frontmatter.is_empty() {
        out.push_str("---\n");
        for (key, value) in &document.frontmatter {
            push_key_value(&mut out, key, value);
        }
        out.push_str("---\n\n");
    }

    let blocks: Vec<String> = document
        .sections
        .iter()
        .map(|(name, body)| write_section(name, body))
        .collect();
    out.push_str(&blocks.join(SECTION_SEPARATOR));
    out
}

fn push_key_value(out: &mut String, key: &str, value: &str) {
    if value.is_empty() {
        let _ = writeln!(out, "{}:", key);
    } else {
        let _ = writeln!(out, "{}: {}", key, value);
    }
}

fn write_section(name: &str, body: &SectionBody) -> String {
    let mut out = format!("### {}\n", name);
    let rendered = match body {
        SectionBody::Raw(text) => line_terminated(text.trim()),
        SectionBody::Fields(fields) => write_fields(fields),
    };
    if !rendered.is_empty() {
        out.push('\n');
        out.push_str(&rendered);
    }
    out
}

fn write_fields(fields: &IndexMap<String, FieldValue>) -> String {
    let mut blocks: Vec<String> = fields
        .iter()
        .filter(|(name, _)| name.as_str() != UNPARSED_FIELD)
        .map(|(name, value)| write_field(name, value))
        .collect();

    // Catch-all prose goes back in as plain paragraphs after the fields
    if let Some(FieldValue::Scalar(text)) = fields.get(UNPARSED_FIELD) {
        if !text.trim().is_empty() {
            blocks.push(line_terminated(text.trim()));
        }
    }

    blocks.join("\n")
}

fn write_field(name: &str, value: &FieldValue) -> String {
    match value {
        FieldValue::Scalar(text) if !text.trim().is_empty() => {
            line_terminated(&format!("**{}**: {}", name, text.trim()))
        }
        FieldValue::Scalar(_) | FieldValue::Null => format!("**{}**:\n", name),
        FieldValue::List(items) => {
            let mut out = format!("**{}**:\n", name);
            for item in items {
                let _ = writeln!(out, "- {}", item);
            }
            out
        }
    }
}

fn line_terminated(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 1);
    for line in text.lines() {
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frontmatter_only() {
        let mut doc = Document::new();
        doc.set_frontmatter("mode", "archive");
        assert_eq!(write(&doc), "---\nmode: archive\n---\n\n");
    }

    #[test]
    fn test_empty_document_renders_nothing() {
        assert_eq!(write(&Document::new()), "");
    }

    #[test]
    fn test_sections_and_fields() {
        let mut doc = Document::new();
        doc.set_frontmatter("mode", "checkpoint");
        doc.set_frontmatter("invoker", "");
        doc.push_section(
            "HEADER",
            [
                ("Thread_Archetype", FieldValue::from("Debugging")),
                ("Focus_Domains", FieldValue::from(vec!["parsing", "validation"])),
                ("Invoker", FieldValue::Null),
            ]
            .into_iter()
            .collect(),
        );
        doc.push_section("EMPTY", SectionBody::empty());
        doc.push_section("INVOCATION LOCK", SectionBody::Raw("Sealed.\n\n> hook".into()));

        insta::assert_snapshot!(write(&doc), @r"
        ---
        mode: checkpoint
        invoker:
        ---

        ### HEADER

        **Thread_Archetype**: Debugging

        **Focus_Domains**:
        - parsing
        - validation

        **Invoker**:

        ---

        ### EMPTY

        ---

        ### INVOCATION LOCK

        Sealed.

        > hook
        ");
    }

    #[test]
    fn test_unparsed_renders_last_as_prose() {
        let mut doc = Document::new();
        doc.push_section(
            "S",
            [
                (UNPARSED_FIELD, FieldValue::from("Loose text.")),
                ("A", FieldValue::from("b")),
            ]
            .into_iter()
            .collect(),
        );
        assert_eq!(write(&doc), "### S\n\n**A**: b\n\nLoose text.\n");
    }

    #[test]
    fn test_multiline_scalar() {
        let mut doc = Document::new();
        doc.push_section("S", [("Note", "one\ntwo")].into_iter().collect());
        assert_eq!(write(&doc), "### S\n\n**Note**: one\ntwo\n");
    }
}
