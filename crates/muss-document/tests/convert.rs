//! End-to-end conversion of a hand-written artifact.

use muss_document::{
    ConvertError, Document, FieldValue, Format, SectionBody, SkipReason, UNPARSED_FIELD, convert,
    convert_to, detect_format, parse, render,
};

const ARTIFACT: &str = "\
---
mode: checkpoint
protocol: Universal Seed Summary Invoker
version: \"1.3\"
timestamp: 2025-01-15T10:30:00Z
---

Stray preamble the reader drops.

### HEADER (THREAD LOCK & AUDIT)

**Thread_Archetype**: Debugging session

**Focus_Domains**:
- parser recovery
- schema rules

**Completion_State**:

---

### FAILURE SEMANTICS & INTEGRITY FLAGS

**Compression_Fidelity_Score**: 0.92
**Failure_Severity**: Low

Reviewer note left between fields.

---

### INVOCATION LOCK

The artifact is complete and sealed.

> INGESTION: resume from the schema rules work
";

fn artifact() -> Document {
    parse(ARTIFACT, Format::Markdown).unwrap().into_document()
}

#[test]
fn test_reads_hand_written_artifact() {
    let outcome = parse(ARTIFACT, Format::Markdown).unwrap();
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].line, 8);
    assert_eq!(outcome.skipped[0].reason, SkipReason::OutsideSection);

    let doc = outcome.document;
    assert_eq!(doc.frontmatter.len(), 4);
    assert_eq!(doc.sections.len(), 3);
    assert_eq!(
        doc.field("HEADER (THREAD LOCK & AUDIT)", "Completion_State"),
        Some(&FieldValue::Null)
    );
    assert_eq!(
        doc.field("FAILURE SEMANTICS & INTEGRITY FLAGS", UNPARSED_FIELD),
        Some(&FieldValue::Scalar("Reviewer note left between fields.".into()))
    );
    assert!(doc.section("INVOCATION LOCK").is_some_and(SectionBody::is_raw));
}

#[test]
fn test_every_format_reads_back_the_same_document() {
    let doc = artifact();
    for format in Format::ALL {
        let text = render(&doc, format);
        assert_eq!(detect_format(&text, None).unwrap(), format, "sniffing {}", format);
        let back = parse(&text, format).unwrap().into_document();
        assert_eq!(back, doc, "round trip through {}", format);
    }
}

#[test]
fn test_convert_chain_is_stable() {
    let json = convert(ARTIFACT, Some("artifact.md"), Format::Json).unwrap();
    let yaml = convert(&json, Some("artifact.json"), Format::Yaml).unwrap();
    let markdown = convert_to(&yaml, None, "md").unwrap();
    assert_eq!(markdown, render(&artifact(), Format::Markdown));
}

#[test]
fn test_json_without_sections() {
    let out = convert_to(r#"{"frontmatter": {"mode": "archive"}, "sections": {}}"#, None, "markdown")
        .unwrap();
    assert_eq!(out, "---\nmode: archive\n---\n\n");
}

#[test]
fn test_conversion_errors() {
    assert_eq!(
        convert_to(ARTIFACT, None, "html").unwrap_err(),
        ConvertError::UnknownOutputFormat("html".into())
    );
    assert!(matches!(
        convert("mode: archive\n: broken\n", Some("bad.yaml"), Format::Json),
        Err(ConvertError::Parse(_))
    ));
}

#[test]
fn test_names_with_colons_survive_yaml() {
    let markdown = "---\nmode: checkpoint\n---\n\n### NOTE: CONTEXT\n\n**A**: b\n";
    let yaml = convert(markdown, Some("notes.md"), Format::Yaml).unwrap();
    let outcome = parse(&yaml, Format::Yaml).unwrap();
    assert!(outcome.skipped.is_empty(), "{:?}", outcome.skipped);
    assert_eq!(outcome.document.frontmatter.len(), 1);
    assert_eq!(
        outcome.document.field("NOTE: CONTEXT", "A"),
        Some(&FieldValue::Scalar("b".into()))
    );
    assert_eq!(convert(&yaml, Some("notes.yaml"), Format::Markdown).unwrap(), markdown);
}
