//! Property tests for Markdown round-tripping and cross-format closure.

use muss_document::{Document, FieldValue, Format, SectionBody, parse, render};
use proptest::collection::vec;
use proptest::prelude::*;

fn gen_text() -> impl Strategy<Value = String> {
    "[a-z0-9][a-z0-9 .,]{0,20}[a-z0-9]"
}

fn gen_field_value() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        3 => gen_text().prop_map(FieldValue::Scalar),
        2 => vec(gen_text(), 1..4).prop_map(FieldValue::List),
        1 => Just(FieldValue::Null),
    ]
}

fn gen_fields() -> impl Strategy<Value = SectionBody> {
    vec(("[A-Z][A-Za-z_:]{0,12}", gen_field_value()), 0..5)
        .prop_map(|fields| fields.into_iter().collect())
}

fn gen_raw() -> impl Strategy<Value = SectionBody> {
    vec("[a-z][a-z .]{0,30}[a-z.]", 1..3).prop_map(|paragraphs| SectionBody::Raw(paragraphs.join("\n\n")))
}

fn gen_document(body: BoxedStrategy<SectionBody>) -> impl Strategy<Value = Document> {
    (
        vec(("[a-z][a-z_]{0,10}", "[a-z0-9][a-z0-9 :\\-]{0,15}[a-z0-9]"), 0..5),
        vec(("[A-Z][A-Z &:]{0,15}[A-Z]", body), 0..5),
    )
        .prop_map(|(frontmatter, sections)| {
            let mut doc = Document::new();
            for (key, value) in frontmatter {
                doc.set_frontmatter(key, value);
            }
            for (name, body) in sections {
                doc.push_section(name, body);
            }
            doc
        })
}

fn structured_document() -> impl Strategy<Value = Document> {
    gen_document(gen_fields().boxed())
}

fn any_document() -> impl Strategy<Value = Document> {
    gen_document(prop_oneof![3 => gen_fields(), 1 => gen_raw()].boxed())
}

fn reparse(doc: &Document, format: Format) -> Document {
    let text = render(doc, format);
    parse(&text, format)
        .unwrap_or_else(|e| panic!("re-parse of {} output failed: {}\n{}", format, e, text))
        .into_document()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn test_markdown_round_trip(doc in structured_document()) {
        let first = reparse(&doc, Format::Markdown);
        prop_assert_eq!(&first, &doc);
        prop_assert_eq!(reparse(&first, Format::Markdown), first);
    }

    #[test]
    fn test_markdown_render_is_idempotent(doc in any_document()) {
        let once = render(&reparse(&doc, Format::Markdown), Format::Markdown);
        let twice = render(&parse(&once, Format::Markdown).unwrap().into_document(), Format::Markdown);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_markdown_json_markdown_closure(doc in structured_document()) {
        let from_markdown = reparse(&doc, Format::Markdown);
        let through_json = reparse(&from_markdown, Format::Json);
        prop_assert_eq!(&through_json, &from_markdown);
        prop_assert_eq!(
            render(&through_json, Format::Markdown),
            render(&from_markdown, Format::Markdown)
        );
    }

    #[test]
    fn test_json_round_trip(doc in any_document()) {
        prop_assert_eq!(reparse(&doc, Format::Json), doc);
    }

    #[test]
    fn test_yaml_round_trip(doc in any_document()) {
        // Reserved YAML spellings read back as null or block indicators
        let reserved = doc.sections.values().filter_map(SectionBody::fields).any(|fields| {
            fields.values().any(|v| matches!(v.as_scalar(), Some("null" | "~" | "|")))
        });
        prop_assume!(!reserved);
        prop_assert_eq!(reparse(&doc, Format::Yaml), doc);
    }
}
