//! Markdown reader.
//!
//! Recognizes the constrained Markdown shape artifacts are written in:
//!
//! ```text
//! ---
//! mode: checkpoint
//! ---
//!
//! ### SECTION NAME
//!
//! **Field_Name**: value
//!
//! **List_Field**:
//! - item
//! ---
//! ```
//!
//! A section runs from its `### ` heading to the next heading, a bare `---`
//! line, or the end of the document. Text between a `---` and the next
//! heading is folded into the preceding section after a blank line; only
//! text before the first heading is dropped. The reader never fails.

use super::{ParseOutcome, SkipLog, SkipReason};
use crate::document::{Document, FieldValue, SectionBody, UNPARSED_FIELD, is_bullet_line};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

static FIELD_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\*\*([^*]+)\*\*:[ \t]*(.*)$").unwrap());

const FENCE: &str = "---";
const HEADING_PREFIX: &str = "### ";

pub fn read(content: &str) -> ParseOutcome {
    let lines: Vec<&str> = content.lines().collect();
    let mut skips = SkipLog::default();
    let mut document = Document::new();

    let body_start = read_frontmatter(&lines, &mut document, &mut skips);

    let mut current: Option<(String, Vec<&str>)> = None;
    // Set after a separator; the section takes trailing text until the next heading
    let mut closed = false;
    let mut folded = false;
    for (index, &line) in lines.iter().enumerate().skip(body_start) {
        if let Some(name) = heading_name(line) {
            if let Some((name, body)) = current.take() {
                document.push_section(name, read_section(&body));
            }
            current = Some((name.to_string(), Vec::new()));
            closed = false;
        } else if is_separator(line) {
            if current.is_some() && !closed {
                closed = true;
                folded = false;
            }
        } else if let Some((_, body)) = current.as_mut() {
            if closed && !folded {
                if line.trim().is_empty() {
                    continue;
                }
                body.push("");
                folded = true;
            }
            body.push(line);
        } else if !line.trim().is_empty() {
            skips.skip(index + 1, SkipReason::OutsideSection);
        }
    }
    if let Some((name, body)) = current.take() {
        document.push_section(name, read_section(&body));
    }

    skips.finish(document)
}

/// Read the leading frontmatter block, returning the index of the first
/// body line. Without a closing fence nothing is consumed.
fn read_frontmatter(lines: &[&str], document: &mut Document, skips: &mut SkipLog) -> usize {
    if lines.first().map(|l| l.trim_end()) != Some(FENCE) {
        return 0;
    }
    let Some(close) = lines
        .iter()
        .skip(1)
        .position(|l| l.trim_end() == FENCE)
        .map(|p| p + 1)
    else {
        tracing::debug!("frontmatter fence is never closed; ignoring frontmatter");
        return 0;
    };

    for (index, line) in lines.iter().enumerate().take(close).skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        match line.split_once(':') {
            Some((key, value)) if !key.trim().is_empty() => {
                document.set_frontmatter(key.trim(), value.trim());
            }
            Some(_) => skips.skip(index + 1, SkipReason::EmptyFrontmatterKey),
            None => skips.skip(index + 1, SkipReason::FrontmatterWithoutColon),
        }
    }
    close + 1
}

fn heading_name(line: &str) -> Option<&str> {
    let name = line.strip_prefix(HEADING_PREFIX)?.trim();
    (!name.is_empty()).then_some(name)
}

fn is_separator(line: &str) -> bool {
    line.trim() == FENCE
}

/// Split a section body into bold-marker fields, or keep it raw when no
/// marker is present.
fn read_section(body: &[&str]) -> SectionBody {
    let mut fields: IndexMap<String, FieldValue> = IndexMap::new();
    let mut unclaimed: Vec<Vec<&str>> = Vec::new();
    let mut open: Option<(String, Vec<&str>)> = None;
    let mut paragraph: Vec<&str> = Vec::new();
    // An empty marker followed by blank lines may still open a list
    let mut awaiting_items = false;

    for &line in body {
        if line.trim().is_empty() {
            if open.as_ref().is_some_and(|(_, value)| is_blank(value)) {
                awaiting_items = true;
                continue;
            }
            close_field(&mut open, &mut fields);
            close_paragraph(&mut paragraph, &mut unclaimed);
            continue;
        }
        let after_gap = std::mem::take(&mut awaiting_items);

        if let Some(caps) = FIELD_MARKER.captures(line) {
            close_field(&mut open, &mut fields);
            close_paragraph(&mut paragraph, &mut unclaimed);
            let name = caps[1].trim().to_string();
            let first = caps.get(2).map_or("", |m| m.as_str());
            open = Some((name, vec![first]));
        } else if after_gap && !is_bullet_line(line) {
            close_field(&mut open, &mut fields);
            paragraph.push(line.trim_end());
        } else if let Some((_, value)) = open.as_mut() {
            value.push(line);
        } else {
            paragraph.push(line.trim_end());
        }
    }
    close_field(&mut open, &mut fields);
    close_paragraph(&mut paragraph, &mut unclaimed);

    if fields.is_empty() {
        let raw = body.join("\n");
        let raw = raw.trim();
        if raw.is_empty() {
            return SectionBody::empty();
        }
        return SectionBody::Raw(raw.to_string());
    }

    if !unclaimed.is_empty() {
        let text = unclaimed
            .iter()
            .map(|p| p.join("\n"))
            .collect::<Vec<_>>()
            .join("\n\n");
        fields.insert(UNPARSED_FIELD.to_string(), FieldValue::Scalar(text));
    }
    SectionBody::Fields(fields)
}

fn is_blank(lines: &[&str]) -> bool {
    lines.iter().all(|line| line.trim().is_empty())
}

fn close_field(open: &mut Option<(String, Vec<&str>)>, fields: &mut IndexMap<String, FieldValue>) {
    if let Some((name, lines)) = open.take() {
        let text: Vec<&str> = lines.iter().map(|l| l.trim_end()).collect();
        fields.insert(name, FieldValue::classify(&text.join("\n")));
    }
}

fn close_paragraph<'a>(paragraph: &mut Vec<&'a str>, unclaimed: &mut Vec<Vec<&'a str>>) {
    if !paragraph.is_empty() {
        unclaimed.push(std::mem::take(paragraph));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readers::SkippedLine;

    #[test]
    fn test_frontmatter_and_sections() {
        let outcome = read(
            "---\nmode: checkpoint\ntimestamp: 2025-01-15T10:30:00Z\n---\n\n\
             ### HEADER (THREAD LOCK & AUDIT)\n\n**Thread_Archetype**: Debugging\n\n\
             **Focus_Domains**:\n- parsing\n- validation\n\n---\n\n\
             ### INVOCATION LOCK\n\nThe artifact is sealed.\n",
        );
        let doc = outcome.document;

        assert_eq!(doc.frontmatter["mode"], "checkpoint");
        // Only the first colon splits
        assert_eq!(doc.frontmatter["timestamp"], "2025-01-15T10:30:00Z");

        let names: Vec<_> = doc.sections.keys().cloned().collect();
        assert_eq!(names, vec!["HEADER (THREAD LOCK & AUDIT)", "INVOCATION LOCK"]);

        assert_eq!(
            doc.field("HEADER (THREAD LOCK & AUDIT)", "Thread_Archetype"),
            Some(&FieldValue::Scalar("Debugging".into()))
        );
        assert_eq!(
            doc.field("HEADER (THREAD LOCK & AUDIT)", "Focus_Domains"),
            Some(&FieldValue::from(vec!["parsing", "validation"]))
        );
        assert_eq!(
            doc.section("INVOCATION LOCK"),
            Some(&SectionBody::Raw("The artifact is sealed.".into()))
        );
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn test_unclosed_frontmatter_is_omitted() {
        let doc = read("---\nmode: checkpoint\n\n### HEADER\n\n**A**: b\n").document;
        assert!(doc.frontmatter.is_empty());
        assert_eq!(doc.field("HEADER", "A"), Some(&FieldValue::Scalar("b".into())));
    }

    #[test]
    fn test_frontmatter_lines_without_colon_are_skipped() {
        let outcome = read("---\nmode: archive\njust words\n: orphan\n---\n");
        assert_eq!(outcome.document.frontmatter.len(), 1);
        assert_eq!(
            outcome.skipped,
            vec![
                SkippedLine {
                    line: 3,
                    reason: SkipReason::FrontmatterWithoutColon
                },
                SkippedLine {
                    line: 4,
                    reason: SkipReason::EmptyFrontmatterKey
                },
            ]
        );
    }

    #[test]
    fn test_multiline_scalar_ends_at_blank_line() {
        let doc = read("### S\n\n**Note**: first line\nsecond line\n\n**Next**: x\n").document;
        assert_eq!(
            doc.field("S", "Note"),
            Some(&FieldValue::Scalar("first line\nsecond line".into()))
        );
        assert_eq!(doc.field("S", "Next"), Some(&FieldValue::Scalar("x".into())));
    }

    #[test]
    fn test_adjacent_markers_end_values() {
        let doc = read("### S\n**A**: one\n**B**: two\n**C**:\n").document;
        let fields = doc.section("S").and_then(SectionBody::fields).unwrap();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields["B"], FieldValue::Scalar("two".into()));
        assert_eq!(fields["C"], FieldValue::Null);
    }

    #[test]
    fn test_unclaimed_text_goes_to_catch_all() {
        let doc = read("### S\n\nIntro paragraph.\n\n**A**: b\n\nTrailing prose\nover two lines.\n")
            .document;
        assert_eq!(
            doc.field("S", UNPARSED_FIELD),
            Some(&FieldValue::Scalar(
                "Intro paragraph.\n\nTrailing prose\nover two lines.".into()
            ))
        );
    }

    #[test]
    fn test_empty_section_has_no_fields() {
        let doc = read("### EMPTY\n\n---\n\n### NEXT\n\ntext\n").document;
        assert_eq!(doc.section("EMPTY"), Some(&SectionBody::empty()));
    }

    #[test]
    fn test_preamble_is_skipped() {
        let outcome = read("preamble\n### A\n\nbody\n");
        assert_eq!(outcome.document.sections.len(), 1);
        let lines: Vec<_> = outcome.skipped.iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![1]);
    }

    #[test]
    fn test_text_after_separator_joins_previous_section() {
        let outcome = read("### A\n\nbody\n---\n\nstray\n\n### B\n\n**F**: v\n---\nnote\n");
        assert!(outcome.skipped.is_empty());
        let doc = outcome.document;
        assert_eq!(doc.section("A"), Some(&SectionBody::Raw("body\n\nstray".into())));
        assert_eq!(doc.field("B", "F"), Some(&FieldValue::Scalar("v".into())));
        assert_eq!(doc.field("B", UNPARSED_FIELD), Some(&FieldValue::Scalar("note".into())));
    }

    #[test]
    fn test_list_after_blank_line() {
        let doc = read("### HEADER\n\n**Focus_Domains**:\n\n- parsing\n- validation\n").document;
        assert_eq!(
            doc.field("HEADER", "Focus_Domains"),
            Some(&FieldValue::from(vec!["parsing", "validation"]))
        );
        assert!(doc.field("HEADER", UNPARSED_FIELD).is_none());
    }

    #[test]
    fn test_empty_marker_before_prose_stays_null() {
        let doc = read("### S\n\n**Completion_State**:\n\nSome closing prose.\n").document;
        assert_eq!(doc.field("S", "Completion_State"), Some(&FieldValue::Null));
        assert_eq!(
            doc.field("S", UNPARSED_FIELD),
            Some(&FieldValue::Scalar("Some closing prose.".into()))
        );
    }

    #[test]
    fn test_deeper_headings_stay_in_body() {
        let doc = read("### A\n\n#### detail\nmore\n").document;
        assert_eq!(doc.section("A"), Some(&SectionBody::Raw("#### detail\nmore".into())));
    }

    #[test]
    fn test_crlf_line_endings() {
        let doc = read("---\r\nmode: archive\r\n---\r\n### A\r\n**F**: v\r\n").document;
        assert_eq!(doc.frontmatter["mode"], "archive");
        assert_eq!(doc.field("A", "F"), Some(&FieldValue::Scalar("v".into())));
    }
}
