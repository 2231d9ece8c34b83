//! Reader for the two-level YAML subset.
//!
//! ```yaml
//! mode: archive                  # top level, with a value: frontmatter
//!
//! HEADER (THREAD LOCK & AUDIT):  # top level, no value: a section
//!   Thread_Archetype: Debugging  # scalar field
//!   Focus_Domains:               # list field
//!     - parsing
//!   Notes: |                     # literal block scalar
//!     kept verbatim
//! ```
//!
//! A section, list or block scalar ends at the first non-blank line that is
//! indented no deeper than the line which opened it. A key may be written as
//! a double-quoted JSON string (`"NOTE: CONTEXT":`), which is how names
//! containing `:` are kept whole. An empty key or a bad escape in a quoted
//! key is a hard error; every other irregular line is skipped.

use super::{ParseOutcome, SkipLog, SkipReason, indentation};
use crate::document::{Document, FieldValue, RAW_CONTENT_KEY, SectionBody, bullet_text, is_bullet_line};
use crate::error::{ParseError, Result};
use indexmap::IndexMap;
use std::borrow::Cow;

const BLOCK_INDICATOR: &str = "|";

pub fn read(content: &str) -> Result<ParseOutcome> {
    let mut reader = Reader::default();
    for (index, line) in content.lines().enumerate() {
        reader.line(index + 1, line)?;
    }
    Ok(reader.finish())
}

#[derive(Default)]
struct Reader<'a> {
    document: Document,
    skips: SkipLog,
    section: Option<OpenSection>,
    list: Option<OpenList>,
    block: Option<OpenBlock<'a>>,
}

struct OpenSection {
    name: String,
    fields: IndexMap<String, FieldValue>,
}

struct OpenList {
    key: String,
    indent: usize,
}

struct OpenBlock<'a> {
    key: String,
    indent: usize,
    lines: Vec<&'a str>,
}

impl<'a> Reader<'a> {
    fn line(&mut self, number: usize, line: &'a str) -> Result<()> {
        if let Some(block) = self.block.as_mut() {
            if line.trim().is_empty() || indentation(line) > block.indent {
                block.lines.push(line);
                return Ok(());
            }
            self.close_block();
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(());
        }
        let indent = indentation(line);

        if is_bullet_line(trimmed) {
            self.list_item(number, indent, trimmed);
            return Ok(());
        }

        let Some((key, value)) = split_key(trimmed, number)? else {
            let reason = if indent == 0 {
                SkipReason::TopLevelWithoutColon
            } else if self.section.is_none() {
                SkipReason::NoOpenSection
            } else {
                SkipReason::FieldWithoutColon
            };
            self.skips.skip(number, reason);
            return Ok(());
        };

        let key: &str = &key;
        if key.is_empty() {
            return Err(ParseError::MalformedYaml {
                message: format!("empty key in '{}'", trimmed),
                line: number,
            });
        }
        let value = value.trim();
        let quoted_empty = matches!(value, "\"\"" | "''");

        if indent == 0 {
            if quoted_empty {
                self.close_section();
                self.document.set_frontmatter(key, "");
                return Ok(());
            }
            self.close_section();
            if value.is_empty() {
                self.section = Some(OpenSection {
                    name: key.to_string(),
                    fields: IndexMap::new(),
                });
            } else {
                self.document.set_frontmatter(key, value);
            }
            return Ok(());
        }

        let Some(section) = self.section.as_mut() else {
            self.skips.skip(number, SkipReason::NoOpenSection);
            return Ok(());
        };
        self.list = None;

        let field = match value {
            "" => {
                self.list = Some(OpenList {
                    key: key.to_string(),
                    indent,
                });
                FieldValue::List(Vec::new())
            }
            BLOCK_INDICATOR => {
                self.block = Some(OpenBlock {
                    key: key.to_string(),
                    indent,
                    lines: Vec::new(),
                });
                return Ok(());
            }
            "null" | "~" => FieldValue::Null,
            _ if quoted_empty => FieldValue::Scalar(String::new()),
            other => FieldValue::Scalar(other.to_string()),
        };
        section.fields.insert(key.to_string(), field);
        Ok(())
    }

    fn list_item(&mut self, number: usize, indent: usize, trimmed: &str) {
        let target = match (&self.list, self.section.as_mut()) {
            (Some(list), Some(section)) if indent > list.indent => section.fields.get_mut(&list.key),
            _ => None,
        };
        let Some(FieldValue::List(items)) = target else {
            self.skips.skip(number, SkipReason::NoOpenList);
            return;
        };
        let item = bullet_text(trimmed);
        if item.is_empty() {
            self.skips.skip(number, SkipReason::EmptyListItem);
        } else {
            items.push(item.to_string());
        }
    }

    fn close_block(&mut self) {
        let Some(block) = self.block.take() else {
            return;
        };
        let text = dedent_block(&block.lines);
        if let Some(section) = self.section.as_mut() {
            section.fields.insert(block.key, FieldValue::Scalar(text));
        }
    }

    fn close_section(&mut self) {
        self.close_block();
        self.list = None;
        let Some(OpenSection { name, mut fields }) = self.section.take() else {
            return;
        };

        let body = if fields.len() == 1 && fields.contains_key(RAW_CONTENT_KEY) {
            match fields.swap_remove(RAW_CONTENT_KEY) {
                Some(FieldValue::Scalar(text)) => SectionBody::Raw(text),
                Some(other) => {
                    fields.insert(RAW_CONTENT_KEY.to_string(), other);
                    SectionBody::Fields(fields)
                }
                None => SectionBody::Fields(fields),
            }
        } else {
            SectionBody::Fields(fields)
        };
        self.document.push_section(name, body);
    }

    fn finish(mut self) -> ParseOutcome {
        self.close_section();
        self.skips.finish(self.document)
    }
}

/// Split a `key: value` line at the colon that ends the key. A quoted key
/// is decoded as a JSON string.
fn split_key(trimmed: &str, number: usize) -> Result<Option<(Cow<'_, str>, &str)>> {
    let plain = || trimmed.split_once(':').map(|(key, value)| (Cow::Borrowed(key.trim()), value));
    if !trimmed.starts_with('"') {
        return Ok(plain());
    }
    let Some(end) = quoted_key_end(trimmed) else {
        return Ok(plain());
    };
    let (quoted, rest) = trimmed.split_at(end);
    let Some(value) = rest.trim_start().strip_prefix(':') else {
        return Ok(plain());
    };
    let key: String = serde_json::from_str(quoted).map_err(|err| ParseError::MalformedYaml {
        message: format!("invalid quoted key {}: {}", quoted, err),
        line: number,
    })?;
    Ok(Some((Cow::Owned(key), value)))
}

/// Byte offset just past the closing quote of a leading quoted string.
fn quoted_key_end(text: &str) -> Option<usize> {
    let mut escaped = false;
    for (offset, ch) in text.char_indices().skip(1) {
        match ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(offset + 1),
            _ => {}
        }
    }
    None
}

/// Strip the common indentation of a literal block, dropping trailing blank
/// lines.
fn dedent_block(lines: &[&str]) -> String {
    let mut end = lines.len();
    while end > 0 && lines[end - 1].trim().is_empty() {
        end -= 1;
    }
    let lines = &lines[..end];

    let common = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| indentation(l))
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|l| {
            if l.trim().is_empty() {
                ""
            } else {
                l.get(common..).unwrap_or_else(|| l.trim_start()).trim_end()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
