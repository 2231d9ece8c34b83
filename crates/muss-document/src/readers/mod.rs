//! Readers turn raw text of one format into a [`Document`].
//!
//! The Markdown and YAML readers are line scans with a per-line recovery
//! policy: a line they cannot place is recorded in
//! [`ParseOutcome::skipped`] and the scan continues. Only the JSON reader
//! and the YAML empty-key check fail outright.

pub mod json;
pub mod markdown;
pub mod yaml;

use crate::document::Document;
use crate::error::Result;
use crate::format::Format;
use std::fmt;

/// A successfully read document plus the lines the reader dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParseOutcome {
    pub document: Document,
    pub skipped: Vec<SkippedLine>,
}

impl ParseOutcome {
    pub fn into_document(self) -> Document {
        self.document
    }
}

/// A source line the reader recovered from by skipping it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number
    pub line: usize,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Frontmatter line without a `key: value` shape
    FrontmatterWithoutColon,
    /// `: value` with nothing before the colon, tolerated in frontmatter
    EmptyFrontmatterKey,
    /// Text before the first heading or after a section separator
    OutsideSection,
    /// Top-level YAML line without a colon
    TopLevelWithoutColon,
    /// Indented YAML line with no section open
    NoOpenSection,
    /// Indented YAML line inside a section without a colon
    FieldWithoutColon,
    /// Bullet line with no list field open
    NoOpenList,
    /// Bullet line with no text
    EmptyListItem,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::FrontmatterWithoutColon => "frontmatter line has no ':'",
            SkipReason::EmptyFrontmatterKey => "frontmatter line has an empty key",
            SkipReason::OutsideSection => "text outside any section",
            SkipReason::TopLevelWithoutColon => "top-level line has no ':'",
            SkipReason::NoOpenSection => "indented line with no open section",
            SkipReason::FieldWithoutColon => "field line has no ':'",
            SkipReason::NoOpenList => "list item with no open list field",
            SkipReason::EmptyListItem => "empty list item",
        };
        f.write_str(text)
    }
}

/// Accumulates skipped lines during a scan and logs each one.
#[derive(Debug, Default)]
pub(crate) struct SkipLog {
    lines: Vec<SkippedLine>,
}

impl SkipLog {
    pub(crate) fn skip(&mut self, line: usize, reason: SkipReason) {
        tracing::debug!(line, %reason, "skipping line");
        self.lines.push(SkippedLine { line, reason });
    }

    pub(crate) fn finish(self, document: Document) -> ParseOutcome {
        ParseOutcome {
            document,
            skipped: self.lines,
        }
    }
}

/// Read `content` as `format`.
pub fn read(content: &str, format: Format) -> Result<ParseOutcome> {
    match format {
        Format::Markdown => Ok(markdown::read(content)),
        Format::Json => json::read(content),
        Format::Yaml => yaml::read(content),
    }
}

/// Number of leading spaces (tabs count as one column).
pub(crate) fn indentation(line: &str) -> usize {
    line.len() - line.trim_start().len()
}
