//! Document model and format conversion for USS/MUSS artifacts.
//!
//! An artifact is a conversation-memory snapshot written as Markdown with
//! YAML-style frontmatter, or as its JSON and YAML-subset equivalents. This
//! crate reads any of the three into a [`Document`], writes a [`Document`]
//! back out in any of them, and rewrites Markdown artifacts between the USS
//! v1.3 and MUSS v1.0 protocols.
//!
//! # Example
//!
//! ```
//! use muss_document::{Format, convert};
//!
//! let json = r#"{"frontmatter": {"mode": "archive"}, "sections": {}}"#;
//! let markdown = convert(json, None, Format::Markdown).unwrap();
//! assert_eq!(markdown, "---\nmode: archive\n---\n\n");
//! ```
//!
//! Nothing here touches the filesystem. Every call builds a fresh
//! [`Document`] from a `&str`.

pub mod convert;
pub mod document;
pub mod error;
pub mod format;
pub mod migrate;
pub mod readers;
pub mod writers;

pub use convert::{convert, convert_to, parse, render};
pub use document::{Document, FieldValue, RAW_CONTENT_KEY, SectionBody, UNPARSED_FIELD};
pub use error::{ConvertError, ParseError, Result};
pub use format::{Format, detect_format};
pub use readers::{ParseOutcome, SkipReason, SkippedLine};
