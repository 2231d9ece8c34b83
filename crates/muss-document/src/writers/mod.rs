//! Writers render a [`Document`] as text in one format.
//!
//! Writers are total: every document renders. Output always ends each line
//! with `\n`.

pub mod json;
pub mod markdown;
pub mod yaml;

use crate::document::Document;
use crate::format::Format;

pub fn write(document: &Document, format: Format) -> String {
    match format {
        Format::Markdown => markdown::write(document),
        Format::Json => json::write(document),
        Format::Yaml => yaml::write(document),
    }
}
