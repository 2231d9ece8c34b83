//! Format-to-format conversion.

use crate::document::Document;
use crate::error::{ConvertError, Result};
use crate::format::{Format, detect_format};
use crate::readers::{self, ParseOutcome};
use crate::writers;

/// Parse `content` in a known format.
pub fn parse(content: &str, format: Format) -> Result<ParseOutcome> {
    let outcome = readers::read(content, format)?;
    if !outcome.skipped.is_empty() {
        tracing::debug!(
            %format,
            skipped = outcome.skipped.len(),
            "parsed with skipped lines"
        );
    }
    Ok(outcome)
}

/// Render a document in `format`.
pub fn render(document: &Document, format: Format) -> String {
    writers::write(document, format)
}

/// Convert `content` to `target`, detecting the input format from `hint`
/// (a format name or filename) or from the content itself.
pub fn convert(content: &str, hint: Option<&str>, target: Format) -> std::result::Result<String, ConvertError> {
    let source = detect_format(content, hint)?;
    tracing::debug!(%source, %target, "converting");
    let outcome = parse(content, source)?;
    Ok(render(&outcome.document, target))
}

/// Like [`convert`], with the target given by name.
pub fn convert_to(content: &str, hint: Option<&str>, target: &str) -> std::result::Result<String, ConvertError> {
    let target: Format = target.parse()?;
    convert(content, hint, target)
}
