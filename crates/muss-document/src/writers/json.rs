//! JSON writer.

use crate::document::Document;

/// Pretty-printed JSON with two-space indentation and a trailing newline.
pub fn write(document: &Document) -> String {
    // String keys and string leaves only, so serialization cannot fail.
    let mut out = serde_json::to_string_pretty(document).expect("documents always serialize to JSON");
    out.push('\n');
    out
}
