//! The canonical in-memory representation of an artifact.
//!
//! A [`Document`] is what every reader produces and every writer consumes.
//! It is deliberately small: an ordered frontmatter mapping and an ordered
//! list of named sections, each of which holds either structured fields or
//! opaque raw text.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Reserved key under which JSON and YAML carry a section's raw content.
pub const RAW_CONTENT_KEY: &str = "_content";

/// Reserved field holding text inside a field-bearing section that no field
/// marker claimed.
pub const UNPARSED_FIELD: &str = "_unparsed";

/// A parsed USS/MUSS artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct Document {
    /// Frontmatter entries in source order.
    pub frontmatter: IndexMap<String, String>,
    /// Sections in order of first appearance, keyed by heading text.
    pub sections: IndexMap<String, SectionBody>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a frontmatter entry. A repeated key keeps its original position
    /// and takes the new value.
    pub fn set_frontmatter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.frontmatter.insert(key.into(), value.into());
    }

    /// Add or replace a section, keeping the position of an earlier section
    /// with the same name.
    pub fn push_section(&mut self, name: impl Into<String>, body: SectionBody) {
        self.sections.insert(name.into(), body);
    }

    pub fn section(&self, name: &str) -> Option<&SectionBody> {
        self.sections.get(name)
    }

    /// Look up a field value inside a named section.
    pub fn field(&self, section: &str, field: &str) -> Option<&FieldValue> {
        match self.sections.get(section)? {
            SectionBody::Fields(fields) => fields.get(field),
            SectionBody::Raw(_) => None,
        }
    }

    /// True when no section fell back to raw content.
    pub fn is_fully_structured(&self) -> bool {
        self.sections.values().all(|body| !body.is_raw())
    }

    pub fn is_empty(&self) -> bool {
        self.frontmatter.is_empty() && self.sections.is_empty()
    }
}

/// The body of a section: structured fields or raw text, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionBody {
    Fields(IndexMap<String, FieldValue>),
    Raw(String),
}

impl SectionBody {
    pub fn empty() -> Self {
        SectionBody::Fields(IndexMap::new())
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, SectionBody::Raw(_))
    }

    pub fn fields(&self) -> Option<&IndexMap<String, FieldValue>> {
        match self {
            SectionBody::Fields(fields) => Some(fields),
            SectionBody::Raw(_) => None,
        }
    }

    pub fn raw(&self) -> Option<&str> {
        match self {
            SectionBody::Raw(text) => Some(text),
            SectionBody::Fields(_) => None,
        }
    }
}

impl<K, V> FromIterator<(K, V)> for SectionBody
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        SectionBody::Fields(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl Serialize for SectionBody {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SectionBody::Fields(fields) => fields.serialize(serializer),
            SectionBody::Raw(text) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(RAW_CONTENT_KEY, text)?;
                map.end()
            }
        }
    }
}

/// A single field value.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
    Null,
}

impl FieldValue {
    /// Classify source text the way artifacts are written by hand: a value
    /// that begins with a bullet or contains a bullet line is a list, an
    /// empty value is null, anything else is a scalar.
    pub fn classify(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return FieldValue::Null;
        }
        if !text.lines().any(is_bullet_line) {
            return FieldValue::Scalar(text.to_string());
        }

        let mut items: Vec<String> = Vec::new();
        let mut open_bullet = false;
        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if is_bullet_line(line) {
                items.push(bullet_text(line).to_string());
                open_bullet = true;
            } else if open_bullet {
                // Continuation of the previous bullet.
                if let Some(last) = items.last_mut() {
                    if !last.is_empty() {
                        last.push(' ');
                    }
                    last.push_str(trimmed);
                }
            } else {
                items.push(trimmed.to_string());
            }
        }
        items.retain(|item| !item.is_empty());
        FieldValue::List(items)
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            FieldValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Scalar(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Scalar(s)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(items: Vec<&str>) -> Self {
        FieldValue::List(items.into_iter().map(str::to_string).collect())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// A line that starts a bullet item (`- item`, or a bare `-`).
pub(crate) fn is_bullet_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed == "-" || trimmed.starts_with("- ")
}

/// The item text of a bullet line, trimmed.
pub(crate) fn bullet_text(line: &str) -> &str {
    line.trim_start()
        .strip_prefix('-')
        .unwrap_or(line)
        .trim()
}
