//! Serialization formats and input format detection.

use crate::error::ConvertError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// The three wire formats an artifact can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Markdown with `---` frontmatter and `### NAME` sections
    Markdown,
    /// Strict JSON
    Json,
    /// The two-level YAML subset
    Yaml,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Markdown, Format::Json, Format::Yaml];

    pub fn name(self) -> &'static str {
        match self {
            Format::Markdown => "markdown",
            Format::Json => "json",
            Format::Yaml => "yaml",
        }
    }

    /// File extension used when writing this format.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Markdown => "md",
            Format::Json => "json",
            Format::Yaml => "yaml",
        }
    }

    /// Map a file extension (without the dot) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "md" | "markdown" => Some(Format::Markdown),
            "json" => Some(Format::Json),
            "yml" | "yaml" => Some(Format::Yaml),
            _ => None,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Some(Format::Markdown),
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            _ => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Format::from_name(s.trim()).ok_or_else(|| ConvertError::UnknownOutputFormat(s.to_string()))
    }
}

static SECTION_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^### [A-Z]").unwrap());

static TOP_LEVEL_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s#:{\-][^:]*:(\s|$)").unwrap());

/// Detect the format of `content`.
///
/// `hint` may be a format name (`"json"`) or a filename (`"notes.yaml"`).
/// A recognized hint always wins over content sniffing, so hybrid-looking
/// files are read the way their name says.
pub fn detect_format(content: &str, hint: Option<&str>) -> Result<Format, ConvertError> {
    if let Some(format) = hint.and_then(format_from_hint) {
        tracing::debug!(%format, ?hint, "format taken from hint");
        return Ok(format);
    }

    let trimmed = content.trim();
    let sniffed = if trimmed.starts_with('{') {
        Some(Format::Json)
    } else if trimmed.starts_with("---") && SECTION_HEADING.is_match(trimmed) {
        Some(Format::Markdown)
    } else if trimmed
        .lines()
        .find(|line| !line.trim().is_empty())
        .is_some_and(|line| TOP_LEVEL_KEY.is_match(line))
    {
        Some(Format::Yaml)
    } else {
        None
    };

    match sniffed {
        Some(format) => {
            tracing::debug!(%format, "format sniffed from content");
            Ok(format)
        }
        None => Err(ConvertError::UnknownInputFormat {
            hint: hint.map(str::to_string),
        }),
    }
}

fn format_from_hint(hint: &str) -> Option<Format> {
    if let Some(format) = Format::from_name(hint) {
        return Some(format);
    }
    Path::new(hint)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(Format::from_extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKDOWN: &str = "---\nmode: checkpoint\n---\n\n### HEADER\n\n**A**: b\n";

    #[test]
    fn test_extension_wins_over_content() {
        // Looks like JSON, named like YAML
        assert_eq!(detect_format("{\"a\": 1}", Some("notes.yaml")).unwrap(), Format::Yaml);
        assert_eq!(detect_format(MARKDOWN, Some("snapshot.JSON")).unwrap(), Format::Json);
        assert_eq!(detect_format("", Some("x.markdown")).unwrap(), Format::Markdown);
    }

    #[test]
    fn test_format_name_hint() {
        assert_eq!(detect_format("", Some("md")).unwrap(), Format::Markdown);
        assert_eq!(detect_format("", Some("YML")).unwrap(), Format::Yaml);
    }

    #[test]
    fn test_unknown_extension_falls_back_to_sniffing() {
        assert_eq!(detect_format(MARKDOWN, Some("snapshot.txt")).unwrap(), Format::Markdown);
    }

    #[test]
    fn test_sniff_json() {
        assert_eq!(detect_format("  \n{\"frontmatter\": {}}", None).unwrap(), Format::Json);
    }

    #[test]
    fn test_sniff_markdown_requires_heading() {
        assert_eq!(detect_format(MARKDOWN, None).unwrap(), Format::Markdown);
        // Fence without any level-3 uppercase heading is not markdown
        assert!(detect_format("---\nmode: x\n---\n\nprose only\n", None).is_err());
    }

    #[test]
    fn test_sniff_yaml() {
        assert_eq!(detect_format("\nmode: archive\n", None).unwrap(), Format::Yaml);
        assert_eq!(
            detect_format("HEADER (THREAD LOCK & AUDIT):\n  A: b\n", None).unwrap(),
            Format::Yaml
        );
    }

    #[test]
    fn test_undetectable() {
        let err = detect_format("just some words", Some("notes.txt")).unwrap_err();
        assert_eq!(
            err,
            ConvertError::UnknownInputFormat {
                hint: Some("notes.txt".into())
            }
        );
        assert!(detect_format("", None).is_err());
        assert!(detect_format("### HEADER\n", None).is_err());
    }

    #[test]
    fn test_from_str() {
        assert_eq!("markdown".parse::<Format>().unwrap(), Format::Markdown);
        assert_eq!("Json".parse::<Format>().unwrap(), Format::Json);
        assert_eq!(
            "xml".parse::<Format>().unwrap_err(),
            ConvertError::UnknownOutputFormat("xml".into())
        );
    }
}
