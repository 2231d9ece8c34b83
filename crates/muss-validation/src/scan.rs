//! Raw-text views of an artifact used by the validator.
//!
//! Nothing here builds a document tree. A section runs from its `### `
//! heading to the next heading, a bare `---` line, or the end of the text,
//! the same boundary the Markdown reader uses.

use crate::schema::SectionMatch;

const FENCE: &str = "---";
const HEADING_PREFIX: &str = "### ";

/// The state of the leading frontmatter block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Frontmatter<'a> {
    Missing,
    Unclosed,
    Present(Vec<(&'a str, &'a str)>),
}

impl<'a> Frontmatter<'a> {
    pub(crate) fn entries(&self) -> &[(&'a str, &'a str)] {
        match self {
            Frontmatter::Present(entries) => entries,
            Frontmatter::Missing | Frontmatter::Unclosed => &[],
        }
    }

    pub(crate) fn get(&self, key: &str) -> Option<&'a str> {
        self.entries()
            .iter()
            .rev()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }

    /// The declared mode, unquoted.
    pub(crate) fn mode(&self) -> Option<&'a str> {
        let mode = self.get("mode")?.trim_matches(|c| c == '"' || c == '\'').trim();
        (!mode.is_empty()).then_some(mode)
    }
}

/// Line-indexed view of the raw text.
pub(crate) struct Scan<'a> {
    pub(crate) lines: Vec<&'a str>,
    pub(crate) frontmatter: Frontmatter<'a>,
    headings: Vec<(usize, &'a str)>,
}

impl<'a> Scan<'a> {
    pub(crate) fn new(content: &'a str) -> Self {
        let lines: Vec<&str> = content.lines().collect();
        let frontmatter = read_frontmatter(&lines);
        let headings = lines
            .iter()
            .enumerate()
            .filter_map(|(index, &line)| heading_name(line).map(|name| (index, name)))
            .collect();
        Scan {
            lines,
            frontmatter,
            headings,
        }
    }

    pub(crate) fn has_section(&self, name: &str, matching: SectionMatch) -> bool {
        self.headings.iter().any(|(_, heading)| matching.matches(heading, name))
    }

    /// Body lines of the first section whose heading matches `name`.
    pub(crate) fn section(&self, name: &str, matching: SectionMatch) -> Option<&[&'a str]> {
        let (start, _) = self
            .headings
            .iter()
            .find(|(_, heading)| matching.matches(heading, name))?;
        let body_start = start + 1;
        let body_end = self.lines[body_start..]
            .iter()
            .position(|line| heading_name(line).is_some() || is_separator(line))
            .map_or(self.lines.len(), |p| body_start + p);
        Some(&self.lines[body_start..body_end])
    }

    pub(crate) fn separator_count(&self) -> usize {
        self.lines.iter().filter(|line| is_separator(line)).count()
    }

    pub(crate) fn word_count(&self) -> usize {
        self.lines.iter().map(|line| line.split_whitespace().count()).sum()
    }
}

fn read_frontmatter<'a>(lines: &[&'a str]) -> Frontmatter<'a> {
    if lines.first().map(|l| l.trim_end()) != Some(FENCE) {
        return Frontmatter::Missing;
    }
    let Some(close) = lines.iter().skip(1).position(|l| l.trim_end() == FENCE) else {
        return Frontmatter::Unclosed;
    };
    let entries = lines[1..=close]
        .iter()
        .copied()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim(), value.trim()))
        .filter(|(key, _)| !key.is_empty())
        .collect();
    Frontmatter::Present(entries)
}

fn heading_name(line: &str) -> Option<&str> {
    let name = line.strip_prefix(HEADING_PREFIX)?.trim();
    (!name.is_empty()).then_some(name)
}

fn is_separator(line: &str) -> bool {
    line.trim() == FENCE
}

/// The value of a `**field**:` marker within `lines`.
///
/// Returns `None` when the marker is absent. An empty same-line value falls
/// through to the next non-blank line, so block-style values such as
///
/// ```text
/// **Resurrection_Hook**:
/// > INGESTION: ...
/// ```
///
/// are found.
pub(crate) fn marker_value<'a>(lines: &[&'a str], field: &str) -> Option<&'a str> {
    let marker = format!("**{}**:", field);
    let (index, rest) = lines
        .iter()
        .enumerate()
        .find_map(|(index, &line)| line.find(&marker).map(|at| (index, &line[at + marker.len()..])))?;

    let rest = rest.trim();
    if !rest.is_empty() {
        return Some(rest);
    }
    let next = lines[index + 1..]
        .iter()
        .copied()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .filter(|line| !line.starts_with("**"));
    Some(next.unwrap_or(""))
}
