//! Validation findings and the report that collects them.

use crate::schema::Severity;
use serde::Serialize;

/// What a single finding is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FindingKind {
    FrontmatterMissing,
    FrontmatterMalformed,
    FrontmatterFieldMissing { name: String, aliases: Vec<String> },
    ModeDetected { mode: String },

    SectionMissing { name: String, mode: Option<String> },
    SectionFound { name: String },

    FieldMissing { field: String, scope: String },
    FieldPatternMismatch { field: String, pattern: String },
    FieldRulesSkipped { section: String },

    MisleveledHeadings { count: usize },
    TooFewSeparators { found: usize, expected: usize },
    VagueLanguage { scope: String, term: String },
    XmlTags { tags: Vec<String> },

    TokenEstimate { tokens: usize, min: usize, max: usize },
    TokenBudgetBelow { tokens: usize, min: usize },
    TokenBudgetAbove { tokens: usize, max: usize },
    TokenBudgetWithin,
    TokenBudgetUnknownMode { mode: Option<String> },

    ClosingSectionSkipped { name: String },
    ClosingTooBrief { name: String, words: usize, min: usize },
    ClosingNotConclusive { name: String, terms: Vec<String> },
    HookMissing { name: String, field: Option<String>, prefix: String },
}

impl FindingKind {
    /// Stable code for this kind of finding. See `finding_catalog.json`.
    pub fn code(&self) -> &'static str {
        match self {
            FindingKind::FrontmatterMissing => "M-1-1",
            FindingKind::FrontmatterMalformed => "M-1-2",
            FindingKind::FrontmatterFieldMissing { .. } => "M-1-3",
            FindingKind::ModeDetected { .. } => "M-1-4",
            FindingKind::SectionMissing { .. } => "M-2-1",
            FindingKind::SectionFound { .. } => "M-2-2",
            FindingKind::FieldMissing { .. } => "M-3-1",
            FindingKind::FieldPatternMismatch { .. } => "M-3-2",
            FindingKind::FieldRulesSkipped { .. } => "M-3-3",
            FindingKind::MisleveledHeadings { .. } => "M-4-1",
            FindingKind::TooFewSeparators { .. } => "M-4-2",
            FindingKind::VagueLanguage { .. } => "M-4-3",
            FindingKind::XmlTags { .. } => "M-4-4",
            FindingKind::TokenEstimate { .. } => "M-5-1",
            FindingKind::TokenBudgetBelow { .. } => "M-5-2",
            FindingKind::TokenBudgetAbove { .. } => "M-5-3",
            FindingKind::TokenBudgetWithin => "M-5-4",
            FindingKind::TokenBudgetUnknownMode { .. } => "M-5-5",
            FindingKind::ClosingSectionSkipped { .. } => "M-6-1",
            FindingKind::ClosingTooBrief { .. } => "M-6-2",
            FindingKind::ClosingNotConclusive { .. } => "M-6-3",
            FindingKind::HookMissing { .. } => "M-6-4",
        }
    }

    /// Format a human-readable message from this finding kind
    pub fn message(&self) -> String {
        match self {
            FindingKind::FrontmatterMissing => "Missing YAML frontmatter at start of document".to_string(),
            FindingKind::FrontmatterMalformed => {
                "Malformed YAML frontmatter (no closing '---')".to_string()
            }
            FindingKind::FrontmatterFieldMissing { name, aliases } => {
                if aliases.is_empty() {
                    format!("Missing '{}' field in frontmatter", name)
                } else {
                    let alternatives: Vec<String> = aliases.iter().map(|a| format!("'{}'", a)).collect();
                    format!(
                        "Missing '{}' or {} field in frontmatter",
                        name,
                        alternatives.join(" or ")
                    )
                }
            }
            FindingKind::ModeDetected { mode } => format!("Detected mode: {}", mode),
            FindingKind::SectionMissing { name, mode: None } => {
                format!("Missing required section: {}", name)
            }
            FindingKind::SectionMissing {
                name,
                mode: Some(mode),
            } => format!("Missing required section for {} mode: {}", mode, name),
            FindingKind::SectionFound { name } => format!("Found section: {}", name),
            FindingKind::FieldMissing { field, scope } => {
                format!("Missing required {} field: {}", scope, field)
            }
            FindingKind::FieldPatternMismatch { field, pattern } => {
                format!("Field '{}' is missing or does not match '{}'", field, pattern)
            }
            FindingKind::FieldRulesSkipped { section } => {
                format!("Skipped field checks for missing section: {}", section)
            }
            FindingKind::MisleveledHeadings { count } => {
                format!("Found {} headers not using ### format", count)
            }
            FindingKind::TooFewSeparators { found, expected } => format!(
                "Fewer section separators than required sections ({} < {}); expected at least one '---' between major sections",
                found, expected
            ),
            FindingKind::VagueLanguage { scope, term } => {
                format!("Potentially vague language in {}: '{}'", scope, term)
            }
            FindingKind::XmlTags { tags } => format!(
                "XML tags detected in artifact (should be Markdown only): {}",
                tags.join(", ")
            ),
            FindingKind::TokenEstimate { tokens, min, max } => {
                format!("Estimated tokens: {} (target: {}-{})", tokens, min, max)
            }
            FindingKind::TokenBudgetBelow { tokens, min } => {
                format!("Token count below target ({} < {})", tokens, min)
            }
            FindingKind::TokenBudgetAbove { tokens, max } => {
                format!("Token count exceeds target ({} > {})", tokens, max)
            }
            FindingKind::TokenBudgetWithin => "Token count within budget".to_string(),
            FindingKind::TokenBudgetUnknownMode { mode: None } => {
                "Cannot validate token budget (no mode declared)".to_string()
            }
            FindingKind::TokenBudgetUnknownMode { mode: Some(mode) } => {
                format!("Cannot validate token budget (unsupported mode '{}')", mode)
            }
            FindingKind::ClosingSectionSkipped { name } => {
                format!("Section {} not found; closing checks skipped", name)
            }
            FindingKind::ClosingTooBrief { name, words, min } => format!(
                "{} seems too brief ({} words, expected at least {})",
                name, words, min
            ),
            FindingKind::ClosingNotConclusive { name, terms } => format!(
                "{} lacks conclusive language (e.g., {})",
                name,
                terms
                    .iter()
                    .map(|t| format!("'{}'", t))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            FindingKind::HookMissing {
                name,
                field: Some(field),
                prefix,
            } => format!(
                "{}: Missing or improperly formatted {}. Must begin with '{}'.",
                name, field, prefix
            ),
            FindingKind::HookMissing {
                name,
                field: None,
                prefix,
            } => format!("{}: Missing a line beginning with '{}'.", name, prefix),
        }
    }
}

/// One diagnostic, as it appears in a [`Report`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
}

/// The complete outcome of validating one document.
///
/// `errors`, `warnings` and `info` hold the messages of `findings` split by
/// severity, each in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub protocol: String,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub info: Vec<String>,
    pub findings: Vec<Finding>,
    pub passed: bool,
}

impl Report {
    pub(crate) fn from_findings(protocol: &str, findings: Vec<Finding>, strict: bool) -> Self {
        let bucket = |severity: Severity| -> Vec<String> {
            findings
                .iter()
                .filter(|f| f.severity == severity)
                .map(|f| f.message.clone())
                .collect()
        };
        let errors = bucket(Severity::Error);
        let warnings = bucket(Severity::Warning);
        let info = bucket(Severity::Info);
        let passed = errors.is_empty() && (!strict || warnings.is_empty());
        Report {
            protocol: protocol.to_string(),
            errors,
            warnings,
            info,
            findings,
            passed,
        }
    }

    /// Findings of one severity.
    pub fn findings_with(&self, severity: Severity) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.severity == severity)
    }
}
