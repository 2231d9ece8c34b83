//! Schema registries: the rules for one protocol version, as data.
//!
//! A registry is deserialized from YAML or JSON. The builtin registries live
//! in `schemas/*.yaml` and are embedded at compile time; callers can load an
//! alternate registry to validate another protocol version with the same
//! evaluator.

mod builtin;

pub use builtin::Protocol;

use crate::error::{SchemaError, SchemaResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Finding severity. Registries only assign `error` or `warning`; `info`
/// is reserved for the validator's own notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warning,
    Info,
}

/// How a required section name is compared with `### ` heading text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionMatch {
    /// Heading text equals the name
    #[default]
    Exact,
    /// Heading text contains the name, ignoring case
    Contains,
}

impl SectionMatch {
    pub fn matches(self, heading: &str, name: &str) -> bool {
        match self {
            SectionMatch::Exact => heading == name,
            SectionMatch::Contains => heading.to_lowercase().contains(&name.to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrontmatterRequirement {
    pub name: String,
    /// Alternative keys that also satisfy the requirement
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionRequirement {
    pub name: String,
    /// Only required when the document's mode equals this value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

/// Inclusive token range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenBudget {
    pub min: usize,
    pub max: usize,
}

impl TokenBudget {
    pub fn contains(self, tokens: usize) -> bool {
        (self.min..=self.max).contains(&tokens)
    }
}

/// A presence or pattern check on one `**Field**:` marker or frontmatter key.
///
/// Without `pattern` the rule checks that the field is present. With a
/// pattern, the field's value must match it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldRule {
    pub field: String,
    /// Restrict the search to one section
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Check a frontmatter key instead of a field marker
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub frontmatter: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Replaces the generated finding message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Where a field rule looks for its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope<'a> {
    /// Anywhere in the document
    Global,
    Frontmatter,
    Section(&'a str),
}

impl FieldRule {
    pub fn scope(&self) -> RuleScope<'_> {
        match (&self.section, self.frontmatter) {
            (Some(section), _) => RuleScope::Section(section),
            (None, true) => RuleScope::Frontmatter,
            (None, false) => RuleScope::Global,
        }
    }

    pub fn applies_in(&self, mode: Option<&str>) -> bool {
        guard_allows(self.mode.as_deref(), mode)
    }
}

impl SectionRequirement {
    pub fn applies_in(&self, mode: Option<&str>) -> bool {
        guard_allows(self.mode.as_deref(), mode)
    }
}

fn guard_allows(guard: Option<&str>, mode: Option<&str>) -> bool {
    match guard {
        None => true,
        Some(guard) => mode == Some(guard),
    }
}

/// Lexical and layout heuristics. Every finding here is a warning.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Formatting {
    /// Flag `#`/`##` headings that start with an uppercase letter
    pub heading_levels: bool,
    /// Expect at least one `---` line per required section
    pub min_separators_from_sections: bool,
    pub vague_terms: Vec<String>,
    /// Section the vague-term scan is limited to; whole document if unset
    pub vague_scope: Option<String>,
    pub forbid_xml_tags: bool,
}

/// Structural checks on the section that closes an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClosingSection {
    pub name: String,
    #[serde(default)]
    pub min_words: usize,
    #[serde(default)]
    pub conclusive_terms: Vec<String>,
    /// Field whose value carries the hook; any line of the section if unset
    #[serde(default)]
    pub hook_field: Option<String>,
    pub hook_prefix: String,
}

/// The complete rule set for one protocol version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaRegistry {
    /// Display name, e.g. `USS v1.3`
    pub protocol: String,
    #[serde(default)]
    pub section_match: SectionMatch,
    #[serde(default)]
    pub required_frontmatter: Vec<FrontmatterRequirement>,
    #[serde(default)]
    pub required_sections: Vec<SectionRequirement>,
    #[serde(default)]
    pub field_rules: Vec<FieldRule>,
    #[serde(default)]
    pub token_budgets: IndexMap<String, TokenBudget>,
    #[serde(default)]
    pub formatting: Formatting,
    #[serde(default)]
    pub closing_section: Option<ClosingSection>,
}

/// One declarative rule, in the order the validator evaluates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaRule<'a> {
    FrontmatterFieldPresence(&'a FrontmatterRequirement),
    SectionPresence(&'a SectionRequirement),
    FieldPattern(&'a FieldRule),
    ModeBudget { mode: &'a str, budget: TokenBudget },
}

impl SchemaRegistry {
    pub fn from_yaml_str(source: &str) -> SchemaResult<Self> {
        let registry: SchemaRegistry = serde_yaml::from_str(source)?;
        registry.check()?;
        Ok(registry)
    }

    pub fn from_json_str(source: &str) -> SchemaResult<Self> {
        let registry: SchemaRegistry = serde_json::from_str(source)?;
        registry.check()?;
        Ok(registry)
    }

    /// The embedded registry for `protocol`.
    pub fn builtin(protocol: Protocol) -> &'static SchemaRegistry {
        builtin::registry(protocol)
    }

    /// Choose the builtin registry whose protocol the document declares.
    pub fn for_document(content: &str) -> &'static SchemaRegistry {
        Self::builtin(Protocol::detect(content))
    }

    /// All rules in evaluation order: frontmatter fields, sections, field
    /// rules, then mode budgets.
    pub fn rules(&self) -> Vec<SchemaRule<'_>> {
        let frontmatter = self
            .required_frontmatter
            .iter()
            .map(SchemaRule::FrontmatterFieldPresence);
        let sections = self.required_sections.iter().map(SchemaRule::SectionPresence);
        let fields = self.field_rules.iter().map(SchemaRule::FieldPattern);
        let budgets = self
            .token_budgets
            .iter()
            .map(|(mode, budget)| SchemaRule::ModeBudget {
                mode,
                budget: *budget,
            });
        frontmatter.chain(sections).chain(fields).chain(budgets).collect()
    }

    /// Required sections that apply for `mode`.
    pub fn sections_for_mode(&self, mode: Option<&str>) -> impl Iterator<Item = &SectionRequirement> {
        self.required_sections
            .iter()
            .filter(move |section| section.applies_in(mode))
    }

    /// Reject data that deserializes but cannot be evaluated.
    pub fn check(&self) -> SchemaResult<()> {
        for rule in &self.field_rules {
            if rule.section.is_some() && rule.frontmatter {
                return Err(SchemaError::InvalidRule {
                    field: rule.field.clone(),
                    message: "a rule cannot target both a section and the frontmatter".to_string(),
                });
            }
            if rule.field.trim().is_empty() {
                return Err(SchemaError::InvalidRule {
                    field: rule.field.clone(),
                    message: "field name is empty".to_string(),
                });
            }
        }
        for (mode, budget) in &self.token_budgets {
            if budget.min > budget.max {
                return Err(SchemaError::InvalidBudget {
                    mode: mode.clone(),
                    min: budget.min,
                    max: budget.max,
                });
            }
        }
        Ok(())
    }
}
