// Artifact validation engine

use crate::error::{SchemaError, SchemaResult};
use crate::report::{Finding, FindingKind, Report};
use crate::scan::{Frontmatter, Scan, marker_value};
use crate::schema::{
    ClosingSection, FieldRule, FrontmatterRequirement, Protocol, RuleScope, SchemaRegistry,
    SchemaRule, SectionRequirement, Severity, TokenBudget,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

static MISLEVELED_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#{1,2}\s+[A-Z]").unwrap());
static XML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[A-Za-z_][A-Za-z0-9_]*[^>]*>").unwrap());

const MAX_REPORTED_TAGS: usize = 5;

static USS_1_3: Lazy<Validator> = Lazy::new(|| {
    Validator::new(SchemaRegistry::builtin(Protocol::Uss13).clone())
        .expect("Invalid builtin USS v1.3 patterns - this is a bug")
});

static MUSS_1_0: Lazy<Validator> = Lazy::new(|| {
    Validator::new(SchemaRegistry::builtin(Protocol::Muss10).clone())
        .expect("Invalid builtin MUSS v1.0 patterns - this is a bug")
});

/// Validate an artifact against the builtin registry of the protocol it
/// declares.
pub fn validate(text: &str, strict: bool) -> Report {
    Validator::for_document(text).validate(text, strict)
}

/// Estimated token count for `words` whitespace-separated words: the word
/// count times 1.3, rounded half up.
pub fn estimate_tokens(words: usize) -> usize {
    (words * 13 + 5) / 10
}

/// One generic evaluator over a registry's rules, with field patterns
/// compiled up front.
#[derive(Debug)]
pub struct Validator {
    registry: SchemaRegistry,
    patterns: HashMap<String, Regex>,
}

impl Validator {
    pub fn new(registry: SchemaRegistry) -> SchemaResult<Self> {
        registry.check()?;
        let mut patterns = HashMap::new();
        for rule in &registry.field_rules {
            let Some(pattern) = &rule.pattern else {
                continue;
            };
            if patterns.contains_key(pattern) {
                continue;
            }
            let regex = Regex::new(pattern).map_err(|source| SchemaError::InvalidPattern {
                field: rule.field.clone(),
                source,
            })?;
            patterns.insert(pattern.clone(), regex);
        }
        Ok(Validator { registry, patterns })
    }

    pub fn builtin(protocol: Protocol) -> &'static Validator {
        match protocol {
            Protocol::Uss13 => &USS_1_3,
            Protocol::Muss10 => &MUSS_1_0,
        }
    }

    /// The builtin validator for the protocol `text` declares.
    pub fn for_document(text: &str) -> &'static Validator {
        Self::builtin(Protocol::detect(text))
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Run every rule against `text`. Never fails: problems are findings.
    pub fn validate(&self, text: &str, strict: bool) -> Report {
        let scan = Scan::new(text);
        let mut context = ValidationContext::new(self, &scan);

        context.check_frontmatter_block();

        let rules = self.registry.rules();
        let (frontmatter_rules, other_rules): (Vec<_>, Vec<_>) = rules
            .into_iter()
            .partition(|rule| matches!(rule, SchemaRule::FrontmatterFieldPresence(_)));
        for rule in frontmatter_rules {
            context.check_rule(rule);
        }
        if let Some(mode) = context.mode {
            context.add(
                Severity::Info,
                FindingKind::ModeDetected {
                    mode: mode.to_string(),
                },
            );
        }
        for rule in other_rules {
            context.check_rule(rule);
        }

        context.check_formatting(text);
        context.check_token_budget();
        if let Some(closing) = &self.registry.closing_section {
            context.check_closing_section(closing);
        }

        debug!(
            protocol = %self.registry.protocol,
            findings = context.findings.len(),
            "validated artifact"
        );
        Report::from_findings(&self.registry.protocol, context.findings, strict)
    }
}

/// How an estimate compares with a budget.
pub(crate) fn budget_findings(tokens: usize, budget: TokenBudget) -> (Severity, FindingKind) {
    if tokens < budget.min {
        (
            Severity::Warning,
            FindingKind::TokenBudgetBelow {
                tokens,
                min: budget.min,
            },
        )
    } else if tokens > budget.max {
        (
            Severity::Warning,
            FindingKind::TokenBudgetAbove {
                tokens,
                max: budget.max,
            },
        )
    } else {
        (Severity::Info, FindingKind::TokenBudgetWithin)
    }
}

/// Validation context collects findings while the rules run
struct ValidationContext<'a> {
    validator: &'a Validator,
    scan: &'a Scan<'a>,
    /// The declared mode, if any
    mode: Option<&'a str>,
    /// Sections whose field rules were already reported as skipped
    skipped_sections: HashSet<&'a str>,
    findings: Vec<Finding>,
}

impl<'a> ValidationContext<'a> {
    fn new(validator: &'a Validator, scan: &'a Scan<'a>) -> Self {
        Self {
            validator,
            scan,
            mode: scan.frontmatter.mode(),
            skipped_sections: HashSet::new(),
            findings: Vec::new(),
        }
    }

    fn registry(&self) -> &'a SchemaRegistry {
        &self.validator.registry
    }

    fn add(&mut self, severity: Severity, kind: FindingKind) {
        self.add_with_message(severity, kind, None);
    }

    /// Record a finding, replacing the generated message when the rule
    /// carries its own.
    fn add_with_message(&mut self, severity: Severity, kind: FindingKind, message: Option<&str>) {
        let message = message.map_or_else(|| kind.message(), str::to_string);
        trace!(code = kind.code(), ?severity, %message, "finding");
        self.findings.push(Finding {
            severity,
            code: kind.code(),
            message,
        });
    }

    fn check_frontmatter_block(&mut self) {
        match self.scan.frontmatter {
            Frontmatter::Missing => self.add(Severity::Error, FindingKind::FrontmatterMissing),
            Frontmatter::Unclosed => self.add(Severity::Error, FindingKind::FrontmatterMalformed),
            Frontmatter::Present(_) => {}
        }
    }

    fn check_rule(&mut self, rule: SchemaRule<'a>) {
        match rule {
            SchemaRule::FrontmatterFieldPresence(requirement) => {
                self.check_frontmatter_field(requirement)
            }
            SchemaRule::SectionPresence(requirement) => self.check_section(requirement),
            SchemaRule::FieldPattern(rule) => self.check_field_rule(rule),
            // Budgets are evaluated after the formatting heuristics
            SchemaRule::ModeBudget { .. } => {}
        }
    }

    fn check_frontmatter_field(&mut self, requirement: &FrontmatterRequirement) {
        // Without a block there is nothing to look up; the block finding covers it
        if !matches!(self.scan.frontmatter, Frontmatter::Present(_)) {
            return;
        }
        let present = std::iter::once(&requirement.name)
            .chain(&requirement.aliases)
            .any(|key| self.scan.frontmatter.get(key).is_some());
        if !present {
            self.add(
                requirement.severity,
                FindingKind::FrontmatterFieldMissing {
                    name: requirement.name.clone(),
                    aliases: requirement.aliases.clone(),
                },
            );
        }
    }

    fn check_section(&mut self, requirement: &SectionRequirement) {
        if !requirement.applies_in(self.mode) {
            return;
        }
        let matching = self.registry().section_match;
        if self.scan.has_section(&requirement.name, matching) {
            self.add(
                Severity::Info,
                FindingKind::SectionFound {
                    name: requirement.name.clone(),
                },
            );
        } else {
            self.add(
                Severity::Error,
                FindingKind::SectionMissing {
                    name: requirement.name.clone(),
                    mode: requirement.mode.clone(),
                },
            );
        }
    }

    fn check_field_rule(&mut self, rule: &'a FieldRule) {
        if !rule.applies_in(self.mode) {
            return;
        }
        let scan = self.scan;
        let (value, scope) = match rule.scope() {
            RuleScope::Section(section) => {
                let Some(lines) = scan.section(section, self.registry().section_match) else {
                    if self.skipped_sections.insert(section) {
                        self.add(
                            Severity::Info,
                            FindingKind::FieldRulesSkipped {
                                section: section.to_string(),
                            },
                        );
                    }
                    return;
                };
                (marker_value(lines, &rule.field), section)
            }
            RuleScope::Global => (marker_value(&scan.lines, &rule.field), "document"),
            RuleScope::Frontmatter => (scan.frontmatter.get(&rule.field), "frontmatter"),
        };

        match &rule.pattern {
            None => {
                if value.is_none() {
                    self.add_with_message(
                        rule.severity,
                        FindingKind::FieldMissing {
                            field: rule.field.clone(),
                            scope: scope.to_string(),
                        },
                        rule.message.as_deref(),
                    );
                }
            }
            Some(pattern) => {
                let regex = self.validator.patterns.get(pattern);
                let matches = value.is_some_and(|v| regex.is_some_and(|re| re.is_match(v)));
                if !matches {
                    self.add_with_message(
                        rule.severity,
                        FindingKind::FieldPatternMismatch {
                            field: rule.field.clone(),
                            pattern: pattern.clone(),
                        },
                        rule.message.as_deref(),
                    );
                }
            }
        }
    }

    fn check_formatting(&mut self, text: &str) {
        let formatting = &self.registry().formatting;
        let scan = self.scan;

        if formatting.heading_levels {
            let count = scan
                .lines
                .iter()
                .filter(|line| MISLEVELED_HEADING.is_match(line))
                .count();
            if count > 0 {
                self.add(Severity::Warning, FindingKind::MisleveledHeadings { count });
            }
        }

        if formatting.min_separators_from_sections {
            let expected = self.registry().sections_for_mode(self.mode).count();
            let found = scan.separator_count();
            if found < expected {
                self.add(
                    Severity::Warning,
                    FindingKind::TooFewSeparators { found, expected },
                );
            }
        }

        if !formatting.vague_terms.is_empty() {
            let scoped = match &formatting.vague_scope {
                Some(section) => scan
                    .section(section, self.registry().section_match)
                    .map(|lines| (section.as_str(), lines.join("\n"))),
                None => Some(("document", text.to_string())),
            };
            if let Some((scope, body)) = scoped {
                let body = body.to_lowercase();
                for term in &formatting.vague_terms {
                    if body.contains(&term.to_lowercase()) {
                        self.add(
                            Severity::Warning,
                            FindingKind::VagueLanguage {
                                scope: scope.to_string(),
                                term: term.clone(),
                            },
                        );
                    }
                }
            }
        }

        if formatting.forbid_xml_tags {
            let mut tags: Vec<String> = Vec::new();
            for tag in XML_TAG.find_iter(text).map(|m| m.as_str()) {
                if tags.len() == MAX_REPORTED_TAGS {
                    break;
                }
                if !tags.iter().any(|seen| seen == tag) {
                    tags.push(tag.to_string());
                }
            }
            if !tags.is_empty() {
                self.add(Severity::Warning, FindingKind::XmlTags { tags });
            }
        }
    }

    fn check_token_budget(&mut self) {
        let budgets = &self.registry().token_budgets;
        if budgets.is_empty() {
            return;
        }
        let Some(budget) = self.mode.and_then(|mode| budgets.get(mode)).copied() else {
            self.add(
                Severity::Warning,
                FindingKind::TokenBudgetUnknownMode {
                    mode: self.mode.map(str::to_string),
                },
            );
            return;
        };

        let tokens = estimate_tokens(self.scan.word_count());
        self.add(
            Severity::Info,
            FindingKind::TokenEstimate {
                tokens,
                min: budget.min,
                max: budget.max,
            },
        );
        let (severity, kind) = budget_findings(tokens, budget);
        self.add(severity, kind);
    }

    fn check_closing_section(&mut self, closing: &ClosingSection) {
        let scan = self.scan;
        let Some(lines) = scan.section(&closing.name, self.registry().section_match) else {
            self.add(
                Severity::Info,
                FindingKind::ClosingSectionSkipped {
                    name: closing.name.clone(),
                },
            );
            return;
        };

        let words: usize = lines.iter().map(|line| line.split_whitespace().count()).sum();
        if words < closing.min_words {
            self.add(
                Severity::Warning,
                FindingKind::ClosingTooBrief {
                    name: closing.name.clone(),
                    words,
                    min: closing.min_words,
                },
            );
        }

        if !closing.conclusive_terms.is_empty() {
            let body = lines.join("\n").to_lowercase();
            let conclusive = closing
                .conclusive_terms
                .iter()
                .any(|term| body.contains(&term.to_lowercase()));
            if !conclusive {
                self.add(
                    Severity::Warning,
                    FindingKind::ClosingNotConclusive {
                        name: closing.name.clone(),
                        terms: closing.conclusive_terms.clone(),
                    },
                );
            }
        }

        let prefix = closing.hook_prefix.as_str();
        let hooked = match &closing.hook_field {
            Some(field) => marker_value(lines, field).is_some_and(|value| value.starts_with(prefix)),
            None => lines.iter().any(|line| line.trim_start().starts_with(prefix)),
        };
        if !hooked {
            self.add(
                Severity::Error,
                FindingKind::HookMissing {
                    name: closing.name.clone(),
                    field: closing.hook_field.clone(),
                    prefix: closing.hook_prefix.clone(),
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    // Evaluated against a small registry, independent of the builtin tables
    use super::*;

    const REGISTRY: &str = r#"
protocol: Test v0
required_frontmatter:
  - name: mode
  - name: protocol_version
    aliases: [version]
    severity: warning
required_sections:
  - name: INTRO
  - name: CLOSE
  - name: APPENDIX
    mode: archive
field_rules:
  - field: Score
    section: INTRO
    pattern: '^0\.\d+$'
  - field: Owner
    section: INTRO
  - field: Digest
    severity: warning
  - field: protocol_version
    frontmatter: true
    pattern: '^1\.0$'
    severity: warning
    message: "Protocol version is not 1.0"
token_budgets:
  checkpoint: {min: 10, max: 60}
formatting:
  heading_levels: true
  min_separators_from_sections: true
  vague_terms: [maybe, perhaps]
  vague_scope: INTRO
  forbid_xml_tags: true
closing_section:
  name: CLOSE
  min_words: 5
  conclusive_terms: [sealed]
  hook_field: Hook
  hook_prefix: "> GO:"
"#;

    const VALID: &str = "---\nmode: checkpoint\nprotocol_version: 1.0\n---\n\n### INTRO\n\n**Score**: 0.9\n**Owner**: me\n**Digest**: short\n\n---\n\n### CLOSE\n\nThis artifact is sealed now.\n\n**Hook**:\n> GO: resume\n";

    const INTRO_BLOCK: &str =
        "### INTRO\n\n**Score**: 0.9\n**Owner**: me\n**Digest**: short\n\n---\n\n";

    fn validator() -> Validator {
        Validator::new(SchemaRegistry::from_yaml_str(REGISTRY).unwrap()).unwrap()
    }

    fn check(text: &str) -> Report {
        validator().validate(text, false)
    }

    fn codes(report: &Report, severity: Severity) -> Vec<&'static str> {
        report.findings_with(severity).map(|f| f.code).collect()
    }

    #[test]
    fn test_valid_document_passes() {
        let report = check(VALID);
        assert!(report.passed, "{:?}", report);
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
        assert_eq!(report.protocol, "Test v0");
        assert_eq!(
            codes(&report, Severity::Info),
            vec!["M-1-4", "M-2-2", "M-2-2", "M-5-1", "M-5-4"]
        );
        assert_eq!(report.info[0], "Detected mode: checkpoint");
    }

    #[test]
    fn test_missing_frontmatter() {
        let text = VALID.replace("---\nmode: checkpoint\nprotocol_version: 1.0\n---\n\n", "");
        let report = check(&text);
        assert_eq!(report.errors, vec!["Missing YAML frontmatter at start of document"]);
        // Per-key presence checks are not repeated for a missing block
        assert!(codes(&report, Severity::Warning).iter().all(|code| *code != "M-1-3"));
        assert!(report.warnings.contains(&"Protocol version is not 1.0".to_string()));
        assert!(
            report
                .warnings
                .contains(&"Cannot validate token budget (no mode declared)".to_string())
        );
    }

    #[test]
    fn test_unclosed_frontmatter() {
        let report = check("---\nmode: checkpoint\n### INTRO\n");
        assert_eq!(report.errors[0], "Malformed YAML frontmatter (no closing '---')");
        // No mode can be read from an unclosed block
        assert!(codes(&report, Severity::Info).iter().all(|code| *code != "M-1-4"));
    }

    #[test]
    fn test_frontmatter_aliases() {
        let report = check(&VALID.replace("protocol_version: 1.0", "version: 1.0"));
        // The alias satisfies presence but not the frontmatter field rule
        assert_eq!(report.warnings, vec!["Protocol version is not 1.0"]);

        let report = check(&VALID.replace("protocol_version: 1.0\n", ""));
        assert_eq!(
            report.warnings[0],
            "Missing 'protocol_version' or 'version' field in frontmatter"
        );
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_mode_gated_section() {
        let report = check(&VALID.replace("mode: checkpoint", "mode: archive"));
        assert_eq!(
            report.errors,
            vec!["Missing required section for archive mode: APPENDIX"]
        );
        assert!(
            report
                .warnings
                .contains(&"Cannot validate token budget (unsupported mode 'archive')".to_string())
        );
    }

    #[test]
    fn test_missing_section_skips_its_field_rules_once() {
        let report = check(&VALID.replace(INTRO_BLOCK, ""));
        assert_eq!(report.errors, vec!["Missing required section: INTRO"]);
        let skipped: Vec<_> = report.findings.iter().filter(|f| f.code == "M-3-3").collect();
        assert_eq!(skipped.len(), 1);
        assert_eq!(
            skipped[0].message,
            "Skipped field checks for missing section: INTRO"
        );
        // Global rules still run
        assert_eq!(report.warnings, vec!["Missing required document field: Digest"]);
    }

    #[test]
    fn test_field_pattern_mismatch() {
        let report = check(&VALID.replace("**Score**: 0.9", "**Score**: 1.5"));
        assert_eq!(
            report.errors,
            vec![r"Field 'Score' is missing or does not match '^0\.\d+$'"]
        );

        let report = check(&VALID.replace("**Owner**: me\n", ""));
        assert_eq!(report.errors, vec!["Missing required INTRO field: Owner"]);
    }

    #[test]
    fn test_formatting_heuristics() {
        let text = VALID.replace(
            "**Digest**: short\n",
            "**Digest**: short\n# Big Title\n## Another\n<note>x</note> <note> <b>\nmaybe\n",
        );
        let report = check(&text);
        assert_eq!(
            report.warnings,
            vec![
                "Found 2 headers not using ### format",
                "Potentially vague language in INTRO: 'maybe'",
                "XML tags detected in artifact (should be Markdown only): <note>, <b>",
            ]
        );
        assert!(report.passed);
        assert!(!validator().validate(&text, true).passed);
    }

    #[test]
    fn test_vague_terms_outside_scope_are_ignored() {
        let report = check(&VALID.replace("This artifact", "Perhaps this artifact"));
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }

    #[test]
    fn test_xml_tags_are_capped() {
        let text = VALID.replace(
            "**Digest**: short\n",
            "**Digest**: short\n<a1> <a2> <a3> <a4> <a5> <a6> <a7>\n",
        );
        let report = check(&text);
        let xml: Vec<_> = report.findings.iter().filter(|f| f.code == "M-4-4").collect();
        assert_eq!(xml.len(), 1);
        assert!(xml[0].message.ends_with("<a1>, <a2>, <a3>, <a4>, <a5>"));
    }

    #[test]
    fn test_too_few_separators() {
        let joined = VALID.replace("\n---\n\n### CLOSE", "\n### CLOSE");
        // Two fences still cover two required sections
        assert!(check(&joined).warnings.is_empty());

        let report = check(&joined.replace("mode: checkpoint", "mode: archive"));
        assert!(report.warnings.contains(
            &"Fewer section separators than required sections (2 < 3); expected at least one '---' between major sections"
                .to_string()
        ));
    }

    #[test]
    fn test_token_budget_boundaries() {
        let budget = TokenBudget { min: 800, max: 1200 };
        assert_eq!(budget_findings(800, budget).0, Severity::Info);
        assert_eq!(budget_findings(1200, budget).0, Severity::Info);

        let (severity, kind) = budget_findings(799, budget);
        assert_eq!(severity, Severity::Warning);
        assert_eq!(kind.message(), "Token count below target (799 < 800)");

        let (severity, kind) = budget_findings(1201, budget);
        assert_eq!(severity, Severity::Warning);
        assert_eq!(kind.message(), "Token count exceeds target (1201 > 1200)");

        assert_eq!(estimate_tokens(615), 800);
        assert_eq!(estimate_tokens(614), 798);
        assert_eq!(estimate_tokens(0), 0);
        assert_eq!(estimate_tokens(5), 7);
    }

    #[test]
    fn test_closing_section_checks() {
        let text = VALID.replace(
            "This artifact is sealed now.\n\n**Hook**:\n> GO: resume\n",
            "Done.\n\n**Hook**: resume later\n",
        );
        let report = check(&text);
        assert_eq!(
            report.errors,
            vec!["CLOSE: Missing or improperly formatted Hook. Must begin with '> GO:'."]
        );
        assert_eq!(
            report.warnings,
            vec![
                "CLOSE seems too brief (4 words, expected at least 5)",
                "CLOSE lacks conclusive language (e.g., 'sealed')",
            ]
        );
    }

    #[test]
    fn test_hook_on_marker_line() {
        let text = VALID.replace("**Hook**:\n> GO: resume", "**Hook**: > GO: resume");
        assert!(check(&text).passed);
    }

    #[test]
    fn test_missing_closing_section_is_skipped() {
        let text = VALID.replace("\n---\n\n### CLOSE\n\nThis artifact is sealed now.\n\n**Hook**:\n> GO: resume\n", "\n");
        let report = check(&text);
        assert_eq!(report.errors, vec!["Missing required section: CLOSE"]);
        assert!(
            report
                .info
                .contains(&"Section CLOSE not found; closing checks skipped".to_string())
        );
    }

    #[test]
    fn test_every_rule_runs_after_failures() {
        let report = check("no frontmatter, no sections\n");
        assert_eq!(
            codes(&report, Severity::Error),
            vec!["M-1-1", "M-2-1", "M-2-1"]
        );
        assert!(codes(&report, Severity::Info).contains(&"M-6-1"));
        assert!(codes(&report, Severity::Warning).contains(&"M-5-5"));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let source = "protocol: X\nfield_rules:\n  - field: Broken\n    pattern: '('\n";
        let registry = SchemaRegistry::from_yaml_str(source).unwrap();
        match Validator::new(registry) {
            Err(SchemaError::InvalidPattern { field, .. }) => assert_eq!(field, "Broken"),
            other => panic!("expected an invalid pattern, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_registry_reports_nothing() {
        let registry = SchemaRegistry::from_yaml_str("protocol: Empty\n").unwrap();
        let report = Validator::new(registry).unwrap().validate("anything\n", true);
        // Only the frontmatter block check is unconditional
        assert_eq!(report.errors, vec!["Missing YAML frontmatter at start of document"]);
        assert!(report.warnings.is_empty());
        assert!(report.info.is_empty());
    }
}
