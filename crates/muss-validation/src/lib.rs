//! Compliance validation for USS/MUSS artifacts.
//!
//! Rules are data. A [`SchemaRegistry`] lists the required frontmatter keys,
//! required sections, field rules, per-mode token budgets and the layout
//! heuristics for one protocol version. A [`Validator`] evaluates any
//! registry against raw artifact text, so documents the converter could not
//! fully structure are still checked.
//!
//! # Example
//!
//! ```
//! let text = "---\nmode: checkpoint\n---\n### HEADER (THREAD LOCK & AUDIT)\n**Thread_Archetype**: test\n";
//! let report = muss_validation::validate(text, false);
//! assert!(!report.passed);
//! assert!(report.errors.contains(&"Missing required section: INVOCATION LOCK".to_string()));
//! ```
//!
//! Validation never fails at the call level. Every problem is a
//! [`Finding`] in the returned [`Report`].

pub mod catalog;
pub mod error;
pub mod report;
mod scan;
pub mod schema;
pub mod validator;

pub use catalog::{FindingCodeInfo, get_code_info, get_title};
pub use error::{SchemaError, SchemaResult};
pub use report::{Finding, FindingKind, Report};
pub use schema::{
    ClosingSection, FieldRule, Formatting, FrontmatterRequirement, Protocol, RuleScope,
    SchemaRegistry, SchemaRule, SectionMatch, SectionRequirement, Severity, TokenBudget,
};
pub use validator::{Validator, estimate_tokens, validate};
