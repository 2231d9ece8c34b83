//! Validate command implementation

use anyhow::{Context, Result, anyhow};
use muss_validation::{Finding, Protocol, Report, SchemaRegistry, Severity, Validator, get_title};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::read_input;

/// Arguments for the validate command
#[derive(Debug)]
pub struct ValidateArgs {
    pub file: PathBuf,
    pub strict: bool,
    /// Include info findings in text output
    pub verbose: bool,
    /// Registry file replacing the builtin registries
    pub schema: Option<PathBuf>,
    /// Builtin registry id, overriding detection
    pub protocol: Option<String>,
    pub json: bool,
}

/// Execute the validate command. Returns whether the artifact passed.
pub fn execute(args: ValidateArgs) -> Result<bool> {
    let content = read_input(&args.file)?;

    let custom;
    let validator = match (&args.schema, &args.protocol) {
        (Some(path), _) => {
            custom = load_validator(path)?;
            &custom
        }
        (None, Some(id)) => {
            let protocol = Protocol::from_id(id).ok_or_else(|| {
                let known: Vec<&str> = Protocol::ALL.iter().map(|p| p.id()).collect();
                anyhow!("Unknown protocol '{}' (expected {})", id, known.join(" or "))
            })?;
            Validator::builtin(protocol)
        }
        (None, None) => Validator::for_document(&content),
    };
    debug!(
        protocol = %validator.registry().protocol,
        file = %args.file.display(),
        "validating"
    );

    let report = validator.validate(&content, args.strict);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", format_report(&args.file, &report, args.verbose));
    }
    Ok(report.passed)
}

fn load_validator(path: &Path) -> Result<Validator> {
    let source = read_input(path)?;
    let registry = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => SchemaRegistry::from_json_str(&source),
        _ => SchemaRegistry::from_yaml_str(&source),
    }
    .with_context(|| format!("Invalid schema registry {}", path.display()))?;
    Validator::new(registry).with_context(|| format!("Invalid schema registry {}", path.display()))
}

fn format_report(file: &Path, report: &Report, verbose: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}: {}", file.display(), report.protocol);

    let mut shown: Vec<&Finding> = report
        .findings_with(Severity::Error)
        .chain(report.findings_with(Severity::Warning))
        .collect();
    if verbose {
        shown.extend(report.findings_with(Severity::Info));
    }
    let mut codes: Vec<&str> = shown.iter().map(|finding| finding.code).collect();
    for finding in shown {
        let label = match finding.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        let _ = writeln!(out, "  {}[{}]: {}", label, finding.code, finding.message);
    }

    if verbose && !codes.is_empty() {
        codes.sort_unstable();
        codes.dedup();
        let _ = writeln!(out, "Codes:");
        for code in codes {
            if let Some(title) = get_title(code) {
                let _ = writeln!(out, "  {}: {}", code, title);
            }
        }
    }

    let status = if report.passed { "PASSED" } else { "FAILED" };
    let _ = writeln!(
        out,
        "{} ({} errors, {} warnings)",
        status,
        report.errors.len(),
        report.warnings.len()
    );
    out
}
