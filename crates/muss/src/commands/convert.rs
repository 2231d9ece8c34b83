//! Convert command implementation

use anyhow::{Context, Result, anyhow, bail};
use muss_document::{Format, detect_format, parse, render};
use std::path::PathBuf;
use tracing::{debug, warn};

use super::{read_input, write_output};

/// Arguments for the convert command
#[derive(Debug)]
pub struct ConvertArgs {
    pub input: PathBuf,
    /// Target format name
    pub to: String,
    /// Input format name, overriding detection
    pub from: Option<String>,
    pub output: Option<String>,
}

/// Execute the convert command
pub fn execute(args: ConvertArgs) -> Result<()> {
    let target: Format = args.to.parse()?;
    let content = read_input(&args.input)?;

    let source = match args.from.as_deref() {
        Some(name) => name.parse::<Format>().map_err(|_| {
            anyhow!("Unknown input format: '{}' (expected markdown, json or yaml)", name)
        })?,
        None => detect_format(&content, Some(&args.input.to_string_lossy()))
            .with_context(|| format!("Cannot convert {}", args.input.display()))?,
    };
    debug!(%source, %target, input = %args.input.display(), "converting");

    let outcome = parse(&content, source)
        .with_context(|| format!("Failed to parse {} as {}", args.input.display(), source))?;
    for skipped in &outcome.skipped {
        warn!(
            "{}:{}: skipped line ({})",
            args.input.display(),
            skipped.line,
            skipped.reason
        );
    }
    if outcome.document.is_empty() {
        warn!("{}: no frontmatter or sections found", args.input.display());
    }

    let default = args.input.with_extension(target.extension());
    if args.output.is_none() && default == args.input {
        bail!(
            "{} is already {}; pass --output to write elsewhere",
            args.input.display(),
            target
        );
    }
    write_output(args.output.as_deref(), default, &render(&outcome.document, target))
}
