//! muss CLI - Main entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "muss")]
#[command(version)]
#[command(about = "Convert, validate and migrate USS/MUSS artifacts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an artifact between Markdown, JSON and YAML
    Convert {
        /// Input artifact
        input: PathBuf,

        /// Target format (markdown, json or yaml)
        #[arg(short = 't', long)]
        to: String,

        /// Input format, when neither the file name nor the content tells
        #[arg(short = 'f', long)]
        from: Option<String>,

        /// Write output to FILE (use '--output -' for stdout)
        #[arg(short = 'o', long)]
        output: Option<String>,
    },

    /// Check an artifact against its protocol's schema registry
    Validate {
        /// Artifact to validate
        file: PathBuf,

        /// Fail on warnings as well as errors
        #[arg(long)]
        strict: bool,

        /// Also print informational findings
        #[arg(short = 'v', long)]
        verbose: bool,

        /// Load the schema registry from a YAML or JSON file
        #[arg(long, conflicts_with = "protocol")]
        schema: Option<PathBuf>,

        /// Use a builtin registry (uss-1.3 or muss-1.0) instead of detecting it
        #[arg(long)]
        protocol: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rewrite a USS v1.3 artifact as MUSS v1.0
    Upgrade {
        /// USS artifact (Markdown)
        file: PathBuf,

        /// Write output to FILE (use '--output -' for stdout)
        #[arg(short = 'o', long)]
        output: Option<String>,

        /// Session stamp for the injected session_id (defaults to the timestamp)
        #[arg(long)]
        session_id: Option<String>,
    },

    /// Rewrite a MUSS v1.0 artifact as USS v1.3
    Downgrade {
        /// MUSS artifact (Markdown)
        file: PathBuf,

        /// Write output to FILE (use '--output -' for stdout)
        #[arg(short = 'o', long)]
        output: Option<String>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "muss=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            input,
            to,
            from,
            output,
        } => commands::convert::execute(commands::convert::ConvertArgs {
            input,
            to,
            from,
            output,
        }),
        Commands::Validate {
            file,
            strict,
            verbose,
            schema,
            protocol,
            json,
        } => {
            let passed = commands::validate::execute(commands::validate::ValidateArgs {
                file,
                strict,
                verbose,
                schema,
                protocol,
                json,
            })?;
            if !passed {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Upgrade {
            file,
            output,
            session_id,
        } => commands::migrate::upgrade(&file, output.as_deref(), session_id.as_deref()),
        Commands::Downgrade { file, output } => {
            commands::migrate::downgrade(&file, output.as_deref())
        }
    }
}
