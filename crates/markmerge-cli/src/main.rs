//! markmerge CLI — grade OMR scans and build the mail-merge report.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "markmerge",
    version,
    about = "Grade OMR scans and build a mail-merge report"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Join the exports, grade every student and write the report
    Merge {
        /// Enrollment roster export
        #[arg(long)]
        roster: PathBuf,

        /// Gradebook export
        #[arg(long)]
        gradebook: PathBuf,

        /// OMR scan export
        #[arg(long)]
        scans: PathBuf,

        /// Answer keys (.json or .toml)
        #[arg(long)]
        answers: PathBuf,

        /// Mail-merge output path; other formats use the same stem
        #[arg(long, default_value = "output.csv")]
        output: PathBuf,

        /// Output format: csv, html, json, all (comma-separated)
        #[arg(long, default_value = "csv")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Fail when a scan's version has no answer key
        #[arg(long)]
        strict_versions: bool,
    },

    /// Validate answer keys and configuration
    Validate {
        /// Answer keys (.json or .toml)
        #[arg(long)]
        answers: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config and sample answer keys
    Init,
}

fn main() {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "markmerge=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Merge {
            roster,
            gradebook,
            scans,
            answers,
            output,
            format,
            config,
            strict_versions,
        } => commands::merge::execute(
            roster,
            gradebook,
            scans,
            answers,
            output,
            format,
            config,
            strict_versions,
        ),
        Commands::Validate { answers, config } => commands::validate::execute(answers, config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
