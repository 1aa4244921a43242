//! The `markmerge merge` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use markmerge_core::answer_key::{load_answer_keys, validate_answer_keys, AnswerKeyStore};
use markmerge_core::config::load_config_from;
use markmerge_core::pipeline::{run_merge, MergeInputs};
use markmerge_core::statistics::RunSummary;
use markmerge_report::html::write_html_report;
use markmerge_report::json::MergeReport;
use markmerge_report::mail_merge::{write_mail_merge, MailMergeLayout};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Csv,
    Html,
    Json,
}

#[allow(clippy::too_many_arguments)]
pub fn execute(
    roster_path: PathBuf,
    gradebook_path: PathBuf,
    scans_path: PathBuf,
    answers_path: PathBuf,
    output: PathBuf,
    format: String,
    config_path: Option<PathBuf>,
    strict_versions: bool,
) -> Result<()> {
    let outputs = output_paths(&output, &parse_formats(&format)?)?;

    let mut config = load_config_from(config_path.as_deref())?;
    if strict_versions {
        config.strict_versions = true;
    }

    tracing::debug!(answers = %answers_path.display(), "loading answer keys");
    let keys = load_answer_keys(&answers_path)?;
    for w in validate_answer_keys(&keys) {
        eprintln!("Warning: {}{}", super::validate::location(&w), w.message);
    }
    let store = AnswerKeyStore::new(keys)
        .with_context(|| format!("invalid answer keys in {}", answers_path.display()))?;

    let roster = read_export(&roster_path, "roster")?;
    let gradebook = read_export(&gradebook_path, "gradebook")?;
    let scans = read_export(&scans_path, "scan")?;
    let inputs = MergeInputs {
        roster: &roster,
        gradebook: &gradebook,
        scans: &scans,
    };

    let outcome = run_merge(&inputs, &store, &config)?;
    for warning in &outcome.warnings {
        eprintln!("Warning: {warning}");
    }

    let report = MergeReport::new(&outcome, store.question_numbers());

    for (fmt, path) in outputs {
        match fmt {
            OutputFormat::Csv => {
                let layout = MailMergeLayout::from(&config.output);
                let document = layout.assemble(&outcome.rows, store.question_numbers());
                write_mail_merge(&path, &document)?;
                eprintln!("Mail merge: {}", path.display());
            }
            OutputFormat::Html => {
                write_html_report(&report, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            OutputFormat::Json => {
                report.save_json(&path)?;
                eprintln!("Results saved to: {}", path.display());
            }
        }
    }

    print_summary(&report.summary);

    println!(
        "Successfully generated a mail merge for {} students!",
        outcome.rows.len()
    );

    Ok(())
}

fn parse_formats(format: &str) -> Result<Vec<OutputFormat>> {
    if format.trim() == "all" {
        return Ok(vec![OutputFormat::Csv, OutputFormat::Html, OutputFormat::Json]);
    }
    format
        .split(',')
        .map(|s| match s.trim() {
            "csv" => Ok(OutputFormat::Csv),
            "html" => Ok(OutputFormat::Html),
            "json" => Ok(OutputFormat::Json),
            other => anyhow::bail!("unknown format '{other}'; expected one of csv, html, json, all"),
        })
        .collect()
}

/// The file each format is written to. The mail merge goes to `output`; the
/// reports take its stem with their own extension.
fn output_paths(
    output: &Path,
    formats: &[OutputFormat],
) -> Result<Vec<(OutputFormat, PathBuf)>> {
    let mut paths: Vec<(OutputFormat, PathBuf)> = Vec::new();
    for &fmt in formats {
        let path = match fmt {
            OutputFormat::Csv => output.to_path_buf(),
            OutputFormat::Html => output.with_extension("html"),
            OutputFormat::Json => output.with_extension("json"),
        };
        if let Some((other, _)) = paths.iter().find(|(f, p)| *p == path && *f != fmt) {
            anyhow::bail!(
                "{other:?} and {fmt:?} output would both be written to {}; choose an --output with another extension",
                path.display()
            );
        }
        if !paths.iter().any(|(f, _)| *f == fmt) {
            paths.push((fmt, path));
        }
    }
    Ok(paths)
}

fn read_export(path: &Path, what: &str) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {what} export: {}", path.display()))
}

fn print_summary(summary: &RunSummary) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Version", "Students", "Mean %", "Min %", "Max %"]);

    for (version, stats) in &summary.per_version {
        table.add_row(vec![
            Cell::new(version),
            Cell::new(stats.students),
            Cell::new(format!("{:.2}", stats.mean_percent)),
            Cell::new(format!("{:.2}", stats.min_percent)),
            Cell::new(format!("{:.2}", stats.max_percent)),
        ]);
    }
    if summary.ungraded_count > 0 {
        table.add_row(vec![
            Cell::new("(ungraded)"),
            Cell::new(summary.ungraded_count),
            Cell::new("-"),
            Cell::new("-"),
            Cell::new("-"),
        ]);
    }

    eprintln!("\n{table}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_expand_all() {
        assert_eq!(
            parse_formats("all").unwrap(),
            vec![OutputFormat::Csv, OutputFormat::Html, OutputFormat::Json]
        );
        assert_eq!(
            parse_formats("csv, json").unwrap(),
            vec![OutputFormat::Csv, OutputFormat::Json]
        );
    }

    #[test]
    fn report_paths_follow_the_output_stem() {
        let paths = output_paths(Path::new("out/merge.csv"), &parse_formats("all").unwrap()).unwrap();
        assert_eq!(
            paths,
            vec![
                (OutputFormat::Csv, PathBuf::from("out/merge.csv")),
                (OutputFormat::Html, PathBuf::from("out/merge.html")),
                (OutputFormat::Json, PathBuf::from("out/merge.json")),
            ]
        );
    }

    #[test]
    fn clashing_output_extension_is_rejected() {
        let err = output_paths(Path::new("out.json"), &parse_formats("all").unwrap()).unwrap_err();
        assert!(err.to_string().contains("out.json"));

        // Alone, the mail merge may use any extension.
        let paths = output_paths(Path::new("out.json"), &[OutputFormat::Csv]).unwrap();
        assert_eq!(paths, vec![(OutputFormat::Csv, PathBuf::from("out.json"))]);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let err = parse_formats("csv,sarif").unwrap_err();
        assert!(err.to_string().contains("sarif"));
    }
}
