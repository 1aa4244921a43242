//! The merge pipeline: parse, correlate, check versions, grade.

use std::fmt;

use serde::Serialize;

use crate::answer_key::AnswerKeyStore;
use crate::config::MergeConfig;
use crate::correlate::{
    check_roster_ids, check_versions, gradebook_entries, roster_entries, scan_results,
    CorrelationOptions, RecordCorrelator,
};
use crate::delimited::DelimitedParser;
use crate::error::{MergeError, ScanKeyCollision, UnknownVersion};
use crate::grading::GradingEngine;
use crate::model::ScoredRow;

/// Raw text of the three exports.
#[derive(Debug, Clone, Copy)]
pub struct MergeInputs<'a> {
    pub roster: &'a str,
    pub gradebook: &'a str,
    pub scans: &'a str,
}

/// A non-fatal problem to surface to the operator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MergeWarning {
    UnknownVersion(UnknownVersion),
    ScanKeyCollision(ScanKeyCollision),
}

impl fmt::Display for MergeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeWarning::UnknownVersion(w) => write!(f, "{w}; the student is left ungraded"),
            MergeWarning::ScanKeyCollision(c) => {
                write!(f, "{c}; row {} is used", c.second_row)
            }
        }
    }
}

/// Scored rows plus everything worth warning about.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub rows: Vec<ScoredRow>,
    pub warnings: Vec<MergeWarning>,
}

/// Run the whole merge over in-memory exports.
///
/// Fatal conditions stop the run before any row is graded. Input text is
/// trimmed before parsing.
pub fn run_merge(
    inputs: &MergeInputs<'_>,
    store: &AnswerKeyStore,
    config: &MergeConfig,
) -> Result<MergeOutcome, MergeError> {
    config.validate()?;
    let parser = DelimitedParser::new(config.input_delimiter);

    let roster = roster_entries(&parser.parse(inputs.roster.trim()), &config.roster)?;
    check_roster_ids(&roster, &config.roster.missing_id_sentinel)?;

    let gradebook = gradebook_entries(&parser.parse(inputs.gradebook.trim()), &config.gradebook)?;
    let scans = scan_results(
        &parser.parse(inputs.scans.trim()),
        &config.scans,
        store.question_count(),
    )?;
    tracing::info!(
        roster = roster.len(),
        gradebook = gradebook.len(),
        scans = scans.len(),
        "exports parsed"
    );

    let correlator =
        RecordCorrelator::new(gradebook, scans, &CorrelationOptions::from_config(config))?;
    let records = correlator.correlate(&roster)?;

    let mut warnings: Vec<MergeWarning> = correlator
        .collisions()
        .iter()
        .cloned()
        .map(MergeWarning::ScanKeyCollision)
        .collect();

    let unknown = check_versions(&records, store);
    if !unknown.is_empty() {
        if config.strict_versions {
            return Err(MergeError::UnknownVersions(unknown));
        }
        for u in &unknown {
            tracing::debug!(version = %u.version, student = %u.name, "unknown version");
        }
        warnings.extend(unknown.into_iter().map(MergeWarning::UnknownVersion));
    }

    let engine = GradingEngine::new(store).with_answer_separator(&config.output.answer_separator);
    let rows = engine.grade_all(&records)?;
    tracing::info!(students = rows.len(), warnings = warnings.len(), "grading complete");

    Ok(MergeOutcome { rows, warnings })
}
