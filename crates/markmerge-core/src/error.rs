//! Error and warning types for the merge pipeline.
//!
//! Fatal conditions are `thiserror` enums so callers can match on them; the
//! non-fatal conditions (`UnknownVersion`, `ScanKeyCollision`) are plain
//! structs that the pipeline collects and the CLI surfaces to the operator.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::model::Table;

/// Problems with the answer-key set or the column layout.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// No answer keys were loaded.
    #[error("no answer keys loaded; at least one version is required")]
    NoAnswerKeys,

    /// An answer key has no questions.
    #[error("answer key '{version}' has no questions")]
    EmptyKey { version: String },

    /// Two answer keys share a version label.
    #[error("answer key version '{0}' is defined more than once")]
    DuplicateVersion(String),

    /// A question number is not a positive integer.
    #[error("answer key '{version}': question number '{raw}' is not a positive integer")]
    InvalidQuestionNumber { version: String, raw: String },

    /// Two entries of one key name the same question, e.g. `"1"` and `"01"`.
    #[error("answer key '{version}': question {number} is defined more than once")]
    DuplicateQuestion { version: String, number: u32 },

    /// Question numbers are not exactly `1..=n`.
    #[error("answer key '{version}': questions must be numbered 1..={count} without gaps, found {numbers:?}")]
    NonContiguousQuestions {
        version: String,
        count: usize,
        numbers: Vec<u32>,
    },

    /// Two answer keys disagree on their question numbering.
    #[error("answer key '{version}' has {found} questions but '{reference}' has {expected}; all versions must share the same questions")]
    QuestionSetMismatch {
        version: String,
        reference: String,
        expected: usize,
        found: usize,
    },

    /// The per-question weight is negative, infinite or NaN.
    #[error("answer key '{version}': question weight {weight} must be a finite, non-negative number")]
    InvalidWeight { version: String, weight: f64 },

    /// A multi-answer question accepts nothing.
    #[error("answer key '{version}': question {question} has an empty set of accepted answers")]
    EmptyAcceptedSet { version: String, question: u32 },

    /// The column layout or output settings are inconsistent.
    #[error("invalid layout: {0}")]
    Layout(String),
}

/// Problems with the exported tables themselves.
#[derive(Debug, Error)]
pub enum InputError {
    /// The roster still contains placeholder identifiers.
    #[error("roster is missing 'SIS User ID' entries for {count} student(s): {}. Find these in the gradebook export", .labels.join("; "))]
    UnresolvedRosterIds { count: usize, labels: Vec<String> },

    /// A row is shorter than the column layout requires.
    #[error("{table} row {row}: expected a value in column {column}, but the row has only {width} column(s)")]
    MissingColumn {
        table: Table,
        row: usize,
        column: usize,
        width: usize,
    },

    /// Two scan rows normalize to the same composite key.
    #[error("{0}")]
    ScanKeyCollision(ScanKeyCollision),
}

/// Grading could not produce a well-defined score.
#[derive(Debug, Error, PartialEq)]
pub enum GradeError {
    /// The student has no responses, so the percent would be a division by zero.
    #[error("{student} has no responses to grade; check the scan export's response columns")]
    NoResponses { student: String },

    /// The scan has a different number of responses than the answer key has questions.
    #[error("{student} has {actual} response(s) but answer key '{version}' has {expected} question(s)")]
    ResponseCountMismatch {
        student: String,
        version: String,
        expected: usize,
        actual: usize,
    },
}

/// Why a roster entry could not be joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinFailure {
    /// The display label is not `(section) - Name - id`.
    MalformedLabel,
    /// No scan row has the student's composite key.
    NoScan,
    /// No gradebook row has the student's external id.
    NoGradebook,
    /// Neither source has the student.
    NoScanOrGradebook,
}

impl fmt::Display for JoinFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinFailure::MalformedLabel => {
                write!(f, "label is not of the form '(section) - Last, First - id'")
            }
            JoinFailure::NoScan => write!(f, "no matching scan row"),
            JoinFailure::NoGradebook => write!(f, "no matching gradebook row"),
            JoinFailure::NoScanOrGradebook => {
                write!(f, "no matching scan row and no matching gradebook row")
            }
        }
    }
}

/// A single roster entry that failed to correlate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnresolvedJoin {
    /// Row number in the roster export (1-based).
    pub row: usize,
    pub label: String,
    pub external_id: String,
    /// The composite key that was looked up, if the label could be parsed.
    pub composite_key: Option<String>,
    pub reason: JoinFailure,
}

impl fmt::Display for UnresolvedJoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "roster row {} '{}' (id {}",
            self.row, self.label, self.external_id
        )?;
        if let Some(key) = &self.composite_key {
            write!(f, ", scan key {key}")?;
        }
        write!(f, "): {}", self.reason)
    }
}

/// Every roster entry that failed to correlate, reported together.
#[derive(Debug, Clone, PartialEq, Error)]
pub struct JoinReport {
    pub failures: Vec<UnresolvedJoin>,
}

impl fmt::Display for JoinReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.failures.len() == 1 {
            "entry"
        } else {
            "entries"
        };
        write!(
            f,
            "{} roster {noun} could not be matched:",
            self.failures.len()
        )?;
        for failure in &self.failures {
            write!(f, "\n  {failure}")?;
        }
        Ok(())
    }
}

/// A student whose scanned version is not among the loaded answer keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnknownVersion {
    pub name: String,
    pub id: String,
    pub email: String,
    pub version: String,
    pub expected: Vec<String>,
}

impl fmt::Display for UnknownVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "in the scan export, {} ({} - {}) contains a bad version '{}'. Expected a version in {}",
            self.name,
            self.id,
            self.email,
            self.version,
            self.expected.join(",")
        )
    }
}

/// Two scan rows that produced the same composite key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanKeyCollision {
    pub key: String,
    pub first_row: usize,
    pub second_row: usize,
}

impl fmt::Display for ScanKeyCollision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scan rows {} and {} share the key '{}'",
            self.first_row, self.second_row, self.key
        )
    }
}

/// Umbrella error returned by [`crate::pipeline::run_merge`].
#[derive(Debug, Error)]
pub enum MergeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Join(#[from] JoinReport),

    #[error(transparent)]
    Grade(#[from] GradeError),

    /// Unknown versions, when strict version checking is on.
    #[error("{} student(s) have an unknown answer-key version:{}", .0.len(), bulleted(.0))]
    UnknownVersions(Vec<UnknownVersion>),
}

fn bulleted<T: fmt::Display>(items: &[T]) -> String {
    items.iter().map(|item| format!("\n  {item}")).collect()
}
