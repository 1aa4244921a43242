//! Core data model types for markmerge.
//!
//! These are the typed views over the three exports (roster, gradebook,
//! scans), the answer keys, and the join and grading products built from
//! them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Separator between the parts of a roster display label.
pub const LABEL_SEPARATOR: &str = " - ";

/// Which export a row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Roster,
    Gradebook,
    Scans,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Table::Roster => write!(f, "roster"),
            Table::Gradebook => write!(f, "gradebook"),
            Table::Scans => write!(f, "scans"),
        }
    }
}

/// A multiple-choice answer letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Choice {
    A,
    B,
    C,
    D,
    E,
}

impl Choice {
    /// Map an OMR choice code (`1`..=`5`) to its letter.
    ///
    /// Codes are matched exactly. Anything else, including blanks and
    /// padded codes such as `" 3 "`, is an undefined response.
    pub fn from_code(code: &str) -> Option<Choice> {
        match code {
            "1" => Some(Choice::A),
            "2" => Some(Choice::B),
            "3" => Some(Choice::C),
            "4" => Some(Choice::D),
            "5" => Some(Choice::E),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Choice::A => "A",
            Choice::B => "B",
            Choice::C => "C",
            Choice::D => "D",
            Choice::E => "E",
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Choice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Choice::A),
            "B" => Ok(Choice::B),
            "C" => Ok(Choice::C),
            "D" => Ok(Choice::D),
            "E" => Ok(Choice::E),
            other => Err(format!("unknown answer letter: {other}")),
        }
    }
}

/// Strip every whitespace character, as used by the composite join key.
pub fn normalize(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Build the composite key joining roster entries to scan rows.
pub fn composite_key(name: &str, secondary_id: &str) -> String {
    let mut key = normalize(name);
    key.push_str(&normalize(secondary_id));
    key
}

/// One row of the enrollment roster.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    /// Row number in the export (1-based, header included).
    pub row: usize,
    /// `"(section) - Last, First - secondaryId"`.
    pub display_label: String,
    /// Join key into the gradebook.
    pub external_id: String,
}

/// The parts of a roster display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterLabel {
    pub section: String,
    pub name: String,
    pub secondary_id: String,
}

impl RosterLabel {
    pub fn composite_key(&self) -> String {
        composite_key(&self.name, &self.secondary_id)
    }
}

impl RosterEntry {
    /// Split the display label into section, name and secondary id.
    ///
    /// The first `(` and first `)` are removed before splitting on
    /// [`LABEL_SEPARATOR`]; anything other than exactly three parts is
    /// rejected.
    pub fn parse_label(&self) -> Option<RosterLabel> {
        let stripped = self.display_label.replacen('(', "", 1).replacen(')', "", 1);
        let parts: Vec<&str> = stripped.split(LABEL_SEPARATOR).collect();
        match parts.as_slice() {
            [section, name, secondary_id] => Some(RosterLabel {
                section: section.trim().to_string(),
                name: name.trim().to_string(),
                secondary_id: secondary_id.trim().to_string(),
            }),
            _ => None,
        }
    }
}

/// One row of the gradebook export.
#[derive(Debug, Clone, PartialEq)]
pub struct GradebookEntry {
    pub row: usize,
    /// Display name, or the test-account sentinel.
    pub display_name: String,
    pub external_id: String,
    pub email: String,
    /// Identity columns copied verbatim into the report.
    pub display_fields: Vec<String>,
}

/// One row of the OMR scan export.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    pub row: usize,
    pub name: String,
    pub secondary_id: String,
    pub version_label: String,
    /// Raw choice codes, one per question.
    pub codes: Vec<String>,
}

impl ScanResult {
    pub fn composite_key(&self) -> String {
        composite_key(&self.name, &self.secondary_id)
    }

    /// The codes mapped to answer letters.
    pub fn responses(&self) -> Vec<Option<Choice>> {
        self.codes.iter().map(|c| Choice::from_code(c)).collect()
    }
}

/// The accepted answer(s) for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Accepted {
    Single(String),
    AnyOf(Vec<String>),
}

impl Accepted {
    /// Whether a response earns the question's points.
    pub fn accepts(&self, response: Option<Choice>) -> bool {
        let Some(choice) = response else {
            return false;
        };
        match self {
            Accepted::Single(letter) => letter == choice.as_str(),
            Accepted::AnyOf(letters) => letters.iter().any(|l| l == choice.as_str()),
        }
    }

    /// Text shown in the report's `answer` column.
    pub fn display(&self, separator: &str) -> String {
        match self {
            Accepted::Single(letter) => letter.clone(),
            Accepted::AnyOf(letters) => letters.join(separator),
        }
    }

    pub fn letters(&self) -> Vec<&str> {
        match self {
            Accepted::Single(letter) => vec![letter.as_str()],
            Accepted::AnyOf(letters) => letters.iter().map(String::as_str).collect(),
        }
    }
}

/// A versioned answer key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerKey {
    pub version: String,
    /// Points per question.
    pub question_weight: f64,
    /// Question number (1-based) to accepted answer(s).
    pub key: BTreeMap<u32, Accepted>,
}

impl AnswerKey {
    pub fn question_count(&self) -> usize {
        self.key.len()
    }

    pub fn question_numbers(&self) -> Vec<u32> {
        self.key.keys().copied().collect()
    }
}

/// One student, joined across roster, gradebook and scans.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnifiedStudentRecord {
    /// Whitespace-stripped name from the roster label.
    pub raw_name: String,
    /// Whitespace-stripped secondary id from the roster label.
    pub raw_id: String,
    pub email: String,
    /// Gradebook identity columns.
    pub gb: Vec<String>,
    pub version: String,
    pub responses: Vec<Option<Choice>>,
}

/// Grading outcome for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub number: u32,
    pub response: Option<Choice>,
    pub accepted_display: String,
    pub is_correct: bool,
}

/// Aggregate grade for one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub correct: usize,
    pub total: usize,
    pub score_achieved: f64,
    pub score_possible: f64,
    /// Percent correct, fixed to two decimals (e.g. `"80.00"`).
    pub percent: String,
    pub per_question: Vec<QuestionOutcome>,
}

impl Grade {
    pub fn percent_value(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64 * 100.0
        }
    }
}

/// One row of the final report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRow {
    pub name: String,
    pub id: String,
    pub email: String,
    pub gb: Vec<String>,
    pub version: String,
    /// `None` when the student's version has no answer key.
    pub grade: Option<Grade>,
}
