//! Joining the roster, gradebook and scan exports into one record per student.
//!
//! The roster is authoritative: every roster entry becomes exactly one
//! [`UnifiedStudentRecord`] or one [`UnresolvedJoin`] in the returned
//! [`JoinReport`]. The gradebook is joined on the external id, the scans on
//! the composite of normalized name and secondary id.

use std::collections::HashMap;

use crate::answer_key::AnswerKeyStore;
use crate::config::{CollisionPolicy, GradebookLayout, MergeConfig, RosterLayout, ScanLayout};
use crate::delimited::is_blank_row;
use crate::error::{
    InputError, JoinFailure, JoinReport, ScanKeyCollision, UnknownVersion, UnresolvedJoin,
};
use crate::model::{
    normalize, GradebookEntry, RosterEntry, ScanResult, Table, UnifiedStudentRecord,
};

// ---------------------------------------------------------------------------
// Table adapters
// ---------------------------------------------------------------------------

/// Rows after the header block, paired with their 1-based row number.
fn data_rows(rows: &[Vec<String>], skip: usize) -> impl Iterator<Item = (usize, &[String])> {
    rows.iter()
        .enumerate()
        .skip(skip)
        .filter(|(_, row)| !is_blank_row(row))
        .map(|(i, row)| (i + 1, row.as_slice()))
}

fn cell(row: &[String], column: usize, table: Table, number: usize) -> Result<&str, InputError> {
    row.get(column)
        .map(String::as_str)
        .ok_or(InputError::MissingColumn {
            table,
            row: number,
            column,
            width: row.len(),
        })
}

pub fn roster_entries(
    rows: &[Vec<String>],
    layout: &RosterLayout,
) -> Result<Vec<RosterEntry>, InputError> {
    data_rows(rows, layout.skip_rows)
        .map(|(number, row)| {
            Ok(RosterEntry {
                row: number,
                display_label: cell(row, layout.label_column, Table::Roster, number)?.to_string(),
                external_id: cell(row, layout.id_column, Table::Roster, number)?.to_string(),
            })
        })
        .collect()
}

pub fn gradebook_entries(
    rows: &[Vec<String>],
    layout: &GradebookLayout,
) -> Result<Vec<GradebookEntry>, InputError> {
    data_rows(rows, layout.skip_rows)
        .map(|(number, row)| {
            let display_fields = (0..layout.identity_columns)
                .map(|c| cell(row, c, Table::Gradebook, number).map(str::to_string))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(GradebookEntry {
                row: number,
                display_name: cell(row, layout.name_column, Table::Gradebook, number)?.to_string(),
                external_id: cell(row, layout.id_column, Table::Gradebook, number)?.to_string(),
                email: cell(row, layout.email_column, Table::Gradebook, number)?.to_string(),
                display_fields,
            })
        })
        .collect()
}

/// Scan rows with their response codes fitted to `question_count`.
///
/// Rows shorter than the answer key are padded with blank codes, which grade
/// as unanswered. Blank columns past the last question are dropped when the
/// layout allows it; anything else left over is kept for grading to reject.
pub fn scan_results(
    rows: &[Vec<String>],
    layout: &ScanLayout,
    question_count: usize,
) -> Result<Vec<ScanResult>, InputError> {
    data_rows(rows, layout.skip_rows)
        .map(|(number, row)| {
            let name = layout
                .name_columns
                .iter()
                .map(|&c| cell(row, c, Table::Scans, number))
                .collect::<Result<String, _>>()?;

            let mut codes: Vec<String> = row
                .get(layout.first_response_column..)
                .unwrap_or_default()
                .to_vec();
            if layout.trim_trailing_blank_responses {
                while codes.len() > question_count
                    && codes.last().is_some_and(|c| c.trim().is_empty())
                {
                    codes.pop();
                }
            }
            if codes.len() < question_count {
                codes.resize(question_count, String::new());
            }

            Ok(ScanResult {
                row: number,
                name,
                secondary_id: cell(row, layout.id_column, Table::Scans, number)?.trim().to_string(),
                version_label: cell(row, layout.version_column, Table::Scans, number)?
                    .trim()
                    .to_string(),
                codes,
            })
        })
        .collect()
}

/// Fail if any roster entry still carries the placeholder id.
///
/// Runs before correlation so no partial output is produced.
pub fn check_roster_ids(roster: &[RosterEntry], sentinel: &str) -> Result<(), InputError> {
    let labels: Vec<String> = roster
        .iter()
        .filter(|r| r.external_id.trim() == sentinel)
        .map(|r| r.display_label.clone())
        .collect();

    if labels.is_empty() {
        Ok(())
    } else {
        Err(InputError::UnresolvedRosterIds {
            count: labels.len(),
            labels,
        })
    }
}

// ---------------------------------------------------------------------------
// Correlator
// ---------------------------------------------------------------------------

/// Settings for building the join indices.
#[derive(Debug, Clone)]
pub struct CorrelationOptions {
    pub test_account_sentinel: String,
    pub on_collision: CollisionPolicy,
}

impl Default for CorrelationOptions {
    fn default() -> Self {
        Self::from_config(&MergeConfig::default())
    }
}

impl CorrelationOptions {
    pub fn from_config(config: &MergeConfig) -> Self {
        Self {
            test_account_sentinel: config.gradebook.test_account_sentinel.clone(),
            on_collision: config.on_scan_collision,
        }
    }
}

/// Outcome of joining a single roster entry.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    Matched(UnifiedStudentRecord),
    Unresolved(UnresolvedJoin),
}

/// Immutable gradebook and scan indices.
#[derive(Debug)]
pub struct RecordCorrelator {
    gradebook: HashMap<String, GradebookEntry>,
    scans: HashMap<String, ScanResult>,
    collisions: Vec<ScanKeyCollision>,
}

impl RecordCorrelator {
    pub fn new(
        gradebook: Vec<GradebookEntry>,
        scans: Vec<ScanResult>,
        options: &CorrelationOptions,
    ) -> Result<Self, InputError> {
        let mut gradebook_index = HashMap::new();
        for entry in gradebook {
            if entry.display_name == options.test_account_sentinel {
                tracing::debug!(row = entry.row, "skipping test account");
                continue;
            }
            gradebook_index.insert(entry.external_id.clone(), entry);
        }

        let mut scan_index: HashMap<String, ScanResult> = HashMap::new();
        let mut collisions = Vec::new();
        for scan in scans {
            let key = scan.composite_key();
            let second_row = scan.row;
            if let Some(previous) = scan_index.insert(key.clone(), scan) {
                let collision = ScanKeyCollision {
                    key,
                    first_row: previous.row,
                    second_row,
                };
                match options.on_collision {
                    CollisionPolicy::Error => {
                        return Err(InputError::ScanKeyCollision(collision));
                    }
                    CollisionPolicy::Warn => {
                        tracing::debug!("{collision}; keeping row {second_row}");
                        collisions.push(collision);
                    }
                }
            }
        }

        tracing::debug!(
            gradebook = gradebook_index.len(),
            scans = scan_index.len(),
            "correlation indices built"
        );

        Ok(Self {
            gradebook: gradebook_index,
            scans: scan_index,
            collisions,
        })
    }

    /// Composite-key collisions seen while indexing the scans.
    pub fn collisions(&self) -> &[ScanKeyCollision] {
        &self.collisions
    }

    /// Join one roster entry against both indices.
    pub fn join(&self, entry: &RosterEntry) -> JoinOutcome {
        let unresolved = |composite_key, reason| {
            JoinOutcome::Unresolved(UnresolvedJoin {
                row: entry.row,
                label: entry.display_label.clone(),
                external_id: entry.external_id.clone(),
                composite_key,
                reason,
            })
        };

        let Some(label) = entry.parse_label() else {
            return unresolved(None, JoinFailure::MalformedLabel);
        };
        let key = label.composite_key();

        match (self.scans.get(&key), self.gradebook.get(&entry.external_id)) {
            (Some(scan), Some(gb)) => JoinOutcome::Matched(UnifiedStudentRecord {
                raw_name: normalize(&label.name),
                raw_id: normalize(&label.secondary_id),
                email: gb.email.clone(),
                gb: gb.display_fields.clone(),
                version: scan.version_label.clone(),
                responses: scan.responses(),
            }),
            (None, Some(_)) => unresolved(Some(key), JoinFailure::NoScan),
            (Some(_), None) => unresolved(Some(key), JoinFailure::NoGradebook),
            (None, None) => unresolved(Some(key), JoinFailure::NoScanOrGradebook),
        }
    }

    /// Join every roster entry, in roster order.
    ///
    /// Returns all failures together so the operator can fix the exports in
    /// one pass.
    pub fn correlate(&self, roster: &[RosterEntry]) -> Result<Vec<UnifiedStudentRecord>, JoinReport> {
        let mut records = Vec::with_capacity(roster.len());
        let mut failures = Vec::new();

        for entry in roster {
            match self.join(entry) {
                JoinOutcome::Matched(record) => records.push(record),
                JoinOutcome::Unresolved(failure) => failures.push(failure),
            }
        }

        if failures.is_empty() {
            Ok(records)
        } else {
            Err(JoinReport { failures })
        }
    }
}

/// Every record whose version has no answer key, in roster order.
pub fn check_versions(
    records: &[UnifiedStudentRecord],
    store: &AnswerKeyStore,
) -> Vec<UnknownVersion> {
    let versions = store.all_versions();
    records
        .iter()
        .filter(|r| !versions.contains(&r.version))
        .map(|r| UnknownVersion {
            name: r.raw_name.clone(),
            id: r.raw_id.clone(),
            email: r.email.clone(),
            version: r.version.clone(),
            expected: versions.iter().cloned().collect(),
        })
        .collect()
}
