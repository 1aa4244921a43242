//! Aggregate statistics over a graded cohort.
//!
//! Used by the console summary and the HTML report. Ungraded rows count
//! toward the student totals but not toward any percentages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::ScoredRow;

/// Statistics for one answer-key version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionStats {
    pub students: usize,
    pub mean_percent: f64,
    pub min_percent: f64,
    pub max_percent: f64,
}

/// How a single question fared across all graded students.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionStats {
    pub number: u32,
    /// Students with a recognized response.
    pub answered: usize,
    pub correct: usize,
    /// `correct / graded students`, in `[0, 1]`.
    pub rate: f64,
}

/// Run-level summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub student_count: usize,
    pub graded_count: usize,
    pub ungraded_count: usize,
    pub mean_percent: f64,
    pub per_version: BTreeMap<String, VersionStats>,
    pub per_question: Vec<QuestionStats>,
}

/// Summarize scored rows.
pub fn compute_summary(rows: &[ScoredRow], question_numbers: &[u32]) -> RunSummary {
    let graded: Vec<_> = rows.iter().filter_map(|r| r.grade.as_ref().map(|g| (r, g))).collect();

    let mut by_version: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (row, grade) in &graded {
        by_version
            .entry(row.version.clone())
            .or_default()
            .push(grade.percent_value());
    }

    let per_version = by_version
        .into_iter()
        .map(|(version, percents)| {
            let stats = VersionStats {
                students: percents.len(),
                mean_percent: mean(&percents),
                min_percent: percents.iter().copied().fold(f64::INFINITY, f64::min),
                max_percent: percents.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            };
            (version, stats)
        })
        .collect();

    let per_question = question_numbers
        .iter()
        .enumerate()
        .map(|(i, &number)| {
            let outcomes = graded.iter().filter_map(|(_, g)| g.per_question.get(i));
            let (answered, correct) = outcomes.fold((0, 0), |(answered, correct), q| {
                (
                    answered + usize::from(q.response.is_some()),
                    correct + usize::from(q.is_correct),
                )
            });
            QuestionStats {
                number,
                answered,
                correct,
                rate: if graded.is_empty() {
                    0.0
                } else {
                    correct as f64 / graded.len() as f64
                },
            }
        })
        .collect();

    let all_percents: Vec<f64> = graded.iter().map(|(_, g)| g.percent_value()).collect();

    RunSummary {
        student_count: rows.len(),
        graded_count: graded.len(),
        ungraded_count: rows.len() - graded.len(),
        mean_percent: mean(&all_percents),
        per_version,
        per_question,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
