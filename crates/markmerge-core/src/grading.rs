//! Scoring unified student records against their answer keys.

use crate::answer_key::AnswerKeyStore;
use crate::error::GradeError;
use crate::model::{AnswerKey, Grade, QuestionOutcome, ScoredRow, UnifiedStudentRecord};

/// Separator between the letters of a multi-answer question.
pub const DEFAULT_ANSWER_SEPARATOR: &str = " or ";

/// Grade one record against one key, using the default answer separator.
pub fn grade(record: &UnifiedStudentRecord, key: &AnswerKey) -> Result<Grade, GradeError> {
    grade_with_separator(record, key, DEFAULT_ANSWER_SEPARATOR)
}

fn grade_with_separator(
    record: &UnifiedStudentRecord,
    key: &AnswerKey,
    separator: &str,
) -> Result<Grade, GradeError> {
    let total = record.responses.len();
    if total == 0 {
        return Err(GradeError::NoResponses {
            student: student_label(record),
        });
    }
    if total != key.question_count() {
        return Err(GradeError::ResponseCountMismatch {
            student: student_label(record),
            version: key.version.clone(),
            expected: key.question_count(),
            actual: total,
        });
    }

    let per_question: Vec<QuestionOutcome> = key
        .key
        .iter()
        .zip(&record.responses)
        .map(|((&number, accepted), &response)| QuestionOutcome {
            number,
            response,
            accepted_display: accepted.display(separator),
            is_correct: accepted.accepts(response),
        })
        .collect();

    let correct = per_question.iter().filter(|q| q.is_correct).count();

    Ok(Grade {
        correct,
        total,
        score_achieved: correct as f64 * key.question_weight,
        score_possible: total as f64 * key.question_weight,
        percent: percent_display(correct, total),
        per_question,
    })
}

/// `correct / total` as a percentage with two decimals, ties rounded up.
fn percent_display(correct: usize, total: usize) -> String {
    let (correct, total) = (correct as u64, total as u64);
    let hundredths = (correct * 20_000 + total) / (2 * total);
    format!("{}.{:02}", hundredths / 100, hundredths % 100)
}

fn student_label(record: &UnifiedStudentRecord) -> String {
    format!("{} ({} - {})", record.raw_name, record.raw_id, record.email)
}

/// Grades records against the keys in a store.
pub struct GradingEngine<'a> {
    store: &'a AnswerKeyStore,
    answer_separator: String,
}

impl<'a> GradingEngine<'a> {
    pub fn new(store: &'a AnswerKeyStore) -> Self {
        Self {
            store,
            answer_separator: DEFAULT_ANSWER_SEPARATOR.to_string(),
        }
    }

    pub fn with_answer_separator(mut self, separator: impl Into<String>) -> Self {
        self.answer_separator = separator.into();
        self
    }

    pub fn grade(
        &self,
        record: &UnifiedStudentRecord,
        key: &AnswerKey,
    ) -> Result<Grade, GradeError> {
        grade_with_separator(record, key, &self.answer_separator)
    }

    /// Grade a record with its own version's key.
    ///
    /// A version without a key yields an ungraded row.
    pub fn grade_record(&self, record: &UnifiedStudentRecord) -> Result<ScoredRow, GradeError> {
        let grade = match self.store.get(&record.version) {
            Some(key) => Some(self.grade(record, key)?),
            None => None,
        };

        Ok(ScoredRow {
            name: record.raw_name.clone(),
            id: record.raw_id.clone(),
            email: record.email.clone(),
            gb: record.gb.clone(),
            version: record.version.clone(),
            grade,
        })
    }

    /// Grade every record, preserving order.
    pub fn grade_all(&self, records: &[UnifiedStudentRecord]) -> Result<Vec<ScoredRow>, GradeError> {
        records.iter().map(|r| self.grade_record(r)).collect()
    }
}
