//! Mail-merge document assembly.
//!
//! The document is one header row and one row per student, joined by `\n`
//! with no trailing newline, optionally prefixed by a UTF-8 byte-order mark so
//! spreadsheet tools pick up the glyph columns correctly.

use std::path::Path;

use anyhow::{Context, Result};

use markmerge_core::config::{OutputConfig, QuoteStyle};
use markmerge_core::delimited::{DelimitedParser, QUOTE};
use markmerge_core::model::ScoredRow;

/// Leading byte-order mark.
pub const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// Summary columns between the identity columns and the question triplets.
pub const SCORE_LABELS: [&str; 4] = ["Version", "Score", "Possible Score", "Percent Score"];

/// Shape and encoding of the mail-merge document.
#[derive(Debug, Clone, PartialEq)]
pub struct MailMergeLayout {
    pub identity_labels: Vec<String>,
    pub delimiter: char,
    pub quote_style: QuoteStyle,
    pub correct_glyph: String,
    pub incorrect_glyph: String,
    pub byte_order_mark: bool,
}

impl From<&OutputConfig> for MailMergeLayout {
    fn from(output: &OutputConfig) -> Self {
        Self {
            identity_labels: output.identity_labels.clone(),
            delimiter: output.delimiter,
            quote_style: output.quote_style,
            correct_glyph: output.correct_glyph.clone(),
            incorrect_glyph: output.incorrect_glyph.clone(),
            byte_order_mark: output.byte_order_mark,
        }
    }
}

impl Default for MailMergeLayout {
    fn default() -> Self {
        Self::from(&OutputConfig::default())
    }
}

/// Make a cell safe to place between delimiters.
///
/// `Legacy` wraps a cell containing the delimiter in quotes and leaves any
/// embedded quotes alone. `Escaped` quotes cells containing the delimiter, a
/// quote or a line break and doubles embedded quotes.
pub fn sanitize(cell: &str, delimiter: char, style: QuoteStyle) -> String {
    match style {
        QuoteStyle::Legacy => {
            if cell.contains(delimiter) {
                format!("{QUOTE}{cell}{QUOTE}")
            } else {
                cell.to_string()
            }
        }
        QuoteStyle::Escaped => DelimitedParser::new(delimiter).encode_field(cell),
    }
}

impl MailMergeLayout {
    fn sanitize(&self, cell: &str) -> String {
        sanitize(cell, self.delimiter, self.quote_style)
    }

    /// Header cells for a key set numbered `question_numbers`.
    pub fn header(&self, question_numbers: &[u32]) -> Vec<String> {
        let mut header: Vec<String> = self
            .identity_labels
            .iter()
            .map(|label| self.sanitize(label))
            .collect();
        header.extend(SCORE_LABELS.iter().map(|label| label.to_string()));
        for n in question_numbers {
            header.push(format!("q{n}_response"));
            header.push(format!("q{n}_answer"));
            header.push(format!("q{n}_correct"));
        }
        header
    }

    /// Body cells for one student.
    ///
    /// An ungraded row keeps the header's width with empty score and
    /// question cells.
    pub fn body_row(&self, row: &ScoredRow, question_count: usize) -> Vec<String> {
        let mut cells: Vec<String> = row.gb.iter().map(|field| self.sanitize(field)).collect();
        cells.push(self.sanitize(&row.version));

        match &row.grade {
            Some(grade) => {
                cells.push(grade.score_achieved.to_string());
                cells.push(grade.score_possible.to_string());
                cells.push(grade.percent.clone());
                for outcome in &grade.per_question {
                    cells.push(
                        outcome
                            .response
                            .map(|c| c.as_str().to_string())
                            .unwrap_or_default(),
                    );
                    cells.push(self.sanitize(&outcome.accepted_display));
                    cells.push(if outcome.is_correct {
                        self.correct_glyph.clone()
                    } else {
                        self.incorrect_glyph.clone()
                    });
                }
            }
            None => cells.extend(std::iter::repeat(String::new()).take(3 + 3 * question_count)),
        }
        cells
    }

    /// Join header and body rows into the final document.
    pub fn render(&self, header: &[String], rows: &[Vec<String>]) -> String {
        let delimiter = self.delimiter.to_string();
        let mut document = String::new();
        if self.byte_order_mark {
            document.push(BYTE_ORDER_MARK);
        }
        document.push_str(&header.join(&delimiter));
        document.push('\n');
        let body: Vec<String> = rows.iter().map(|cells| cells.join(&delimiter)).collect();
        document.push_str(&body.join("\n"));
        document
    }

    /// Header plus one body row per scored row, rendered.
    pub fn assemble(&self, rows: &[ScoredRow], question_numbers: &[u32]) -> String {
        let header = self.header(question_numbers);
        let body: Vec<Vec<String>> = rows
            .iter()
            .map(|row| self.body_row(row, question_numbers.len()))
            .collect();
        self.render(&header, &body)
    }
}

/// Write a rendered document, creating parent directories as needed.
pub fn write_mail_merge(path: &Path, document: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, document)
        .with_context(|| format!("failed to write mail merge to {}", path.display()))?;
    Ok(())
}
