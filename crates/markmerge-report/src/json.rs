//! Merge report with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use markmerge_core::model::ScoredRow;
use markmerge_core::pipeline::MergeOutcome;
use markmerge_core::statistics::{compute_summary, RunSummary};

/// Everything a merge run produced, in one serializable value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Question numbering shared by every answer key.
    pub question_numbers: Vec<u32>,
    pub summary: RunSummary,
    pub rows: Vec<ScoredRow>,
    /// Operator-facing warnings, already formatted.
    pub warnings: Vec<String>,
}

impl MergeReport {
    /// Build a report from a finished merge.
    pub fn new(outcome: &MergeOutcome, question_numbers: &[u32]) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            question_numbers: question_numbers.to_vec(),
            summary: compute_summary(&outcome.rows, question_numbers),
            rows: outcome.rows.clone(),
            warnings: outcome.warnings.iter().map(ToString::to_string).collect(),
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: MergeReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}
