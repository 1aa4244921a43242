//! Column layout and output configuration.
//!
//! Every field has a default matching the exports the tool was built for,
//! so an empty `markmerge.toml` (or none at all) is a valid configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::delimited::{DEFAULT_DELIMITER, QUOTE};
use crate::error::ConfigError;

/// Top-level markmerge configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Delimiter of the three input exports.
    pub input_delimiter: char,
    /// Treat unknown answer-key versions as fatal.
    pub strict_versions: bool,
    /// What to do when two scan rows share a composite key.
    pub on_scan_collision: CollisionPolicy,
    pub roster: RosterLayout,
    pub gradebook: GradebookLayout,
    pub scans: ScanLayout,
    pub output: OutputConfig,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            input_delimiter: DEFAULT_DELIMITER,
            strict_versions: false,
            on_scan_collision: CollisionPolicy::Warn,
            roster: RosterLayout::default(),
            gradebook: GradebookLayout::default(),
            scans: ScanLayout::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Handling of duplicate composite keys in the scan export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Keep the later row and report a warning.
    Warn,
    /// Abort the run.
    Error,
}

/// Columns of the enrollment roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterLayout {
    pub skip_rows: usize,
    pub label_column: usize,
    pub id_column: usize,
    /// Placeholder id meaning the export needs manual backfilling.
    pub missing_id_sentinel: String,
}

impl Default for RosterLayout {
    fn default() -> Self {
        Self {
            skip_rows: 1,
            label_column: 0,
            id_column: 2,
            missing_id_sentinel: "unknown_id".into(),
        }
    }
}

/// Columns of the gradebook export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradebookLayout {
    pub skip_rows: usize,
    pub name_column: usize,
    pub id_column: usize,
    pub email_column: usize,
    /// The first N columns are copied into the report.
    pub identity_columns: usize,
    /// Display name of the placeholder test student.
    pub test_account_sentinel: String,
}

impl Default for GradebookLayout {
    fn default() -> Self {
        Self {
            skip_rows: 3,
            name_column: 0,
            id_column: 2,
            email_column: 3,
            identity_columns: 5,
            test_account_sentinel: "Student, Test".into(),
        }
    }
}

/// Columns of the OMR scan export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanLayout {
    pub skip_rows: usize,
    /// Concatenated to form the name part of the composite key.
    pub name_columns: Vec<usize>,
    pub id_column: usize,
    pub version_column: usize,
    /// One choice code per column from here to the end of the row.
    pub first_response_column: usize,
    /// Drop blank code columns past the answer key's last question.
    pub trim_trailing_blank_responses: bool,
}

impl Default for ScanLayout {
    fn default() -> Self {
        Self {
            skip_rows: 1,
            name_columns: vec![0, 1],
            id_column: 3,
            version_column: 4,
            first_response_column: 7,
            trim_trailing_blank_responses: true,
        }
    }
}

/// How cells containing the delimiter are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStyle {
    /// Wrap in quotes verbatim, without escaping embedded quotes.
    Legacy,
    /// Quote when needed and double embedded quotes.
    Escaped,
}

/// Mail-merge document settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub delimiter: char,
    pub quote_style: QuoteStyle,
    /// Header labels for the gradebook identity columns.
    pub identity_labels: Vec<String>,
    pub correct_glyph: String,
    pub incorrect_glyph: String,
    /// Joins the letters of a multi-answer question.
    pub answer_separator: String,
    pub byte_order_mark: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            quote_style: QuoteStyle::Escaped,
            identity_labels: ["Student", "ID", "SIS User ID", "SIS Login ID", "Section"]
                .into_iter()
                .map(String::from)
                .collect(),
            correct_glyph: "✅".into(),
            incorrect_glyph: "❌".into(),
            answer_separator: " or ".into(),
            byte_order_mark: true,
        }
    }
}

impl MergeConfig {
    /// Check that the layout can produce a rectangular report.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.output.identity_labels.len() != self.gradebook.identity_columns {
            return Err(ConfigError::Layout(format!(
                "output.identity_labels has {} label(s) but gradebook.identity_columns is {}",
                self.output.identity_labels.len(),
                self.gradebook.identity_columns
            )));
        }
        for (name, delimiter) in [
            ("input_delimiter", self.input_delimiter),
            ("output.delimiter", self.output.delimiter),
        ] {
            if delimiter == QUOTE || delimiter == '\n' || delimiter == '\r' {
                return Err(ConfigError::Layout(format!(
                    "{name} cannot be a quote or line break"
                )));
            }
        }
        if self.scans.name_columns.is_empty() {
            return Err(ConfigError::Layout(
                "scans.name_columns must list at least one column".into(),
            ));
        }
        Ok(())
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `markmerge.toml` in the current directory
/// 2. `~/.config/markmerge/config.toml`
///
/// Environment variable override: `MARKMERGE_DELIMITER` (output delimiter).
pub fn load_config() -> Result<MergeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<MergeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("markmerge.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => MergeConfig::default(),
    };

    if let Ok(value) = std::env::var("MARKMERGE_DELIMITER") {
        config.output.delimiter = parse_delimiter(&value)?;
    }

    config.validate()?;
    Ok(config)
}

/// Parse a TOML config string (useful for testing).
pub fn parse_config_str(content: &str) -> Result<MergeConfig> {
    let config: MergeConfig = toml::from_str(content)?;
    Ok(config)
}

/// Accept a single character, or the names `tab` / `\t`.
fn parse_delimiter(value: &str) -> Result<char> {
    match value {
        "tab" | "\\t" => Ok('\t'),
        _ => {
            let mut chars = value.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => anyhow::bail!("MARKMERGE_DELIMITER must be a single character, got '{value}'"),
            }
        }
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("markmerge"))
}
