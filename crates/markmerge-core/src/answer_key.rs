//! Answer-key loading, validation and lookup.
//!
//! Keys are read from either the JSON array exported alongside the scans
//! (`[{ "version": "A", "questionWeight": 2, "key": { "1": "B", ... } }]`)
//! or an equivalent TOML file with `[[answer_keys]]` tables.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::{Accepted, AnswerKey, Choice};

/// Intermediate structure for one answer key as written on disk.
#[derive(Debug, Deserialize)]
struct RawAnswerKey {
    version: RawVersion,
    #[serde(rename = "questionWeight", alias = "question_weight", default = "default_weight")]
    question_weight: f64,
    key: BTreeMap<String, Accepted>,
}

/// Versions are usually letters but some exports write bare numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawVersion {
    Text(String),
    Integer(i64),
}

impl RawVersion {
    fn into_label(self) -> String {
        match self {
            RawVersion::Text(s) => s,
            RawVersion::Integer(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TomlAnswerKeyFile {
    #[serde(default)]
    answer_keys: Vec<RawAnswerKey>,
}

fn default_weight() -> f64 {
    1.0
}

/// Load answer keys from a `.json` or `.toml` file.
pub fn load_answer_keys(path: &Path) -> Result<Vec<AnswerKey>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answer keys: {}", path.display()))?;

    parse_answer_keys_str(&content, path)
}

/// Parse answer keys from a string; the format follows `source_path`'s extension.
pub fn parse_answer_keys_str(content: &str, source_path: &Path) -> Result<Vec<AnswerKey>> {
    let is_json = source_path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let raw: Vec<RawAnswerKey> = if is_json {
        serde_json::from_str(content)
            .with_context(|| format!("failed to parse JSON: {}", source_path.display()))?
    } else {
        toml::from_str::<TomlAnswerKeyFile>(content)
            .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?
            .answer_keys
    };

    raw.into_iter()
        .map(|k| -> Result<AnswerKey> {
            let version = k.version.into_label();
            let mut key = BTreeMap::new();
            for (number, accepted) in k.key {
                let parsed = number
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| ConfigError::InvalidQuestionNumber {
                        version: version.clone(),
                        raw: number.clone(),
                    })?;
                if key.insert(parsed, accepted).is_some() {
                    return Err(ConfigError::DuplicateQuestion {
                        version,
                        number: parsed,
                    }
                    .into());
                }
            }

            Ok(AnswerKey {
                version,
                question_weight: k.question_weight,
                key,
            })
        })
        .collect()
}

/// Answer keys indexed by version.
///
/// Construction guarantees a non-empty set of keys that all share the
/// question numbering `1..=n`, so any key can shape the report header.
#[derive(Debug, Clone)]
pub struct AnswerKeyStore {
    keys: BTreeMap<String, AnswerKey>,
    question_numbers: Vec<u32>,
}

impl AnswerKeyStore {
    pub fn new(keys: Vec<AnswerKey>) -> std::result::Result<Self, ConfigError> {
        let Some(first) = keys.first() else {
            return Err(ConfigError::NoAnswerKeys);
        };
        let reference_version = first.version.clone();
        let question_numbers = first.question_numbers();

        let mut indexed = BTreeMap::new();
        for key in keys {
            validate_key(&key)?;
            if key.question_numbers() != question_numbers {
                return Err(ConfigError::QuestionSetMismatch {
                    version: key.version.clone(),
                    reference: reference_version,
                    expected: question_numbers.len(),
                    found: key.question_count(),
                });
            }
            if indexed.contains_key(&key.version) {
                return Err(ConfigError::DuplicateVersion(key.version));
            }
            indexed.insert(key.version.clone(), key);
        }

        tracing::debug!(
            versions = indexed.len(),
            questions = question_numbers.len(),
            "answer keys loaded"
        );

        Ok(Self {
            keys: indexed,
            question_numbers,
        })
    }

    pub fn get(&self, version: &str) -> Option<&AnswerKey> {
        self.keys.get(version)
    }

    pub fn all_versions(&self) -> BTreeSet<String> {
        self.keys.keys().cloned().collect()
    }

    /// The question numbering shared by every key.
    pub fn question_numbers(&self) -> &[u32] {
        &self.question_numbers
    }

    pub fn question_count(&self) -> usize {
        self.question_numbers.len()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnswerKey> {
        self.keys.values()
    }
}

fn validate_key(key: &AnswerKey) -> std::result::Result<(), ConfigError> {
    if key.key.is_empty() {
        return Err(ConfigError::EmptyKey {
            version: key.version.clone(),
        });
    }

    let numbers = key.question_numbers();
    let contiguous = numbers.iter().zip(1u32..).all(|(n, expected)| *n == expected);
    if !contiguous {
        return Err(ConfigError::NonContiguousQuestions {
            version: key.version.clone(),
            count: numbers.len(),
            numbers,
        });
    }

    if !key.question_weight.is_finite() || key.question_weight < 0.0 {
        return Err(ConfigError::InvalidWeight {
            version: key.version.clone(),
            weight: key.question_weight,
        });
    }

    for (number, accepted) in &key.key {
        if let Accepted::AnyOf(letters) = accepted {
            if letters.is_empty() {
                return Err(ConfigError::EmptyAcceptedSet {
                    version: key.version.clone(),
                    question: *number,
                });
            }
        }
    }

    Ok(())
}

/// A non-fatal issue found in an answer key.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The version (if applicable).
    pub version: Option<String>,
    /// The question number (if applicable).
    pub question: Option<u32>,
    /// Warning message.
    pub message: String,
}

/// Check answer keys for entries that load fine but can never score.
pub fn validate_answer_keys(keys: &[AnswerKey]) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    for key in keys {
        for (number, accepted) in &key.key {
            let letters = accepted.letters();

            for letter in &letters {
                if letter.parse::<Choice>().is_err() {
                    warnings.push(ValidationWarning {
                        version: Some(key.version.clone()),
                        question: Some(*number),
                        message: format!(
                            "accepted answer '{letter}' is not one of A-E and can never match"
                        ),
                    });
                }
            }

            let mut seen = HashSet::new();
            if letters.iter().any(|l| !seen.insert(*l)) {
                warnings.push(ValidationWarning {
                    version: Some(key.version.clone()),
                    question: Some(*number),
                    message: "accepted answers contain a duplicate letter".into(),
                });
            }
        }

        if key.question_weight == 0.0 {
            warnings.push(ValidationWarning {
                version: Some(key.version.clone()),
                question: None,
                message: "question weight is 0; every score will be 0".into(),
            });
        }
    }

    warnings
}
