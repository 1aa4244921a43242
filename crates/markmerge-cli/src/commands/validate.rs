//! The `markmerge validate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use markmerge_core::answer_key::{
    load_answer_keys, validate_answer_keys, AnswerKeyStore, ValidationWarning,
};
use markmerge_core::config::load_config_from;

pub fn execute(answers_path: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    println!(
        "Config: {} identity column(s), responses from column {}",
        config.gradebook.identity_columns, config.scans.first_response_column
    );

    let keys = load_answer_keys(&answers_path)?;
    let warnings = validate_answer_keys(&keys);
    let store = AnswerKeyStore::new(keys)
        .with_context(|| format!("invalid answer keys in {}", answers_path.display()))?;

    let versions: Vec<String> = store.all_versions().into_iter().collect();
    println!(
        "Answer keys: {} version(s) ({}), {} question(s)",
        store.len(),
        versions.join(", "),
        store.question_count()
    );

    for w in &warnings {
        println!("  {}WARNING: {}", location(w), w.message);
    }

    if warnings.is_empty() {
        println!("All answer keys valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}

/// `[A q3] `-style prefix for a warning, empty when it has no location.
pub fn location(w: &ValidationWarning) -> String {
    match (&w.version, w.question) {
        (Some(v), Some(q)) => format!("[{v} q{q}] "),
        (Some(v), None) => format!("[{v}] "),
        (None, Some(q)) => format!("[q{q}] "),
        (None, None) => String::new(),
    }
}
