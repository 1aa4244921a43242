//! The `markmerge init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create markmerge.toml
    if std::path::Path::new("markmerge.toml").exists() {
        println!("markmerge.toml already exists, skipping.");
    } else {
        std::fs::write("markmerge.toml", SAMPLE_CONFIG)?;
        println!("Created markmerge.toml");
    }

    // Create sample answer keys
    let answers_path = std::path::Path::new("answers.json");
    if answers_path.exists() {
        println!("answers.json already exists, skipping.");
    } else {
        std::fs::write(answers_path, SAMPLE_ANSWERS)?;
        println!("Created answers.json");
    }

    println!("\nNext steps:");
    println!("  1. Replace answers.json with the keys for your exam versions");
    println!("  2. Run: markmerge validate --answers answers.json");
    println!(
        "  3. Run: markmerge merge --roster roster.csv --gradebook gradebook.csv --scans scans.csv --answers answers.json"
    );

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# markmerge configuration
# Every key is optional; the values below are the defaults.

input_delimiter = ","
strict_versions = false
# "warn" keeps the later of two scan rows with the same name and id; "error" aborts.
on_scan_collision = "warn"

[roster]
skip_rows = 1
label_column = 0
id_column = 2
missing_id_sentinel = "unknown_id"

[gradebook]
skip_rows = 3
name_column = 0
id_column = 2
email_column = 3
identity_columns = 5
test_account_sentinel = "Student, Test"

[scans]
skip_rows = 1
name_columns = [0, 1]
id_column = 3
version_column = 4
first_response_column = 7
trim_trailing_blank_responses = true

[output]
delimiter = ","
# "legacy" quotes cells without escaping embedded quotes.
quote_style = "escaped"
identity_labels = ["Student", "ID", "SIS User ID", "SIS Login ID", "Section"]
correct_glyph = "✅"
incorrect_glyph = "❌"
answer_separator = " or "
byte_order_mark = true
"#;

const SAMPLE_ANSWERS: &str = r#"[
  {
    "version": "A",
    "questionWeight": 2,
    "key": { "1": "A", "2": "C", "3": ["B", "D"], "4": "E" }
  },
  {
    "version": "B",
    "questionWeight": 2,
    "key": { "1": "C", "2": "A", "3": "E", "4": ["B", "D"] }
  }
]
"#;
