//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const ROSTER: &str = "Student,Section,SIS User ID
\"(001) - Lee, Avery - 1234\",001,S1
\"(002) - Moreno, Jules - 5678\",002,S2
";

const GRADEBOOK: &str = "Student,ID,SIS User ID,SIS Login ID,Section
    Points Possible,,,,
,,,,
\"Student, Test\",0,S0,test@example.edu,001
\"Lee, Avery\",11,S1,avery@example.edu,001
\"Moreno, Jules\",12,S2,jules@example.edu,002
";

const SCANS: &str = "Last,First,MI,ID,Version,Date,Score,Q1,Q2,Q3
\"Lee,\",Avery,,1234,A,,,1,2,4
\"Moreno,\",Jules,,5678,B,,,3,3,1
";

const ANSWERS: &str = r#"[
  { "version": "A", "questionWeight": 2, "key": { "1": "A", "2": "B", "3": ["C", "D"] } },
  { "version": "B", "questionWeight": 2, "key": { "1": "C", "2": "A", "3": "A" } }
]"#;

/// A command isolated from the developer's config and environment.
fn markmerge(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("markmerge").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env_remove("MARKMERGE_DELIMITER")
        .env_remove("RUST_LOG");
    cmd
}

fn write_fixtures(dir: &Path) {
    std::fs::write(dir.join("roster.csv"), ROSTER).unwrap();
    std::fs::write(dir.join("gradebook.csv"), GRADEBOOK).unwrap();
    std::fs::write(dir.join("scans.csv"), SCANS).unwrap();
    std::fs::write(dir.join("answers.json"), ANSWERS).unwrap();
}

fn merge(dir: &Path) -> Command {
    let mut cmd = markmerge(dir);
    cmd.args([
        "merge",
        "--roster",
        "roster.csv",
        "--gradebook",
        "gradebook.csv",
        "--scans",
        "scans.csv",
        "--answers",
        "answers.json",
    ]);
    cmd
}

#[test]
fn merge_writes_mail_merge() {
    let dir = TempDir::new().unwrap();
    write_fixtures(dir.path());

    merge(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Successfully generated a mail merge for 2 students!",
        ));

    let output = std::fs::read_to_string(dir.path().join("output.csv")).unwrap();
    let expected = "\u{FEFF}Student,ID,SIS User ID,SIS Login ID,Section,Version,Score,Possible Score,Percent Score,\
q1_response,q1_answer,q1_correct,q2_response,q2_answer,q2_correct,q3_response,q3_answer,q3_correct\n\
\"Lee, Avery\",11,S1,avery@example.edu,001,A,6,6,100.00,A,A,✅,B,B,✅,D,C or D,✅\n\
\"Moreno, Jules\",12,S2,jules@example.edu,002,B,4,6,66.67,C,C,✅,C,A,❌,A,A,✅";
    assert_eq!(output, expected);
}

#[test]
fn merge_all_formats() {
    let dir = TempDir::new().unwrap();
    write_fixtures(dir.path());

    merge(dir.path())
        .args(["--output", "out/grades.csv", "--format", "all"])
        .assert()
        .success()
        .stderr(predicate::str::contains("HTML report"));

    assert!(dir.path().join("out/grades.csv").exists());
    assert!(dir.path().join("out/grades.html").exists());
    let json = std::fs::read_to_string(dir.path().join("out/grades.json")).unwrap();
    assert!(json.contains("\"student_count\": 2"));
}

#[test]
fn merge_rejects_output_clashing_with_report() {
    let dir = TempDir::new().unwrap();
    write_fixtures(dir.path());

    merge(dir.path())
        .args(["--output", "grades.json", "--format", "all"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("both be written to grades.json"));

    assert!(!dir.path().join("grades.json").exists());
}

#[test]
fn merge_rejects_unknown_format() {
    let dir = TempDir::new().unwrap();
    write_fixtures(dir.path());

    merge(dir.path())
        .args(["--format", "xlsx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format 'xlsx'"));
}

#[test]
fn merge_aborts_on_placeholder_ids() {
    let dir = TempDir::new().unwrap();
    write_fixtures(dir.path());
    std::fs::write(
        dir.path().join("roster.csv"),
        ROSTER.replace(",S2", ",unknown_id"),
    )
    .unwrap();

    merge(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"))
        .stderr(predicate::str::contains("Moreno, Jules"))
        .stderr(predicate::str::contains("gradebook export"));

    assert!(!dir.path().join("output.csv").exists());
}

#[test]
fn merge_reports_every_unmatched_student() {
    let dir = TempDir::new().unwrap();
    write_fixtures(dir.path());
    std::fs::write(
        dir.path().join("scans.csv"),
        "Last,First,MI,ID,Version,Date,Score,Q1,Q2,Q3\n",
    )
    .unwrap();

    merge(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("2 roster entries could not be matched"))
        .stderr(predicate::str::contains("no matching scan row"));
}

#[test]
fn merge_warns_on_unknown_version() {
    let dir = TempDir::new().unwrap();
    write_fixtures(dir.path());
    std::fs::write(dir.path().join("scans.csv"), SCANS.replace(",B,", ",Q,")).unwrap();

    merge(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("bad version 'Q'"))
        .stdout(predicate::str::contains("for 2 students!"));

    let output = std::fs::read_to_string(dir.path().join("output.csv")).unwrap();
    assert!(output.ends_with("\"Moreno, Jules\",12,S2,jules@example.edu,002,Q,,,,,,,,,,,,"));
}

#[test]
fn strict_versions_fail_the_run() {
    let dir = TempDir::new().unwrap();
    write_fixtures(dir.path());
    std::fs::write(dir.path().join("scans.csv"), SCANS.replace(",B,", ",Q,")).unwrap();

    merge(dir.path())
        .arg("--strict-versions")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown answer-key version"));
}

#[test]
fn merge_uses_config_file() {
    let dir = TempDir::new().unwrap();
    write_fixtures(dir.path());
    std::fs::write(
        dir.path().join("custom.toml"),
        "[output]\ndelimiter = \";\"\nbyte_order_mark = false\n",
    )
    .unwrap();

    merge(dir.path())
        .args(["--config", "custom.toml"])
        .assert()
        .success();

    let output = std::fs::read_to_string(dir.path().join("output.csv")).unwrap();
    assert!(output.starts_with("Student;ID;"));
    assert!(output.contains("Lee, Avery;11;S1"));
}

#[test]
fn merge_missing_export() {
    let dir = TempDir::new().unwrap();
    write_fixtures(dir.path());
    std::fs::remove_file(dir.path().join("roster.csv")).unwrap();

    merge(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read roster export"));
}

#[test]
fn validate_answer_keys() {
    let dir = TempDir::new().unwrap();
    write_fixtures(dir.path());

    markmerge(dir.path())
        .args(["validate", "--answers", "answers.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 version(s) (A, B), 3 question(s)"))
        .stdout(predicate::str::contains("All answer keys valid"));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("answers.toml"),
        "[[answer_keys]]\nversion = \"A\"\n[answer_keys.key]\n1 = \"F\"\n2 = [\"B\", \"B\"]\n",
    )
    .unwrap();

    markmerge(dir.path())
        .args(["validate", "--answers", "answers.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[A q1] WARNING"))
        .stdout(predicate::str::contains("2 warning(s) found"));
}

#[test]
fn validate_rejects_mismatched_keys() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("answers.json"),
        r#"[{ "version": "A", "key": { "1": "A", "2": "B" } }, { "version": "B", "key": { "1": "A" } }]"#,
    )
    .unwrap();

    markmerge(dir.path())
        .args(["validate", "--answers", "answers.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("all versions must share the same questions"));
}

#[test]
fn validate_nonexistent_file() {
    let dir = TempDir::new().unwrap();

    markmerge(dir.path())
        .args(["validate", "--answers", "nonexistent.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    markmerge(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created markmerge.toml"))
        .stdout(predicate::str::contains("Created answers.json"));

    assert!(dir.path().join("markmerge.toml").exists());
    assert!(dir.path().join("answers.json").exists());

    // The starter files are valid as written.
    markmerge(dir.path())
        .args(["validate", "--answers", "answers.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("All answer keys valid"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    // First init
    markmerge(dir.path()).arg("init").assert().success();

    // Second init should skip
    markmerge(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn help_output() {
    let dir = TempDir::new().unwrap();

    markmerge(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Grade OMR scans and build a mail-merge report",
        ));
}

#[test]
fn version_output() {
    let dir = TempDir::new().unwrap();

    markmerge(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("markmerge"));
}
