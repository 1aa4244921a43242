//! HTML grade summary.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::{Context, Result};
use std::path::Path;

use markmerge_core::statistics::QuestionStats;

use crate::json::MergeReport;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML summary from a merge report.
pub fn generate_html(report: &MergeReport) -> String {
    let summary = &report.summary;
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str("<title>markmerge grade summary</title>\n");
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>markmerge grade summary</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">{} students | {} graded | {} ungraded | mean {:.2}% | {}</p>\n",
        summary.student_count,
        summary.graded_count,
        summary.ungraded_count,
        summary.mean_percent,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    if !report.warnings.is_empty() {
        html.push_str("<section class=\"warnings\">\n<h2>Warnings</h2>\n<ul>\n");
        for warning in &report.warnings {
            html.push_str(&format!("<li>{}</li>\n", html_escape(warning)));
        }
        html.push_str("</ul>\n</section>\n");
    }

    // Per-version table
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Versions</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Version</th><th>Students</th><th>Mean %</th><th>Min %</th><th>Max %</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for (version, stats) in &summary.per_version {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td></tr>\n",
            html_escape(version),
            stats.students,
            stats.mean_percent,
            stats.min_percent,
            stats.max_percent,
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Per-question table with bar chart
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Questions</h2>\n");
    if !summary.per_question.is_empty() {
        html.push_str(&generate_bar_chart(&summary.per_question));
    }
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Question</th><th onclick=\"sortTable(1)\">Answered</th><th onclick=\"sortTable(2)\">Correct</th><th onclick=\"sortTable(3)\">Rate</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for q in &summary.per_question {
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{:.1}%</td></tr>\n",
            rate_class(q.rate),
            q.number,
            q.answered,
            q.correct,
            q.rate * 100.0
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // JavaScript for sorting
    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML summary to a file.
pub fn write_html_report(report: &MergeReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

fn rate_class(rate: f64) -> &'static str {
    if rate >= 0.8 {
        "pass"
    } else if rate < 0.5 {
        "fail"
    } else {
        ""
    }
}

fn generate_bar_chart(questions: &[QuestionStats]) -> String {
    let bar_height = 18;
    let max_width = 400;
    let padding = 6;
    let label_width = 60;

    let total_height = questions.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, q) in questions.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let width = (q.rate * max_width as f64) as usize;

        let color = if q.rate >= 0.8 {
            "#22c55e"
        } else if q.rate >= 0.5 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">Q{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            q.number
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"3\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"11\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.1}%</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            q.rate * 100.0
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.warnings li { color: #b45309; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = parseFloat(a.cells[col].textContent);
    const vb = parseFloat(b.cells[col].textContent);
    return asc ? va - vb : vb - va;
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use markmerge_core::model::{Choice, Grade, QuestionOutcome, ScoredRow};
    use markmerge_core::pipeline::MergeOutcome;

    fn make_test_report(version: &str) -> MergeReport {
        let outcome = MergeOutcome {
            rows: vec![ScoredRow {
                name: "Lee,Avery".into(),
                id: "1234".into(),
                email: "avery@example.edu".into(),
                gb: vec![],
                version: version.into(),
                grade: Some(Grade {
                    correct: 1,
                    total: 2,
                    score_achieved: 1.0,
                    score_possible: 2.0,
                    percent: "50.00".into(),
                    per_question: vec![
                        QuestionOutcome {
                            number: 1,
                            response: Some(Choice::A),
                            accepted_display: "A".into(),
                            is_correct: true,
                        },
                        QuestionOutcome {
                            number: 2,
                            response: Some(Choice::A),
                            accepted_display: "B".into(),
                            is_correct: false,
                        },
                    ],
                }),
            }],
            warnings: vec![],
        };
        MergeReport::new(&outcome, &[1, 2])
    }

    #[test]
    fn html_report_contains_required_elements() {
        let html = generate_html(&make_test_report("A"));

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("<td>A</td>"));
        assert!(html.contains(">Q2</text>"));
        assert!(html.contains("100.0%"));
        assert!(!html.contains("Warnings"));
    }

    #[test]
    fn html_escapes_interpolated_strings() {
        let mut report = make_test_report("<b>A</b>");
        report.warnings.push("scan rows 2 & 3".into());
        let html = generate_html(&report);

        assert!(html.contains("&lt;b&gt;A&lt;/b&gt;"));
        assert!(html.contains("scan rows 2 &amp; 3"));
        assert!(!html.contains("<b>A</b>"));
    }

    #[test]
    fn html_report_write_to_file() {
        let report = make_test_report("A");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.html");

        write_html_report(&report, &path).unwrap();
        assert!(path.exists());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}
