//! Text (terminal) reporter with colors and formatting

use crate::models::{CheckReport, Grade, Report};
use anyhow::Result;

/// Grade colors (ANSI escape codes)
fn grade_color(grade: Grade) -> &'static str {
    match grade {
        Grade::APlus | Grade::A => "\x1b[32m", // Green
        Grade::B => "\x1b[92m",                // Light green
        Grade::C => "\x1b[33m",                // Yellow
        Grade::D | Grade::E => "\x1b[91m",     // Light red
        Grade::F => "\x1b[31m",                // Red
    }
}

/// Reset ANSI color
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Issues listed per check before the rest are summarized
const MAX_ISSUES_PER_CHECK: usize = 20;

/// Render report as formatted terminal output
pub fn render(report: &Report) -> Result<String> {
    let mut out = String::new();

    // Header
    let grade_c = grade_color(report.grade);
    out.push_str(&format!("\n{BOLD}codegrade report{RESET}  {DIM}{}{RESET}\n", report.path.display()));
    out.push_str(&format!(
        "{DIM}──────────────────────────────────────{RESET}\n"
    ));
    out.push_str(&format!(
        "Score: {BOLD}{:.1}/100{RESET}  Grade: {grade_c}{BOLD}{}{RESET}  ",
        report.score, report.grade
    ));
    out.push_str(&format!(
        "Files: {}  Skipped: {}  Issues: {}\n\n",
        report.files, report.skipped, report.issues
    ));

    out.push_str(&format!("{BOLD}CHECKS{RESET}\n"));
    for check in &report.checks {
        out.push_str(&format!(
            "  {:<14} {}  {DIM}weight {:.2}{RESET}\n",
            check.name,
            format_check_score(check),
            check.weight
        ));
    }
    out.push('\n');

    for check in report.checks.iter().filter(|c| !c.passed()) {
        render_check_details(&mut out, check);
    }

    if report.checks.iter().all(CheckReport::passed) {
        out.push_str(&format!("{DIM}No issues found.{RESET}\n"));
    }

    Ok(out)
}

fn render_check_details(out: &mut String, check: &CheckReport) {
    out.push_str(&format!("{BOLD}{}{RESET}", check.name));
    if !check.description.is_empty() {
        out.push_str(&format!("  {DIM}{}{RESET}", check.description));
    }
    out.push('\n');

    if let Some(error) = &check.error {
        out.push_str(&format!("  \x1b[31merror:{RESET} {}\n", error));
    }

    let mut shown = 0;
    let mut total = 0;
    for summary in &check.file_summaries {
        total += summary.issues.len();
        if shown >= MAX_ISSUES_PER_CHECK {
            continue;
        }
        if summary.source_url.is_empty() {
            out.push_str(&format!("  {}\n", summary.filename));
        } else {
            out.push_str(&format!(
                "  {}  {DIM}{}{RESET}\n",
                summary.filename, summary.source_url
            ));
        }
        for issue in &summary.issues {
            if shown >= MAX_ISSUES_PER_CHECK {
                break;
            }
            out.push_str(&format!(
                "    {DIM}{:>5}{RESET}  {}\n",
                issue.line_number, issue.message
            ));
            shown += 1;
        }
    }

    let remaining = total.saturating_sub(shown);
    if remaining > 0 {
        out.push_str(&format!("  {DIM}...and {} more{RESET}\n", remaining));
    }
    out.push('\n');
}

/// Format a check score (0-1) as a colored percentage
fn format_check_score(check: &CheckReport) -> String {
    if check.error.is_some() {
        return format!("\x1b[31m{:>6}{RESET}", "failed");
    }
    let pct = check.score * 100.0;
    let color = if pct >= 80.0 {
        "\x1b[32m"
    } else if pct >= 60.0 {
        "\x1b[33m"
    } else {
        "\x1b[31m"
    };
    format!("{color}{:>5.1}%{RESET}", pct)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FileSummary, Issue};
    use crate::reporters::tests::test_report;

    fn strip_ansi(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            if c == '\x1b' {
                for c in chars.by_ref() {
                    if c == 'm' {
                        break;
                    }
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn test_text_render_contains_summary() {
        let text = strip_ansi(&render(&test_report()).unwrap());
        assert!(text.contains("Score: 72.5/100"));
        assert!(text.contains("Grade: B"));
        assert!(text.contains("Files: 8  Skipped: 2  Issues: 1"));
        assert!(text.contains("golint"));
        assert!(text.contains(" 87.5%"));
        assert!(text.contains("failed"));
    }

    #[test]
    fn test_text_render_lists_issues_and_errors() {
        let text = strip_ansi(&render(&test_report()).unwrap());
        assert!(text.contains("r/pkg/a.go  https://github.com/o/r/blob/master/pkg/a.go"));
        assert!(text.contains("   12  exported function Run should have comment"));
        assert!(text.contains("error: go_vet exited with exit code 2"));
    }

    #[test]
    fn test_text_render_truncates_long_checks() {
        let mut report = test_report();
        let mut summary = FileSummary::new("big.go", "");
        for line in 1..=30 {
            summary.add_issue(Issue::new(line, "misspelled word"));
        }
        report.checks[0].file_summaries = vec![summary];

        let text = strip_ansi(&render(&report).unwrap());
        assert_eq!(text.matches("misspelled word").count(), MAX_ISSUES_PER_CHECK);
        assert!(text.contains("...and 10 more"));
    }

    #[test]
    fn test_text_render_clean_report() {
        let mut report = test_report();
        for check in &mut report.checks {
            check.file_summaries.clear();
            check.error = None;
        }
        let text = strip_ansi(&render(&report).unwrap());
        assert!(text.contains("No issues found."));
    }
}
