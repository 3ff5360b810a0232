//! Report formatting and printing utilities.
//!
//! Issues are displayed in cargo-style format. Kept apart from the i18n
//! layer so glossa can be used as a library.

use std::io::{self, Write};

use colored::Colorize;

use super::commands::{CheckSummary, CommandResult, CommandSummary, InitSummary, MergeSummary};
use crate::config::CONFIG_FILE_NAME;
use crate::i18n::{
    bundle::ScanWarning,
    check::{Issue, Severity},
};

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

/// Failure mark for consistent output formatting.
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

/// Print issues to a custom writer.
pub fn report_to<W: Write>(issues: &[Issue], writer: &mut W) {
    if issues.is_empty() {
        return;
    }

    let mut sorted = issues.to_vec();
    sorted.sort_by(|a, b| {
        a.location()
            .cmp(&b.location())
            .then_with(|| a.id.cmp(&b.id))
    });

    for issue in &sorted {
        print_issue(issue, writer);
    }

    print_summary(&sorted, writer);
}

/// Print a success message to a custom writer.
pub fn print_success_to<W: Write>(files: usize, locales: usize, writer: &mut W) {
    let msg = format!(
        "Checked {} {} in {} {} - no issues found",
        files,
        if files == 1 { "file" } else { "files" },
        locales,
        if locales == 1 { "locale" } else { "locales" }
    );
    let _ = writeln!(writer, "{} {}", SUCCESS_MARK.green(), msg.green());
}

/// Print files that could not be loaded; only a count unless verbose.
pub fn print_scan_warnings_to<W: Write>(warnings: &[ScanWarning], verbose: bool, writer: &mut W) {
    if warnings.is_empty() {
        return;
    }
    if verbose {
        for warning in warnings {
            let _ = writeln!(
                writer,
                "{} {}: {}",
                "warning:".bold().yellow(),
                warning.file_path,
                warning.error
            );
        }
    } else {
        let _ = writeln!(
            writer,
            "{} {} file(s) could not be parsed (use {} for details)",
            "warning:".bold().yellow(),
            warnings.len(),
            "-v".cyan()
        );
    }
}

// ============================================================
// Internal Functions
// ============================================================

fn print_issue<W: Write>(issue: &Issue, writer: &mut W) {
    let severity_str = match issue.severity() {
        Severity::Error => "error".bold().red(),
        Severity::Warning => "warning".bold().yellow(),
    };

    let _ = writeln!(
        writer,
        "{}: \"{}\"  {}",
        severity_str,
        issue.message(),
        issue.kind.rule().dimmed().cyan()
    );
    let _ = writeln!(writer, "  {} {}", "-->".blue(), issue.location());
    let _ = writeln!(
        writer,
        "  {} {} {}",
        "=".blue(),
        "note:".bold(),
        issue.details()
    );
    let _ = writeln!(writer); // Empty line between issues
}

fn print_summary<W: Write>(issues: &[Issue], writer: &mut W) {
    let total_errors = issues
        .iter()
        .filter(|i| i.severity() == Severity::Error)
        .count();
    let total_warnings = issues.len() - total_errors;
    let total_problems = total_errors + total_warnings;

    if total_problems > 0 {
        let _ = writeln!(
            writer,
            "{} {} {} ({} {}, {} {})",
            FAILURE_MARK.red(),
            total_problems,
            if total_problems == 1 {
                "problem"
            } else {
                "problems"
            },
            total_errors,
            if total_errors == 1 { "error" } else { "errors" }.red(),
            total_warnings,
            if total_warnings == 1 {
                "warning"
            } else {
                "warnings"
            }
            .yellow()
        );
    }
}

fn print_check_to<W: Write>(summary: &CheckSummary, writer: &mut W) {
    if summary.issues.is_empty() {
        print_success_to(summary.files_checked, summary.locale_count, writer);
    } else {
        report_to(&summary.issues, writer);
    }
}

fn print_merge_to<W: Write>(summary: &MergeSummary, writer: &mut W) {
    for path in &summary.written {
        let _ = writeln!(writer, "{} {}", "Wrote".green().bold(), path.display());
    }
    let _ = writeln!(
        writer,
        "{} {}",
        SUCCESS_MARK.green(),
        format!(
            "Merged {} file(s), {} untranslated message(s)",
            summary.written.len(),
            summary.untranslated_count
        )
        .green()
    );
}

fn print_init(summary: &InitSummary) {
    if summary.created {
        println!(
            "{} {}",
            SUCCESS_MARK.green(),
            format!("Created {}", CONFIG_FILE_NAME).green()
        );
    } else {
        eprintln!("Error: {} already exists", CONFIG_FILE_NAME);
    }
}

pub fn print(result: &CommandResult, verbose: bool) {
    match &result.summary {
        CommandSummary::Check(summary) => print_check_to(summary, &mut io::stdout().lock()),
        CommandSummary::Merge(summary) => print_merge_to(summary, &mut io::stdout().lock()),
        CommandSummary::Init(summary) => print_init(summary),
    }
    print_scan_warnings_to(&result.scan_warnings, verbose, &mut io::stderr().lock());
}
