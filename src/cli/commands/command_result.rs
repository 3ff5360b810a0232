use std::path::PathBuf;

use crate::i18n::{
    bundle::ScanWarning,
    check::{Issue, Severity},
};

#[derive(Debug)]
pub enum CommandSummary {
    Check(CheckSummary),
    Merge(MergeSummary),
    Init(InitSummary),
}

#[derive(Debug)]
pub struct CheckSummary {
    pub issues: Vec<Issue>,
    pub locale_count: usize,
    pub files_checked: usize,
}

#[derive(Debug)]
pub struct MergeSummary {
    /// Files written, in locale order.
    pub written: Vec<PathBuf>,
    /// Messages written to `*.untranslated.json` files, over all locales.
    pub untranslated_count: usize,
}

#[derive(Debug)]
pub struct InitSummary {
    pub created: bool,
}

/// Result of running glossa commands
#[derive(Debug)]
pub struct CommandResult {
    pub summary: CommandSummary,
    pub error_count: usize,
    pub warning_count: usize,
    /// If true, exit code 1 is returned when any issue was found.
    pub exit_on_issues: bool,
    /// Translation files that could not be loaded.
    pub scan_warnings: Vec<ScanWarning>,
}

impl CommandResult {
    pub fn check(summary: CheckSummary, scan_warnings: Vec<ScanWarning>) -> Self {
        let error_count = summary
            .issues
            .iter()
            .filter(|i| i.severity() == Severity::Error)
            .count();
        let warning_count = summary.issues.len() - error_count;
        Self {
            summary: CommandSummary::Check(summary),
            error_count,
            warning_count,
            exit_on_issues: true,
            scan_warnings,
        }
    }

    pub fn merge(summary: MergeSummary, scan_warnings: Vec<ScanWarning>) -> Self {
        Self {
            summary: CommandSummary::Merge(summary),
            error_count: 0,
            warning_count: 0,
            exit_on_issues: false,
            scan_warnings,
        }
    }

    pub fn init(summary: InitSummary) -> Self {
        Self {
            summary: CommandSummary::Init(summary),
            error_count: 0,
            warning_count: 0,
            exit_on_issues: true,
            scan_warnings: Vec::new(),
        }
    }
}
