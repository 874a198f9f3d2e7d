//! Per-file results and the end-of-run summary

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Result, SoundFixError};

/// What happened to one enumerated file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Processed and written
    Success { category: String, output: PathBuf },
    /// No rule matched; the file is left untouched
    Skipped { reason: String },
    /// Decode or processing failure, isolated to this file
    Failed { code: String, message: String },
}

/// One enumerated file and its outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub input: PathBuf,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

impl FileReport {
    pub fn success(input: PathBuf, category: &str, output: PathBuf) -> Self {
        Self {
            input,
            outcome: FileOutcome::Success {
                category: category.to_string(),
                output,
            },
        }
    }

    pub fn skipped(input: PathBuf, reason: impl Into<String>) -> Self {
        Self {
            input,
            outcome: FileOutcome::Skipped {
                reason: reason.into(),
            },
        }
    }

    pub fn failed(input: PathBuf, err: &SoundFixError) -> Self {
        Self {
            input,
            outcome: FileOutcome::Failed {
                code: err.error_code().to_string(),
                message: err.to_string(),
            },
        }
    }

    /// One-line description for progress reporting.
    pub fn message(&self) -> String {
        let name = self
            .input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.input.display().to_string());
        match &self.outcome {
            FileOutcome::Success { category, .. } => format!("{name}: processed ({category})"),
            FileOutcome::Skipped { reason } => format!("{name}: skipped ({reason})"),
            FileOutcome::Failed { code, .. } => format!("{name}: failed ({code})"),
        }
    }
}

/// Totals and artifacts for one finished (or aborted) run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub success: usize,
    pub skipped: usize,
    pub failed: usize,
    pub reports: Vec<FileReport>,
    pub output_dir: PathBuf,
    /// `None` when packaging failed or nothing was processed
    pub archive_path: Option<PathBuf>,
    /// Whether the run was cancelled before all files were seen
    pub cancelled: bool,
}

impl BatchSummary {
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            success: 0,
            skipped: 0,
            failed: 0,
            reports: Vec::new(),
            output_dir,
            archive_path: None,
            cancelled: false,
        }
    }

    pub fn record(&mut self, report: FileReport) {
        match report.outcome {
            FileOutcome::Success { .. } => self.success += 1,
            FileOutcome::Skipped { .. } => self.skipped += 1,
            FileOutcome::Failed { .. } => self.failed += 1,
        }
        self.reports.push(report);
    }

    pub fn total(&self) -> usize {
        self.reports.len()
    }

    /// Serialize the summary as JSON next to the processed files.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| SoundFixError::Config {
            detail: format!("cannot serialize summary: {e}"),
        })?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// State machine for one batch run, surfaced through progress events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    Idle,
    LoadingRules,
    Enumerating,
    Processing,
    Packaging,
    Done,
    Aborted,
}

impl std::fmt::Display for BatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BatchState::Idle => "idle",
            BatchState::LoadingRules => "loading rules",
            BatchState::Enumerating => "enumerating",
            BatchState::Processing => "processing",
            BatchState::Packaging => "packaging",
            BatchState::Done => "done",
            BatchState::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// Progress notifications emitted while a run is underway.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    StateChanged(BatchState),
    /// One file finished (or was skipped / failed); `index` is 1-based.
    FileDone {
        index: usize,
        total: usize,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_summary_tallies_outcomes() {
        let mut summary = BatchSummary::new(PathBuf::from("/tmp/out"));
        summary.record(FileReport::success(
            PathBuf::from("a.wav"),
            "Footstep",
            PathBuf::from("processed_a.wav"),
        ));
        summary.record(FileReport::skipped(PathBuf::from("b.wav"), "no matching rule"));
        summary.record(FileReport::failed(
            PathBuf::from("c.wav"),
            &SoundFixError::Decode {
                path: PathBuf::from("c.wav"),
                reason: "truncated".to_string(),
            },
        ));

        assert_eq!(summary.success, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total(), 3);
    }

    #[test]
    fn test_report_messages_name_the_file() {
        let report = FileReport::skipped(PathBuf::from("sfx/explosion.wav"), "no matching rule");
        assert_eq!(report.message(), "explosion.wav: skipped (no matching rule)");

        let report = FileReport::success(
            PathBuf::from("sfx/footstep_01.wav"),
            "Footstep",
            PathBuf::from("processed_footstep_01.wav"),
        );
        assert_eq!(report.message(), "footstep_01.wav: processed (Footstep)");
    }

    #[test]
    fn test_failed_report_carries_error_code() {
        let err = SoundFixError::Numeric {
            path: PathBuf::from("c.wav"),
        };
        let report = FileReport::failed(PathBuf::from("c.wav"), &err);
        assert!(matches!(
            &report.outcome,
            FileOutcome::Failed { code, .. } if code == "NUMERIC_ERROR"
        ));
    }
}
