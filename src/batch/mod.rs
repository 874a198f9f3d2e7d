//! Batch processing: enumeration, per-file reporting, and packaging

mod archive;
mod orchestrator;
mod report;

pub use archive::{archive_directory, copy_to_dest};
pub use orchestrator::{
    run, spawn, BatchConfig, BatchHandle, BatchOutcome, CancelToken, RuleSource, REPORT_FILE_NAME,
};
pub use report::{BatchState, BatchSummary, FileOutcome, FileReport, ProgressEvent};
