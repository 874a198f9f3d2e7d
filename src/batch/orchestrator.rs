//! Batch run orchestration
//!
//! One run walks an input tree, classifies each audio file against the rule
//! set, processes the matches through the selected engine, and packages the
//! results. Fatal problems (bad rule table, uncreatable output directory)
//! abort before any file is touched; everything per-file is recorded in the
//! summary and the run continues.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use chrono::Local;
use crossbeam_channel::{unbounded, Receiver};
use log::{error, info, warn};
use walkdir::WalkDir;

use super::archive;
use super::report::{BatchState, BatchSummary, FileReport, ProgressEvent};
use crate::audio::{decode_file, is_audio_file, write_audio};
use crate::dsp::Engine;
use crate::error::{Result, SoundFixError};
use crate::preset::PresetStore;

/// File name of the JSON run report written into the output directory.
pub const REPORT_FILE_NAME: &str = "report.json";

/// Where the classification rules come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSource {
    /// Compiled-in defaults
    Builtin,
    /// Semicolon-delimited table on disk
    Table(PathBuf),
}

/// Everything one batch run needs.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Directory walked recursively for audio files
    pub input_root: PathBuf,
    /// Optional delivery directory for the finished archive
    pub dest_dir: Option<PathBuf>,
    pub rules: RuleSource,
    pub engine: Engine,
    /// Where the run directory and archive are created; system temp when unset
    pub work_dir: Option<PathBuf>,
}

impl BatchConfig {
    pub fn new(input_root: impl Into<PathBuf>, engine: Engine) -> Self {
        Self {
            input_root: input_root.into(),
            dest_dir: None,
            rules: RuleSource::Builtin,
            engine,
            work_dir: None,
        }
    }
}

/// Cooperative cancellation flag, checked between files.
///
/// Cancelling never discards finished work; files already processed are
/// still packaged.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// How a run ended when no fatal error occurred.
#[derive(Debug)]
pub enum BatchOutcome {
    Completed(BatchSummary),
    /// The input tree held no files with an accepted audio extension
    NoAudioFiles,
}

/// Run a batch synchronously, reporting progress through the callback.
pub fn run(
    config: &BatchConfig,
    cancel: &CancelToken,
    mut on_progress: impl FnMut(ProgressEvent),
) -> Result<BatchOutcome> {
    on_progress(ProgressEvent::StateChanged(BatchState::LoadingRules));
    let store = match &config.rules {
        RuleSource::Builtin => PresetStore::builtin(),
        RuleSource::Table(path) => PresetStore::load(path)?,
    };

    on_progress(ProgressEvent::StateChanged(BatchState::Enumerating));
    let files = enumerate_audio_files(&config.input_root)?;
    if files.is_empty() {
        info!(
            "no audio files under '{}', nothing to do",
            config.input_root.display()
        );
        return Ok(BatchOutcome::NoAudioFiles);
    }
    info!(
        "found {} audio files under '{}'",
        files.len(),
        config.input_root.display()
    );

    let run_name = run_name(&config.input_root);
    let base = config
        .work_dir
        .clone()
        .unwrap_or_else(std::env::temp_dir);
    let output_dir = base.join(&run_name);
    std::fs::create_dir_all(&output_dir)?;

    let mut summary = BatchSummary::new(output_dir.clone());
    let mut used_names: HashSet<String> = HashSet::new();
    let total = files.len();

    on_progress(ProgressEvent::StateChanged(BatchState::Processing));
    for (index, path) in files.iter().enumerate() {
        if cancel.is_cancelled() {
            info!("cancellation requested, packaging {} finished files", summary.success);
            summary.cancelled = true;
            break;
        }

        let report = process_file(path, &store, config.engine, &output_dir, &mut used_names);
        info!("[{}/{}] {}", index + 1, total, report.message());
        on_progress(ProgressEvent::FileDone {
            index: index + 1,
            total,
            message: report.message(),
        });
        summary.record(report);
    }

    // The output directory is packaged even when nothing was processed;
    // the archive then documents an empty (or all-failed) run
    on_progress(ProgressEvent::StateChanged(BatchState::Packaging));
    let archive_path = base.join(format!("{run_name}.zip"));
    match archive::archive_directory(&output_dir, &archive_path) {
        Ok(()) => {
            summary.archive_path = match &config.dest_dir {
                Some(dest) => archive::copy_to_dest(&archive_path, dest).or(Some(archive_path)),
                None => Some(archive_path),
            };
        }
        // A lost archive is reported, not fatal; the output directory
        // still holds every processed file
        Err(e) => error!("{e}"),
    }

    if let Err(e) = summary.write_json(&output_dir.join(REPORT_FILE_NAME)) {
        error!("cannot write run report: {e}");
    }

    let final_state = if summary.cancelled {
        BatchState::Aborted
    } else {
        BatchState::Done
    };
    on_progress(ProgressEvent::StateChanged(final_state));
    info!(
        "run {}: {} processed, {} skipped, {} failed",
        final_state, summary.success, summary.skipped, summary.failed
    );

    Ok(BatchOutcome::Completed(summary))
}

/// A batch running on a worker thread, with progress over a channel.
pub struct BatchHandle {
    worker: thread::JoinHandle<Result<BatchOutcome>>,
    events: Receiver<ProgressEvent>,
    cancel: CancelToken,
}

impl BatchHandle {
    pub fn events(&self) -> &Receiver<ProgressEvent> {
        &self.events
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Block until the run finishes and return its outcome.
    pub fn join(self) -> Result<BatchOutcome> {
        match self.worker.join() {
            Ok(result) => result,
            Err(_) => Err(SoundFixError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "batch worker thread panicked",
            ))),
        }
    }
}

/// Run a batch on a background thread.
///
/// Progress events arrive on the handle's channel; dropping the receiver
/// side never blocks the worker.
pub fn spawn(config: BatchConfig) -> BatchHandle {
    let (tx, rx) = unbounded();
    let cancel = CancelToken::new();
    let worker_cancel = cancel.clone();

    let worker = thread::spawn(move || {
        run(&config, &worker_cancel, move |event| {
            let _ = tx.send(event);
        })
    });

    BatchHandle {
        worker,
        events: rx,
        cancel,
    }
}

/// All accepted audio files under the root, in stable sorted order.
///
/// A missing root is fatal; unreadable entries further down the tree are
/// logged and skipped, the walk continues.
fn enumerate_audio_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(SoundFixError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("input root '{}' is not a directory", root.display()),
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable entry: {e}");
                continue;
            }
        };
        if entry.file_type().is_file() && is_audio_file(entry.path()) {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

fn run_name(input_root: &Path) -> String {
    let folder = input_root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "batch".to_string());
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    format!("SoundFix_{folder}_{stamp}")
}

/// Output file name for one input, deduplicated across the flat output dir.
///
/// The input's extension is kept; the output container follows it.
fn output_name(input: &Path, used: &mut HashSet<String>) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unnamed".to_string());
    let ext = input
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut name = format!("processed_{stem}{ext}");
    let mut counter = 2;
    while !used.insert(name.clone()) {
        name = format!("processed_{stem}_{counter}{ext}");
        counter += 1;
    }
    name
}

/// Classify, decode, process, and write one file. Never propagates; every
/// failure becomes a `Failed` report for this file alone.
fn process_file(
    path: &Path,
    store: &PresetStore,
    engine: Engine,
    output_dir: &Path,
    used_names: &mut HashSet<String>,
) -> FileReport {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let Some(rule) = store.match_rule(&filename) else {
        return FileReport::skipped(path.to_path_buf(), "no matching rule");
    };

    let result = decode_file(path)
        .and_then(|input| engine.process(&input, rule, path))
        .and_then(|processed| {
            let output = output_dir.join(output_name(path, used_names));
            write_audio(&output, &processed)?;
            Ok(output)
        });

    match result {
        Ok(output) => FileReport::success(path.to_path_buf(), &rule.category, output),
        Err(e) => FileReport::failed(path.to_path_buf(), &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_names_keep_the_input_extension() {
        let mut used = HashSet::new();
        assert_eq!(
            output_name(Path::new("a/footstep.wav"), &mut used),
            "processed_footstep.wav"
        );
        assert_eq!(
            output_name(Path::new("b/footstep.ogg"), &mut used),
            "processed_footstep.ogg"
        );
    }

    #[test]
    fn test_output_names_are_deduplicated() {
        let mut used = HashSet::new();
        assert_eq!(
            output_name(Path::new("a/footstep.wav"), &mut used),
            "processed_footstep.wav"
        );
        assert_eq!(
            output_name(Path::new("b/footstep.wav"), &mut used),
            "processed_footstep_2.wav"
        );
        assert_eq!(
            output_name(Path::new("c/footstep.wav"), &mut used),
            "processed_footstep_3.wav"
        );
    }

    #[test]
    fn test_run_name_uses_folder_and_timestamp() {
        let name = run_name(Path::new("/assets/sfx_pack"));
        assert!(name.starts_with("SoundFix_sfx_pack_"));
        // SoundFix_<folder>_YYYYMMDD_HHMMSS
        let stamp = name.strip_prefix("SoundFix_sfx_pack_").unwrap();
        assert_eq!(stamp.len(), 15);
    }

    #[test]
    fn test_missing_root_is_fatal_io() {
        let err = enumerate_audio_files(Path::new("/nonexistent/assets")).unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
    }

    #[test]
    fn test_cancelled_token_round_trip() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
