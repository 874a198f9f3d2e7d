//! CLI command implementations

use std::path::Path;

use log::info;

use crate::batch::{self, BatchConfig, BatchOutcome, ProgressEvent, RuleSource};
use crate::dsp::Engine;
use crate::error::Result;
use crate::preset::PresetStore;

/// Run a full batch over a directory tree.
pub fn process(
    root: &Path,
    dest: Option<&Path>,
    rules: Option<&Path>,
    engine_name: &str,
) -> Result<()> {
    let engine: Engine = engine_name.parse()?;
    info!(
        "processing '{}' with engine '{}'",
        root.display(),
        engine.name()
    );

    let config = BatchConfig {
        input_root: root.to_path_buf(),
        dest_dir: dest.map(Path::to_path_buf),
        rules: match rules {
            Some(path) => RuleSource::Table(path.to_path_buf()),
            None => RuleSource::Builtin,
        },
        engine,
        work_dir: None,
    };

    let handle = batch::spawn(config);
    for event in handle.events() {
        if let ProgressEvent::FileDone {
            index,
            total,
            message,
        } = event
        {
            println!("[{index}/{total}] {message}");
        }
    }

    match handle.join()? {
        BatchOutcome::Completed(summary) => {
            println!(
                "Done: {} processed, {} skipped, {} failed",
                summary.success, summary.skipped, summary.failed
            );
            println!("Output directory: {}", summary.output_dir.display());
            match &summary.archive_path {
                Some(path) => println!("Archive: {}", path.display()),
                None if summary.success > 0 => println!("Archive: packaging failed, see log"),
                None => {}
            }
            if summary.cancelled {
                println!("Run was cancelled before all files were seen.");
            }
        }
        BatchOutcome::NoAudioFiles => {
            println!("No audio files found under {}", root.display());
        }
    }

    Ok(())
}

/// Print the active rule set in priority order.
pub fn presets(rules: Option<&Path>) -> Result<()> {
    let store = match rules {
        Some(path) => PresetStore::load(path)?,
        None => PresetStore::builtin(),
    };

    println!(
        "{:<9} {:<18} {:>8} {:>8} {:>7} {:>8}  keywords",
        "priority", "category", "lowcut", "highcut", "volume", "atten"
    );
    for rule in store.rules() {
        println!(
            "{:<9} {:<18} {:>8} {:>8} {:>7} {:>8}  {}",
            rule.priority,
            rule.category,
            rule.lowcut_hz,
            rule.highcut_hz,
            rule.volume_db,
            rule.attenuation_db,
            rule.keywords.join(", ")
        );
    }

    Ok(())
}

/// Print the available engine names.
pub fn engines() -> Result<()> {
    for engine in Engine::all() {
        println!("{}", engine.name());
    }
    Ok(())
}
