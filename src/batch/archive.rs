//! Zip packaging of a finished output directory

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Result, SoundFixError};

fn archive_err(reason: impl Into<String>) -> SoundFixError {
    SoundFixError::Archive {
        reason: reason.into(),
    }
}

/// Deflate every regular file in `dir` (non-recursive) into one archive.
///
/// Entry names are the flat file names; the output directory itself is not
/// reproduced inside the archive.
pub fn archive_directory(dir: &Path, archive_path: &Path) -> Result<()> {
    let file = File::create(archive_path)
        .map_err(|e| archive_err(format!("cannot create '{}': {e}", archive_path.display())))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| archive_err(format!("cannot read '{}': {e}", dir.display())))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    entries.sort();

    for path in &entries {
        let name = path
            .file_name()
            .ok_or_else(|| archive_err(format!("unnameable entry '{}'", path.display())))?
            .to_string_lossy();
        writer
            .start_file(name.as_ref(), options)
            .map_err(|e| archive_err(format!("cannot add '{name}': {e}")))?;
        let mut input = File::open(path)
            .map_err(|e| archive_err(format!("cannot open '{}': {e}", path.display())))?;
        io::copy(&mut input, &mut writer)
            .map_err(|e| archive_err(format!("cannot write '{name}': {e}")))?;
    }

    writer
        .finish()
        .map_err(|e| archive_err(format!("cannot finalize archive: {e}")))?;

    info!(
        "archived {} files into '{}'",
        entries.len(),
        archive_path.display()
    );
    Ok(())
}

/// Best-effort copy of the archive to a destination directory.
///
/// A failed copy is logged and swallowed; the archive still exists at its
/// original location.
pub fn copy_to_dest(archive_path: &Path, dest_dir: &Path) -> Option<PathBuf> {
    let name = archive_path.file_name()?;
    let target = dest_dir.join(name);
    if target == archive_path {
        return Some(target);
    }

    match std::fs::create_dir_all(dest_dir)
        .and_then(|_| std::fs::copy(archive_path, &target))
    {
        Ok(_) => Some(target),
        Err(e) => {
            warn!(
                "cannot copy archive to '{}': {e}; leaving it at '{}'",
                dest_dir.display(),
                archive_path.display()
            );
            None
        }
    }
}
