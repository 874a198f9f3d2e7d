//! Audio output
//!
//! The output container follows the input extension. WAV has a write path
//! (32-bit float at the source sample rate and channel count); any other
//! container fails per file with an `Encode` error, the same way a decode
//! failure is isolated to its file.

use std::path::Path;

use log::debug;

use crate::dsp::AudioBuffer;
use crate::error::{Result, SoundFixError};

/// Write a buffer into the container named by the path's extension.
///
/// Only `.wav` has an encoder; other extensions return a per-file
/// `Encode` error without touching the filesystem.
pub fn write_audio(path: &Path, buffer: &AudioBuffer) -> Result<()> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "wav" => write_wav(path, buffer),
        other => Err(SoundFixError::Encode {
            path: path.to_path_buf(),
            reason: format!("no encoder for container '.{other}'"),
        }),
    }
}

/// Write a buffer as 32-bit float WAV.
///
/// On a write failure any partially written file is removed so the output
/// directory never holds a truncated asset.
pub fn write_wav(path: &Path, buffer: &AudioBuffer) -> Result<()> {
    let spec = hound::WavSpec {
        channels: buffer.num_channels() as u16,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let result = write_samples(path, spec, buffer);
    if result.is_err() {
        let _ = std::fs::remove_file(path);
    }
    result
}

fn write_samples(path: &Path, spec: hound::WavSpec, buffer: &AudioBuffer) -> Result<()> {
    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    for frame in 0..buffer.num_samples() {
        for ch in 0..buffer.num_channels() {
            writer
                .write_sample(buffer.channel(ch)[frame])
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
        }
    }

    writer
        .finalize()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    debug!(
        "wrote '{}' ({} ch, {} samples @ {} Hz)",
        path.display(),
        buffer.num_channels(),
        buffer.num_samples(),
        buffer.sample_rate()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_writes_float_wav() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.wav");

        let mut buffer = AudioBuffer::new(2, 100, 44100);
        buffer.channel_mut(0)[0] = 0.5;
        buffer.channel_mut(1)[0] = -0.5;
        write_wav(&path, &buffer).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 44100);
        assert_eq!(spec.bits_per_sample, 32);
        assert_eq!(spec.sample_format, hound::SampleFormat::Float);
        assert_eq!(reader.len(), 200);
    }

    #[test]
    fn test_unencodable_container_is_per_file_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("processed_tone.ogg");

        let buffer = AudioBuffer::new(1, 10, 44100);
        let err = write_audio(&path, &buffer).unwrap_err();
        assert_eq!(err.error_code(), "ENCODE_ERROR");
        assert!(!err.is_fatal());
        assert!(!path.exists());
    }

    #[test]
    fn test_write_audio_dispatches_wav() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("processed_tone.WAV");

        let buffer = AudioBuffer::new(1, 10, 44100);
        write_audio(&path, &buffer).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_failed_write_leaves_no_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing_subdir").join("out.wav");

        let buffer = AudioBuffer::new(1, 10, 44100);
        assert!(write_wav(&path, &buffer).is_err());
        assert!(!path.exists());
    }
}
