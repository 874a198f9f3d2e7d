//! Container decoding into channel-major f32 buffers
//!
//! WAV takes a direct hound path; everything else (and any WAV hound cannot
//! parse) goes through symphonia. Either way the file's native sample rate
//! and channel count are preserved. No resampling happens here.

use std::fs::File;
use std::path::Path;

use log::debug;
use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::dsp::AudioBuffer;
use crate::error::{Result, SoundFixError};

/// Extensions accepted during batch enumeration (lowercase, no dot).
pub const AUDIO_EXTENSIONS: [&str; 6] = ["wav", "mp3", "flac", "ogg", "m4a", "aac"];

/// Whether a path carries one of the accepted audio extensions.
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

fn decode_err(path: &Path, reason: impl Into<String>) -> SoundFixError {
    SoundFixError::Decode {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Decode a whole audio file into memory.
pub fn decode_file(path: &Path) -> Result<AudioBuffer> {
    let is_wav = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));

    if is_wav {
        match decode_with_hound(path) {
            Ok(buffer) => return Ok(buffer),
            Err(err) => {
                debug!(
                    "hound failed on '{}' ({err}), retrying with symphonia",
                    path.display()
                );
            }
        }
    }

    decode_with_symphonia(path)
}

fn decode_with_hound(path: &Path) -> Result<AudioBuffer> {
    let mut reader =
        hound::WavReader::open(path).map_err(|e| decode_err(path, e.to_string()))?;
    let spec = reader.spec();
    let num_channels = spec.channels as usize;

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| decode_err(path, e.to_string()))?,
        (hound::SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| decode_err(path, e.to_string()))?,
        (hound::SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8_388_608.0))
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| decode_err(path, e.to_string()))?,
        (hound::SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| (v as f64 / 2_147_483_648.0) as f32))
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| decode_err(path, e.to_string()))?,
        (_, bits) => {
            return Err(decode_err(path, format!("unsupported bit depth: {bits}")));
        }
    };

    deinterleave(path, interleaved, num_channels, spec.sample_rate)
}

fn decode_with_symphonia(path: &Path) -> Result<AudioBuffer> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension() {
        hint.with_extension(&extension.to_string_lossy());
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| decode_err(path, format!("format probe failed: {e}")))?;

    let mut format_reader = probed.format;

    let track = format_reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| decode_err(path, "no audio track found"))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| decode_err(path, "sample rate unknown"))?;
    let num_channels = track
        .codec_params
        .channels
        .map(|ch| ch.count())
        .ok_or_else(|| decode_err(path, "channel count unknown"))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| decode_err(path, format!("no decoder for codec: {e}")))?;

    let mut channels: Vec<Vec<f32>> = vec![Vec::new(); num_channels];

    loop {
        let packet = match format_reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(decode_err(path, format!("packet read failed: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => append_channel_major(&decoded, &mut channels),
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            // A corrupt packet is skipped, not fatal to the file
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(decode_err(path, format!("decode failed: {e}"))),
        }
    }

    if channels.iter().all(|c| c.is_empty()) {
        return Err(decode_err(path, "no samples decoded"));
    }

    AudioBuffer::from_channels(channels, sample_rate)
        .map_err(|e| decode_err(path, e.to_string()))
}

/// Append one decoded packet's frames to the accumulating channel vectors.
fn append_channel_major(decoded: &AudioBufferRef<'_>, channels: &mut [Vec<f32>]) {
    macro_rules! copy_planes {
        ($buf:expr, $convert:expr) => {{
            let buf = $buf;
            for (ch, out) in channels.iter_mut().enumerate() {
                if ch < buf.spec().channels.count() {
                    out.extend(buf.chan(ch).iter().map($convert));
                }
            }
        }};
    }

    match decoded {
        AudioBufferRef::F32(buf) => copy_planes!(buf, |&s| s),
        AudioBufferRef::F64(buf) => copy_planes!(buf, |&s| s as f32),
        AudioBufferRef::S8(buf) => copy_planes!(buf, |&s| s as f32 / 128.0),
        AudioBufferRef::S16(buf) => copy_planes!(buf, |&s| s as f32 / 32768.0),
        AudioBufferRef::S24(buf) => copy_planes!(buf, |&s| s.inner() as f32 / 8_388_608.0),
        AudioBufferRef::S32(buf) => {
            copy_planes!(buf, |&s| (s as f64 / 2_147_483_648.0) as f32)
        }
        AudioBufferRef::U8(buf) => copy_planes!(buf, |&s| (s as f32 - 128.0) / 128.0),
        AudioBufferRef::U16(buf) => copy_planes!(buf, |&s| (s as f32 - 32768.0) / 32768.0),
        AudioBufferRef::U24(buf) => {
            copy_planes!(buf, |&s| (s.inner() as f32 - 8_388_608.0) / 8_388_608.0)
        }
        AudioBufferRef::U32(buf) => {
            copy_planes!(buf, |&s| ((s as f64 - 2_147_483_648.0) / 2_147_483_648.0) as f32)
        }
    }
}

fn deinterleave(
    path: &Path,
    interleaved: Vec<f32>,
    num_channels: usize,
    sample_rate: u32,
) -> Result<AudioBuffer> {
    if num_channels == 0 {
        return Err(decode_err(path, "zero channels"));
    }

    let num_samples = interleaved.len() / num_channels;
    let mut channels = vec![Vec::with_capacity(num_samples); num_channels];
    for frame in interleaved.chunks_exact(num_channels) {
        for (ch, &sample) in frame.iter().enumerate() {
            channels[ch].push(sample);
        }
    }

    AudioBuffer::from_channels(channels, sample_rate)
        .map_err(|e| decode_err(path, e.to_string()))
}
