//! Audio file I/O
//!
//! Decoding accepts the common game-asset containers and always lands in
//! the same in-memory form: channel-major `f32` at the file's native rate
//! and channel count. Encoding follows the input extension; only WAV has
//! a write path, everything else fails per file.

mod decode;
mod encode;

pub use decode::{decode_file, is_audio_file, AUDIO_EXTENSIONS};
pub use encode::{write_audio, write_wav};
