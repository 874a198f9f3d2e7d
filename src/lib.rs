//! SoundFix - batch conditioner for game sound assets
//!
//! Walks a directory of raw audio exports, classifies each file by the
//! keywords in its name, runs the matching preset through one of four
//! processing engines, and packages the conditioned files for delivery.

pub mod audio;
pub mod batch;
pub mod cli;
pub mod dsp;
pub mod error;
pub mod preset;

pub use batch::{BatchConfig, BatchOutcome, BatchSummary, CancelToken, RuleSource};
pub use dsp::{AudioBuffer, Engine};
pub use error::{Result, SoundFixError};
pub use preset::{PresetRule, PresetStore};
