//! Classification rules and preset resolution
//!
//! A preset rule ties a set of filename keywords to the spectral and
//! dynamics parameters the engines consume. Rule sets come from one of two
//! backends behind the same store interface: the compiled-in defaults or an
//! externally loaded table.

mod matcher;
mod store;

use serde::{Deserialize, Serialize};

pub use matcher::match_rule;
pub use store::PresetStore;

/// Threshold/ratio pair for one multiband limiter band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandDynamics {
    /// Envelope threshold in dBFS
    pub threshold_db: f32,
    /// Gain applied to sub-threshold frames
    pub ratio: f32,
}

/// Declared default for optional multiband columns: neutral band dynamics.
pub const DEFAULT_BAND_DYNAMICS: BandDynamics = BandDynamics {
    threshold_db: -40.0,
    ratio: 1.0,
};

/// One classification rule: keywords plus processing parameters.
///
/// Rule sets are always sorted ascending by `priority` before matching;
/// the first rule with a keyword hit wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetRule {
    /// Ascending = higher precedence
    pub priority: u32,
    /// Category label for logs and summaries
    pub category: String,
    /// Lowercase substrings matched against the lowercased filename
    pub keywords: Vec<String>,
    /// Bandpass low cutoff in Hz
    pub lowcut_hz: f32,
    /// Bandpass high cutoff in Hz (must stay below Nyquist for filtering)
    pub highcut_hz: f32,
    /// Final output gain in dB
    pub volume_db: f32,
    /// Residual-band attenuation in dB (hybrid engines)
    pub attenuation_db: f32,
    /// Residual gate threshold in dBFS (dynamic hybrid engine)
    pub gate_threshold_db: f32,
    /// Residual gate sub-threshold multiplier (dynamic hybrid engine)
    pub expansion_ratio: f32,
    /// Low-band (20-250 Hz) dynamics for the multiband engine
    pub mb_low: BandDynamics,
    /// Mid-band (250-4000 Hz) dynamics for the multiband engine
    pub mb_mid: BandDynamics,
    /// High-band (4000-20000 Hz) dynamics for the multiband engine
    pub mb_high: BandDynamics,
}
