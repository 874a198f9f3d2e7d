//! The four interchangeable processing engines
//!
//! Every engine ends the same way: apply the preset's output gain, then
//! verify the result is finite. A non-finite sample anywhere rejects the
//! whole file rather than writing a corrupt asset.

use std::path::Path;
use std::str::FromStr;

use log::debug;

use super::buffer::AudioBuffer;
use super::db_to_linear;
use super::dynamics::{self, GateParams};
use super::filter::bandpass_or_passthrough;
use crate::error::{Result, SoundFixError};
use crate::preset::{BandDynamics, PresetRule};

/// Band-edge filter order for the plain Butterworth engine.
const BUTTERWORTH_ORDER: usize = 8;
/// Band-edge filter order for the hybrid split.
const HYBRID_ORDER: usize = 24;
/// Band-edge filter order for the dynamic hybrid split.
const DYNAMIC_HYBRID_ORDER: usize = 32;
/// Band-edge filter order for each multiband band.
const MULTIBAND_ORDER: usize = 24;

/// Residual gate timing for the dynamic hybrid engine (ms).
const RESIDUAL_ATTACK_MS: f32 = 1.0;
const RESIDUAL_RELEASE_MS: f32 = 100.0;

/// Multiband band edges in Hz and per-band gate timings in ms.
///
/// Low reacts fastest and recovers slowest; high is the opposite. The
/// timings are fixed per band, only threshold/ratio come from the preset.
const MULTIBAND_BANDS: [MultibandBand; 3] = [
    MultibandBand {
        low_hz: 20.0,
        high_hz: 250.0,
        attack_ms: 1.0,
        release_ms: 100.0,
    },
    MultibandBand {
        low_hz: 250.0,
        high_hz: 4000.0,
        attack_ms: 5.0,
        release_ms: 50.0,
    },
    MultibandBand {
        low_hz: 4000.0,
        high_hz: 20000.0,
        attack_ms: 10.0,
        release_ms: 20.0,
    },
];

#[derive(Debug, Clone, Copy)]
struct MultibandBand {
    low_hz: f32,
    high_hz: f32,
    attack_ms: f32,
    release_ms: f32,
}

/// A processing engine: one complete input-to-output transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    /// Bandpass only
    Butterworth,
    /// Bandpass plus a statically attenuated out-of-band residual
    HybridBrickwall,
    /// Hybrid with a gate on the residual before attenuation
    DynamicHybridBrickwall,
    /// Per-band gated three-way split, then the hybrid step
    MultibandLimit,
}

impl Engine {
    /// Canonical engine name, as accepted on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Engine::Butterworth => "butterworth",
            Engine::HybridBrickwall => "hybrid",
            Engine::DynamicHybridBrickwall => "dynamic-hybrid",
            Engine::MultibandLimit => "multiband",
        }
    }

    /// All engines, in documentation order.
    pub fn all() -> [Engine; 4] {
        [
            Engine::Butterworth,
            Engine::HybridBrickwall,
            Engine::DynamicHybridBrickwall,
            Engine::MultibandLimit,
        ]
    }

    /// Run this engine over a decoded buffer with the given preset.
    ///
    /// `path` only identifies the file in errors and logs. The input is
    /// never mutated; reruns over the same input are bit-identical.
    pub fn process(
        &self,
        input: &AudioBuffer,
        rule: &PresetRule,
        path: &Path,
    ) -> Result<AudioBuffer> {
        debug!(
            "engine {} on '{}' ({} ch, {} samples @ {} Hz, category {})",
            self.name(),
            path.display(),
            input.num_channels(),
            input.num_samples(),
            input.sample_rate(),
            rule.category
        );

        let mut out = match self {
            Engine::Butterworth => {
                bandpass_or_passthrough(input, rule.lowcut_hz, rule.highcut_hz, BUTTERWORTH_ORDER)
            }
            Engine::HybridBrickwall => hybrid_brickwall(input, rule, None),
            Engine::DynamicHybridBrickwall => {
                let gate = GateParams {
                    threshold_db: rule.gate_threshold_db,
                    ratio: rule.expansion_ratio,
                    attack_ms: RESIDUAL_ATTACK_MS,
                    release_ms: RESIDUAL_RELEASE_MS,
                };
                hybrid_brickwall(input, rule, Some(gate))
            }
            Engine::MultibandLimit => {
                let summed = multiband_sum(input, rule);
                hybrid_brickwall(&summed, rule, None)
            }
        };

        out.scale(db_to_linear(rule.volume_db));

        if !out.is_finite() {
            return Err(SoundFixError::Numeric {
                path: path.to_path_buf(),
            });
        }
        Ok(out)
    }
}

impl FromStr for Engine {
    type Err = SoundFixError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "butterworth" | "bandpass" => Ok(Engine::Butterworth),
            "hybrid" | "hybrid-brickwall" | "brickwall" => Ok(Engine::HybridBrickwall),
            "dynamic-hybrid" | "dynamic" | "dynamic-hybrid-brickwall" => {
                Ok(Engine::DynamicHybridBrickwall)
            }
            "multiband" | "multiband-limit" => Ok(Engine::MultibandLimit),
            _ => Err(SoundFixError::UnknownEngine {
                name: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Split into pass band and residual, attenuate the residual, recombine.
///
/// With `gate` set, the residual is gated before the static attenuation.
/// The split/recombine order matters: gating after attenuation would move
/// the effective threshold by the attenuation amount.
fn hybrid_brickwall(input: &AudioBuffer, rule: &PresetRule, gate: Option<GateParams>) -> AudioBuffer {
    let order = if gate.is_some() {
        DYNAMIC_HYBRID_ORDER
    } else {
        HYBRID_ORDER
    };

    let pass = bandpass_or_passthrough(input, rule.lowcut_hz, rule.highcut_hz, order);
    let mut residual = input.subtract(&pass);

    if let Some(params) = gate {
        dynamics::gate_buffer(&mut residual, &params);
    }
    residual.scale(db_to_linear(rule.attenuation_db));

    pass.add(&residual)
}

/// Three-way band split with a per-band gate, summed back together.
fn multiband_sum(input: &AudioBuffer, rule: &PresetRule) -> AudioBuffer {
    let band_dynamics: [&BandDynamics; 3] = [&rule.mb_low, &rule.mb_mid, &rule.mb_high];

    let mut sum: Option<AudioBuffer> = None;
    for (band, dynamics_params) in MULTIBAND_BANDS.iter().zip(band_dynamics) {
        let mut split =
            bandpass_or_passthrough(input, band.low_hz, band.high_hz, MULTIBAND_ORDER);
        dynamics::gate_buffer(
            &mut split,
            &GateParams {
                threshold_db: dynamics_params.threshold_db,
                ratio: dynamics_params.ratio,
                attack_ms: band.attack_ms,
                release_ms: band.release_ms,
            },
        );
        sum = Some(match sum {
            Some(acc) => acc.add(&split),
            None => split,
        });
    }

    sum.unwrap_or_else(|| input.clone())
}
