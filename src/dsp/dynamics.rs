//! Short-time energy envelopes and smoothed gain curves
//!
//! The gating/limiting primitive shared by the dynamic engines: an RMS
//! envelope drives a one-sided attenuating gate. Frames at or above the
//! threshold pass at unity; frames below it are multiplied by a fractional
//! ratio. This is deliberately not a textbook upward expander: the preset
//! values in circulation are tuned to the multiply-by-ratio behavior, so the
//! literal curve is preserved.

use super::buffer::AudioBuffer;
use super::db_to_linear;

/// Analysis frame length in samples for the RMS envelope.
pub const FRAME_SIZE: usize = 512;
/// Hop between consecutive envelope frames.
pub const HOP_SIZE: usize = 256;

/// Threshold/ratio/timing for one gating pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateParams {
    /// Envelope threshold in dBFS
    pub threshold_db: f32,
    /// Gain applied to sub-threshold frames (fractional multiplier, e.g. 0.1)
    pub ratio: f32,
    /// Attack time in ms (gain tightening)
    pub attack_ms: f32,
    /// Release time in ms (gain recovery)
    pub release_ms: f32,
}

/// Short-time RMS envelope: one value per hop.
///
/// The final frame may cover fewer than `frame_size` samples; its RMS is
/// taken over whatever remains.
pub fn envelope(signal: &[f32], frame_size: usize, hop: usize) -> Vec<f32> {
    if signal.is_empty() || hop == 0 {
        return Vec::new();
    }

    let mut env = Vec::with_capacity(signal.len() / hop + 1);
    let mut offset = 0;
    while offset < signal.len() {
        let frame = &signal[offset..(offset + frame_size).min(signal.len())];
        let sum_sq: f64 = frame.iter().map(|&s| (s as f64) * (s as f64)).sum();
        env.push((sum_sq / frame.len() as f64).sqrt() as f32);
        offset += hop;
    }
    env
}

/// Per-frame target gain: 1.0 at or above the threshold, `ratio` below it.
pub fn gain_curve(envelope: &[f32], threshold_linear: f32, below_threshold_ratio: f32) -> Vec<f32> {
    envelope
        .iter()
        .map(|&e| {
            if e >= threshold_linear {
                1.0
            } else {
                below_threshold_ratio
            }
        })
        .collect()
}

/// Exponential frame-to-frame smoothing of a gain curve.
///
/// The step coefficient is `1/attack_samples` while the target gain is
/// falling (the gate tightening) and `1/release_samples` while it is rising.
/// State carries across frames and starts at the first target, so a curve
/// that never changes comes back unchanged.
pub fn smooth(curve: &[f32], attack_samples: f32, release_samples: f32) -> Vec<f32> {
    let Some(&first) = curve.first() else {
        return Vec::new();
    };

    let attack_coeff = (1.0 / attack_samples.max(1.0)).min(1.0);
    let release_coeff = (1.0 / release_samples.max(1.0)).min(1.0);

    let mut state = first;
    curve
        .iter()
        .map(|&target| {
            let coeff = if target < state {
                attack_coeff
            } else {
                release_coeff
            };
            state += coeff * (target - state);
            state
        })
        .collect()
}

/// Expand a per-frame curve to per-sample gains.
///
/// Each frame value repeats across `hop` samples; the result is truncated or
/// padded (with the last value) to exactly `target_len`.
pub fn expand_to_samples(curve: &[f32], hop: usize, target_len: usize) -> Vec<f32> {
    let mut gains = Vec::with_capacity(target_len);
    for &g in curve {
        for _ in 0..hop {
            if gains.len() == target_len {
                return gains;
            }
            gains.push(g);
        }
    }
    let pad = curve.last().copied().unwrap_or(1.0);
    gains.resize(target_len, pad);
    gains
}

/// Elementwise multiply of one channel by a per-sample gain vector.
pub fn apply(signal: &mut [f32], gain_samples: &[f32]) {
    for (s, &g) in signal.iter_mut().zip(gain_samples) {
        *s *= g;
    }
}

/// Run the full gate over every channel of a buffer independently.
///
/// Envelope -> threshold curve -> attack/release smoothing -> per-sample
/// expansion -> multiply, with the standard 512/256 framing.
pub fn gate_buffer(buffer: &mut AudioBuffer, params: &GateParams) {
    let sample_rate = buffer.sample_rate() as f32;
    let threshold_linear = db_to_linear(params.threshold_db);
    let attack_samples = params.attack_ms / 1000.0 * sample_rate;
    let release_samples = params.release_ms / 1000.0 * sample_rate;

    for ch in 0..buffer.num_channels() {
        let signal = buffer.channel_mut(ch);
        let env = envelope(signal, FRAME_SIZE, HOP_SIZE);
        let curve = gain_curve(&env, threshold_linear, params.ratio);
        let smoothed = smooth(&curve, attack_samples, release_samples);
        let gains = expand_to_samples(&smoothed, HOP_SIZE, signal.len());
        apply(signal, &gains);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_envelope_frame_count() {
        let signal = vec![0.5f32; 1024];
        let env = envelope(&signal, 512, 256);
        // Frames start at offsets 0, 256, 512, 768
        assert_eq!(env.len(), 4);
    }

    #[test]
    fn test_envelope_of_constant_signal() {
        let signal = vec![0.5f32; 2048];
        let env = envelope(&signal, FRAME_SIZE, HOP_SIZE);
        for &e in &env {
            assert_relative_eq!(e, 0.5, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_envelope_empty_signal() {
        assert!(envelope(&[], FRAME_SIZE, HOP_SIZE).is_empty());
    }

    #[test]
    fn test_gain_curve_one_sided() {
        let env = vec![0.001, 0.5, 0.05, 0.9];
        let curve = gain_curve(&env, 0.1, 0.25);
        assert_eq!(curve, vec![0.25, 1.0, 0.25, 1.0]);
    }

    #[test]
    fn test_gain_curve_at_threshold_passes() {
        // >= threshold is unity, the boundary frame is not attenuated
        let curve = gain_curve(&[0.1], 0.1, 0.25);
        assert_eq!(curve, vec![1.0]);
    }

    #[test]
    fn test_smooth_constant_curve_unchanged() {
        let curve = vec![0.1f32; 16];
        let smoothed = smooth(&curve, 44.1, 4410.0);
        // State starts at the first target: an all-quiet file stays at
        // exactly the gate ratio, never 1.0 and never 0.0
        for &g in &smoothed {
            assert_eq!(g, 0.1);
        }
    }

    #[test]
    fn test_smooth_attack_faster_than_release() {
        // 1 -> 0 transition (falling) uses the attack coefficient,
        // 0 -> 1 (rising) the release coefficient
        let falling = smooth(&[1.0, 0.0, 0.0, 0.0], 2.0, 100.0);
        let rising = smooth(&[0.0, 1.0, 1.0, 1.0], 2.0, 100.0);

        let fall_step = 1.0 - falling[1];
        let rise_step = rising[1];
        assert!(
            fall_step > rise_step,
            "attack (1/2 per frame) should move faster than release (1/100): {fall_step} vs {rise_step}"
        );
    }

    #[test]
    fn test_smooth_converges_to_target() {
        let mut curve = vec![1.0f32];
        curve.extend(std::iter::repeat(0.2).take(500));
        let smoothed = smooth(&curve, 10.0, 100.0);
        assert_relative_eq!(*smoothed.last().unwrap(), 0.2, epsilon = 1e-3);
    }

    #[test]
    fn test_expand_truncates_and_pads() {
        let gains = expand_to_samples(&[0.5, 1.0], 4, 6);
        assert_eq!(gains, vec![0.5, 0.5, 0.5, 0.5, 1.0, 1.0]);

        let gains = expand_to_samples(&[0.5, 1.0], 4, 10);
        assert_eq!(gains.len(), 10);
        assert_eq!(gains[8], 1.0);
        assert_eq!(gains[9], 1.0);
    }

    #[test]
    fn test_apply_is_elementwise() {
        let mut signal = vec![1.0, 2.0, 3.0];
        apply(&mut signal, &[0.5, 0.5, 0.0]);
        assert_eq!(signal, vec![0.5, 1.0, 0.0]);
    }

    #[test]
    fn test_gate_buffer_loud_signal_passes() {
        let mut buffer = AudioBuffer::new(1, 8192, 44100);
        for s in buffer.channel_mut(0).iter_mut() {
            *s = 0.5; // -6 dBFS, far above the threshold
        }
        gate_buffer(
            &mut buffer,
            &GateParams {
                threshold_db: -60.0,
                ratio: 0.1,
                attack_ms: 1.0,
                release_ms: 100.0,
            },
        );
        for &s in buffer.channel(0) {
            assert_relative_eq!(s, 0.5, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_gate_buffer_quiet_signal_scaled_by_ratio() {
        let mut buffer = AudioBuffer::new(1, 8192, 44100);
        for s in buffer.channel_mut(0).iter_mut() {
            *s = 1e-5; // about -100 dBFS, below a -60 dB threshold throughout
        }
        gate_buffer(
            &mut buffer,
            &GateParams {
                threshold_db: -60.0,
                ratio: 0.1,
                attack_ms: 1.0,
                release_ms: 100.0,
            },
        );
        // Sub-threshold for the whole file: scaled by exactly the ratio
        for &s in buffer.channel(0) {
            assert_relative_eq!(s, 1e-6, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_gate_buffer_channels_independent() {
        let mut buffer = AudioBuffer::new(2, 8192, 44100);
        for s in buffer.channel_mut(0).iter_mut() {
            *s = 0.5;
        }
        for s in buffer.channel_mut(1).iter_mut() {
            *s = 1e-5;
        }
        gate_buffer(
            &mut buffer,
            &GateParams {
                threshold_db: -60.0,
                ratio: 0.1,
                attack_ms: 1.0,
                release_ms: 100.0,
            },
        );
        assert_relative_eq!(buffer.channel(0)[4000], 0.5, epsilon = 1e-6);
        assert_relative_eq!(buffer.channel(1)[4000], 1e-6, epsilon = 1e-9);
    }
}
