//! Band-limiting IIR filter design and application
//!
//! Bandpass filters are built as a cascade of second-order sections rather
//! than a single high-order transfer function; direct high-order polynomials
//! lose numerical stability long before the order-32 designs the dynamic
//! engines ask for. Each section is an RBJ biquad, with per-stage Q values
//! spread to give an overall Butterworth response.
//!
//! Coefficient formulas from the Audio EQ Cookbook:
//! https://www.w3.org/2011/audio/audio-eq-cookbook.html

use std::f64::consts::PI;

use log::warn;

use super::buffer::AudioBuffer;

/// Why a bandpass design was rejected.
///
/// Legacy policy for an invalid band is "return the input unmodified"; the
/// condition is surfaced so callers can log it rather than hide it.
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidBand {
    /// `low_hz >= high_hz`
    Inverted { low_hz: f32, high_hz: f32 },
    /// A cutoff at or above the Nyquist frequency
    AboveNyquist { cutoff_hz: f32, nyquist_hz: f32 },
}

impl std::fmt::Display for InvalidBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidBand::Inverted { low_hz, high_hz } => {
                write!(f, "lowcut {low_hz} Hz >= highcut {high_hz} Hz")
            }
            InvalidBand::AboveNyquist {
                cutoff_hz,
                nyquist_hz,
            } => write!(f, "cutoff {cutoff_hz} Hz at or above Nyquist {nyquist_hz} Hz"),
        }
    }
}

/// Biquad filter coefficients, normalized by a0.
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
#[derive(Debug, Clone, Copy, Default)]
struct BiquadCoeffs {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl BiquadCoeffs {
    /// Second-order low-pass section at `freq` with the given Q.
    fn low_pass(sample_rate: f64, freq: f64, q: f64) -> Self {
        let w0 = 2.0 * PI * freq / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);

        let b0 = (1.0 - cos_w0) / 2.0;
        let b1 = 1.0 - cos_w0;
        let b2 = (1.0 - cos_w0) / 2.0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Second-order high-pass section at `freq` with the given Q.
    fn high_pass(sample_rate: f64, freq: f64, q: f64) -> Self {
        let w0 = 2.0 * PI * freq / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);

        let b0 = (1.0 + cos_w0) / 2.0;
        let b1 = -(1.0 + cos_w0);
        let b2 = (1.0 + cos_w0) / 2.0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

/// Biquad filter state for one channel (Direct Form I)
#[derive(Debug, Clone, Copy, Default)]
struct BiquadState {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BiquadState {
    fn process(&mut self, input: f64, coeffs: &BiquadCoeffs) -> f64 {
        let output = coeffs.b0 * input + coeffs.b1 * self.x1 + coeffs.b2 * self.x2
            - coeffs.a1 * self.y1
            - coeffs.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }
}

/// Per-stage Q values for a Butterworth cascade of the given (even) order.
///
/// Pole pairs of the Butterworth prototype give Q_k = 1 / (2*sin((2k-1)*pi/(2n)))
/// for k = 1..n/2; cascading one biquad per pair reproduces the maximally-flat
/// magnitude response of the high-order filter.
fn butterworth_qs(order: usize) -> Vec<f64> {
    let n = order as f64;
    (1..=order / 2)
        .map(|k| {
            let theta = (2.0 * k as f64 - 1.0) * PI / (2.0 * n);
            1.0 / (2.0 * theta.sin())
        })
        .collect()
}

/// A designed bandpass filter: a cascade of second-order sections.
///
/// The cascade holds `order/2` high-pass sections at the low cutoff followed
/// by `order/2` low-pass sections at the high cutoff, so `order` is the
/// Butterworth order of each band edge.
#[derive(Debug, Clone)]
pub struct BandpassDesign {
    sections: Vec<BiquadCoeffs>,
}

impl BandpassDesign {
    /// Design a bandpass between `low_hz` and `high_hz`.
    ///
    /// `order` must be even (odd values round down); stable up to order 32.
    /// Returns `InvalidBand` when `low_hz >= high_hz` or either cutoff sits at
    /// or above the Nyquist frequency.
    pub fn design(
        low_hz: f32,
        high_hz: f32,
        sample_rate: u32,
        order: usize,
    ) -> std::result::Result<Self, InvalidBand> {
        let nyquist = sample_rate as f32 / 2.0;

        if low_hz >= high_hz {
            return Err(InvalidBand::Inverted { low_hz, high_hz });
        }
        for cutoff in [low_hz, high_hz] {
            if cutoff >= nyquist {
                return Err(InvalidBand::AboveNyquist {
                    cutoff_hz: cutoff,
                    nyquist_hz: nyquist,
                });
            }
        }

        let order = (order.max(2) / 2) * 2;
        let qs = butterworth_qs(order);
        let sr = sample_rate as f64;

        let mut sections = Vec::with_capacity(order);
        for q in &qs {
            sections.push(BiquadCoeffs::high_pass(sr, low_hz as f64, *q));
        }
        for q in &qs {
            sections.push(BiquadCoeffs::low_pass(sr, high_hz as f64, *q));
        }

        Ok(Self { sections })
    }

    /// Number of second-order sections in the cascade.
    pub fn num_sections(&self) -> usize {
        self.sections.len()
    }

    /// Filter each channel independently with a single causal forward pass.
    ///
    /// Fresh filter state per channel and per call; the design itself is
    /// immutable and reusable.
    pub fn apply(&self, buffer: &AudioBuffer) -> AudioBuffer {
        let mut out = buffer.clone();

        for ch in 0..out.num_channels() {
            let mut states = vec![BiquadState::default(); self.sections.len()];
            for sample in out.channel_mut(ch).iter_mut() {
                let mut acc = *sample as f64;
                for (section, state) in self.sections.iter().zip(states.iter_mut()) {
                    acc = state.process(acc, section);
                }
                *sample = acc as f32;
            }
        }

        out
    }
}

/// Bandpass with the legacy invalid-band policy: on a rejected design the
/// input is returned unmodified and the condition is logged.
pub fn bandpass_or_passthrough(
    buffer: &AudioBuffer,
    low_hz: f32,
    high_hz: f32,
    order: usize,
) -> AudioBuffer {
    match BandpassDesign::design(low_hz, high_hz, buffer.sample_rate(), order) {
        Ok(design) => design.apply(buffer),
        Err(reason) => {
            warn!("invalid band ({reason}); passing signal through unfiltered");
            buffer.clone()
        }
    }
}
