//! Channel-major audio buffer for DSP processing
//!
//! Samples are stored one `Vec<f32>` per channel. Decoded audio keeps its
//! native sample rate and channel count through the whole pipeline; nothing
//! here resamples or folds channels.

use crate::error::{Result, SoundFixError};

/// Channel-major audio buffer: `channels[ch][frame]` plus a sample rate.
///
/// All channels of a buffer have identical length at every pipeline stage.
/// When two derived buffers diverge in length (e.g. pass vs. residual after
/// filtering), combination truncates to the shorter length; that truncation
/// is part of the processing contract, not a rounding shortcut.
#[derive(Clone, Debug)]
pub struct AudioBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Create a silent buffer with the given shape.
    pub fn new(num_channels: usize, num_samples: usize, sample_rate: u32) -> Self {
        Self {
            channels: vec![vec![0.0; num_samples]; num_channels],
            sample_rate,
        }
    }

    /// Create a buffer from existing channel-major data.
    ///
    /// Fails when the channels differ in length.
    pub fn from_channels(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if let Some(first) = channels.first() {
            let len = first.len();
            if channels.iter().any(|ch| ch.len() != len) {
                return Err(SoundFixError::Decode {
                    path: Default::default(),
                    reason: "channels differ in length".to_string(),
                });
            }
        }
        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Number of channels
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of samples per channel
    pub fn num_samples(&self) -> usize {
        self.channels.first().map_or(0, |ch| ch.len())
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Nyquist frequency in Hz (upper bound for valid filter cutoffs)
    pub fn nyquist(&self) -> f32 {
        self.sample_rate as f32 / 2.0
    }

    /// Borrow one channel's samples
    pub fn channel(&self, ch: usize) -> &[f32] {
        &self.channels[ch]
    }

    /// Mutably borrow one channel's samples
    pub fn channel_mut(&mut self, ch: usize) -> &mut [f32] {
        &mut self.channels[ch]
    }

    /// Iterate over channels
    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        self.channels.iter().map(|ch| ch.as_slice())
    }

    /// Multiply every sample by a linear gain factor.
    pub fn scale(&mut self, gain: f32) {
        for ch in &mut self.channels {
            for s in ch.iter_mut() {
                *s *= gain;
            }
        }
    }

    /// `self - other`, channel by channel, truncated to the shorter length.
    pub fn subtract(&self, other: &AudioBuffer) -> AudioBuffer {
        self.combine(other, |a, b| a - b)
    }

    /// `self + other`, channel by channel, truncated to the shorter length.
    pub fn add(&self, other: &AudioBuffer) -> AudioBuffer {
        self.combine(other, |a, b| a + b)
    }

    fn combine(&self, other: &AudioBuffer, f: impl Fn(f32, f32) -> f32) -> AudioBuffer {
        let num_channels = self.num_channels().min(other.num_channels());
        let len = self.num_samples().min(other.num_samples());

        let channels = (0..num_channels)
            .map(|ch| {
                self.channels[ch][..len]
                    .iter()
                    .zip(&other.channels[ch][..len])
                    .map(|(&a, &b)| f(a, b))
                    .collect()
            })
            .collect();

        AudioBuffer {
            channels,
            sample_rate: self.sample_rate,
        }
    }

    /// Check that every sample is finite (no NaN/Inf after processing).
    pub fn is_finite(&self) -> bool {
        self.channels
            .iter()
            .all(|ch| ch.iter().all(|s| s.is_finite()))
    }

    /// Peak absolute amplitude across all channels (linear).
    pub fn peak(&self) -> f32 {
        self.channels
            .iter()
            .flat_map(|ch| ch.iter())
            .map(|s| s.abs())
            .fold(0.0f32, f32::max)
    }

    /// RMS level of one channel (linear).
    pub fn rms(&self, ch: usize) -> f32 {
        let samples = &self.channels[ch];
        if samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
        (sum_sq / samples.len() as f64).sqrt() as f32
    }
}
