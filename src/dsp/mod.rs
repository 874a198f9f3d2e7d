//! DSP processing stack
//!
//! Filter design, residual-band dynamics, and the four interchangeable
//! processing engines that combine them.

mod buffer;
pub mod dynamics;
mod engine;
mod filter;

pub use buffer::AudioBuffer;
pub use dynamics::GateParams;
pub use engine::Engine;
pub use filter::{bandpass_or_passthrough, BandpassDesign, InvalidBand};

/// Convert decibels to a linear amplitude multiplier
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert a linear amplitude to decibels (floored at -120 dB)
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear > 0.0 {
        20.0 * linear.log10()
    } else {
        -120.0
    }
}
