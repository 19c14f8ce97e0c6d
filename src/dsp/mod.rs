//! # DSP Primitives
//!
//! The building blocks of the bleed path:
//!
//! - **`ramp`**: per-sample exponential ramps for control values, built
//!   on nih-plug's smoother, so that gain and delay changes never click.
//! - **`delay_line`**: a stereo ring buffer read at fractional delays,
//!   modelling the time sound takes to cross the room.
//! - **`filter`**: a state-variable filter fixed to highpass or lowpass,
//!   used for air absorption and the user's lo-cut and hi-cut.
//! - **`reverb`**: a Freeverb-style comb/allpass network giving the
//!   bleed the character of a room.

pub mod delay_line;
pub mod filter;
pub mod ramp;
pub mod reverb;

/// Every stateful stage in the bleed path is stereo.
pub const CHANNELS: usize = 2;
