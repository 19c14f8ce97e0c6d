//! # State-Variable Filter
//!
//! The bleed path uses three 12 dB/octave filters in series:
//!
//! - **Air absorption** (lowpass): high frequencies die out faster than
//!   low ones as sound travels through air, so the cutoff falls as the
//!   simulated distance grows.
//! - **Lo-cut** (highpass): user control, removes rumble from the bleed.
//! - **Hi-cut** (lowpass): user control, darkens the bleed.
//!
//! ## Topology
//!
//! A topology-preserving-transform (TPT) state-variable filter after
//! Zavalishin, "The Art of VA Filter Design". Two trapezoidal integrators
//! share state and yield highpass, bandpass and lowpass outputs at once:
//!
//! ```text
//! g  = tan(π * cutoff / sample_rate)
//! h  = 1 / (1 + 2R*g + g²)
//!
//! hp = h * (x - (2R + g) * s1 - s2)
//! bp = g * hp + s1        s1' = g * hp + bp
//! lp = g * bp + s2        s2' = g * bp + lp
//! ```
//!
//! With `R = 1/√2` the response is Butterworth (maximally flat, no
//! resonant peak). Unlike a direct-form biquad, the TPT structure stays
//! well behaved while the cutoff moves.

use std::f32::consts::{FRAC_1_SQRT_2, PI};

use super::CHANNELS;

/// Lowest cutoff the filter accepts, in Hz.
pub const MIN_CUTOFF_HZ: f32 = 20.0;

/// Highest cutoff as a fraction of the sample rate. `tan()` blows up at
/// Nyquist (0.5), so stay a little below it.
const MAX_CUTOFF_RATIO: f32 = 0.49;

/// Which output of the state-variable core a filter instance returns.
/// Fixed for the lifetime of the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Highpass,
    Lowpass,
}

/// A stereo 2-pole state-variable filter with a fixed response type.
pub struct StateVariableFilter {
    mode: FilterMode,
    sample_rate: f32,
    cutoff_hz: f32,

    // Coefficients
    g: f32,
    r2: f32,
    h: f32,

    /// Integrator states, one pair per channel.
    s1: [f32; CHANNELS],
    s2: [f32; CHANNELS],
}

impl StateVariableFilter {
    /// Create a filter at 1 kHz, assuming 44.1 kHz until
    /// [`prepare()`](Self::prepare) is called.
    pub fn new(mode: FilterMode) -> Self {
        let mut filter = Self {
            mode,
            sample_rate: 44100.0,
            cutoff_hz: 1000.0,
            g: 0.0,
            r2: 2.0 * FRAC_1_SQRT_2,
            h: 0.0,
            s1: [0.0; CHANNELS],
            s2: [0.0; CHANNELS],
        };
        filter.update_coefficients();
        filter
    }

    /// Adopt a new sample rate. The cutoff is re-clamped against the new
    /// Nyquist limit and the state is cleared.
    pub fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.set_cutoff_frequency(self.cutoff_hz);
        self.reset();
    }

    /// Set the cutoff in Hz, clamped to `[20, 0.49 * sample_rate]`.
    pub fn set_cutoff_frequency(&mut self, cutoff_hz: f32) {
        let max_cutoff = self.sample_rate * MAX_CUTOFF_RATIO;
        self.cutoff_hz = if cutoff_hz.is_nan() {
            max_cutoff
        } else {
            cutoff_hz.clamp(MIN_CUTOFF_HZ, max_cutoff)
        };
        self.update_coefficients();
    }

    /// The cutoff actually in use, after clamping.
    pub fn cutoff_frequency(&self) -> f32 {
        self.cutoff_hz
    }

    fn update_coefficients(&mut self) {
        self.g = (PI * self.cutoff_hz / self.sample_rate).tan();
        self.h = 1.0 / (1.0 + self.r2 * self.g + self.g * self.g);
    }

    /// Filter one sample of `channel`. Channel indices past the last
    /// channel share the last channel's state.
    #[inline]
    pub fn process_sample(&mut self, channel: usize, input: f32) -> f32 {
        let channel = channel.min(CHANNELS - 1);
        let s1 = self.s1[channel];
        let s2 = self.s2[channel];

        let hp = self.h * (input - (self.r2 + self.g) * s1 - s2);
        let bp = self.g * hp + s1;
        let lp = self.g * bp + s2;

        self.s1[channel] = self.g * hp + bp;
        self.s2[channel] = self.g * bp + lp;

        match self.mode {
            FilterMode::Highpass => hp,
            FilterMode::Lowpass => lp,
        }
    }

    /// Zero the integrator states of every channel.
    pub fn reset(&mut self) {
        self.s1 = [0.0; CHANNELS];
        self.s2 = [0.0; CHANNELS];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prepared(mode: FilterMode, sample_rate: f32, cutoff: f32) -> StateVariableFilter {
        let mut filter = StateVariableFilter::new(mode);
        filter.prepare(sample_rate);
        filter.set_cutoff_frequency(cutoff);
        filter
    }

    /// Peak output for an alternating +1/-1 signal, the highest frequency
    /// a digital signal can carry.
    fn nyquist_peak(filter: &mut StateVariableFilter) -> f32 {
        let mut peak = 0.0_f32;
        for i in 0..4000 {
            let input = if i % 2 == 0 { 1.0 } else { -1.0 };
            let output = filter.process_sample(0, input);
            if i > 2000 {
                peak = peak.max(output.abs());
            }
        }
        peak
    }

    /// Settled output for a constant (0 Hz) input.
    fn dc_output(filter: &mut StateVariableFilter) -> f32 {
        let mut output = 0.0;
        for _ in 0..48000 {
            output = filter.process_sample(0, 1.0);
        }
        output
    }

    #[test]
    fn test_lowpass_passes_dc() {
        let mut filter = prepared(FilterMode::Lowpass, 48000.0, 100.0);
        let output = dc_output(&mut filter);
        assert!((output - 1.0).abs() < 1e-3, "DC should pass a lowpass, got {output}");
    }

    #[test]
    fn test_lowpass_attenuates_high_freq() {
        let mut filter = prepared(FilterMode::Lowpass, 48000.0, 500.0);
        let peak = nyquist_peak(&mut filter);
        assert!(peak < 0.01, "Expected heavy attenuation, got peak {peak}");
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let mut filter = prepared(FilterMode::Highpass, 48000.0, 200.0);
        let output = dc_output(&mut filter);
        assert!(output.abs() < 1e-3, "DC should not pass a highpass, got {output}");
    }

    #[test]
    fn test_highpass_passes_high_freq() {
        let mut filter = prepared(FilterMode::Highpass, 48000.0, 20.0);
        let peak = nyquist_peak(&mut filter);
        assert!((peak - 1.0).abs() < 0.01, "Nyquist should pass, got peak {peak}");
    }

    #[test]
    fn test_cutoff_is_clamped() {
        let mut filter = prepared(FilterMode::Lowpass, 44100.0, 0.0);
        assert_eq!(filter.cutoff_frequency(), MIN_CUTOFF_HZ);

        filter.set_cutoff_frequency(1.0e6);
        assert!((filter.cutoff_frequency() - 44100.0 * 0.49).abs() < 1e-2);

        filter.set_cutoff_frequency(f32::NAN);
        assert!(filter.cutoff_frequency().is_finite());
    }

    /// Sweeping the cutoff across its whole range while feeding full-scale
    /// noise-like input must never blow up.
    #[test]
    fn test_stable_across_cutoff_range() {
        for mode in [FilterMode::Lowpass, FilterMode::Highpass] {
            let mut filter = prepared(mode, 44100.0, 20.0);
            let mut x: u32 = 12345;
            for i in 0..44100 {
                if i % 64 == 0 {
                    let cutoff = 20.0 * 1.5_f32.powi((i / 64 % 24) as i32);
                    filter.set_cutoff_frequency(cutoff);
                }
                x = x.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                let input = (x >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0;
                let output = filter.process_sample(0, input);
                assert!(output.is_finite() && output.abs() < 10.0, "Unstable: {output}");
            }
        }
    }

    #[test]
    fn test_channels_are_independent() {
        let mut filter = prepared(FilterMode::Lowpass, 48000.0, 1000.0);
        filter.process_sample(0, 1.0);
        assert_eq!(filter.process_sample(1, 0.0), 0.0);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut filter = prepared(FilterMode::Lowpass, 48000.0, 1000.0);
        filter.process_sample(0, 1.0);
        filter.process_sample(1, 1.0);
        filter.reset();

        assert_eq!(filter.process_sample(0, 0.0), 0.0);
        assert_eq!(filter.process_sample(1, 0.0), 0.0);
    }
}
