//! # Parameter Ramps
//!
//! Control values (gains, delay lengths, reverb coefficients) must never
//! jump from one block to the next: an instant change in gain is a step in
//! the waveform, and an instant change in delay length is a jump of the read
//! head. Both are heard as clicks.
//!
//! A [`Ramp`] wraps nih-plug's [`Smoother`] with exponential smoothing and
//! remembers the last target it was given. Settings are pushed in once per
//! block, and re-sending an unchanged value must not restart a ramp that is
//! still running, or the value would never land on its target.

use nih_plug::prelude::{Smoother, SmoothingStyle};

/// An exponentially smoothed value, stepped once per sample.
pub struct Ramp {
    smoother: Smoother<f32>,
    target: f32,
}

impl Ramp {
    /// A ramp resting at 0 that covers 99.99% of a change in `ramp_ms`
    /// milliseconds and then snaps onto the target.
    pub fn new(ramp_ms: f32) -> Self {
        Self {
            smoother: Smoother::new(SmoothingStyle::Exponential(ramp_ms)),
            target: 0.0,
        }
    }

    /// Head for `target`. Has no effect if that is already the target.
    pub fn set_target(&mut self, sample_rate: f32, target: f32) {
        if target != self.target {
            self.target = target;
            self.smoother.set_target(sample_rate, target);
        }
    }

    /// Jump to `value` with no ramp.
    pub fn snap(&mut self, value: f32) {
        self.target = value;
        self.smoother.reset(value);
    }

    /// Advance by one sample and return the new value.
    #[inline]
    pub fn next(&self) -> f32 {
        self.smoother.next()
    }

    /// The value returned by the last [`next()`](Self::next).
    pub fn previous_value(&self) -> f32 {
        self.smoother.previous_value()
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_smoothing(&self) -> bool {
        self.smoother.is_smoothing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48000.0;

    #[test]
    fn test_rests_at_snapped_value() {
        let mut ramp = Ramp::new(50.0);
        ramp.snap(0.25);

        for _ in 0..100 {
            assert_eq!(ramp.next(), 0.25);
        }
        assert!(!ramp.is_smoothing());
    }

    /// A step up and a step down both approach the target monotonically,
    /// never cross it, and settle exactly on it.
    #[test]
    fn test_step_never_overshoots() {
        for (from, to) in [(0.0, 1.0), (1.0, 0.0), (0.0, 2123.89), (1.0, 1.0 / 51.0)] {
            let mut ramp = Ramp::new(100.0);
            ramp.snap(from);
            ramp.set_target(SAMPLE_RATE, to);

            let mut previous_distance = (to - from).abs();
            for _ in 0..(SAMPLE_RATE as usize / 4) {
                let v = ramp.next();
                let distance = (to - v).abs();
                assert!(
                    distance <= previous_distance,
                    "Distance to {to} grew from {previous_distance} to {distance}"
                );
                let tolerance = to.abs() * 1e-6;
                if to > from {
                    assert!(v <= to + tolerance, "Overshot {to} going up: {v}");
                } else {
                    assert!(v >= to - tolerance, "Overshot {to} going down: {v}");
                }
                previous_distance = distance;
            }
            assert_eq!(ramp.previous_value(), to, "Should settle exactly on the target");
        }
    }

    #[test]
    fn test_settled_after_ramp_duration() {
        let mut ramp = Ramp::new(50.0);
        ramp.set_target(SAMPLE_RATE, 1.0);

        let mut v = 0.0;
        for _ in 0..=(SAMPLE_RATE * 0.05) as usize {
            v = ramp.next();
        }
        assert_eq!(v, 1.0, "Expected the target after one ramp, got {v}");
    }

    #[test]
    fn test_first_step_moves_but_does_not_jump() {
        let mut ramp = Ramp::new(50.0);
        ramp.set_target(SAMPLE_RATE, 1.0);

        let first = ramp.next();
        assert!(first > 0.0 && first < 0.01, "Unexpected first step {first}");
    }

    /// Re-sending the same target every block lets a long ramp finish.
    #[test]
    fn test_repeated_target_does_not_restart() {
        let mut ramp = Ramp::new(100.0);
        ramp.set_target(SAMPLE_RATE, 1.0);

        for _ in 0..20 {
            ramp.set_target(SAMPLE_RATE, 1.0);
            for _ in 0..512 {
                ramp.next();
            }
        }
        assert_eq!(ramp.previous_value(), 1.0);
        assert!(!ramp.is_smoothing());
    }

    #[test]
    fn test_snap_cancels_ramp() {
        let mut ramp = Ramp::new(100.0);
        ramp.set_target(44100.0, 5.0);
        ramp.next();

        ramp.snap(-2.0);
        assert_eq!(ramp.target(), -2.0);
        assert_eq!(ramp.next(), -2.0);
        assert!(!ramp.is_smoothing());
    }

    /// Two ramps fed the same calls produce bit-identical sequences.
    #[test]
    fn test_deterministic() {
        let mut a = Ramp::new(50.0);
        let mut b = Ramp::new(50.0);

        for step in 0..2000 {
            let target = if step % 500 < 250 { 1.0 } else { -0.5 };
            a.set_target(44100.0, target);
            b.set_target(44100.0, target);
            assert_eq!(a.next().to_bits(), b.next().to_bits());
        }
    }
}
