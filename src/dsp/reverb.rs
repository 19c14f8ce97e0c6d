//! # Room Reverb
//!
//! A Freeverb-style algorithmic reverb: the sound of the bleed bouncing
//! around the room before it reaches the microphone.
//!
//! ## Signal Flow (per channel)
//!
//! ```text
//!              ┌─► [Comb 1] ─┐
//!              ├─► [Comb 2] ─┤
//! (L+R)*0.015 ─┤     ...     ├─(+)─► [Allpass 1] ─► ... ─► [Allpass 4] ─► wet
//!              └─► [Comb 8] ─┘
//! ```
//!
//! - **Combs** are delay lines fed back into themselves. Each pass around
//!   the loop is scaled by `feedback` (room size) and darkened by a
//!   one-pole lowpass (damping), so high frequencies die first, the way
//!   soft furnishings absorb treble in a real room.
//! - **Allpasses** smear the comb echoes into a dense tail without
//!   colouring the spectrum.
//! - The right channel uses tunings 23 samples longer than the left, which
//!   decorrelates the two sides. `width` controls how much of that
//!   difference reaches the output.
//!
//! Comb feedback tops out at 0.98 and the damping lowpass has unity DC
//! gain, so every loop loses energy and silence in always ends in
//! silence out.

use super::ramp::Ramp;
use super::CHANNELS;

const NUM_COMBS: usize = 8;
const NUM_ALLPASSES: usize = 4;

/// Freeverb tunings in samples at 44.1 kHz. Mutually prime-ish lengths
/// keep the comb echoes from piling up on the same instants.
const COMB_TUNINGS: [usize; NUM_COMBS] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
const ALLPASS_TUNINGS: [usize; NUM_ALLPASSES] = [556, 441, 341, 225];
const STEREO_SPREAD: usize = 23;
const TUNING_SAMPLE_RATE: f32 = 44100.0;

const INPUT_GAIN: f32 = 0.015;
const ROOM_SCALE: f32 = 0.28;
const ROOM_OFFSET: f32 = 0.7;
const DAMP_SCALE: f32 = 0.4;
const WET_SCALE: f32 = 3.0;
const ALLPASS_FEEDBACK: f32 = 0.5;

/// Ramp applied to gains and comb coefficients when the room changes.
const PARAMETER_RAMP_MS: f32 = 10.0;

/// Level the tail estimate decays to: -60 dB.
const TAIL_FLOOR: f32 = 0.001;

/// User-facing reverb settings. Every field is in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbParameters {
    /// Larger rooms feed more energy back into the combs: longer tail.
    pub room_size: f32,
    /// How quickly high frequencies decay relative to low ones.
    pub damping: f32,
    /// 0 = both outputs identical, 1 = fully decorrelated.
    pub width: f32,
    /// Level of the unprocessed input in the output.
    pub dry_level: f32,
    /// Level of the reverberated signal in the output.
    pub wet_level: f32,
}

impl ReverbParameters {
    /// Pass the input through untouched.
    pub const BYPASS: Self = Self {
        room_size: 0.0,
        damping: 0.0,
        width: 0.0,
        dry_level: 1.0,
        wet_level: 0.0,
    };
}

impl Default for ReverbParameters {
    fn default() -> Self {
        Self::BYPASS
    }
}

/// A delay loop with a damped feedback path.
#[derive(Default)]
struct CombFilter {
    buffer: Vec<f32>,
    index: usize,
    /// Damping lowpass state.
    last: f32,
}

impl CombFilter {
    fn resize(&mut self, len: usize) {
        self.buffer = vec![0.0; len.max(1)];
        self.index = 0;
        self.last = 0.0;
    }

    #[inline]
    fn process(&mut self, input: f32, damp: f32, feedback: f32) -> f32 {
        let output = self.buffer[self.index];
        self.last = output * (1.0 - damp) + self.last * damp;
        self.buffer[self.index] = input + self.last * feedback;
        self.index = (self.index + 1) % self.buffer.len();
        output
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.index = 0;
        self.last = 0.0;
    }
}

/// Schroeder allpass used for diffusion.
#[derive(Default)]
struct AllpassFilter {
    buffer: Vec<f32>,
    index: usize,
}

impl AllpassFilter {
    fn resize(&mut self, len: usize) {
        self.buffer = vec![0.0; len.max(1)];
        self.index = 0;
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let buffered = self.buffer[self.index];
        self.buffer[self.index] = input + buffered * ALLPASS_FEEDBACK;
        self.index = (self.index + 1) % self.buffer.len();
        buffered - input
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.index = 0;
    }
}

/// Stereo algorithmic reverb processing blocks in place.
pub struct Reverb {
    combs: [[CombFilter; NUM_COMBS]; CHANNELS],
    allpasses: [[AllpassFilter; NUM_ALLPASSES]; CHANNELS],

    parameters: ReverbParameters,
    sample_rate: f32,

    damping: Ramp,
    feedback: Ramp,
    dry_gain: Ramp,
    wet_gain_1: Ramp,
    wet_gain_2: Ramp,

    /// False until the first `set_parameters()` after a prepare or reset.
    /// That first call jumps straight to the new settings.
    primed: bool,
}

impl Default for Reverb {
    fn default() -> Self {
        Self::new()
    }
}

impl Reverb {
    /// Create an unprepared reverb. It holds no delay memory until
    /// [`prepare()`](Self::prepare) is called.
    pub fn new() -> Self {
        Self {
            combs: Default::default(),
            allpasses: Default::default(),
            parameters: ReverbParameters::BYPASS,
            sample_rate: TUNING_SAMPLE_RATE,
            damping: Ramp::new(PARAMETER_RAMP_MS),
            feedback: Ramp::new(PARAMETER_RAMP_MS),
            dry_gain: Ramp::new(PARAMETER_RAMP_MS),
            wet_gain_1: Ramp::new(PARAMETER_RAMP_MS),
            wet_gain_2: Ramp::new(PARAMETER_RAMP_MS),
            primed: false,
        }
    }

    /// Size every comb and allpass for `sample_rate`. Allocates, so this
    /// must not be called from the audio thread.
    pub fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        let scale = sample_rate / TUNING_SAMPLE_RATE;
        let scaled = |tuning: usize| (tuning as f32 * scale) as usize;

        for (channel, (combs, allpasses)) in self
            .combs
            .iter_mut()
            .zip(self.allpasses.iter_mut())
            .enumerate()
        {
            let spread = channel * STEREO_SPREAD;
            for (comb, tuning) in combs.iter_mut().zip(COMB_TUNINGS) {
                comb.resize(scaled(tuning + spread));
            }
            for (allpass, tuning) in allpasses.iter_mut().zip(ALLPASS_TUNINGS) {
                allpass.resize(scaled(tuning + spread));
            }
        }

        self.primed = false;
    }

    fn ramps_mut(&mut self) -> [&mut Ramp; 5] {
        [
            &mut self.damping,
            &mut self.feedback,
            &mut self.dry_gain,
            &mut self.wet_gain_1,
            &mut self.wet_gain_2,
        ]
    }

    /// Apply new settings. Values are clamped to `[0, 1]`.
    pub fn set_parameters(&mut self, parameters: ReverbParameters) {
        let unit = |v: f32| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        let parameters = ReverbParameters {
            room_size: unit(parameters.room_size),
            damping: unit(parameters.damping),
            width: unit(parameters.width),
            dry_level: unit(parameters.dry_level),
            wet_level: unit(parameters.wet_level),
        };
        self.parameters = parameters;

        let wet = parameters.wet_level * WET_SCALE;
        let targets = [
            parameters.damping * DAMP_SCALE,
            parameters.room_size * ROOM_SCALE + ROOM_OFFSET,
            parameters.dry_level,
            0.5 * wet * (1.0 + parameters.width),
            0.5 * wet * (1.0 - parameters.width),
        ];

        let primed = self.primed;
        let sample_rate = self.sample_rate;
        for (ramp, target) in self.ramps_mut().into_iter().zip(targets) {
            if primed {
                ramp.set_target(sample_rate, target);
            } else {
                ramp.snap(target);
            }
        }
        self.primed = true;
    }

    pub fn parameters(&self) -> ReverbParameters {
        self.parameters
    }

    /// Reverberate a stereo block in place. Both slices should have the
    /// same length; any excess in the longer one is left untouched.
    pub fn process_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
        let [combs_l, combs_r] = &mut self.combs;
        let [allpasses_l, allpasses_r] = &mut self.allpasses;
        let prepared = !combs_l[0].buffer.is_empty();

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let input = (*l + *r) * INPUT_GAIN;
            let damp = self.damping.next();
            let feedback = self.feedback.next();

            let mut out_l = 0.0;
            let mut out_r = 0.0;
            if prepared {
                for (comb_l, comb_r) in combs_l.iter_mut().zip(combs_r.iter_mut()) {
                    out_l += comb_l.process(input, damp, feedback);
                    out_r += comb_r.process(input, damp, feedback);
                }
                for (allpass_l, allpass_r) in allpasses_l.iter_mut().zip(allpasses_r.iter_mut()) {
                    out_l = allpass_l.process(out_l);
                    out_r = allpass_r.process(out_r);
                }
            }

            let dry = self.dry_gain.next();
            let wet_1 = self.wet_gain_1.next();
            let wet_2 = self.wet_gain_2.next();

            *l = out_l * wet_1 + out_r * wet_2 + *l * dry;
            *r = out_r * wet_1 + out_l * wet_2 + *r * dry;
        }
    }

    /// Clear every comb and allpass. The next
    /// [`set_parameters()`](Self::set_parameters) applies without a ramp.
    pub fn reset(&mut self) {
        for comb in self.combs.iter_mut().flatten() {
            comb.clear();
        }
        for allpass in self.allpasses.iter_mut().flatten() {
            allpass.clear();
        }
        self.primed = false;
    }

    /// Rough number of samples for the tail to fall 60 dB after the input
    /// goes silent, based on the longest comb loop. Zero when the wet path
    /// is muted.
    pub fn tail_samples(&self) -> u32 {
        if self.parameters.wet_level <= 0.0 {
            return 0;
        }

        let feedback = self.parameters.room_size * ROOM_SCALE + ROOM_OFFSET;
        let loops = TAIL_FLOOR.ln() / feedback.ln();
        let loop_len = (COMB_TUNINGS[NUM_COMBS - 1] + STEREO_SPREAD) as f32 * self.sample_rate
            / TUNING_SAMPLE_RATE;
        let allpass_len: usize = ALLPASS_TUNINGS.iter().sum();
        let diffusion = allpass_len as f32 * self.sample_rate / TUNING_SAMPLE_RATE;

        (loops * loop_len + diffusion) as u32
    }
}
