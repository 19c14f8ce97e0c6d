//! # Bleed Pipeline
//!
//! Turns the sidechain signal into "bleed": the sound of another
//! instrument leaking into this track's microphone from across the room.
//!
//! ## Signal Flow
//!
//! ```text
//! Sidechain ─► [Delay] ─► × attenuation ─► [Air LPF] ─► [Lo-cut] ─► [Hi-cut] ─┐
//!              distance     1/(1+d)         distance      user        user     │
//!              / 1130 ft/s                                                     │
//!                                                                              ▼
//!                                                              [Room Reverb (block)]
//!                                                                              │
//! Main ───────────────────────────────────────────────────────►(+)◄── × mix × extra
//!                                                               │
//!                                                          clamp ±1 ─► Output
//! ```
//!
//! The engine is independent of the plugin host. It takes plain channel
//! slices and a [`BleedSettings`] snapshot so it can be driven directly
//! from tests.
//!
//! ## Lifecycle
//!
//! [`BleedEngine::new()`] builds an unprepared engine that leaves audio
//! untouched. [`prepare()`](BleedEngine::prepare) sizes every buffer for
//! the host's sample rate and block size; it is the only call that
//! allocates. [`reset()`](BleedEngine::reset) silences all history but
//! keeps the configuration.

use nih_plug::util;

use crate::dsp::delay_line::{FractionalDelayLine, MAX_DELAY_SAMPLES};
use crate::dsp::filter::{FilterMode, StateVariableFilter};
use crate::dsp::ramp::Ramp;
use crate::dsp::reverb::Reverb;
use crate::dsp::CHANNELS;
use crate::rooms::RoomType;

/// Nominal speed of sound used for the distance delay.
pub const SPEED_OF_SOUND_FT_PER_SEC: f32 = 1130.0;

/// Air absorption lowpass cutoff with the source right at the mic.
const AIR_CUTOFF_MAX_HZ: f32 = 20000.0;
const AIR_CUTOFF_MIN_HZ: f32 = 20.0;
/// How fast the air absorption cutoff falls per foot of distance.
const AIR_ABSORPTION_PER_FOOT: f32 = 0.15;

// Ramp times, in milliseconds.
const MIX_RAMP_MS: f32 = 50.0;
const DELAY_RAMP_MS: f32 = 100.0;
const ATTENUATION_RAMP_MS: f32 = 100.0;
const EXTRA_GAIN_RAMP_MS: f32 = 50.0;

/// Delay, in samples, for sound to travel `distance_feet`.
pub fn delay_samples(distance_feet: f32, sample_rate: f32) -> f32 {
    (distance_feet / SPEED_OF_SOUND_FT_PER_SEC) * sample_rate
}

/// Level drop over `distance_feet`: 1 at the mic, falling towards 0.
pub fn distance_attenuation(distance_feet: f32) -> f32 {
    1.0 / (1.0 + distance_feet)
}

/// Air absorption lowpass cutoff for `distance_feet`.
pub fn air_absorption_cutoff(distance_feet: f32) -> f32 {
    (AIR_CUTOFF_MAX_HZ / (1.0 + distance_feet * AIR_ABSORPTION_PER_FOOT))
        .clamp(AIR_CUTOFF_MIN_HZ, AIR_CUTOFF_MAX_HZ)
}

/// Parameter values for one block, read once by the host glue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BleedSettings {
    /// Level of the bleed in the output, in dB.
    pub mix_db: f32,
    pub low_cut_hz: f32,
    pub high_cut_hz: f32,
    /// Distance from the sidechain source to the mic, in feet.
    pub distance_feet: f32,
    /// Extra bleed boost, in dB.
    pub extra_gain_db: f32,
    pub room: RoomType,
}

impl Default for BleedSettings {
    fn default() -> Self {
        Self {
            mix_db: -6.0,
            low_cut_hz: 20.0,
            high_cut_hz: 20000.0,
            distance_feet: 0.0,
            extra_gain_db: 0.0,
            room: RoomType::LivingRoom,
        }
    }
}

/// Where the engine is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No sample rate yet. `process()` leaves audio untouched.
    Unprepared,
    /// Buffers sized, waiting for the first block.
    Prepared,
    /// At least one block processed since the last prepare or reset.
    Processing,
}

/// The room bleed processor.
pub struct BleedEngine {
    state: EngineState,
    sample_rate: f32,
    max_block_size: usize,

    delay_line: FractionalDelayLine,
    air_absorption: StateVariableFilter,
    low_cut: StateVariableFilter,
    high_cut: StateVariableFilter,
    reverb: Reverb,

    /// Wet bleed for the current block, one buffer per channel. Sized in
    /// `prepare()`, cleared at the start of every block.
    scratch: [Vec<f32>; CHANNELS],

    // Stepped once per sample frame.
    mix_gain: Ramp,
    delay: Ramp,
    attenuation: Ramp,
    extra_gain: Ramp,
}

impl Default for BleedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl BleedEngine {
    pub fn new() -> Self {
        Self {
            state: EngineState::Unprepared,
            sample_rate: 0.0,
            max_block_size: 0,
            delay_line: FractionalDelayLine::new(MAX_DELAY_SAMPLES),
            air_absorption: StateVariableFilter::new(FilterMode::Lowpass),
            low_cut: StateVariableFilter::new(FilterMode::Highpass),
            high_cut: StateVariableFilter::new(FilterMode::Lowpass),
            reverb: Reverb::new(),
            scratch: Default::default(),
            mix_gain: Ramp::new(MIX_RAMP_MS),
            delay: Ramp::new(DELAY_RAMP_MS),
            attenuation: Ramp::new(ATTENUATION_RAMP_MS),
            extra_gain: Ramp::new(EXTRA_GAIN_RAMP_MS),
        }
    }

    /// Configure for a sample rate and maximum block size. Allocates, so
    /// it must be called off the audio thread. Safe to call repeatedly.
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize) {
        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size.max(1);

        for filter in [&mut self.air_absorption, &mut self.low_cut, &mut self.high_cut] {
            filter.prepare(sample_rate);
        }
        self.reverb.prepare(sample_rate);
        for channel in &mut self.scratch {
            channel.clear();
            channel.resize(self.max_block_size, 0.0);
        }

        self.state = EngineState::Prepared;
        self.reset();
    }

    /// Silence the delay history, filter states, reverb tail and scratch
    /// buffer. Settings are kept; the next block starts without ramps.
    pub fn reset(&mut self) {
        self.delay_line.reset();
        self.air_absorption.reset();
        self.low_cut.reset();
        self.high_cut.reset();
        self.reverb.reset();
        for channel in &mut self.scratch {
            channel.fill(0.0);
        }

        if self.state == EngineState::Processing {
            self.state = EngineState::Prepared;
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Samples the bleed keeps sounding after the sidechain goes silent.
    pub fn tail_samples(&self) -> u32 {
        self.delay.target().ceil() as u32 + self.reverb.tail_samples()
    }

    /// Mix the bleed of `sidechain` into `main`, in place.
    ///
    /// `main` may have any number of channels; channels past the second
    /// receive the right bleed channel. A mono `sidechain` feeds both bleed
    /// channels, and an empty one produces no bleed. Blocks longer than
    /// the prepared maximum are processed in several passes.
    pub fn process<S: AsRef<[f32]>>(
        &mut self,
        main: &mut [&mut [f32]],
        sidechain: &[S],
        settings: &BleedSettings,
    ) {
        if self.state == EngineState::Unprepared {
            return;
        }

        self.update_targets(settings);
        self.state = EngineState::Processing;

        let num_samples = main.iter().map(|channel| channel.len()).min().unwrap_or(0);
        let mut start = 0;
        while start < num_samples {
            let len = (num_samples - start).min(self.max_block_size);
            self.render_bleed(sidechain, start, len);
            self.mix_into(main, start, len);
            start += len;
        }
    }

    /// Read the block's settings into ramp targets, filter cutoffs and
    /// the room profile. The first block after a prepare or reset starts at
    /// the configured values rather than ramping up from zero.
    fn update_targets(&mut self, settings: &BleedSettings) {
        let distance = settings.distance_feet.max(0.0);
        let delay = delay_samples(distance, self.sample_rate).min(self.delay_line.max_delay());

        let first_block = self.state == EngineState::Prepared;
        let sample_rate = self.sample_rate;
        let targets = [
            (&mut self.delay, delay),
            (&mut self.attenuation, distance_attenuation(distance)),
            (&mut self.mix_gain, util::db_to_gain(settings.mix_db)),
            (&mut self.extra_gain, util::db_to_gain(settings.extra_gain_db)),
        ];
        for (ramp, target) in targets {
            if first_block {
                ramp.snap(target);
            } else {
                ramp.set_target(sample_rate, target);
            }
        }

        self.air_absorption
            .set_cutoff_frequency(air_absorption_cutoff(distance));
        self.low_cut.set_cutoff_frequency(settings.low_cut_hz);
        self.high_cut.set_cutoff_frequency(settings.high_cut_hz);
        self.reverb.set_parameters(settings.room.profile());
    }

    /// Fill the scratch buffer with `len` samples of wet bleed, taken from
    /// `sidechain` starting at `start`.
    fn render_bleed<S: AsRef<[f32]>>(&mut self, sidechain: &[S], start: usize, len: usize) {
        let [left, right] = &mut self.scratch;
        let (left, right) = (&mut left[..len], &mut right[..len]);
        left.fill(0.0);
        right.fill(0.0);

        let Some(last_channel) = sidechain.len().checked_sub(1) else {
            return;
        };

        for i in 0..len {
            self.delay_line.set_delay(self.delay.next());
            let gain = self.attenuation.next();

            for (channel, out) in [&mut left[i], &mut right[i]].into_iter().enumerate() {
                // A mono sidechain is heard on both sides.
                let input = sidechain[channel.min(last_channel)]
                    .as_ref()
                    .get(start + i)
                    .copied()
                    .unwrap_or(0.0);

                self.delay_line.push_sample(channel, input);
                let mut sample = self.delay_line.pop_sample(channel) * gain;
                sample = self.air_absorption.process_sample(channel, sample);
                sample = self.low_cut.process_sample(channel, sample);
                sample = self.high_cut.process_sample(channel, sample);
                *out = sample;
            }
        }

        self.reverb.process_stereo(left, right);
    }

    /// Add the scratch bleed to `main[.., start..start + len]`, clamping
    /// the result to ±1.
    fn mix_into(&self, main: &mut [&mut [f32]], start: usize, len: usize) {
        for i in 0..len {
            // One step per frame, not per channel, so every channel hears
            // the same point of the ramp.
            let gain = self.mix_gain.next() * self.extra_gain.next();
            for (channel, samples) in main.iter_mut().enumerate() {
                let wet = self.scratch[channel.min(CHANNELS - 1)][i] * gain;
                let out = &mut samples[start + i];
                *out = (*out + wet).clamp(-1.0, 1.0);
            }
        }
    }

    /// The wet bleed of the most recent block (or chunk), after the reverb
    /// and before the mix gains.
    pub fn bleed_buffer(&self) -> [&[f32]; CHANNELS] {
        [&self.scratch[0], &self.scratch[1]]
    }
}
