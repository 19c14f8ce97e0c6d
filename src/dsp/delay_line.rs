//! # Fractional Delay Line
//!
//! Sound from the sidechain source has to travel across the simulated room
//! before it reaches the microphone. At 1130 ft/s, 50 ft takes about 44ms,
//! which at 48 kHz is 2123.9 samples: rarely a whole number. This module
//! stores recent sidechain history for both channels and reads it back at
//! any fractional distance into the past.
//!
//! ## Push, then Pop
//!
//! Every sample tick, for each channel, the pipeline calls
//! [`push_sample`](FractionalDelayLine::push_sample) and then
//! [`pop_sample`](FractionalDelayLine::pop_sample):
//!
//! ```text
//!            write_pos (next slot to fill)
//!                 │
//!   ... [x-3] [x-2] [x-1] [x0] [    ] ...
//!                         ▲
//!                         └── pop with delay 0 returns the sample
//!                             that was just pushed
//! ```
//!
//! A delay of `d` samples returns what was pushed `d` ticks ago, so a
//! delay of zero is a clean pass-through.
//!
//! ## Linear Interpolation
//!
//! For a delay of 21.24 samples we blend the samples 21 and 22 ticks back:
//!
//! ```text
//! result = sample[21] * (1 - 0.24) + sample[22] * 0.24
//! ```

use super::CHANNELS;

/// Largest delay the line can hold: about 4 seconds at 48 kHz.
pub const MAX_DELAY_SAMPLES: usize = 192_000;

/// A stereo circular buffer read back at a fractional delay.
///
/// All memory is allocated in [`new()`](Self::new). Changing the delay only
/// moves the read position.
pub struct FractionalDelayLine {
    /// One history per channel. Each holds two samples more than the
    /// maximum delay so the interpolation partner of the oldest readable
    /// sample is never overwritten.
    buffers: [Vec<f32>; CHANNELS],

    /// Next slot to be written, per channel. Channels advance
    /// independently because each one is pushed separately.
    write_pos: [usize; CHANNELS],

    /// Cached length of each history buffer.
    buffer_len: usize,

    /// Whole-sample part of the current delay.
    delay_int: usize,

    /// Fractional part of the current delay, in `[0, 1)`.
    delay_frac: f32,

    /// Capacity as seen by callers: delays are clamped to
    /// `[0, capacity - 1]`.
    capacity: usize,
}

impl FractionalDelayLine {
    /// Create a delay line able to delay by up to `capacity - 1` samples.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let buffer_len = capacity + 2;
        Self {
            buffers: std::array::from_fn(|_| vec![0.0; buffer_len]),
            write_pos: [0; CHANNELS],
            buffer_len,
            delay_int: 0,
            delay_frac: 0.0,
            capacity,
        }
    }

    /// Largest delay, in samples, that [`set_delay()`](Self::set_delay)
    /// accepts without clamping.
    pub fn max_delay(&self) -> f32 {
        (self.capacity - 1) as f32
    }

    /// Set the delay used by subsequent pops, in (possibly fractional)
    /// samples. Callers are expected to stay within
    /// `[0, max_delay()]`; anything outside is clamped.
    pub fn set_delay(&mut self, delay_samples: f32) {
        let max_delay = self.max_delay();
        nih_plug::nih_debug_assert!(
            (0.0..=max_delay).contains(&delay_samples),
            "delay of {} samples is outside the line's [0, {}] range",
            delay_samples,
            max_delay
        );

        // `clamp` would pass a NaN straight through.
        let delay = if delay_samples.is_nan() {
            0.0
        } else {
            delay_samples.clamp(0.0, max_delay)
        };
        self.delay_int = delay as usize;
        self.delay_frac = delay - self.delay_int as f32;
    }

    /// The delay currently applied by [`pop_sample()`](Self::pop_sample).
    pub fn delay(&self) -> f32 {
        self.delay_int as f32 + self.delay_frac
    }

    /// Write one sample into `channel`'s history and advance its write head.
    /// Channel indices past the last channel map onto the last channel.
    #[inline]
    pub fn push_sample(&mut self, channel: usize, sample: f32) {
        let channel = channel.min(CHANNELS - 1);
        let pos = self.write_pos[channel];
        self.buffers[channel][pos] = sample;
        self.write_pos[channel] = (pos + 1) % self.buffer_len;
    }

    /// Read `channel`'s history at the current delay, interpolating
    /// between the two neighbouring samples.
    #[inline]
    pub fn pop_sample(&self, channel: usize) -> f32 {
        let channel = channel.min(CHANNELS - 1);
        let buffer = &self.buffers[channel];
        let write_pos = self.write_pos[channel];

        // The newest sample sits one slot behind the write head.
        let index_a = (write_pos + self.buffer_len - 1 - self.delay_int) % self.buffer_len;
        let index_b = (write_pos + self.buffer_len - 2 - self.delay_int) % self.buffer_len;

        buffer[index_a] * (1.0 - self.delay_frac) + buffer[index_b] * self.delay_frac
    }

    /// Fill both histories with silence and rewind the write heads. The
    /// delay setting is kept.
    pub fn reset(&mut self) {
        for buffer in &mut self.buffers {
            buffer.fill(0.0);
        }
        self.write_pos = [0; CHANNELS];
    }
}
