//! # Plugin Parameters
//!
//! The knobs the host sees. Each parameter has a stable string ID
//! (`#[id = "..."]`): the host stores parameter values in sessions and
//! presets under these IDs, so they must never change once published.
//! Saving and restoring that state is handled entirely by nih-plug.
//!
//! ## No Smoothers Here
//!
//! The audio thread reads each parameter once per block with a single
//! atomic load (see [`PluginParams::snapshot()`]). Smoothing happens inside
//! the engine on the quantities derived from these values (delay in
//! samples, linear gains), which is what actually needs to move without
//! clicks.

use nih_plug::prelude::*;

use crate::bleed::BleedSettings;
use crate::rooms::RoomType;

/// JUCE-style skew of 0.3 for the frequency knobs: most of the travel is
/// spent on the low end, where pitch perception is most sensitive.
const FREQUENCY_SKEW: f32 = 0.3;

#[derive(Params)]
pub struct PluginParams {
    /// **Mix**: level of the bleed added to the main signal.
    ///
    /// Range: -60 dB to 0 dB. Default -6 dB.
    #[id = "MIX"]
    pub mix: FloatParam,

    /// **Low-cut**: highpass on the bleed, to keep the other source's
    /// rumble out of this track.
    ///
    /// Range: 20 Hz to 2 kHz. Default 20 Hz (effectively off).
    #[id = "LOCUT"]
    pub low_cut: FloatParam,

    /// **Hi-cut**: lowpass on the bleed.
    ///
    /// Range: 500 Hz to 20 kHz. Default 20 kHz (effectively off).
    #[id = "HICUT"]
    pub high_cut: FloatParam,

    /// **Distance**: how far the sidechain source stands from the mic.
    /// Drives the arrival delay, the level drop and the air absorption.
    ///
    /// Range: 0 ft to 50 ft. Default 0 ft.
    #[id = "SPACE"]
    pub distance: FloatParam,

    /// **Extra Gain**: boost for quiet sidechain sources.
    ///
    /// Range: 0 dB to +10 dB. Default 0 dB.
    #[id = "EXTRAGAIN"]
    pub extra_gain: FloatParam,

    /// **Room Type**: the space the bleed reverberates in.
    #[id = "ROOM"]
    pub room: EnumParam<RoomType>,
}

impl Default for PluginParams {
    fn default() -> Self {
        Self {
            mix: FloatParam::new("Mix", -6.0, FloatRange::Linear { min: -60.0, max: 0.0 })
                .with_unit(" dB")
                .with_value_to_string(formatters::v2s_f32_rounded(1)),

            low_cut: FloatParam::new(
                "Low-cut",
                20.0,
                FloatRange::Skewed {
                    min: 20.0,
                    max: 2000.0,
                    factor: FREQUENCY_SKEW,
                },
            )
            .with_step_size(1.0)
            .with_value_to_string(formatters::v2s_f32_hz_then_khz(0))
            .with_string_to_value(formatters::s2v_f32_hz_then_khz()),

            high_cut: FloatParam::new(
                "Hi-cut",
                20000.0,
                FloatRange::Skewed {
                    min: 500.0,
                    max: 20000.0,
                    factor: FREQUENCY_SKEW,
                },
            )
            .with_step_size(1.0)
            .with_value_to_string(formatters::v2s_f32_hz_then_khz(0))
            .with_string_to_value(formatters::s2v_f32_hz_then_khz()),

            distance: FloatParam::new(
                "Distance",
                0.0,
                FloatRange::Linear { min: 0.0, max: 50.0 },
            )
            .with_unit(" ft")
            .with_value_to_string(formatters::v2s_f32_rounded(1)),

            extra_gain: FloatParam::new(
                "Extra Gain",
                0.0,
                FloatRange::Linear { min: 0.0, max: 10.0 },
            )
            .with_unit(" dB")
            .with_value_to_string(formatters::v2s_f32_rounded(1)),

            room: EnumParam::new("Room Type", RoomType::LivingRoom),
        }
    }
}

impl PluginParams {
    /// Read every parameter once. Safe to call from the audio thread: each
    /// read is a single atomic load and nothing blocks.
    pub fn snapshot(&self) -> BleedSettings {
        BleedSettings {
            mix_db: self.mix.value(),
            low_cut_hz: self.low_cut.value(),
            high_cut_hz: self.high_cut.value(),
            distance_feet: self.distance.value(),
            extra_gain_db: self.extra_gain.value(),
            room: self.room.value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_engine_defaults() {
        let params = PluginParams::default();
        assert_eq!(params.snapshot(), BleedSettings::default());
    }

    /// The IDs are the persistence keys for sessions and presets.
    #[test]
    fn test_parameter_ids() {
        let params = PluginParams::default();
        let mut ids: Vec<String> = params.param_map().into_iter().map(|(id, _, _)| id).collect();
        ids.sort();
        assert_eq!(ids, ["EXTRAGAIN", "HICUT", "LOCUT", "MIX", "ROOM", "SPACE"]);
    }

    /// Half a turn of a frequency knob lands well below the arithmetic
    /// middle of the range.
    #[test]
    fn test_frequency_knobs_are_skewed() {
        let params = PluginParams::default();
        let low_mid = params.low_cut.preview_plain(0.5);
        let high_mid = params.high_cut.preview_plain(0.5);
        assert!(low_mid < 500.0, "Low-cut midpoint {low_mid}");
        assert!(high_mid < 5000.0, "Hi-cut midpoint {high_mid}");
    }

    /// Values stored as normalized host values come back unchanged.
    #[test]
    fn test_normalized_round_trip() {
        let params = PluginParams::default();
        let cases: [(&FloatParam, f32); 5] = [
            (&params.mix, -23.5),
            (&params.low_cut, 150.0),
            (&params.high_cut, 8000.0),
            (&params.distance, 12.5),
            (&params.extra_gain, 7.25),
        ];
        for (param, value) in cases {
            let normalized = param.preview_normalized(value);
            assert!((0.0..=1.0).contains(&normalized));
            let back = param.preview_plain(normalized);
            assert!(
                (back - value).abs() < 1e-2,
                "{} did not round-trip: {value} -> {back}",
                param.name()
            );
        }

        for index in 0..crate::rooms::NUM_ROOMS {
            let normalized = params.room.preview_normalized(RoomType::from_selector(index));
            assert_eq!(params.room.preview_plain(normalized), RoomType::from_selector(index));
        }
    }
}
