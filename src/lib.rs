//! # Room Bleed: A Sidechain Room-Bleed Simulator (AU/VST3/CLAP)
//!
//! Imagine a guitar amp miked in a studio while the drummer plays twenty
//! feet away. The guitar mic picks up some drums: late, quieter, duller and
//! coloured by the room. Room Bleed recreates that on a dry track. Route
//! the "other" instrument into the sidechain input, set how far away it
//! stands and what room it is in, and the plugin mixes its bleed into the
//! main signal.
//!
//! Built with [nih-plug](https://github.com/robbert-vdh/nih-plug).
//!
//! ## Signal Flow
//!
//! ```text
//! Sidechain ──► [Bleed Pipeline: delay ► attenuation ► filters ► room] ──┐
//!                                                                        │ × mix × extra gain
//! Input ───────────────────────────────────────────────────────────────(+)──► clamp ±1 ──► Output
//! ```
//!
//! The DSP lives in [`bleed::BleedEngine`], which knows nothing about
//! plugin hosts. This file only connects it to nih-plug: buffers in,
//! parameter snapshots in, tail length out.

pub mod bleed;
pub mod dsp;
mod params;
pub mod rooms;

use std::num::NonZeroU32;
use std::sync::Arc;

use bleed::BleedEngine;
use nih_plug::prelude::*;
use params::PluginParams;

/// The plugin: parameter store plus processing engine.
///
/// Parameters are shared with the host and the UI thread through an `Arc`
/// and read with atomic loads. The engine is owned by the audio thread
/// alone, so neither side ever waits on a lock.
struct RoomBleed {
    params: Arc<PluginParams>,
    engine: BleedEngine,
}

impl Default for RoomBleed {
    fn default() -> Self {
        Self {
            params: Arc::new(PluginParams::default()),
            // Unprepared until the host calls initialize().
            engine: BleedEngine::new(),
        }
    }
}

impl Plugin for RoomBleed {
    const NAME: &'static str = "Room Bleed";
    const VENDOR: &'static str = "Loveless Audio";
    const URL: &'static str = "";
    const EMAIL: &'static str = "steve.loveless@gmail.com";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // Main bus is always stereo. The sidechain is an auxiliary input; a
    // mono sidechain is heard on both sides of the bleed.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            aux_input_ports: &[new_nonzero_u32(2)],
            aux_output_ports: &[],
            names: PortNames {
                layout: Some("Stereo"),
                aux_inputs: &["Sidechain"],
                ..PortNames::const_default()
            },
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            aux_input_ports: &[new_nonzero_u32(1)],
            aux_output_ports: &[],
            names: PortNames {
                layout: Some("Stereo, Mono Sidechain"),
                aux_inputs: &["Sidechain"],
                ..PortNames::const_default()
            },
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    // Parameters are read once per block, so there is nothing to gain
    // from having the host split blocks at automation points.
    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    /// Called off the audio thread whenever the sample rate or block size
    /// changes. The only place the engine allocates.
    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let sidechain_channels = audio_io_layout
            .aux_input_ports
            .first()
            .map(|c| c.get())
            .unwrap_or(0);

        self.engine.prepare(
            buffer_config.sample_rate,
            buffer_config.max_buffer_size as usize,
        );

        nih_log!(
            "Prepared at {} Hz, max block {} samples, {}-channel sidechain",
            buffer_config.sample_rate,
            buffer_config.max_buffer_size,
            sidechain_channels
        );

        true
    }

    /// Playback stopped or the transport jumped: drop the delay history,
    /// filter states and reverb tail so nothing stale leaks into the next
    /// playback.
    fn reset(&mut self) {
        self.engine.reset();
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        let settings = self.params.snapshot();

        match aux.inputs.first() {
            Some(sidechain) => {
                self.engine
                    .process(buffer.as_slice(), sidechain.as_slice_immutable(), &settings)
            }
            None => self
                .engine
                .process::<&[f32]>(buffer.as_slice(), &[], &settings),
        }

        // Keep the host calling us while the bleed is still in flight or
        // the room is still ringing.
        ProcessStatus::Tail(self.engine.tail_samples())
    }
}

impl ClapPlugin for RoomBleed {
    const CLAP_ID: &'static str = "com.loveless-audio.room-bleed";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("Simulates sidechain bleed from a source across a room");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Reverb,
    ];
}

impl Vst3Plugin for RoomBleed {
    // 16 ASCII bytes, unique to this plugin.
    const VST3_CLASS_ID: [u8; 16] = *b"LvlssRoomBleed01";

    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Reverb];
}

nih_export_clap!(RoomBleed);
nih_export_vst3!(RoomBleed);

// AUv2 entry point for Logic Pro, wrapped around the CLAP export.
clap_wrapper::export_auv2!();
