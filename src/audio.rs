//! Audio system
//!
//! Every cue is a short sequence of plain oscillator tones - no sound files.
//! The tone tables are platform independent; playback uses the Web Audio API
//! and only exists on wasm.

use crate::sim::SoundEvent;

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// One beep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub freq: f32,
    /// Seconds
    pub duration: f32,
    pub waveform: Waveform,
    pub volume: f32,
    /// Seconds after the cue starts
    pub delay: f32,
}

const fn tone(freq: f32, duration: f32, waveform: Waveform, volume: f32, delay: f32) -> Tone {
    Tone {
        freq,
        duration,
        waveform,
        volume,
        delay,
    }
}

const JUMP: &[Tone] = &[tone(400.0, 0.1, Waveform::Square, 0.2, 0.0)];
const COLLECT: &[Tone] = &[
    tone(800.0, 0.1, Waveform::Sine, 0.25, 0.0),
    tone(1000.0, 0.1, Waveform::Sine, 0.25, 0.05),
];
const COFFEE: &[Tone] = &[tone(600.0, 0.15, Waveform::Triangle, 0.25, 0.0)];
const LAPTOP: &[Tone] = &[
    tone(1200.0, 0.2, Waveform::Sawtooth, 0.2, 0.0),
    tone(1400.0, 0.15, Waveform::Sawtooth, 0.2, 0.1),
];
const JASMINE: &[Tone] = &[
    tone(1000.0, 0.15, Waveform::Sine, 0.3, 0.0),
    tone(1200.0, 0.15, Waveform::Sine, 0.3, 0.1),
    tone(1400.0, 0.2, Waveform::Sine, 0.3, 0.2),
];
const CRASH: &[Tone] = &[tone(100.0, 0.3, Waveform::Sawtooth, 0.3, 0.0)];
/// C5 E5 G5 arpeggio
const VICTORY: &[Tone] = &[
    tone(523.0, 0.2, Waveform::Sine, 0.25, 0.0),
    tone(659.0, 0.2, Waveform::Sine, 0.25, 0.2),
    tone(784.0, 0.3, Waveform::Sine, 0.25, 0.4),
];
const OVERTIME: &[Tone] = &[
    tone(300.0, 0.2, Waveform::Square, 0.3, 0.0),
    tone(250.0, 0.2, Waveform::Square, 0.3, 0.2),
    tone(200.0, 0.3, Waveform::Square, 0.3, 0.4),
];

/// Tone sequence for a cue
pub fn tones(sound: SoundEvent) -> &'static [Tone] {
    match sound {
        SoundEvent::Jump => JUMP,
        SoundEvent::Collect => COLLECT,
        SoundEvent::Coffee => COFFEE,
        SoundEvent::Laptop => LAPTOP,
        SoundEvent::Jasmine => JASMINE,
        SoundEvent::Crash => CRASH,
        SoundEvent::Victory => VICTORY,
        SoundEvent::Overtime => OVERTIME,
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{Tone, Waveform, tones};
    use crate::settings::Settings;
    use crate::sim::SoundEvent;

    impl From<Waveform> for OscillatorType {
        fn from(w: Waveform) -> Self {
            match w {
                Waveform::Sine => OscillatorType::Sine,
                Waveform::Square => OscillatorType::Square,
                Waveform::Sawtooth => OscillatorType::Sawtooth,
                Waveform::Triangle => OscillatorType::Triangle,
            }
        }
    }

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        /// From `Settings::effective_volume`
        volume: f32,
        /// Temporary silence (window blur, attract mode)
        muted: bool,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                volume: Settings::default().effective_volume(),
                muted: false,
            }
        }

        pub fn apply_settings(&mut self, settings: &Settings) {
            self.volume = settings.effective_volume();
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        pub fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
        }

        /// Play a sound cue
        pub fn play(&self, sound: SoundEvent) {
            let vol = if self.muted { 0.0 } else { self.volume };
            if vol <= 0.0 {
                return;
            }

            let Some(ctx) = &self.ctx else { return };

            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            let t = ctx.current_time();
            for tone in tones(sound) {
                self.play_tone(ctx, tone, t, vol);
            }
        }

        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        fn play_tone(&self, ctx: &AudioContext, tone: &Tone, now: f64, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, tone.freq, tone.waveform.into()) else {
                return;
            };
            let start = now + f64::from(tone.delay);
            let stop = start + f64::from(tone.duration);

            gain.gain().set_value_at_time(tone.volume * vol, start).ok();
            osc.start_with_when(start).ok();
            osc.stop_with_when(stop).ok();
        }
    }
}
