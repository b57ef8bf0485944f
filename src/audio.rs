//! Procedural sound effects
//!
//! Every effect is a short list of oscillator tones. The synth scales them by the player's
//! volume and hands them to an [`AudioSink`]. Sink failures are logged and dropped; a tick
//! never fails because audio did.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::Settings;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SoundEffect {
    /// Bright two-note ding
    Success,
    /// Low buzz
    Error,
    Coin,
    /// Rising slide
    Jump,
    /// C major arpeggio
    Win,
    LevelUp,
    Damage,
    /// Slow swell
    Spirit,
    /// Short chirp
    Happy,
    Shield,
    /// Impact
    Hit,
}

impl SoundEffect {
    pub const ALL: [SoundEffect; 11] = [
        SoundEffect::Success,
        SoundEffect::Error,
        SoundEffect::Coin,
        SoundEffect::Jump,
        SoundEffect::Win,
        SoundEffect::LevelUp,
        SoundEffect::Damage,
        SoundEffect::Spirit,
        SoundEffect::Happy,
        SoundEffect::Shield,
        SoundEffect::Hit,
    ];

    /// Oscillator recipe at unit volume
    pub fn tones(self) -> Vec<Tone> {
        use Waveform::*;
        match self {
            SoundEffect::Success => vec![
                Tone::plain(880.0, Sine, 0.1, 0.1),
                Tone::plain(1760.0, Sine, 0.3, 0.1).after(0.1),
            ],
            SoundEffect::Error => vec![
                Tone::plain(150.0, Sawtooth, 0.3, 0.1),
                Tone::plain(100.0, Sawtooth, 0.3, 0.1).after(0.15),
            ],
            SoundEffect::Coin => vec![
                Tone::plain(1200.0, Square, 0.1, 0.05),
                Tone::plain(2000.0, Square, 0.2, 0.05).after(0.05),
            ],
            SoundEffect::Jump => vec![Tone {
                waveform: Sine,
                freq_hz: 200.0,
                glide: Some(Glide {
                    to_hz: 600.0,
                    at_s: 0.2,
                    ramp: Ramp::Linear,
                }),
                envelope: vec![
                    GainStep::set(0.1, 0.0),
                    GainStep::ramp(0.01, 0.2, Ramp::Linear),
                ],
                duration_s: 0.2,
                delay_s: 0.0,
            }],
            SoundEffect::Win => [523.25, 659.25, 783.99, 1046.5]
                .into_iter()
                .enumerate()
                .map(|(i, f)| Tone::plain(f, Triangle, 0.3, 0.1).after(i as f64 * 0.15))
                .collect(),
            SoundEffect::LevelUp => vec![
                Tone::plain(440.0, Sine, 0.1, 0.1),
                Tone::plain(554.0, Sine, 0.1, 0.1).after(0.1),
                Tone::plain(659.0, Sine, 0.4, 0.1).after(0.2),
            ],
            SoundEffect::Damage => vec![Tone::plain(100.0, Square, 0.2, 0.2)],
            SoundEffect::Spirit => vec![Tone {
                waveform: Sine,
                freq_hz: 300.0,
                glide: Some(Glide {
                    to_hz: 600.0,
                    at_s: 0.6,
                    ramp: Ramp::Exponential,
                }),
                envelope: vec![
                    GainStep::set(0.05, 0.0),
                    GainStep::ramp(0.2, 0.3, Ramp::Linear),
                    GainStep::ramp(0.001, 1.0, Ramp::Exponential),
                ],
                duration_s: 1.0,
                delay_s: 0.0,
            }],
            SoundEffect::Happy => vec![
                Tone::plain(1500.0, Sine, 0.1, 0.1),
                Tone::plain(2000.0, Sine, 0.1, 0.1).after(0.05),
            ],
            SoundEffect::Shield => vec![Tone::plain(200.0, Triangle, 0.5, 0.2)],
            SoundEffect::Hit => vec![Tone::plain(150.0, Sawtooth, 0.05, 0.2)],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ramp {
    Linear,
    Exponential,
}

/// Frequency ramp from the tone's start frequency
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Glide {
    pub to_hz: f32,
    /// Seconds after tone start
    pub at_s: f64,
    pub ramp: Ramp,
}

/// One gain automation point, relative to tone start
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainStep {
    pub value: f32,
    pub at_s: f64,
    /// `None` jumps to the value
    pub ramp: Option<Ramp>,
}

impl GainStep {
    pub fn set(value: f32, at_s: f64) -> Self {
        Self {
            value,
            at_s,
            ramp: None,
        }
    }

    pub fn ramp(value: f32, at_s: f64, ramp: Ramp) -> Self {
        Self {
            value,
            at_s,
            ramp: Some(ramp),
        }
    }
}

/// Smallest gain an exponential ramp may target
pub const MIN_RAMP_GAIN: f32 = 0.0001;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tone {
    pub waveform: Waveform,
    pub freq_hz: f32,
    pub glide: Option<Glide>,
    pub envelope: Vec<GainStep>,
    pub duration_s: f64,
    /// Offset from the moment the effect is played
    pub delay_s: f64,
}

impl Tone {
    /// Fixed pitch that starts at `vol` and decays exponentially over `duration_s`
    pub fn plain(freq_hz: f32, waveform: Waveform, duration_s: f64, vol: f32) -> Self {
        Self {
            waveform,
            freq_hz,
            glide: None,
            envelope: vec![
                GainStep::set(vol, 0.0),
                GainStep::ramp(0.01, duration_s, Ramp::Exponential),
            ],
            duration_s,
            delay_s: 0.0,
        }
    }

    pub fn after(mut self, delay_s: f64) -> Self {
        self.delay_s = delay_s;
        self
    }

    /// Scale every gain point by `volume`
    pub fn scaled(&self, volume: f32) -> Tone {
        let mut tone = self.clone();
        for step in &mut tone.envelope {
            step.value *= volume;
            if step.ramp == Some(Ramp::Exponential) {
                step.value = step.value.max(MIN_RAMP_GAIN);
            }
        }
        tone
    }
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio output unavailable: {0}")]
    Unavailable(String),
    #[error("audio node error: {0}")]
    Node(String),
}

/// Something that can render a tone
pub trait AudioSink {
    fn play_tone(&mut self, tone: &Tone) -> Result<(), AudioError>;

    /// Unlock output after a user gesture
    fn resume(&mut self) -> Result<(), AudioError> {
        Ok(())
    }
}

impl AudioSink for Box<dyn AudioSink> {
    fn play_tone(&mut self, tone: &Tone) -> Result<(), AudioError> {
        (**self).play_tone(tone)
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        (**self).resume()
    }
}

/// Silent output for native builds and tests
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn play_tone(&mut self, _tone: &Tone) -> Result<(), AudioError> {
        Ok(())
    }
}

/// Plays [`SoundEffect`]s through a sink at the player's volume
pub struct ToneSynth<S: AudioSink = Box<dyn AudioSink>> {
    sink: S,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

impl<S: AudioSink> ToneSynth<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }

    pub fn from_settings(sink: S, settings: &Settings) -> Self {
        let mut synth = Self::new(sink);
        synth.apply_settings(settings);
        synth
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.set_master_volume(settings.master_volume);
        self.set_sfx_volume(settings.sfx_volume);
        self.muted = settings.muted;
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    pub fn resume(&mut self) {
        if let Err(e) = self.sink.resume() {
            log::debug!("Audio resume failed: {}", e);
        }
    }

    /// Fire and forget. Errors stop the rest of this effect and are logged.
    pub fn play(&mut self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        for tone in effect.tones() {
            if let Err(e) = self.sink.play_tone(&tone.scaled(vol)) {
                log::debug!("Dropped {:?}: {}", effect, e);
                return;
            }
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudioSink;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, AudioContextState, AudioParam, OscillatorType};

    use super::{AudioError, AudioSink, GainStep, Glide, Ramp, Tone, Waveform};

    fn node_err(e: wasm_bindgen::JsValue) -> AudioError {
        AudioError::Node(format!("{e:?}"))
    }

    /// Web Audio output. A missing context turns every call into `Unavailable`.
    pub struct WebAudioSink {
        ctx: Option<AudioContext>,
    }

    impl Default for WebAudioSink {
        fn default() -> Self {
            Self::new()
        }
    }

    impl WebAudioSink {
        pub fn new() -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self { ctx }
        }

        fn ctx(&self) -> Result<&AudioContext, AudioError> {
            self.ctx
                .as_ref()
                .ok_or_else(|| AudioError::Unavailable("no AudioContext".to_string()))
        }
    }

    fn to_web(w: Waveform) -> OscillatorType {
        match w {
            Waveform::Sine => OscillatorType::Sine,
            Waveform::Square => OscillatorType::Square,
            Waveform::Sawtooth => OscillatorType::Sawtooth,
            Waveform::Triangle => OscillatorType::Triangle,
        }
    }

    fn schedule(param: &AudioParam, value: f32, at: f64, ramp: Option<Ramp>) -> Result<(), AudioError> {
        match ramp {
            None => param.set_value_at_time(value, at),
            Some(Ramp::Linear) => param.linear_ramp_to_value_at_time(value, at),
            Some(Ramp::Exponential) => param.exponential_ramp_to_value_at_time(value, at),
        }
        .map(|_| ())
        .map_err(node_err)
    }

    impl AudioSink for WebAudioSink {
        fn play_tone(&mut self, tone: &Tone) -> Result<(), AudioError> {
            let ctx = self.ctx()?;
            if ctx.state() == AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            let osc = ctx.create_oscillator().map_err(node_err)?;
            let gain = ctx.create_gain().map_err(node_err)?;
            osc.set_type(to_web(tone.waveform));
            osc.connect_with_audio_node(&gain).map_err(node_err)?;
            gain.connect_with_audio_node(&ctx.destination())
                .map_err(node_err)?;

            let t = ctx.current_time() + tone.delay_s;
            schedule(&osc.frequency(), tone.freq_hz, t, None)?;
            if let Some(Glide { to_hz, at_s, ramp }) = tone.glide {
                schedule(&osc.frequency(), to_hz, t + at_s, Some(ramp))?;
            }
            for GainStep { value, at_s, ramp } in &tone.envelope {
                schedule(&gain.gain(), *value, t + at_s, *ramp)?;
            }

            osc.start_with_when(t).map_err(node_err)?;
            osc.stop_with_when(t + tone.duration_s).map_err(node_err)
        }

        fn resume(&mut self) -> Result<(), AudioError> {
            let ctx = self.ctx()?;
            ctx.resume().map(|_| ()).map_err(node_err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recording(Vec<Tone>);

    impl AudioSink for Recording {
        fn play_tone(&mut self, tone: &Tone) -> Result<(), AudioError> {
            self.0.push(tone.clone());
            Ok(())
        }
    }

    struct Broken(usize);

    impl AudioSink for Broken {
        fn play_tone(&mut self, _tone: &Tone) -> Result<(), AudioError> {
            self.0 += 1;
            Err(AudioError::Unavailable("no device".to_string()))
        }
    }

    #[test]
    fn test_every_effect_has_a_recipe() {
        for effect in SoundEffect::ALL {
            let tones = effect.tones();
            assert!(!tones.is_empty(), "{effect:?}");
            for tone in tones {
                assert!(tone.duration_s > 0.0);
                assert!(tone.freq_hz > 0.0);
                assert!(tone.envelope.iter().all(|s| s.value > 0.0));
            }
        }
    }

    #[test]
    fn test_success_is_two_staggered_notes() {
        let tones = SoundEffect::Success.tones();
        assert_eq!(tones.len(), 2);
        assert_eq!(tones[0].freq_hz, 880.0);
        assert_eq!(tones[1].freq_hz, 1760.0);
        assert!((tones[1].delay_s - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_win_arpeggio_steps() {
        let tones = SoundEffect::Win.tones();
        assert_eq!(tones.len(), 4);
        assert!(tones.iter().all(|t| t.waveform == Waveform::Triangle));
        assert!((tones[3].delay_s - 0.45).abs() < 1e-9);
    }

    #[test]
    fn test_synth_scales_volume() {
        let mut synth = ToneSynth::new(Recording::default());
        synth.set_master_volume(0.5);
        synth.play(SoundEffect::Damage);
        let tone = &synth.sink().0[0];
        assert!((tone.envelope[0].value - 0.1).abs() < 1e-6);
        // Exponential targets never reach zero
        synth.set_sfx_volume(0.0001);
        synth.play(SoundEffect::Damage);
        assert!(synth.sink().0[1].envelope[1].value >= MIN_RAMP_GAIN);
    }

    #[test]
    fn test_muted_plays_nothing() {
        let settings = Settings {
            muted: true,
            ..Default::default()
        };
        let mut synth = ToneSynth::from_settings(Recording::default(), &settings);
        for effect in SoundEffect::ALL {
            synth.play(effect);
        }
        assert!(synth.sink().0.is_empty());
    }

    #[test]
    fn test_sink_errors_are_swallowed() {
        let mut synth = ToneSynth::new(Broken(0));
        synth.play(SoundEffect::Win);
        synth.play(SoundEffect::Hit);
        // One failed tone per effect, the rest of that effect is dropped
        assert_eq!(synth.sink().0, 2);
        synth.resume();
    }

    #[test]
    fn test_effect_names_serialize_camel_case() {
        assert_eq!(
            serde_json::to_string(&SoundEffect::LevelUp).unwrap(),
            "\"levelUp\""
        );
    }
}
