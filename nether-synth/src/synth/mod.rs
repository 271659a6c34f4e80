//! Envelope-driven synth voices
//!
//! Each voice is a single oscillator shaped by an ADSR envelope. Voices live
//! in a fixed pool created at engine start; `play()` re-triggers a voice in
//! place so nothing is allocated while notes come and go.

mod envelope;
mod oscillator;


use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::AUDIO_RATE;
use crate::error::SynthError;

pub use envelope::{AdsrState, Stage};
pub use oscillator::Oscillator;

use envelope::Envelope;

/// Named voices in the engine's fixed pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Voice {
    Bass,
    HiHat,
    Snare,
    Kick,
    Lead,
    /// Layered copy of the lead, usually a fifth up and an octave down
    SuperLead,
}

impl Voice {
    /// Number of voices in the pool
    pub const COUNT: usize = 6;

    /// Every voice, in pool order
    pub const ALL: [Voice; Voice::COUNT] = [
        Voice::Bass,
        Voice::HiHat,
        Voice::Snare,
        Voice::Kick,
        Voice::Lead,
        Voice::SuperLead,
    ];

    /// Slot index in the pool
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Preset timbre this voice starts with
    pub fn default_config(self) -> SynthConfig {
        match self {
            Voice::Bass => SynthConfig::bass(),
            Voice::HiHat => SynthConfig::hi_hat(),
            Voice::Snare => SynthConfig::snare(),
            Voice::Kick => SynthConfig::kick(),
            Voice::Lead => SynthConfig::lead(),
            Voice::SuperLead => SynthConfig::super_lead(),
        }
    }
}

/// Static timbre of a voice
///
/// Durations are in samples at [`AUDIO_RATE`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthConfig {
    pub oscillator: Oscillator,
    /// Output gain applied on top of the envelope
    pub volume: f32,
    /// Ramp from 0 up to `attack.amplitude`
    pub attack: Stage,
    /// Ramp from `attack.amplitude` to `decay.amplitude`
    pub decay: Stage,
    /// Level held until release is requested
    pub sustain: f32,
    /// Ramp from the amplitude at release time to `release.amplitude`
    pub release: Stage,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self::lead()
    }
}

impl SynthConfig {
    /// Long-tailed half-sine bass
    pub fn bass() -> Self {
        Self {
            oscillator: Oscillator::Sine,
            volume: 1.0,
            attack: Stage::new(1.0, 100),
            decay: Stage::new(0.8, 200),
            sustain: 0.8,
            release: Stage::new(0.0, 20_000),
        }
    }

    /// Short noise tick
    pub fn hi_hat() -> Self {
        Self {
            oscillator: Oscillator::Noise,
            volume: 0.5,
            attack: Stage::new(1.0, 100),
            decay: Stage::new(0.3, 500),
            sustain: 0.0,
            release: Stage::new(0.0, 1),
        }
    }

    /// Saw burst
    pub fn snare() -> Self {
        Self {
            oscillator: Oscillator::Saw,
            volume: 0.5,
            attack: Stage::new(1.0, 1_000),
            decay: Stage::new(0.3, 2_000),
            sustain: 0.0,
            release: Stage::new(0.0, 3_000),
        }
    }

    /// Square thump
    pub fn kick() -> Self {
        Self {
            oscillator: Oscillator::Square,
            volume: 1.0,
            attack: Stage::new(1.0, 500),
            decay: Stage::new(0.8, 500),
            sustain: 0.0,
            release: Stage::new(0.0, 1),
        }
    }

    /// Player-controlled lead
    pub fn lead() -> Self {
        Self {
            oscillator: Oscillator::Sine,
            volume: 0.5,
            attack: Stage::new(1.0, 500),
            decay: Stage::new(0.7, 500),
            sustain: 0.7,
            release: Stage::new(0.0, 10_000),
        }
    }

    /// Quiet saw layered under the lead
    pub fn super_lead() -> Self {
        Self {
            oscillator: Oscillator::Saw,
            volume: 0.1,
            ..Self::lead()
        }
    }

    /// Reject configurations that would produce undefined audio
    pub fn validate(&self) -> Result<(), SynthError> {
        if !self.volume.is_finite() {
            return Err(SynthError::NonFinite("volume"));
        }
        for (name, stage) in [
            ("attack", self.attack),
            ("decay", self.decay),
            ("release", self.release),
        ] {
            if stage.duration == 0 {
                return Err(SynthError::ZeroDuration(name));
            }
            if !stage.amplitude.is_finite() {
                return Err(SynthError::NonFinite(name));
            }
        }
        if !self.sustain.is_finite() {
            return Err(SynthError::NonFinite("sustain"));
        }
        Ok(())
    }
}

/// Samples per waveform period for `frequency`
pub(crate) fn cycle_length_for(frequency: f32) -> Result<u64, SynthError> {
    if !(frequency.is_finite() && frequency > 0.0) {
        return Err(SynthError::InvalidFrequency(frequency));
    }
    let cycle = (AUDIO_RATE as f32 / frequency).round();
    if cycle < 1.0 {
        return Err(SynthError::FrequencyTooHigh(frequency));
    }
    Ok(cycle as u64)
}

/// One synth voice: oscillator + envelope + playback counters
#[derive(Debug, Clone)]
pub struct SynthVoice {
    oscillator: Oscillator,
    volume: f32,
    envelope: Envelope,
    /// Samples per waveform period (never zero)
    cycle_length: u64,
    /// Samples generated since the last `play()`
    current_sample: u64,
    is_on: bool,
    rng: Pcg32,
}

impl SynthVoice {
    /// Create an idle voice. `seed` drives the noise oscillator.
    pub fn new(config: SynthConfig, seed: u64) -> Self {
        Self {
            oscillator: config.oscillator,
            volume: config.volume,
            envelope: Envelope::new(config.attack, config.decay, config.sustain, config.release),
            cycle_length: 1,
            current_sample: 0,
            is_on: false,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Replace the timbre. Takes effect immediately, even mid-note.
    pub fn configure(&mut self, config: SynthConfig) -> Result<(), SynthError> {
        config.validate()?;
        self.oscillator = config.oscillator;
        self.volume = config.volume;
        self.envelope.attack = config.attack;
        self.envelope.decay = config.decay;
        self.envelope.sustain = config.sustain;
        self.envelope.release = config.release;
        Ok(())
    }

    /// Start a note, resetting phase and envelope to the attack
    pub fn play(&mut self, frequency: f32) -> Result<(), SynthError> {
        self.cycle_length = cycle_length_for(frequency)?;
        self.current_sample = 0;
        self.envelope.trigger();
        self.is_on = true;
        Ok(())
    }

    /// Move to the release phase at the next generated sample
    pub fn request_release(&mut self) {
        self.envelope.pending_release = true;
    }

    /// Turn the voice off entirely so the mixer skips it
    pub fn silence(&mut self) {
        self.is_on = false;
    }

    pub fn is_on(&self) -> bool {
        self.is_on
    }

    pub fn state(&self) -> AdsrState {
        self.envelope.state
    }

    pub fn cycle_length(&self) -> u64 {
        self.cycle_length
    }

    pub fn current_sample(&self) -> u64 {
        self.current_sample
    }

    /// Sample number at which the current release began
    pub fn release_start(&self) -> u64 {
        self.envelope.release_start
    }

    /// Add `buffer.len()` samples of this voice into `buffer`.
    ///
    /// Accumulates: the caller zeroes the buffer before the first voice.
    pub fn generate(&mut self, buffer: &mut [f32]) {
        for out in buffer.iter_mut() {
            let position = self.current_sample % self.cycle_length;
            let s = self
                .oscillator
                .sample(position, self.cycle_length, &mut self.rng);
            let amp = self.envelope.amplitude(self.current_sample);

            *out += s * self.volume * amp;
            self.current_sample += 1;
        }
    }
}
