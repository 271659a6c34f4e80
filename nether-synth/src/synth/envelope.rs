//! ADSR envelope state machine
//!
//! Sample-accurate, driven by the voice's running sample counter. Each phase
//! interpolates linearly between its two amplitude endpoints and exits when
//! `(sample + 1) > phase_end`.

/// One envelope phase: the amplitude reached at its end and its length in samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stage {
    /// Amplitude at the end of the phase
    pub amplitude: f32,
    /// Phase length in samples (must be at least 1)
    pub duration: u64,
}

impl Stage {
    pub const fn new(amplitude: f32, duration: u64) -> Self {
        Self {
            amplitude,
            duration,
        }
    }
}

/// Current envelope phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdsrState {
    #[default]
    Attack,
    Decay,
    Sustain,
    Release,
    /// Terminal: holds the release amplitude until the next trigger
    End,
}

#[derive(Debug, Clone)]
pub(crate) struct Envelope {
    pub(crate) attack: Stage,
    pub(crate) decay: Stage,
    pub(crate) sustain: f32,
    pub(crate) release: Stage,
    pub(crate) state: AdsrState,
    /// Sample number at which release began
    pub(crate) release_start: u64,
    /// Amplitude the release ramp starts from
    release_from: f32,
    /// One-shot flag consumed by the next `amplitude()` call
    pub(crate) pending_release: bool,
}

impl Envelope {
    pub(crate) fn new(attack: Stage, decay: Stage, sustain: f32, release: Stage) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
            state: AdsrState::Attack,
            release_start: 0,
            release_from: sustain,
            pending_release: false,
        }
    }

    /// Restart from the attack phase
    pub(crate) fn trigger(&mut self) {
        self.state = AdsrState::Attack;
        self.release_start = 0;
        self.release_from = self.sustain;
        self.pending_release = false;
    }

    fn begin_release(&mut self, sample: u64, amplitude: f32) {
        self.state = AdsrState::Release;
        self.release_start = sample;
        self.release_from = amplitude;
        self.pending_release = false;
    }

    /// Amplitude for `sample`, advancing the state machine.
    ///
    /// Must be called once per generated sample with a non-decreasing counter.
    pub(crate) fn amplitude(&mut self, sample: u64) -> f32 {
        match self.state {
            AdsrState::Attack => {
                let amp = self.attack.amplitude * (sample as f32 / self.attack.duration as f32);
                if sample + 1 > self.attack.duration {
                    self.state = AdsrState::Decay;
                } else if self.pending_release {
                    // Releases must be able to cut an attack short
                    self.begin_release(sample, amp);
                }
                amp
            }
            AdsrState::Decay => {
                let t = sample.saturating_sub(self.attack.duration) as f32
                    / self.decay.duration as f32;
                let amp = self.attack.amplitude * (1.0 - t) + self.decay.amplitude * t;
                if sample + 1 > self.attack.duration.saturating_add(self.decay.duration) {
                    self.state = AdsrState::Sustain;
                } else if self.pending_release {
                    self.begin_release(sample, amp);
                }
                amp
            }
            AdsrState::Sustain => {
                let amp = self.sustain;
                if self.pending_release {
                    self.begin_release(sample, amp);
                }
                amp
            }
            AdsrState::Release => {
                let t = sample.saturating_sub(self.release_start) as f32
                    / self.release.duration as f32;
                let amp = self.release_from * (1.0 - t) + self.release.amplitude * t;
                if sample + 1 > self.release_start.saturating_add(self.release.duration) {
                    self.state = AdsrState::End;
                }
                amp
            }
            AdsrState::End => self.release.amplitude,
        }
    }
}
