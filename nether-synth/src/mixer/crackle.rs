//! Intermittent "malfunction" crackle applied to the synth mix
//!
//! Episodes of randomized gain are scheduled on a global sample counter.
//! Purely a color effect layered over the clean mix.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Shortest crackle episode, in samples
const EPISODE_MIN: u64 = 2_000;
/// Random extra episode length, in samples
const EPISODE_SPREAD: f32 = 2_000.0;
/// Shortest gap between episode starts, in samples
const GAP_MIN: u64 = 5_000;
/// Random extra gap, in samples
const GAP_SPREAD: f32 = 50_000.0;
/// Lowest gain floor an episode can pick
const INTENSITY_MIN: f32 = 0.8;
/// Random extra gain floor
const INTENSITY_SPREAD: f32 = 0.2;
/// Length of the episode already running when the engine starts
const INITIAL_EPISODE: u64 = 200;

/// Crackle scheduler state
#[derive(Debug, Clone)]
pub struct Crackle {
    enabled: bool,
    rng: Pcg32,
    /// Samples processed since start (monotonic)
    global_sample: u64,
    /// Global sample at which the next episode begins
    next_trigger: u64,
    /// Samples left in the current episode
    remaining: u64,
    /// Gain floor of the current episode
    intensity: f32,
}

impl Crackle {
    pub fn new(enabled: bool, seed: u64) -> Self {
        Self {
            enabled,
            rng: Pcg32::seed_from_u64(seed),
            global_sample: 0,
            next_trigger: 0,
            remaining: INITIAL_EPISODE,
            intensity: 0.0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Samples processed so far
    pub fn global_sample(&self) -> u64 {
        self.global_sample
    }

    /// Global sample at which the next episode is scheduled
    pub fn next_trigger(&self) -> u64 {
        self.next_trigger
    }

    /// True while an episode is in progress
    pub fn is_active(&self) -> bool {
        self.enabled && self.remaining > 0
    }

    /// Gain floor of the current (or last) episode
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    #[inline]
    fn unit(&mut self) -> f32 {
        self.rng.random::<f32>()
    }

    /// Gain for the next sample, advancing the scheduler by one sample.
    ///
    /// Outside an episode the gain is exactly 1.0; inside it is uniform in
    /// `intensity..=1.0`.
    #[inline]
    pub fn next_gain(&mut self) -> f32 {
        self.global_sample += 1;
        if !self.enabled {
            return 1.0;
        }

        if self.global_sample >= self.next_trigger {
            self.remaining = EPISODE_MIN + (self.unit() * EPISODE_SPREAD) as u64;
            self.next_trigger = self.global_sample + GAP_MIN + (self.unit() * GAP_SPREAD) as u64;
            self.intensity = INTENSITY_MIN + INTENSITY_SPREAD * self.unit();
        }

        if self.remaining == 0 {
            1.0
        } else {
            self.remaining -= 1;
            (1.0 - self.intensity) * self.unit() + self.intensity
        }
    }
}
