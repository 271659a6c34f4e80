//! Raw waveform generation for synth voices

use std::f32::consts::PI;

use rand::Rng;
use rand_pcg::Pcg32;

/// Waveform shapes a voice can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Oscillator {
    /// +1 for the first half of the cycle, -1 for the second
    #[default]
    Square,
    /// Linear ramp from -1 to +1 across the cycle
    Saw,
    /// Single raised half-sine lobe mapped to -1..=1, `2·sin(π·p/cycle) − 1`.
    ///
    /// Not a full sine period: one hump per cycle with a hard corner at the
    /// cycle boundary, which gives the bass its buzz.
    Sine,
    /// Uniform white noise, a new value every sample
    Noise,
}

impl Oscillator {
    /// Raw waveform value at `position` samples into a cycle of `cycle_length` samples
    #[inline]
    pub(crate) fn sample(self, position: u64, cycle_length: u64, rng: &mut Pcg32) -> f32 {
        match self {
            Oscillator::Square => {
                if position <= cycle_length / 2 {
                    1.0
                } else {
                    -1.0
                }
            }
            Oscillator::Saw => 2.0 * position as f32 / cycle_length as f32 - 1.0,
            Oscillator::Sine => 2.0 * (PI * (position as f32 / cycle_length as f32)).sin() - 1.0,
            Oscillator::Noise => 2.0 * rng.random::<f32>() - 1.0,
        }
    }
}
