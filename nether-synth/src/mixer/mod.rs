//! Block mixer shared between the control thread and the audio callback
//!
//! One [`Mixer`] lives behind `Arc<Mutex<_>>`. The callback locks it for a
//! whole block; control calls lock it for each mutation.
//!
//! Per block:
//! 1. Synth voices generate into a mono accumulator
//! 2. The mono mix is normalized by active voice count, box filtered and crackled
//! 3. Mono is duplicated to stereo under the master volume ramp
//! 4. Playing samples are added with per-frame interpolated gains
//! 5. Every ramp advances by one block, finished samples are removed
//! 6. The stereo block is soft clipped

mod crackle;
mod filter;

#[cfg(test)]
mod tests;

use std::sync::{Mutex, MutexGuard};

use glam::Vec3;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::ConfigError;
use crate::listener::Listener;
use crate::ramp::Ramp;
use crate::sample::{Placement, Sample, SampleVoice};
use crate::synth::{SynthVoice, Voice};
use crate::{AUDIO_RATE, CHANNELS};

pub use crackle::Crackle;

/// Playing samples reserved up front so typical scenes never reallocate
const SAMPLE_CAPACITY: usize = 64;

/// Lock the mixer, recovering the data if a previous holder panicked
pub(crate) fn lock_mixer(mixer: &Mutex<Mixer>) -> MutexGuard<'_, Mixer> {
    mixer.lock().unwrap_or_else(|e| {
        warn!("Mixer mutex poisoned; continuing");
        e.into_inner()
    })
}

/// Soft clip a sample into -1..=1.
///
/// Identity inside the range; `sign(x) * (1 + tanh(|x| - 1))` outside, so
/// loud peaks round off instead of wrapping. Output never exceeds ±2.
#[inline]
pub(crate) fn soft_clip(x: f32) -> f32 {
    if x.abs() <= 1.0 {
        return x;
    }
    x.signum() * (1.0 + (x.abs() - 1.0).tanh())
}

/// Global mixing state
#[derive(Debug)]
pub struct Mixer {
    block_frames: usize,
    /// Seconds of audio per block
    block_time: f32,
    synths: [SynthVoice; Voice::COUNT],
    samples: Vec<SampleVoice>,
    next_sample_id: u64,
    master_volume: Ramp<f32>,
    listener: Listener,
    crackle: Crackle,
    /// Raw additive synth output
    synth_mix: Vec<f32>,
    /// Filtered synth output
    synth_out: Vec<f32>,
}

impl Mixer {
    /// Build mixer state with every buffer sized for `config.output.block_frames`
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let block_frames = config.output.block_frames;
        let seed = config.mix.seed.unwrap_or_else(rand::random);
        debug!(
            "Mixer: {} frames per block, crackle {}, seed {}",
            block_frames,
            if config.mix.crackle { "on" } else { "off" },
            seed
        );

        let synths = std::array::from_fn(|i| {
            SynthVoice::new(
                Voice::ALL[i].default_config(),
                seed.wrapping_add(i as u64 + 1),
            )
        });

        Ok(Self {
            block_frames,
            block_time: block_frames as f32 / AUDIO_RATE as f32,
            synths,
            samples: Vec::with_capacity(SAMPLE_CAPACITY),
            next_sample_id: 1,
            master_volume: Ramp::new(config.mix.master_volume),
            listener: Listener::default(),
            crackle: Crackle::new(config.mix.crackle, seed),
            synth_mix: vec![0.0; block_frames],
            synth_out: vec![0.0; block_frames],
        })
    }

    /// Stereo frames per block
    pub fn block_frames(&self) -> usize {
        self.block_frames
    }

    /// Interleaved samples per block (`block_frames * 2`)
    pub fn block_len(&self) -> usize {
        self.block_frames * CHANNELS
    }

    pub fn synth(&self, voice: Voice) -> &SynthVoice {
        &self.synths[voice.index()]
    }

    pub fn synth_mut(&mut self, voice: Voice) -> &mut SynthVoice {
        &mut self.synths[voice.index()]
    }

    /// Number of synth voices currently switched on
    pub fn active_voices(&self) -> usize {
        self.synths.iter().filter(|s| s.is_on()).count()
    }

    /// Number of samples currently in flight
    pub fn active_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume.value()
    }

    /// Ramp the master volume (both synth and sample paths) over `ramp` seconds
    pub fn set_master_volume(&mut self, volume: f32, ramp: f32) {
        self.master_volume.set(volume, ramp);
    }

    pub fn listener(&self) -> &Listener {
        &self.listener
    }

    /// Ramp the listener frame used by positional samples
    pub fn set_listener(&mut self, position: Vec3, right: Vec3, ramp: f32) {
        self.listener.set_position_and_right(position, right, ramp);
    }

    pub fn crackle(&self) -> &Crackle {
        &self.crackle
    }

    pub fn set_crackle_enabled(&mut self, enabled: bool) {
        self.crackle.set_enabled(enabled);
    }

    /// Fade every playing sample out over `ramp` seconds
    pub fn stop_all_samples(&mut self, ramp: f32) {
        for sample in &mut self.samples {
            sample.stop(ramp);
        }
    }

    pub(crate) fn add_sample(
        &mut self,
        sample: &Sample,
        volume: f32,
        placement: Placement,
        looping: bool,
    ) -> u64 {
        let id = self.next_sample_id;
        self.next_sample_id += 1;
        self.samples
            .push(SampleVoice::new(id, sample, volume, placement, looping));
        id
    }

    pub(crate) fn sample_mut(&mut self, id: u64) -> Option<&mut SampleVoice> {
        self.samples.iter_mut().find(|s| s.id == id)
    }

    /// Mix one block into interleaved stereo `out`.
    ///
    /// `out` must be exactly [`block_len`](Self::block_len) samples; it is
    /// overwritten. Never allocates.
    pub fn mix_block(&mut self, out: &mut [f32]) {
        debug_assert_eq!(out.len(), self.block_len());
        let dt = self.block_time;

        // Synth path
        self.synth_mix.fill(0.0);
        let mut active = 0;
        for synth in self.synths.iter_mut().filter(|s| s.is_on()) {
            synth.generate(&mut self.synth_mix);
            active += 1;
        }

        let master_start = self.master_volume.value();
        self.master_volume.step(dt);
        let master_end = self.master_volume.value();

        if active == 0 {
            out.fill(0.0);
        } else {
            filter::smooth(&self.synth_mix, active, &mut self.synth_out, &mut self.crackle);

            let inv = 1.0 / self.block_frames as f32;
            for (i, (frame, &s)) in out
                .chunks_exact_mut(CHANNELS)
                .zip(self.synth_out.iter())
                .enumerate()
            {
                let amt = (i as f32 + 0.5) * inv;
                let gain = master_start + (master_end - master_start) * amt;
                frame[0] = s * gain;
                frame[1] = s * gain;
            }
        }

        // Sample path
        let listener_start = self.listener;
        self.listener.step(dt);

        let listener_end = &self.listener;
        self.samples.retain_mut(|sample| {
            let start = sample.gains(&listener_start, master_start);
            sample.step(dt);
            let end = sample.gains(listener_end, master_end);
            !sample.mix_into(out, start, end)
        });

        for s in out.iter_mut() {
            *s = soft_clip(*s);
        }
    }
}
