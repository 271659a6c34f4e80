//! Engine context: owns the shared mixer and the device stream
//!
//! Every control call takes the mixer lock for its duration. Use
//! [`AudioEngine::lock`] to apply several changes atomically with respect to
//! the audio callback.

use std::sync::{Arc, Mutex, MutexGuard};

use glam::Vec3;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::error::{ConfigError, OutputError, SynthError};
use crate::mixer::{Mixer, lock_mixer};
use crate::output::AudioOutput;
use crate::ramp::Ramp;
use crate::sample::{Placement, PlayingSample, Sample};
use crate::synth::{SynthConfig, Voice};

/// A running audio engine.
///
/// Multiple engines can coexist; they share nothing.
pub struct AudioEngine {
    mixer: Arc<Mutex<Mixer>>,
    output: Option<AudioOutput>,
}

impl AudioEngine {
    /// Create the mixer and open the default output device.
    ///
    /// A missing or failing device is not an error: it is logged once and
    /// the engine runs silently. Only an invalid `config` fails.
    pub fn init(config: &EngineConfig) -> Result<Self, ConfigError> {
        let mut engine = Self::without_output(config)?;

        let opened = if config.output.enabled {
            AudioOutput::open(Arc::clone(&engine.mixer))
        } else {
            Err(OutputError::Disabled)
        };

        match opened {
            Ok(output) => engine.output = Some(output),
            Err(OutputError::Disabled) => info!("Audio output disabled; running silent"),
            Err(e) => warn!("Audio output unavailable, running silent: {}", e),
        }

        Ok(engine)
    }

    /// Create an engine with no device. Audio is only produced through
    /// [`render_block`](Self::render_block).
    pub fn without_output(config: &EngineConfig) -> Result<Self, ConfigError> {
        let mixer = Mixer::new(config)?;
        Ok(Self {
            mixer: Arc::new(Mutex::new(mixer)),
            output: None,
        })
    }

    /// Pause and close the device. Safe to call repeatedly or without a device.
    pub fn shutdown(&mut self) {
        if let Some(output) = self.output.take() {
            if let Err(e) = output.pause() {
                warn!("Failed to pause audio output: {}", e);
            }
            drop(output);
            info!("Audio output stopped");
        }
    }

    /// True while a device stream is running
    pub fn has_output(&self) -> bool {
        self.output.is_some()
    }

    /// Stereo frames per mix block
    pub fn block_frames(&self) -> usize {
        self.lock().block_frames()
    }

    /// Lock the mixer for a group of edits. The audio callback waits until
    /// the guard is dropped, so keep it short.
    pub fn lock(&self) -> MutexGuard<'_, Mixer> {
        lock_mixer(&self.mixer)
    }

    /// Mix the next block into `out` (`block_frames * 2` interleaved samples).
    ///
    /// For offline rendering; with a device running this steals blocks from it.
    pub fn render_block(&self, out: &mut [f32]) {
        self.lock().mix_block(out);
    }

    fn start(&self, sample: &Sample, volume: f32, placement: Placement, looping: bool) -> PlayingSample {
        let id = self.lock().add_sample(sample, volume, placement, looping);
        PlayingSample::new(id, Arc::clone(&self.mixer))
    }

    /// Play a clip once with a 2D pan (-1 left ..= 1 right)
    pub fn play(&self, sample: &Sample, volume: f32, pan: f32) -> PlayingSample {
        self.start(sample, volume, Placement::Pan(Ramp::new(pan)), false)
    }

    /// Play a clip once from a world position
    pub fn play_3d(
        &self,
        sample: &Sample,
        volume: f32,
        position: Vec3,
        half_volume_radius: f32,
    ) -> PlayingSample {
        self.start(sample, volume, positional(position, half_volume_radius), false)
    }

    /// Loop a clip with a 2D pan until stopped
    pub fn loop_sample(&self, sample: &Sample, volume: f32, pan: f32) -> PlayingSample {
        self.start(sample, volume, Placement::Pan(Ramp::new(pan)), true)
    }

    /// Loop a clip from a world position until stopped
    pub fn loop_3d(
        &self,
        sample: &Sample,
        volume: f32,
        position: Vec3,
        half_volume_radius: f32,
    ) -> PlayingSample {
        self.start(sample, volume, positional(position, half_volume_radius), true)
    }

    /// Ramp the master volume over `ramp` seconds
    pub fn set_volume(&self, volume: f32, ramp: f32) {
        self.lock().set_master_volume(volume, ramp);
    }

    /// Fade every playing sample out over `ramp` seconds
    pub fn stop_all_samples(&self, ramp: f32) {
        self.lock().stop_all_samples(ramp);
    }

    /// Ramp the listener frame used by positional samples
    pub fn set_position_and_right(&self, position: Vec3, right: Vec3, ramp: f32) {
        self.lock().set_listener(position, right, ramp);
    }

    /// Replace a voice's timbre
    pub fn configure(&self, voice: Voice, config: SynthConfig) -> Result<(), SynthError> {
        self.lock().synth_mut(voice).configure(config)
    }

    /// Trigger a note on a voice
    pub fn play_note(&self, voice: Voice, frequency: f32) -> Result<(), SynthError> {
        self.lock().synth_mut(voice).play(frequency)
    }

    /// Move a voice into its release phase
    pub fn request_release(&self, voice: Voice) {
        self.lock().synth_mut(voice).request_release();
    }

    /// Switch a voice off immediately
    pub fn silence(&self, voice: Voice) {
        self.lock().synth_mut(voice).silence();
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn positional(position: Vec3, half_volume_radius: f32) -> Placement {
    Placement::Positional {
        position: Ramp::new(position),
        half_volume_radius: Ramp::new(half_volume_radius),
    }
}
