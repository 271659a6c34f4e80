//! Nether-Synth: real-time procedural audio engine
//!
//! A small pool of oscillator voices shaped by ADSR envelopes, mixed together
//! with pre-recorded samples (2D pan or 3D positional) into a fixed-size
//! interleaved stereo block on the host audio thread.
//!
//! # Architecture
//!
//! ```text
//! Control Thread                         cpal Thread
//!     │                                      │
//! [play / stop / set_*]                      │
//!     │                                      │
//!     └──lock──► Mutex<Mixer> ◄──lock────[Callback]
//!                 ├─ synth voices            [mix_block() per 1024 frames]
//!                 ├─ playing samples         [step ramps once per block]
//!                 ├─ listener, master volume
//!                 └─ crackle scheduler
//! ```
//!
//! The callback holds the mixer lock for the whole pass, so every block sees
//! a consistent snapshot of envelopes and ramps.
//!
//! # Usage
//!
//! ```no_run
//! use nether_synth::{AudioEngine, EngineConfig, Sample, SynthConfig, Voice};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut engine = AudioEngine::init(&EngineConfig::default())?;
//! engine.configure(Voice::Lead, SynthConfig::lead())?;
//! engine.play_note(Voice::Lead, 440.0)?;
//!
//! let clip = Sample::load("assets/door.wav")?;
//! let handle = engine.play(&clip, 1.0, -0.5);
//! handle.set_pan(0.5, 0.25);
//!
//! engine.request_release(Voice::Lead);
//! engine.shutdown();
//! # Ok(())
//! # }
//! ```
//!
//! Audio specs:
//! - 48,000 Hz sample rate
//! - Stereo, 32-bit float output
//! - 1024-frame mix blocks (configurable, power of two)

mod config;
mod engine;
mod error;
mod listener;
mod mixer;
mod output;
mod panning;
mod ramp;
mod sample;
mod synth;

pub use config::{EngineConfig, MixConfig, OutputConfig, config_dir, load, load_from, save_to};
pub use engine::AudioEngine;
pub use error::{ConfigError, OutputError, SampleError, SynthError};
pub use listener::Listener;
pub use mixer::{Crackle, Mixer};
pub use output::AudioOutput;
pub use panning::{compute_pan_from_listener_and_position, compute_pan_weights};
pub use ramp::Ramp;
pub use sample::{PlayingSample, Sample};
pub use synth::{AdsrState, Oscillator, Stage, SynthConfig, SynthVoice, Voice};

/// Output sample rate (48 kHz)
pub const AUDIO_RATE: u32 = 48_000;

/// Default number of stereo frames mixed per callback block (must be a power of two)
pub const MIX_SAMPLES: usize = 1024;

/// Interleaved output channels (left, right)
pub const CHANNELS: usize = 2;

/// Default ramp time in seconds for fades that don't specify one
pub const DEFAULT_RAMP: f32 = 1.0 / 60.0;
