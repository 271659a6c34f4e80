//! Host audio output using cpal
//!
//! The mixer runs directly inside the cpal data callback. cpal may ask for
//! any number of samples per callback, so a one-block staging buffer sits
//! between the mixer's fixed blocks and the device's request size.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, error, info};

use crate::error::OutputError;
use crate::mixer::{Mixer, lock_mixer};
use crate::{AUDIO_RATE, CHANNELS};

/// Adapts fixed mixer blocks to arbitrary callback sizes
pub(crate) struct BlockAdapter {
    block: Vec<f32>,
    /// Next unread sample in `block`
    cursor: usize,
}

impl BlockAdapter {
    pub(crate) fn new(block_len: usize) -> Self {
        Self {
            block: vec![0.0; block_len],
            // Start drained so the first callback mixes a fresh block
            cursor: block_len,
        }
    }

    /// Fill `data` from staged audio, mixing new blocks as needed
    pub(crate) fn fill(&mut self, mixer: &mut Mixer, data: &mut [f32]) {
        let mut written = 0;
        while written < data.len() {
            if self.cursor == self.block.len() {
                mixer.mix_block(&mut self.block);
                self.cursor = 0;
            }
            let n = (self.block.len() - self.cursor).min(data.len() - written);
            data[written..written + n].copy_from_slice(&self.block[self.cursor..self.cursor + n]);
            written += n;
            self.cursor += n;
        }
    }
}

/// A running cpal output stream driving a shared [`Mixer`]
pub struct AudioOutput {
    stream: cpal::Stream,
}

impl AudioOutput {
    /// Open the default output device and start pulling blocks from `mixer`.
    ///
    /// Requests stereo f32 at 48 kHz with a fixed buffer of `block_frames`;
    /// falls back to the device's default buffer size if that is refused.
    pub fn open(mixer: Arc<Mutex<Mixer>>) -> Result<Self, OutputError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(OutputError::NoDevice)?;

        let block_frames = lock_mixer(&mixer).block_frames();

        let mut config = cpal::StreamConfig {
            channels: CHANNELS as u16,
            sample_rate: cpal::SampleRate(AUDIO_RATE),
            buffer_size: cpal::BufferSize::Fixed(block_frames as u32),
        };

        let stream = match build_stream(&device, &config, Arc::clone(&mixer), block_frames) {
            Ok(stream) => stream,
            Err(e) => {
                debug!("Fixed {}-frame buffer refused ({}), retrying with default", block_frames, e);
                config.buffer_size = cpal::BufferSize::Default;
                build_stream(&device, &config, mixer, block_frames)?
            }
        };

        stream.play()?;

        info!(
            "Audio output started: {} Hz, {} frames per block",
            AUDIO_RATE, block_frames
        );

        Ok(Self { stream })
    }

    /// Stop pulling audio. Callbacks stop before this returns.
    pub fn pause(&self) -> Result<(), OutputError> {
        self.stream.pause()?;
        Ok(())
    }
}

fn build_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mixer: Arc<Mutex<Mixer>>,
    block_frames: usize,
) -> Result<cpal::Stream, OutputError> {
    let mut adapter = BlockAdapter::new(block_frames * CHANNELS);
    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            // Held for the whole callback so every block sees one consistent state
            let mut mixer = lock_mixer(&mixer);
            adapter.fill(&mut mixer, data);
        },
        |err| error!("Audio stream error: {}", err),
        None,
    )?;
    Ok(stream)
}
