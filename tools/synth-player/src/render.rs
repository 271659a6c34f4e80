//! Offline rendering to a 32-bit float WAV

use std::path::Path;

use anyhow::{Context, Result};
use nether_synth::{AUDIO_RATE, AudioEngine, CHANNELS, EngineConfig, Sample};
use tracing::info;

use crate::riff;

/// Render `seconds` of the demo riff (plus an optional looping clip) to `output`.
///
/// Returns the number of stereo frames written.
pub fn render_to_wav(
    output: &Path,
    seconds: f32,
    config: &EngineConfig,
    background: Option<&Sample>,
) -> Result<usize> {
    let engine = AudioEngine::without_output(config)?;
    if let Some(sample) = background {
        engine.loop_sample(sample, 0.5, 0.0);
    }

    let spec = hound::WavSpec {
        channels: CHANNELS as u16,
        sample_rate: AUDIO_RATE,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(output, spec)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    let block_frames = engine.block_frames();
    let total_frames = (seconds.max(0.0) * AUDIO_RATE as f32) as usize;
    let step_frames = (riff::STEP_SECONDS * AUDIO_RATE as f32) as usize;
    let mut block = vec![0.0; block_frames * CHANNELS];

    let mut written = 0;
    let mut next_step = 0;
    while written < total_frames {
        // Triggers are quantized to block boundaries, as they are live
        while next_step * step_frames <= written {
            riff::trigger(&engine, next_step)?;
            next_step += 1;
        }

        engine.render_block(&mut block);
        let frames = block_frames.min(total_frames - written);
        for &s in &block[..frames * CHANNELS] {
            writer.write_sample(s)?;
        }
        written += frames;
    }

    writer.finalize()?;
    info!("Rendered {} frames to {}", written, output.display());
    Ok(written)
}
