//! Pre-recorded sample clips and their in-flight playback entries
//!
//! A [`Sample`] is immutable, reference-counted mono PCM at [`AUDIO_RATE`].
//! Starting playback creates an entry in the mixer and hands back a
//! [`PlayingSample`] that mutates that entry under the mixer lock.

use std::path::Path;
use std::sync::{Arc, Mutex};

use glam::Vec3;
use tracing::{debug, trace};

use crate::AUDIO_RATE;
use crate::error::SampleError;
use crate::listener::Listener;
use crate::mixer::{Mixer, lock_mixer};
use crate::panning::{compute_pan_from_listener_and_position, compute_pan_weights};
use crate::ramp::Ramp;

/// Mono f32 clip at the engine sample rate
///
/// Cloning is cheap; the PCM data is shared.
#[derive(Debug, Clone, Default)]
pub struct Sample {
    pub data: Arc<Vec<f32>>,
}

impl Sample {
    /// Wrap already-decoded mono samples (assumed to be at [`AUDIO_RATE`])
    pub fn from_samples(data: Vec<f32>) -> Self {
        Self {
            data: Arc::new(data),
        }
    }

    /// Load a clip from disk, dispatching on the file extension.
    ///
    /// Only `.wav` is supported. Stereo is downmixed and other sample rates
    /// are linearly resampled to [`AUDIO_RATE`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SampleError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("wav") => {
                let data = load_wav(path)?;
                debug!("Loaded sample {} ({} samples)", path.display(), data.len());
                Ok(Self::from_samples(data))
            }
            _ => Err(SampleError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Playback length in seconds
    pub fn duration(&self) -> f32 {
        self.data.len() as f32 / AUDIO_RATE as f32
    }
}

fn load_wav(path: &Path) -> Result<Vec<f32>, SampleError> {
    let wav_err = |source| SampleError::Wav {
        path: path.to_path_buf(),
        source,
    };

    let reader = hound::WavReader::open(path).map_err(wav_err)?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            if !(1..=32).contains(&spec.bits_per_sample) {
                return Err(SampleError::UnsupportedBitDepth(spec.bits_per_sample));
            }
            let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()
                .map_err(wav_err)?
        }
        hound::SampleFormat::Float => {
            if spec.bits_per_sample != 32 {
                return Err(SampleError::UnsupportedBitDepth(spec.bits_per_sample));
            }
            reader
                .into_samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(wav_err)?
        }
    };

    let mono = match spec.channels {
        1 => interleaved,
        2 => interleaved
            .chunks_exact(2)
            .map(|frame| (frame[0] + frame[1]) * 0.5)
            .collect(),
        n => return Err(SampleError::UnsupportedChannels(n)),
    };

    if spec.sample_rate == AUDIO_RATE {
        Ok(mono)
    } else {
        debug!(
            "Resampling {} from {} Hz to {} Hz",
            path.display(),
            spec.sample_rate,
            AUDIO_RATE
        );
        Ok(resample_linear(&mono, spec.sample_rate, AUDIO_RATE))
    }
}

/// Linear interpolation resampler
pub(crate) fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if samples.is_empty() || from_rate == to_rate || from_rate == 0 {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = ((samples.len() as f64) / ratio).ceil() as usize;
    let last = samples.len() - 1;

    (0..out_len)
        .map(|i| {
            let src = i as f64 * ratio;
            let idx = (src.floor() as usize).min(last);
            let next = (idx + 1).min(last);
            let frac = (src - idx as f64) as f32;
            samples[idx] * (1.0 - frac) + samples[next] * frac
        })
        .collect()
}

/// How an entry is placed in the stereo field. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Placement {
    Pan(Ramp<f32>),
    Positional {
        position: Ramp<Vec3>,
        half_volume_radius: Ramp<f32>,
    },
}

impl Placement {
    fn step(&mut self, dt: f32) {
        match self {
            Placement::Pan(pan) => pan.step(dt),
            Placement::Positional {
                position,
                half_volume_radius,
            } => {
                position.step(dt);
                half_volume_radius.step(dt);
            }
        }
    }
}

/// One in-flight clip owned by the mixer
#[derive(Debug, Clone)]
pub(crate) struct SampleVoice {
    pub(crate) id: u64,
    data: Arc<Vec<f32>>,
    volume: Ramp<f32>,
    placement: Placement,
    looping: bool,
    /// Next sample index to read
    playhead: usize,
    stopping: bool,
}

impl SampleVoice {
    pub(crate) fn new(
        id: u64,
        sample: &Sample,
        volume: f32,
        placement: Placement,
        looping: bool,
    ) -> Self {
        Self {
            id,
            data: Arc::clone(&sample.data),
            volume: Ramp::new(volume),
            placement,
            looping,
            playhead: 0,
            stopping: false,
        }
    }

    pub(crate) fn is_stopping(&self) -> bool {
        self.stopping
    }

    pub(crate) fn set_volume(&mut self, volume: f32, ramp: f32) {
        if !volume.is_finite() {
            trace!("Non-finite volume ignored on sample {}", self.id);
            return;
        }
        // A fade-out in progress wins over later volume changes
        if !self.stopping {
            self.volume.set(volume, ramp);
        }
    }

    pub(crate) fn set_pan(&mut self, value: f32, ramp: f32) {
        if !value.is_finite() {
            trace!("Non-finite pan ignored on sample {}", self.id);
            return;
        }
        match &mut self.placement {
            Placement::Pan(pan) => pan.set(value, ramp),
            Placement::Positional { .. } => trace!("set_pan ignored on positional sample {}", self.id),
        }
    }

    pub(crate) fn set_position(&mut self, value: Vec3, ramp: f32) {
        if !value.is_finite() {
            trace!("Non-finite position ignored on sample {}", self.id);
            return;
        }
        match &mut self.placement {
            Placement::Positional { position, .. } => position.set(value, ramp),
            Placement::Pan(_) => trace!("set_position ignored on panned sample {}", self.id),
        }
    }

    pub(crate) fn set_half_volume_radius(&mut self, value: f32, ramp: f32) {
        if !value.is_finite() {
            trace!("Non-finite radius ignored on sample {}", self.id);
            return;
        }
        match &mut self.placement {
            Placement::Positional {
                half_volume_radius, ..
            } => half_volume_radius.set(value, ramp),
            Placement::Pan(_) => {
                trace!("set_half_volume_radius ignored on panned sample {}", self.id)
            }
        }
    }

    /// Fade to silence over `ramp` seconds, then remove.
    ///
    /// Repeated calls can only make the fade shorter.
    pub(crate) fn stop(&mut self, ramp: f32) {
        if self.stopping {
            self.volume.shorten(ramp);
        } else {
            self.stopping = true;
            self.volume.set(0.0, ramp);
        }
    }

    /// Left/right gains for the current ramp values
    pub(crate) fn gains(&self, listener: &Listener, master: f32) -> (f32, f32) {
        let (left, right) = match &self.placement {
            Placement::Pan(pan) => compute_pan_weights(pan.value()),
            Placement::Positional {
                position,
                half_volume_radius,
            } => compute_pan_from_listener_and_position(
                listener.position(),
                listener.right(),
                position.value(),
                half_volume_radius.value(),
            ),
        };
        let gain = self.volume.value() * master;
        (left * gain, right * gain)
    }

    /// Advance every ramp on this entry by `dt` seconds
    pub(crate) fn step(&mut self, dt: f32) {
        self.volume.step(dt);
        self.placement.step(dt);
    }

    /// Add this clip into interleaved stereo `out`, interpolating gains from
    /// `start` to `end` across the block.
    ///
    /// Returns `true` once the entry should be removed.
    pub(crate) fn mix_into(&mut self, out: &mut [f32], start: (f32, f32), end: (f32, f32)) -> bool {
        if self.data.is_empty() {
            return true;
        }

        let frames = out.len() / 2;
        let inv = 1.0 / frames as f32;
        let mut finished = false;

        for (i, frame) in out.chunks_exact_mut(2).enumerate() {
            if self.playhead >= self.data.len() {
                if self.looping {
                    self.playhead = 0;
                } else {
                    finished = true;
                    break;
                }
            }

            let amt = (i as f32 + 0.5) * inv;
            let left = start.0 + (end.0 - start.0) * amt;
            let right = start.1 + (end.1 - start.1) * amt;
            let s = self.data[self.playhead];
            frame[0] += left * s;
            frame[1] += right * s;
            self.playhead += 1;
        }

        if !self.looping && self.playhead >= self.data.len() {
            finished = true;
        }

        finished || (self.stopping && self.volume.value() == 0.0)
    }
}

/// Handle to a clip started on an engine.
///
/// Every setter takes the mixer lock. Once the mixer has removed the entry
/// (clip ended or faded out after [`stop`](Self::stop)) the handle is inert.
#[derive(Debug, Clone)]
pub struct PlayingSample {
    id: u64,
    mixer: Arc<Mutex<Mixer>>,
}

impl PlayingSample {
    pub(crate) fn new(id: u64, mixer: Arc<Mutex<Mixer>>) -> Self {
        Self { id, mixer }
    }

    /// Engine-unique id of this playback
    pub fn id(&self) -> u64 {
        self.id
    }

    fn with_voice<R>(&self, f: impl FnOnce(&mut SampleVoice) -> R) -> Option<R> {
        let mut mixer = lock_mixer(&self.mixer);
        mixer.sample_mut(self.id).map(f)
    }

    /// Ramp volume over `ramp` seconds. Ignored once stopping.
    pub fn set_volume(&self, volume: f32, ramp: f32) {
        self.with_voice(|voice| voice.set_volume(volume, ramp));
    }

    /// Ramp the 2D pan (-1 left ..= 1 right). No-op on positional samples.
    pub fn set_pan(&self, pan: f32, ramp: f32) {
        self.with_voice(|voice| voice.set_pan(pan, ramp));
    }

    /// Ramp the world position. No-op on 2D samples.
    pub fn set_position(&self, position: Vec3, ramp: f32) {
        self.with_voice(|voice| voice.set_position(position, ramp));
    }

    /// Ramp the distance at which volume halves. No-op on 2D samples.
    pub fn set_half_volume_radius(&self, radius: f32, ramp: f32) {
        self.with_voice(|voice| voice.set_half_volume_radius(radius, ramp));
    }

    /// Fade out over `ramp` seconds and remove
    pub fn stop(&self, ramp: f32) {
        self.with_voice(|voice| voice.stop(ramp));
    }

    /// True while a fade-out is in progress
    pub fn is_stopping(&self) -> bool {
        self.with_voice(|voice| voice.is_stopping()).unwrap_or(false)
    }

    /// True once the mixer has dropped this playback
    pub fn is_stopped(&self) -> bool {
        self.with_voice(|_| ()).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1024.0 / 48_000.0;

    fn voice(data: Vec<f32>, looping: bool) -> SampleVoice {
        SampleVoice::new(
            1,
            &Sample::from_samples(data),
            1.0,
            Placement::Pan(Ramp::new(0.0)),
            looping,
        )
    }

    #[test]
    fn test_mix_into_applies_gains() {
        let mut v = voice(vec![1.0; 8], false);
        let mut out = vec![0.0; 8];
        let done = v.mix_into(&mut out, (0.5, 0.25), (0.5, 0.25));
        assert!(!done);
        for frame in out.chunks_exact(2) {
            assert_eq!(frame, [0.5, 0.25]);
        }
    }

    #[test]
    fn test_mix_into_interpolates_at_frame_centers() {
        let mut v = voice(vec![1.0; 4], true);
        let mut out = vec![0.0; 4];
        v.mix_into(&mut out, (0.0, 0.0), (1.0, 1.0));
        // amt = 0.25, 0.75
        assert_eq!(out, vec![0.25, 0.25, 0.75, 0.75]);
    }

    #[test]
    fn test_finishes_exactly_at_end() {
        let mut v = voice(vec![1.0; 6], false);
        let mut out = vec![0.0; 4];
        assert!(!v.mix_into(&mut out, (1.0, 1.0), (1.0, 1.0)));
        let mut out = vec![0.0; 8];
        assert!(v.mix_into(&mut out, (1.0, 1.0), (1.0, 1.0)));
        // Only the 4 remaining samples were written
        assert_eq!(&out[..4], &[1.0, 1.0, 1.0, 1.0]);
        assert_eq!(&out[4..], &[0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_looping_wraps() {
        let mut v = voice(vec![1.0, 2.0, 3.0], true);
        let mut out = vec![0.0; 16];
        for _ in 0..10 {
            out.fill(0.0);
            assert!(!v.mix_into(&mut out, (1.0, 0.0), (1.0, 0.0)));
        }
        let lefts: Vec<f32> = out.chunks_exact(2).map(|f| f[0]).collect();
        assert!(lefts.iter().all(|s| [1.0, 2.0, 3.0].contains(s)));
    }

    #[test]
    fn test_empty_clip_finishes_even_when_looping() {
        let mut v = voice(Vec::new(), true);
        let mut out = vec![0.0; 8];
        assert!(v.mix_into(&mut out, (1.0, 1.0), (1.0, 1.0)));
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_stop_shortens_only() {
        let mut v = voice(vec![1.0; 4], true);
        v.stop(1.0);
        assert!(v.is_stopping());
        assert_eq!(v.volume.remaining(), 1.0);
        v.stop(2.0);
        assert_eq!(v.volume.remaining(), 1.0);
        v.stop(0.5);
        assert_eq!(v.volume.remaining(), 0.5);

        // Volume changes are ignored while fading out
        v.set_volume(1.0, 0.0);
        assert_eq!(v.volume.target(), 0.0);
    }

    #[test]
    fn test_stopped_and_silent_is_finished() {
        let mut v = voice(vec![1.0; 4], true);
        v.stop(DT);
        v.step(DT);
        let mut out = vec![0.0; 8];
        assert!(v.mix_into(&mut out, (0.0, 0.0), (0.0, 0.0)));
    }

    #[test]
    fn test_wrong_mode_setters_are_ignored() {
        let mut v = voice(vec![1.0], false);
        v.set_position(Vec3::ONE, 0.0);
        v.set_half_volume_radius(5.0, 0.0);
        assert_eq!(v.placement, Placement::Pan(Ramp::new(0.0)));

        let mut v = SampleVoice::new(
            2,
            &Sample::from_samples(vec![1.0]),
            1.0,
            Placement::Positional {
                position: Ramp::new(Vec3::ZERO),
                half_volume_radius: Ramp::new(1.0),
            },
            false,
        );
        v.set_pan(1.0, 0.0);
        v.set_position(Vec3::X, 0.0);
        match v.placement {
            Placement::Positional { position, .. } => assert_eq!(position.value(), Vec3::X),
            Placement::Pan(_) => panic!("placement changed mode"),
        }
    }

    #[test]
    fn test_non_finite_setters_are_ignored() {
        let mut v = voice(vec![1.0], false);
        v.set_pan(0.5, 0.0);
        v.set_pan(f32::NAN, 0.0);
        v.set_pan(f32::INFINITY, 0.0);
        assert_eq!(v.placement, Placement::Pan(Ramp::new(0.5)));
        v.set_volume(f32::NAN, 0.0);
        assert_eq!(v.volume.value(), 1.0);

        let mut v = SampleVoice::new(
            2,
            &Sample::from_samples(vec![1.0]),
            1.0,
            Placement::Positional {
                position: Ramp::new(Vec3::X),
                half_volume_radius: Ramp::new(2.0),
            },
            false,
        );
        v.set_position(Vec3::new(f32::NAN, 0.0, 0.0), 0.0);
        v.set_half_volume_radius(f32::NAN, 0.0);
        let (l, r) = v.gains(&Listener::default(), 1.0);
        assert!(l.is_finite() && r.is_finite());
        match v.placement {
            Placement::Positional {
                position,
                half_volume_radius,
            } => {
                assert_eq!(position.value(), Vec3::X);
                assert_eq!(half_volume_radius.value(), 2.0);
            }
            Placement::Pan(_) => panic!("placement changed mode"),
        }
    }

    #[test]
    fn test_gains_include_master() {
        let v = voice(vec![1.0], false);
        let (l, r) = v.gains(&Listener::default(), 0.5);
        let (pl, pr) = compute_pan_weights(0.0);
        assert!((l - pl * 0.5).abs() < 1e-6);
        assert!((r - pr * 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_resample_linear() {
        let out = resample_linear(&[0.0, 1.0, 0.0, -1.0], 24_000, 48_000);
        assert_eq!(out.len(), 8);
        assert_eq!(out[0], 0.0);
        assert!((out[1] - 0.5).abs() < 1e-6);
        assert_eq!(out[2], 1.0);

        let same = resample_linear(&[0.1, 0.2], 48_000, 48_000);
        assert_eq!(same, vec![0.1, 0.2]);
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let err = Sample::load("voice.ogg").unwrap_err();
        assert!(matches!(err, SampleError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_load_wav_stereo_downmix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.WAV");

        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: AUDIO_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..100 {
            writer.write_sample(16384i16).unwrap();
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let sample = Sample::load(&path).unwrap();
        assert_eq!(sample.len(), 100);
        assert!(sample.data.iter().all(|&s| (s - 0.25).abs() < 1e-4));
    }

    #[test]
    fn test_load_wav_resamples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("low.wav");

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 24_000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..240 {
            writer.write_sample(0.5f32).unwrap();
        }
        writer.finalize().unwrap();

        let sample = Sample::load(&path).unwrap();
        assert_eq!(sample.len(), 480);
        assert!((sample.duration() - 0.01).abs() < 1e-6);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Sample::load("/definitely/not/here.wav").unwrap_err();
        assert!(matches!(err, SampleError::Wav { .. }));
    }
}
