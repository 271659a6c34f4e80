//! Mixer block tests

use std::f32::consts::SQRT_2;

use super::*;
use crate::config::{MixConfig, OutputConfig};
use crate::synth::{Oscillator, Stage, SynthConfig};

const FRAMES: usize = 64;

fn test_config() -> EngineConfig {
    EngineConfig {
        output: OutputConfig {
            enabled: false,
            block_frames: FRAMES,
        },
        mix: MixConfig {
            master_volume: 1.0,
            crackle: false,
            seed: Some(7),
        },
    }
}

fn mixer() -> Mixer {
    Mixer::new(&test_config()).unwrap()
}

/// Square voice that reaches full level on its second sample and holds it
fn flat_square() -> SynthConfig {
    SynthConfig {
        oscillator: Oscillator::Square,
        volume: 1.0,
        attack: Stage::new(1.0, 1),
        decay: Stage::new(1.0, 1),
        sustain: 1.0,
        release: Stage::new(0.0, 1),
    }
}

fn pan(value: f32) -> Placement {
    Placement::Pan(Ramp::new(value))
}

fn block(mixer: &mut Mixer) -> Vec<f32> {
    let mut out = vec![0.0; mixer.block_len()];
    mixer.mix_block(&mut out);
    out
}

#[test]
fn test_soft_clip() {
    assert_eq!(soft_clip(0.0), 0.0);
    assert_eq!(soft_clip(1.0), 1.0);
    assert_eq!(soft_clip(-0.75), -0.75);
    assert!(soft_clip(1.5) > 1.0 && soft_clip(1.5) < 2.0);
    assert!(soft_clip(-100.0) >= -2.0);
    assert!(soft_clip(3.0) > soft_clip(2.0));
}

#[test]
fn test_invalid_block_size_rejected() {
    let mut config = test_config();
    config.output.block_frames = 1000;
    assert!(Mixer::new(&config).is_err());
}

#[test]
fn test_silent_without_voices() {
    let mut mixer = mixer();
    let mut out = vec![9.0; mixer.block_len()];
    mixer.mix_block(&mut out);
    assert_eq!(out.len(), FRAMES * 2);
    assert!(out.iter().all(|&s| s == 0.0));
    assert_eq!(mixer.crackle().global_sample(), 0);
}

#[test]
fn test_active_voices_are_normalized() {
    let mut mixer = mixer();
    for voice in [Voice::Bass, Voice::Kick, Voice::Lead] {
        let synth = mixer.synth_mut(voice);
        synth.configure(flat_square()).unwrap();
        // 10 Hz: the whole block sits in the positive half-cycle
        synth.play(10.0).unwrap();
    }
    assert_eq!(mixer.active_voices(), 3);

    // First block contains the attack sample
    block(&mut mixer);
    let out = block(&mut mixer);
    assert!(out.iter().all(|&s| s == 1.0));
}

#[test]
fn test_silenced_voice_leaves_the_mix() {
    let mut mixer = mixer();
    mixer.synth_mut(Voice::Kick).configure(flat_square()).unwrap();
    mixer.synth_mut(Voice::Kick).play(10.0).unwrap();
    block(&mut mixer);
    mixer.synth_mut(Voice::Kick).silence();
    let out = block(&mut mixer);
    assert!(out.iter().all(|&s| s == 0.0));
    assert_eq!(mixer.active_voices(), 0);
}

#[test]
fn test_hard_left_sample() {
    let mut mixer = mixer();
    mixer.add_sample(&Sample::from_samples(vec![0.5; 100]), 1.0, pan(-1.0), false);
    let out = block(&mut mixer);
    for frame in out.chunks_exact(2) {
        assert!((frame[0] - 0.5).abs() < 1e-6);
        assert!(frame[1].abs() < 1e-6);
    }
    assert_eq!(mixer.active_samples(), 1);
}

#[test]
fn test_sample_removed_at_end_of_data() {
    let mut mixer = mixer();
    mixer.add_sample(&Sample::from_samples(vec![1.0; 100]), 1.0, pan(0.0), false);
    block(&mut mixer);
    assert_eq!(mixer.active_samples(), 1);

    let out = block(&mut mixer);
    assert_eq!(mixer.active_samples(), 0);
    // 36 frames of data remained for the second block
    assert!(out[35 * 2] > 0.0);
    assert_eq!(out[36 * 2], 0.0);
}

#[test]
fn test_sample_ending_on_block_boundary() {
    let mut mixer = mixer();
    mixer.add_sample(&Sample::from_samples(vec![1.0; FRAMES]), 1.0, pan(0.0), false);
    block(&mut mixer);
    assert_eq!(mixer.active_samples(), 0);
}

#[test]
fn test_looping_sample_never_self_removes() {
    let mut mixer = mixer();
    mixer.add_sample(&Sample::from_samples(vec![0.25; 10]), 1.0, pan(0.0), true);
    for _ in 0..100 {
        let out = block(&mut mixer);
        assert!(out.iter().all(|&s| s > 0.0));
    }
    assert_eq!(mixer.active_samples(), 1);
}

#[test]
fn test_stop_fades_then_removes() {
    let mut mixer = mixer();
    let id = mixer.add_sample(&Sample::from_samples(vec![1.0; 10]), 1.0, pan(0.0), true);
    let dt = FRAMES as f32 / AUDIO_RATE as f32;
    mixer.sample_mut(id).unwrap().stop(2.0 * dt);

    block(&mut mixer);
    assert_eq!(mixer.active_samples(), 1);
    let out = block(&mut mixer);
    assert_eq!(mixer.active_samples(), 0);
    // Faded across the block, not cut
    assert!(out[0] > out[out.len() - 2]);
    assert!(mixer.sample_mut(id).is_none());
}

#[test]
fn test_stop_all_samples() {
    let mut mixer = mixer();
    for _ in 0..3 {
        mixer.add_sample(&Sample::from_samples(vec![1.0; 10]), 1.0, pan(0.0), true);
    }
    mixer.stop_all_samples(0.0);
    block(&mut mixer);
    assert_eq!(mixer.active_samples(), 0);
}

#[test]
fn test_master_volume_scales_samples() {
    let mut mixer = mixer();
    mixer.set_master_volume(0.5, 0.0);
    mixer.add_sample(&Sample::from_samples(vec![0.5; 100]), 1.0, pan(-1.0), false);
    let out = block(&mut mixer);
    assert!((out[0] - 0.25).abs() < 1e-6);
}

#[test]
fn test_master_ramp_is_smooth_within_block() {
    let mut mixer = mixer();
    mixer.set_master_volume(0.0, 0.0);
    let dt = FRAMES as f32 / AUDIO_RATE as f32;
    mixer.set_master_volume(1.0, dt);
    mixer.add_sample(&Sample::from_samples(vec![1.0; 1000]), 1.0, pan(-1.0), false);

    let out = block(&mut mixer);
    let lefts: Vec<f32> = out.chunks_exact(2).map(|f| f[0]).collect();
    assert!(lefts.windows(2).all(|w| w[1] > w[0]));
    assert!(lefts[0] > 0.0 && lefts[0] < 0.05);
    assert!(lefts[FRAMES - 1] > 0.95);
    assert_eq!(mixer.master_volume(), 1.0);
}

#[test]
fn test_positional_sample_at_listener() {
    let mut mixer = mixer();
    let placement = Placement::Positional {
        position: Ramp::new(Vec3::ZERO),
        half_volume_radius: Ramp::new(1.0),
    };
    mixer.add_sample(&Sample::from_samples(vec![0.5; 100]), 1.0, placement, false);
    let out = block(&mut mixer);
    let expected = 0.5 * SQRT_2;
    assert!((out[0] - expected).abs() < 1e-6);
    assert!((out[1] - expected).abs() < 1e-6);
}

#[test]
fn test_positional_sample_follows_listener() {
    let mut mixer = mixer();
    let placement = Placement::Positional {
        position: Ramp::new(Vec3::new(1.0, 0.0, 0.0)),
        half_volume_radius: Ramp::new(1.0),
    };
    mixer.add_sample(&Sample::from_samples(vec![1.0; 1000]), 1.0, placement, true);

    // Source on the right
    let out = block(&mut mixer);
    assert!(out[1] > out[0]);

    // Turn around: source on the left, still at distance 1 (half volume)
    mixer.set_listener(Vec3::ZERO, Vec3::NEG_X, 0.0);
    let out = block(&mut mixer);
    assert!(out[0] > out[1]);
    assert!((out[0] - 0.5).abs() < 1e-5);
}

#[test]
fn test_block_clipped() {
    let mut mixer = mixer();
    for _ in 0..4 {
        mixer.add_sample(&Sample::from_samples(vec![1.0; 100]), 1.0, pan(-1.0), false);
    }
    let out = block(&mut mixer);
    assert!(out.iter().all(|&s| s.abs() <= 2.0));
    assert!(out[0] > 1.0);
}

#[test]
fn test_synth_and_samples_share_the_stereo_block() {
    let mut mixer = mixer();
    let synth = mixer.synth_mut(Voice::Lead);
    synth
        .configure(SynthConfig {
            volume: 0.5,
            ..flat_square()
        })
        .unwrap();
    synth.play(10.0).unwrap();
    mixer.add_sample(&Sample::from_samples(vec![0.25; 1000]), 1.0, pan(-1.0), false);

    block(&mut mixer);
    let out = block(&mut mixer);
    for frame in out.chunks_exact(2) {
        // Left carries synth + sample, right the synth alone
        assert!((frame[0] - 0.75).abs() < 1e-6);
        assert!((frame[1] - 0.5).abs() < 1e-6);
    }
}

#[test]
fn test_master_volume_scales_synth() {
    let mut mixer = mixer();
    let synth = mixer.synth_mut(Voice::Bass);
    synth
        .configure(SynthConfig {
            volume: 0.5,
            ..flat_square()
        })
        .unwrap();
    synth.play(10.0).unwrap();

    block(&mut mixer);
    mixer.set_master_volume(0.5, 0.0);
    let out = block(&mut mixer);
    assert!(out.iter().all(|&s| (s - 0.25).abs() < 1e-6));
}

#[test]
fn test_crackle_toggles_at_runtime() {
    let mut mixer = mixer();
    assert!(!mixer.crackle().is_enabled());
    mixer.synth_mut(Voice::Kick).configure(flat_square()).unwrap();
    mixer.synth_mut(Voice::Kick).play(10.0).unwrap();
    block(&mut mixer);
    assert!(block(&mut mixer).iter().all(|&s| s == 1.0));

    mixer.set_crackle_enabled(true);
    assert!(mixer.crackle().is_enabled());
    let out = block(&mut mixer);
    // Interior samples dip inside the episode, edges stay unfiltered
    assert!(out.iter().any(|&s| s < 1.0));
    assert!(out.iter().all(|&s| s <= 1.0 && s >= 0.8 - 1e-6));

    mixer.set_crackle_enabled(false);
    assert!(block(&mut mixer).iter().all(|&s| s == 1.0));
}
