//! Synth-path normalization and 5-tap box filter

use super::crackle::Crackle;

/// Filter taps
const TAPS: usize = 5;

/// Divide `mix` by the number of active voices and low-pass it into `out`.
///
/// Interior samples are the mean of a centered 5-sample window, scaled by the
/// crackle gain. The first 2 and last 3 samples pass through unfiltered.
/// Both slices must be the same length and at least 5 samples long.
pub(crate) fn smooth(mix: &[f32], active: usize, out: &mut [f32], crackle: &mut Crackle) {
    debug_assert_eq!(mix.len(), out.len());
    debug_assert!(mix.len() >= TAPS);

    let n = mix.len();
    let count = active as f32;

    for i in [0, 1, n - 3, n - 2, n - 1] {
        out[i] = mix[i] / count;
    }

    let mut running: f32 = mix[..TAPS].iter().map(|&s| s / count).sum();
    for s in 2..n - 3 {
        out[s] = crackle.next_gain() * running / TAPS as f32;
        running = running - mix[s - 2] / count + mix[s + 3] / count;
    }
}
