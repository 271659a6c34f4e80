//! Stereo panning laws for sample playback
//!
//! Both laws are equal-power: for a given direction `left² + right² == 1`,
//! so a source sweeping across the stereo field keeps constant loudness
//! instead of dipping in the middle like a linear crossfade.

use std::f32::consts::{FRAC_PI_2, SQRT_2};

use glam::Vec3;

/// Map a pan amount in -1 (hard left) ..= 1 (hard right) to equal-power gains
#[inline]
fn equal_power(amount: f32) -> (f32, f32) {
    let angle = FRAC_PI_2 * (0.5 * (amount + 1.0));
    (angle.cos(), angle.sin())
}

/// Equal-power 2D panning.
///
/// `pan` is clamped to -1.0 ..= 1.0 before use.
///
/// Returns `(left, right)` gains.
#[inline]
pub fn compute_pan_weights(pan: f32) -> (f32, f32) {
    equal_power(pan.clamp(-1.0, 1.0))
}

/// 3D panning relative to a listener.
///
/// Direction is projected onto the listener's right vector and fed through
/// the same equal-power law as 2D panning. Distance attenuation is linear,
/// `1 / (1 + distance / half_volume_radius)`, giving half volume at
/// `half_volume_radius`. Deliberately linear rather than inverse-square.
///
/// A source exactly at the listener gets `left = right = √2`.
///
/// Returns `(left, right)` gains.
pub fn compute_pan_from_listener_and_position(
    listener_position: Vec3,
    listener_right: Vec3,
    source_position: Vec3,
    half_volume_radius: f32,
) -> (f32, f32) {
    let to = source_position - listener_position;
    let distance = to.length();
    if distance == 0.0 {
        return (SQRT_2, SQRT_2);
    }

    // -1 (fully left) to 1 (fully right)
    let amount = (listener_right.dot(to) / distance).clamp(-1.0, 1.0);
    let (left, right) = equal_power(amount);

    let attenuation = 1.0 / (1.0 + distance / half_volume_radius);
    (left * attenuation, right * attenuation)
}
