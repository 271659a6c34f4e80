//! Smoothly ramped control parameters
//!
//! Every continuously varying control value (volume, pan, position, listener
//! orientation) is a [`Ramp`]. The control thread sets a new target with a
//! transition time; the mixer advances all ramps once per block.

use glam::Vec3;

/// Values a [`Ramp`] can linearly interpolate between
pub trait Interpolate: Copy {
    /// Move `fraction` (0..=1) of the way from `from` toward `to`
    fn interpolate(from: Self, to: Self, fraction: f32) -> Self;
}

impl Interpolate for f32 {
    #[inline]
    fn interpolate(from: Self, to: Self, fraction: f32) -> Self {
        from + fraction * (to - from)
    }
}

impl Interpolate for Vec3 {
    #[inline]
    fn interpolate(from: Self, to: Self, fraction: f32) -> Self {
        from.lerp(to, fraction)
    }
}

/// A value with a target and remaining transition time (seconds).
///
/// Invariant: `remaining >= 0`, and `value == target` whenever `remaining == 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ramp<T> {
    value: T,
    target: T,
    remaining: f32,
}

impl<T: Interpolate> Ramp<T> {
    /// Create a settled ramp at `value`
    pub fn new(value: T) -> Self {
        Self {
            value,
            target: value,
            remaining: 0.0,
        }
    }

    /// Current value
    #[inline]
    pub fn value(&self) -> T {
        self.value
    }

    /// Value being ramped toward
    #[inline]
    pub fn target(&self) -> T {
        self.target
    }

    /// Remaining transition time in seconds
    #[inline]
    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// True once the value has reached its target
    pub fn is_settled(&self) -> bool {
        self.remaining == 0.0
    }

    /// Ramp toward `target` over `duration` seconds.
    ///
    /// A non-positive (or NaN) duration jumps straight to the target.
    pub fn set(&mut self, target: T, duration: f32) {
        self.target = target;
        if duration > 0.0 {
            self.remaining = duration;
        } else {
            self.value = target;
            self.remaining = 0.0;
        }
    }

    /// Keep the current target but never take longer than `duration` to reach it
    pub fn shorten(&mut self, duration: f32) {
        let duration = if duration > 0.0 { duration } else { 0.0 };
        if duration < self.remaining {
            self.remaining = duration;
        }
        if self.remaining == 0.0 {
            self.value = self.target;
        }
    }

    /// Advance by `dt` seconds of elapsed playback, interpolating linearly
    pub fn step(&mut self, dt: f32) {
        if self.remaining <= dt {
            self.value = self.target;
            self.remaining = 0.0;
        } else {
            self.value = T::interpolate(self.value, self.target, dt / self.remaining);
            self.remaining -= dt;
        }
    }
}

impl<T: Interpolate + Default> Default for Ramp<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl Ramp<Vec3> {
    /// Advance a unit-direction ramp by `dt`, rotating along the shorter
    /// great-circle arc so the value stays unit length.
    pub fn step_direction(&mut self, dt: f32) {
        if self.remaining <= dt {
            self.value = self.target;
            self.remaining = 0.0;
            return;
        }

        let target = self.target;

        // Normal of the plane containing value and target
        let mut normal = self.value.cross(target);
        if normal.length_squared() < 1e-12 {
            // Parallel or opposite: any axis perpendicular to target will do
            let abs = target.abs();
            normal = if abs.x <= abs.y && abs.x <= abs.z {
                Vec3::X
            } else if abs.y <= abs.z {
                Vec3::Y
            } else {
                Vec3::Z
            };
            normal -= target * target.dot(normal);
        }
        let normal = normal.normalize();

        // Perpendicular to target within that plane, on the value's side
        let perp = target.cross(normal);

        let angle = self.value.dot(target).clamp(-1.0, 1.0).acos();
        let angle = angle * (self.remaining - dt) / self.remaining;

        self.value = target * angle.cos() + perp * angle.sin();
        self.remaining -= dt;
    }
}
