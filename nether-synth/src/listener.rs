//! Stereo listening frame for 3D samples

use glam::Vec3;

use crate::ramp::Ramp;

/// Position and right-ear direction of the listener.
///
/// `right` is always unit length: it is normalized on every set and stepped
/// along a great circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Listener {
    pub(crate) position: Ramp<Vec3>,
    pub(crate) right: Ramp<Vec3>,
}

impl Default for Listener {
    fn default() -> Self {
        Self {
            position: Ramp::new(Vec3::ZERO),
            right: Ramp::new(Vec3::X),
        }
    }
}

impl Listener {
    /// Current listener position
    pub fn position(&self) -> Vec3 {
        self.position.value()
    }

    /// Current (unit) right direction
    pub fn right(&self) -> Vec3 {
        self.right.value()
    }

    /// Ramp position and right direction over `ramp` seconds.
    ///
    /// A zero `right` vector falls back to +X.
    pub fn set_position_and_right(&mut self, position: Vec3, right: Vec3, ramp: f32) {
        self.position.set(position, ramp);
        let right = right.try_normalize().unwrap_or(Vec3::X);
        self.right.set(right, ramp);
    }

    pub(crate) fn step(&mut self, dt: f32) {
        self.position.step(dt);
        self.right.step_direction(dt);
    }
}
