//! Yaw, Pitch and Roll
//!
//! Yaw comes from the quaternion, pitch and roll from the gravity vector
//! derived from it. All three go through `atan2`, so every orientation
//! yields finite angles.

use crate::gravity::Gravity;
use crate::quaternion::Quaternion;

/// Orientation as three angles in radians.
///
/// Yaw loses precision as the sensor approaches pitch ±90°.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct YawPitchRoll {
    /// Heading about Z, in (-π, π]
    pub yaw: f32,
    /// Tilt about Y, in [-π/2, π/2]
    pub pitch: f32,
    /// Tilt about X, in (-π, π]
    pub roll: f32,
}

impl YawPitchRoll {
    /// Computes the angles from a quaternion and the gravity vector derived from it.
    ///
    /// - Yaw: ψ = atan2(2(qx*qy - qw*qz), 2(qw² + qx²) - 1)
    /// - Pitch: θ = atan2(gx, sqrt(gy² + gz²))
    /// - Roll: φ = atan2(gy, gz)
    pub fn new(q: &Quaternion, gravity: &Gravity) -> Self {
        let yaw = libm::atan2(
            (2.0 * q.x * q.y - 2.0 * q.w * q.z) as f64,
            (2.0 * q.w * q.w + 2.0 * q.x * q.x - 1.0) as f64,
        );
        let pitch = libm::atan2(
            gravity.x as f64,
            libm::sqrt((gravity.y * gravity.y + gravity.z * gravity.z) as f64),
        );
        let roll = libm::atan2(gravity.y as f64, gravity.z as f64);

        Self {
            yaw: yaw as f32,
            pitch: pitch as f32,
            roll: roll as f32,
        }
    }
}

impl From<Quaternion> for YawPitchRoll {
    fn from(q: Quaternion) -> Self {
        Self::new(&q, &Gravity::from(&q))
    }
}
