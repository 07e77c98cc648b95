//! Euler Angles
//!
//! ZYX angles computed from the quaternion alone, without going through
//! the gravity vector. See [`YawPitchRoll`](crate::yaw_pitch_roll::YawPitchRoll)
//! for the gravity-based variant.

use crate::quaternion::Quaternion;

/// Orientation represented as Euler angles in radians.
///
/// Near ±90° of pitch the yaw and roll axes line up (gimbal lock) and the
/// angles lose precision. They never become NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Euler {
    /// ψ, about Z
    pub psi: f32,
    /// θ, about Y, within ±π/2
    pub theta: f32,
    /// φ, about X
    pub phi: f32,
}

impl From<&Quaternion> for Euler {
    /// - ψ = atan2(2(qx*qy - qw*qz), 2(qw² + qx²) - 1)
    /// - θ = -asin(2(qx*qz + qw*qy))
    /// - φ = atan2(2(qy*qz - qw*qx), 2(qw² + qz²) - 1)
    fn from(q: &Quaternion) -> Self {
        // rounding can push the sine slightly past ±1
        let sin_theta = (2.0 * q.x * q.z + 2.0 * q.w * q.y).clamp(-1.0, 1.0);
        Self {
            psi: libm::atan2(
                (2.0 * q.x * q.y - 2.0 * q.w * q.z) as f64,
                (2.0 * q.w * q.w + 2.0 * q.x * q.x - 1.0) as f64,
            ) as f32,
            theta: -libm::asin(sin_theta as f64) as f32,
            phi: libm::atan2(
                (2.0 * q.y * q.z - 2.0 * q.w * q.x) as f64,
                (2.0 * q.w * q.w + 2.0 * q.z * q.z - 1.0) as f64,
            ) as f32,
        }
    }
}

impl From<Quaternion> for Euler {
    fn from(q: Quaternion) -> Self {
        Self::from(&q)
    }
}
