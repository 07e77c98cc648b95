//! Gravity Vector
//!
//! Direction of gravity in the sensor frame, derived from the DMP
//! quaternion. Pitch and roll are read off it, and subtracting it from the
//! accelerometer leaves the linear acceleration.

use crate::quaternion::Quaternion;

/// Unit vector pointing along gravity, `(0, 0, 1)` when the sensor lies flat.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Gravity {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Gravity {
    pub fn magnitude(&self) -> f32 {
        libm::sqrt((self.x * self.x + self.y * self.y + self.z * self.z) as f64) as f32
    }
}

impl From<&Quaternion> for Gravity {
    /// Rotates the unit vector [0, 0, 1] into the sensor frame:
    /// - x = 2(qx*qz - qw*qy)
    /// - y = 2(qw*qx + qy*qz)
    /// - z = qw² - qx² - qy² + qz²
    fn from(q: &Quaternion) -> Self {
        Self {
            x: 2.0 * (q.x * q.z - q.w * q.y),
            y: 2.0 * (q.w * q.x + q.y * q.z),
            z: q.w * q.w - q.x * q.x - q.y * q.y + q.z * q.z,
        }
    }
}

impl From<Quaternion> for Gravity {
    fn from(q: Quaternion) -> Self {
        Self::from(&q)
    }
}
