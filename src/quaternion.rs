//! Orientation Quaternion
//!
//! The DMP reports orientation as four signed 32-bit fixed-point values in
//! Q30 format (1.0 = 2^30). The top 16 bits of each value form the same
//! number in Q14 (1.0 = 2^14), which is what the 16-bit accessors return.

use crate::packet::DecodeError;

/// Scale of the 32-bit DMP quaternion components (2^30).
pub const Q30: f32 = 1_073_741_824.0;

/// Scale of the 16-bit DMP quaternion components (2^14).
pub const Q14: f32 = 16_384.0;

/// Quaternions whose norm is below this value are rejected as degenerate
/// instead of being normalized.
pub const QUATERNION_EPSILON: f32 = 1.0e-6;

/// Orientation as a rotation quaternion `w + xi + yj + zk`.
///
/// Quaternions decoded from a DMP frame are always normalized.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Default for Quaternion {
    /// The identity rotation.
    fn default() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }
}

impl Quaternion {
    pub const fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    /// Builds a normalized quaternion from raw Q30 components `[w, x, y, z]`.
    pub fn from_q30(raw: [i32; 4]) -> Result<Self, DecodeError> {
        Self::new(
            raw[0] as f32 / Q30,
            raw[1] as f32 / Q30,
            raw[2] as f32 / Q30,
            raw[3] as f32 / Q30,
        )
        .normalize()
    }

    /// Calculates the magnitude (length) of the quaternion.
    ///
    /// For a pure rotation quaternion the magnitude is 1.
    pub fn magnitude(&self) -> f32 {
        libm::sqrt((self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z) as f64)
            as f32
    }

    /// Scales the quaternion to magnitude 1.
    ///
    /// Fails with [`DecodeError::Degenerate`] when the magnitude is below
    /// [`QUATERNION_EPSILON`], where the direction is meaningless.
    pub fn normalize(&self) -> Result<Self, DecodeError> {
        let m = self.magnitude();
        if m.is_nan() || m < QUATERNION_EPSILON {
            return Err(DecodeError::Degenerate);
        }
        Ok(Self {
            w: self.w / m,
            x: self.x / m,
            y: self.y / m,
            z: self.z / m,
        })
    }

    pub fn conjugate(&self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Hamilton product `self * other`.
    pub fn product(&self, other: &Self) -> Self {
        Self {
            w: self.w * other.w - self.x * other.x - self.y * other.y - self.z * other.z,
            x: self.w * other.x + self.x * other.w + self.y * other.z - self.z * other.y,
            y: self.w * other.y - self.x * other.z + self.y * other.w + self.z * other.x,
            z: self.w * other.z + self.x * other.y - self.y * other.x + self.z * other.w,
        }
    }

    /// Rotates the vector `[x, y, z]` by this quaternion (`q * v * q̄`).
    pub fn rotate(&self, v: [f32; 3]) -> [f32; 3] {
        let p = Self::new(0.0, v[0], v[1], v[2]);
        let r = self.product(&p).product(&self.conjugate());
        [r.x, r.y, r.z]
    }
}
