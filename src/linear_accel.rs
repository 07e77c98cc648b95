//! Linear Acceleration
//!
//! The accelerometer measures gravity plus the acceleration caused by motion.
//! Subtracting the gravity vector, scaled to the accelerometer's raw range,
//! leaves the motion part. The result is noisy, so it can be smoothed with
//! [`LinearAccelFilter`], a single-pole exponential filter.

use crate::{accel::Accel, gravity::Gravity, quaternion::Quaternion};

/// Largest accepted filter coefficient. At 1.0 the output would never change.
pub const MAX_FILTER_COEFFICIENT: f32 = 0.999;

/// Acceleration with gravity removed, in raw accelerometer units.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinearAccel {
    pub(crate) x: i16,
    pub(crate) y: i16,
    pub(crate) z: i16,
}

/// Float to i16, rounding to nearest and saturating at the type bounds.
fn saturate(value: f32) -> i16 {
    libm::roundf(value) as i16
}

impl LinearAccel {
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }

    /// Removes gravity from a raw reading: per axis `raw - g * one_g`.
    ///
    /// `one_g` is the raw value of 1 g at the configured range, see
    /// [`AccelFullScale::one_g`](crate::accel::AccelFullScale::one_g).
    pub fn from_accel(raw: &Accel, gravity: &Gravity, one_g: i32) -> Self {
        let one_g = one_g as f32;
        Self {
            x: saturate(raw.x as f32 - gravity.x * one_g),
            y: saturate(raw.y as f32 - gravity.y * one_g),
            z: saturate(raw.z as f32 - gravity.z * one_g),
        }
    }

    /// Rotates the vector from the sensor frame into the world frame.
    pub fn in_world(&self, q: &Quaternion) -> Self {
        let [x, y, z] = q.rotate([self.x as f32, self.y as f32, self.z as f32]);
        Self {
            x: saturate(x),
            y: saturate(y),
            z: saturate(z),
        }
    }

    pub const fn x(&self) -> i16 {
        self.x
    }

    pub const fn y(&self) -> i16 {
        self.y
    }

    pub const fn z(&self) -> i16 {
        self.z
    }
}

/// Exponential smoothing of successive linear acceleration values.
///
/// `output = coefficient * previous_output + (1 - coefficient) * input`.
/// A coefficient of 0 passes values through unchanged. The first value
/// after creation or [`reset`](Self::reset) is passed through as well.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LinearAccelFilter {
    coefficient: f32,
    previous: Option<[f32; 3]>,
}

impl Default for LinearAccelFilter {
    fn default() -> Self {
        Self::DISABLED
    }
}

impl LinearAccelFilter {
    pub const DISABLED: Self = Self {
        coefficient: 0.0,
        previous: None,
    };

    pub fn new(coefficient: f32) -> Self {
        let mut filter = Self::DISABLED;
        filter.set_coefficient(coefficient);
        filter
    }

    pub fn coefficient(&self) -> f32 {
        self.coefficient
    }

    /// Sets the coefficient, clamped to `0.0..=MAX_FILTER_COEFFICIENT`
    /// (NaN counts as 0). Returns the value applied.
    pub fn set_coefficient(&mut self, coefficient: f32) -> f32 {
        self.coefficient = if coefficient.is_nan() {
            0.0
        } else {
            coefficient.clamp(0.0, MAX_FILTER_COEFFICIENT)
        };
        self.coefficient
    }

    pub fn apply(&mut self, input: LinearAccel) -> LinearAccel {
        let current = [input.x as f32, input.y as f32, input.z as f32];
        let filtered = match self.previous {
            Some(previous) if self.coefficient > 0.0 => {
                let a = self.coefficient;
                [
                    a * previous[0] + (1.0 - a) * current[0],
                    a * previous[1] + (1.0 - a) * current[1],
                    a * previous[2] + (1.0 - a) * current[2],
                ]
            }
            _ => current,
        };
        self.previous = Some(filtered);
        LinearAccel {
            x: saturate(filtered[0]),
            y: saturate(filtered[1]),
            z: saturate(filtered[2]),
        }
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}
