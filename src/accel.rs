/// Raw acceleration readings vector.
///
/// Produced by the accelerometer registers and by DMP frames, where the
/// DMP passes the raw sensor value through in the high half of a 32-bit word.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Accel {
    pub(crate) x: i16,
    pub(crate) y: i16,
    pub(crate) z: i16,
}

impl Accel {
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }

    /// Reads three big-endian registers (`ACCEL_XOUT_H` onwards).
    pub const fn from_bytes(data: [u8; 6]) -> Self {
        Self::new(
            i16::from_be_bytes([data[0], data[1]]),
            i16::from_be_bytes([data[2], data[3]]),
            i16::from_be_bytes([data[4], data[5]]),
        )
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

    /// Converts to g at the given measuring range.
    pub fn in_g(&self, range: AccelFullScale) -> AccelF32 {
        AccelF32 {
            x: range.to_g(self.x),
            y: range.to_g(self.y),
            z: range.to_g(self.z),
        }
    }
}

/// Accelerometer measuring range (`ACCEL_FS_SEL`).
///
/// The DMP image runs the accelerometer at ±2 g.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AccelFullScale {
    #[default]
    G2 = 0,
    G4 = 1,
    G8 = 2,
    G16 = 3,
}

impl AccelFullScale {
    /// The raw reading corresponding to 1 g.
    pub const fn one_g(self) -> i32 {
        16384 >> self as u8
    }

    pub fn to_g(self, raw: i16) -> f32 {
        raw as f32 / self.one_g() as f32
    }
}

/// Acceleration in g.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccelF32 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}
