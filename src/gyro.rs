/// Raw gyro readings vector.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Gyro {
    pub(crate) x: i16,
    pub(crate) y: i16,
    pub(crate) z: i16,
}

impl Gyro {
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }

    /// Reads three big-endian registers (`GYRO_XOUT_H` onwards).
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

    /// Converts to degrees per second at the given measuring range.
    pub fn in_dps(&self, range: GyroFullScale) -> GyroF32 {
        GyroF32 {
            x: range.to_dps(self.x),
            y: range.to_dps(self.y),
            z: range.to_dps(self.z),
        }
    }
}

/// Gyroscope measuring range (`GYRO_FS_SEL`).
///
/// The DMP expects ±2000 °/s once it is running.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GyroFullScale {
    #[default]
    Deg250 = 0,
    Deg500 = 1,
    Deg1000 = 2,
    Deg2000 = 3,
}

impl GyroFullScale {
    /// Sensitivity in LSB per °/s.
    pub const fn sensitivity(self) -> f32 {
        match self {
            Self::Deg250 => 131.0,
            Self::Deg500 => 65.5,
            Self::Deg1000 => 32.8,
            Self::Deg2000 => 16.4,
        }
    }

    pub fn to_dps(self, raw: i16) -> f32 {
        raw as f32 / self.sensitivity()
    }
}

/// Angular rate in °/s.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GyroF32 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}
