//! Magnetometer Data
//!
//! The MPU9250's magnetometer measures the direction of the magnetic field
//! along three axes. The DMP copies the readings into its frames as
//! big-endian 16-bit values.

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mag {
    pub(crate) x: i16,
    pub(crate) y: i16,
    pub(crate) z: i16,
}

impl Mag {
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }

    /// Converts the 6 magnetometer bytes of a DMP frame.
    pub const fn from_bytes(data: [u8; 6]) -> Self {
        Self {
            x: i16::from_be_bytes([data[0], data[1]]),
            y: i16::from_be_bytes([data[2], data[3]]),
            z: i16::from_be_bytes([data[4], data[5]]),
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
