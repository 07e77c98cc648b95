//! FIFO Configuration

/// Capacity of the FIFO in bytes.
pub const FIFO_SIZE: usize = 512;

/// Which sensor registers are copied into the FIFO (`FIFO_EN`).
///
/// With the DMP running leave all of these disabled: the DMP writes its own
/// frames into the FIFO.
///
/// Fields:
/// - `temp`: temperature
/// - `xg`, `yg`, `zg`: individual gyroscope axes
/// - `accel`: accelerometer (all axes)
/// - `slv0`, `slv1`, `slv2`: auxiliary I2C slave data
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fifo {
    pub temp: bool,
    pub xg: bool,
    pub yg: bool,
    pub zg: bool,
    pub accel: bool,
    pub slv2: bool,
    pub slv1: bool,
    pub slv0: bool,
}

impl Fifo {
    pub fn all_disabled() -> Self {
        Self::default()
    }

    /// Bit 7 is `temp`, bit 0 is `slv0`.
    pub(crate) fn from_byte(byte: u8) -> Self {
        let bit = |n: u8| byte & (1 << n) != 0;
        Self {
            temp: bit(7),
            xg: bit(6),
            yg: bit(5),
            zg: bit(4),
            accel: bit(3),
            slv2: bit(2),
            slv1: bit(1),
            slv0: bit(0),
        }
    }

    pub(crate) fn to_byte(self) -> u8 {
        [
            self.slv0, self.slv1, self.slv2, self.accel, self.zg, self.yg, self.xg, self.temp,
        ]
        .iter()
        .enumerate()
        .fold(0, |byte, (n, &enabled)| byte | ((enabled as u8) << n))
    }
}
