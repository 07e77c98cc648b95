//! I2C Address
//!
//! The MPU9250 answers on one of two 7-bit addresses, picked by the AD0 pin:
//! - 0x68 with AD0 tied to GND (default)
//! - 0x69 with AD0 tied to VCC

/// A 7-bit MPU9250 I2C address.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Address(pub u8);

impl Address {
    /// AD0 low.
    pub const AD0_LOW: Self = Self(0x68);
    /// AD0 high.
    pub const AD0_HIGH: Self = Self(0x69);
}

impl Default for Address {
    fn default() -> Self {
        Self::AD0_LOW
    }
}

impl From<Address> for u8 {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

impl From<u8> for Address {
    fn from(addr: u8) -> Self {
        Self(addr)
    }
}
