//! Clock Source Selection (`CLKSEL`)

/// Available clock sources for the MPU9250.
///
/// The internal oscillator drifts with temperature; the gyroscope-locked PLL
/// settings are what the DMP is meant to run on.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClockSource {
    /// Internal 20 MHz oscillator
    #[default]
    Internal = 0,
    /// PLL locked to the X gyroscope, falling back to the oscillator
    Xgyro = 1,
    Ygyro = 2,
    Zgyro = 3,
    /// Stops the clock and keeps the timing generator in reset
    Stop = 7,
}
