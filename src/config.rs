//! Digital Low-Pass Filter Configuration
//!
//! The digital low-pass filter (DLPF) trades noise against latency. It also
//! sets the internal sample rate: with the filter enabled (settings 1 to 6)
//! the gyroscope is sampled at 1 kHz, which the sample rate divider then
//! divides down. The DMP image expects [`DigitalLowPassFilter::Filter1`].

/// `DLPF_CFG` settings, named by their position. The bandwidths are those of
/// the accelerometer path.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DigitalLowPassFilter {
    /// 256 Hz, 8 kHz gyro sampling
    #[default]
    Filter0 = 0,
    /// 188 Hz
    Filter1 = 1,
    /// 98 Hz
    Filter2 = 2,
    /// 42 Hz
    Filter3 = 3,
    /// 20 Hz
    Filter4 = 4,
    /// 10 Hz
    Filter5 = 5,
    /// 5 Hz
    Filter6 = 6,
}

impl DigitalLowPassFilter {
    /// Nominal bandwidth in Hz.
    pub const fn bandwidth_hz(self) -> u16 {
        match self {
            Self::Filter0 => 256,
            Self::Filter1 => 188,
            Self::Filter2 => 98,
            Self::Filter3 => 42,
            Self::Filter4 => 20,
            Self::Filter5 => 10,
            Self::Filter6 => 5,
        }
    }
}
