//! Error types for MPU9250 operations.
//!
//! Both the blocking and the async driver report failures through [`Error`],
//! generic over the error type of the underlying I2C bus. Bus failures are
//! never retried by the driver: the caller decides whether to try again.

use core::fmt::{Debug, Display, Formatter};
use embedded_hal::i2c::ErrorKind;

use crate::packet::DecodeError;

/// Error during initialization of sensor. Wraps [`Error`] and hands the bus back.
pub struct InitError<I, E> {
    pub i2c: I,
    pub error: Error<E>,
}

impl<I, E> Debug for InitError<I, E>
where
    E: Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        Debug::fmt(&self.error, f)
    }
}

/// Error for sensor operations.
#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Error<E> {
    /// The operation did not complete within its timeout
    Timeout,
    /// The device did not acknowledge its address or a data byte
    NoAcknowledge(E),
    /// Any other bus failure reported by the I2C driver
    Bus(E),
    /// The device answered with an impossible byte count
    MalformedResponse { expected: usize, actual: usize },
    /// The firmware image does not fit into DMP memory
    FirmwareTooLarge { size: usize, capacity: usize },
    /// DMP memory read back differently from what was written
    VerifyMismatch { bank: u8, address: u8 },
    /// A DMP configuration script record is truncated or unknown
    MalformedScript { offset: usize },
    /// A frame drained from the FIFO could not be decoded
    Decode(DecodeError),
}

impl<E> Error<E>
where
    E: embedded_hal::i2c::Error,
{
    /// Classify a failure reported by the I2C driver.
    pub(crate) fn bus(error: E) -> Self {
        match error.kind() {
            ErrorKind::NoAcknowledge(_) => Self::NoAcknowledge(error),
            _ => Self::Bus(error),
        }
    }
}

impl<E> From<DecodeError> for Error<E> {
    fn from(error: DecodeError) -> Self {
        Self::Decode(error)
    }
}

impl<E> Display for Error<E>
where
    E: Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Timeout => f.write_str("bus operation timed out"),
            Self::NoAcknowledge(e) => write!(f, "device did not acknowledge: {:?}", e),
            Self::Bus(e) => write!(f, "bus error: {:?}", e),
            Self::MalformedResponse { expected, actual } => {
                write!(f, "malformed response: expected {} bytes, got {}", expected, actual)
            }
            Self::FirmwareTooLarge { size, capacity } => {
                write!(f, "firmware of {} bytes exceeds {} bytes of DMP memory", size, capacity)
            }
            Self::VerifyMismatch { bank, address } => {
                write!(f, "DMP memory verify failed at bank {} address {:#04x}", bank, address)
            }
            Self::MalformedScript { offset } => {
                write!(f, "malformed DMP configuration record at offset {}", offset)
            }
            Self::Decode(e) => write!(f, "{}", e),
        }
    }
}
