//! Bus Timeouts
//!
//! Every bus operation runs under a [`Timeout`]. The driver holds a default
//! (see [`DEFAULT_TIMEOUT`]) which can be replaced. `with_timeout` on either
//! bus overrides it for the operations issued through the returned guard.
//!
//! [`Timeout::Unbounded`] waits for as long as the bus driver takes, and so
//! does a bound of zero (`Millis(0)` or `Micros(0)`). Only use them when the
//! operation is already bounded some other way, e.g. by a watchdog or by a
//! timeout configured in the HAL's I2C peripheral.

/// How long a single bus operation may take.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Timeout {
    /// Give up after this many milliseconds
    Millis(u32),
    /// Give up after this many microseconds
    Micros(u32),
    /// Never give up
    Unbounded,
}

/// One second, matching the read timeout of the reference Arduino I2Cdev library.
pub const DEFAULT_TIMEOUT: Timeout = Timeout::Millis(1000);

impl Default for Timeout {
    fn default() -> Self {
        DEFAULT_TIMEOUT
    }
}

impl Timeout {
    /// The bound in microseconds, `None` when unbounded.
    ///
    /// A zero bound waits indefinitely.
    pub const fn as_micros(self) -> Option<u64> {
        match self {
            Self::Millis(0) | Self::Micros(0) | Self::Unbounded => None,
            Self::Millis(ms) => Some(ms as u64 * 1000),
            Self::Micros(us) => Some(us as u64),
        }
    }

    /// Whether `elapsed_us` has reached the bound.
    pub const fn is_expired(self, elapsed_us: u64) -> bool {
        match self.as_micros() {
            Some(limit) => elapsed_us >= limit,
            None => false,
        }
    }
}

/// Monotonic microsecond clock used by the blocking bus to measure elapsed time.
///
/// Blocking I2C calls cannot be interrupted, so the blocking bus checks the
/// clock between transfers and abandons the rest of the operation once the
/// timeout has been reached. Wrap a free-running hardware timer to implement it.
pub trait Clock {
    /// Current time in microseconds. Only differences between calls are used.
    fn now_us(&mut self) -> u64;
}

/// A clock that never advances.
///
/// With `NoClock` the blocking bus never reports [`Error::Timeout`](crate::error::Error::Timeout)
/// by itself and relies on the HAL to bound each transfer.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoClock;

impl Clock for NoClock {
    fn now_us(&mut self) -> u64 {
        0
    }
}

impl<F> Clock for F
where
    F: FnMut() -> u64,
{
    fn now_us(&mut self) -> u64 {
        self()
    }
}

/// A running deadline for one bus operation.
pub(crate) struct Deadline {
    started: u64,
    timeout: Timeout,
}

impl Deadline {
    pub(crate) fn start(clock: &mut impl Clock, timeout: Timeout) -> Self {
        Self {
            started: clock.now_us(),
            timeout,
        }
    }

    pub(crate) fn expired(&self, clock: &mut impl Clock) -> bool {
        self.timeout
            .is_expired(clock.now_us().saturating_sub(self.started))
    }
}
