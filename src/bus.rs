//! Blocking Register Access
//!
//! [`I2cDev`] turns logical register operations into I2C transfers:
//!
//! - single bits and bit-runs, read out of or merged into a register byte (or word)
//! - single bytes and big-endian words
//! - byte and word sequences, split into transfers of at most
//!   [`I2cDev::transfer_limit`] bytes
//!
//! Each operation runs under a [`Timeout`]. Blocking I2C calls cannot be
//! interrupted, so elapsed time is measured with a [`Clock`] after every
//! transfer and the remaining transfers are abandoned once the timeout has
//! been reached.
//!
//! Bit writes are read-modify-write sequences executed inside a single
//! method call. Because every operation takes `&mut self`, nothing else can
//! touch the device in between; share a device across tasks by wrapping the
//! whole `I2cDev` in a mutex.

use core::ops::{Deref, DerefMut};

use embedded_hal::i2c::I2c;

use crate::{
    address::Address,
    bitfield::{BitField, WordBitField},
    error::Error,
    registers::RegisterField,
    timeout::{Clock, Deadline, NoClock, Timeout, DEFAULT_TIMEOUT},
};

/// Largest number of data bytes moved in one I2C transfer.
///
/// Matches the 32-byte buffer of common MCU I2C drivers.
pub const MAX_TRANSFER: usize = 32;

/// Whether consecutive transfers of a sequence advance the register address.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Addressing {
    /// Register block: the next transfer starts where the previous one ended
    Incrementing,
    /// FIFO or memory window: every transfer addresses the same register
    Fixed,
}

/// Clamp a requested transfer limit to what the bus layer supports.
///
/// Word sequences need room for at least one word per transfer.
pub(crate) const fn clamp_transfer_limit(limit: usize) -> usize {
    if limit < 2 {
        2
    } else if limit > MAX_TRANSFER {
        MAX_TRANSFER
    } else {
        limit
    }
}

/// Blocking register-level access to one device on an I2C bus.
pub struct I2cDev<I, C = NoClock> {
    i2c: I,
    address: u8,
    clock: C,
    timeout: Timeout,
    transfer_limit: usize,
}

impl<I> I2cDev<I, NoClock>
where
    I: I2c,
{
    /// Access the device at `address` without time measurement.
    pub fn new(i2c: I, address: Address) -> Self {
        Self::with_clock(i2c, address, NoClock)
    }
}

impl<I, C> I2cDev<I, C>
where
    I: I2c,
    C: Clock,
{
    /// Access the device at `address`, enforcing timeouts with `clock`.
    pub fn with_clock(i2c: I, address: Address, clock: C) -> Self {
        Self {
            i2c,
            address: address.into(),
            clock,
            timeout: DEFAULT_TIMEOUT,
            transfer_limit: MAX_TRANSFER,
        }
    }

    /// Returns the underlying I2C peripheral, consuming this bus.
    pub fn release(self) -> I {
        self.i2c
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Default timeout applied to every operation.
    pub fn timeout(&self) -> Timeout {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Timeout) {
        self.timeout = timeout;
    }

    /// Run the operations performed through the returned guard under `timeout`.
    ///
    /// The previous default is restored when the guard is dropped:
    ///
    /// ```ignore
    /// let id = bus.with_timeout(Timeout::Millis(5)).read_byte(0x75)?;
    /// ```
    pub fn with_timeout(&mut self, timeout: Timeout) -> TimeoutOverride<'_, I, C> {
        let previous = core::mem::replace(&mut self.timeout, timeout);
        TimeoutOverride { bus: self, previous }
    }

    pub fn transfer_limit(&self) -> usize {
        self.transfer_limit
    }

    /// Set the largest transfer size, clamped to `2..=MAX_TRANSFER`.
    /// Returns the limit actually applied.
    pub fn set_transfer_limit(&mut self, limit: usize) -> usize {
        self.transfer_limit = clamp_transfer_limit(limit);
        self.transfer_limit
    }

    fn check(&mut self, deadline: &Deadline, reg: u8) -> Result<(), Error<I::Error>> {
        if deadline.expired(&mut self.clock) {
            warn!("bus timeout at register {:#x}", reg);
            Err(Error::Timeout)
        } else {
            Ok(())
        }
    }

    fn transfer_read(
        &mut self,
        deadline: &Deadline,
        reg: u8,
        buf: &mut [u8],
    ) -> Result<(), Error<I::Error>> {
        trace!("read {} byte(s) from {:#x}", buf.len(), reg);
        let result = self.i2c.write_read(self.address, &[reg], buf);
        result.map_err(Error::bus)?;
        self.check(deadline, reg)
    }

    fn transfer_write(
        &mut self,
        deadline: &Deadline,
        reg: u8,
        data: &[u8],
    ) -> Result<(), Error<I::Error>> {
        trace!("write {} byte(s) to {:#x}", data.len(), reg);
        let mut frame = [0u8; MAX_TRANSFER + 1];
        frame[0] = reg;
        frame[1..=data.len()].copy_from_slice(data);
        let result = self.i2c.write(self.address, &frame[..=data.len()]);
        result.map_err(Error::bus)?;
        self.check(deadline, reg)
    }

    fn read_sequence(
        &mut self,
        reg: u8,
        buf: &mut [u8],
        addressing: Addressing,
    ) -> Result<(), Error<I::Error>> {
        let deadline = Deadline::start(&mut self.clock, self.timeout);
        let mut register = reg;
        for chunk in buf.chunks_mut(self.transfer_limit) {
            self.transfer_read(&deadline, register, chunk)?;
            if addressing == Addressing::Incrementing {
                register = register.wrapping_add(chunk.len() as u8);
            }
        }
        Ok(())
    }

    fn write_sequence(
        &mut self,
        reg: u8,
        data: &[u8],
        addressing: Addressing,
    ) -> Result<(), Error<I::Error>> {
        let deadline = Deadline::start(&mut self.clock, self.timeout);
        let mut register = reg;
        for chunk in data.chunks(self.transfer_limit) {
            self.transfer_write(&deadline, register, chunk)?;
            if addressing == Addressing::Incrementing {
                register = register.wrapping_add(chunk.len() as u8);
            }
        }
        Ok(())
    }

    /// Read one register.
    pub fn read_byte(&mut self, reg: impl Into<u8>) -> Result<u8, Error<I::Error>> {
        let mut buf = [0; 1];
        self.read_bytes(reg, &mut buf)?;
        Ok(buf[0])
    }

    /// Read a big-endian register pair.
    pub fn read_word(&mut self, reg: impl Into<u8>) -> Result<u16, Error<I::Error>> {
        let mut buf = [0; 2];
        self.read_bytes(reg, &mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    /// Read a block of consecutive registers starting at `reg`.
    pub fn read_bytes(&mut self, reg: impl Into<u8>, buf: &mut [u8]) -> Result<(), Error<I::Error>> {
        self.read_sequence(reg.into(), buf, Addressing::Incrementing)
    }

    /// Read `buf.len()` bytes from a single non-incrementing register
    /// such as the FIFO or the DMP memory window.
    pub fn read_stream(&mut self, reg: impl Into<u8>, buf: &mut [u8]) -> Result<(), Error<I::Error>> {
        self.read_sequence(reg.into(), buf, Addressing::Fixed)
    }

    /// Read consecutive big-endian words starting at `reg`.
    pub fn read_words(&mut self, reg: impl Into<u8>, words: &mut [u16]) -> Result<(), Error<I::Error>> {
        let deadline = Deadline::start(&mut self.clock, self.timeout);
        let mut register = reg.into();
        let mut raw = [0u8; MAX_TRANSFER];
        for chunk in words.chunks_mut(self.transfer_limit / 2) {
            let bytes = &mut raw[..chunk.len() * 2];
            self.transfer_read(&deadline, register, bytes)?;
            for (word, pair) in chunk.iter_mut().zip(bytes.chunks_exact(2)) {
                *word = u16::from_be_bytes([pair[0], pair[1]]);
            }
            register = register.wrapping_add(bytes.len() as u8);
        }
        Ok(())
    }

    /// Read a bit-run, returned right-aligned.
    pub fn read_bits(&mut self, reg: impl Into<u8>, field: BitField) -> Result<u8, Error<I::Error>> {
        Ok(field.extract(self.read_byte(reg)?))
    }

    /// Read a single-bit (or any) field as a flag: `true` when any of its bits is set.
    pub fn read_bit(&mut self, reg: impl Into<u8>, field: BitField) -> Result<bool, Error<I::Error>> {
        Ok(self.read_bits(reg, field)? != 0)
    }

    pub fn read_bits_word(
        &mut self,
        reg: impl Into<u8>,
        field: WordBitField,
    ) -> Result<u16, Error<I::Error>> {
        Ok(field.extract(self.read_word(reg)?))
    }

    pub fn read_bit_word(
        &mut self,
        reg: impl Into<u8>,
        field: WordBitField,
    ) -> Result<bool, Error<I::Error>> {
        Ok(self.read_bits_word(reg, field)? != 0)
    }

    /// Write one register.
    pub fn write_byte(&mut self, reg: impl Into<u8>, value: u8) -> Result<(), Error<I::Error>> {
        self.write_bytes(reg, &[value])
    }

    /// Write a big-endian register pair.
    pub fn write_word(&mut self, reg: impl Into<u8>, value: u16) -> Result<(), Error<I::Error>> {
        self.write_bytes(reg, &value.to_be_bytes())
    }

    /// Write a block of consecutive registers starting at `reg`.
    pub fn write_bytes(&mut self, reg: impl Into<u8>, data: &[u8]) -> Result<(), Error<I::Error>> {
        self.write_sequence(reg.into(), data, Addressing::Incrementing)
    }

    /// Write `data` into a single non-incrementing register.
    pub fn write_stream(&mut self, reg: impl Into<u8>, data: &[u8]) -> Result<(), Error<I::Error>> {
        self.write_sequence(reg.into(), data, Addressing::Fixed)
    }

    /// Write consecutive big-endian words starting at `reg`.
    pub fn write_words(&mut self, reg: impl Into<u8>, words: &[u16]) -> Result<(), Error<I::Error>> {
        let deadline = Deadline::start(&mut self.clock, self.timeout);
        let mut register = reg.into();
        let mut raw = [0u8; MAX_TRANSFER];
        for chunk in words.chunks(self.transfer_limit / 2) {
            for (pair, word) in raw.chunks_exact_mut(2).zip(chunk) {
                pair.copy_from_slice(&word.to_be_bytes());
            }
            let len = chunk.len() * 2;
            self.transfer_write(&deadline, register, &raw[..len])?;
            register = register.wrapping_add(len as u8);
        }
        Ok(())
    }

    /// Read a register, transform it and write it back as one operation.
    pub fn update_byte(
        &mut self,
        reg: impl Into<u8>,
        f: impl FnOnce(u8) -> u8,
    ) -> Result<(), Error<I::Error>> {
        let reg = reg.into();
        let deadline = Deadline::start(&mut self.clock, self.timeout);
        let mut buf = [0; 1];
        self.transfer_read(&deadline, reg, &mut buf)?;
        self.transfer_write(&deadline, reg, &[f(buf[0])])
    }

    /// Word counterpart of [`update_byte`](Self::update_byte).
    pub fn update_word(
        &mut self,
        reg: impl Into<u8>,
        f: impl FnOnce(u16) -> u16,
    ) -> Result<(), Error<I::Error>> {
        let reg = reg.into();
        let deadline = Deadline::start(&mut self.clock, self.timeout);
        let mut buf = [0; 2];
        self.transfer_read(&deadline, reg, &mut buf)?;
        let value = f(u16::from_be_bytes(buf));
        self.transfer_write(&deadline, reg, &value.to_be_bytes())
    }

    /// Replace a bit-run, leaving the other bits of the register untouched.
    /// `value` is truncated to the field width.
    pub fn write_bits(
        &mut self,
        reg: impl Into<u8>,
        field: BitField,
        value: u8,
    ) -> Result<(), Error<I::Error>> {
        self.update_byte(reg, |current| field.insert(current, value))
    }

    /// Set or clear every bit of `field`.
    pub fn write_bit(
        &mut self,
        reg: impl Into<u8>,
        field: BitField,
        enabled: bool,
    ) -> Result<(), Error<I::Error>> {
        self.write_bits(reg, field, if enabled { 0xFF } else { 0 })
    }

    pub fn write_bits_word(
        &mut self,
        reg: impl Into<u8>,
        field: WordBitField,
        value: u16,
    ) -> Result<(), Error<I::Error>> {
        self.update_word(reg, |current| field.insert(current, value))
    }

    pub fn write_bit_word(
        &mut self,
        reg: impl Into<u8>,
        field: WordBitField,
        enabled: bool,
    ) -> Result<(), Error<I::Error>> {
        self.write_bits_word(reg, field, if enabled { 0xFFFF } else { 0 })
    }

    /// Read a named field from the register table.
    pub fn read_field(&mut self, field: RegisterField) -> Result<u8, Error<I::Error>> {
        self.read_bits(field.register, field.bits)
    }

    pub fn read_flag(&mut self, field: RegisterField) -> Result<bool, Error<I::Error>> {
        self.read_bit(field.register, field.bits)
    }

    /// Write a named field from the register table.
    pub fn write_field(&mut self, field: RegisterField, value: u8) -> Result<(), Error<I::Error>> {
        self.write_bits(field.register, field.bits, value)
    }

    pub fn write_flag(&mut self, field: RegisterField, enabled: bool) -> Result<(), Error<I::Error>> {
        self.write_bit(field.register, field.bits, enabled)
    }
}

/// Temporarily replaces the default timeout of an [`I2cDev`].
/// See [`I2cDev::with_timeout`].
pub struct TimeoutOverride<'a, I, C>
where
    I: I2c,
    C: Clock,
{
    bus: &'a mut I2cDev<I, C>,
    previous: Timeout,
}

impl<I, C> Deref for TimeoutOverride<'_, I, C>
where
    I: I2c,
    C: Clock,
{
    type Target = I2cDev<I, C>;

    fn deref(&self) -> &Self::Target {
        self.bus
    }
}

impl<I, C> DerefMut for TimeoutOverride<'_, I, C>
where
    I: I2c,
    C: Clock,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.bus
    }
}

impl<I, C> Drop for TimeoutOverride<'_, I, C>
where
    I: I2c,
    C: Clock,
{
    fn drop(&mut self) {
        self.bus.timeout = self.previous;
    }
}
