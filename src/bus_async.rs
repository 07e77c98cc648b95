//! Async Register Access
//!
//! Same operations as the blocking [`bus`](crate::bus) module, on top of
//! `embedded-hal-async`. Here a timeout really interrupts the bus: every
//! logical operation is raced against the delay provider, and when the delay
//! wins the pending transfer future is dropped and [`Error::Timeout`] is
//! returned. The next operation starts by addressing its register again, so
//! an abandoned transfer leaves nothing behind on the driver's side.

use core::future::Future;
use core::ops::{Deref, DerefMut};

use embassy_futures::select::{select, Either};
use embedded_hal_async::{delay::DelayNs, i2c::I2c};

use crate::{
    address::Address,
    bitfield::{BitField, WordBitField},
    bus::{clamp_transfer_limit, Addressing, MAX_TRANSFER},
    error::Error,
    registers::RegisterField,
    timeout::{Timeout, DEFAULT_TIMEOUT},
};

/// Async register-level access to one device on an I2C bus.
///
/// Owns the delay provider that bounds each operation.
pub struct I2cDev<I, D> {
    i2c: I,
    address: u8,
    delay: D,
    timeout: Timeout,
    transfer_limit: usize,
}

/// Borrowed transfer engine, split off so it can run next to the delay.
struct Link<'a, I> {
    i2c: &'a mut I,
    address: u8,
    limit: usize,
}

impl<I> Link<'_, I>
where
    I: I2c,
{
    async fn read(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), I::Error> {
        trace!("read {} byte(s) from {:#x}", buf.len(), reg);
        self.i2c.write_read(self.address, &[reg], buf).await
    }

    async fn write(&mut self, reg: u8, data: &[u8]) -> Result<(), I::Error> {
        trace!("write {} byte(s) to {:#x}", data.len(), reg);
        let mut frame = [0u8; MAX_TRANSFER + 1];
        frame[0] = reg;
        frame[1..=data.len()].copy_from_slice(data);
        self.i2c.write(self.address, &frame[..=data.len()]).await
    }

    async fn read_sequence(
        &mut self,
        reg: u8,
        buf: &mut [u8],
        addressing: Addressing,
    ) -> Result<(), I::Error> {
        let mut register = reg;
        for chunk in buf.chunks_mut(self.limit) {
            self.read(register, chunk).await?;
            if addressing == Addressing::Incrementing {
                register = register.wrapping_add(chunk.len() as u8);
            }
        }
        Ok(())
    }

    async fn write_sequence(
        &mut self,
        reg: u8,
        data: &[u8],
        addressing: Addressing,
    ) -> Result<(), I::Error> {
        let mut register = reg;
        for chunk in data.chunks(self.limit) {
            self.write(register, chunk).await?;
            if addressing == Addressing::Incrementing {
                register = register.wrapping_add(chunk.len() as u8);
            }
        }
        Ok(())
    }

    async fn read_words(&mut self, reg: u8, words: &mut [u16]) -> Result<(), I::Error> {
        let mut register = reg;
        let mut raw = [0u8; MAX_TRANSFER];
        for chunk in words.chunks_mut(self.limit / 2) {
            let bytes = &mut raw[..chunk.len() * 2];
            self.read(register, bytes).await?;
            for (word, pair) in chunk.iter_mut().zip(bytes.chunks_exact(2)) {
                *word = u16::from_be_bytes([pair[0], pair[1]]);
            }
            register = register.wrapping_add(bytes.len() as u8);
        }
        Ok(())
    }

    async fn write_words(&mut self, reg: u8, words: &[u16]) -> Result<(), I::Error> {
        let mut register = reg;
        let mut raw = [0u8; MAX_TRANSFER];
        for chunk in words.chunks(self.limit / 2) {
            for (pair, word) in raw.chunks_exact_mut(2).zip(chunk) {
                pair.copy_from_slice(&word.to_be_bytes());
            }
            let len = chunk.len() * 2;
            self.write(register, &raw[..len]).await?;
            register = register.wrapping_add(len as u8);
        }
        Ok(())
    }
}

/// Sleep for `us` microseconds, in steps `DelayNs::delay_us` can express.
async fn sleep_us<D: DelayNs>(delay: &mut D, mut us: u64) {
    while us > 0 {
        let step = us.min(u32::MAX as u64) as u32;
        delay.delay_us(step).await;
        us -= step as u64;
    }
}

/// Run `op` to completion unless `timeout` elapses first.
async fn guarded<D, T, E>(
    delay: &mut D,
    timeout: Timeout,
    op: impl Future<Output = Result<T, E>>,
) -> Result<T, Error<E>>
where
    D: DelayNs,
    E: embedded_hal_async::i2c::Error,
{
    let Some(limit) = timeout.as_micros() else {
        return op.await.map_err(Error::bus);
    };
    match select(op, sleep_us(delay, limit)).await {
        Either::First(result) => result.map_err(Error::bus),
        Either::Second(()) => {
            warn!("bus operation abandoned after {} us", limit);
            Err(Error::Timeout)
        }
    }
}

impl<I, D> I2cDev<I, D>
where
    I: I2c,
    D: DelayNs,
{
    /// Access the device at `address`, bounding operations with `delay`.
    pub fn new(i2c: I, address: Address, delay: D) -> Self {
        Self {
            i2c,
            address: address.into(),
            delay,
            timeout: DEFAULT_TIMEOUT,
            transfer_limit: MAX_TRANSFER,
        }
    }

    /// Returns the I2C peripheral and the delay provider, consuming this bus.
    pub fn release(self) -> (I, D) {
        (self.i2c, self.delay)
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// The delay provider, for waits that are not bus operations.
    pub fn delay(&mut self) -> &mut D {
        &mut self.delay
    }

    pub fn timeout(&self) -> Timeout {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Timeout) {
        self.timeout = timeout;
    }

    /// Run the operations performed through the returned guard under `timeout`,
    /// restoring the previous default when the guard is dropped.
    pub fn with_timeout(&mut self, timeout: Timeout) -> TimeoutOverride<'_, I, D> {
        let previous = core::mem::replace(&mut self.timeout, timeout);
        TimeoutOverride { bus: self, previous }
    }

    pub fn transfer_limit(&self) -> usize {
        self.transfer_limit
    }

    /// Set the largest transfer size, clamped to `2..=MAX_TRANSFER`.
    pub fn set_transfer_limit(&mut self, limit: usize) -> usize {
        self.transfer_limit = clamp_transfer_limit(limit);
        self.transfer_limit
    }

    fn split(&mut self) -> (Link<'_, I>, &mut D, Timeout) {
        (
            Link {
                i2c: &mut self.i2c,
                address: self.address,
                limit: self.transfer_limit,
            },
            &mut self.delay,
            self.timeout,
        )
    }

    pub async fn read_byte(&mut self, reg: impl Into<u8>) -> Result<u8, Error<I::Error>> {
        let mut buf = [0; 1];
        self.read_bytes(reg, &mut buf).await?;
        Ok(buf[0])
    }

    pub async fn read_word(&mut self, reg: impl Into<u8>) -> Result<u16, Error<I::Error>> {
        let mut buf = [0; 2];
        self.read_bytes(reg, &mut buf).await?;
        Ok(u16::from_be_bytes(buf))
    }

    /// Read a block of consecutive registers starting at `reg`.
    pub async fn read_bytes(
        &mut self,
        reg: impl Into<u8>,
        buf: &mut [u8],
    ) -> Result<(), Error<I::Error>> {
        let reg = reg.into();
        let (mut link, delay, timeout) = self.split();
        guarded(delay, timeout, async move {
            link.read_sequence(reg, buf, Addressing::Incrementing).await
        })
        .await
    }

    /// Read from a single non-incrementing register such as the FIFO.
    pub async fn read_stream(
        &mut self,
        reg: impl Into<u8>,
        buf: &mut [u8],
    ) -> Result<(), Error<I::Error>> {
        let reg = reg.into();
        let (mut link, delay, timeout) = self.split();
        guarded(delay, timeout, async move {
            link.read_sequence(reg, buf, Addressing::Fixed).await
        })
        .await
    }

    pub async fn read_words(
        &mut self,
        reg: impl Into<u8>,
        words: &mut [u16],
    ) -> Result<(), Error<I::Error>> {
        let reg = reg.into();
        let (mut link, delay, timeout) = self.split();
        guarded(delay, timeout, async move { link.read_words(reg, words).await }).await
    }

    pub async fn read_bits(
        &mut self,
        reg: impl Into<u8>,
        field: BitField,
    ) -> Result<u8, Error<I::Error>> {
        Ok(field.extract(self.read_byte(reg).await?))
    }

    pub async fn read_bit(
        &mut self,
        reg: impl Into<u8>,
        field: BitField,
    ) -> Result<bool, Error<I::Error>> {
        Ok(self.read_bits(reg, field).await? != 0)
    }

    pub async fn read_bits_word(
        &mut self,
        reg: impl Into<u8>,
        field: WordBitField,
    ) -> Result<u16, Error<I::Error>> {
        Ok(field.extract(self.read_word(reg).await?))
    }

    pub async fn read_bit_word(
        &mut self,
        reg: impl Into<u8>,
        field: WordBitField,
    ) -> Result<bool, Error<I::Error>> {
        Ok(self.read_bits_word(reg, field).await? != 0)
    }

    pub async fn write_byte(&mut self, reg: impl Into<u8>, value: u8) -> Result<(), Error<I::Error>> {
        self.write_bytes(reg, &[value]).await
    }

    pub async fn write_word(
        &mut self,
        reg: impl Into<u8>,
        value: u16,
    ) -> Result<(), Error<I::Error>> {
        self.write_bytes(reg, &value.to_be_bytes()).await
    }

    pub async fn write_bytes(
        &mut self,
        reg: impl Into<u8>,
        data: &[u8],
    ) -> Result<(), Error<I::Error>> {
        let reg = reg.into();
        let (mut link, delay, timeout) = self.split();
        guarded(delay, timeout, async move {
            link.write_sequence(reg, data, Addressing::Incrementing).await
        })
        .await
    }

    pub async fn write_stream(
        &mut self,
        reg: impl Into<u8>,
        data: &[u8],
    ) -> Result<(), Error<I::Error>> {
        let reg = reg.into();
        let (mut link, delay, timeout) = self.split();
        guarded(delay, timeout, async move {
            link.write_sequence(reg, data, Addressing::Fixed).await
        })
        .await
    }

    pub async fn write_words(
        &mut self,
        reg: impl Into<u8>,
        words: &[u16],
    ) -> Result<(), Error<I::Error>> {
        let reg = reg.into();
        let (mut link, delay, timeout) = self.split();
        guarded(delay, timeout, async move { link.write_words(reg, words).await }).await
    }

    /// Read a register, transform it and write it back under one timeout.
    pub async fn update_byte(
        &mut self,
        reg: impl Into<u8>,
        f: impl FnOnce(u8) -> u8,
    ) -> Result<(), Error<I::Error>> {
        let reg = reg.into();
        let (mut link, delay, timeout) = self.split();
        guarded(delay, timeout, async move {
            let mut buf = [0; 1];
            link.read(reg, &mut buf).await?;
            link.write(reg, &[f(buf[0])]).await
        })
        .await
    }

    pub async fn update_word(
        &mut self,
        reg: impl Into<u8>,
        f: impl FnOnce(u16) -> u16,
    ) -> Result<(), Error<I::Error>> {
        let reg = reg.into();
        let (mut link, delay, timeout) = self.split();
        guarded(delay, timeout, async move {
            let mut buf = [0; 2];
            link.read(reg, &mut buf).await?;
            let value = f(u16::from_be_bytes(buf));
            link.write(reg, &value.to_be_bytes()).await
        })
        .await
    }

    pub async fn write_bits(
        &mut self,
        reg: impl Into<u8>,
        field: BitField,
        value: u8,
    ) -> Result<(), Error<I::Error>> {
        self.update_byte(reg, |current| field.insert(current, value))
            .await
    }

    pub async fn write_bit(
        &mut self,
        reg: impl Into<u8>,
        field: BitField,
        enabled: bool,
    ) -> Result<(), Error<I::Error>> {
        self.write_bits(reg, field, if enabled { 0xFF } else { 0 })
            .await
    }

    pub async fn write_bits_word(
        &mut self,
        reg: impl Into<u8>,
        field: WordBitField,
        value: u16,
    ) -> Result<(), Error<I::Error>> {
        self.update_word(reg, |current| field.insert(current, value))
            .await
    }

    pub async fn write_bit_word(
        &mut self,
        reg: impl Into<u8>,
        field: WordBitField,
        enabled: bool,
    ) -> Result<(), Error<I::Error>> {
        self.write_bits_word(reg, field, if enabled { 0xFFFF } else { 0 })
            .await
    }

    pub async fn read_field(&mut self, field: RegisterField) -> Result<u8, Error<I::Error>> {
        self.read_bits(field.register, field.bits).await
    }

    pub async fn read_flag(&mut self, field: RegisterField) -> Result<bool, Error<I::Error>> {
        self.read_bit(field.register, field.bits).await
    }

    pub async fn write_field(
        &mut self,
        field: RegisterField,
        value: u8,
    ) -> Result<(), Error<I::Error>> {
        self.write_bits(field.register, field.bits, value).await
    }

    pub async fn write_flag(
        &mut self,
        field: RegisterField,
        enabled: bool,
    ) -> Result<(), Error<I::Error>> {
        self.write_bit(field.register, field.bits, enabled).await
    }
}

/// Temporarily replaces the default timeout of an async [`I2cDev`].
pub struct TimeoutOverride<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    bus: &'a mut I2cDev<I, D>,
    previous: Timeout,
}

impl<I, D> Deref for TimeoutOverride<'_, I, D>
where
    I: I2c,
    D: DelayNs,
{
    type Target = I2cDev<I, D>;

    fn deref(&self) -> &Self::Target {
        self.bus
    }
}

impl<I, D> DerefMut for TimeoutOverride<'_, I, D>
where
    I: I2c,
    D: DelayNs,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.bus
    }
}

impl<I, D> Drop for TimeoutOverride<'_, I, D>
where
    I: I2c,
    D: DelayNs,
{
    fn drop(&mut self) {
        self.bus.timeout = self.previous;
    }
}
