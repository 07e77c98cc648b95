//! DMP Firmware Loader
//!
//! The Digital Motion Processor runs a program that has to be uploaded into
//! its RAM after every power cycle. That RAM is reached through a small
//! register window:
//! - `BANK_SEL` picks one of eight 256-byte banks
//! - `MEM_START_ADDR` sets the address inside the bank
//! - `MEM_R_W` reads or writes bytes, advancing the address
//!
//! Data is moved in pieces of at most [`DMP_CHUNK_SIZE`] bytes that never
//! cross a bank boundary. Uploads can be verified by reading every piece back.
//!
//! After the program, the DMP is configured with a script of records:
//!
//! ```text
//! [bank, address, length, data ...]   write `length` bytes of DMP memory
//! [bank, address, 0, instruction]     special instruction
//! ```
//!
//! The only special instruction is `0x01`, which enables the DMP and FIFO
//! overflow interrupts.
//!
//! The memory and script logic here is shared by both drivers. The free
//! functions work on a blocking [`I2cDev`](crate::bus::I2cDev); their async
//! counterparts live in [`firmware_async`](crate::firmware_async).

use core::ops::Range;

use embedded_hal::i2c::I2c;

use crate::{
    bus::I2cDev,
    error::Error,
    registers::Register,
    timeout::Clock,
};

/// Size of one DMP memory bank.
pub const DMP_BANK_SIZE: usize = 256;

/// Number of DMP memory banks.
pub const DMP_BANK_COUNT: usize = 8;

/// Total DMP memory.
pub const DMP_MEMORY_SIZE: usize = DMP_BANK_SIZE * DMP_BANK_COUNT;

/// Largest piece of DMP memory moved in one go.
pub const DMP_CHUNK_SIZE: usize = 16;

/// Program counter the MotionApps firmware starts at.
pub const DMP_START_ADDRESS: u16 = 0x0400;

/// `INT_ENABLE` value written by the `0x01` special instruction:
/// FIFO overflow and DMP interrupts.
pub const DMP_INT_ENABLE: u8 = 0x32;

/// Whether uploads are read back and compared.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Verify {
    #[default]
    None,
    ReadBack,
}

/// One piece of a DMP memory transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct MemoryChunk {
    pub bank: u8,
    pub address: u8,
    /// Range of the caller's buffer this piece covers
    pub range: Range<usize>,
}

/// Splits a transfer of `len` bytes starting at `bank`/`address` into pieces.
pub(crate) fn memory_chunks(
    bank: u8,
    address: u8,
    len: usize,
) -> impl Iterator<Item = MemoryChunk> {
    let start = bank as usize * DMP_BANK_SIZE + address as usize;
    let mut done = 0;
    core::iter::from_fn(move || {
        if done >= len {
            return None;
        }
        let position = start + done;
        let in_bank = position % DMP_BANK_SIZE;
        let size = (len - done)
            .min(DMP_CHUNK_SIZE)
            .min(DMP_BANK_SIZE - in_bank);
        let chunk = MemoryChunk {
            bank: (position / DMP_BANK_SIZE) as u8,
            address: in_bank as u8,
            range: done..done + size,
        };
        done += size;
        Some(chunk)
    })
}

/// Fails when `len` bytes starting at `bank`/`address` run past DMP memory.
pub(crate) fn check_capacity<E>(bank: u8, address: u8, len: usize) -> Result<(), Error<E>> {
    let start = bank as usize * DMP_BANK_SIZE + address as usize;
    let capacity = DMP_MEMORY_SIZE.saturating_sub(start);
    if len > capacity {
        warn!("{} bytes do not fit into {} bytes of DMP memory", len, capacity);
        return Err(Error::FirmwareTooLarge {
            size: len,
            capacity,
        });
    }
    Ok(())
}

/// Compares a piece read back from DMP memory with what was written.
pub(crate) fn compare<E>(chunk: &MemoryChunk, written: &[u8], read: &[u8]) -> Result<(), Error<E>> {
    match written.iter().zip(read).position(|(w, r)| w != r) {
        None => Ok(()),
        Some(i) => {
            let address = chunk.address.wrapping_add(i as u8);
            warn!("DMP memory mismatch at bank {} address {:#x}", chunk.bank, address);
            Err(Error::VerifyMismatch {
                bank: chunk.bank,
                address,
            })
        }
    }
}

/// A configuration script record that cannot be executed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct MalformedScript {
    /// Offset of the record within the script
    pub offset: usize,
}

impl<E> From<MalformedScript> for Error<E> {
    fn from(e: MalformedScript) -> Self {
        Error::MalformedScript { offset: e.offset }
    }
}

/// Special instructions embedded in a configuration script.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Special {
    /// Enable the DMP and FIFO overflow interrupts
    EnableInterrupts,
}

impl Special {
    const fn from_code(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(Self::EnableInterrupts),
            _ => None,
        }
    }
}

/// One record of a configuration script.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConfigRecord<'a> {
    Write { bank: u8, address: u8, data: &'a [u8] },
    Special(Special),
}

/// A DMP configuration script.
///
/// Iterating yields the records in order. A truncated record or an unknown
/// special instruction yields one error and ends the iteration.
#[derive(Copy, Clone, Debug)]
pub struct ConfigScript<'a> {
    bytes: &'a [u8],
}

impl<'a> ConfigScript<'a> {
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Checks every record without touching the device.
    pub fn validate(&self) -> Result<usize, MalformedScript> {
        let mut records = 0;
        for record in self.iter() {
            record?;
            records += 1;
        }
        Ok(records)
    }

    pub fn iter(&self) -> ConfigRecords<'a> {
        ConfigRecords {
            bytes: self.bytes,
            offset: 0,
            failed: false,
        }
    }
}

impl<'a> IntoIterator for &ConfigScript<'a> {
    type Item = Result<ConfigRecord<'a>, MalformedScript>;
    type IntoIter = ConfigRecords<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the records of a [`ConfigScript`].
pub struct ConfigRecords<'a> {
    bytes: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> ConfigRecords<'a> {
    fn parse(&self) -> Result<(ConfigRecord<'a>, usize), MalformedScript> {
        let malformed = MalformedScript {
            offset: self.offset,
        };
        let bytes: &'a [u8] = self.bytes;
        let [bank, address, length, body @ ..] = &bytes[self.offset..] else {
            return Err(malformed);
        };
        let (bank, address, length) = (*bank, *address, *length);
        if length == 0 {
            let code = body.first().ok_or(malformed)?;
            let special = Special::from_code(*code).ok_or(malformed)?;
            return Ok((ConfigRecord::Special(special), 4));
        }
        let data = body.get(..length as usize).ok_or(malformed)?;
        Ok((
            ConfigRecord::Write {
                bank,
                address,
                data,
            },
            3 + data.len(),
        ))
    }
}

impl<'a> Iterator for ConfigRecords<'a> {
    type Item = Result<ConfigRecord<'a>, MalformedScript>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.bytes.len() {
            return None;
        }
        match self.parse() {
            Ok((record, consumed)) => {
                self.offset += consumed;
                Some(Ok(record))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

fn select_chunk<I, C>(bus: &mut I2cDev<I, C>, chunk: &MemoryChunk) -> Result<(), Error<I::Error>>
where
    I: I2c,
    C: Clock,
{
    bus.write_byte(Register::BankSel, chunk.bank)?;
    bus.write_byte(Register::MemStartAddr, chunk.address)
}

/// Reads `buf.len()` bytes of DMP memory starting at `bank`/`address`.
pub fn read_memory<I, C>(
    bus: &mut I2cDev<I, C>,
    bank: u8,
    address: u8,
    buf: &mut [u8],
) -> Result<(), Error<I::Error>>
where
    I: I2c,
    C: Clock,
{
    check_capacity(bank, address, buf.len())?;
    for chunk in memory_chunks(bank, address, buf.len()) {
        select_chunk(bus, &chunk)?;
        bus.read_stream(Register::MemRw, &mut buf[chunk.range.clone()])?;
    }
    Ok(())
}

/// Writes `data` into DMP memory starting at `bank`/`address`.
pub fn write_memory<I, C>(
    bus: &mut I2cDev<I, C>,
    data: &[u8],
    bank: u8,
    address: u8,
    verify: Verify,
) -> Result<(), Error<I::Error>>
where
    I: I2c,
    C: Clock,
{
    check_capacity(bank, address, data.len())?;
    let mut readback = [0u8; DMP_CHUNK_SIZE];
    for chunk in memory_chunks(bank, address, data.len()) {
        let written = &data[chunk.range.clone()];
        select_chunk(bus, &chunk)?;
        bus.write_stream(Register::MemRw, written)?;
        if verify == Verify::ReadBack {
            let read = &mut readback[..written.len()];
            select_chunk(bus, &chunk)?;
            bus.read_stream(Register::MemRw, read)?;
            compare(&chunk, written, read)?;
        }
    }
    Ok(())
}

/// Uploads a firmware image to the start of DMP memory.
pub fn upload<I, C>(bus: &mut I2cDev<I, C>, image: &[u8], verify: Verify) -> Result<(), Error<I::Error>>
where
    I: I2c,
    C: Clock,
{
    debug!("uploading {} bytes of DMP firmware", image.len());
    write_memory(bus, image, 0, 0, verify)
}

/// Runs a configuration script. The whole script is validated before the
/// first record is written.
pub fn configure<I, C>(
    bus: &mut I2cDev<I, C>,
    script: &ConfigScript<'_>,
    verify: Verify,
) -> Result<(), Error<I::Error>>
where
    I: I2c,
    C: Clock,
{
    let records = script.validate()?;
    debug!("applying {} DMP configuration records", records);
    for record in script {
        match record? {
            ConfigRecord::Write {
                bank,
                address,
                data,
            } => write_memory(bus, data, bank, address, verify)?,
            ConfigRecord::Special(Special::EnableInterrupts) => {
                bus.write_byte(Register::IntEnable, DMP_INT_ENABLE)?
            }
        }
    }
    Ok(())
}
