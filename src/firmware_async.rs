//! Async DMP Firmware Loader
//!
//! Async versions of the [`firmware`](crate::firmware) functions.

use embedded_hal_async::{delay::DelayNs, i2c::I2c};

use crate::{
    bus_async::I2cDev,
    error::Error,
    firmware::{
        check_capacity, compare, memory_chunks, ConfigRecord, ConfigScript, MemoryChunk, Special,
        Verify, DMP_CHUNK_SIZE, DMP_INT_ENABLE,
    },
    registers::Register,
};

async fn select_chunk<I, D>(bus: &mut I2cDev<I, D>, chunk: &MemoryChunk) -> Result<(), Error<I::Error>>
where
    I: I2c,
    D: DelayNs,
{
    bus.write_byte(Register::BankSel, chunk.bank).await?;
    bus.write_byte(Register::MemStartAddr, chunk.address).await
}

pub async fn read_memory<I, D>(
    bus: &mut I2cDev<I, D>,
    bank: u8,
    address: u8,
    buf: &mut [u8],
) -> Result<(), Error<I::Error>>
where
    I: I2c,
    D: DelayNs,
{
    check_capacity(bank, address, buf.len())?;
    for chunk in memory_chunks(bank, address, buf.len()) {
        select_chunk(bus, &chunk).await?;
        bus.read_stream(Register::MemRw, &mut buf[chunk.range.clone()])
            .await?;
    }
    Ok(())
}

pub async fn write_memory<I, D>(
    bus: &mut I2cDev<I, D>,
    data: &[u8],
    bank: u8,
    address: u8,
    verify: Verify,
) -> Result<(), Error<I::Error>>
where
    I: I2c,
    D: DelayNs,
{
    check_capacity(bank, address, data.len())?;
    let mut readback = [0u8; DMP_CHUNK_SIZE];
    for chunk in memory_chunks(bank, address, data.len()) {
        let written = &data[chunk.range.clone()];
        select_chunk(bus, &chunk).await?;
        bus.write_stream(Register::MemRw, written).await?;
        if verify == Verify::ReadBack {
            let read = &mut readback[..written.len()];
            select_chunk(bus, &chunk).await?;
            bus.read_stream(Register::MemRw, read).await?;
            compare(&chunk, written, read)?;
        }
    }
    Ok(())
}

pub async fn upload<I, D>(
    bus: &mut I2cDev<I, D>,
    image: &[u8],
    verify: Verify,
) -> Result<(), Error<I::Error>>
where
    I: I2c,
    D: DelayNs,
{
    debug!("uploading {} bytes of DMP firmware", image.len());
    write_memory(bus, image, 0, 0, verify).await
}

pub async fn configure<I, D>(
    bus: &mut I2cDev<I, D>,
    script: &ConfigScript<'_>,
    verify: Verify,
) -> Result<(), Error<I::Error>>
where
    I: I2c,
    D: DelayNs,
{
    let records = script.validate()?;
    debug!("applying {} DMP configuration records", records);
    for record in script {
        match record? {
            ConfigRecord::Write {
                bank,
                address,
                data,
            } => write_memory(bus, data, bank, address, verify).await?,
            ConfigRecord::Special(Special::EnableInterrupts) => {
                bus.write_byte(Register::IntEnable, DMP_INT_ENABLE).await?
            }
        }
    }
    Ok(())
}
