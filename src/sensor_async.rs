//! MPU9250 Asynchronous Driver
//!
//! Mirrors the blocking driver in [`sensor`](crate::sensor) on top of
//! `embedded-hal-async`. The delay provider handed to [`Mpu9250::new`] is
//! owned by the bus: it bounds every bus operation (see
//! [`bus_async`](crate::bus_async)) and also times the waits after resets,
//! so unlike the blocking driver no method takes a separate delay.

use embedded_hal_async::{delay::DelayNs, i2c::I2c};

use crate::{
    accel::{Accel, AccelFullScale},
    address::Address,
    bus_async::I2cDev,
    clock_source::ClockSource,
    config::DigitalLowPassFilter,
    error::{Error, InitError},
    fifo::{Fifo, FIFO_SIZE},
    firmware::{ConfigScript, Verify, DMP_START_ADDRESS},
    firmware_async,
    gyro::{Gyro, GyroFullScale},
    packet::{DecodeError, Packet, PacketLayout},
    registers::{fields, Register},
    sensor::{split_motion6, DMP_SAMPLE_RATE_DIVIDER, RESET_DELAY_MS},
    timeout::Timeout,
};

/// InvenSense MPU-9250 Driver
pub struct Mpu9250<I, D> {
    bus: I2cDev<I, D>,
}

impl<I, D> Mpu9250<I, D>
where
    I: I2c,
    D: DelayNs,
{
    /// Construct a new i2c driver for the MPU-9250 and wake it up.
    pub async fn new(i2c: I, address: Address, delay: D) -> Result<Self, InitError<I, I::Error>> {
        let mut sensor = Self {
            bus: I2cDev::new(i2c, address, delay),
        };
        match sensor.set_sleep_enabled(false).await {
            Ok(()) => Ok(sensor),
            Err(error) => Err(InitError {
                i2c: sensor.release().0,
                error,
            }),
        }
    }

    /// Returns the I2C peripheral and the delay provider, consuming this driver.
    pub fn release(self) -> (I, D) {
        self.bus.release()
    }

    /// Direct register access.
    pub fn bus(&mut self) -> &mut I2cDev<I, D> {
        &mut self.bus
    }

    pub fn set_timeout(&mut self, timeout: Timeout) {
        self.bus.set_timeout(timeout);
    }

    pub fn set_transfer_limit(&mut self, limit: usize) -> usize {
        self.bus.set_transfer_limit(limit)
    }

    /// Load DMP firmware and configuration and start the DMP.
    pub async fn initialize_dmp(
        &mut self,
        firmware: &[u8],
        config: &ConfigScript<'_>,
    ) -> Result<(), Error<I::Error>> {
        self.reset().await?;
        self.set_sleep_enabled(false).await?;
        self.reset_signal_path().await?;
        self.disable_dmp().await?;
        self.set_clock_source(ClockSource::Xgyro).await?;
        self.set_interrupt_enabled(0x00).await?;
        self.set_fifo_enabled(Fifo::all_disabled()).await?;
        self.set_accel_full_scale(AccelFullScale::G2).await?;
        self.set_sample_rate_divider(DMP_SAMPLE_RATE_DIVIDER)
            .await?;
        self.set_digital_lowpass_filter(DigitalLowPassFilter::Filter1)
            .await?;
        self.load_firmware(firmware, Verify::ReadBack).await?;
        self.write_dmp_configuration(config, Verify::ReadBack)
            .await?;
        self.boot_firmware().await?;
        self.set_gyro_full_scale(GyroFullScale::Deg2000).await?;
        self.enable_fifo().await?;
        self.reset_fifo().await?;
        self.reset_dmp().await?;
        self.enable_dmp().await?;
        debug!("DMP running");
        Ok(())
    }

    /// Perform power reset of the MPU
    pub async fn reset(&mut self) -> Result<(), Error<I::Error>> {
        self.bus.write_flag(fields::PWR1_DEVICE_RESET, true).await?;
        self.bus.delay().delay_ms(RESET_DELAY_MS).await;
        Ok(())
    }

    /// Reset the signal paths and sensor registers of all sensors.
    pub async fn reset_signal_path(&mut self) -> Result<(), Error<I::Error>> {
        self.bus
            .write_flag(fields::USER_CTRL_SIG_COND_RESET, true)
            .await?;
        self.bus.delay().delay_ms(RESET_DELAY_MS).await;
        Ok(())
    }

    pub async fn set_clock_source(&mut self, source: ClockSource) -> Result<(), Error<I::Error>> {
        self.bus.write_field(fields::PWR1_CLKSEL, source as u8).await
    }

    pub async fn set_sleep_enabled(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        self.bus.write_flag(fields::PWR1_SLEEP, enabled).await
    }

    pub async fn set_accel_full_scale(
        &mut self,
        scale: AccelFullScale,
    ) -> Result<(), Error<I::Error>> {
        self.bus
            .write_field(fields::ACCEL_CONFIG_AFS_SEL, scale as u8)
            .await
    }

    pub async fn set_gyro_full_scale(&mut self, scale: GyroFullScale) -> Result<(), Error<I::Error>> {
        self.bus
            .write_field(fields::GYRO_CONFIG_FS_SEL, scale as u8)
            .await
    }

    pub async fn set_sample_rate_divider(&mut self, div: u8) -> Result<(), Error<I::Error>> {
        self.bus.write_byte(Register::SmpRtDiv, div).await
    }

    pub async fn set_digital_lowpass_filter(
        &mut self,
        filter: DigitalLowPassFilter,
    ) -> Result<(), Error<I::Error>> {
        self.bus
            .write_field(fields::CONFIG_DLPF_CFG, filter as u8)
            .await
    }

    pub async fn set_interrupt_enabled(&mut self, mask: u8) -> Result<(), Error<I::Error>> {
        self.bus.write_byte(Register::IntEnable, mask).await
    }

    /// Read the interrupt status register, clearing it.
    pub async fn interrupt_status(&mut self) -> Result<u8, Error<I::Error>> {
        self.bus.read_byte(Register::IntStatus).await
    }

    pub async fn dmp_interrupt_status(&mut self) -> Result<u8, Error<I::Error>> {
        self.bus.read_byte(Register::DmpIntStatus).await
    }

    pub async fn enable_fifo(&mut self) -> Result<(), Error<I::Error>> {
        self.bus.write_flag(fields::USER_CTRL_FIFO_EN, true).await
    }

    pub async fn reset_fifo(&mut self) -> Result<(), Error<I::Error>> {
        self.bus.write_flag(fields::USER_CTRL_FIFO_RESET, true).await
    }

    pub async fn get_fifo_enabled(&mut self) -> Result<Fifo, Error<I::Error>> {
        Ok(Fifo::from_byte(self.bus.read_byte(Register::FifoEn).await?))
    }

    pub async fn set_fifo_enabled(&mut self, fifo: Fifo) -> Result<(), Error<I::Error>> {
        self.bus.write_byte(Register::FifoEn, fifo.to_byte()).await
    }

    pub async fn enable_dmp(&mut self) -> Result<(), Error<I::Error>> {
        self.bus.write_flag(fields::USER_CTRL_DMP_EN, true).await
    }

    pub async fn disable_dmp(&mut self) -> Result<(), Error<I::Error>> {
        self.bus.write_flag(fields::USER_CTRL_DMP_EN, false).await
    }

    pub async fn reset_dmp(&mut self) -> Result<(), Error<I::Error>> {
        self.bus.write_flag(fields::USER_CTRL_DMP_RESET, true).await
    }

    pub async fn set_memory_bank(
        &mut self,
        bank: u8,
        prefetch: bool,
        user_bank: bool,
    ) -> Result<(), Error<I::Error>> {
        let value = fields::BANK_SEL_MEM_SEL.bits.insert(0, bank)
            | fields::BANK_SEL_CFG_USER_BANK.bits.insert(0, user_bank as u8)
            | fields::BANK_SEL_PRFTCH_EN.bits.insert(0, prefetch as u8);
        self.bus.write_byte(Register::BankSel, value).await
    }

    pub async fn set_memory_start_address(&mut self, address: u8) -> Result<(), Error<I::Error>> {
        self.bus.write_byte(Register::MemStartAddr, address).await
    }

    pub async fn read_memory_block(
        &mut self,
        bank: u8,
        address: u8,
        buf: &mut [u8],
    ) -> Result<(), Error<I::Error>> {
        firmware_async::read_memory(&mut self.bus, bank, address, buf).await
    }

    pub async fn write_memory_block(
        &mut self,
        data: &[u8],
        bank: u8,
        address: u8,
        verify: Verify,
    ) -> Result<(), Error<I::Error>> {
        firmware_async::write_memory(&mut self.bus, data, bank, address, verify).await
    }

    pub async fn load_firmware(&mut self, image: &[u8], verify: Verify) -> Result<(), Error<I::Error>> {
        firmware_async::upload(&mut self.bus, image, verify).await
    }

    pub async fn write_dmp_configuration(
        &mut self,
        script: &ConfigScript<'_>,
        verify: Verify,
    ) -> Result<(), Error<I::Error>> {
        firmware_async::configure(&mut self.bus, script, verify).await
    }

    pub async fn boot_firmware(&mut self) -> Result<(), Error<I::Error>> {
        self.bus
            .write_word(Register::DmpCfg1, DMP_START_ADDRESS)
            .await
    }

    pub async fn set_dmp_config1(&mut self, value: u8) -> Result<(), Error<I::Error>> {
        self.bus.write_byte(Register::DmpCfg1, value).await
    }

    pub async fn set_dmp_config2(&mut self, value: u8) -> Result<(), Error<I::Error>> {
        self.bus.write_byte(Register::DmpCfg2, value).await
    }

    pub async fn get_fifo_count(&mut self) -> Result<usize, Error<I::Error>> {
        let count = self.bus.read_word(Register::FifoCount_H).await? as usize;
        if count > FIFO_SIZE {
            warn!("FIFO count {} exceeds FIFO size", count);
            return Err(Error::MalformedResponse {
                expected: FIFO_SIZE,
                actual: count,
            });
        }
        Ok(count)
    }

    pub async fn read_fifo<'a>(&mut self, buf: &'a mut [u8]) -> Result<&'a [u8], Error<I::Error>> {
        let len = self.get_fifo_count().await?.min(buf.len());
        let data = &mut buf[..len];
        self.bus.read_stream(Register::FifoRw, data).await?;
        Ok(data)
    }

    pub async fn packet_available(&mut self, layout: &PacketLayout) -> Result<bool, Error<I::Error>> {
        Ok(self.get_fifo_count().await? >= layout.len())
    }

    /// Read the next frame from the FIFO into `buf`, `None` when less than
    /// a whole frame is waiting.
    pub async fn read_packet<'a>(
        &mut self,
        layout: &PacketLayout,
        buf: &'a mut [u8],
    ) -> Result<Option<Packet<'a>>, Error<I::Error>> {
        let len = layout.len();
        if buf.len() < len {
            return Err(DecodeError::FrameLength {
                expected: len,
                actual: buf.len(),
            }
            .into());
        }
        if !self.packet_available(layout).await? {
            return Ok(None);
        }
        let frame = &mut buf[..len];
        self.bus.read_stream(Register::FifoRw, frame).await?;
        Ok(Some(Packet::new(frame, layout)?))
    }

    pub async fn accel(&mut self) -> Result<Accel, Error<I::Error>> {
        let mut data = [0; 6];
        self.bus.read_bytes(Register::AccelX_H, &mut data).await?;
        Ok(Accel::from_bytes(data))
    }

    pub async fn gyro(&mut self) -> Result<Gyro, Error<I::Error>> {
        let mut data = [0; 6];
        self.bus.read_bytes(Register::GyroX_H, &mut data).await?;
        Ok(Gyro::from_bytes(data))
    }

    pub async fn motion6(&mut self) -> Result<(Accel, Gyro), Error<I::Error>> {
        let mut data = [0; 14];
        self.bus.read_bytes(Register::AccelX_H, &mut data).await?;
        Ok(split_motion6(&data))
    }
}
