//! MPU9250 Blocking Driver
//!
//! Drives the InvenSense MPU-9250 and its Digital Motion Processor through a
//! blocking [`I2cDev`]:
//! - sensor configuration (ranges, filter, clock source, sample rate)
//! - DMP memory access, firmware upload and configuration scripts
//! - FIFO management and reading DMP frames as [`Packet`]s
//! - raw accelerometer and gyroscope registers
//!
//! Every register change that touches only part of a register is a single
//! read-modify-write through the register field table, so other settings
//! sharing the register are preserved.

use embedded_hal::{delay::DelayNs, i2c::I2c};

use crate::{
    accel::{Accel, AccelFullScale},
    address::Address,
    bus::I2cDev,
    clock_source::ClockSource,
    config::DigitalLowPassFilter,
    error::{Error, InitError},
    fifo::{Fifo, FIFO_SIZE},
    firmware::{self, ConfigScript, Verify, DMP_START_ADDRESS},
    gyro::{Gyro, GyroFullScale},
    packet::{DecodeError, Packet, PacketLayout},
    registers::{fields, Register},
    timeout::{Clock, NoClock, Timeout},
};

/// Time the device needs after a reset.
pub(crate) const RESET_DELAY_MS: u32 = 200;

/// Sample rate divider used with the DMP: 1 kHz / (1 + 4) = 200 Hz.
pub(crate) const DMP_SAMPLE_RATE_DIVIDER: u8 = 4;

/// InvenSense MPU-9250 Driver
pub struct Mpu9250<I, C = NoClock> {
    bus: I2cDev<I, C>,
}

impl<I> Mpu9250<I, NoClock>
where
    I: I2c,
{
    /// Construct a new i2c driver for the MPU-9250 and wake it up.
    pub fn new(i2c: I, address: Address) -> Result<Self, InitError<I, I::Error>> {
        Self::from_bus(I2cDev::new(i2c, address))
    }
}

impl<I, C> Mpu9250<I, C>
where
    I: I2c,
    C: Clock,
{
    /// Like [`new`](Mpu9250::new), with bus timeouts measured by `clock`.
    pub fn with_clock(i2c: I, address: Address, clock: C) -> Result<Self, InitError<I, I::Error>> {
        Self::from_bus(I2cDev::with_clock(i2c, address, clock))
    }

    fn from_bus(bus: I2cDev<I, C>) -> Result<Self, InitError<I, I::Error>> {
        let mut sensor = Self { bus };
        match sensor.set_sleep_enabled(false) {
            Ok(()) => Ok(sensor),
            Err(error) => Err(InitError {
                i2c: sensor.release(),
                error,
            }),
        }
    }

    /// Returns the underlying I2C peripheral, consuming this driver.
    pub fn release(self) -> I {
        self.bus.release()
    }

    /// Direct register access.
    pub fn bus(&mut self) -> &mut I2cDev<I, C> {
        &mut self.bus
    }

    pub fn set_timeout(&mut self, timeout: Timeout) {
        self.bus.set_timeout(timeout);
    }

    pub fn set_transfer_limit(&mut self, limit: usize) -> usize {
        self.bus.set_transfer_limit(limit)
    }

    /// Load DMP firmware and configuration and start the DMP.
    ///
    /// `firmware` is the DMP program image, `config` the configuration
    /// script that goes with it. Both are uploaded with read-back
    /// verification. Afterwards the DMP fills the FIFO with frames.
    pub fn initialize_dmp(
        &mut self,
        firmware: &[u8],
        config: &ConfigScript<'_>,
        delay: &mut impl DelayNs,
    ) -> Result<(), Error<I::Error>> {
        self.reset(delay)?;
        self.set_sleep_enabled(false)?;
        self.reset_signal_path(delay)?;
        self.disable_dmp()?;
        self.set_clock_source(ClockSource::Xgyro)?;
        self.set_interrupt_enabled(0x00)?;
        self.set_fifo_enabled(Fifo::all_disabled())?;
        self.set_accel_full_scale(AccelFullScale::G2)?;
        self.set_sample_rate_divider(DMP_SAMPLE_RATE_DIVIDER)?;
        self.set_digital_lowpass_filter(DigitalLowPassFilter::Filter1)?;
        self.load_firmware(firmware, Verify::ReadBack)?;
        self.write_dmp_configuration(config, Verify::ReadBack)?;
        self.boot_firmware()?;
        self.set_gyro_full_scale(GyroFullScale::Deg2000)?;
        self.enable_fifo()?;
        self.reset_fifo()?;
        self.reset_dmp()?;
        self.enable_dmp()?;
        debug!("DMP running");
        Ok(())
    }

    /// Perform power reset of the MPU
    pub fn reset(&mut self, delay: &mut impl DelayNs) -> Result<(), Error<I::Error>> {
        self.bus.write_flag(fields::PWR1_DEVICE_RESET, true)?;
        delay.delay_ms(RESET_DELAY_MS);
        Ok(())
    }

    /// Reset the signal paths and sensor registers of all sensors.
    pub fn reset_signal_path(&mut self, delay: &mut impl DelayNs) -> Result<(), Error<I::Error>> {
        self.bus.write_flag(fields::USER_CTRL_SIG_COND_RESET, true)?;
        delay.delay_ms(RESET_DELAY_MS);
        Ok(())
    }

    pub fn set_clock_source(&mut self, source: ClockSource) -> Result<(), Error<I::Error>> {
        self.bus.write_field(fields::PWR1_CLKSEL, source as u8)
    }

    pub fn set_sleep_enabled(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        self.bus.write_flag(fields::PWR1_SLEEP, enabled)
    }

    pub fn set_accel_full_scale(&mut self, scale: AccelFullScale) -> Result<(), Error<I::Error>> {
        self.bus.write_field(fields::ACCEL_CONFIG_AFS_SEL, scale as u8)
    }

    pub fn set_gyro_full_scale(&mut self, scale: GyroFullScale) -> Result<(), Error<I::Error>> {
        self.bus.write_field(fields::GYRO_CONFIG_FS_SEL, scale as u8)
    }

    /// Output rate = internal rate / (1 + `div`).
    pub fn set_sample_rate_divider(&mut self, div: u8) -> Result<(), Error<I::Error>> {
        self.bus.write_byte(Register::SmpRtDiv, div)
    }

    pub fn set_digital_lowpass_filter(
        &mut self,
        filter: DigitalLowPassFilter,
    ) -> Result<(), Error<I::Error>> {
        self.bus.write_field(fields::CONFIG_DLPF_CFG, filter as u8)
    }

    /// Write the whole `INT_ENABLE` register.
    pub fn set_interrupt_enabled(&mut self, mask: u8) -> Result<(), Error<I::Error>> {
        self.bus.write_byte(Register::IntEnable, mask)
    }

    /// Read the interrupt status register, clearing it.
    pub fn interrupt_status(&mut self) -> Result<u8, Error<I::Error>> {
        self.bus.read_byte(Register::IntStatus)
    }

    pub fn dmp_interrupt_status(&mut self) -> Result<u8, Error<I::Error>> {
        self.bus.read_byte(Register::DmpIntStatus)
    }

    pub fn enable_fifo(&mut self) -> Result<(), Error<I::Error>> {
        self.bus.write_flag(fields::USER_CTRL_FIFO_EN, true)
    }

    pub fn reset_fifo(&mut self) -> Result<(), Error<I::Error>> {
        self.bus.write_flag(fields::USER_CTRL_FIFO_RESET, true)
    }

    pub fn get_fifo_enabled(&mut self) -> Result<Fifo, Error<I::Error>> {
        Ok(Fifo::from_byte(self.bus.read_byte(Register::FifoEn)?))
    }

    pub fn set_fifo_enabled(&mut self, fifo: Fifo) -> Result<(), Error<I::Error>> {
        self.bus.write_byte(Register::FifoEn, fifo.to_byte())
    }

    pub fn enable_dmp(&mut self) -> Result<(), Error<I::Error>> {
        self.bus.write_flag(fields::USER_CTRL_DMP_EN, true)
    }

    pub fn disable_dmp(&mut self) -> Result<(), Error<I::Error>> {
        self.bus.write_flag(fields::USER_CTRL_DMP_EN, false)
    }

    pub fn reset_dmp(&mut self) -> Result<(), Error<I::Error>> {
        self.bus.write_flag(fields::USER_CTRL_DMP_RESET, true)
    }

    /// Select the DMP memory bank (0..=31) reached through the memory window.
    pub fn set_memory_bank(
        &mut self,
        bank: u8,
        prefetch: bool,
        user_bank: bool,
    ) -> Result<(), Error<I::Error>> {
        let value = fields::BANK_SEL_MEM_SEL.bits.insert(0, bank)
            | fields::BANK_SEL_CFG_USER_BANK.bits.insert(0, user_bank as u8)
            | fields::BANK_SEL_PRFTCH_EN.bits.insert(0, prefetch as u8);
        self.bus.write_byte(Register::BankSel, value)
    }

    pub fn set_memory_start_address(&mut self, address: u8) -> Result<(), Error<I::Error>> {
        self.bus.write_byte(Register::MemStartAddr, address)
    }

    /// Read DMP memory starting at `bank`/`address`, crossing banks as needed.
    pub fn read_memory_block(
        &mut self,
        bank: u8,
        address: u8,
        buf: &mut [u8],
    ) -> Result<(), Error<I::Error>> {
        firmware::read_memory(&mut self.bus, bank, address, buf)
    }

    /// Write DMP memory starting at `bank`/`address`, crossing banks as needed.
    pub fn write_memory_block(
        &mut self,
        data: &[u8],
        bank: u8,
        address: u8,
        verify: Verify,
    ) -> Result<(), Error<I::Error>> {
        firmware::write_memory(&mut self.bus, data, bank, address, verify)
    }

    /// Upload a DMP program image.
    pub fn load_firmware(&mut self, image: &[u8], verify: Verify) -> Result<(), Error<I::Error>> {
        firmware::upload(&mut self.bus, image, verify)
    }

    /// Run a DMP configuration script.
    pub fn write_dmp_configuration(
        &mut self,
        script: &ConfigScript<'_>,
        verify: Verify,
    ) -> Result<(), Error<I::Error>> {
        firmware::configure(&mut self.bus, script, verify)
    }

    /// Point the DMP program counter at the start of the uploaded firmware.
    pub fn boot_firmware(&mut self) -> Result<(), Error<I::Error>> {
        self.bus.write_word(Register::DmpCfg1, DMP_START_ADDRESS)
    }

    pub fn set_dmp_config1(&mut self, value: u8) -> Result<(), Error<I::Error>> {
        self.bus.write_byte(Register::DmpCfg1, value)
    }

    pub fn set_dmp_config2(&mut self, value: u8) -> Result<(), Error<I::Error>> {
        self.bus.write_byte(Register::DmpCfg2, value)
    }

    /// Number of bytes waiting in the FIFO.
    pub fn get_fifo_count(&mut self) -> Result<usize, Error<I::Error>> {
        let count = self.bus.read_word(Register::FifoCount_H)? as usize;
        if count > FIFO_SIZE {
            warn!("FIFO count {} exceeds FIFO size", count);
            return Err(Error::MalformedResponse {
                expected: FIFO_SIZE,
                actual: count,
            });
        }
        Ok(count)
    }

    /// Drain up to `buf.len()` bytes from the FIFO.
    pub fn read_fifo<'a>(&mut self, buf: &'a mut [u8]) -> Result<&'a [u8], Error<I::Error>> {
        let len = self.get_fifo_count()?.min(buf.len());
        let data = &mut buf[..len];
        self.bus.read_stream(Register::FifoRw, data)?;
        Ok(data)
    }

    /// Whether at least one whole frame of `layout` is waiting.
    pub fn packet_available(&mut self, layout: &PacketLayout) -> Result<bool, Error<I::Error>> {
        Ok(self.get_fifo_count()? >= layout.len())
    }

    /// Read the next frame from the FIFO into `buf`.
    ///
    /// Returns `None` when less than a whole frame is waiting.
    pub fn read_packet<'a>(
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
        if !self.packet_available(layout)? {
            return Ok(None);
        }
        let frame = &mut buf[..len];
        self.bus.read_stream(Register::FifoRw, frame)?;
        Ok(Some(Packet::new(frame, layout)?))
    }

    pub fn accel(&mut self) -> Result<Accel, Error<I::Error>> {
        let mut data = [0; 6];
        self.bus.read_bytes(Register::AccelX_H, &mut data)?;
        Ok(Accel::from_bytes(data))
    }

    pub fn gyro(&mut self) -> Result<Gyro, Error<I::Error>> {
        let mut data = [0; 6];
        self.bus.read_bytes(Register::GyroX_H, &mut data)?;
        Ok(Gyro::from_bytes(data))
    }

    /// Accelerometer and gyroscope from one block read.
    pub fn motion6(&mut self) -> Result<(Accel, Gyro), Error<I::Error>> {
        let mut data = [0; 14];
        self.bus.read_bytes(Register::AccelX_H, &mut data)?;
        Ok(split_motion6(&data))
    }
}

/// Splits `ACCEL_XOUT_H..=GYRO_ZOUT_L`, skipping the temperature in between.
pub(crate) fn split_motion6(data: &[u8; 14]) -> (Accel, Gyro) {
    let accel = Accel::from_bytes([data[0], data[1], data[2], data[3], data[4], data[5]]);
    let gyro = Gyro::from_bytes([data[8], data[9], data[10], data[11], data[12], data[13]]);
    (accel, gyro)
}
