//! MPU9250 Register Map
//!
//! The MPU9250 is controlled through its registers, which are organized into groups:
//! - Configuration registers: Control sensor behavior and features
//! - Data registers: Store sensor measurements
//! - DMP registers: Control the Digital Motion Processor and its memory window
//! - FIFO registers: Manage the FIFO buffer
//!
//! Sub-byte values are not given accessor functions of their own. They are
//! listed once in [`fields`] as a `(register, bitfield)` pair and read or
//! written through the bus layer's bit operations.

use crate::bitfield::BitField;

#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Register {
    // Accelerometer Calibration Registers
    /// High byte of X-axis accelerometer offset
    AccelOffsetX_H = 0x06,
    /// High byte of Y-axis accelerometer offset
    AccelOffsetY_H = 0x08,
    /// High byte of Z-axis accelerometer offset
    AccelOffsetZ_H = 0x0A,

    // Gyroscope Calibration Registers
    /// High byte of X-axis gyroscope offset
    GyroOffsetX_H = 0x13,
    /// High byte of Y-axis gyroscope offset
    GyroOffsetY_H = 0x15,
    /// High byte of Z-axis gyroscope offset
    GyroOffsetZ_H = 0x17,

    /// Sample Rate Divider register (0x19)
    SmpRtDiv = 0x19,
    /// Configuration register (0x1A)
    /// Controls the digital low pass filter and external sync
    Config = 0x1A,
    /// Gyroscope Configuration register (0x1B)
    GyroConfig = 0x1B,
    /// Accelerometer Configuration register (0x1C)
    AccelConfig = 0x1C,

    /// FIFO Enable register (0x23)
    /// Controls which sensor data goes to FIFO
    FifoEn = 0x23,

    /// Interrupt pin configuration (0x37)
    IntPinCfg = 0x37,
    /// Interrupt Enable register (0x38)
    IntEnable = 0x38,
    /// DMP interrupt status (0x39)
    DmpIntStatus = 0x39,
    /// Interrupt Status register (0x3A), cleared on read
    IntStatus = 0x3A,

    /// High byte of X-axis acceleration
    AccelX_H = 0x3B,
    /// High byte of temperature reading
    TempOut_H = 0x41,
    /// High byte of X-axis angular rate
    GyroX_H = 0x43,

    /// Signal path reset (0x68)
    SignalPathReset = 0x68,
    /// User Control register (0x6A)
    /// Controls DMP, FIFO and I2C master
    UserCtrl = 0x6A,
    /// Power Management 1 register (0x6B)
    /// Controls device power state, clock source, and reset
    PwrMgmt1 = 0x6B,
    /// Power Management 2 register (0x6C)
    PwrMgmt2 = 0x6C,

    // DMP Registers
    /// DMP memory bank select
    BankSel = 0x6D,
    /// DMP memory start address within the selected bank
    MemStartAddr = 0x6E,
    /// DMP memory read/write window, auto-increments inside the bank
    MemRw = 0x6F,
    /// DMP configuration 1 (program start address, high byte)
    DmpCfg1 = 0x70,
    /// DMP configuration 2 (program start address, low byte)
    DmpCfg2 = 0x71,

    // FIFO Registers
    /// High byte of FIFO byte count
    FifoCount_H = 0x72,
    /// Low byte of FIFO byte count
    FifoCount_L = 0x73,
    /// FIFO Read Write register
    FifoRw = 0x74,

    /// Device identity
    WhoAmI = 0x75,
}

impl From<Register> for u8 {
    fn from(reg: Register) -> Self {
        reg as u8
    }
}

/// A named bitfield: which register holds it and where inside that register.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct RegisterField {
    pub register: Register,
    pub bits: BitField,
}

impl RegisterField {
    pub const fn new(register: Register, start: u8, len: u8) -> Self {
        Self {
            register,
            bits: BitField::new(start, len),
        }
    }

    pub const fn bit(register: Register, bit: u8) -> Self {
        Self::new(register, bit, 1)
    }
}

/// The bitfield table.
pub mod fields {
    use super::{Register::*, RegisterField};

    pub const CONFIG_EXT_SYNC_SET: RegisterField = RegisterField::new(Config, 5, 3);
    pub const CONFIG_DLPF_CFG: RegisterField = RegisterField::new(Config, 2, 3);

    pub const GYRO_CONFIG_FS_SEL: RegisterField = RegisterField::new(GyroConfig, 4, 2);
    pub const ACCEL_CONFIG_AFS_SEL: RegisterField = RegisterField::new(AccelConfig, 4, 2);

    pub const INT_PIN_CFG_LATCH_INT_EN: RegisterField = RegisterField::bit(IntPinCfg, 5);
    pub const INT_PIN_CFG_I2C_BYPASS_EN: RegisterField = RegisterField::bit(IntPinCfg, 1);

    pub const INT_FIFO_OFLOW: RegisterField = RegisterField::bit(IntEnable, 4);
    pub const INT_I2C_MST: RegisterField = RegisterField::bit(IntEnable, 3);
    pub const INT_DMP: RegisterField = RegisterField::bit(IntEnable, 1);
    pub const INT_DATA_RDY: RegisterField = RegisterField::bit(IntEnable, 0);

    pub const SIGNAL_PATH_GYRO_RESET: RegisterField = RegisterField::bit(SignalPathReset, 2);
    pub const SIGNAL_PATH_ACCEL_RESET: RegisterField = RegisterField::bit(SignalPathReset, 1);
    pub const SIGNAL_PATH_TEMP_RESET: RegisterField = RegisterField::bit(SignalPathReset, 0);

    pub const USER_CTRL_DMP_EN: RegisterField = RegisterField::bit(UserCtrl, 7);
    pub const USER_CTRL_FIFO_EN: RegisterField = RegisterField::bit(UserCtrl, 6);
    pub const USER_CTRL_I2C_MST_EN: RegisterField = RegisterField::bit(UserCtrl, 5);
    pub const USER_CTRL_DMP_RESET: RegisterField = RegisterField::bit(UserCtrl, 3);
    pub const USER_CTRL_FIFO_RESET: RegisterField = RegisterField::bit(UserCtrl, 2);
    pub const USER_CTRL_I2C_MST_RESET: RegisterField = RegisterField::bit(UserCtrl, 1);
    pub const USER_CTRL_SIG_COND_RESET: RegisterField = RegisterField::bit(UserCtrl, 0);

    pub const PWR1_DEVICE_RESET: RegisterField = RegisterField::bit(PwrMgmt1, 7);
    pub const PWR1_SLEEP: RegisterField = RegisterField::bit(PwrMgmt1, 6);
    pub const PWR1_CYCLE: RegisterField = RegisterField::bit(PwrMgmt1, 5);
    pub const PWR1_TEMP_DIS: RegisterField = RegisterField::bit(PwrMgmt1, 3);
    pub const PWR1_CLKSEL: RegisterField = RegisterField::new(PwrMgmt1, 2, 3);

    pub const BANK_SEL_PRFTCH_EN: RegisterField = RegisterField::bit(BankSel, 6);
    pub const BANK_SEL_CFG_USER_BANK: RegisterField = RegisterField::bit(BankSel, 5);
    pub const BANK_SEL_MEM_SEL: RegisterField = RegisterField::new(BankSel, 4, 5);

    pub const WHO_AM_I: RegisterField = RegisterField::new(WhoAmI, 6, 6);
}
