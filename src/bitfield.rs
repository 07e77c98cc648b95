//! Bitfield Descriptors
//!
//! Most MPU-9250 configuration values occupy only a few bits of a register.
//! A descriptor names such a run of bits by its most significant bit and its
//! length, the same way the register map documents them:
//!
//! ```text
//!   bit:   7   6   5   4   3   2   1   0
//!        [   |   |   | x | x | x |   |   ]   start = 4, len = 3
//! ```
//!
//! Descriptors can only be built valid. [`BitField::new`] is a `const fn`
//! that refuses bad arguments at compile time when used in a `const` item,
//! and [`BitField::try_new`] reports them as a [`BitFieldError`] at runtime.

/// Reason a bitfield descriptor was rejected.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum BitFieldError {
    /// The start bit lies outside the register
    StartOutOfRange,
    /// The field is empty or runs past bit 0
    InvalidLength,
}

impl core::fmt::Display for BitFieldError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::StartOutOfRange => f.write_str("bitfield start bit outside of register"),
            Self::InvalidLength => f.write_str("bitfield length empty or past bit 0"),
        }
    }
}

const fn check(start: u8, len: u8, width: u8) -> Result<(), BitFieldError> {
    if start >= width {
        Err(BitFieldError::StartOutOfRange)
    } else if len == 0 || len > start + 1 {
        Err(BitFieldError::InvalidLength)
    } else {
        Ok(())
    }
}

/// A run of bits within a single 8-bit register.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct BitField {
    start: u8,
    len: u8,
}

impl BitField {
    /// Describe `len` bits ending (from the top) at bit `start`.
    ///
    /// Panics on an invalid descriptor, which is a compile error when the
    /// call happens in a `const` context:
    ///
    /// ```compile_fail
    /// # use mpu9250_dmp::bitfield::BitField;
    /// const BAD: BitField = BitField::new(2, 4);
    /// let _ = BAD;
    /// ```
    pub const fn new(start: u8, len: u8) -> Self {
        match check(start, len, 8) {
            Ok(()) => Self { start, len },
            Err(_) => panic!("invalid bitfield descriptor"),
        }
    }

    /// A single bit.
    pub const fn bit(bit: u8) -> Self {
        Self::new(bit, 1)
    }

    /// Fallible constructor for descriptors computed at runtime.
    pub const fn try_new(start: u8, len: u8) -> Result<Self, BitFieldError> {
        match check(start, len, 8) {
            Ok(()) => Ok(Self { start, len }),
            Err(e) => Err(e),
        }
    }

    pub const fn start(&self) -> u8 {
        self.start
    }

    pub const fn len(&self) -> u8 {
        self.len
    }

    /// Position of the least significant bit of the field.
    pub const fn shift(&self) -> u8 {
        self.start + 1 - self.len
    }

    /// Mask of the field in register position.
    pub const fn mask(&self) -> u8 {
        // computed in u16 so an 8-bit field doesn't overflow the shift
        (((1u16 << self.len) - 1) << self.shift()) as u8
    }

    /// Pull the field out of a register value, right-aligned.
    pub const fn extract(&self, register: u8) -> u8 {
        (register & self.mask()) >> self.shift()
    }

    /// Replace the field inside `register` with `value`.
    ///
    /// `value` is truncated to the field width; bits outside the field are
    /// left untouched.
    pub const fn insert(&self, register: u8, value: u8) -> u8 {
        let mask = self.mask();
        (register & !mask) | ((((value as u16) << self.shift()) as u8) & mask)
    }
}

/// A run of bits within a 16-bit register pair, numbered MSB-first across
/// the big-endian word (bit 15 is the top bit of the first byte).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct WordBitField {
    start: u8,
    len: u8,
}

impl WordBitField {
    /// Describe `len` bits ending (from the top) at bit `start` of a word.
    pub const fn new(start: u8, len: u8) -> Self {
        match check(start, len, 16) {
            Ok(()) => Self { start, len },
            Err(_) => panic!("invalid word bitfield descriptor"),
        }
    }

    pub const fn bit(bit: u8) -> Self {
        Self::new(bit, 1)
    }

    pub const fn try_new(start: u8, len: u8) -> Result<Self, BitFieldError> {
        match check(start, len, 16) {
            Ok(()) => Ok(Self { start, len }),
            Err(e) => Err(e),
        }
    }

    pub const fn start(&self) -> u8 {
        self.start
    }

    pub const fn len(&self) -> u8 {
        self.len
    }

    pub const fn shift(&self) -> u8 {
        self.start + 1 - self.len
    }

    pub const fn mask(&self) -> u16 {
        (((1u32 << self.len) - 1) << self.shift()) as u16
    }

    pub const fn extract(&self, register: u16) -> u16 {
        (register & self.mask()) >> self.shift()
    }

    pub const fn insert(&self, register: u16, value: u16) -> u16 {
        let mask = self.mask();
        (register & !mask) | ((((value as u32) << self.shift()) as u16) & mask)
    }
}
