//! Single register, bit and word operations

use mpu9250_dmp::bitfield::{BitField, WordBitField};
use mpu9250_dmp::registers::{fields, Register};

use crate::common::{create_mock_bus, Transfer};

#[test]
fn test_read_byte_and_word() {
    let (mut bus, mock) = create_mock_bus();
    mock.set_register(Register::AccelX_H, 0x12);
    mock.set_register(Register::GyroOffsetX_H, 0xAB);
    mock.state().registers[0x3C] = 0x34;

    assert_eq!(bus.read_byte(Register::GyroOffsetX_H).unwrap(), 0xAB);
    assert_eq!(bus.read_word(Register::AccelX_H).unwrap(), 0x1234);
    assert_eq!(
        mock.transfers(),
        vec![
            Transfer::Read { reg: 0x13, len: 1 },
            Transfer::Read { reg: 0x3B, len: 2 },
        ]
    );
}

#[test]
fn test_write_word_is_big_endian() {
    let (mut bus, mock) = create_mock_bus();
    bus.write_word(Register::DmpCfg1, 0x0400).unwrap();
    assert_eq!(mock.register(Register::DmpCfg1), 0x04);
    assert_eq!(mock.register(Register::DmpCfg2), 0x00);
    assert_eq!(
        mock.transfers(),
        vec![Transfer::Write {
            reg: 0x70,
            data: vec![0x04, 0x00]
        }]
    );
}

#[test]
fn test_write_bits_preserves_other_bits() {
    let (mut bus, mock) = create_mock_bus();
    mock.set_register(Register::Config, 0b1010_1010);

    // bits 4..=2
    bus.write_bits(Register::Config, BitField::new(4, 3), 0b101).unwrap();
    assert_eq!(mock.register(Register::Config), 0b1011_0110);
    assert_eq!(bus.read_bits(Register::Config, BitField::new(4, 3)).unwrap(), 0b101);

    // value wider than the field is truncated
    bus.write_bits(Register::Config, BitField::new(1, 2), 0xFF).unwrap();
    assert_eq!(mock.register(Register::Config), 0b1011_0111);
}

#[test]
fn test_write_bit_sets_and_clears() {
    let (mut bus, mock) = create_mock_bus();
    mock.set_register(Register::IntPinCfg, 0x00);

    bus.write_bit(Register::IntPinCfg, BitField::bit(5), true).unwrap();
    assert_eq!(mock.register(Register::IntPinCfg), 0x20);
    assert!(bus.read_bit(Register::IntPinCfg, BitField::bit(5)).unwrap());

    bus.write_bit(Register::IntPinCfg, BitField::bit(1), true).unwrap();
    bus.write_bit(Register::IntPinCfg, BitField::bit(5), false).unwrap();
    assert_eq!(mock.register(Register::IntPinCfg), 0x02);
    assert!(!bus.read_bit(Register::IntPinCfg, BitField::bit(5)).unwrap());
}

#[test]
fn test_read_modify_write_is_one_read_and_one_write() {
    let (mut bus, mock) = create_mock_bus();
    mock.set_register(Register::UserCtrl, 0x40);
    bus.write_flag(fields::USER_CTRL_DMP_EN, true).unwrap();
    assert_eq!(
        mock.transfers(),
        vec![
            Transfer::Read { reg: 0x6A, len: 1 },
            Transfer::Write {
                reg: 0x6A,
                data: vec![0xC0]
            },
        ]
    );
}

#[test]
fn test_word_bits() {
    let (mut bus, mock) = create_mock_bus();
    bus.write_word(Register::AccelOffsetX_H, 0xFFFF).unwrap();

    // bits 14..=3
    let field = WordBitField::new(14, 12);
    bus.write_bits_word(Register::AccelOffsetX_H, field, 0).unwrap();
    assert_eq!(bus.read_word(Register::AccelOffsetX_H).unwrap(), 0x8007);
    assert_eq!(bus.read_bits_word(Register::AccelOffsetX_H, field).unwrap(), 0);

    bus.write_bit_word(Register::AccelOffsetX_H, WordBitField::bit(8), true).unwrap();
    assert!(bus.read_bit_word(Register::AccelOffsetX_H, WordBitField::bit(8)).unwrap());
    assert_eq!(mock.register(Register::AccelOffsetX_H), 0x81);
    assert_eq!(mock.state().registers[0x07], 0x07);
}

#[test]
fn test_named_fields() {
    let (mut bus, mock) = create_mock_bus();
    bus.write_field(fields::PWR1_CLKSEL, 1).unwrap();
    // sleep bit from power-on is kept
    assert_eq!(mock.register(Register::PwrMgmt1), 0x41);
    assert_eq!(bus.read_field(fields::PWR1_CLKSEL).unwrap(), 1);
    assert!(bus.read_flag(fields::PWR1_SLEEP).unwrap());
    assert_eq!(bus.read_field(fields::WHO_AM_I).unwrap(), 0x38);
}
