//! Bus failures and timeouts

use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
use mpu9250_dmp::address::Address;
use mpu9250_dmp::bus::I2cDev;
use mpu9250_dmp::error::Error;
use mpu9250_dmp::registers::{fields, Register};
use mpu9250_dmp::sensor::Mpu9250;
use mpu9250_dmp::timeout::{Timeout, DEFAULT_TIMEOUT};

use crate::common::{create_mock_bus, MockError, MockI2c, Transfer};

#[test]
fn test_missing_acknowledge_is_reported_separately() {
    let (mut bus, mock) = create_mock_bus();
    let nack = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data);
    mock.fail_next(nack);
    assert_eq!(
        bus.read_byte(Register::WhoAmI),
        Err(Error::NoAcknowledge(MockError(nack)))
    );

    mock.fail_next(ErrorKind::ArbitrationLoss);
    assert_eq!(
        bus.write_byte(Register::SmpRtDiv, 4),
        Err(Error::Bus(MockError(ErrorKind::ArbitrationLoss)))
    );

    // the bus is usable again afterwards
    assert_eq!(bus.read_byte(Register::WhoAmI), Ok(0x71));
}

#[test]
fn test_wrong_address_is_not_acknowledged() {
    let mock = MockI2c::new();
    let mut bus = I2cDev::new(mock, Address::AD0_HIGH);
    assert!(matches!(
        bus.read_byte(Register::WhoAmI),
        Err(Error::NoAcknowledge(_))
    ));
}

#[test]
fn test_failed_read_skips_the_write() {
    let (mut bus, mock) = create_mock_bus();
    mock.set_register(Register::UserCtrl, 0x40);
    mock.fail_next(ErrorKind::Bus);
    assert!(bus.write_flag(fields::USER_CTRL_DMP_EN, true).is_err());
    assert_eq!(mock.register(Register::UserCtrl), 0x40);
    assert!(mock.transfers().is_empty());
}

#[test]
fn test_failure_stops_a_sequence() {
    let (mut bus, mock) = create_mock_bus();
    bus.set_transfer_limit(4);
    mock.fail_in(1, ErrorKind::Overrun);
    let mut buf = [0u8; 12];
    assert_eq!(
        bus.read_bytes(0x80, &mut buf),
        Err(Error::Bus(MockError(ErrorKind::Overrun)))
    );
    assert_eq!(mock.transfers(), vec![Transfer::Read { reg: 0x80, len: 4 }]);
}

#[test]
fn test_timeout_abandons_remaining_transfers() {
    let mock = MockI2c::new();
    mock.state().transfer_cost_us = 400;
    let mut bus = I2cDev::with_clock(mock.clone(), Address::default(), mock.clock());
    bus.set_transfer_limit(16);
    bus.set_timeout(Timeout::Millis(1));

    let mut buf = [0u8; 64];
    assert_eq!(bus.read_bytes(0x80, &mut buf), Err(Error::Timeout));
    // 400 us, 800 us, then 1200 us is past the deadline
    assert_eq!(mock.transfers().len(), 3);

    // each operation gets its own deadline
    mock.clear_transfers();
    assert_eq!(bus.read_byte(Register::WhoAmI), Ok(0x71));
}

#[test]
fn test_zero_timeout_waits_indefinitely() {
    let mock = MockI2c::new();
    mock.state().transfer_cost_us = 5_000_000;
    let mut bus = I2cDev::with_clock(mock.clone(), Address::default(), mock.clock());
    bus.set_timeout(Timeout::Millis(0));
    assert_eq!(bus.read_byte(Register::WhoAmI), Ok(0x71));
    bus.set_timeout(Timeout::Micros(0));
    let mut buf = [0u8; 64];
    assert!(bus.read_bytes(0x80, &mut buf).is_ok());
}

#[test]
fn test_bus_error_wins_over_late_deadline() {
    let mock = MockI2c::new();
    mock.state().transfer_cost_us = 2_000;
    let mut bus = I2cDev::with_clock(mock.clone(), Address::default(), mock.clock());
    bus.set_timeout(Timeout::Millis(1));
    let nack = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data);

    mock.fail_next(nack);
    assert_eq!(
        bus.read_byte(Register::WhoAmI),
        Err(Error::NoAcknowledge(MockError(nack)))
    );
    mock.fail_next(ErrorKind::Bus);
    assert_eq!(
        bus.write_byte(Register::SmpRtDiv, 1),
        Err(Error::Bus(MockError(ErrorKind::Bus)))
    );
}

#[test]
fn test_without_clock_nothing_times_out() {
    let (mut bus, mock) = create_mock_bus();
    mock.state().transfer_cost_us = 10_000;
    bus.set_timeout(Timeout::Micros(1));
    let mut buf = [0u8; 64];
    assert!(bus.read_bytes(0x80, &mut buf).is_ok());
}

#[test]
fn test_timeout_override_is_restored() {
    let mock = MockI2c::new();
    mock.state().transfer_cost_us = 2_000;
    let mut bus = I2cDev::with_clock(mock.clone(), Address::default(), mock.clock());
    assert_eq!(bus.timeout(), DEFAULT_TIMEOUT);

    assert_eq!(
        bus.with_timeout(Timeout::Millis(1)).read_byte(Register::WhoAmI),
        Err(Error::Timeout)
    );
    assert_eq!(bus.timeout(), DEFAULT_TIMEOUT);
    assert_eq!(bus.read_byte(Register::WhoAmI), Ok(0x71));

    {
        let mut guarded = bus.with_timeout(Timeout::Unbounded);
        assert_eq!(guarded.timeout(), Timeout::Unbounded);
        guarded.write_byte(Register::SmpRtDiv, 9).unwrap();
    }
    assert_eq!(bus.timeout(), DEFAULT_TIMEOUT);
}

#[test]
fn test_init_error_returns_the_bus() {
    let mock = MockI2c::new();
    mock.fail_next(ErrorKind::Bus);
    let Err(init) = Mpu9250::new(mock.clone(), Address::default()) else {
        panic!("construction should fail");
    };
    assert_eq!(init.error, Error::Bus(MockError(ErrorKind::Bus)));
    // the returned peripheral still talks to the device
    let mut bus = I2cDev::new(init.i2c, Address::default());
    assert_eq!(bus.read_byte(Register::WhoAmI), Ok(0x71));
}
