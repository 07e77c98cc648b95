//! Device configuration through the driver

use mpu9250_dmp::accel::AccelFullScale;
use mpu9250_dmp::clock_source::ClockSource;
use mpu9250_dmp::config::DigitalLowPassFilter;
use mpu9250_dmp::fifo::Fifo;
use mpu9250_dmp::gyro::GyroFullScale;
use mpu9250_dmp::registers::Register;

use crate::common::{create_mock_driver, MockDelay};

#[test]
fn test_new_wakes_the_device() {
    let (_driver, mock) = create_mock_driver();
    assert_eq!(mock.register(Register::PwrMgmt1) & 0x40, 0);
}

#[test]
fn test_field_writes_land_in_the_right_bits() {
    let (mut driver, mock) = create_mock_driver();
    mock.set_register(Register::Config, 0b0011_1000);

    driver
        .set_digital_lowpass_filter(DigitalLowPassFilter::Filter3)
        .unwrap();
    assert_eq!(mock.register(Register::Config), 0b0011_1011);

    driver.set_accel_full_scale(AccelFullScale::G8).unwrap();
    assert_eq!(mock.register(Register::AccelConfig), 0b0001_0000);

    driver.set_gyro_full_scale(GyroFullScale::Deg2000).unwrap();
    assert_eq!(mock.register(Register::GyroConfig), 0b0001_1000);

    driver.set_clock_source(ClockSource::Zgyro).unwrap();
    assert_eq!(mock.register(Register::PwrMgmt1), 0x03);

    driver.set_sample_rate_divider(4).unwrap();
    assert_eq!(mock.register(Register::SmpRtDiv), 4);

    driver.set_interrupt_enabled(0x12).unwrap();
    assert_eq!(mock.register(Register::IntEnable), 0x12);
}

#[test]
fn test_fifo_enable_bits() {
    let (mut driver, mock) = create_mock_driver();
    let fifo = Fifo {
        temp: true,
        accel: true,
        slv0: true,
        ..Fifo::all_disabled()
    };
    driver.set_fifo_enabled(fifo).unwrap();
    assert_eq!(mock.register(Register::FifoEn), 0b1000_1001);
    assert_eq!(driver.get_fifo_enabled().unwrap(), fifo);
}

#[test]
fn test_dmp_control_bits() {
    let (mut driver, mock) = create_mock_driver();
    driver.enable_fifo().unwrap();
    driver.enable_dmp().unwrap();
    assert_eq!(mock.register(Register::UserCtrl), 0xC0);

    driver.reset_dmp().unwrap();
    // the reset bit clears itself
    assert_eq!(mock.register(Register::UserCtrl), 0xC0);

    driver.disable_dmp().unwrap();
    assert_eq!(mock.register(Register::UserCtrl), 0x40);
}

#[test]
fn test_interrupt_status_clears_on_read() {
    let (mut driver, mock) = create_mock_driver();
    mock.set_register(Register::IntStatus, 0x02);
    mock.set_register(Register::DmpIntStatus, 0x01);
    assert_eq!(driver.interrupt_status().unwrap(), 0x02);
    assert_eq!(driver.interrupt_status().unwrap(), 0x00);
    assert_eq!(driver.dmp_interrupt_status().unwrap(), 0x01);
}

#[test]
fn test_reset_waits_for_the_device() {
    let (mut driver, mock) = create_mock_driver();
    let mut delay = MockDelay::new();
    driver.set_sample_rate_divider(9).unwrap();

    driver.reset(&mut delay).unwrap();
    assert_eq!(mock.register(Register::SmpRtDiv), 0);
    assert_eq!(mock.register(Register::PwrMgmt1), 0x40);
    assert_eq!(delay.waited_us(), 200_000);

    driver.reset_signal_path(&mut delay).unwrap();
    assert_eq!(delay.waited_us(), 400_000);
}

#[test]
fn test_motion6_skips_temperature() {
    let (mut driver, mock) = create_mock_driver();
    {
        let mut state = mock.state();
        let block = [
            0x00, 0x01, 0xFF, 0xFE, 0x40, 0x00, // accel
            0x12, 0x34, // temperature
            0x00, 0x0A, 0x00, 0x0B, 0x80, 0x00, // gyro
        ];
        state.registers[0x3B..0x49].copy_from_slice(&block);
    }
    let (accel, gyro) = driver.motion6().unwrap();
    assert_eq!((accel.x(), accel.y(), accel.z()), (1, -2, 16384));
    assert_eq!((gyro.x(), gyro.y(), gyro.z()), (10, 11, i16::MIN));

    assert_eq!(driver.accel().unwrap(), accel);
    assert_eq!(driver.gyro().unwrap(), gyro);
}
