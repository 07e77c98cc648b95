//! End-to-end DMP bring-up and frame processing

use mpu9250_dmp::address::Address;
use mpu9250_dmp::firmware::{ConfigScript, DMP_INT_ENABLE};
use mpu9250_dmp::packet::{PacketCodec, PacketLayout, MAX_PACKET_SIZE};
use mpu9250_dmp::registers::Register;
use mpu9250_dmp::sensor::Mpu9250;

use crate::common::test_utils::{frame, level_frame, test_firmware, TEST_SCRIPT};
use crate::common::{assert_float_eq, MockDelay, MockI2c};

const FIRMWARE_LEN: usize = 1929;
const HALF_SQRT2_Q30: i32 = 759_250_125;

fn bring_up() -> (Mpu9250<MockI2c>, MockI2c, MockDelay) {
    let mock = MockI2c::new();
    let mut delay = MockDelay::new();
    let mut driver = Mpu9250::new(mock.clone(), Address::default()).expect("wake up");
    driver
        .initialize_dmp(
            &test_firmware(FIRMWARE_LEN),
            &ConfigScript::new(&TEST_SCRIPT),
            &mut delay,
        )
        .expect("DMP initialization");
    (driver, mock, delay)
}

#[test]
fn test_initialize_dmp_configures_device() {
    let (_driver, mock, delay) = bring_up();

    let image = test_firmware(FIRMWARE_LEN);
    assert_eq!(mock.memory(0, 0, 256), image[..256].to_vec());
    assert_eq!(mock.memory(7, 0, FIRMWARE_LEN - 7 * 256), image[7 * 256..].to_vec());
    // script records land after the image, past its end in bank 7
    assert_eq!(mock.memory(3, 0x7B, 3), vec![0x4C, 0xCD, 0x6C]);
    assert_eq!(mock.memory(7, 0xF0, 1), vec![0xAA]);

    assert_eq!(mock.register(Register::IntEnable), DMP_INT_ENABLE);
    assert_eq!(mock.register(Register::DmpCfg1), 0x04);
    assert_eq!(mock.register(Register::DmpCfg2), 0x00);
    // awake, clocked from the X gyro
    assert_eq!(mock.register(Register::PwrMgmt1), 0x01);
    assert_eq!(mock.register(Register::SmpRtDiv), 4);
    assert_eq!(mock.register(Register::Config), 0x01);
    assert_eq!(mock.register(Register::GyroConfig), 0x18);
    assert_eq!(mock.register(Register::AccelConfig), 0x00);
    assert_eq!(mock.register(Register::FifoEn), 0x00);
    // DMP and FIFO enabled, reset bits cleared
    assert_eq!(mock.register(Register::UserCtrl), 0xC0);

    assert_eq!(delay.waited_us(), 400_000);
}

#[test]
fn test_initialize_dmp_stops_on_bus_error() {
    let mock = MockI2c::new();
    let mut delay = MockDelay::new();
    let mut driver = Mpu9250::new(mock.clone(), Address::default()).unwrap();
    mock.fail_in(30, embedded_hal::i2c::ErrorKind::Bus);
    assert!(driver
        .initialize_dmp(&test_firmware(64), &ConfigScript::new(&TEST_SCRIPT), &mut delay)
        .is_err());
    assert_eq!(mock.register(Register::UserCtrl) & 0x80, 0);
}

#[test]
fn test_frames_drain_in_order() {
    let (mut driver, mock, _delay) = bring_up();
    let layout = PacketLayout::CANONICAL;
    let yawed = frame([HALF_SQRT2_Q30, 0, 0, HALF_SQRT2_Q30], [0; 3], [0; 3], [0, 0, 16384]);
    mock.push_fifo(&level_frame());
    mock.push_fifo(&yawed);
    mock.push_fifo(&level_frame());

    let mut yaws = Vec::new();
    let mut buf = [0u8; MAX_PACKET_SIZE];
    while let Some(packet) = driver.read_packet(&layout, &mut buf).unwrap() {
        let gravity = packet.gravity().unwrap();
        assert_float_eq(gravity.z, 1.0, 1e-5);
        yaws.push(packet.yaw_pitch_roll().unwrap().yaw);
    }

    assert_eq!(yaws.len(), 3);
    assert_float_eq(yaws[0], 0.0, 1e-5);
    assert_float_eq(yaws[1].abs(), core::f32::consts::FRAC_PI_2, 1e-4);
    assert_float_eq(yaws[2], 0.0, 1e-5);
    assert_eq!(mock.fifo_len(), 0);
}

#[test]
fn test_filtered_linear_acceleration_across_frames() {
    let (mut driver, mock, _delay) = bring_up();
    let mut codec = PacketCodec::default();
    codec.set_linear_accel_filter_coefficient(0.5);

    // level, with 0.5 g of extra acceleration along X
    let pushed = frame([1 << 30, 0, 0, 0], [0; 3], [0; 3], [8192, 0, 16384]);
    mock.push_fifo(&pushed);
    mock.push_fifo(&level_frame());

    let mut buf = [0u8; MAX_PACKET_SIZE];
    let packet = driver
        .read_packet(codec.layout(), &mut buf)
        .unwrap()
        .unwrap();
    let first = codec.linear_accel(&packet).unwrap();
    assert_eq!((first.x(), first.y(), first.z()), (8192, 0, 0));

    let packet = driver
        .read_packet(codec.layout(), &mut buf)
        .unwrap()
        .unwrap();
    let second = codec.linear_accel(&packet).unwrap();
    assert_eq!(second.x(), 4096);

    codec.reset_filter();
    let repeat = codec.linear_accel(&packet).unwrap();
    assert_eq!(repeat.x(), 0);
}
