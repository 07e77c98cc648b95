//! Draining DMP frames from the FIFO and decoding them

use mpu9250_dmp::accel::AccelFullScale;
use mpu9250_dmp::error::Error;
use mpu9250_dmp::fifo::FIFO_SIZE;
use mpu9250_dmp::packet::{Channels, DecodeError, PacketCodec, PacketLayout, MAX_PACKET_SIZE};

use crate::common::test_utils::{frame, level_frame};
use crate::common::{assert_float_eq, create_mock_driver};

#[test]
fn test_fifo_count() {
    let (mut driver, mock) = create_mock_driver();
    assert_eq!(driver.get_fifo_count().unwrap(), 0);
    mock.push_fifo(&[0; 300]);
    assert_eq!(driver.get_fifo_count().unwrap(), 300);
}

#[test]
fn test_impossible_fifo_count() {
    let (mut driver, mock) = create_mock_driver();
    mock.state().fifo_count_override = Some(FIFO_SIZE as u16 + 1);
    assert_eq!(
        driver.get_fifo_count(),
        Err(Error::MalformedResponse {
            expected: FIFO_SIZE,
            actual: FIFO_SIZE + 1
        })
    );
}

#[test]
fn test_read_packet_waits_for_a_whole_frame() {
    let (mut driver, mock) = create_mock_driver();
    let layout = PacketLayout::CANONICAL;
    let frame = level_frame();
    let mut buf = [0u8; MAX_PACKET_SIZE];

    mock.push_fifo(&frame[..20]);
    assert!(!driver.packet_available(&layout).unwrap());
    assert!(driver.read_packet(&layout, &mut buf).unwrap().is_none());
    assert_eq!(mock.fifo_len(), 20);

    mock.push_fifo(&frame[20..]);
    mock.push_fifo(&frame);
    let packet = driver.read_packet(&layout, &mut buf).unwrap().unwrap();
    assert_eq!(packet.bytes(), &frame[..]);
    assert_eq!(packet.quaternion_i32().unwrap(), [1 << 30, 0, 0, 0]);
    assert_eq!(mock.fifo_len(), MAX_PACKET_SIZE);
}

#[test]
fn test_read_packet_rejects_short_buffer() {
    let (mut driver, mock) = create_mock_driver();
    mock.push_fifo(&level_frame());
    let mut buf = [0u8; 16];
    assert_eq!(
        driver
            .read_packet(&PacketLayout::CANONICAL, &mut buf)
            .map(|p| p.is_some()),
        Err(Error::Decode(DecodeError::FrameLength {
            expected: MAX_PACKET_SIZE,
            actual: 16
        }))
    );
    assert_eq!(mock.fifo_len(), MAX_PACKET_SIZE);
}

#[test]
fn test_read_fifo_drains_what_is_there() {
    let (mut driver, mock) = create_mock_driver();
    mock.push_fifo(&[1, 2, 3, 4, 5]);
    let mut buf = [0u8; 64];
    let data = driver.read_fifo(&mut buf).unwrap();
    assert_eq!(data, &[1, 2, 3, 4, 5]);
    assert_eq!(mock.fifo_len(), 0);
}

#[test]
fn test_reset_fifo_discards_frames() {
    let (mut driver, mock) = create_mock_driver();
    mock.push_fifo(&level_frame());
    driver.reset_fifo().unwrap();
    assert_eq!(mock.fifo_len(), 0);
}

#[test]
fn test_level_frame_orientation() {
    let (mut driver, mock) = create_mock_driver();
    mock.push_fifo(&level_frame());
    let mut buf = [0u8; MAX_PACKET_SIZE];
    let packet = driver
        .read_packet(&PacketLayout::CANONICAL, &mut buf)
        .unwrap()
        .unwrap();

    let gravity = packet.gravity().unwrap();
    assert_float_eq(gravity.x, 0.0, 1e-6);
    assert_float_eq(gravity.y, 0.0, 1e-6);
    assert_float_eq(gravity.z, 1.0, 1e-6);

    let ypr = packet.yaw_pitch_roll().unwrap();
    assert_float_eq(ypr.yaw, 0.0, 1e-6);
    assert_float_eq(ypr.pitch, 0.0, 1e-6);
    assert_float_eq(ypr.roll, 0.0, 1e-6);

    // at rest the accelerometer only sees gravity
    let linear = packet.linear_accel(AccelFullScale::G2).unwrap();
    assert_eq!((linear.x(), linear.y(), linear.z()), (0, 0, 0));
}

#[test]
fn test_sensor_words_in_frame() {
    let bytes = frame([1 << 30, 0, 0, 0], [-5, 6, 7], [100, -200, 300], [1, -2, 3]);
    let codec = PacketCodec::default();
    let packet = codec.decode(&bytes).unwrap();

    let gyro = packet.gyro().unwrap();
    assert_eq!((gyro.x(), gyro.y(), gyro.z()), (-5, 6, 7));
    let accel = packet.accel().unwrap();
    assert_eq!((accel.x(), accel.y(), accel.z()), (1, -2, 3));
    let mag = packet.mag().unwrap();
    assert_eq!((mag.x(), mag.y(), mag.z()), (100, -200, 300));
}

#[test]
fn test_reduced_layout_from_fifo() {
    let (mut driver, mock) = create_mock_driver();
    let layout = PacketLayout::new(Channels {
        mag: false,
        gyro: false,
        ..Channels::ALL
    });
    assert_eq!(layout.len(), 16 + 12 + 2);

    let full = level_frame();
    let mut reduced = Vec::new();
    reduced.extend_from_slice(&full[..16]);
    reduced.extend_from_slice(&full[34..]);
    mock.push_fifo(&reduced);

    let mut buf = [0u8; MAX_PACKET_SIZE];
    let packet = driver.read_packet(&layout, &mut buf).unwrap().unwrap();
    assert_eq!(packet.accel().unwrap().z(), 16384);
    assert!(packet.gyro().is_err());
    assert_eq!(mock.fifo_len(), 0);
}

#[test]
fn test_codec_rejects_degenerate_quaternion() {
    let codec = PacketCodec::new(PacketLayout::CANONICAL, AccelFullScale::G2);
    let bytes = frame([0; 4], [0; 3], [0; 3], [0; 3]);
    let packet = codec.decode(&bytes).unwrap();
    assert_eq!(packet.quaternion(), Err(DecodeError::Degenerate));
    assert_eq!(packet.gravity(), Err(DecodeError::Degenerate));
}
