//! Test utilities and helper functions

use std::cell::Cell;
use std::rc::Rc;

use mpu9250_dmp::address::Address;
use mpu9250_dmp::bus::I2cDev;
use mpu9250_dmp::packet::MAX_PACKET_SIZE;
use mpu9250_dmp::sensor::Mpu9250;

use crate::common::mock_i2c::MockI2c;

/// Delay that returns at once and remembers how long it was asked to wait.
#[derive(Debug, Clone, Default)]
pub struct MockDelay {
    waited_us: Rc<Cell<u64>>,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waited_us(&self) -> u64 {
        self.waited_us.get()
    }

    fn add_us(&self, us: u64) {
        self.waited_us.set(self.waited_us.get() + us);
    }
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.add_us(ns as u64 / 1000);
    }

    fn delay_us(&mut self, us: u32) {
        self.add_us(us as u64);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.add_us(ms as u64 * 1000);
    }
}

impl embedded_hal_async::delay::DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.add_us(ns as u64 / 1000);
    }

    async fn delay_us(&mut self, us: u32) {
        self.add_us(us as u64);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.add_us(ms as u64 * 1000);
    }
}

/// Create a blocking bus on a fresh mock.
/// Returns (bus, mock) where mock is a clone that shares state with the bus.
pub fn create_mock_bus() -> (I2cDev<MockI2c>, MockI2c) {
    let mock = MockI2c::new();
    let bus = I2cDev::new(mock.clone(), Address::default());
    (bus, mock)
}

/// Create a blocking driver on a fresh mock, already woken up.
pub fn create_mock_driver() -> (Mpu9250<MockI2c>, MockI2c) {
    let mock = MockI2c::new();
    let driver = Mpu9250::new(mock.clone(), Address::default()).expect("Failed to create mock driver");
    mock.clear_transfers();
    (driver, mock)
}

/// A firmware image with a recognizable byte pattern.
pub fn test_firmware(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + 3) as u8).collect()
}

/// A configuration script: one write into bank 3, enable interrupts, one write into bank 7.
pub const TEST_SCRIPT: [u8; 14] = [
    0x03, 0x7B, 0x03, 0x4C, 0xCD, 0x6C, //
    0x00, 0x00, 0x00, 0x01, //
    0x07, 0xF0, 0x01, 0xAA,
];

/// A canonical 48-byte frame with the given Q30 quaternion and raw sensor words.
pub fn frame(quaternion: [i32; 4], gyro: [i16; 3], mag: [i16; 3], accel: [i16; 3]) -> [u8; MAX_PACKET_SIZE] {
    let mut bytes = [0u8; MAX_PACKET_SIZE];
    for (i, q) in quaternion.iter().enumerate() {
        bytes[i * 4..i * 4 + 4].copy_from_slice(&q.to_be_bytes());
    }
    for (i, g) in gyro.iter().enumerate() {
        bytes[16 + i * 4..18 + i * 4].copy_from_slice(&g.to_be_bytes());
    }
    for (i, m) in mag.iter().enumerate() {
        bytes[28 + i * 2..30 + i * 2].copy_from_slice(&m.to_be_bytes());
    }
    for (i, a) in accel.iter().enumerate() {
        bytes[34 + i * 4..36 + i * 4].copy_from_slice(&a.to_be_bytes());
    }
    bytes
}

/// A frame from a device lying flat and at rest.
pub fn level_frame() -> [u8; MAX_PACKET_SIZE] {
    frame([1 << 30, 0, 0, 0], [0; 3], [0; 3], [0, 0, 16384])
}

/// Assert that two floating point values are approximately equal
pub fn assert_float_eq(a: f32, b: f32, epsilon: f32) {
    let diff = (a - b).abs();
    assert!(
        diff < epsilon,
        "Values not equal within epsilon: {} vs {} (diff: {}, epsilon: {})",
        a,
        b,
        diff,
        epsilon
    );
}
