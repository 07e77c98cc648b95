#![cfg_attr(not(test), no_std)]

#[macro_use]
mod log;

pub mod accel;
pub mod address;
pub mod bitfield;
pub mod bus;
pub mod bus_async;
pub mod clock_source;
pub mod config;
pub mod error;
pub mod euler;
pub mod fifo;
pub mod firmware;
pub mod firmware_async;
pub mod gravity;
pub mod gyro;
pub mod linear_accel;
pub mod magnetometer;
pub mod packet;
pub mod quaternion;
pub mod registers;
pub mod sensor;
pub mod sensor_async;
pub mod timeout;
pub mod yaw_pitch_roll;
