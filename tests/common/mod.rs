//! Common test utilities and mock implementations
#![allow(dead_code)]

pub mod test_utils;

#[allow(unused_imports)]
pub use mock_i2c::{MockError, MockI2c, Transfer};
#[allow(unused_imports)]
pub use test_utils::{assert_float_eq, create_mock_bus, create_mock_driver, MockDelay};
