//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`] for various platforms.
//!
//! # Available Implementations
//!
//! - `mock`: Test implementations for desktop development
//! - `vl53l0x`: Time-of-flight range sensor on any `embedded-hal` I2C bus
//! - `tcp`: `std::net` listener transport (requires `std` feature)
//! - `esp32`: ESP32-C3 SuperMini board support (requires `esp32` feature)

pub mod mock;
pub mod vl53l0x;

#[cfg(feature = "std")]
pub mod tcp;

#[cfg(feature = "esp32")]
pub mod esp32;

pub use mock::*;
pub use vl53l0x::{Vl53l0x, Vl53l0xError};

#[cfg(feature = "std")]
pub use tcp::{TcpTransport, TcpTransportError};
