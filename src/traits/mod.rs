//! Trait definitions for the device's external collaborators.
//!
//! This module defines the abstractions that allow fence-sentry to:
//! - Run on different hardware (ESP32 with VL53L0X, desktop mocks)
//! - Serve the control page over different transports
//!
//! # Submodules
//!
//! - `hardware`: Distance sensor, temperature sensor, indicator output
//! - `network`: The single-connection TCP transport
//!
//! # Hardware Abstraction
//!
//! - [`DistanceSensor`]: Single-shot time-of-flight ranging
//! - [`TemperatureSensor`]: Whole-degree Celsius readings
//! - [`Indicator`]: Binary alarm LED, plus [`PinIndicator`] for any
//!   `embedded-hal` output pin
//!
//! # Networking
//!
//! - [`Transport`]: init/connect/listen/accept/receive/send/close

pub mod hardware;
pub mod network;

pub use hardware::*;
pub use network::*;
