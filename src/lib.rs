//! # fence-sentry
//!
//! A proximity security device: a time-of-flight sensor guards a configurable
//! distance (the "fence"), a latched alarm trips when anything comes inside
//! it, and a single-connection HTTP page shows live readings and lets an
//! operator move the fence.
//!
//! ## Features
//!
//! - **Latched alarm**: set by the poll loop, cleared only by the reset
//!   button, race-free across interrupt contexts
//! - **Control page**: auto-refreshing HTML over one TCP connection at a time
//! - **Fixed-position form parsing**: no allocation, no form decoder
//! - **Blinking indicator**: driven by a periodic tick
//! - **Hardware abstraction**: runs on ESP32-C3 or on a desktop with mocks
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `alarm` - Alarm state machine and the shared [`DeviceState`]
//! - `sensors` - Sensor sampling and the poll loop body
//! - `request` - Request classification and the receive buffer
//! - `form` - Positional field extraction
//! - `page` - Control page rendering
//! - `server` - Accept/receive/dispatch/send loop
//! - `indicator` - Tick-driven blink driver
//! - `traits` - Hardware and network abstractions
//! - `hal` - Concrete implementations (mock for testing, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use fence_sentry::{
//!     ConnectionServer, DeviceState, Monitor, SensorSource, ServerConfig, SensorConfig,
//!     WifiConfig,
//!     hal::{MockDistance, MockTemperature, MockTransport},
//! };
//!
//! static DEVICE: DeviceState = DeviceState::new(70);
//!
//! let mut distance = MockDistance::new();
//! distance.queue_mm(&[500, 500]);
//! let mut temperature = MockTemperature::new();
//! temperature.queue_c(&[21, 21]);
//! let mut monitor = Monitor::new(SensorSource::new(
//!     distance,
//!     temperature,
//!     &SensorConfig::default(),
//! ));
//!
//! // One client moves the fence and asks the server to stop
//! let mut transport = MockTransport::new();
//! transport.queue_client(b"POST / HTTP/1.1\r\nA: a=1;b=2;c=3;d=4;e=5;f=6\r\n\r\nfenceNum=120&stop_server=1");
//!
//! let mut server = ConnectionServer::new(transport, &DEVICE, ServerConfig::default());
//! server.run(&WifiConfig::default(), &mut monitor).unwrap();
//!
//! assert_eq!(DEVICE.fence.get(), 120);
//! assert_eq!(server.transport().responses.len(), 1);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Alarm state machine and shared device state.
pub mod alarm;
/// Shared configuration system for desktop and ESP32.
pub mod config;
/// Fixed-position form field extraction.
pub mod form;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Tick-driven alarm indicator.
pub mod indicator;
/// Control page rendering.
pub mod page;
/// Request classification and receive buffer.
pub mod request;
/// Sensor sampling and the poll loop body.
pub mod sensors;
/// Single-connection control server.
pub mod server;
/// Core traits for hardware and network abstraction.
pub mod traits;

// Re-exports for convenience
pub use alarm::{AlarmState, AlarmStatus, DeviceState, FenceDistance, Snapshot};
pub use form::{extract_nth_field, Digits, SENTINEL};
pub use indicator::IndicatorDriver;
pub use page::{PageBuffer, RenderError};
pub use request::{classify, RequestBuffer, RequestKind};
pub use sensors::{Monitor, Reading, SensorPoll, SensorSource};
pub use server::{ConnectionServer, ServeOutcome, ServerError};
pub use traits::{
    // Hardware
    DistanceSensor,
    Indicator,
    PinIndicator,
    TemperatureSensor,
    // Network
    Transport,
};

// Config re-exports
pub use config::{
    AlarmConfig, Config, DeviceConfig, IndicatorConfig, SensorConfig, ServerConfig, WifiConfig,
};
