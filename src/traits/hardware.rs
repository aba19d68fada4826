//! Hardware abstraction traits for the sensors and the alarm indicator.
//!
//! This module defines the device-facing interfaces that allow fence-sentry to
//! run against real peripherals (ESP32, VL53L0X) or desktop mocks.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`DistanceSensor`] | Single-shot time-of-flight ranging |
//! | [`TemperatureSensor`] | Ambient temperature in whole degrees Celsius |
//! | [`Indicator`] | One binary visual output (the alarm LED) |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. For ESP32 hardware, use the
//! implementations from `hal::esp32` (requires `esp32` feature).
//!
//! # Example
//!
//! ```rust
//! use fence_sentry::traits::DistanceSensor;
//! use fence_sentry::hal::MockDistance;
//!
//! let mut sensor = MockDistance::new();
//! sensor.queue_mm(&[140]);
//! assert_eq!(sensor.read_distance_mm(), Ok(140));
//! ```

use embedded_hal::digital::StatefulOutputPin;

/// Time-of-flight distance sensor.
///
/// One call performs one complete ranging measurement. Implementations may
/// block for the device's measurement time but must not block indefinitely.
///
/// The value is the raw range reported by the device. Calibration is applied
/// by [`SensorSource`](crate::sensors::SensorSource), not here.
pub trait DistanceSensor {
    /// Error type for ranging failures.
    type Error: core::fmt::Debug;

    /// Perform a single-shot ranging measurement, in millimeters.
    fn read_distance_mm(&mut self) -> Result<u16, Self::Error>;
}

/// Temperature sensor reporting whole degrees Celsius.
pub trait TemperatureSensor {
    /// Error type for read failures.
    type Error: core::fmt::Debug;

    /// Read the current temperature in degrees Celsius.
    fn read_temperature_c(&mut self) -> Result<u8, Self::Error>;
}

/// A single binary visual output.
///
/// Driven from the indicator tick context only. Implementations should be
/// cheap enough to call from a timer callback.
pub trait Indicator {
    /// Error type for output failures.
    type Error: core::fmt::Debug;

    /// Drive the output to the given level (`true` = lit).
    fn set_lit(&mut self, lit: bool) -> Result<(), Self::Error>;

    /// Convenience method to switch the output off.
    fn turn_off(&mut self) -> Result<(), Self::Error> {
        self.set_lit(false)
    }
}

/// Adapter exposing any `embedded-hal` stateful output pin as an [`Indicator`].
///
/// Set `active_low` for LEDs wired between the supply and the pin.
///
/// # Example
///
/// ```rust,ignore
/// use fence_sentry::traits::{Indicator, PinIndicator};
///
/// let led = PinDriver::output(peripherals.pins.gpio8)?;
/// let mut indicator = PinIndicator::active_low(led);
/// indicator.set_lit(true)?;
/// ```
pub struct PinIndicator<P> {
    pin: P,
    active_low: bool,
}

impl<P: StatefulOutputPin> PinIndicator<P> {
    /// Wrap a pin that lights the indicator when driven high.
    pub fn active_high(pin: P) -> Self {
        Self {
            pin,
            active_low: false,
        }
    }

    /// Wrap a pin that lights the indicator when driven low.
    pub fn active_low(pin: P) -> Self {
        Self {
            pin,
            active_low: true,
        }
    }

    /// Returns true if the pin is currently driving the lit level.
    pub fn is_lit(&mut self) -> Result<bool, P::Error> {
        let high = self.pin.is_set_high()?;
        Ok(high != self.active_low)
    }

    /// Release the underlying pin.
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: StatefulOutputPin> Indicator for PinIndicator<P> {
    type Error = P::Error;

    fn set_lit(&mut self, lit: bool) -> Result<(), Self::Error> {
        if lit != self.active_low {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        }
    }
}
