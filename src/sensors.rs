//! Sensor sampling: one [`Reading`] per poll cycle.
//!
//! [`SensorSource`] wraps a [`DistanceSensor`] and a [`TemperatureSensor`]
//! behind a single `read()` call and applies the device's conversions:
//!
//! - distance: raw range minus the calibration offset, in 16-bit wrapping
//!   arithmetic (a raw range below the offset wraps high and renders as
//!   "no object")
//! - temperature: `f = c * 1.8 + 32`, truncated to its low 8 bits
//!
//! A failed device read is not an error at this layer. The affected field
//! keeps its previous value and the failure is logged.
//!
//! [`Monitor`] is the poll loop body: read the sensors, then feed the
//! distance into the alarm.

use log::{debug, warn};

use crate::alarm::DeviceState;
use crate::config::SensorConfig;
use crate::traits::{DistanceSensor, TemperatureSensor};

/// Ranges above this many millimeters mean nothing is in view.
pub const NO_OBJECT_THRESHOLD_MM: u16 = 2000;

/// One captured pair of sensor values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    /// Calibrated distance in millimeters.
    pub distance_mm: u16,
    /// Temperature in degrees Fahrenheit (8-bit).
    pub temperature_f: u8,
}

impl Reading {
    /// Create a reading from already-converted values.
    pub const fn new(distance_mm: u16, temperature_f: u8) -> Self {
        Self {
            distance_mm,
            temperature_f,
        }
    }

    /// Returns true if the range is too far to report an object.
    #[inline]
    pub const fn no_object(&self) -> bool {
        self.distance_mm > NO_OBJECT_THRESHOLD_MM
    }
}

/// Convert whole degrees Celsius to Fahrenheit, keeping the low 8 bits.
///
/// Computed in integers (`c * 9 / 5` truncates exactly like `c * 1.8`).
/// Inputs above 124 °C exceed 255 °F and wrap.
///
/// ```
/// use fence_sentry::sensors::celsius_to_fahrenheit;
///
/// assert_eq!(celsius_to_fahrenheit(0), 32);
/// assert_eq!(celsius_to_fahrenheit(25), 77);
/// assert_eq!(celsius_to_fahrenheit(142), 31); // 287 wraps
/// ```
pub fn celsius_to_fahrenheit(celsius: u8) -> u8 {
    let fahrenheit = u32::from(celsius) * 9 / 5 + 32;
    fahrenheit as u8
}

/// Sensor pair with calibration and last-known-good retention.
pub struct SensorSource<D, T> {
    distance: D,
    temperature: T,
    calibration_offset_mm: u16,
    last: Reading,
}

impl<D: DistanceSensor, T: TemperatureSensor> SensorSource<D, T> {
    /// Create a sensor source with the given calibration.
    pub fn new(distance: D, temperature: T, config: &SensorConfig) -> Self {
        Self {
            distance,
            temperature,
            calibration_offset_mm: config.calibration_offset_mm,
            last: Reading::default(),
        }
    }

    /// Sample both sensors and return the updated reading.
    ///
    /// Temperature is read first, then distance. Either failing leaves its
    /// field at the previous value.
    pub fn read(&mut self) -> Reading {
        match self.temperature.read_temperature_c() {
            Ok(celsius) => self.last.temperature_f = celsius_to_fahrenheit(celsius),
            Err(e) => warn!("temperature read failed, keeping previous: {:?}", e),
        }

        match self.distance.read_distance_mm() {
            Ok(raw) => {
                self.last.distance_mm = raw.wrapping_sub(self.calibration_offset_mm);
            }
            Err(e) => warn!("distance read failed, keeping previous: {:?}", e),
        }

        debug!(
            "reading: {} mm, {} F",
            self.last.distance_mm, self.last.temperature_f
        );
        self.last
    }

    /// The most recent reading without sampling.
    #[inline]
    pub fn last(&self) -> Reading {
        self.last
    }

    /// Release the underlying sensors.
    pub fn into_inner(self) -> (D, T) {
        (self.distance, self.temperature)
    }
}

/// Anything the connection server can hand control back to between accepts.
///
/// Called once before each accept wait and again after every accept timeout.
pub trait SensorPoll {
    /// Run one poll cycle and return the reading to show on the page.
    fn poll(&mut self, state: &DeviceState) -> Reading;

    /// The reading captured by the latest poll.
    fn latest(&self) -> Reading;
}

/// The sensor poll loop body: sample, then evaluate the fence.
pub struct Monitor<D, T> {
    sensors: SensorSource<D, T>,
}

impl<D: DistanceSensor, T: TemperatureSensor> Monitor<D, T> {
    /// Create a monitor over a sensor source.
    pub fn new(sensors: SensorSource<D, T>) -> Self {
        Self { sensors }
    }

    /// Access the underlying sensor source.
    pub fn sensors(&self) -> &SensorSource<D, T> {
        &self.sensors
    }

    /// Release the sensor source.
    pub fn into_inner(self) -> SensorSource<D, T> {
        self.sensors
    }
}

impl<D: DistanceSensor, T: TemperatureSensor> SensorPoll for Monitor<D, T> {
    fn poll(&mut self, state: &DeviceState) -> Reading {
        let reading = self.sensors.read();
        if state.observe(reading.distance_mm) {
            warn!(
                "ALARM: object at {} mm is inside the {} mm fence",
                reading.distance_mm,
                state.fence.get()
            );
        }
        reading
    }

    fn latest(&self) -> Reading {
        self.sensors.last()
    }
}
