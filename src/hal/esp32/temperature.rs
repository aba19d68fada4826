//! On-die temperature sensor.

use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::sys::EspError;
use esp_idf_hal::temp_sensor::{TempSensor, TempSensorConfig, TempSensorDriver};

use crate::traits::TemperatureSensor;

/// ESP32-C3 internal temperature sensor in whole degrees Celsius.
///
/// The die runs warmer than ambient, so readings are an upper bound on the
/// enclosure temperature. Negative readings clamp to 0.
pub struct Esp32Temperature {
    driver: TempSensorDriver<'static>,
}

impl Esp32Temperature {
    /// Enable the sensor with the default measurement range.
    pub fn new(sensor: impl Peripheral<P = TempSensor> + 'static) -> Result<Self, EspError> {
        let mut driver = TempSensorDriver::new(&TempSensorConfig::default(), sensor)?;
        driver.enable()?;
        Ok(Self { driver })
    }
}

impl TemperatureSensor for Esp32Temperature {
    type Error = EspError;

    fn read_temperature_c(&mut self) -> Result<u8, EspError> {
        let celsius = self.driver.get_celsius()?;
        Ok(celsius.clamp(0.0, f32::from(u8::MAX)) as u8)
    }
}
