//! ESP32-C3 SuperMini board support for the proximity fence.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32-C3 SuperMini (RISC-V 160MHz, 4MB Flash)
//! - **Range sensor**: VL53L0X time-of-flight breakout (I2C)
//! - **Temperature**: on-die temperature sensor
//! - **Indicator**: onboard blue LED (active low)
//! - **Reset button**: BOOT button (active low)
//!
//! # Pin Assignments
//!
//! See the [`pins`] module for GPIO assignments matching the SuperMini layout.

mod button;
mod indicator;
mod temperature;
mod ticker;

pub use button::Esp32ResetButton;
pub use indicator::{led, Esp32Led};
pub use temperature::Esp32Temperature;
pub use ticker::start_indicator_timer;

#[cfg(feature = "wifi")]
mod transport;
#[cfg(feature = "wifi")]
mod wifi;
#[cfg(feature = "wifi")]
pub use transport::{Esp32Transport, Esp32TransportError};
#[cfg(feature = "wifi")]
pub use wifi::Esp32Wifi;

/// Pin assignments for SuperMini ESP32-C3.
pub mod pins {
    // =========================================================================
    // I2C Range Sensor (VL53L0X)
    // =========================================================================

    /// I2C data line
    pub const I2C_SDA: i32 = 6;

    /// I2C clock line
    pub const I2C_SCL: i32 = 7;

    /// VL53L0X factory address
    pub const TOF_I2C_ADDR: u8 = crate::hal::vl53l0x::DEFAULT_ADDRESS;

    // =========================================================================
    // Operator I/O
    // =========================================================================

    /// Onboard blue LED, active low
    pub const LED: i32 = 8;

    /// BOOT button, active low, used as the alarm reset
    pub const RESET_BUTTON: i32 = 9;
}
