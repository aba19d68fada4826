//! Onboard LED as the alarm indicator.

use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};
use esp_idf_hal::sys::EspError;

use crate::traits::PinIndicator;

/// The SuperMini's active-low LED behind the [`Indicator`] trait.
///
/// [`Indicator`]: crate::traits::Indicator
pub type Esp32Led = PinIndicator<PinDriver<'static, AnyOutputPin, Output>>;

/// Configure `pin` as an active-low indicator, initially off.
///
/// # Example
///
/// ```ignore
/// use fence_sentry::hal::esp32::led;
///
/// let led = led(peripherals.pins.gpio8.into())?;
/// ```
pub fn led(pin: AnyOutputPin) -> Result<Esp32Led, EspError> {
    let mut driver = PinDriver::output(pin)?;
    driver.set_high()?;
    Ok(PinIndicator::active_low(driver))
}
