//! Alarm reset button on a falling-edge GPIO interrupt.

use esp_idf_hal::gpio::{AnyIOPin, Input, InterruptType, PinDriver, Pull};
use esp_idf_hal::sys::EspError;

use crate::alarm::DeviceState;

/// Reset button that clears the alarm straight from the GPIO ISR.
///
/// The ISR only touches the alarm atomics. ESP-IDF disarms a GPIO
/// interrupt after it fires, so the main loop calls [`rearm`](Self::rearm)
/// once per poll cycle.
///
/// # Example
///
/// ```ignore
/// use fence_sentry::alarm::DeviceState;
/// use fence_sentry::hal::esp32::Esp32ResetButton;
///
/// static DEVICE: DeviceState = DeviceState::new(70);
///
/// let mut button = Esp32ResetButton::new(peripherals.pins.gpio9.into(), &DEVICE)?;
/// loop {
///     button.rearm()?;
///     // ...
/// }
/// ```
pub struct Esp32ResetButton {
    pin: PinDriver<'static, AnyIOPin, Input>,
}

impl Esp32ResetButton {
    /// Configure the pin with a pull-up and attach the clearing ISR.
    pub fn new(pin: AnyIOPin, state: &'static DeviceState) -> Result<Self, EspError> {
        let mut pin = PinDriver::input(pin)?;
        pin.set_pull(Pull::Up)?;
        pin.set_interrupt_type(InterruptType::NegEdge)?;

        // SAFETY: the callback runs in ISR context and only performs atomic
        // operations on a 'static DeviceState.
        unsafe {
            pin.subscribe(move || {
                state.alarm.clear();
            })?;
        }
        pin.enable_interrupt()?;

        Ok(Self { pin })
    }

    /// Re-enable the interrupt after it has fired.
    #[inline]
    pub fn rearm(&mut self) -> Result<(), EspError> {
        self.pin.enable_interrupt()
    }

    /// Returns true while the button is held down.
    pub fn is_pressed(&self) -> bool {
        self.pin.is_low()
    }
}
