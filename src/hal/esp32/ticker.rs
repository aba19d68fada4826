//! Periodic `esp_timer` tick driving the alarm indicator.

use core::time::Duration;

use esp_idf_hal::sys::EspError;
use esp_idf_svc::timer::{EspTaskTimerService, EspTimer};

use crate::alarm::DeviceState;
use crate::indicator::IndicatorDriver;
use crate::traits::Indicator;

/// Start ticking `driver` every `period_ms` against `state`.
///
/// The returned timer must be kept alive; dropping it stops the blink.
pub fn start_indicator_timer<I>(
    mut driver: IndicatorDriver<I>,
    state: &'static DeviceState,
    period_ms: u32,
) -> Result<EspTimer<'static>, EspError>
where
    I: Indicator + Send + 'static,
{
    let service = EspTaskTimerService::new()?;
    let timer = service.timer(move || {
        driver.tick(&state.alarm);
    })?;
    timer.every(Duration::from_millis(u64::from(period_ms)))?;
    Ok(timer)
}
