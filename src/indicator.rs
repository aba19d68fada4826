//! Alarm indicator blink driver.
//!
//! Driven by a fixed-period tick. While the alarm is triggered every tick
//! toggles the output; otherwise every tick forces it off. With a 1000 ms
//! tick the visible blink period is 2 s.

use log::warn;

use crate::alarm::AlarmState;
use crate::traits::Indicator;

/// Tick-driven indicator state.
pub struct IndicatorDriver<I> {
    output: I,
    lit: bool,
    ticks: u32,
}

impl<I: Indicator> IndicatorDriver<I> {
    /// Create a driver with the output assumed off.
    pub fn new(output: I) -> Self {
        Self {
            output,
            lit: false,
            ticks: 0,
        }
    }

    /// Advance one tick against the current alarm state.
    ///
    /// Returns the phase after the tick. A failed output write is logged and
    /// the phase is still advanced, so the next tick retries the pin.
    pub fn tick(&mut self, alarm: &AlarmState) -> bool {
        self.ticks = self.ticks.wrapping_add(1);
        self.lit = alarm.is_triggered() && !self.lit;
        if let Err(e) = self.output.set_lit(self.lit) {
            warn!("indicator write failed: {:?}", e);
        }
        self.lit
    }

    /// Current output phase.
    #[inline]
    pub fn is_lit(&self) -> bool {
        self.lit
    }

    /// Number of ticks processed.
    #[inline]
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Access the output.
    pub fn output(&self) -> &I {
        &self.output
    }

    /// Release the output.
    pub fn into_inner(self) -> I {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::DeviceState;
    use crate::hal::MockIndicator;

    #[test]
    fn stays_off_while_clear() {
        let state = DeviceState::new(70);
        let mut driver = IndicatorDriver::new(MockIndicator::new());
        for _ in 0..4 {
            assert!(!driver.tick(&state.alarm));
        }
        assert!(driver.output().history().iter().all(|lit| !lit));
        assert_eq!(driver.ticks(), 4);
    }

    #[test]
    fn blinks_while_triggered() {
        let state = DeviceState::new(70);
        state.observe(10);
        let mut driver = IndicatorDriver::new(MockIndicator::new());
        let phases: Vec<bool> = (0..4).map(|_| driver.tick(&state.alarm)).collect();
        assert_eq!(phases, [true, false, true, false]);
    }

    #[test]
    fn clear_forces_off_on_next_tick() {
        let state = DeviceState::new(70);
        state.observe(10);
        let mut driver = IndicatorDriver::new(MockIndicator::new());
        assert!(driver.tick(&state.alarm));

        state.alarm.clear();
        assert!(!driver.tick(&state.alarm));
        assert!(!driver.tick(&state.alarm));
        assert!(!driver.output().is_lit());
    }

    #[test]
    fn polls_do_not_touch_phase() {
        let state = DeviceState::new(70);
        state.observe(10);
        let mut driver = IndicatorDriver::new(MockIndicator::new());
        driver.tick(&state.alarm);

        // Repeated triggering observations between ticks
        state.observe(10);
        state.observe(5);
        assert!(driver.is_lit());
        assert!(!driver.tick(&state.alarm));
    }

    #[test]
    fn write_failure_still_advances_phase() {
        let state = DeviceState::new(70);
        state.observe(10);
        let mut output = MockIndicator::new();
        output.fail_writes(true);
        let mut driver = IndicatorDriver::new(output);
        assert!(driver.tick(&state.alarm));
        assert!(!driver.tick(&state.alarm));
    }
}
