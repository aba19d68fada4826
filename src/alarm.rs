//! Alarm state machine and the shared device state.
//!
//! The alarm has two states, [`AlarmStatus::Clear`] and
//! [`AlarmStatus::Triggered`], with asymmetric causality:
//!
//! - **Set** is level-triggered: the poll loop re-evaluates
//!   `distance <= fence` every cycle and latches the alarm.
//! - **Clear** is edge-triggered: only the reset button clears it, from an
//!   interrupt context, at any instant.
//!
//! # Clear Always Wins
//!
//! The flag and a clear generation counter share one atomic word. The poll
//! loop takes a [`Snapshot`], compares distance against the fence, and then
//! commits with a compare-exchange against that snapshot. A clear that lands
//! between the snapshot and the commit bumps the generation, so the commit
//! fails and the alarm stays clear until the next poll cycle re-evaluates.
//!
//! ```text
//!   poll loop                     reset ISR
//!   ---------                     ---------
//!   snap = snapshot()   (gen 4, clear)
//!                                 clear()   -> gen 5, clear
//!   distance <= fence ? yes
//!   try_trigger(snap)   -> CAS(gen 4) fails, stays clear
//! ```
//!
//! # Example
//!
//! ```rust
//! use fence_sentry::alarm::{AlarmStatus, DeviceState};
//!
//! static DEVICE: DeviceState = DeviceState::new(70);
//!
//! assert!(DEVICE.observe(65));
//! assert_eq!(DEVICE.alarm.status(), AlarmStatus::Triggered);
//!
//! // From the button interrupt
//! DEVICE.alarm.clear();
//! assert_eq!(DEVICE.alarm.status(), AlarmStatus::Clear);
//! ```

use core::sync::atomic::{AtomicI32, AtomicU32, Ordering};

use crate::config::AlarmConfig;

const TRIGGERED: u32 = 1;
const GENERATION_STEP: u32 = 2;

/// Observable alarm state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AlarmStatus {
    /// No object has crossed the fence since the last reset.
    #[default]
    Clear,
    /// An object was seen at or inside the fence; latched until reset.
    Triggered,
}

impl AlarmStatus {
    /// Returns true for [`Triggered`](Self::Triggered).
    #[inline]
    pub const fn is_triggered(self) -> bool {
        matches!(self, AlarmStatus::Triggered)
    }

    /// Returns the status as a lowercase string.
    pub const fn as_str(self) -> &'static str {
        match self {
            AlarmStatus::Clear => "clear",
            AlarmStatus::Triggered => "triggered",
        }
    }
}

/// Point-in-time view of the alarm word taken before a trigger decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Snapshot(u32);

impl Snapshot {
    /// Alarm status at the time of the snapshot.
    pub fn status(self) -> AlarmStatus {
        if self.0 & TRIGGERED != 0 {
            AlarmStatus::Triggered
        } else {
            AlarmStatus::Clear
        }
    }
}

/// Latched alarm flag shared between the poll loop and the reset interrupt.
///
/// Lock-free; safe to use from interrupt handlers. Never wrap it in a mutex.
#[derive(Debug)]
pub struct AlarmState {
    word: AtomicU32,
}

impl AlarmState {
    /// Create a clear alarm.
    pub const fn new() -> Self {
        Self {
            word: AtomicU32::new(0),
        }
    }

    /// Current alarm status.
    #[inline]
    pub fn status(&self) -> AlarmStatus {
        self.snapshot().status()
    }

    /// Returns true while the alarm is latched.
    #[inline]
    pub fn is_triggered(&self) -> bool {
        self.status().is_triggered()
    }

    /// Capture the alarm word before evaluating the fence condition.
    #[inline]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot(self.word.load(Ordering::Acquire))
    }

    /// Latch the alarm if nothing changed since `snapshot` was taken.
    ///
    /// Returns true only for an actual `Clear -> Triggered` transition. If the
    /// alarm was already triggered this is a no-op; if a clear happened after
    /// the snapshot the clear is kept.
    pub fn try_trigger(&self, snapshot: Snapshot) -> bool {
        if snapshot.status().is_triggered() {
            return false;
        }
        self.word
            .compare_exchange(
                snapshot.0,
                snapshot.0 | TRIGGERED,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Unconditionally clear the alarm.
    ///
    /// Called from the reset-button interrupt. Also starts a new clear
    /// generation so any trigger decision already in flight is discarded.
    /// Returns the status that was replaced.
    pub fn clear(&self) -> AlarmStatus {
        let mut current = self.word.load(Ordering::Relaxed);
        loop {
            let next = (current & !TRIGGERED).wrapping_add(GENERATION_STEP);
            match self.word.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(previous) => return Snapshot(previous).status(),
                Err(actual) => current = actual,
            }
        }
    }
}

impl Default for AlarmState {
    fn default() -> Self {
        Self::new()
    }
}

/// Fence threshold in millimeters, stored as a single atomic word.
///
/// Written only by the connection server after a successful field
/// extraction; read by the poll loop and the page renderer.
#[derive(Debug)]
pub struct FenceDistance {
    mm: AtomicI32,
}

impl FenceDistance {
    /// Create a fence at the given distance.
    pub const fn new(mm: i32) -> Self {
        Self {
            mm: AtomicI32::new(mm),
        }
    }

    /// Current fence distance in millimeters.
    #[inline]
    pub fn get(&self) -> i32 {
        self.mm.load(Ordering::Acquire)
    }

    /// Replace the fence distance, returning the previous value.
    #[inline]
    pub fn set(&self, mm: i32) -> i32 {
        self.mm.swap(mm, Ordering::AcqRel)
    }

    /// Returns true if a reading at `distance_mm` is at or inside the fence.
    #[inline]
    pub fn contains(&self, distance_mm: u16) -> bool {
        i32::from(distance_mm) <= self.get()
    }
}

/// The one device-wide state shared by every execution context.
///
/// `const`-constructible so firmware can keep it in a `static` that the
/// button interrupt can reach. All fields are atomics, so `&DeviceState` is
/// all any context needs.
#[derive(Debug)]
pub struct DeviceState {
    /// Latched alarm flag.
    pub alarm: AlarmState,
    /// Operator-configured fence.
    pub fence: FenceDistance,
}

impl DeviceState {
    /// Create device state with a clear alarm and the given fence.
    pub const fn new(fence_mm: i32) -> Self {
        Self {
            alarm: AlarmState::new(),
            fence: FenceDistance::new(fence_mm),
        }
    }

    /// Evaluate one poll-cycle distance against the fence.
    ///
    /// Returns true if this call moved the alarm from clear to triggered.
    pub fn observe(&self, distance_mm: u16) -> bool {
        let snapshot = self.alarm.snapshot();
        if snapshot.status().is_triggered() || !self.fence.contains(distance_mm) {
            return false;
        }
        self.alarm.try_trigger(snapshot)
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new(AlarmConfig::DEFAULT_FENCE_MM)
    }
}
