//! VL53L0X time-of-flight sensor, single-shot ranging over I2C.
//!
//! Only the ranging path is implemented: the device is assumed to come out
//! of reset with its factory calibration, which is enough for the default
//! 30 ms timing budget. Each [`read_distance_mm`] call starts one
//! measurement, waits for it with a bounded poll, reads the result and clears
//! the interrupt.
//!
//! When nothing is in range the sensor reports 8190 or 8191 mm, which is
//! well above the "no object" threshold.
//!
//! [`read_distance_mm`]: crate::traits::DistanceSensor::read_distance_mm

use core::fmt;

use embedded_hal::i2c::I2c;

use crate::traits::DistanceSensor;

/// Factory 7-bit I2C address.
pub const DEFAULT_ADDRESS: u8 = 0x29;

const SYSRANGE_START: u8 = 0x00;
const SYSTEM_INTERRUPT_CLEAR: u8 = 0x0B;
const RESULT_INTERRUPT_STATUS: u8 = 0x13;
const RESULT_RANGE_MM: u8 = 0x14 + 10;
const STOP_VARIABLE: u8 = 0x91;
const IDENTIFICATION_MODEL_ID: u8 = 0xC0;

const MODEL_ID: u8 = 0xEE;
const DEFAULT_MAX_POLLS: u32 = 2000;

/// VL53L0X driver error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vl53l0xError<E> {
    /// Bus transfer failed.
    I2c(E),
    /// The model ID register did not read `0xEE`.
    WrongModel(u8),
    /// The measurement did not complete within the poll budget.
    Timeout,
}

impl<E: fmt::Debug> fmt::Display for Vl53l0xError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I2c(e) => write!(f, "VL53L0X bus error: {:?}", e),
            Self::WrongModel(id) => write!(f, "unexpected VL53L0X model id {:#04x}", id),
            Self::Timeout => write!(f, "VL53L0X measurement timed out"),
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug> std::error::Error for Vl53l0xError<E> {}

/// VL53L0X on an `embedded-hal` I2C bus.
///
/// # Example
///
/// ```rust,ignore
/// use fence_sentry::hal::Vl53l0x;
/// use fence_sentry::traits::DistanceSensor;
///
/// let mut tof = Vl53l0x::new(i2c);
/// tof.init()?;
/// let raw_mm = tof.read_distance_mm()?;
/// ```
pub struct Vl53l0x<I> {
    i2c: I,
    address: u8,
    stop_variable: u8,
    max_polls: u32,
}

impl<I: I2c> Vl53l0x<I> {
    /// Creates a driver at the factory address.
    pub fn new(i2c: I) -> Self {
        Self {
            i2c,
            address: DEFAULT_ADDRESS,
            stop_variable: 0,
            max_polls: DEFAULT_MAX_POLLS,
        }
    }

    /// Use a different 7-bit address.
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    /// Limit how many status reads one measurement may take.
    pub fn with_max_polls(mut self, polls: u32) -> Self {
        self.max_polls = polls.max(1);
        self
    }

    /// Check the model ID and latch the stop variable used to start ranging.
    pub fn init(&mut self) -> Result<(), Vl53l0xError<I::Error>> {
        let id = self.read_u8(IDENTIFICATION_MODEL_ID)?;
        if id != MODEL_ID {
            return Err(Vl53l0xError::WrongModel(id));
        }

        self.write_u8(0x80, 0x01)?;
        self.write_u8(0xFF, 0x01)?;
        self.write_u8(0x00, 0x00)?;
        self.stop_variable = self.read_u8(STOP_VARIABLE)?;
        self.write_u8(0x00, 0x01)?;
        self.write_u8(0xFF, 0x00)?;
        self.write_u8(0x80, 0x00)?;
        Ok(())
    }

    /// Perform one single-shot measurement and return the raw range.
    pub fn single_shot_mm(&mut self) -> Result<u16, Vl53l0xError<I::Error>> {
        self.write_u8(0x80, 0x01)?;
        self.write_u8(0xFF, 0x01)?;
        self.write_u8(0x00, 0x00)?;
        self.write_u8(STOP_VARIABLE, self.stop_variable)?;
        self.write_u8(0x00, 0x01)?;
        self.write_u8(0xFF, 0x00)?;
        self.write_u8(0x80, 0x00)?;

        self.write_u8(SYSRANGE_START, 0x01)?;
        self.poll_until(|this| Ok(this.read_u8(SYSRANGE_START)? & 0x01 == 0))?;
        self.poll_until(|this| Ok(this.read_u8(RESULT_INTERRUPT_STATUS)? & 0x07 != 0))?;

        let range = self.read_u16(RESULT_RANGE_MM)?;
        self.write_u8(SYSTEM_INTERRUPT_CLEAR, 0x01)?;
        Ok(range)
    }

    /// Release the bus.
    pub fn release(self) -> I {
        self.i2c
    }

    fn poll_until<F>(&mut self, mut done: F) -> Result<(), Vl53l0xError<I::Error>>
    where
        F: FnMut(&mut Self) -> Result<bool, Vl53l0xError<I::Error>>,
    {
        for _ in 0..self.max_polls {
            if done(self)? {
                return Ok(());
            }
        }
        Err(Vl53l0xError::Timeout)
    }

    fn write_u8(&mut self, register: u8, value: u8) -> Result<(), Vl53l0xError<I::Error>> {
        self.i2c
            .write(self.address, &[register, value])
            .map_err(Vl53l0xError::I2c)
    }

    fn read_u8(&mut self, register: u8) -> Result<u8, Vl53l0xError<I::Error>> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[register], &mut buf)
            .map_err(Vl53l0xError::I2c)?;
        Ok(buf[0])
    }

    fn read_u16(&mut self, register: u8) -> Result<u16, Vl53l0xError<I::Error>> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[register], &mut buf)
            .map_err(Vl53l0xError::I2c)?;
        Ok(u16::from_be_bytes(buf))
    }
}

impl<I: I2c> DistanceSensor for Vl53l0x<I> {
    type Error = Vl53l0xError<I::Error>;

    fn read_distance_mm(&mut self) -> Result<u16, Self::Error> {
        self.single_shot_mm()
    }
}
