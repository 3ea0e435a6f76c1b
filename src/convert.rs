//! Conversion from raw ADC codes into physical units.
//!
//! Every function here is pure, bus I/O lives in [`crate::sequencer`].

use strum_macros::{EnumCount, EnumIter};

use crate::config::Calibration;
use crate::registers::RX_BUFFER_SIZE;

/// What a converter channel measures.
///
/// Channels are wired in repeating voltage, current, temperature order, so the role of a
/// channel is `channel % 3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumCount)]
#[repr(u8)]
pub enum Role {
    Voltage = 0,
    Current = 1,
    Temperature = 2,
}

impl Role {
    /// Role of a converter channel.
    pub const fn of_channel(channel: usize) -> Self {
        match channel % 3 {
            0 => Role::Voltage,
            1 => Role::Current,
            _ => Role::Temperature,
        }
    }
}

/// Extract the raw code from a converter response.
///
/// Byte 0 is clocked out while the request is still being shifted in and is ignored. The code
/// follows big-endian in bytes 1 and 2.
pub const fn raw_code(response: &[u8; RX_BUFFER_SIZE]) -> u16 {
    u16::from_be_bytes([response[1], response[2]])
}

/// Maps sensed volts at a temperature channel onto a temperature.
pub trait TemperatureCurve {
    fn to_temperature(&self, sensed_v: f32) -> f32;
}

/// No calibration data exists for the temperature sensors yet, the sensed voltage is
/// published as is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassThrough;

impl TemperatureCurve for PassThrough {
    #[inline]
    fn to_temperature(&self, sensed_v: f32) -> f32 {
        sensed_v
    }
}

/// Turns raw codes into module voltage (V), current (A) and temperature.
#[derive(Debug, Clone, Copy)]
pub struct Converter<T: TemperatureCurve = PassThrough> {
    calibration: Calibration,
    temperature: T,
}

impl Converter<PassThrough> {
    pub const fn new(calibration: Calibration) -> Self {
        Self {
            calibration,
            temperature: PassThrough,
        }
    }
}

impl Default for Converter<PassThrough> {
    fn default() -> Self {
        Self::new(Calibration::new())
    }
}

impl<T: TemperatureCurve> Converter<T> {
    /// Swap the temperature curve, keeping the calibration.
    pub fn with_temperature_curve<U: TemperatureCurve>(self, curve: U) -> Converter<U> {
        Converter {
            calibration: self.calibration,
            temperature: curve,
        }
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Raw code as volts at the converter input.
    #[inline]
    pub fn sensed_volts(&self, raw: u16) -> f32 {
        raw as f32 * self.calibration.adc_multiplier_mv / 1000.0
    }

    /// Module voltage in volts.
    pub fn voltage(&self, raw: u16) -> f32 {
        self.calibration.voltage_gain * self.sensed_volts(raw) - self.calibration.voltage_offset
    }

    /// Module current in amps. Negative when below the sensor bias point.
    pub fn current(&self, raw: u16) -> f32 {
        (self.sensed_volts(raw) - self.calibration.current_bias) * self.calibration.current_gain
    }

    pub fn temperature(&self, raw: u16) -> f32 {
        self.temperature.to_temperature(self.sensed_volts(raw))
    }

    /// Convert a raw code according to the role of the channel it came from.
    pub fn convert(&self, raw: u16, role: Role) -> f32 {
        match role {
            Role::Voltage => self.voltage(raw),
            Role::Current => self.current(raw),
            Role::Temperature => self.temperature(raw),
        }
    }
}
