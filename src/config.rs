//! Calibration constants and timing for the acquisition pipeline.
//!
//! All values are compile time constants. [`Calibration`] and [`Timing`] collect them so they
//! can be overridden through the `with_*` builders on the pipeline types.

use fugit::MillisDurationU32;

/// Millivolts per ADC count. 5V external reference over 4096 counts, rounded as the board
/// was calibrated against it.
pub const ADC_MULTIPLIER_MV: f32 = 1.2;

/// Gain of the module voltage divider fit. Volts per sensed volt.
pub const VOLTAGE_GAIN: f32 = 25.386;

/// Offset of the module voltage divider fit, in volts.
pub const VOLTAGE_OFFSET_V: f32 = 5.2756;

/// Sensor output at zero current, in volts.
pub const CURRENT_BIAS_V: f32 = 2.5039;

/// Amps per sensed volt away from [`CURRENT_BIAS_V`].
pub const CURRENT_GAIN: f32 = 200.0;

/// Minimum gap between two frames on the CAN bus.
pub const FRAME_SPACING: MillisDurationU32 = MillisDurationU32::millis(20);

/// Idle time after each publish pass before the next sweep starts.
pub const CYCLE_PERIOD: MillisDurationU32 = MillisDurationU32::millis(100);

/// Empirical two-point calibration of the analog front end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// Millivolts per raw ADC count.
    pub adc_multiplier_mv: f32,
    /// Module voltage = `voltage_gain * sensed - voltage_offset`.
    pub voltage_gain: f32,
    /// Volts.
    pub voltage_offset: f32,
    /// Module current = `(sensed - current_bias) * current_gain`. Volts.
    pub current_bias: f32,
    /// Amps per volt.
    pub current_gain: f32,
}

impl Calibration {
    pub const fn new() -> Self {
        Self {
            adc_multiplier_mv: ADC_MULTIPLIER_MV,
            voltage_gain: VOLTAGE_GAIN,
            voltage_offset: VOLTAGE_OFFSET_V,
            current_bias: CURRENT_BIAS_V,
            current_gain: CURRENT_GAIN,
        }
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::new()
    }
}

/// Delays driving the cycle cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub frame_spacing: MillisDurationU32,
    pub cycle_period: MillisDurationU32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            frame_spacing: FRAME_SPACING,
            cycle_period: CYCLE_PERIOD,
        }
    }
}
