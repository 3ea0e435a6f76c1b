//! This module is used to define the command registers of the MAX1228 ADC.
//!
//! Every byte clocked into the converter is a command. The leading bits select which register
//! the byte is written to:
//! * `1xxx_xxxx` - Conversion register.
//! * `01xx_xxxx` - Setup register.
//!
//! Other registers (averaging, reset) are not used by this firmware.

use modular_bitfield::prelude::*;

/// Size of one converter response. Status byte, two code bytes and one trailing byte.
pub const RX_BUFFER_SIZE: usize = 4;

/// Number of bytes clocked out per conversion request.
pub const REQUEST_SIZE: usize = 2;

/// Conversion request for channel 0, see [`ConversionByte`].
pub const REQUEST_BASE: u8 = 0x80;

/// Increment between conversion requests of neighbouring channels. One step of the channel
/// select field at bit 3.
pub const REQUEST_STRIDE: u8 = 0x08;

/// __W__ - Conversion register.
///
/// Writing this starts a conversion of the selected channel.
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionByte {
    /// Measure the internal temperature sensor along with the conversion.
    pub internal_temp: bool,
    /// Scan mode.
    /// * `0b00` - Scan channels 0 through `channel`.
    /// * `0b01` - Scan `channel` through the highest channel.
    /// * `0b10` - Repeat `channel`.
    /// * `0b11` - No scan, convert `channel` once.
    pub scan: B2,
    /// Channel select. `0` - `15`.
    pub channel: B4,
    /// Must be set for this byte to address the conversion register.
    pub start: bool,
}

impl ConversionByte {
    /// Conversion request as issued for `channel`.
    pub fn for_channel(channel: u8) -> Self {
        Self::new().with_start(true).with_channel(channel & 0x0F)
    }

    pub fn to_byte(self) -> u8 {
        self.into_bytes()[0]
    }
}

/// __W__ - Setup register.
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupByte {
    /// Differential/unipolar select.
    /// * `0b00`/`0b01` - No data follows.
    /// * `0b10` - Unipolar mode byte follows.
    /// * `0b11` - Bipolar mode byte follows.
    pub diff_select: B2,
    /// Reference mode select.
    /// * `0b01` - External single ended reference, internal reference off.
    pub ref_select: B2,
    /// Clock mode select.
    /// * `0b11` - External clock, conversions timed by CNVST.
    pub clock_select: B2,
    /// Register identifier, must be `0b01`.
    pub identifier: B2,
}

/// Setup register command written at startup, see [`SetupByte::startup`].
pub const SETUP_COMMAND: u8 = 0x76;

impl SetupByte {
    /// External clock, external single ended reference, unipolar mode byte follows.
    pub fn startup() -> Self {
        Self::from_bytes([SETUP_COMMAND])
    }
}

/// Unipolar mode byte following [`SETUP_COMMAND`]. All channels single ended unipolar.
pub const UNIPOLAR_ALL_SINGLE_ENDED: u8 = 0x00;

/// Arithmetic sequence of conversion requests for one sweep.
///
/// Starts at [`REQUEST_BASE`] and advances by [`REQUEST_STRIDE`] per channel. A fresh sequence
/// is taken for every sweep so the token never carries over between cycles.
#[derive(Debug, Clone)]
pub struct RequestSequence {
    next: u8,
}

impl RequestSequence {
    pub const fn new() -> Self {
        Self { next: REQUEST_BASE }
    }
}

impl Default for RequestSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for RequestSequence {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        let token = self.next;
        self.next = self.next.wrapping_add(REQUEST_STRIDE);
        Some(token)
    }
}
