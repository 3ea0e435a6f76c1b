//! Wire format of the telemetry frames.
//!
//! Each frame carries 8 ASCII bytes: module id digit, quantity tag digit, then the value
//! rendered as `%3.1f` in the remaining 6 bytes.
//!
//! | Byte | Content                                  |
//! |------|------------------------------------------|
//! | 0    | Module id, `'1'` - `'9'`                 |
//! | 1    | Quantity tag, see [`Quantity`]           |
//! | 2..8 | Value, one fractional digit, NUL filled  |
//!
//! Values needing more than 6 characters are cut on the right, so `-1234.5` goes out as
//! `-1234.`. The integer part survives up to 6 digits, beyond that the frame no longer carries
//! the true magnitude. See [`Payload::is_truncated`].

use core::fmt::Write;

use embedded_can::StandardId;
use strum_macros::{EnumCount, EnumIter};

use crate::{battery::Battery, convert::Role};

/// Frame data length.
pub const PAYLOAD_LEN: usize = 8;

/// Bytes available to the rendered value.
pub const VALUE_WIDTH: usize = PAYLOAD_LEN - 2;

/// Identifier all telemetry frames are sent with.
pub const FRAME_ID: StandardId = match StandardId::new(0x00C) {
    Some(id) => id,
    None => panic!("frame id out of range"),
};

/// Quantities published for each module, in publish order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumCount)]
#[repr(u8)]
pub enum Quantity {
    Voltage = 0,
    Current = 1,
    Temperature = 2,
    Power = 3,
}

impl Quantity {
    /// Tag digit written to byte 1 of the payload.
    pub const fn tag(self) -> u8 {
        self as u8
    }

    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Quantity::Voltage),
            1 => Some(Quantity::Current),
            2 => Some(Quantity::Temperature),
            3 => Some(Quantity::Power),
            _ => None,
        }
    }

    /// Current value of this quantity for `battery`.
    pub fn read(self, battery: &Battery) -> f32 {
        match self {
            Quantity::Voltage => battery.voltage(),
            Quantity::Current => battery.current(),
            Quantity::Temperature => battery.temperature(),
            Quantity::Power => battery.power(),
        }
    }
}

impl From<Role> for Quantity {
    fn from(role: Role) -> Self {
        match role {
            Role::Voltage => Quantity::Voltage,
            Role::Current => Quantity::Current,
            Role::Temperature => Quantity::Temperature,
        }
    }
}

/// One encoded frame payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payload {
    bytes: [u8; PAYLOAD_LEN],
    truncated: bool,
}

impl Payload {
    pub fn encode(battery_id: u8, quantity: Quantity, value: f32) -> Self {
        let mut bytes = [0u8; PAYLOAD_LEN];
        bytes[0] = b'0' + battery_id % 10;
        bytes[1] = b'0' + quantity.tag();

        // An f32 renders in at most 42 bytes with one fractional digit.
        let mut rendered: heapless::String<48> = heapless::String::new();
        let _ = write!(rendered, "{:3.1}", value);

        let text = rendered.as_bytes();
        let len = text.len().min(VALUE_WIDTH);
        bytes[2..2 + len].copy_from_slice(&text[..len]);

        Self {
            bytes,
            truncated: text.len() > VALUE_WIDTH,
        }
    }

    pub fn as_bytes(&self) -> &[u8; PAYLOAD_LEN] {
        &self.bytes
    }

    /// Whether the rendered value did not fit in [`VALUE_WIDTH`] bytes.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Payload text up to the NUL fill.
    pub fn text(&self) -> &str {
        let end = self
            .bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(PAYLOAD_LEN);
        core::str::from_utf8(&self.bytes[..end]).unwrap_or("")
    }
}

/// A decoded telemetry frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub battery_id: u8,
    pub quantity: Quantity,
    pub value: f32,
}

impl Reading {
    /// Decode a frame payload. Returns `None` for anything not produced by
    /// [`Payload::encode`].
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() != PAYLOAD_LEN {
            return None;
        }
        let battery_id = ascii_digit(data[0])?;
        let quantity = Quantity::from_tag(ascii_digit(data[1])?)?;

        let field = &data[2..];
        let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
        let text = core::str::from_utf8(&field[..end]).ok()?;
        let value = text.trim().parse::<f32>().ok()?;

        Some(Self {
            battery_id,
            quantity,
            value,
        })
    }
}

fn ascii_digit(byte: u8) -> Option<u8> {
    byte.is_ascii_digit().then(|| byte - b'0')
}
