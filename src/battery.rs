//! Per-module battery state.

use crate::convert::Role;

/// Number of battery modules on the bank.
pub const BATTERY_COUNT: usize = 3;

/// Last sampled state of one battery module.
///
/// Values are overwritten as is, no range checks are applied. Fields start at zero until the
/// first sweep sets them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Battery {
    /// Module number as published on the bus. One decimal digit.
    id: u8,
    /// Volts.
    voltage: f32,
    /// Amps.
    current: f32,
    temperature: f32,
}

impl Battery {
    pub const fn new(id: u8) -> Self {
        Self {
            id,
            voltage: 0.0,
            current: 0.0,
            temperature: 0.0,
        }
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn voltage(&self) -> f32 {
        self.voltage
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Instantaneous power in watts, computed from the latest voltage and current.
    pub fn power(&self) -> f32 {
        self.voltage * self.current
    }

    pub fn set_voltage(&mut self, voltage: f32) {
        self.voltage = voltage;
    }

    pub fn set_current(&mut self, current: f32) {
        self.current = current;
    }

    pub fn set_temperature(&mut self, temperature: f32) {
        self.temperature = temperature;
    }

    /// Store a converted sample in the field matching its role.
    pub fn record(&mut self, role: Role, value: f32) {
        match role {
            Role::Voltage => self.set_voltage(value),
            Role::Current => self.set_current(value),
            Role::Temperature => self.set_temperature(value),
        }
    }
}

/// The fixed set of modules, stored in ascending id order.
///
/// Slot position and module id are kept apart, the channel map addresses slots and frames
/// carry ids.
#[derive(Debug, Clone, PartialEq)]
pub struct BatteryBank {
    batteries: [Battery; BATTERY_COUNT],
}

impl BatteryBank {
    /// Modules numbered `1` through [`BATTERY_COUNT`].
    pub const fn new() -> Self {
        Self {
            batteries: [Battery::new(1), Battery::new(2), Battery::new(3)],
        }
    }

    pub fn slot(&self, slot: usize) -> Option<&Battery> {
        self.batteries.get(slot)
    }

    pub fn slot_mut(&mut self, slot: usize) -> Option<&mut Battery> {
        self.batteries.get_mut(slot)
    }

    pub fn by_id(&self, id: u8) -> Option<&Battery> {
        self.batteries.iter().find(|battery| battery.id == id)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Battery> {
        self.batteries.iter()
    }
}

impl Default for BatteryBank {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a BatteryBank {
    type Item = &'a Battery;
    type IntoIter = core::slice::Iter<'a, Battery>;

    fn into_iter(self) -> Self::IntoIter {
        self.batteries.iter()
    }
}
