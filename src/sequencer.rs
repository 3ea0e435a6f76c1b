//! Channel sweep over the converter bus.

use log::{debug, info, trace, warn};

use crate::{
    battery::BatteryBank,
    bus::{AdcBus, BusGuard},
    channel::{CHANNEL_COUNT, CHANNEL_MAP},
    convert::{raw_code, Converter, PassThrough, TemperatureCurve},
    error::{Error, Result},
    registers::{RequestSequence, SetupByte, REQUEST_SIZE, RX_BUFFER_SIZE, UNIPOLAR_ALL_SINGLE_ENDED},
};

/// Reads every converter channel once per sweep and stores the converted values in the bank.
pub struct Sequencer<B: AdcBus, T: TemperatureCurve = PassThrough> {
    bus: B,
    converter: Converter<T>,
}

impl<B: AdcBus, T: TemperatureCurve> Sequencer<B, T> {
    pub fn new(bus: B, converter: Converter<T>) -> Self {
        Self { bus, converter }
    }

    pub fn converter(&self) -> &Converter<T> {
        &self.converter
    }

    /// Return the bus, consuming the sequencer.
    pub fn release(self) -> B {
        self.bus
    }

    /// Configure the converter: external clock and reference, all channels unipolar single
    /// ended.
    pub fn setup(&mut self) -> Result<(), B::Error> {
        let mut bus = BusGuard::acquire(&mut self.bus).map_err(Error::Setup)?;
        bus.write(&SetupByte::startup().into_bytes())
            .map_err(Error::Setup)?;
        bus.write(&[UNIPOLAR_ALL_SINGLE_ENDED])
            .map_err(Error::Setup)?;
        info!("ADC configured");
        Ok(())
    }

    /// Sample channels `0..CHANNEL_COUNT` in order while holding the bus.
    ///
    /// A transport error stops the sweep at the failing channel. Values stored for earlier
    /// channels stay, later channels keep what the previous sweep left.
    pub fn sweep(&mut self, bank: &mut BatteryBank) -> Result<(), B::Error> {
        let converter = &self.converter;
        let mut bus = BusGuard::acquire(&mut self.bus).map_err(Error::Transport)?;

        for (channel, token) in RequestSequence::new().take(CHANNEL_COUNT).enumerate() {
            let raw = match Self::sample(&mut bus, token) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Sweep aborted at channel {}: {:?}", channel, e);
                    return Err(Error::Transport(e));
                }
            };

            let assignment = CHANNEL_MAP[channel];
            let value = converter.convert(raw, assignment.role);
            debug!(
                "ch{}: raw {} -> {:?} {}",
                channel, raw, assignment.role, value
            );

            if let Some(battery) = bank.slot_mut(assignment.slot) {
                battery.record(assignment.role, value);
            }
        }

        Ok(())
    }

    fn sample(bus: &mut B, token: u8) -> core::result::Result<u16, B::Error> {
        let request: [u8; REQUEST_SIZE] = [token, 0x00];
        let mut response = [0u8; RX_BUFFER_SIZE];
        bus.transact(&request, &mut response)?;
        trace!("request {:#04x}: response {:02x?}", token, response);
        Ok(raw_code(&response))
    }
}
