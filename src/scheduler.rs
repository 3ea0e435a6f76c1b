//! The main acquisition and publish loop.

use core::convert::Infallible;

use embedded_can::blocking::Can;
use embedded_hal::delay::DelayNs;
use fugit::MillisDurationU32;
use log::{error, warn};

use crate::{
    battery::BatteryBank,
    bus::AdcBus,
    config::{Timing, CYCLE_PERIOD},
    convert::{PassThrough, TemperatureCurve},
    error::{Error, Result},
    publisher::{PublishReport, Publisher},
    sequencer::Sequencer,
};

/// What the scheduler is doing, or did last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Reading converter channels into the bank.
    Sampling,
    /// Sending the bank out on the CAN bus.
    Publishing,
}

/// Outcome of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Whether every channel was read. When `false` the bank holds a mix of this cycle's and
    /// the previous cycle's values.
    pub sampled: bool,
    pub publish: PublishReport,
}

/// Runs sampling and publishing back to back, then idles for the cycle period.
///
/// The scheduler owns the bank, nothing else mutates it.
pub struct Scheduler<B, C, D, T = PassThrough>
where
    B: AdcBus,
    C: Can,
    D: DelayNs,
    T: TemperatureCurve,
{
    sequencer: Sequencer<B, T>,
    publisher: Publisher<C>,
    delay: D,
    bank: BatteryBank,
    phase: Phase,
    period: MillisDurationU32,
}

impl<B, C, D, T> Scheduler<B, C, D, T>
where
    B: AdcBus,
    C: Can,
    D: DelayNs,
    T: TemperatureCurve,
{
    pub fn new(sequencer: Sequencer<B, T>, publisher: Publisher<C>, delay: D) -> Self {
        Self {
            sequencer,
            publisher,
            delay,
            bank: BatteryBank::new(),
            phase: Phase::Sampling,
            period: CYCLE_PERIOD,
        }
    }

    /// Set the idle time between cycles.
    pub fn with_cycle_period(mut self, period: MillisDurationU32) -> Self {
        self.period = period;
        self
    }

    /// Apply both the frame spacing and the cycle period.
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.publisher = self.publisher.with_spacing(timing.frame_spacing);
        self.period = timing.cycle_period;
        self
    }

    pub fn bank(&self) -> &BatteryBank {
        &self.bank
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Configure the converter, then cycle forever.
    ///
    /// Only returns if the converter cannot be configured.
    pub fn run(mut self) -> Result<Infallible, B::Error> {
        if let Err(e) = self.sequencer.setup() {
            error!("ADC setup failed: {:?}", e.source_error());
            return Err(e);
        }
        loop {
            self.run_cycle();
        }
    }

    /// One full cycle: sweep all channels, publish all modules, wait out the cycle period.
    ///
    /// A failed sweep is logged and the bank is published as it stands. Sampling is retried
    /// on the next cycle.
    pub fn run_cycle(&mut self) -> CycleReport {
        self.phase = Phase::Sampling;
        let sampled = match self.sequencer.sweep(&mut self.bank) {
            Ok(()) => true,
            Err(Error::Transport(e)) | Err(Error::Setup(e)) => {
                warn!("Sampling failed, publishing previous values: {:?}", e);
                false
            }
        };

        self.phase = Phase::Publishing;
        let publish = self.publisher.publish(&self.bank, &mut self.delay);

        self.delay.delay_ms(self.period.to_millis());

        CycleReport { sampled, publish }
    }

    /// Take the parts back out of the scheduler.
    pub fn release(self) -> (Sequencer<B, T>, Publisher<C>, D) {
        (self.sequencer, self.publisher, self.delay)
    }
}
