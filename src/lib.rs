//! Battery monitoring firmware core for a three-module battery bank.
//!
//! Each cycle the nine channels of a MAX1228 12-bit ADC are sampled over SPI, converted into
//! module voltage, current and temperature, and republished as fixed-format ASCII frames on
//! the CAN bus.
//!
//! It supports `no-std` environments by use of the `no-std` feature flag.
//!
//! Hardware is injected, nothing is reached through globals:
//! * Converter bus: anything implementing [`bus::AdcBus`]. [`bus::SpiAdcBus`] adapts an
//!   [`embedded_hal::spi::SpiBus`] and chip select pin.
//! * Vehicle network: anything implementing [`embedded_can::blocking::Can`].
//! * Timing: anything implementing [`embedded_hal::delay::DelayNs`].
//!
//! The converter SPI port should be configured like so:
//! * Mode: 0 (see [`bus::MODE`])
//! * Word size: 8 bits
//! * Clock: 1 MHz (see [`bus::FREQUENCY`])
//!
//! ```ignore
//! let sequencer = Sequencer::new(SpiAdcBus::new(spi, cs), Converter::default());
//! let publisher = Publisher::new(can);
//! let err = Scheduler::new(sequencer, publisher, delay).run();
//! ```

#![cfg_attr(feature = "no-std", no_std)]

pub mod battery;
pub mod bus;
pub mod channel;
pub mod config;
pub mod convert;
pub mod error;
pub mod frame;
pub mod publisher;
pub mod registers;
pub mod scheduler;
pub mod sequencer;

#[cfg(test)]
mod mock_bus;
