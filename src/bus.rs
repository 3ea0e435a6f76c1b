//! Access to the converter bus.
//!
//! The converter shares its SPI port with other devices (the SD card on the original board).
//! A sweep therefore claims the bus once with [`BusGuard::acquire`] and keeps it until every
//! channel is read. The guard releases the bus when dropped, including on early error returns.

use core::ops::{Deref, DerefMut};

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::{Mode, SpiBus, MODE_0};
use fugit::HertzU32;
use thiserror::Error;

/// SPI mode the converter is clocked in. 8-bit words, clock idles low, sample on first edge.
pub const MODE: Mode = MODE_0;

/// SPI clock rate. Readings become unstable when clocked much lower.
pub const FREQUENCY: HertzU32 = HertzU32::MHz(1);

/// Synchronous transaction primitive of a shared converter bus.
pub trait AdcBus {
    type Error: core::fmt::Debug;

    /// Claim the bus exclusively for a burst of transactions.
    fn acquire(&mut self) -> Result<(), Self::Error>;

    /// Give the bus back to other consumers.
    fn release(&mut self);

    /// Clock `command` out, discarding whatever is clocked back.
    fn write(&mut self, command: &[u8]) -> Result<(), Self::Error>;

    /// Clock `request` out while filling `response`. Bytes past the end of `request` are sent
    /// as filler.
    fn transact(&mut self, request: &[u8], response: &mut [u8]) -> Result<(), Self::Error>;
}

/// Exclusive scope over an [`AdcBus`]. Released on drop.
pub struct BusGuard<'a, B: AdcBus> {
    bus: &'a mut B,
}

impl<'a, B: AdcBus> BusGuard<'a, B> {
    pub fn acquire(bus: &'a mut B) -> Result<Self, B::Error> {
        bus.acquire()?;
        Ok(Self { bus })
    }
}

impl<B: AdcBus> Deref for BusGuard<'_, B> {
    type Target = B;

    fn deref(&self) -> &B {
        self.bus
    }
}

impl<B: AdcBus> DerefMut for BusGuard<'_, B> {
    fn deref_mut(&mut self) -> &mut B {
        self.bus
    }
}

impl<B: AdcBus> Drop for BusGuard<'_, B> {
    fn drop(&mut self) {
        self.bus.release();
    }
}

/// Errors raised by [`SpiAdcBus`].
#[derive(Error, Debug)]
pub enum SpiAdcError<S: core::fmt::Debug, P: core::fmt::Debug> {
    #[error("SPI transfer failed")]
    Spi(S),
    #[error("Chip select pin failed")]
    ChipSelect(P),
    #[error("Bus used without being acquired")]
    NotAcquired,
    #[error("Bus already acquired")]
    Busy,
}

/// [`AdcBus`] over an `embedded-hal` SPI bus with a dedicated chip select pin.
///
/// Chip select is asserted around every transaction. Transactions are refused unless the bus
/// has been acquired first.
pub struct SpiAdcBus<SPI, CS> {
    spi: SPI,
    cs: CS,
    acquired: bool,
}

impl<SPI, CS> SpiAdcBus<SPI, CS>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
{
    pub fn new(spi: SPI, cs: CS) -> Self {
        Self {
            spi,
            cs,
            acquired: false,
        }
    }

    pub fn is_acquired(&self) -> bool {
        self.acquired
    }

    /// Return the SPI bus and chip select pin.
    pub fn release_parts(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }

    fn selected<F>(&mut self, op: F) -> Result<(), SpiAdcError<SPI::Error, CS::Error>>
    where
        F: FnOnce(&mut SPI) -> Result<(), SPI::Error>,
    {
        if !self.acquired {
            return Err(SpiAdcError::NotAcquired);
        }
        self.cs.set_low().map_err(SpiAdcError::ChipSelect)?;
        let result = op(&mut self.spi).and_then(|_| self.spi.flush());
        // Deselect even when the transfer failed.
        let deselect = self.cs.set_high();
        result.map_err(SpiAdcError::Spi)?;
        deselect.map_err(SpiAdcError::ChipSelect)
    }
}

impl<SPI, CS> AdcBus for SpiAdcBus<SPI, CS>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
{
    type Error = SpiAdcError<SPI::Error, CS::Error>;

    fn acquire(&mut self) -> Result<(), Self::Error> {
        if self.acquired {
            return Err(SpiAdcError::Busy);
        }
        self.acquired = true;
        Ok(())
    }

    fn release(&mut self) {
        self.acquired = false;
    }

    fn write(&mut self, command: &[u8]) -> Result<(), Self::Error> {
        self.selected(|spi| spi.write(command))
    }

    fn transact(&mut self, request: &[u8], response: &mut [u8]) -> Result<(), Self::Error> {
        self.selected(|spi| spi.transfer(response, request))
    }
}
