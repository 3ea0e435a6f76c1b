//! We use this mocking module in unit tests to emulate the converter bus, the CAN controller
//! and the passage of time.

use core::cell::Cell;
use core::convert::Infallible;

use embedded_can::{ErrorKind as CanErrorKind, Frame, Id};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType as PinErrorType, OutputPin};
use embedded_hal::spi::{ErrorKind as SpiErrorKind, ErrorType as SpiErrorType, SpiBus};

use crate::bus::AdcBus;

/// Simulated time in milliseconds, shared by [`MockDelay`] and [`MockCan`].
#[derive(Debug, Default)]
pub struct MockClock {
    now_ms: Cell<u32>,
}

impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u32 {
        self.now_ms.get()
    }

    fn advance(&self, ms: u32) {
        self.now_ms.set(self.now_ms.get() + ms);
    }
}

/// Delay that only moves the simulated clock forward.
pub struct MockDelay<'a> {
    clock: &'a MockClock,
    /// Every `delay_ms` call, in order.
    calls: heapless::Vec<u32, 64>,
}

impl<'a> MockDelay<'a> {
    pub fn new(clock: &'a MockClock) -> Self {
        Self {
            clock,
            calls: heapless::Vec::new(),
        }
    }

    pub fn calls(&self) -> &[u32] {
        &self.calls
    }
}

impl DelayNs for MockDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.clock.advance(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        let _ = self.calls.push(ms);
        self.clock.advance(ms);
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum MockAdcError {
    /// Generic simulated error for testing
    SimulatedError,
    /// Transaction issued outside an acquired scope
    NotAcquired,
    /// No scripted response left
    NoResponse,
    /// Recording buffer is full
    BufferOverflow,
}

/// Scripted converter bus. Each transaction answers with the next scripted code.
pub struct MockAdc {
    /// Codes returned by successive transactions
    codes: heapless::Vec<u16, 64>,
    /// First request byte of every transaction
    requests: heapless::Vec<u8, 64>,
    /// Bytes sent through `write`
    commands: heapless::Vec<u8, 16>,
    /// Writes and transactions issued so far
    operations: usize,
    /// Transactions answered so far
    answered: usize,
    /// Operation index to fail
    fail_at: Option<usize>,
    acquired: bool,
    acquires: usize,
    releases: usize,
}

impl MockAdc {
    pub fn new() -> Self {
        Self {
            codes: heapless::Vec::new(),
            requests: heapless::Vec::new(),
            commands: heapless::Vec::new(),
            operations: 0,
            answered: 0,
            fail_at: None,
            acquired: false,
            acquires: 0,
            releases: 0,
        }
    }

    /// Set the codes returned by the following transactions.
    pub fn set_codes(&mut self, codes: &[u16]) {
        self.codes.clear();
        self.answered = 0;
        for &code in codes {
            let _ = self.codes.push(code);
        }
    }

    /// Fail the `index`th operation, counting writes and transactions from zero.
    pub fn fail_at(&mut self, index: usize) {
        self.fail_at = Some(index);
    }

    pub fn requests(&self) -> &[u8] {
        &self.requests
    }

    pub fn commands(&self) -> &[u8] {
        &self.commands
    }

    pub fn acquires(&self) -> usize {
        self.acquires
    }

    pub fn releases(&self) -> usize {
        self.releases
    }

    pub fn is_acquired(&self) -> bool {
        self.acquired
    }

    fn begin_operation(&mut self) -> Result<(), MockAdcError> {
        if !self.acquired {
            return Err(MockAdcError::NotAcquired);
        }
        let index = self.operations;
        self.operations += 1;
        if self.fail_at == Some(index) {
            return Err(MockAdcError::SimulatedError);
        }
        Ok(())
    }
}

impl AdcBus for MockAdc {
    type Error = MockAdcError;

    fn acquire(&mut self) -> Result<(), Self::Error> {
        self.acquired = true;
        self.acquires += 1;
        Ok(())
    }

    fn release(&mut self) {
        self.acquired = false;
        self.releases += 1;
    }

    fn write(&mut self, command: &[u8]) -> Result<(), Self::Error> {
        self.begin_operation()?;
        self.commands
            .extend_from_slice(command)
            .map_err(|_| MockAdcError::BufferOverflow)
    }

    fn transact(&mut self, request: &[u8], response: &mut [u8]) -> Result<(), Self::Error> {
        self.begin_operation()?;
        self.requests
            .push(request[0])
            .map_err(|_| MockAdcError::BufferOverflow)?;

        let code = *self
            .codes
            .get(self.answered)
            .ok_or(MockAdcError::NoResponse)?;
        self.answered += 1;

        response.fill(0);
        response[1..3].copy_from_slice(&code.to_be_bytes());
        Ok(())
    }
}

#[derive(Debug)]
pub struct MockSpiError;

impl embedded_hal::spi::Error for MockSpiError {
    fn kind(&self) -> SpiErrorKind {
        SpiErrorKind::Other
    }
}

/// Bare SPI bus recording written bytes and replaying scripted read bytes.
pub struct MockSpi {
    written: heapless::Vec<u8, 64>,
    read_data: heapless::Vec<u8, 64>,
    read_position: usize,
    flushes: usize,
    should_error: bool,
}

impl MockSpi {
    pub fn new() -> Self {
        Self {
            written: heapless::Vec::new(),
            read_data: heapless::Vec::new(),
            read_position: 0,
            flushes: 0,
            should_error: false,
        }
    }

    pub fn set_read_data(&mut self, data: &[u8]) {
        self.read_data.clear();
        self.read_position = 0;
        let _ = self.read_data.extend_from_slice(data);
    }

    pub fn set_error(&mut self, should_error: bool) {
        self.should_error = should_error;
    }

    pub fn written_data(&self) -> &[u8] {
        &self.written
    }

    pub fn flushes(&self) -> usize {
        self.flushes
    }

    fn check(&self) -> Result<(), MockSpiError> {
        if self.should_error {
            Err(MockSpiError)
        } else {
            Ok(())
        }
    }

    fn fill(&mut self, words: &mut [u8]) {
        for word in words {
            *word = self.read_data.get(self.read_position).copied().unwrap_or(0);
            self.read_position += 1;
        }
    }
}

impl SpiErrorType for MockSpi {
    type Error = MockSpiError;
}

impl SpiBus<u8> for MockSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        self.check()?;
        self.fill(words);
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        self.check()?;
        self.written
            .extend_from_slice(words)
            .map_err(|_| MockSpiError)
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        self.write(write)?;
        self.fill(read);
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        self.write(words)?;
        self.fill(words);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.check()?;
        self.flushes += 1;
        Ok(())
    }
}

/// Output pin recording every level it is driven to. `true` is high.
pub struct MockPin {
    transitions: heapless::Vec<bool, 32>,
}

impl MockPin {
    pub fn new() -> Self {
        Self {
            transitions: heapless::Vec::new(),
        }
    }

    pub fn transitions(&self) -> &[bool] {
        &self.transitions
    }
}

impl PinErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        let _ = self.transitions.push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let _ = self.transitions.push(true);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockFrame {
    id: Id,
    data: heapless::Vec<u8, 8>,
    remote: bool,
}

impl Frame for MockFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        Some(Self {
            id: id.into(),
            data: heapless::Vec::from_slice(data).ok()?,
            remote: false,
        })
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        if dlc > 8 {
            return None;
        }
        let mut data = heapless::Vec::new();
        data.resize(dlc, 0).ok()?;
        Some(Self {
            id: id.into(),
            data,
            remote: true,
        })
    }

    fn is_extended(&self) -> bool {
        matches!(self.id, Id::Extended(_))
    }

    fn is_remote_frame(&self) -> bool {
        self.remote
    }

    fn id(&self) -> Id {
        self.id
    }

    fn dlc(&self) -> usize {
        self.data.len()
    }

    fn data(&self) -> &[u8] {
        &self.data
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum MockCanError {
    /// Simulated lost arbitration
    ArbitrationLost,
    /// Recording buffer is full
    Overrun,
    /// Nothing to receive
    Empty,
}

impl embedded_can::Error for MockCanError {
    fn kind(&self) -> CanErrorKind {
        match self {
            MockCanError::ArbitrationLost => CanErrorKind::Bit,
            MockCanError::Overrun => CanErrorKind::Overrun,
            MockCanError::Empty => CanErrorKind::Other,
        }
    }
}

/// CAN controller recording every accepted frame with the simulated time it was sent at.
pub struct MockCan<'a> {
    clock: &'a MockClock,
    sent: heapless::Vec<MockFrame, 64>,
    timestamps: heapless::Vec<u32, 64>,
    attempts: usize,
    /// Transmit attempt index to refuse
    fail_at: Option<usize>,
}

impl<'a> MockCan<'a> {
    pub fn new(clock: &'a MockClock) -> Self {
        Self {
            clock,
            sent: heapless::Vec::new(),
            timestamps: heapless::Vec::new(),
            attempts: 0,
            fail_at: None,
        }
    }

    /// Refuse the `index`th transmit attempt, counting from zero.
    pub fn fail_at(&mut self, index: usize) {
        self.fail_at = Some(index);
    }

    pub fn sent(&self) -> &[MockFrame] {
        &self.sent
    }

    pub fn timestamps(&self) -> &[u32] {
        &self.timestamps
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }
}

impl embedded_can::blocking::Can for MockCan<'_> {
    type Frame = MockFrame;
    type Error = MockCanError;

    fn transmit(&mut self, frame: &Self::Frame) -> Result<(), Self::Error> {
        let attempt = self.attempts;
        self.attempts += 1;
        if self.fail_at == Some(attempt) {
            return Err(MockCanError::ArbitrationLost);
        }
        self.sent
            .push(frame.clone())
            .map_err(|_| MockCanError::Overrun)?;
        self.timestamps
            .push(self.clock.now())
            .map_err(|_| MockCanError::Overrun)
    }

    fn receive(&mut self) -> Result<Self::Frame, Self::Error> {
        Err(MockCanError::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_can::{blocking::Can, StandardId};

    #[test]
    fn mock_adc_answers_in_order() {
        let mut adc = MockAdc::new();
        adc.set_codes(&[1, 0x0ABC]);
        adc.acquire().unwrap();

        let mut response = [0xFFu8; 4];
        adc.transact(&[0x80, 0x00], &mut response).unwrap();
        assert_eq!(response, [0x00, 0x00, 0x01, 0x00]);
        adc.transact(&[0x88, 0x00], &mut response).unwrap();
        assert_eq!(response, [0x00, 0x0A, 0xBC, 0x00]);
        assert_eq!(
            adc.transact(&[0x90, 0x00], &mut response),
            Err(MockAdcError::NoResponse)
        );
        assert_eq!(adc.requests(), [0x80, 0x88, 0x90]);
    }

    #[test]
    fn mock_adc_requires_acquire() {
        let mut adc = MockAdc::new();
        adc.set_codes(&[1]);
        let mut response = [0u8; 4];
        assert_eq!(
            adc.transact(&[0x80, 0x00], &mut response),
            Err(MockAdcError::NotAcquired)
        );
        assert_eq!(adc.write(&[0x76]), Err(MockAdcError::NotAcquired));
    }

    #[test]
    fn mock_adc_fails_selected_operation() {
        let mut adc = MockAdc::new();
        adc.set_codes(&[1, 2]);
        adc.fail_at(1);
        adc.acquire().unwrap();

        let mut response = [0u8; 4];
        assert!(adc.write(&[0x76]).is_ok());
        assert_eq!(
            adc.transact(&[0x80, 0x00], &mut response),
            Err(MockAdcError::SimulatedError)
        );
        assert!(adc.transact(&[0x80, 0x00], &mut response).is_ok());
        // The failed transaction did not use up a code.
        assert_eq!(response[2], 1);
    }

    #[test]
    fn mock_delay_advances_clock() {
        let clock = MockClock::new();
        let mut delay = MockDelay::new(&clock);
        delay.delay_ms(20);
        delay.delay_ms(100);
        assert_eq!(clock.now(), 120);
        assert_eq!(delay.calls(), [20, 100]);
    }

    #[test]
    fn mock_can_records_and_fails() {
        let clock = MockClock::new();
        let mut can = MockCan::new(&clock);
        can.fail_at(0);
        let id = StandardId::new(12).unwrap();
        let frame = MockFrame::new(id, b"1055.7\0\0").unwrap();

        assert_eq!(can.transmit(&frame), Err(MockCanError::ArbitrationLost));
        clock.advance(5);
        assert!(can.transmit(&frame).is_ok());

        assert_eq!(can.attempts(), 2);
        assert_eq!(can.sent(), [frame]);
        assert_eq!(can.timestamps(), [5]);
    }

    #[test]
    fn mock_frame_limits_length() {
        let id = StandardId::new(1).unwrap();
        assert!(MockFrame::new(id, &[0u8; 9]).is_none());
        let frame = MockFrame::new(id, &[1, 2, 3]).unwrap();
        assert_eq!(frame.dlc(), 3);
        assert!(frame.is_standard());
        assert!(!frame.is_remote_frame());
    }

    #[test]
    fn mock_pin_records_levels() {
        let mut pin = MockPin::new();
        pin.set_low().unwrap();
        pin.set_high().unwrap();
        assert_eq!(pin.transitions(), [false, true]);
    }
}
