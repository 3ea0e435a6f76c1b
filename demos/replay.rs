use std::env;
use std::time::{Duration, Instant};

use embedded_can::{blocking::Can, ErrorKind, Frame, Id};
use embedded_hal::delay::DelayNs;
use fugit::MillisDurationU32;
use log::{LevelFilter, Log, Metadata, Record};
use outback_bms::bus::AdcBus;
use outback_bms::convert::Converter;
use outback_bms::frame::Reading;
use outback_bms::publisher::Publisher;
use outback_bms::scheduler::Scheduler;
use outback_bms::sequencer::Sequencer;

// Replay settings - adjust these to taste
const DEFAULT_CYCLES: usize = 5;
const CYCLE_PERIOD_MS: u32 = 1000;

/// One sweep of plausible codes: voltage, current, temperature for each of the three modules.
const SWEEP: [u16; 9] = [2000, 2086, 500, 2010, 2150, 510, 1990, 2020, 490];

struct StdoutLogger {
    start: Instant,
}

impl Log for StdoutLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        println!(
            "[{:>8.3}] {:<5} {}",
            self.start.elapsed().as_secs_f32(),
            record.level(),
            record.args()
        );
    }

    fn flush(&self) {}
}

/// Converter bus answering every request from a fixed table, drifting the codes a little on
/// each sweep.
struct ReplayAdc {
    position: usize,
    drift: u16,
}

#[derive(Debug)]
struct ReplayError;

impl AdcBus for ReplayAdc {
    type Error = ReplayError;

    fn acquire(&mut self) -> Result<(), Self::Error> {
        self.position = 0;
        Ok(())
    }

    fn release(&mut self) {
        self.drift = (self.drift + 3) % 40;
    }

    fn write(&mut self, _command: &[u8]) -> Result<(), Self::Error> {
        Ok(())
    }

    fn transact(&mut self, _request: &[u8], response: &mut [u8]) -> Result<(), Self::Error> {
        let code = SWEEP.get(self.position).ok_or(ReplayError)? + self.drift;
        self.position += 1;
        response.fill(0);
        response[1..3].copy_from_slice(&code.to_be_bytes());
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct PrintedFrame {
    id: Id,
    data: Vec<u8>,
}

impl Frame for PrintedFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        (data.len() <= 8).then(|| Self {
            id: id.into(),
            data: data.to_vec(),
        })
    }

    fn new_remote(_id: impl Into<Id>, _dlc: usize) -> Option<Self> {
        None
    }

    fn is_extended(&self) -> bool {
        matches!(self.id, Id::Extended(_))
    }

    fn is_remote_frame(&self) -> bool {
        false
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

#[derive(Debug)]
struct NoReceive;

impl embedded_can::Error for NoReceive {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// CAN controller printing every frame it is handed.
struct PrintingCan;

impl Can for PrintingCan {
    type Frame = PrintedFrame;
    type Error = NoReceive;

    fn transmit(&mut self, frame: &Self::Frame) -> Result<(), Self::Error> {
        let raw = match frame.id() {
            Id::Standard(id) => u32::from(id.as_raw()),
            Id::Extended(id) => id.as_raw(),
        };
        match Reading::parse(frame.data()) {
            Some(reading) => println!(
                "  CAN {:#05x} {:02x?} -> module {} {:?} = {}",
                raw, frame.data(), reading.battery_id, reading.quantity, reading.value
            ),
            None => println!("  CAN {:#05x} {:02x?}", raw, frame.data()),
        }
        Ok(())
    }

    fn receive(&mut self) -> Result<Self::Frame, Self::Error> {
        Err(NoReceive)
    }
}

struct SleepDelay;

impl DelayNs for SleepDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(ns.into()));
    }
}

fn main() {
    let cycles = env::args()
        .nth(1)
        .map(|arg| arg.parse().expect("Cycle count must be a number"))
        .unwrap_or(DEFAULT_CYCLES);

    let logger = Box::leak(Box::new(StdoutLogger {
        start: Instant::now(),
    }));
    log::set_logger(logger).expect("Logger already set");
    log::set_max_level(LevelFilter::Debug);

    let mut sequencer = Sequencer::new(ReplayAdc { position: 0, drift: 0 }, Converter::default());
    sequencer.setup().expect("Replay converter refused setup");

    let mut scheduler = Scheduler::new(sequencer, Publisher::new(PrintingCan), SleepDelay)
        .with_cycle_period(MillisDurationU32::millis(CYCLE_PERIOD_MS));

    for cycle in 1..=cycles {
        println!("--- Cycle {} ---", cycle);
        let report = scheduler.run_cycle();
        println!("{:#?}", report);
    }

    println!("\n--- Final bank ---");
    for battery in scheduler.bank() {
        println!(
            "Module {}: {:.2}V {:.2}A {:.3} temp, {:.1}W",
            battery.id(),
            battery.voltage(),
            battery.current(),
            battery.temperature(),
            battery.power()
        );
    }
}
