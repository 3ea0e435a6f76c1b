//! Publishing of module state on the CAN bus.

use embedded_can::{blocking::Can, Error as _, Frame, StandardId};
use embedded_hal::delay::DelayNs;
use fugit::MillisDurationU32;
use log::{debug, warn};
use strum::IntoEnumIterator;

use crate::{
    battery::{Battery, BatteryBank},
    config::FRAME_SPACING,
    frame::{Payload, Quantity, FRAME_ID},
};

/// Outcome of one publish pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Frames accepted by the controller.
    pub delivered: u8,
    /// Frames the controller refused. They are not retried.
    pub dropped: u8,
    /// Frames whose value did not fit the payload.
    pub truncated: u8,
}

/// Sends voltage, current, temperature and power frames for every module.
pub struct Publisher<C: Can> {
    can: C,
    id: StandardId,
    spacing: MillisDurationU32,
}

impl<C: Can> Publisher<C> {
    pub fn new(can: C) -> Self {
        Self {
            can,
            id: FRAME_ID,
            spacing: FRAME_SPACING,
        }
    }

    /// Use a different frame identifier.
    pub fn with_id(mut self, id: StandardId) -> Self {
        self.id = id;
        self
    }

    /// Set the gap enforced after every frame.
    pub fn with_spacing(mut self, spacing: MillisDurationU32) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn spacing(&self) -> MillisDurationU32 {
        self.spacing
    }

    /// Return the CAN controller, consuming the publisher.
    pub fn release(self) -> C {
        self.can
    }

    /// Publish every module in ascending id order.
    pub fn publish<D: DelayNs>(&mut self, bank: &BatteryBank, delay: &mut D) -> PublishReport {
        let mut report = PublishReport::default();
        for battery in bank {
            self.publish_battery(battery, delay, &mut report);
        }
        report
    }

    fn publish_battery<D: DelayNs>(
        &mut self,
        battery: &Battery,
        delay: &mut D,
        report: &mut PublishReport,
    ) {
        for quantity in Quantity::iter() {
            let payload = Payload::encode(battery.id(), quantity, quantity.read(battery));
            if payload.is_truncated() {
                warn!(
                    "Battery {} {:?} value {} truncated to {:?}",
                    battery.id(),
                    quantity,
                    quantity.read(battery),
                    payload.text()
                );
                report.truncated += 1;
            }

            if self.send(&payload) {
                debug!("{}", payload.text());
                report.delivered += 1;
            } else {
                report.dropped += 1;
            }

            delay.delay_ms(self.spacing.to_millis());
        }
    }

    /// Hand one payload to the controller. Returns whether it was accepted.
    pub fn send(&mut self, payload: &Payload) -> bool {
        let Some(frame) = C::Frame::new(self.id, payload.as_bytes()) else {
            warn!("Could not build frame for {:?}", payload.text());
            return false;
        };
        match self.can.transmit(&frame) {
            Ok(()) => true,
            Err(e) => {
                warn!("Frame {:?} dropped: {:?}", payload.text(), e.kind());
                false
            }
        }
    }
}
