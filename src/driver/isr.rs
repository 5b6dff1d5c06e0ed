//! Event pump run on the device thread after a `NetdevEvent::Isr`.

use super::RailNetdev;
use crate::log_warn_throttled;
use crate::netdev::NetdevEvent;
use crate::radio::events::{RadioEvent, RailEvents};
use crate::radio::hal::RadioHal;
use crate::util::logging::span_radio_op;

impl<R: RadioHal> RailNetdev<R> {
    /// Handle the oldest queued event.
    ///
    /// A received frame is only announced; its record stays queued for
    /// `recv`. Any other record is removed and mapped to at most one
    /// notification, chosen by precedence among the causes it carries.
    /// Records whose frame `recv` already took, with nothing else to
    /// report, are dropped on the way.
    pub(super) fn service_event(&mut self) -> Option<NetdevEvent> {
        let _span = span_radio_op("isr", self.trx.channel());
        if !self.trx.state().is_initialized() {
            log::debug!("[rail] isr ignored, device not initialized");
            return None;
        }
        self.report_overflows();

        let mut skipped = 0usize;
        let (seq, raw, is_rx) = loop {
            let head = self
                .events
                .as_ref()?
                .peek()
                .map(|record| (record.seq, record.events, record.is_rx(), record.is_consumed()));
            let Some((seq, raw, is_rx, consumed)) = head else {
                if skipped == 0 {
                    log::error!("[rail] netdev isr called, but no event pending");
                }
                return None;
            };
            self.track_seq(seq);
            if !consumed {
                break (seq, raw, is_rx);
            }
            self.events.as_mut()?.discard();
            skipped += 1;
        };
        log::debug!(
            "[rail] isr: event {seq}: {} ({raw:?})",
            RadioEvent::decode(raw).map_or("no cause", RadioEvent::name)
        );

        if is_rx {
            if self.rx_announced == Some(seq) {
                // Nobody consumed the frame since the last announcement
                self.rx_reannounced += 1;
                log_warn_throttled!(
                    self.overflow_log,
                    "rx frame {seq} announced again, recv was not called for it"
                );
            }
            self.rx_announced = Some(seq);
            self.notify(NetdevEvent::RxComplete);
            return Some(NetdevEvent::RxComplete);
        }

        let record = self.events.as_mut()?.poll()?;
        if let Some(packet) = record.packet {
            self.release(packet);
        }

        let notification = self.handle_events(raw, seq);
        if let Some(event) = notification {
            self.notify(event);
        }
        notification
    }

    /// Log a jump in sequence numbers, which means records were dropped
    fn track_seq(&mut self, seq: u32) {
        if seq == self.last_seq {
            return;
        }
        let expected = self.last_seq.wrapping_add(1);
        if self.last_seq != 0 && seq != expected {
            log::debug!(
                "event sequence gap: expected {expected}, got {seq} ({} records lost to a full queue)",
                seq.wrapping_sub(expected)
            );
        }
        self.last_seq = seq;
    }

    /// Count and log every cause in `raw`, finish the in-flight transmit
    /// if record `seq` ended it, and pick the notification to raise.
    pub(super) fn handle_events(&mut self, raw: RailEvents, seq: u32) -> Option<NetdevEvent> {
        let mut notification = None;
        for event in RadioEvent::all(raw) {
            let mapped = self.account(event);
            if notification.is_none() {
                notification = mapped;
            }
        }

        if raw.ends_transmit() {
            if self.queued_after_tx_submit(seq) {
                if let Err(err) = self.trx.finish_tx() {
                    log::error!("re-arming rx after transmit failed: {err}");
                }
            } else {
                log::debug!("event {seq} ends an earlier transmit, current one still in flight");
            }
        }
        notification
    }

    /// Whether record `seq` was queued after the current transmit started
    fn queued_after_tx_submit(&self, seq: u32) -> bool {
        (seq.wrapping_sub(self.tx_seq_floor) as i32) > 0
    }

    fn account(&mut self, event: RadioEvent) -> Option<NetdevEvent> {
        match event {
            RadioEvent::PacketReceived => None,
            RadioEvent::TxSent => {
                log::debug!("Rail event Tx packet sent");
                Some(NetdevEvent::TxComplete)
            }
            RadioEvent::AckTimeout => {
                self.stats.tx_no_ack += 1;
                log::debug!("Rail event RX ACK TIMEOUT");
                Some(NetdevEvent::TxNoAck)
            }
            RadioEvent::FrameError => {
                self.stats.crc_errors += 1;
                log::debug!("Rail event RX frame error");
                Some(NetdevEvent::CrcError)
            }
            RadioEvent::AddressFiltered => {
                self.stats.address_filtered += 1;
                log::debug!("Rail event rx address filtered");
                None
            }
            RadioEvent::ChannelBusy => {
                self.stats.tx_medium_busy += 1;
                log::debug!("Rail event Tx channel busy");
                Some(NetdevEvent::TxMediumBusy)
            }
            RadioEvent::TxAborted | RadioEvent::TxBlocked => {
                self.stats.tx_aborted += 1;
                log::debug!("Rail event {}", event.name());
                None
            }
            RadioEvent::TxUnderflow => {
                self.stats.tx_aborted += 1;
                log::info!("Rail event Tx underflow: frame was not loaded as a whole");
                None
            }
            RadioEvent::CalibrationNeeded => {
                self.stats.calibration_requests += 1;
                log::info!("Rail event calibration needed");
                None
            }
            RadioEvent::DataRequestCommand => {
                log::debug!("Rail event data request command");
                None
            }
        }
    }

    /// Warn about records lost to a full queue since the last check
    fn report_overflows(&mut self) {
        let Some(events) = self.events.as_ref() else {
            return;
        };
        let overflows = events.overflows();
        if overflows > self.seen_overflows {
            let lost = overflows - self.seen_overflows;
            self.seen_overflows = overflows;
            log_warn_throttled!(
                self.overflow_log,
                "event queue full: {lost} radio events dropped ({overflows} total)"
            );
        }
    }
}
