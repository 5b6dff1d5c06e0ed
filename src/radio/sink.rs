//! # Event Sink
//!
//! The producer side of the driver. The radio library receives an
//! `EventSink` at initialization and calls `on_events` from its own callback
//! (or interrupt) context. The sink never blocks: it stamps a sequence
//! number, pushes an `EventRecord` into the driver's queue and fires the
//! isr-pending notifier. Anything it cannot queue is handed back to the
//! caller so held buffers are always returned to the library.
//!
//! Sequence numbers are spent only on records the sink tries to queue, so
//! a gap seen by the consumer always means records lost to a full queue.

use crate::netdev::NetdevEvent;
use crate::radio::events::RailEvents;
use crate::radio::hal::{HeldPacket, RxPacketStatus};
use crate::radio::queue::Producer;
use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

/// Callback fired from callback context after an event was queued
pub type IsrNotifier = Arc<dyn Fn(NetdevEvent) + Send + Sync>;

/// One radio callback, as seen by the consumer
#[derive(Debug)]
pub struct EventRecord {
    /// Causes reported in this callback
    pub events: RailEvents,
    /// Held receive buffer, present only with `RX_PACKET_RECEIVED`
    pub packet: Option<HeldPacket>,
    /// Sequence number of the callback, gaps mean dropped records
    pub seq: u32,
}

impl EventRecord {
    /// Whether this record carries a received frame for `recv`
    pub fn is_rx(&self) -> bool {
        self.events.contains(RailEvents::RX_PACKET_RECEIVED) && self.packet.is_some()
    }

    /// Payload length of the held frame, without the length byte
    pub fn rx_payload_len(&self) -> Option<usize> {
        self.packet.as_ref().map(|p| p.info().payload_len())
    }

    /// Take the held frame out of the record, leaving its other causes.
    ///
    /// A record left without causes is consumed and skipped by `isr`.
    pub fn take_packet(&mut self) -> Option<HeldPacket> {
        self.events.remove(RailEvents::RX_PACKET_RECEIVED);
        self.packet.take()
    }

    /// Nothing left to report: the frame was taken and no other cause remains
    pub fn is_consumed(&self) -> bool {
        self.events.is_empty() && self.packet.is_none()
    }
}

/// Counters the sink keeps on behalf of the consumer
#[derive(Debug, Default)]
pub struct SinkCounters {
    malformed: AtomicU64,
    rx_rejected: AtomicU64,
    last_seq: AtomicU32,
}

impl SinkCounters {
    /// Received frames handed back because they were not well-formed
    pub fn malformed(&self) -> u64 {
        self.malformed.load(Ordering::Relaxed)
    }

    /// Received frames handed back because the queue was full
    pub fn rx_rejected(&self) -> u64 {
        self.rx_rejected.load(Ordering::Relaxed)
    }

    /// Sequence number of the newest record offered to the queue, 0 before any
    pub fn last_seq(&self) -> u32 {
        self.last_seq.load(Ordering::Acquire)
    }
}

/// Producer handle registered with the radio library
pub struct EventSink {
    producer: Producer<EventRecord>,
    next_seq: u32,
    notifier: Option<IsrNotifier>,
    counters: Arc<SinkCounters>,
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink")
            .field("next_seq", &self.next_seq)
            .field("capacity", &self.producer.capacity())
            .field("counters", &self.counters)
            .finish()
    }
}

impl EventSink {
    pub fn new(producer: Producer<EventRecord>, notifier: Option<IsrNotifier>) -> Self {
        Self {
            producer,
            next_seq: 1,
            notifier,
            counters: Arc::new(SinkCounters::default()),
        }
    }

    /// Shared view of the sink's counters, readable from the consumer
    pub fn counters(&self) -> Arc<SinkCounters> {
        Arc::clone(&self.counters)
    }

    /// Report one radio callback.
    ///
    /// `packet` is the buffer the library held for `RX_PACKET_RECEIVED`.
    /// The return value is a held packet the caller must release itself:
    /// either the frame was not well-formed, or the queue was full.
    #[must_use = "a returned packet must be released by the radio library"]
    pub fn on_events(
        &mut self,
        mut events: RailEvents,
        packet: Option<HeldPacket>,
    ) -> Option<HeldPacket> {
        let (packet, rejected) = match packet {
            Some(p) if events.contains(RailEvents::RX_PACKET_RECEIVED)
                && p.info().status == RxPacketStatus::Ready
                && p.info().packet_bytes > 0 =>
            {
                (Some(p), None)
            }
            Some(p) => {
                self.counters.malformed.fetch_add(1, Ordering::Relaxed);
                events.remove(RailEvents::RX_PACKET_RECEIVED);
                (None, Some(p))
            }
            None => {
                events.remove(RailEvents::RX_PACKET_RECEIVED);
                (None, None)
            }
        };

        if events.is_empty() {
            return rejected;
        }

        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.counters.last_seq.store(seq, Ordering::Release);

        match self.producer.push(EventRecord {
            events,
            packet,
            seq,
        }) {
            Ok(()) => {
                if let Some(notify) = &self.notifier {
                    notify(NetdevEvent::Isr);
                }
                rejected
            }
            Err(full) => {
                let record = full.into_inner();
                if record.packet.is_some() {
                    self.counters.rx_rejected.fetch_add(1, Ordering::Relaxed);
                }
                // At most one of the two is set
                record.packet.or(rejected)
            }
        }
    }
}
