//! # RAIL Network Device
//!
//! `RailNetdev` adapts a callback-driven 802.15.4 radio library to the
//! poll-based `NetDevice` contract.
//!
//! ## Execution contexts
//!
//! The radio library calls the `EventSink` registered at `init` from its
//! own callback context. The sink only pushes into the lock-free event
//! queue and fires the `NetdevEvent::Isr` notification; everything else
//! (state changes, held-packet copies, option handling) happens on the
//! thread that owns the `RailNetdev` and calls `isr`, `recv` and `send`.
//!
//! ## Usage
//!
//! ```rust
//! use rail_netdev::config::DriverParams;
//! use rail_netdev::driver::RailNetdev;
//! use rail_netdev::netdev::{NetDevice, NetdevEvent, RecvMode};
//! use rail_netdev::radio::MockRadio;
//!
//! let radio = MockRadio::new();
//! let mut dev = RailNetdev::new(radio.clone(), DriverParams::default());
//! dev.init().unwrap();
//!
//! radio.inject_rx(&[0x41, 0x88, 0x01, 0x23, 0x00], -50, 220);
//! assert_eq!(dev.isr(), Some(NetdevEvent::RxComplete));
//!
//! let mut buf = [0u8; 127];
//! let len = dev.recv(RecvMode::Deliver { buf: &mut buf, info: None }).unwrap();
//! assert_eq!(&buf[..len], &[0x41, 0x88, 0x01, 0x23, 0x00]);
//! ```

mod isr;
mod options;
mod rx;
mod tx;

use crate::config::DriverParams;
use crate::error::NetdevError;
use crate::netdev::{
    EventCallback, Ieee802154Options, NetDevice, NetOpt, NetStats, NetdevEvent, OptValue,
    RecvMode,
};
use crate::radio::frame::OutboundFrame;
use crate::radio::hal::{AddressFilter, CsmaConfig, RadioConfig, RadioHal};
use crate::radio::queue::{Consumer, EventQueue, QueueStats};
use crate::radio::sink::{EventRecord, EventSink, SinkCounters};
use crate::radio::state::{Transceiver, TransceiverState};
use crate::util::logging::LogThrottle;
use std::sync::Arc;

/// Network device on top of a RAIL-style radio library
pub struct RailNetdev<R: RadioHal> {
    params: DriverParams,
    trx: Transceiver<R>,
    /// Consumer half of the event queue, present once initialized
    events: Option<Consumer<EventRecord>>,
    sink_counters: Option<Arc<SinkCounters>>,
    frame: OutboundFrame,
    ieee: Ieee802154Options,
    csma: CsmaConfig,
    /// The radio cannot report promiscuous mode, so it is cached here
    promiscuous: bool,
    stats: NetStats,
    callback: Option<EventCallback>,
    overflow_log: LogThrottle,
    seen_overflows: u64,
    last_seq: u32,
    /// Sequence number of the rx record already announced by `isr`
    rx_announced: Option<u32>,
    rx_reannounced: u64,
    /// Newest sequence number queued before the current transmit was
    /// submitted; completions up to it belong to an earlier transmit
    tx_seq_floor: u32,
}

impl<R: RadioHal> RailNetdev<R> {
    /// Create an uninitialized device. Call `init` before anything else.
    pub fn new(radio: R, params: DriverParams) -> Self {
        let channel = params.channel();
        let csma = params.csma;
        let promiscuous = params.promiscuous;
        Self {
            params,
            trx: Transceiver::new(radio, channel),
            events: None,
            sink_counters: None,
            frame: OutboundFrame::new(),
            ieee: Ieee802154Options::default(),
            csma,
            promiscuous,
            stats: NetStats::default(),
            callback: None,
            overflow_log: LogThrottle::new(1000, 5),
            seen_overflows: 0,
            last_seq: 0,
            rx_announced: None,
            rx_reannounced: 0,
            tx_seq_floor: 0,
        }
    }

    /// Register the owner's event callback.
    ///
    /// The callback receives `NetdevEvent::Isr` from the radio's callback
    /// context and the notifications `isr` produces. Register it before
    /// `init` so the radio side picks it up.
    pub fn set_event_callback(&mut self, callback: EventCallback) {
        self.callback = Some(callback);
    }

    pub fn with_event_callback(mut self, callback: EventCallback) -> Self {
        self.set_event_callback(callback);
        self
    }

    pub fn params(&self) -> &DriverParams {
        &self.params
    }

    pub fn state(&self) -> TransceiverState {
        self.trx.state()
    }

    pub fn channel(&self) -> u8 {
        self.trx.channel()
    }

    pub fn radio(&self) -> &R {
        self.trx.radio()
    }

    pub fn csma(&self) -> &CsmaConfig {
        &self.csma
    }

    /// Contents of the outbound frame buffer
    pub fn outbound_frame(&self) -> &OutboundFrame {
        &self.frame
    }

    /// Snapshot of the link-layer counters
    pub fn stats(&self) -> NetStats {
        let mut stats = self.stats;
        if let Some(events) = &self.events {
            stats.queue_overflows = events.overflows();
        }
        if let Some(counters) = &self.sink_counters {
            stats.malformed_rx = counters.malformed();
        }
        stats
    }

    pub fn queue_stats(&self) -> QueueStats {
        self.events
            .as_ref()
            .map(|events| events.stats())
            .unwrap_or_default()
    }

    /// Times `isr` announced the same received frame again
    pub fn rx_reannounced(&self) -> u64 {
        self.rx_reannounced
    }

    /// Records waiting in the event queue, not counting frames `recv`
    /// already took out of order
    pub fn pending_events(&self) -> usize {
        self.events.as_ref().map_or(0, |events| {
            events.iter().filter(|record| !record.is_consumed()).count()
        })
    }

    /// Start receiving again on the current channel, e.g. after a channel
    /// change that should apply immediately
    pub fn rearm_rx(&mut self) -> Result<(), NetdevError> {
        self.trx.start_rx()
    }

    fn notify(&self, event: NetdevEvent) {
        if let Some(callback) = &self.callback {
            callback(event);
        }
    }

    /// Bring-up: program the radio library and arm receive.
    fn bring_up(&mut self) -> Result<(), NetdevError> {
        // The old consumer stays in place until the radio accepted a new
        // sink, so frames the old sink still queues can be drained later.
        if self.events.is_some() {
            log::debug!("re-initializing, releasing queued events");
            self.drain_events();
            self.trx.reset();
        }

        self.params.validate().map_err(|err| {
            log::error!("invalid driver parameters: {err}");
            NetdevError::InvalidParameter
        })?;

        let channel = self.params.channel();
        let eui64 = self
            .params
            .eui64
            .unwrap_or_else(|| self.trx.radio().eui64());
        self.ieee = Ieee802154Options::from_eui64(eui64, self.params.pan_id, channel);
        self.csma = self.params.csma;
        self.promiscuous = self.params.promiscuous;
        self.last_seq = 0;
        self.rx_announced = None;
        self.seen_overflows = 0;
        self.tx_seq_floor = 0;

        let (producer, consumer) = EventQueue::with_capacity(self.params.queue_capacity).split();
        let sink = EventSink::new(producer, self.callback.clone());
        let counters = sink.counters();

        let config = RadioConfig {
            band: self.params.band,
            auto_ack: self.params.auto_ack,
            promiscuous: self.params.promiscuous,
        };
        let filter = AddressFilter {
            pan_id: self.ieee.pan,
            short_addr: self.ieee.short_addr_value(),
            long_addr: self.ieee.long_addr_ota(),
        };

        self.trx.radio_mut().initialize(&config, sink).map_err(|err| {
            log::error!("radio init failed: {}", err.describe());
            NetdevError::Init(err)
        })?;
        // From here on the radio may queue frames; Drop and the next init
        // must find them even if a later step fails.
        self.events = Some(consumer);
        self.sink_counters = Some(counters);

        let radio = self.trx.radio_mut();
        radio.configure_channels(config.band).map_err(|err| {
            log::error!("channel configuration failed: {}", err.describe());
            NetdevError::Init(err)
        })?;
        radio.configure_addressing(&filter).map_err(|err| {
            log::error!("address filter setup failed: {}", err.describe());
            NetdevError::Init(err)
        })?;
        radio
            .set_tx_power_ddbm(self.params.tx_power_dbm.saturating_mul(10))
            .map_err(|err| {
                log::error!("tx power setup failed: {}", err.describe());
                NetdevError::Init(err)
            })?;

        self.trx.set_channel(channel);
        self.trx.mark_initialized();
        self.trx.start_rx()?;

        log::info!(
            "rail netdev up: {} band, channel {}, pan 0x{:04x}, short {:02x}{:02x}",
            self.params.band,
            channel,
            self.ieee.pan,
            self.ieee.short_addr[0],
            self.ieee.short_addr[1]
        );
        Ok(())
    }
}

impl<R: RadioHal> NetDevice for RailNetdev<R> {
    fn init(&mut self) -> Result<(), NetdevError> {
        self.bring_up()
    }

    fn send(&mut self, chunks: &[&[u8]]) -> Result<usize, NetdevError> {
        self.send_frame(chunks)
    }

    fn recv(&mut self, mode: RecvMode<'_>) -> Result<usize, NetdevError> {
        self.recv_frame(mode)
    }

    fn isr(&mut self) -> Option<NetdevEvent> {
        self.service_event()
    }

    fn get(&self, opt: NetOpt) -> Result<OptValue, NetdevError> {
        self.get_option(opt)
    }

    fn set(&mut self, value: OptValue) -> Result<(), NetdevError> {
        self.set_option(value)
    }
}

impl<R: RadioHal> Drop for RailNetdev<R> {
    fn drop(&mut self) {
        self.drain_events();
    }
}
