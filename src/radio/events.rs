//! # Radio Event Flags
//!
//! The radio library reports one or more simultaneous conditions per
//! callback as a bitmask. `RailEvents` carries that mask through the event
//! queue; `RadioEvent::decode` turns it into the single condition the
//! consumer acts on.
//!
//! ## Precedence
//!
//! When several causes are set in one raw event, the highest one wins:
//!
//! ```text
//! packet received > tx sent > ack timeout > frame error > address filtered
//!   > channel busy > tx aborted > tx blocked > tx underflow
//!   > calibration needed > data request command
//! ```

use bitflags::bitflags;

bitflags! {
    /// Raw event mask delivered by the radio library callback
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RailEvents: u32 {
        /// A frame was received and is held by the library
        const RX_PACKET_RECEIVED = 1 << 0;
        /// The outbound frame left the antenna
        const TX_PACKET_SENT = 1 << 1;
        /// No acknowledgement arrived for a frame that requested one
        const RX_ACK_TIMEOUT = 1 << 2;
        /// A frame was received with a CRC or framing error
        const RX_FRAME_ERROR = 1 << 3;
        /// A frame was dropped by the address filter
        const RX_ADDRESS_FILTERED = 1 << 4;
        /// CSMA gave up because the channel stayed busy
        const TX_CHANNEL_BUSY = 1 << 5;
        /// The transmit was aborted (e.g. by forcing idle)
        const TX_ABORTED = 1 << 6;
        /// The transmit was held off
        const TX_BLOCKED = 1 << 7;
        /// The transmit FIFO ran dry while sending
        const TX_UNDERFLOW = 1 << 8;
        /// The radio asks for a calibration run
        const CAL_NEEDED = 1 << 9;
        /// A MAC data request command was received
        const IEEE802154_DATA_REQUEST_COMMAND = 1 << 10;
    }
}

impl RailEvents {
    /// Conditions that end a transmit attempt
    pub const TX_COMPLETION: RailEvents = RailEvents::TX_PACKET_SENT
        .union(RailEvents::RX_ACK_TIMEOUT)
        .union(RailEvents::TX_CHANNEL_BUSY)
        .union(RailEvents::TX_ABORTED)
        .union(RailEvents::TX_BLOCKED)
        .union(RailEvents::TX_UNDERFLOW);

    /// Whether this mask finishes an in-flight transmit
    pub fn ends_transmit(self) -> bool {
        self.intersects(Self::TX_COMPLETION)
    }
}

/// The single condition selected from a raw event mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioEvent {
    PacketReceived,
    TxSent,
    AckTimeout,
    FrameError,
    AddressFiltered,
    ChannelBusy,
    TxAborted,
    TxBlocked,
    TxUnderflow,
    CalibrationNeeded,
    DataRequestCommand,
}

/// Decode order, highest precedence first
const PRECEDENCE: [(RailEvents, RadioEvent); 11] = [
    (RailEvents::RX_PACKET_RECEIVED, RadioEvent::PacketReceived),
    (RailEvents::TX_PACKET_SENT, RadioEvent::TxSent),
    (RailEvents::RX_ACK_TIMEOUT, RadioEvent::AckTimeout),
    (RailEvents::RX_FRAME_ERROR, RadioEvent::FrameError),
    (RailEvents::RX_ADDRESS_FILTERED, RadioEvent::AddressFiltered),
    (RailEvents::TX_CHANNEL_BUSY, RadioEvent::ChannelBusy),
    (RailEvents::TX_ABORTED, RadioEvent::TxAborted),
    (RailEvents::TX_BLOCKED, RadioEvent::TxBlocked),
    (RailEvents::TX_UNDERFLOW, RadioEvent::TxUnderflow),
    (RailEvents::CAL_NEEDED, RadioEvent::CalibrationNeeded),
    (
        RailEvents::IEEE802154_DATA_REQUEST_COMMAND,
        RadioEvent::DataRequestCommand,
    ),
];

impl RadioEvent {
    /// Pick the highest-precedence condition in `events`, if any.
    pub fn decode(events: RailEvents) -> Option<RadioEvent> {
        PRECEDENCE
            .iter()
            .find(|(flag, _)| events.contains(*flag))
            .map(|&(_, event)| event)
    }

    /// Every condition in `events`, in precedence order
    pub fn all(events: RailEvents) -> impl Iterator<Item = RadioEvent> {
        PRECEDENCE
            .iter()
            .filter(move |(flag, _)| events.contains(*flag))
            .map(|&(_, event)| event)
    }

    /// Short name for logs
    pub fn name(self) -> &'static str {
        match self {
            RadioEvent::PacketReceived => "rx packet received",
            RadioEvent::TxSent => "tx packet sent",
            RadioEvent::AckTimeout => "rx ack timeout",
            RadioEvent::FrameError => "rx frame error",
            RadioEvent::AddressFiltered => "rx address filtered",
            RadioEvent::ChannelBusy => "tx channel busy",
            RadioEvent::TxAborted => "tx aborted",
            RadioEvent::TxBlocked => "tx blocked",
            RadioEvent::TxUnderflow => "tx underflow",
            RadioEvent::CalibrationNeeded => "calibration needed",
            RadioEvent::DataRequestCommand => "data request command",
        }
    }
}
