//! Radio side of the driver: the library capability, the event path from
//! callback context to the consumer, and the transceiver state machine.

pub mod events;
pub mod frame;
pub mod hal;
pub mod mock;
pub mod queue;
pub mod sink;
pub mod state;

pub use events::{RadioEvent, RailEvents};
pub use frame::{OutboundFrame, MAX_PAYLOAD_LEN};
pub use hal::{
    AddressFilter, Band, CsmaConfig, HeldPacket, HeldPacketInfo, RadioConfig, RadioHal,
    RadioState, RxPacketDetails, RxPacketStatus, TxOptions,
};
pub use mock::{MockOp, MockRadio, RadioCall};
pub use queue::{Consumer, EventQueue, Producer, QueueFull, QueueStats};
pub use sink::{EventRecord, EventSink, IsrNotifier, SinkCounters};
pub use state::{Transceiver, TransceiverState};
