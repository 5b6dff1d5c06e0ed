//! # Network Device Contract
//!
//! The fixed interface a network stack drives a device through: `init`,
//! `send`, `recv`, `isr`, `get` and `set`, plus the asynchronous
//! notifications a device raises through its event callback.
//!
//! ## Receive shapes
//!
//! A received frame is consumed with exactly one of three `recv` calls:
//!
//! | `buf`  | `len` | shape          | effect                                  |
//! |--------|-------|----------------|-----------------------------------------|
//! | none   | 0     | `QuerySize`    | payload length, frame stays pending     |
//! | none   | > 0   | `Drop`         | payload length, frame released          |
//! | some   | any   | `Deliver`      | payload copied, frame released          |
//!
//! `RecvMode::from_sentinels` maps the classic pointer/length pair onto
//! these shapes.

pub mod ieee802154;
pub mod opt;
pub mod stats;

pub use ieee802154::Ieee802154Options;
pub use opt::{NetOpt, NetoptState, OptValue};
pub use stats::NetStats;

use crate::error::NetdevError;
use std::sync::Arc;

/// Notifications raised by a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetdevEvent {
    /// An event is pending; call `isr` from the device's thread
    Isr,
    RxComplete,
    TxComplete,
    TxNoAck,
    TxMediumBusy,
    CrcError,
}

/// Event callback registered by the owner of a device
pub type EventCallback = Arc<dyn Fn(NetdevEvent) + Send + Sync>;

/// Signal quality of a delivered frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RxInfo {
    /// Received signal strength in dBm
    pub rssi: i8,
    /// Link quality indicator
    pub lqi: u8,
}

/// Which of the three receive shapes a `recv` call performs
#[derive(Debug)]
pub enum RecvMode<'a> {
    /// Report the payload length, leave the frame pending
    QuerySize,
    /// Report the payload length and release the frame
    Drop,
    /// Copy the payload into `buf` and release the frame
    Deliver {
        buf: &'a mut [u8],
        info: Option<&'a mut RxInfo>,
    },
}

impl<'a> RecvMode<'a> {
    /// Select the shape from a (buffer, length) sentinel pair.
    ///
    /// With a buffer, `len` limits how much of it may be used.
    pub fn from_sentinels(
        buf: Option<&'a mut [u8]>,
        len: usize,
        info: Option<&'a mut RxInfo>,
    ) -> Self {
        match buf {
            None if len == 0 => RecvMode::QuerySize,
            None => RecvMode::Drop,
            Some(buf) => {
                let usable = len.min(buf.len());
                let (buf, _) = buf.split_at_mut(usable);
                RecvMode::Deliver { buf, info }
            }
        }
    }
}

/// Operations a network stack performs on a device
pub trait NetDevice {
    /// Bring the device up. On error the device must not be used further.
    fn init(&mut self) -> Result<(), NetdevError>;

    /// Transmit the concatenation of `chunks`; returns the payload length.
    fn send(&mut self, chunks: &[&[u8]]) -> Result<usize, NetdevError>;

    /// Perform one of the receive shapes on the pending frame.
    fn recv(&mut self, mode: RecvMode<'_>) -> Result<usize, NetdevError>;

    /// Process one pending event; returns the notification it produced.
    fn isr(&mut self) -> Option<NetdevEvent>;

    fn get(&self, opt: NetOpt) -> Result<OptValue, NetdevError>;

    fn set(&mut self, value: OptValue) -> Result<(), NetdevError>;
}
