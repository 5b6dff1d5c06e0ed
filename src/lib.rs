//! # rail-netdev - IEEE 802.15.4 Network Device on a RAIL-style Radio Library
//!
//! The rail-netdev crate bridges a callback-driven 802.15.4 radio library to a
//! poll-based network-device contract: the radio reports events from its own
//! callback context, while the network stack drives the device through
//! `init`, `send`, `recv`, `isr`, `get` and `set` from a single thread.
//!
//! ## Features
//!
//! - Lock-free single-producer/single-consumer event queue between the radio
//!   callback and the device thread
//! - Transceiver state machine that always re-arms receive after a transmit
//! - Zero-copy receive: frames stay held by the radio library until consumed
//! - Typed option access with a generic 802.15.4 fallback handler
//! - Link-layer statistics and queue counters
//! - In-memory `MockRadio` for tests and simulation
//!
//! ## Usage
//!
//! ```rust
//! use rail_netdev::{DriverParams, MockRadio, NetDevice, NetOpt, OptValue, RailNetdev};
//!
//! let radio = MockRadio::new();
//! let mut dev = RailNetdev::new(radio.clone(), DriverParams::default());
//! dev.init().unwrap();
//!
//! dev.set(OptValue::Channel(15)).unwrap();
//! assert_eq!(dev.get(NetOpt::Channel).unwrap(), OptValue::Channel(15));
//!
//! dev.send(&[&[0x41, 0x88, 0x01], &[0xca, 0xfe]]).unwrap();
//! assert_eq!(radio.tx_frames()[0][0], 7);
//! ```

pub mod config;
pub mod constants;
pub mod driver;
pub mod error;
pub mod logging;
pub mod netdev;
pub mod radio;
pub mod util;

pub use crate::config::{ConfigError, DriverParams, TxWait};
pub use crate::driver::RailNetdev;
pub use crate::error::{HalError, NetdevError};
pub use crate::logging::{init_logger, log_info};

// Device contract
pub use netdev::{
    NetDevice, NetOpt, NetStats, NetdevEvent, NetoptState, OptValue, RecvMode, RxInfo,
};

// Radio capability
pub use radio::{Band, CsmaConfig, MockRadio, RadioHal, RailEvents, TransceiverState};
