//! # Radio Library Capability
//!
//! The driver never touches radio registers itself. Everything below the
//! netdev contract (PHY configuration, CSMA/CCA timing, calibration, the
//! power amplifier) belongs to the radio library, which is reached through
//! the `RadioHal` trait defined here.
//!
//! ## Held packets
//!
//! Received frames stay in library memory until they are released. The
//! library hands the driver a `HeldPacket` for each of them; the handle is
//! neither `Clone` nor `Copy` and can only be given back through
//! `RadioHal::release_held_packet`, which consumes it. Dropping a
//! `HeldPacket` any other way is reported as a leak.

use crate::constants::{
    CHANNEL_2P4GHZ_DEFAULT, CHANNEL_2P4GHZ_MAX, CHANNEL_2P4GHZ_MIN, CHANNEL_868MHZ,
    CHANNEL_915MHZ_DEFAULT, CHANNEL_915MHZ_MAX, CHANNEL_915MHZ_MIN,
};
use crate::error::HalError;
use crate::radio::sink::EventSink;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Frequency band the radio is configured for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    /// 2.4 GHz O-QPSK, channels 11-26
    Ghz2p4,
    /// 868 MHz, channel 0 only
    Mhz868,
    /// 915 MHz, channels 1-10
    Mhz915,
}

impl Band {
    /// Channels the band accepts
    pub fn channels(self) -> RangeInclusive<u8> {
        match self {
            Band::Ghz2p4 => CHANNEL_2P4GHZ_MIN..=CHANNEL_2P4GHZ_MAX,
            Band::Mhz868 => CHANNEL_868MHZ..=CHANNEL_868MHZ,
            Band::Mhz915 => CHANNEL_915MHZ_MIN..=CHANNEL_915MHZ_MAX,
        }
    }

    pub fn default_channel(self) -> u8 {
        match self {
            Band::Ghz2p4 => CHANNEL_2P4GHZ_DEFAULT,
            Band::Mhz868 => CHANNEL_868MHZ,
            Band::Mhz915 => CHANNEL_915MHZ_DEFAULT,
        }
    }

    pub fn is_valid_channel(self, channel: u8) -> bool {
        self.channels().contains(&channel)
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Band::Ghz2p4 => "2.4 GHz",
            Band::Mhz868 => "868 MHz",
            Band::Mhz915 => "915 MHz",
        })
    }
}

/// Coarse radio state as reported by the library
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioState {
    Idle,
    Rx,
    Tx,
}

/// CSMA-CA parameters attached to every transmit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsmaConfig {
    /// Minimum backoff exponent
    pub min_backoff_exp: u8,
    /// Maximum backoff exponent
    pub max_backoff_exp: u8,
    /// Number of CCA attempts, 0 transmits immediately
    pub tries: u8,
    /// CCA threshold in dBm
    pub cca_threshold_dbm: i8,
    /// Backoff unit in microseconds
    pub cca_backoff_us: u16,
    /// CCA listen duration in microseconds
    pub cca_duration_us: u16,
    /// Overall timeout in microseconds, 0 disables it
    pub timeout_us: u32,
}

impl Default for CsmaConfig {
    fn default() -> Self {
        Self {
            min_backoff_exp: 3,
            max_backoff_exp: 5,
            tries: crate::constants::DEFAULT_CSMA_TRIES,
            cca_threshold_dbm: -75,
            cca_backoff_us: 320,
            cca_duration_us: 128,
            timeout_us: 0,
        }
    }
}

impl CsmaConfig {
    /// CSMA is off when no CCA attempt is made
    pub fn enabled(&self) -> bool {
        self.tries > 0
    }
}

/// Per-transmit options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TxOptions {
    /// Keep the receiver on for an acknowledgement after sending
    pub wait_for_ack: bool,
}

/// Parameters handed to the library at initialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioConfig {
    pub band: Band,
    pub auto_ack: bool,
    pub promiscuous: bool,
}

/// Addressing programmed into the hardware frame filter
///
/// Both addresses are in over-the-air (little-endian) byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressFilter {
    pub pan_id: u16,
    pub short_addr: u16,
    pub long_addr: [u8; 8],
}

/// Status of a held receive buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxPacketStatus {
    /// Complete, CRC-checked frame ready for copy
    Ready,
    /// Frame still being received
    InProgress,
    /// Frame aborted or corrupt
    Aborted,
    /// Receive FIFO overflowed
    Overflow,
}

/// Metadata of a held receive buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeldPacketInfo {
    pub status: RxPacketStatus,
    /// Bytes held, including the leading length byte
    pub packet_bytes: u16,
}

impl HeldPacketInfo {
    /// Payload length without the length byte
    pub fn payload_len(&self) -> usize {
        usize::from(self.packet_bytes).saturating_sub(crate::constants::IEEE802154_PHR_LEN)
    }
}

/// Signal quality of a received frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RxPacketDetails {
    /// Received signal strength in dBm
    pub rssi: i8,
    /// Link quality indicator
    pub lqi: u8,
    /// Whether the CRC passed
    pub crc_passed: bool,
    /// Whether the frame was an acknowledgement
    pub is_ack: bool,
    /// Receive timestamp in microseconds
    pub time_received_us: u32,
}

/// Ownership token for a receive buffer held by the radio library
#[must_use = "a held packet must be released back to the radio library"]
#[derive(Debug, PartialEq, Eq)]
pub struct HeldPacket {
    handle: u32,
    info: HeldPacketInfo,
}

impl HeldPacket {
    /// Wrap a library handle. Only radio implementations call this.
    pub fn new(handle: u32, info: HeldPacketInfo) -> Self {
        Self { handle, info }
    }

    /// The library handle, for lookups that do not give up ownership
    pub fn handle(&self) -> u32 {
        self.handle
    }

    pub fn info(&self) -> HeldPacketInfo {
        self.info
    }

    /// Give up the token, returning the raw handle for the library to free.
    pub fn into_raw(self) -> u32 {
        let handle = self.handle;
        std::mem::forget(self);
        handle
    }
}

impl Drop for HeldPacket {
    fn drop(&mut self) {
        log::error!(
            "held rx packet {} ({} bytes) dropped without release",
            self.handle,
            self.info.packet_bytes
        );
    }
}

/// Operations the driver consumes from the radio library.
///
/// `initialize` registers the `EventSink` the library calls from its own
/// callback context; every other method is called from the consumer thread.
pub trait RadioHal {
    /// Bring up the library and register the event sink
    fn initialize(&mut self, config: &RadioConfig, sink: EventSink) -> Result<(), HalError>;

    /// Load the channel plan of `band`
    fn configure_channels(&mut self, band: Band) -> Result<(), HalError>;

    /// Program PAN ID, short and long address into the frame filter
    fn configure_addressing(&mut self, filter: &AddressFilter) -> Result<(), HalError>;

    /// Program the short address as a numeric value
    fn set_short_address(&mut self, addr: u16) -> Result<(), HalError>;

    /// Program the long address (over-the-air byte order)
    fn set_long_address(&mut self, addr: [u8; 8]) -> Result<(), HalError>;

    /// Program the PAN ID
    fn set_pan_id(&mut self, pan_id: u16) -> Result<(), HalError>;

    /// Output power in deci-dBm
    fn tx_power_ddbm(&self) -> i16;

    /// Set the output power in deci-dBm
    fn set_tx_power_ddbm(&mut self, ddbm: i16) -> Result<(), HalError>;

    /// Enter receive on `channel`
    fn start_rx(&mut self, channel: u8) -> Result<(), HalError>;

    /// Force the radio idle, aborting any operation when `abort` is set
    fn idle(&mut self, abort: bool);

    /// Load `frame` (length byte first) into the transmit buffer
    fn write_tx_fifo(&mut self, frame: &[u8]) -> Result<usize, HalError>;

    /// Start a CSMA-gated transmit of the loaded frame
    fn start_csma_tx(
        &mut self,
        channel: u8,
        options: TxOptions,
        csma: &CsmaConfig,
    ) -> Result<(), HalError>;

    /// Current coarse radio state
    fn radio_state(&self) -> RadioState;

    /// Metadata of a held packet
    fn held_packet_info(&self, packet: &HeldPacket) -> Result<HeldPacketInfo, HalError>;

    /// RSSI, LQI and status of a held packet
    fn held_packet_details(&self, packet: &HeldPacket) -> Result<RxPacketDetails, HalError>;

    /// Copy held bytes, skipping the first `skip`, into `dest`
    fn copy_held_packet(
        &self,
        packet: &HeldPacket,
        skip: usize,
        dest: &mut [u8],
    ) -> Result<usize, HalError>;

    /// Give a held packet back to the library
    fn release_held_packet(&mut self, packet: HeldPacket) -> Result<(), HalError>;

    /// Enable or disable promiscuous reception
    fn set_promiscuous(&mut self, enable: bool) -> Result<(), HalError>;

    fn is_auto_ack_enabled(&self) -> bool;

    fn set_auto_ack(&mut self, enable: bool) -> Result<(), HalError>;

    /// Set the CCA threshold in dBm
    fn set_cca_threshold(&mut self, dbm: i8) -> Result<(), HalError>;

    /// Factory-programmed 64-bit identity
    fn eui64(&self) -> [u8; 8];
}
