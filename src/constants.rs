//! IEEE 802.15.4 and Driver Constants
//!
//! This module defines the frame limits, channel plans and default radio
//! parameters used by the driver, based on IEEE 802.15.4-2006 and the
//! defaults of the radio library's 802.15.4 profile.

/// Maximum PHY service data unit length (aMaxPHYPacketSize)
pub const IEEE802154_FRAME_LEN_MAX: usize = 127;

/// Length of the frame check sequence appended by the radio
pub const IEEE802154_FCS_LEN: usize = 2;

/// Length of the PHY header (the frame length byte)
pub const IEEE802154_PHR_LEN: usize = 1;

/// Worst-case MAC header overhead subtracted for the max packet size option
pub const MAX_MHR_OVERHEAD: usize = 25;

/// Frame control field bit requesting an acknowledgement (first FCF byte)
pub const IEEE802154_FCF_ACK_REQ: u8 = 0x20;

/// Default PAN identifier
pub const IEEE802154_DEFAULT_PANID: u16 = 0x0023;

/// Short address length in bytes
pub const IEEE802154_SHORT_ADDRESS_LEN: u16 = 2;

/// Long (EUI-64) address length in bytes
pub const IEEE802154_LONG_ADDRESS_LEN: u16 = 8;

/// Lowest channel of the 2.4 GHz O-QPSK band
pub const CHANNEL_2P4GHZ_MIN: u8 = 11;

/// Highest channel of the 2.4 GHz O-QPSK band
pub const CHANNEL_2P4GHZ_MAX: u8 = 26;

/// Default 2.4 GHz channel
pub const CHANNEL_2P4GHZ_DEFAULT: u8 = 26;

/// The 868 MHz band has exactly one channel
pub const CHANNEL_868MHZ: u8 = 0;

/// Lowest channel of the 915 MHz band
pub const CHANNEL_915MHZ_MIN: u8 = 1;

/// Highest channel of the 915 MHz band
pub const CHANNEL_915MHZ_MAX: u8 = 10;

/// Default 915 MHz channel
pub const CHANNEL_915MHZ_DEFAULT: u8 = 1;

/// Default number of CSMA attempts
pub const DEFAULT_CSMA_TRIES: u8 = 5;

/// Upper bound for CSMA/LBT attempts accepted by the radio library
pub const MAX_LBT_TRIES: u8 = 15;

/// Default event queue depth (records)
pub const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 16;

/// Default number of spins for the synchronous transmit mode
pub const DEFAULT_TX_SPIN_LIMIT: u32 = 100_000;

// POSIX errno values reported (negated) through `NetdevError::errno`.

/// Operation not permitted
pub const EPERM: i32 = 1;
/// I/O error
pub const EIO: i32 = 5;
/// Bad address / fault
pub const EFAULT: i32 = 14;
/// Device or resource busy
pub const EBUSY: i32 = 16;
/// No such device
pub const ENODEV: i32 = 19;
/// Invalid argument
pub const EINVAL: i32 = 22;
/// No data available
pub const ENODATA: i32 = 61;
/// Value too large for defined data type
pub const EOVERFLOW: i32 = 75;
/// Operation not supported
pub const ENOTSUP: i32 = 95;
/// No buffer space available
pub const ENOBUFS: i32 = 105;
