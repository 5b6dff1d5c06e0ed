//! Link-layer statistics.

use std::fmt;

/// Counters kept by a device over its lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetStats {
    /// Frames handed to the radio
    pub tx_count: u64,
    /// Payload bytes handed to the radio
    pub tx_bytes: u64,
    /// Transmits the radio refused to start
    pub tx_failed: u64,
    /// Frames delivered to the caller
    pub rx_count: u64,
    /// Payload bytes delivered to the caller
    pub rx_bytes: u64,
    /// Frames dropped on request or for lack of buffer space
    pub rx_dropped: u64,
    pub crc_errors: u64,
    pub address_filtered: u64,
    pub tx_no_ack: u64,
    pub tx_medium_busy: u64,
    /// Transmits aborted, blocked or underflowed
    pub tx_aborted: u64,
    pub calibration_requests: u64,
    /// Event records lost to a full queue
    pub queue_overflows: u64,
    /// Received frames rejected in callback context
    pub malformed_rx: u64,
}

impl NetStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for NetStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "tx: {} frames, {} bytes, {} failed", self.tx_count, self.tx_bytes, self.tx_failed)?;
        writeln!(
            f,
            "rx: {} frames, {} bytes, {} dropped",
            self.rx_count, self.rx_bytes, self.rx_dropped
        )?;
        writeln!(
            f,
            "errors: crc {}, filtered {}, no-ack {}, busy {}, aborted {}",
            self.crc_errors,
            self.address_filtered,
            self.tx_no_ack,
            self.tx_medium_busy,
            self.tx_aborted
        )?;
        write!(
            f,
            "radio: calibration {}, queue overflows {}, malformed {}",
            self.calibration_requests, self.queue_overflows, self.malformed_rx
        )
    }
}
