//! Outbound frame buffer.
//!
//! A single reusable PHY frame: byte 0 is the PHR (PSDU length including
//! the 2-byte FCS the radio appends), followed by the MAC payload.

use crate::constants::{IEEE802154_FCF_ACK_REQ, IEEE802154_FCS_LEN, IEEE802154_FRAME_LEN_MAX};
use crate::error::NetdevError;

/// Largest payload that fits next to the FCS
pub const MAX_PAYLOAD_LEN: usize = IEEE802154_FRAME_LEN_MAX - IEEE802154_FCS_LEN;

const BUFFER_LEN: usize = IEEE802154_FRAME_LEN_MAX + 1;

/// Length-prefixed frame buffer owned by one driver instance
#[derive(Clone)]
pub struct OutboundFrame {
    buf: [u8; BUFFER_LEN],
    len: usize,
}

impl Default for OutboundFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OutboundFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboundFrame")
            .field("phr", &self.buf[0])
            .field("payload", &crate::util::hex::format_hex_compact(self.payload()))
            .finish()
    }
}

impl OutboundFrame {
    pub const fn new() -> Self {
        Self {
            buf: [0; BUFFER_LEN],
            len: 0,
        }
    }

    /// Concatenate `chunks` behind the length byte.
    ///
    /// The total is checked before anything is copied, so an oversized
    /// scatter list leaves the previous frame intact. Returns the payload
    /// length.
    pub fn assemble(&mut self, chunks: &[&[u8]]) -> Result<usize, NetdevError> {
        let total: usize = chunks.iter().map(|c| c.len()).sum();
        if total > MAX_PAYLOAD_LEN {
            return Err(NetdevError::Overflow {
                len: total,
                max: MAX_PAYLOAD_LEN,
            });
        }

        let mut pos = 1;
        for chunk in chunks {
            self.buf[pos..pos + chunk.len()].copy_from_slice(chunk);
            pos += chunk.len();
        }
        // Bounded by MAX_PAYLOAD_LEN above
        self.buf[0] = (total + IEEE802154_FCS_LEN) as u8;
        self.len = total;
        Ok(total)
    }

    /// Bytes handed to the radio's transmit buffer: PHR followed by payload
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..1 + self.len]
    }

    pub fn payload(&self) -> &[u8] {
        &self.buf[1..1 + self.len]
    }

    pub fn payload_len(&self) -> usize {
        self.len
    }

    /// PSDU length announced in the PHR
    pub fn phr(&self) -> u8 {
        self.buf[0]
    }

    /// Whether the MAC header asks the receiver for an acknowledgement
    pub fn ack_requested(&self) -> bool {
        self.payload()
            .first()
            .is_some_and(|fcf| fcf & IEEE802154_FCF_ACK_REQ != 0)
    }
}
