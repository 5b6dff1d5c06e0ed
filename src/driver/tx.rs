//! Transmit path: scatter-gather assembly, submission, optional spin-wait.

use super::RailNetdev;
use crate::config::TxWait;
use crate::error::NetdevError;
use crate::radio::hal::{RadioHal, TxOptions};
use crate::util::logging::{log_frame_hex, span_radio_op};

impl<R: RadioHal> RailNetdev<R> {
    pub(super) fn send_frame(&mut self, chunks: &[&[u8]]) -> Result<usize, NetdevError> {
        let _span = span_radio_op("send", self.trx.channel());

        // Refuse before touching the frame buffer of an in-flight transmit
        self.trx.ready_to_transmit()?;

        let len = self.frame.assemble(chunks).map_err(|err| {
            log::debug!("[rail] error: {err}");
            err
        })?;

        let options = TxOptions {
            wait_for_ack: self.frame.ack_requested(),
        };
        log_frame_hex("rail tx", self.frame.payload());

        // Completions already queued belong to an earlier transmit
        self.tx_seq_floor = self
            .sink_counters
            .as_ref()
            .map_or(0, |counters| counters.last_seq());
        if let Err(err) = self.trx.transmit(self.frame.as_bytes(), options, &self.csma) {
            self.stats.tx_failed += 1;
            return Err(err);
        }
        self.stats.tx_count += 1;
        self.stats.tx_bytes += len as u64;

        if let TxWait::Spin { max_spins } = self.params.tx_wait {
            self.spin_until_sent(max_spins)?;
        }
        Ok(len)
    }

    /// Busy-wait while the radio reports tx, then re-arm receive.
    ///
    /// This is the one blocking point of the driver; it never sleeps or
    /// yields. The completion event still arrives through the queue.
    fn spin_until_sent(&mut self, max_spins: u32) -> Result<(), NetdevError> {
        let mut spins = 0u32;
        while self.trx.radio_busy_tx() {
            if spins >= max_spins {
                log::warn!("transmit still active after {max_spins} spins, aborting");
                self.stats.tx_aborted += 1;
                self.trx.radio_mut().idle(true);
                self.trx.finish_tx()?;
                return Err(NetdevError::Io(format!(
                    "transmit did not complete within {max_spins} spins"
                )));
            }
            spins += 1;
            std::hint::spin_loop();
        }
        log::trace!("transmit done after {spins} spins");
        self.trx.finish_tx()?;
        Ok(())
    }
}
