//! Receive path.
//!
//! `recv` works on the oldest queued frame, wherever it sits in the event
//! queue, and the frame stays held by the radio library until one of the
//! three shapes consumes it. The size query neither dequeues nor releases.
//! Dropping and delivering release the buffer and take the frame out of its
//! record: a record at the head is dequeued at once, one further back keeps
//! its other causes for `isr` and is skipped there when none are left.

use super::RailNetdev;
use crate::constants::IEEE802154_PHR_LEN;
use crate::error::NetdevError;
use crate::netdev::RecvMode;
use crate::radio::hal::{HeldPacket, RadioHal};
use crate::radio::sink::EventRecord;
use crate::util::logging::log_frame_hex;

impl<R: RadioHal> RailNetdev<R> {
    pub(super) fn recv_frame(&mut self, mode: RecvMode<'_>) -> Result<usize, NetdevError> {
        if !self.trx.state().is_initialized() {
            return Err(NetdevError::NoDevice);
        }
        match mode {
            RecvMode::QuerySize => self.pending_rx_len(),
            RecvMode::Drop => {
                let packet = self.take_pending_rx()?;
                let len = packet.info().payload_len();
                log::debug!("recv: drop packet, size {len}");
                self.release(packet);
                self.stats.rx_dropped += 1;
                Ok(len)
            }
            RecvMode::Deliver { buf, info } => {
                let packet = self.take_pending_rx()?;
                let radio = self.trx.radio();

                let held = match radio.held_packet_info(&packet) {
                    Ok(held) => held,
                    Err(err) => {
                        log::error!("Error receiving new packet / frame - msg {}", err.describe());
                        self.release(packet);
                        return Err(err.into());
                    }
                };
                let len = held.payload_len();
                if buf.len() < len {
                    log::debug!("recv: {len} byte frame does not fit {} bytes", buf.len());
                    self.release(packet);
                    self.stats.rx_dropped += 1;
                    return Err(NetdevError::NoBufferSpace {
                        needed: len,
                        available: buf.len(),
                    });
                }

                let copied = radio
                    .held_packet_details(&packet)
                    .and_then(|details| {
                        let copied =
                            radio.copy_held_packet(&packet, IEEE802154_PHR_LEN, &mut buf[..len])?;
                        Ok((details, copied))
                    });
                let (details, copied) = match copied {
                    Ok(result) => result,
                    Err(err) => {
                        log::error!("Error receiving new packet / frame - msg {}", err.describe());
                        self.release(packet);
                        return Err(err.into());
                    }
                };

                log::debug!(
                    "recv: crc {} ack {} rssi {} dBm lqi {} size {}",
                    if details.crc_passed { "passed" } else { "failed" },
                    details.is_ack,
                    details.rssi,
                    details.lqi,
                    copied
                );
                log_frame_hex("rail rx", &buf[..copied]);

                if let Some(info) = info {
                    info.rssi = details.rssi;
                    info.lqi = details.lqi;
                }

                self.release(packet);
                self.stats.rx_count += 1;
                self.stats.rx_bytes += copied as u64;
                Ok(copied)
            }
        }
    }

    /// Payload length of the oldest frame not yet taken
    fn pending_rx_len(&self) -> Result<usize, NetdevError> {
        let events = self.events.as_ref().ok_or(NetdevError::NoDevice)?;
        events
            .iter()
            .find(|record| record.is_rx())
            .and_then(EventRecord::rx_payload_len)
            .ok_or(NetdevError::NoData)
    }

    /// Take the held packet of the oldest frame out of its record.
    ///
    /// A record at the head is dequeued here, and the other causes reported
    /// in the same callback are accounted since `isr` never sees it again.
    fn take_pending_rx(&mut self) -> Result<HeldPacket, NetdevError> {
        let events = self.events.as_mut().ok_or(NetdevError::NoDevice)?;
        let offset = events
            .iter()
            .position(EventRecord::is_rx)
            .ok_or(NetdevError::NoData)?;
        let record = events.get_mut(offset).ok_or(NetdevError::NoData)?;
        let seq = record.seq;
        let packet = record.take_packet().ok_or(NetdevError::NoData)?;
        let rest = record.events;

        if offset == 0 {
            events.discard();
        }
        if self.rx_announced == Some(seq) {
            self.rx_announced = None;
        }

        if offset == 0 && !rest.is_empty() {
            if let Some(event) = self.handle_events(rest, seq) {
                self.notify(event);
            }
        }
        Ok(packet)
    }

    /// Give a held packet back to the radio library
    pub(super) fn release(&mut self, packet: HeldPacket) {
        let handle = packet.handle();
        if let Err(err) = self.trx.radio_mut().release_held_packet(packet) {
            log::error!("release of rx packet {handle} failed: {}", err.describe());
        }
    }

    /// Drop the frame waiting for `recv`, if any.
    ///
    /// Returns the payload length of the released frame.
    pub fn flush_rx(&mut self) -> Result<Option<usize>, NetdevError> {
        match self.recv_frame(RecvMode::Drop) {
            Ok(len) => Ok(Some(len)),
            Err(NetdevError::NoData) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Empty the event queue, releasing every held packet in it
    pub(super) fn drain_events(&mut self) {
        let Some(events) = self.events.as_mut() else {
            return;
        };
        let mut packets = Vec::new();
        while let Some(record) = events.poll() {
            if let Some(packet) = record.packet {
                packets.push(packet);
            }
        }
        self.rx_announced = None;

        if !packets.is_empty() {
            log::debug!("releasing {} held rx packets", packets.len());
        }
        for packet in packets {
            self.release(packet);
        }
    }
}
