//! # Transceiver State Machine
//!
//! `Transceiver` wraps the radio capability and tracks which of the six
//! driver states the device is in. All transitions run on the consumer
//! thread; the callback context only queues events, it never changes state.
//!
//! ```text
//!   Uninitialized --init--> Idle --start_rx--> Receiving
//!   Idle | Receiving --transmit--> Transmitting --finish_tx--> Receiving
//!   any initialized --sleep/off--> Sleep | Off
//! ```
//!
//! A transmit that the radio refuses still ends in Receiving, as does every
//! completed transmit: the radio is never left idle after a send attempt.

use crate::error::{HalError, NetdevError};
use crate::netdev::opt::NetoptState;
use crate::radio::hal::{CsmaConfig, RadioHal, RadioState, TxOptions};
use std::time::Instant;

/// Driver-level transceiver state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransceiverState {
    Uninitialized,
    Idle,
    Sleep,
    Off,
    Receiving,
    Transmitting,
}

impl TransceiverState {
    pub fn is_initialized(self) -> bool {
        self != TransceiverState::Uninitialized
    }
}

/// Radio capability plus the state the driver believes it is in
pub struct Transceiver<R: RadioHal> {
    radio: R,
    state: TransceiverState,
    /// Channel used by the next start_rx / transmit
    channel: u8,
    last_state_change: Option<Instant>,
}

impl<R: RadioHal> Transceiver<R> {
    pub fn new(radio: R, channel: u8) -> Self {
        Self {
            radio,
            state: TransceiverState::Uninitialized,
            channel,
            last_state_change: None,
        }
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    pub fn state(&self) -> TransceiverState {
        self.state
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Store a new channel; it is applied on the next rx or tx start.
    pub fn set_channel(&mut self, channel: u8) {
        self.channel = channel;
    }

    /// Time since the last transition, if any happened
    pub fn time_in_state(&self) -> Option<std::time::Duration> {
        self.last_state_change.map(|t| t.elapsed())
    }

    fn transition(&mut self, next: TransceiverState) {
        if next != self.state {
            match self.time_in_state() {
                Some(held) => log::debug!(
                    "State changed: {:?} -> {:?} after {:?}",
                    self.state,
                    next,
                    held
                ),
                None => log::debug!("State changed: {:?} -> {:?}", self.state, next),
            }
            self.state = next;
            self.last_state_change = Some(Instant::now());
        }
    }

    /// Uninitialized -> Idle after a successful bring-up
    pub fn mark_initialized(&mut self) {
        if self.state == TransceiverState::Uninitialized {
            self.transition(TransceiverState::Idle);
        }
    }

    /// Back to Uninitialized, used before a re-initialization
    pub fn reset(&mut self) {
        self.radio.idle(true);
        self.transition(TransceiverState::Uninitialized);
    }

    /// Enter Receiving on the configured channel.
    ///
    /// On failure the radio is left idle and the state says so.
    pub fn start_rx(&mut self) -> Result<(), NetdevError> {
        if !self.state.is_initialized() {
            return Err(NetdevError::NotPermitted);
        }
        match self.radio.start_rx(self.channel) {
            Ok(()) => {
                self.transition(TransceiverState::Receiving);
                Ok(())
            }
            Err(err) => {
                log::error!("start rx on channel {} failed: {}", self.channel, err.describe());
                self.transition(TransceiverState::Idle);
                Err(err.into())
            }
        }
    }

    /// Whether a transmit may start now: one in flight at a time, and
    /// only from Idle or Receiving
    pub fn ready_to_transmit(&self) -> Result<(), NetdevError> {
        match self.state {
            TransceiverState::Idle | TransceiverState::Receiving => Ok(()),
            TransceiverState::Transmitting => Err(NetdevError::Busy),
            TransceiverState::Uninitialized | TransceiverState::Sleep | TransceiverState::Off => {
                Err(NetdevError::NotPermitted)
            }
        }
    }

    /// Idle/Receiving -> Transmitting.
    ///
    /// Aborts any receive in progress, loads `frame` and starts a CSMA-gated
    /// transmit. If the radio rejects either step, receive is re-armed and
    /// the radio's error is returned.
    pub fn transmit(
        &mut self,
        frame: &[u8],
        options: TxOptions,
        csma: &CsmaConfig,
    ) -> Result<(), NetdevError> {
        self.ready_to_transmit()?;
        self.radio.idle(true);

        let submitted = self
            .radio
            .write_tx_fifo(frame)
            .and_then(|written| {
                if written < frame.len() {
                    Err(HalError::Failed(format!(
                        "tx fifo accepted {written} of {} bytes",
                        frame.len()
                    )))
                } else {
                    Ok(())
                }
            })
            .and_then(|()| self.radio.start_csma_tx(self.channel, options, csma));

        match submitted {
            Ok(()) => {
                self.transition(TransceiverState::Transmitting);
                Ok(())
            }
            Err(err) => {
                log::error!("Can not send data: {}", err.describe());
                self.transition(TransceiverState::Idle);
                // The submission error is what the caller needs to see
                let _ = self.start_rx();
                Err(err.into())
            }
        }
    }

    /// Transmitting -> Receiving once the radio reported the end of a transmit.
    ///
    /// Returns `Ok(false)` when no transmit was in flight.
    pub fn finish_tx(&mut self) -> Result<bool, NetdevError> {
        if self.state != TransceiverState::Transmitting {
            return Ok(false);
        }
        self.transition(TransceiverState::Idle);
        self.start_rx()?;
        Ok(true)
    }

    /// Whether the radio itself still reports an active transmit
    pub fn radio_busy_tx(&self) -> bool {
        self.radio.radio_state() == RadioState::Tx
    }

    /// Force the radio idle
    pub fn idle(&mut self) -> Result<(), NetdevError> {
        if !self.state.is_initialized() {
            return Err(NetdevError::NotPermitted);
        }
        self.radio.idle(true);
        self.transition(TransceiverState::Idle);
        Ok(())
    }

    pub fn sleep(&mut self) -> Result<(), NetdevError> {
        self.power_down(TransceiverState::Sleep)
    }

    pub fn off(&mut self) -> Result<(), NetdevError> {
        self.power_down(TransceiverState::Off)
    }

    fn power_down(&mut self, next: TransceiverState) -> Result<(), NetdevError> {
        if !self.state.is_initialized() {
            return Err(NetdevError::NotPermitted);
        }
        self.radio.idle(true);
        self.transition(next);
        Ok(())
    }

    /// State as reported through the state option
    pub fn netopt_state(&self) -> NetoptState {
        match self.state {
            TransceiverState::Uninitialized | TransceiverState::Off => NetoptState::Off,
            TransceiverState::Sleep => NetoptState::Sleep,
            _ => match self.radio.radio_state() {
                RadioState::Rx => NetoptState::Rx,
                RadioState::Tx => NetoptState::Tx,
                RadioState::Idle => NetoptState::Idle,
            },
        }
    }
}
