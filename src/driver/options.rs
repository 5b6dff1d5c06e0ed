//! Option access for the RAIL device.
//!
//! Options the radio owns are answered here; everything else goes to the
//! generic 802.15.4 handler kept in `self.ieee`. Setters validate first and
//! leave both the radio and the cached values untouched on rejection.

use super::RailNetdev;
use crate::constants::{
    DEFAULT_CSMA_TRIES, IEEE802154_FRAME_LEN_MAX, MAX_LBT_TRIES, MAX_MHR_OVERHEAD,
};
use crate::error::{HalError, NetdevError};
use crate::netdev::opt::{NetOpt, NetoptState, OptValue};
use crate::radio::hal::RadioHal;

/// Radio failures surface as a fault on the option path
fn radio_fault(opt: NetOpt, err: HalError) -> NetdevError {
    log::error!("{opt}: radio rejected the value: {}", err.describe());
    NetdevError::Fault
}

impl<R: RadioHal> RailNetdev<R> {
    pub(super) fn get_option(&self, opt: NetOpt) -> Result<OptValue, NetdevError> {
        let value = match opt {
            NetOpt::MaxPacketSize => {
                OptValue::MaxPacketSize((IEEE802154_FRAME_LEN_MAX - MAX_MHR_OVERHEAD) as u16)
            }
            NetOpt::State => OptValue::State(self.trx.netopt_state()),
            NetOpt::TxPower => OptValue::TxPower(self.trx.radio().tx_power_ddbm() / 10),
            NetOpt::PromiscuousMode => OptValue::PromiscuousMode(self.promiscuous),
            NetOpt::AutoAck => OptValue::AutoAck(self.trx.radio().is_auto_ack_enabled()),
            NetOpt::Csma => OptValue::Csma(self.csma.enabled()),
            NetOpt::CsmaRetries => OptValue::CsmaRetries(self.csma.tries),
            NetOpt::CcaThreshold => OptValue::CcaThreshold(self.csma.cca_threshold_dbm),
            _ => return self.ieee.get(opt),
        };
        log::trace!("get {opt}: {value}");
        Ok(value)
    }

    pub(super) fn set_option(&mut self, value: OptValue) -> Result<(), NetdevError> {
        let opt = value.opt();
        log::debug!("set {opt}: {value}");

        match value {
            OptValue::Channel(requested) => {
                let band = self.params.band;
                let channel = u8::try_from(requested)
                    .ok()
                    .filter(|&chan| band.is_valid_channel(chan))
                    .ok_or_else(|| {
                        log::debug!("channel {requested} not in {band} band ({:?})", band.channels());
                        NetdevError::InvalidParameter
                    })?;
                // Applied by the next rx or tx start
                self.trx.set_channel(channel);
                self.ieee.set(value)?;
            }
            OptValue::Address(addr) => {
                self.trx
                    .radio_mut()
                    .set_short_address(u16::from_be_bytes(addr))
                    .map_err(|err| radio_fault(opt, err))?;
                self.ieee.set(value)?;
            }
            OptValue::AddressLong(mut addr) => {
                // Over-the-air order is the reverse of network order
                addr.reverse();
                self.trx
                    .radio_mut()
                    .set_long_address(addr)
                    .map_err(|err| radio_fault(opt, err))?;
                self.ieee.set(value)?;
            }
            OptValue::Nid(pan) => {
                self.trx
                    .radio_mut()
                    .set_pan_id(pan)
                    .map_err(|err| radio_fault(opt, err))?;
                self.ieee.set(value)?;
            }
            OptValue::TxPower(dbm) => {
                self.trx
                    .radio_mut()
                    .set_tx_power_ddbm(dbm.saturating_mul(10))
                    .map_err(|err| radio_fault(opt, err))?;
            }
            OptValue::State(state) => self.set_state(state)?,
            OptValue::PromiscuousMode(enable) => {
                self.trx
                    .radio_mut()
                    .set_promiscuous(enable)
                    .map_err(|err| radio_fault(opt, err))?;
                self.promiscuous = enable;
            }
            OptValue::AutoAck(enable) => {
                self.trx
                    .radio_mut()
                    .set_auto_ack(enable)
                    .map_err(|err| radio_fault(opt, err))?;
            }
            OptValue::Csma(enable) => {
                self.csma.tries = if enable { DEFAULT_CSMA_TRIES } else { 0 };
            }
            OptValue::CsmaRetries(tries) => {
                if !self.csma.enabled() || tries > MAX_LBT_TRIES {
                    return Err(NetdevError::InvalidParameter);
                }
                self.csma.tries = tries;
            }
            OptValue::CcaThreshold(dbm) => {
                self.trx
                    .radio_mut()
                    .set_cca_threshold(dbm)
                    .map_err(|err| radio_fault(opt, err))?;
                self.csma.cca_threshold_dbm = dbm;
            }
            _ => self.ieee.set(value)?,
        }
        Ok(())
    }

    fn set_state(&mut self, state: NetoptState) -> Result<(), NetdevError> {
        match state {
            NetoptState::Sleep => self.trx.sleep(),
            NetoptState::Off => self.trx.off(),
            NetoptState::Idle | NetoptState::Standby => self.trx.idle(),
            NetoptState::Rx => self.trx.start_rx(),
            NetoptState::Reset => {
                self.trx.idle()?;
                self.trx.start_rx()
            }
            NetoptState::Tx => Err(NetdevError::NotSupported),
        }
    }
}
