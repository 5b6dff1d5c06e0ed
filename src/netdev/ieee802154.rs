//! # Generic IEEE 802.15.4 Options
//!
//! Options every 802.15.4 device carries regardless of its radio: channel,
//! channel page, PAN ID, the two link-layer addresses and the address mode
//! flags. A device driver handles what it knows first and hands every other
//! option to `Ieee802154Options::get` / `set`.
//!
//! Addresses are stored in network (big-endian) byte order.

use crate::constants::{
    IEEE802154_DEFAULT_PANID, IEEE802154_LONG_ADDRESS_LEN, IEEE802154_SHORT_ADDRESS_LEN,
};
use crate::error::NetdevError;
use crate::netdev::opt::{NetOpt, OptValue};

/// State of the generic option layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ieee802154Options {
    pub chan: u8,
    pub page: u8,
    pub pan: u16,
    pub short_addr: [u8; 2],
    pub long_addr: [u8; 8],
    /// Use the long address as source of outgoing frames
    pub src_long: bool,
    pub ack_req: bool,
}

impl Default for Ieee802154Options {
    fn default() -> Self {
        Self {
            chan: 0,
            page: 0,
            pan: IEEE802154_DEFAULT_PANID,
            short_addr: [0; 2],
            long_addr: [0; 8],
            src_long: false,
            ack_req: true,
        }
    }
}

impl Ieee802154Options {
    /// Defaults derived from a factory EUI-64.
    ///
    /// The long address is the EUI-64 itself; the short address is its last
    /// two bytes with the top bit cleared, which keeps it out of the
    /// broadcast and "no short address" range.
    pub fn from_eui64(eui64: [u8; 8], pan: u16, chan: u8) -> Self {
        Self {
            chan,
            pan,
            short_addr: [eui64[6] & 0x7f, eui64[7]],
            long_addr: eui64,
            ..Self::default()
        }
    }

    /// Short address as the radio expects it
    pub fn short_addr_value(&self) -> u16 {
        u16::from_be_bytes(self.short_addr)
    }

    /// Long address in over-the-air byte order
    pub fn long_addr_ota(&self) -> [u8; 8] {
        let mut ota = self.long_addr;
        ota.reverse();
        ota
    }

    fn src_len(&self) -> u16 {
        if self.src_long {
            IEEE802154_LONG_ADDRESS_LEN
        } else {
            IEEE802154_SHORT_ADDRESS_LEN
        }
    }

    /// IPv6 interface identifier for the current source address mode
    pub fn ipv6_iid(&self) -> [u8; 8] {
        if self.src_long {
            let mut iid = self.long_addr;
            iid[0] ^= 0x02;
            iid
        } else {
            // 0000:00ff:fe00:XXXX
            [0, 0, 0, 0xff, 0xfe, 0, self.short_addr[0], self.short_addr[1]]
        }
    }

    pub fn get(&self, opt: NetOpt) -> Result<OptValue, NetdevError> {
        let value = match opt {
            NetOpt::Channel => OptValue::Channel(u16::from(self.chan)),
            NetOpt::ChannelPage => OptValue::ChannelPage(u16::from(self.page)),
            NetOpt::Address => OptValue::Address(self.short_addr),
            NetOpt::AddressLong => OptValue::AddressLong(self.long_addr),
            NetOpt::AddrLen => OptValue::AddrLen(self.src_len()),
            NetOpt::SrcLen => OptValue::SrcLen(self.src_len()),
            NetOpt::Nid => OptValue::Nid(self.pan),
            NetOpt::Ipv6Iid => OptValue::Ipv6Iid(self.ipv6_iid()),
            NetOpt::AckReq => OptValue::AckReq(self.ack_req),
            _ => return Err(NetdevError::NotSupported),
        };
        Ok(value)
    }

    pub fn set(&mut self, value: OptValue) -> Result<(), NetdevError> {
        match value {
            OptValue::Channel(chan) => {
                self.chan = u8::try_from(chan).map_err(|_| NetdevError::InvalidParameter)?;
            }
            OptValue::ChannelPage(page) => {
                if page != 0 {
                    return Err(NetdevError::InvalidParameter);
                }
                self.page = 0;
            }
            OptValue::Address(addr) => self.short_addr = addr,
            OptValue::AddressLong(addr) => self.long_addr = addr,
            OptValue::AddrLen(len) | OptValue::SrcLen(len) => {
                self.src_long = match len {
                    IEEE802154_SHORT_ADDRESS_LEN => false,
                    IEEE802154_LONG_ADDRESS_LEN => true,
                    _ => return Err(NetdevError::InvalidParameter),
                };
            }
            OptValue::Nid(pan) => self.pan = pan,
            OptValue::AckReq(on) => self.ack_req = on,
            _ => return Err(NetdevError::NotSupported),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EUI: [u8; 8] = [0x00, 0x0b, 0x57, 0xff, 0xfe, 0x12, 0xb4, 0x56];

    #[test]
    fn test_defaults_from_eui64() {
        let opts = Ieee802154Options::from_eui64(EUI, 0x1234, 26);
        assert_eq!(opts.long_addr, EUI);
        assert_eq!(opts.short_addr, [0x34, 0x56]);
        assert_eq!(opts.short_addr_value(), 0x3456);
        assert_eq!(opts.pan, 0x1234);
        assert_eq!(opts.chan, 26);
        assert!(opts.ack_req);
    }

    #[test]
    fn test_long_addr_ota_order() {
        let opts = Ieee802154Options::from_eui64(EUI, 0x23, 11);
        assert_eq!(
            opts.long_addr_ota(),
            [0x56, 0xb4, 0x12, 0xfe, 0xff, 0x57, 0x0b, 0x00]
        );
    }

    #[test]
    fn test_ipv6_iid() {
        let mut opts = Ieee802154Options::from_eui64(EUI, 0x23, 11);
        assert_eq!(
            opts.get(NetOpt::Ipv6Iid).unwrap(),
            OptValue::Ipv6Iid([0, 0, 0, 0xff, 0xfe, 0, 0x34, 0x56])
        );

        opts.set(OptValue::SrcLen(8)).unwrap();
        assert_eq!(
            opts.get(NetOpt::Ipv6Iid).unwrap(),
            OptValue::Ipv6Iid([0x02, 0x0b, 0x57, 0xff, 0xfe, 0x12, 0xb4, 0x56])
        );
        assert_eq!(opts.get(NetOpt::AddrLen).unwrap(), OptValue::AddrLen(8));
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut opts = Ieee802154Options::default();
        assert_eq!(
            opts.set(OptValue::SrcLen(4)),
            Err(NetdevError::InvalidParameter)
        );
        assert_eq!(
            opts.set(OptValue::ChannelPage(2)),
            Err(NetdevError::InvalidParameter)
        );
        assert_eq!(
            opts.set(OptValue::Channel(300)),
            Err(NetdevError::InvalidParameter)
        );
        assert_eq!(opts, Ieee802154Options::default());
    }

    #[test]
    fn test_unknown_options() {
        let mut opts = Ieee802154Options::default();
        assert_eq!(opts.get(NetOpt::TxPower), Err(NetdevError::NotSupported));
        assert_eq!(
            opts.set(OptValue::Retrans(3)),
            Err(NetdevError::NotSupported)
        );
    }

    #[test]
    fn test_store_addressing() {
        let mut opts = Ieee802154Options::default();
        opts.set(OptValue::Address([0xbe, 0xef])).unwrap();
        opts.set(OptValue::Nid(0xabcd)).unwrap();
        opts.set(OptValue::AckReq(false)).unwrap();

        assert_eq!(opts.get(NetOpt::Address).unwrap(), OptValue::Address([0xbe, 0xef]));
        assert_eq!(opts.get(NetOpt::Nid).unwrap(), OptValue::Nid(0xabcd));
        assert_eq!(opts.get(NetOpt::AckReq).unwrap(), OptValue::AckReq(false));
    }
}
