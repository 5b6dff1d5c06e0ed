//! Option keys and typed option values of the device contract.

use std::fmt;

/// Option keys understood by the device or the 802.15.4 fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetOpt {
    Channel,
    ChannelPage,
    /// Short address, network byte order
    Address,
    /// Long address, network byte order
    AddressLong,
    /// Length of the address used as destination default
    AddrLen,
    /// Length of the source address put in outgoing frames
    SrcLen,
    /// PAN ID
    Nid,
    /// IPv6 interface identifier derived from the link-layer address
    Ipv6Iid,
    /// Request acknowledgements for outgoing frames
    AckReq,
    MaxPacketSize,
    State,
    /// Transmit power in dBm
    TxPower,
    PromiscuousMode,
    AutoAck,
    Csma,
    CsmaRetries,
    /// CCA threshold in dBm
    CcaThreshold,
    /// Link-layer retransmissions; handled by nobody
    Retrans,
}

impl NetOpt {
    /// Every option key, in display order
    pub const ALL: [NetOpt; 18] = [
        NetOpt::Channel,
        NetOpt::ChannelPage,
        NetOpt::Address,
        NetOpt::AddressLong,
        NetOpt::AddrLen,
        NetOpt::SrcLen,
        NetOpt::Nid,
        NetOpt::Ipv6Iid,
        NetOpt::AckReq,
        NetOpt::MaxPacketSize,
        NetOpt::State,
        NetOpt::TxPower,
        NetOpt::PromiscuousMode,
        NetOpt::AutoAck,
        NetOpt::Csma,
        NetOpt::CsmaRetries,
        NetOpt::CcaThreshold,
        NetOpt::Retrans,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NetOpt::Channel => "NETOPT_CHANNEL",
            NetOpt::ChannelPage => "NETOPT_CHANNEL_PAGE",
            NetOpt::Address => "NETOPT_ADDRESS",
            NetOpt::AddressLong => "NETOPT_ADDRESS_LONG",
            NetOpt::AddrLen => "NETOPT_ADDR_LEN",
            NetOpt::SrcLen => "NETOPT_SRC_LEN",
            NetOpt::Nid => "NETOPT_NID",
            NetOpt::Ipv6Iid => "NETOPT_IPV6_IID",
            NetOpt::AckReq => "NETOPT_ACK_REQ",
            NetOpt::MaxPacketSize => "NETOPT_MAX_PACKET_SIZE",
            NetOpt::State => "NETOPT_STATE",
            NetOpt::TxPower => "NETOPT_TX_POWER",
            NetOpt::PromiscuousMode => "NETOPT_PROMISCUOUSMODE",
            NetOpt::AutoAck => "NETOPT_AUTOACK",
            NetOpt::Csma => "NETOPT_CSMA",
            NetOpt::CsmaRetries => "NETOPT_CSMA_RETRIES",
            NetOpt::CcaThreshold => "NETOPT_CCA_THRESHOLD",
            NetOpt::Retrans => "NETOPT_RETRANS",
        }
    }
}

impl fmt::Display for NetOpt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Device state as seen through the state option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetoptState {
    Off,
    Sleep,
    Idle,
    Rx,
    Tx,
    Reset,
    Standby,
}

/// A typed option value; the variant names the option it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptValue {
    Channel(u16),
    ChannelPage(u16),
    Address([u8; 2]),
    AddressLong([u8; 8]),
    AddrLen(u16),
    SrcLen(u16),
    Nid(u16),
    Ipv6Iid([u8; 8]),
    AckReq(bool),
    MaxPacketSize(u16),
    State(NetoptState),
    TxPower(i16),
    PromiscuousMode(bool),
    AutoAck(bool),
    Csma(bool),
    CsmaRetries(u8),
    CcaThreshold(i8),
    Retrans(u8),
}

impl OptValue {
    /// The option key this value is for
    pub fn opt(&self) -> NetOpt {
        match self {
            OptValue::Channel(_) => NetOpt::Channel,
            OptValue::ChannelPage(_) => NetOpt::ChannelPage,
            OptValue::Address(_) => NetOpt::Address,
            OptValue::AddressLong(_) => NetOpt::AddressLong,
            OptValue::AddrLen(_) => NetOpt::AddrLen,
            OptValue::SrcLen(_) => NetOpt::SrcLen,
            OptValue::Nid(_) => NetOpt::Nid,
            OptValue::Ipv6Iid(_) => NetOpt::Ipv6Iid,
            OptValue::AckReq(_) => NetOpt::AckReq,
            OptValue::MaxPacketSize(_) => NetOpt::MaxPacketSize,
            OptValue::State(_) => NetOpt::State,
            OptValue::TxPower(_) => NetOpt::TxPower,
            OptValue::PromiscuousMode(_) => NetOpt::PromiscuousMode,
            OptValue::AutoAck(_) => NetOpt::AutoAck,
            OptValue::Csma(_) => NetOpt::Csma,
            OptValue::CsmaRetries(_) => NetOpt::CsmaRetries,
            OptValue::CcaThreshold(_) => NetOpt::CcaThreshold,
            OptValue::Retrans(_) => NetOpt::Retrans,
        }
    }
}

impl fmt::Display for OptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptValue::Address(a) => write!(f, "{}", crate::util::hex::encode_hex(a)),
            OptValue::AddressLong(a) | OptValue::Ipv6Iid(a) => {
                let parts: Vec<String> = a.iter().map(|b| format!("{b:02x}")).collect();
                f.write_str(&parts.join(":"))
            }
            OptValue::Nid(pan) => write!(f, "0x{pan:04x}"),
            OptValue::State(state) => write!(f, "{state:?}"),
            OptValue::TxPower(dbm) => write!(f, "{dbm} dBm"),
            OptValue::CcaThreshold(dbm) => write!(f, "{dbm} dBm"),
            OptValue::Channel(v)
            | OptValue::ChannelPage(v)
            | OptValue::AddrLen(v)
            | OptValue::SrcLen(v)
            | OptValue::MaxPacketSize(v) => write!(f, "{v}"),
            OptValue::AckReq(on)
            | OptValue::PromiscuousMode(on)
            | OptValue::AutoAck(on)
            | OptValue::Csma(on) => f.write_str(if *on { "enabled" } else { "disabled" }),
            OptValue::CsmaRetries(v) | OptValue::Retrans(v) => write!(f, "{v}"),
        }
    }
}
