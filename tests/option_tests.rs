//! Option handling through the public device contract.

use rail_netdev::radio::{MockOp, RadioCall};
use rail_netdev::{
    Band, DriverParams, HalError, MockRadio, NetDevice, NetOpt, NetdevError, NetoptState,
    OptValue, RailNetdev,
};

fn device(params: DriverParams) -> (MockRadio, RailNetdev<MockRadio>) {
    let radio = MockRadio::new();
    let mut dev = RailNetdev::new(radio.clone(), params);
    dev.init().unwrap();
    (radio, dev)
}

#[test]
fn test_channel_outside_band_is_rejected() {
    let (radio, mut dev) = device(DriverParams::default());
    dev.set(OptValue::Channel(20)).unwrap();
    radio.clear_calls();

    for bad in [10, 27, 300] {
        assert_eq!(
            dev.set(OptValue::Channel(bad)),
            Err(NetdevError::InvalidParameter)
        );
    }
    assert_eq!(dev.get(NetOpt::Channel), Ok(OptValue::Channel(20)));
    assert_eq!(dev.channel(), 20);
    assert!(radio.calls().is_empty());
}

#[test]
fn test_channel_change_applies_on_next_rx() {
    let (radio, mut dev) = device(DriverParams::default());
    dev.set(OptValue::Channel(11)).unwrap();
    assert_eq!(radio.calls().last(), Some(&RadioCall::StartRx(26)));

    dev.rearm_rx().unwrap();
    assert_eq!(radio.calls().last(), Some(&RadioCall::StartRx(11)));

    dev.send(&[&[0x41, 0x88]]).unwrap();
    let channel = radio.calls().iter().rev().find_map(|call| match call {
        RadioCall::StartCsmaTx { channel, .. } => Some(*channel),
        _ => None,
    });
    assert_eq!(channel, Some(11));
}

#[test]
fn test_sub_ghz_channel_plans() {
    let (_radio, mut dev) = device(DriverParams::for_band(Band::Mhz868));
    assert_eq!(dev.get(NetOpt::Channel), Ok(OptValue::Channel(0)));
    assert_eq!(
        dev.set(OptValue::Channel(1)),
        Err(NetdevError::InvalidParameter)
    );

    let (_radio, mut dev) = device(DriverParams::for_band(Band::Mhz915));
    assert_eq!(dev.get(NetOpt::Channel), Ok(OptValue::Channel(1)));
    dev.set(OptValue::Channel(10)).unwrap();
    assert_eq!(
        dev.set(OptValue::Channel(11)),
        Err(NetdevError::InvalidParameter)
    );
    assert_eq!(dev.get(NetOpt::Channel), Ok(OptValue::Channel(10)));
}

#[test]
fn test_default_addresses_from_eui64() {
    let radio = MockRadio::with_eui64([0x02, 0x11, 0x22, 0x33, 0x44, 0x55, 0xc6, 0x77]);
    let mut dev = RailNetdev::new(radio, DriverParams::default());
    dev.init().unwrap();

    assert_eq!(dev.get(NetOpt::Address), Ok(OptValue::Address([0x46, 0x77])));
    assert_eq!(
        dev.get(NetOpt::AddressLong),
        Ok(OptValue::AddressLong([0x02, 0x11, 0x22, 0x33, 0x44, 0x55, 0xc6, 0x77]))
    );
    assert_eq!(dev.get(NetOpt::Nid), Ok(OptValue::Nid(0x0023)));

    assert_eq!(
        dev.get(NetOpt::Ipv6Iid),
        Ok(OptValue::Ipv6Iid([0, 0, 0, 0xff, 0xfe, 0, 0x46, 0x77]))
    );
    dev.set(OptValue::SrcLen(8)).unwrap();
    assert_eq!(
        dev.get(NetOpt::Ipv6Iid),
        Ok(OptValue::Ipv6Iid([0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0xc6, 0x77]))
    );
}

#[test]
fn test_short_address_and_pan_programmed() {
    let (radio, mut dev) = device(DriverParams::default());
    dev.set(OptValue::Address([0x12, 0x34])).unwrap();
    dev.set(OptValue::Nid(0xbeef)).unwrap();

    let filter = radio.addressing().unwrap();
    assert_eq!(filter.short_addr, 0x1234);
    assert_eq!(filter.pan_id, 0xbeef);
    assert_eq!(dev.get(NetOpt::Address), Ok(OptValue::Address([0x12, 0x34])));
}

#[test]
fn test_promiscuous_cached_only_after_success() {
    let (radio, mut dev) = device(DriverParams::default());
    radio.fail_on(MockOp::SetPromiscuous, HalError::InvalidCall);
    assert_eq!(
        dev.set(OptValue::PromiscuousMode(true)),
        Err(NetdevError::Fault)
    );
    assert_eq!(
        dev.get(NetOpt::PromiscuousMode),
        Ok(OptValue::PromiscuousMode(false))
    );

    radio.clear_failures();
    dev.set(OptValue::PromiscuousMode(true)).unwrap();
    assert!(radio.is_promiscuous());
    assert_eq!(
        dev.get(NetOpt::PromiscuousMode),
        Ok(OptValue::PromiscuousMode(true))
    );
}

#[test]
fn test_auto_ack_reads_radio() {
    let (_radio, mut dev) = device(DriverParams::default());
    assert_eq!(dev.get(NetOpt::AutoAck), Ok(OptValue::AutoAck(true)));
    dev.set(OptValue::AutoAck(false)).unwrap();
    assert_eq!(dev.get(NetOpt::AutoAck), Ok(OptValue::AutoAck(false)));
}

#[test]
fn test_cca_threshold() {
    let (radio, mut dev) = device(DriverParams::default());
    assert_eq!(dev.get(NetOpt::CcaThreshold), Ok(OptValue::CcaThreshold(-75)));

    dev.set(OptValue::CcaThreshold(-82)).unwrap();
    assert_eq!(radio.cca_threshold(), -82);
    assert_eq!(dev.csma().cca_threshold_dbm, -82);
}

#[test]
fn test_csma_settings_reach_transmit() {
    let (radio, mut dev) = device(DriverParams::default());
    dev.set(OptValue::Csma(false)).unwrap();
    dev.send(&[&[0x41, 0x88]]).unwrap();

    let tries = radio.calls().iter().find_map(|call| match call {
        RadioCall::StartCsmaTx { csma, .. } => Some(csma.tries),
        _ => None,
    });
    assert_eq!(tries, Some(0));
}

#[test]
fn test_state_option_round_trip() {
    let (_radio, mut dev) = device(DriverParams::default());

    dev.set(OptValue::State(NetoptState::Idle)).unwrap();
    assert_eq!(dev.get(NetOpt::State), Ok(OptValue::State(NetoptState::Idle)));

    dev.set(OptValue::State(NetoptState::Off)).unwrap();
    assert_eq!(dev.get(NetOpt::State), Ok(OptValue::State(NetoptState::Off)));
    assert_eq!(dev.send(&[&[1]]), Err(NetdevError::NotPermitted));

    dev.set(OptValue::State(NetoptState::Rx)).unwrap();
    assert_eq!(dev.get(NetOpt::State), Ok(OptValue::State(NetoptState::Rx)));
}

#[test]
fn test_fallback_options() {
    let (_radio, mut dev) = device(DriverParams::default());

    assert_eq!(dev.get(NetOpt::ChannelPage), Ok(OptValue::ChannelPage(0)));
    assert_eq!(
        dev.set(OptValue::ChannelPage(2)),
        Err(NetdevError::InvalidParameter)
    );

    dev.set(OptValue::SrcLen(8)).unwrap();
    assert_eq!(dev.get(NetOpt::SrcLen), Ok(OptValue::SrcLen(8)));
    assert_eq!(
        dev.set(OptValue::AddrLen(4)),
        Err(NetdevError::InvalidParameter)
    );
}

#[test]
fn test_every_option_answers() {
    let (_radio, dev) = device(DriverParams::default());
    for opt in NetOpt::ALL {
        match dev.get(opt) {
            Ok(value) => assert_eq!(value.opt(), opt),
            Err(err) => {
                assert_eq!(opt, NetOpt::Retrans);
                assert_eq!(err, NetdevError::NotSupported);
            }
        }
    }
}
