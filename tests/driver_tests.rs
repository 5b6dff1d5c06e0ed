//! End-to-end driver scenarios against the in-memory radio.

use proptest::prelude::*;
use rail_netdev::radio::{MockOp, RadioCall, RadioState, RxPacketStatus};
use rail_netdev::{
    DriverParams, HalError, MockRadio, NetDevice, NetdevError, NetdevEvent, RadioHal, RailEvents,
    RailNetdev, RecvMode, RxInfo, TransceiverState, TxWait,
};
use std::sync::{Arc, Mutex};

fn device() -> (MockRadio, RailNetdev<MockRadio>) {
    let radio = MockRadio::new();
    let mut dev = RailNetdev::new(radio.clone(), DriverParams::default());
    dev.init().unwrap();
    (radio, dev)
}

#[test]
fn test_busy_then_received_frame() {
    let (radio, mut dev) = device();
    radio.inject_events(RailEvents::TX_CHANNEL_BUSY);
    let handle = radio.inject_rx(&[0x5a; 19], -61, 203);
    assert_eq!(dev.pending_events(), 2);

    // The frame is reachable while the busy record is still queued
    assert_eq!(dev.recv(RecvMode::QuerySize).unwrap(), 19);
    assert_eq!(dev.pending_events(), 2);
    assert!(radio.is_held(handle));

    let mut buf = [0u8; 32];
    let len = dev
        .recv(RecvMode::Deliver {
            buf: &mut buf,
            info: None,
        })
        .unwrap();
    assert_eq!(len, 19);
    assert_eq!(&buf[..19], &[0x5a; 19]);
    assert!(!radio.is_held(handle));
    assert_eq!(dev.pending_events(), 1);
    assert_eq!(dev.recv(RecvMode::QuerySize), Err(NetdevError::NoData));

    assert_eq!(dev.isr(), Some(NetdevEvent::TxMediumBusy));
    assert_eq!(dev.isr(), None);
    assert_eq!(dev.pending_events(), 0);
}

#[test]
fn test_busy_then_received_frame_after_isr() {
    let (radio, mut dev) = device();
    radio.inject_events(RailEvents::TX_CHANNEL_BUSY);
    radio.inject_rx(&[0x5a; 19], -61, 203);

    assert_eq!(dev.isr(), Some(NetdevEvent::TxMediumBusy));
    assert_eq!(dev.isr(), Some(NetdevEvent::RxComplete));
    assert_eq!(dev.recv(RecvMode::QuerySize).unwrap(), 19);
    assert_eq!(dev.recv(RecvMode::Drop).unwrap(), 19);
    assert_eq!(dev.pending_events(), 0);
}

#[test]
fn test_recv_through_sentinels() {
    let (radio, mut dev) = device();
    radio.inject_rx(&[1, 2, 3, 4], -70, 90);
    assert_eq!(dev.isr(), Some(NetdevEvent::RxComplete));

    assert_eq!(dev.recv(RecvMode::from_sentinels(None, 0, None)).unwrap(), 4);

    let mut buf = [0u8; 16];
    let mut info = RxInfo::default();
    let len = dev
        .recv(RecvMode::from_sentinels(Some(&mut buf[..]), 16, Some(&mut info)))
        .unwrap();
    assert_eq!(&buf[..len], &[1, 2, 3, 4]);
    assert_eq!(info, RxInfo { rssi: -70, lqi: 90 });
}

#[test]
fn test_oversized_payload_leaves_buffer_untouched() {
    let (radio, mut dev) = device();
    dev.send(&[&[0xaa; 10]]).unwrap();
    radio.complete_tx(RailEvents::TX_PACKET_SENT);
    assert_eq!(dev.isr(), Some(NetdevEvent::TxComplete));
    radio.clear_calls();

    let err = dev.send(&[&[0u8; 100], &[0u8; 26]]).unwrap_err();
    assert_eq!(err, NetdevError::Overflow { len: 126, max: 125 });
    assert_eq!(err.errno(), -75);
    assert_eq!(dev.outbound_frame().payload(), &[0xaa; 10]);
    assert!(radio.calls().is_empty());
}

#[test]
fn test_largest_frame_accepted() {
    let (radio, mut dev) = device();
    assert_eq!(dev.send(&[&[0x11; 125]]).unwrap(), 125);
    let frames = radio.tx_frames();
    assert_eq!(frames[0][0], 127);
    assert_eq!(frames[0].len(), 126);
}

#[test]
fn test_receiving_after_every_tx_outcome() {
    for outcome in [
        RailEvents::TX_PACKET_SENT,
        RailEvents::RX_ACK_TIMEOUT,
        RailEvents::TX_CHANNEL_BUSY,
        RailEvents::TX_ABORTED,
        RailEvents::TX_BLOCKED,
        RailEvents::TX_UNDERFLOW,
    ] {
        let (radio, mut dev) = device();
        dev.send(&[&[0x41, 0x88, 0x01]]).unwrap();
        assert_eq!(dev.state(), TransceiverState::Transmitting);

        radio.complete_tx(outcome);
        dev.isr();
        assert_eq!(dev.state(), TransceiverState::Receiving, "after {outcome:?}");
        assert_eq!(radio.radio_state(), RadioState::Rx);
    }
}

#[test]
fn test_rejected_submission_rearms_rx() {
    let (radio, mut dev) = device();
    radio.fail_on(MockOp::StartCsmaTx, HalError::InvalidState);

    assert_eq!(dev.send(&[&[1, 2]]), Err(NetdevError::NotPermitted));
    assert_eq!(dev.state(), TransceiverState::Receiving);
    assert_eq!(dev.stats().tx_failed, 1);

    radio.clear_failures();
    dev.send(&[&[1, 2]]).unwrap();
    assert_eq!(dev.stats().tx_count, 1);
}

#[test]
fn test_send_before_init() {
    let mut dev = RailNetdev::new(MockRadio::new(), DriverParams::default());
    assert_eq!(dev.send(&[&[1]]), Err(NetdevError::NotPermitted));
}

#[test]
fn test_init_failure_reports_radio_error() {
    let radio = MockRadio::new();
    radio.fail_on(MockOp::ConfigureChannels, HalError::InvalidParameter);
    let mut dev = RailNetdev::new(radio.clone(), DriverParams::default());

    let err = dev.init().unwrap_err();
    assert_eq!(err, NetdevError::Init(HalError::InvalidParameter));
    assert_eq!(dev.state(), TransceiverState::Uninitialized);
    assert_eq!(dev.recv(RecvMode::QuerySize), Err(NetdevError::NoDevice));
}

#[test]
fn test_invalid_params_rejected_at_init() {
    let params = DriverParams {
        queue_capacity: 0,
        ..DriverParams::default()
    };
    let radio = MockRadio::new();
    let mut dev = RailNetdev::new(radio.clone(), params);
    assert_eq!(dev.init(), Err(NetdevError::InvalidParameter));
    assert!(!radio.is_initialized());
}

#[test]
fn test_init_programs_radio() {
    let (radio, dev) = device();
    let calls = radio.calls();

    assert!(matches!(calls[0], RadioCall::Initialize(_)));
    assert_eq!(calls.last(), Some(&RadioCall::StartRx(26)));
    assert_eq!(dev.channel(), 26);

    let filter = radio.addressing().unwrap();
    assert_eq!(filter.pan_id, 0x0023);
    assert_eq!(filter.short_addr, 0x3456);
    assert_eq!(filter.long_addr, [0x56, 0x34, 0x12, 0xfe, 0xff, 0x57, 0x0b, 0x00]);
}

#[test]
fn test_reinit_releases_held_frames() {
    let (radio, mut dev) = device();
    let first = radio.inject_rx(&[1], 0, 0);
    let second = radio.inject_rx(&[2], 0, 0);

    dev.init().unwrap();
    assert_eq!(radio.held_count(), 0);
    assert_eq!(radio.released(), vec![first, second]);
    assert_eq!(dev.pending_events(), 0);
    assert_eq!(dev.state(), TransceiverState::Receiving);
}

#[test]
fn test_failed_init_still_releases_held_frames() {
    let radio = MockRadio::new();
    radio.fail_on(MockOp::ConfigureChannels, HalError::InvalidParameter);
    let mut dev = RailNetdev::new(radio.clone(), DriverParams::default());
    assert!(dev.init().is_err());

    radio.inject_rx(&[1, 2, 3], 0, 0);
    assert_eq!(radio.held_count(), 1);
    assert_eq!(dev.pending_events(), 1);

    drop(dev);
    assert_eq!(radio.held_count(), 0);
}

#[test]
fn test_failed_reinit_then_init_releases_held_frames() {
    let (radio, mut dev) = device();
    radio.fail_on(MockOp::ConfigureAddressing, HalError::Failed("bus".into()));
    assert!(dev.init().is_err());

    let handle = radio.inject_rx(&[9], 0, 0);
    radio.clear_failures();
    dev.init().unwrap();
    assert!(!radio.is_held(handle));
    assert_eq!(dev.pending_events(), 0);
    assert_eq!(dev.state(), TransceiverState::Receiving);
}

#[test]
fn test_stale_abort_keeps_one_transmit_in_flight() {
    let (radio, mut dev) = device();
    dev.send(&[&[0x41, 0x88, 0x01]]).unwrap();
    dev.set(rail_netdev::OptValue::State(rail_netdev::NetoptState::Idle))
        .unwrap();
    radio.inject_events(RailEvents::TX_ABORTED);

    dev.send(&[&[0x41, 0x88, 0x02]]).unwrap();
    dev.isr();
    assert_eq!(dev.state(), TransceiverState::Transmitting);
    assert_eq!(dev.send(&[&[0x41, 0x88, 0x03]]), Err(NetdevError::Busy));
    assert_eq!(radio.tx_frames().len(), 2);
}

#[test]
fn test_malformed_frame_never_queued() {
    let (radio, dev) = device();
    let handle = radio.inject_rx_with_status(&[1, 2], 0, 0, RxPacketStatus::Aborted);

    assert_eq!(dev.pending_events(), 0);
    assert!(!radio.is_held(handle));
    assert_eq!(dev.stats().malformed_rx, 1);
}

#[test]
fn test_callback_receives_isr_from_radio_side() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    let radio = MockRadio::new();
    let mut dev = RailNetdev::new(radio.clone(), DriverParams::default())
        .with_event_callback(Arc::new(move |ev| log.lock().unwrap().push(ev)));
    dev.init().unwrap();

    radio.inject_rx(&[7], 0, 0);
    assert_eq!(*seen.lock().unwrap(), vec![NetdevEvent::Isr]);

    dev.isr();
    dev.flush_rx().unwrap();
    assert_eq!(
        *seen.lock().unwrap(),
        vec![NetdevEvent::Isr, NetdevEvent::RxComplete]
    );
}

#[test]
fn test_spin_mode_waits_for_completion() {
    let params = DriverParams {
        tx_wait: TxWait::spin(),
        ..DriverParams::default()
    };
    let radio = MockRadio::new();
    radio.set_auto_complete_tx(true);
    let mut dev = RailNetdev::new(radio.clone(), params);
    dev.init().unwrap();

    dev.send(&[&[0x41, 0x88]]).unwrap();
    assert_eq!(dev.state(), TransceiverState::Receiving);
    // Completion is still reported through the queue
    assert_eq!(dev.isr(), Some(NetdevEvent::TxComplete));
}

proptest! {
    #[test]
    fn prop_frame_assembly(chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..40), 0..6)) {
        let (radio, mut dev) = device();
        let slices: Vec<&[u8]> = chunks.iter().map(Vec::as_slice).collect();
        let joined: Vec<u8> = chunks.concat();

        match dev.send(&slices) {
            Ok(len) => {
                prop_assert!(joined.len() <= 125);
                prop_assert_eq!(len, joined.len());
                let frames = radio.tx_frames();
                prop_assert_eq!(frames.len(), 1);
                prop_assert_eq!(frames[0][0] as usize, joined.len() + 2);
                prop_assert_eq!(&frames[0][1..], joined.as_slice());
            }
            Err(err) => {
                prop_assert!(joined.len() > 125);
                prop_assert_eq!(err, NetdevError::Overflow { len: joined.len(), max: 125 });
                prop_assert!(radio.tx_frames().is_empty());
            }
        }
    }
}
