//! Event queue behaviour seen from outside the crate: ordering, overflow
//! accounting and the single-producer/single-consumer handoff across threads.

use proptest::prelude::*;
use rail_netdev::radio::{EventQueue, EventRecord, EventSink, RailEvents};
use std::thread;

#[test]
fn test_records_keep_callback_order() {
    let (tx, mut rx) = EventQueue::with_capacity(8).split();
    let mut sink = EventSink::new(tx, None);

    let events = [
        RailEvents::TX_PACKET_SENT,
        RailEvents::RX_FRAME_ERROR,
        RailEvents::TX_CHANNEL_BUSY,
    ];
    for ev in events {
        assert!(sink.on_events(ev, None).is_none());
    }

    let drained: Vec<EventRecord> = std::iter::from_fn(|| rx.poll()).collect();
    let seen: Vec<RailEvents> = drained.iter().map(|r| r.events).collect();
    let seqs: Vec<u32> = drained.iter().map(|r| r.seq).collect();

    assert_eq!(seen, events);
    assert_eq!(seqs, vec![1, 2, 3]);
}

#[test]
fn test_overflow_keeps_oldest() {
    let (mut tx, mut rx) = EventQueue::with_capacity(2).split();

    tx.push(1u32).unwrap();
    tx.push(2).unwrap();
    assert_eq!(tx.push(3).unwrap_err().into_inner(), 3);
    assert_eq!(tx.push(4).unwrap_err().into_inner(), 4);

    assert_eq!(rx.overflows(), 2);
    assert_eq!(rx.poll(), Some(1));
    assert_eq!(rx.poll(), Some(2));
    assert_eq!(rx.poll(), None);
}

#[test]
fn test_sequence_gap_after_overflow() {
    let (tx, mut rx) = EventQueue::with_capacity(1).split();
    let mut sink = EventSink::new(tx, None);

    let _ = sink.on_events(RailEvents::TX_PACKET_SENT, None);
    let _ = sink.on_events(RailEvents::TX_ABORTED, None);
    assert_eq!(rx.poll().map(|r| r.seq), Some(1));

    let _ = sink.on_events(RailEvents::CAL_NEEDED, None);
    let record = rx.poll().unwrap();
    assert_eq!(record.events, RailEvents::CAL_NEEDED);
    assert_eq!(record.seq, 3);
}

#[test]
fn test_threaded_handoff() {
    const N: u32 = 10_000;
    let (mut tx, mut rx) = EventQueue::with_capacity(16).split();

    let producer = thread::spawn(move || {
        for i in 0..N {
            let mut item = i;
            loop {
                match tx.push(item) {
                    Ok(()) => break,
                    Err(full) => {
                        item = full.into_inner();
                        thread::yield_now();
                    }
                }
            }
        }
    });

    let mut expected = 0;
    while expected < N {
        match rx.poll() {
            Some(v) => {
                assert_eq!(v, expected);
                expected += 1;
            }
            None => thread::yield_now(),
        }
    }
    producer.join().unwrap();
    assert!(rx.is_empty());
}

proptest! {
    #[test]
    fn prop_fifo_and_overflow_accounting(
        capacity in 1usize..32,
        ops in prop::collection::vec(any::<bool>(), 0..200),
    ) {
        let (mut tx, mut rx) = EventQueue::with_capacity(capacity).split();
        let mut model = std::collections::VecDeque::new();
        let mut rejected = 0u64;
        let mut next = 0u32;

        for push in ops {
            if push {
                match tx.push(next) {
                    Ok(()) => model.push_back(next),
                    Err(full) => {
                        prop_assert_eq!(full.into_inner(), next);
                        prop_assert_eq!(model.len(), capacity);
                        rejected += 1;
                    }
                }
                next += 1;
            } else {
                prop_assert_eq!(rx.poll(), model.pop_front());
            }
            prop_assert_eq!(rx.len(), model.len());
            prop_assert!(rx.len() <= capacity);
        }

        prop_assert_eq!(rx.overflows(), rejected);
        prop_assert_eq!(rx.peek().copied(), model.front().copied());
    }
}
