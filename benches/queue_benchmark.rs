use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rail_netdev::netdev::RecvMode;
use rail_netdev::radio::{EventQueue, EventSink, RadioEvent};
use rail_netdev::{DriverParams, MockRadio, NetDevice, RailEvents, RailNetdev};
use std::time::Duration;

// The producer side runs in the radio library's callback context, so a push
// has to stay in the tens of nanoseconds.

fn benchmark_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_queue");
    group.measurement_time(Duration::from_secs(5));

    for capacity in [4usize, 16, 64] {
        group.bench_with_input(
            BenchmarkId::new("push_poll", capacity),
            &capacity,
            |b, &capacity| {
                let (mut tx, mut rx) = EventQueue::with_capacity(capacity).split();
                b.iter(|| {
                    let _ = tx.push(black_box(0xa5u32));
                    black_box(rx.poll());
                });
            },
        );
    }

    group.bench_function("sink_on_events", |b| {
        let (tx, mut rx) = EventQueue::with_capacity(16).split();
        let mut sink = EventSink::new(tx, None);
        b.iter(|| {
            let rejected = sink.on_events(black_box(RailEvents::TX_PACKET_SENT), None);
            black_box(rejected.is_none());
            black_box(rx.poll());
        });
    });

    group.finish();
}

fn benchmark_decode(c: &mut Criterion) {
    let masks = [
        RailEvents::RX_PACKET_RECEIVED,
        RailEvents::TX_PACKET_SENT | RailEvents::RX_ACK_TIMEOUT,
        RailEvents::CAL_NEEDED | RailEvents::IEEE802154_DATA_REQUEST_COMMAND,
        RailEvents::all(),
    ];

    c.bench_function("radio_event_decode", |b| {
        b.iter(|| {
            for mask in &masks {
                black_box(RadioEvent::decode(black_box(*mask)));
            }
        });
    });
}

fn benchmark_rx_path(c: &mut Criterion) {
    let radio = MockRadio::new();
    let mut dev = RailNetdev::new(radio.clone(), DriverParams::default());
    if dev.init().is_err() {
        return;
    }
    let payload = [0x41u8; 64];

    c.bench_function("inject_isr_deliver_64", |b| {
        let mut buf = [0u8; 127];
        b.iter(|| {
            radio.inject_rx(&payload, -50, 200);
            black_box(dev.isr());
            let len = dev.recv(RecvMode::Deliver {
                buf: &mut buf,
                info: None,
            });
            black_box(len.ok());
        });
    });
}

criterion_group!(benches, benchmark_queue, benchmark_decode, benchmark_rx_path);
criterion_main!(benches);
