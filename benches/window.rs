//! Benchmark suite for the rolling window and row projection.
//!
//! Isolates resolution, clustering and sorting from async runtime overhead.

use beaconwatch::{
    AdvertisementFrame, IdentifierRegistry, ProximityEstimator, Resolver, RollingWindow,
};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::sync::Arc;
use std::time::Duration;

const NANOS_PER_SEC: i64 = 1_000_000_000;

fn frames(count: usize, devices: usize) -> Vec<AdvertisementFrame> {
    (0..count)
        .map(|i| {
            let device = i % devices;
            let mut frame = AdvertisementFrame {
                address: format!("AA:BB:{:02X}:{:02X}:00:01", device / 256, device % 256),
                timestamp_nanos: i as i64 * NANOS_PER_SEC / 100,
                rssi: -40 - (i % 60) as i32,
                service_uuids: vec!["180F".into(), "0000FE2C-0000-1000-8000-00805F9B34FB".into()],
                ..AdvertisementFrame::default()
            };
            frame.manufacturer_data.insert(0x0075, vec![0x75, 0x00, 0x01]);
            frame.manufacturer_data.insert(0x004C, vec![0x4C, 0x00, 0x10, 0x05, 0x01]);
            frame
        })
        .collect()
}

/// Resolve and add frames to a 10 s window
fn bench_resolve_and_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_and_add");
    let resolver = Resolver::with_builtin_oui(Arc::new(IdentifierRegistry::bundled()));

    for devices in [10, 100, 1000] {
        let input = frames(5000, devices);
        group.throughput(Throughput::Elements(input.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(devices), &input, |b, input| {
            b.iter(|| {
                let mut window = RollingWindow::new(Duration::from_secs(10));
                for frame in input {
                    window.add(resolver.resolve(frame.clone()));
                }
                black_box(window.cluster_count())
            })
        });
    }

    group.finish();
}

/// Project a populated window into distance-sorted rows
fn bench_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("rows");
    let resolver = Resolver::with_builtin_oui(Arc::new(IdentifierRegistry::bundled()));
    let estimator = ProximityEstimator::default();

    for devices in [10, 100, 1000] {
        let mut window = RollingWindow::new(Duration::from_secs(3600));
        let input = frames(5000, devices);
        let now = input.last().map_or(0, |f| f.timestamp_nanos);
        for frame in input {
            window.add(resolver.resolve(frame));
        }

        group.throughput(Throughput::Elements(devices as u64));
        group.bench_with_input(BenchmarkId::from_parameter(devices), &window, |b, window| {
            b.iter(|| black_box(window.rows(now, &estimator)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_resolve_and_add, bench_rows);
criterion_main!(benches);
