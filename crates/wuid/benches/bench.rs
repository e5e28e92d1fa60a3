use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::{
    sync::{Arc, Barrier},
    thread::scope,
    time::Instant,
};
use wuid::{MemoryEpochSource, Wuid};

// Number of IDs generated per benchmark iteration (split across threads when
// contended).
const TOTAL_IDS: usize = 4096;

fn make_wuid(shard: Option<u8>) -> Wuid {
    let builder = Wuid::builder("bench");
    let builder = match shard {
        Some(shard) => builder.shard(shard),
        None => builder,
    };
    let wuid = builder.build().unwrap();
    wuid.load_h24_and_renew(MemoryEpochSource::new(0)).unwrap();
    wuid
}

/// Single caller issuing ids back to back.
fn bench_sequential(c: &mut Criterion, group_name: &str, shard: Option<u8>) {
    let mut group = c.benchmark_group(group_name);
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        let wuid = make_wuid(shard);
        b.iter(|| {
            for _ in 0..TOTAL_IDS {
                black_box(wuid.next());
            }
        });
    });

    group.finish();
}

/// One generator shared by several threads released together.
fn bench_contended(c: &mut Criterion, group_name: &str) {
    let mut group = c.benchmark_group(group_name);
    let max_threads = num_cpus::get().max(1);

    for thread_count in [1, 2, 4, 8, 16].into_iter().filter(|&n| n <= max_threads) {
        let ids_per_thread = TOTAL_IDS / thread_count;

        group.throughput(Throughput::Elements(TOTAL_IDS as u64));
        group.bench_function(
            format!("elems/{TOTAL_IDS}/threads/{thread_count}"),
            |b| {
                let wuid = make_wuid(None);
                b.iter_custom(|iters| {
                    let start = Instant::now();

                    for _ in 0..iters {
                        let barrier = Arc::new(Barrier::new(thread_count));
                        scope(|s| {
                            for _ in 0..thread_count {
                                let wuid = wuid.clone();
                                let barrier = Arc::clone(&barrier);
                                s.spawn(move || {
                                    barrier.wait();
                                    for _ in 0..ids_per_thread {
                                        black_box(wuid.next());
                                    }
                                });
                            }
                        });
                    }

                    start.elapsed()
                });
            },
        );
    }

    group.finish();
}

fn benchmark_sequential_unsharded(c: &mut Criterion) {
    bench_sequential(c, "wuid/sequential/unsharded", None);
}

fn benchmark_sequential_sharded(c: &mut Criterion) {
    bench_sequential(c, "wuid/sequential/sharded", Some(1));
}

fn benchmark_contended(c: &mut Criterion) {
    bench_contended(c, "wuid/contended");
}

criterion_group!(
    benches,
    benchmark_sequential_unsharded,
    benchmark_sequential_sharded,
    benchmark_contended,
);
criterion_main!(benches);
