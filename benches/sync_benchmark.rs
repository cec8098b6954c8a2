/*!
 * Synchronization Primitives Benchmarks
 *
 * Queue hand-off throughput by capacity, lock-set acquisition cost, and
 * barrier round trips
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::thread;
use sync_patterns::{BoundedQueue, CyclicBarrier, OrderedLockSet, ResourceId};

const ITEMS: u64 = 10_000;

fn bench_queue_handoff(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_handoff");
    group.throughput(Throughput::Elements(ITEMS));

    for capacity in [1usize, 8, 64, 1024] {
        group.bench_with_input(
            BenchmarkId::from_parameter(capacity),
            &capacity,
            |b, &capacity| {
                b.iter(|| {
                    let queue = BoundedQueue::new(capacity).unwrap();
                    thread::scope(|s| {
                        s.spawn(|| {
                            for i in 0..ITEMS {
                                queue.put(i).unwrap();
                            }
                            queue.close();
                        });
                        black_box(queue.iter().sum::<u64>())
                    })
                });
            },
        );
    }

    group.finish();
}

fn bench_queue_mpmc(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_mpmc");
    group.throughput(Throughput::Elements(ITEMS));

    for threads in [2usize, 4] {
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            b.iter(|| {
                let queue = BoundedQueue::new(16).unwrap();
                let per_producer = ITEMS / threads as u64;
                thread::scope(|s| {
                    let producers: Vec<_> = (0..threads)
                        .map(|_| {
                            s.spawn(|| {
                                for i in 0..per_producer {
                                    queue.put(i).unwrap();
                                }
                            })
                        })
                        .collect();
                    let consumers: Vec<_> = (0..threads)
                        .map(|_| s.spawn(|| queue.iter().count()))
                        .collect();
                    for p in producers {
                        p.join().unwrap();
                    }
                    queue.close();
                    let received: usize = consumers.into_iter().map(|c| c.join().unwrap()).sum();
                    black_box(received)
                })
            });
        });
    }

    group.finish();
}

fn bench_lock_set_acquire(c: &mut Criterion) {
    let mut group = c.benchmark_group("lock_set_acquire");
    let set = OrderedLockSet::contiguous(16, |_| 0u64).unwrap();

    for width in [1u32, 2, 4, 8] {
        let request: Vec<ResourceId> = (0..width).rev().map(ResourceId).collect();
        group.bench_with_input(BenchmarkId::from_parameter(width), &request, |b, request| {
            b.iter(|| {
                let guard = set.acquire(request.iter().copied()).unwrap();
                black_box(guard.len())
            });
        });
    }

    group.finish();
}

fn bench_lock_set_contended(c: &mut Criterion) {
    c.bench_function("lock_set_contended_transfers", |b| {
        let set = OrderedLockSet::contiguous(4, |_| 1_000i64).unwrap();
        b.iter(|| {
            thread::scope(|s| {
                for t in 0..4u32 {
                    let set = &set;
                    s.spawn(move || {
                        for i in 0..250u32 {
                            let from = ResourceId((t + i) % 4);
                            let to = ResourceId((t + i + 1) % 4);
                            let mut guard = set.acquire([from, to]).unwrap();
                            if let Some((a, b)) = guard.pair_mut(from, to) {
                                *a -= 1;
                                *b += 1;
                            }
                        }
                    });
                }
            });
        });
    });
}

fn bench_barrier_rounds(c: &mut Criterion) {
    let mut group = c.benchmark_group("barrier_rounds");

    for parties in [2usize, 4] {
        group.bench_with_input(BenchmarkId::from_parameter(parties), &parties, |b, &parties| {
            b.iter(|| {
                let barrier = CyclicBarrier::new(parties).unwrap();
                thread::scope(|s| {
                    for _ in 0..parties {
                        s.spawn(|| {
                            for _ in 0..100 {
                                barrier.wait().unwrap();
                            }
                        });
                    }
                });
                black_box(barrier.generation())
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_queue_handoff,
    bench_queue_mpmc,
    bench_lock_set_acquire,
    bench_lock_set_contended,
    bench_barrier_rounds,
);

criterion_main!(benches);
