/*!
 * Ordered Lock Set Tests
 * Deadlock freedom under opposite and random request orders, plus probing
 */

use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use sync_patterns::{LockProbe, OrderedLockSet, ProbeState, ResourceId, SyncError};

fn ids(raw: &[u32]) -> Vec<ResourceId> {
    raw.iter().copied().map(ResourceId).collect()
}

#[test]
fn test_opposite_orders_complete() {
    let set = OrderedLockSet::contiguous(3, |_| 0u64).unwrap();

    thread::scope(|s| {
        let forward = s.spawn(|| {
            for _ in 0..2000 {
                let mut guard = set.acquire(ids(&[2, 0])).unwrap();
                assert_eq!(guard.ids(), ids(&[0, 2]));
                *guard.get_mut(ResourceId(0)).unwrap() += 1;
            }
        });
        let backward = s.spawn(|| {
            for _ in 0..2000 {
                let mut guard = set.acquire(ids(&[0, 2])).unwrap();
                *guard.get_mut(ResourceId(2)).unwrap() += 1;
            }
        });
        forward.join().unwrap();
        backward.join().unwrap();
    });

    assert_eq!(set.snapshot(), vec![(ResourceId(0), 2000), (ResourceId(1), 0), (ResourceId(2), 2000)]);
}

#[test]
fn test_random_subsets_never_deadlock() {
    const RESOURCES: usize = 6;
    const THREADS: u64 = 8;

    let set = OrderedLockSet::contiguous(RESOURCES, |_| 0u64).unwrap();

    thread::scope(|s| {
        for seed in 0..THREADS {
            let set = &set;
            s.spawn(move || {
                let mut rng = StdRng::seed_from_u64(seed);
                for _ in 0..1000 {
                    let count = rng.gen_range(1..=RESOURCES);
                    let request: Vec<ResourceId> = (0..count)
                        .map(|_| ResourceId::from(rng.gen_range(0..RESOURCES)))
                        .collect();
                    let mut guard = set.acquire(request.iter().copied()).unwrap();

                    let held = guard.ids();
                    assert!(held.windows(2).all(|w| w[0] < w[1]), "held ids not ascending");
                    for id in held {
                        *guard.get_mut(id).unwrap() += 1;
                    }
                }
            });
        }
    });

    assert_eq!(set.stats().acquisitions, THREADS * 1000);
}

#[test]
fn test_transfer_conserves_total() {
    let set = OrderedLockSet::contiguous(4, |_| 1_000i64).unwrap();

    thread::scope(|s| {
        for seed in 0..4u64 {
            let set = &set;
            s.spawn(move || {
                let mut rng = StdRng::seed_from_u64(seed);
                for _ in 0..2000 {
                    let from = ResourceId::from(rng.gen_range(0..4usize));
                    let to = ResourceId::from(rng.gen_range(0..4usize));
                    if from == to {
                        continue;
                    }
                    let mut guard = set.acquire([from, to]).unwrap();
                    let (a, b) = guard.pair_mut(from, to).unwrap();
                    *a -= 7;
                    *b += 7;
                }
            });
        }
    });

    let total: i64 = set.snapshot().into_iter().map(|(_, v)| v).sum();
    assert_eq!(total, 4_000);
}

#[test]
fn test_unknown_and_empty_requests() {
    let set = OrderedLockSet::contiguous(2, |_| ()).unwrap();
    assert!(matches!(
        set.acquire(ids(&[0, 9])),
        Err(SyncError::UnknownResource(ResourceId(9)))
    ));
    assert!(matches!(set.acquire(Vec::new()), Err(SyncError::EmptyRequest)));
    // A failed request holds nothing
    assert!(set.try_acquire(ResourceId(0)).unwrap());
}

#[test]
fn test_duplicate_universe_rejected() {
    let result = OrderedLockSet::new([(ResourceId(1), ()), (ResourceId(1), ())]);
    assert!(matches!(result, Err(SyncError::InvalidConfiguration(_))));
}

#[test]
fn test_probe_reports_holder() {
    let set = Arc::new(OrderedLockSet::contiguous(2, |_| ()).unwrap());
    let holding = Arc::new(AtomicBool::new(false));
    let release = Arc::new(AtomicBool::new(false));

    let holder = {
        let (set, holding, release) = (set.clone(), holding.clone(), release.clone());
        thread::Builder::new()
            .name("probe-holder".into())
            .spawn(move || {
                let _guard = set.acquire([ResourceId(1)]).unwrap();
                holding.store(true, Ordering::SeqCst);
                while !release.load(Ordering::SeqCst) {
                    thread::sleep(Duration::from_millis(1));
                }
            })
            .unwrap()
    };

    while !holding.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(1));
    }

    assert_eq!(set.probe(ResourceId(0)).unwrap(), ProbeState::Free);
    match set.probe(ResourceId(1)).unwrap() {
        ProbeState::Contended { holder, .. } => {
            assert_eq!(holder.as_deref(), Some("probe-holder"));
        }
        ProbeState::Free => panic!("resource 1 should be held"),
    }

    let probes = set.probe_all();
    assert_eq!(probes.len(), 2);
    assert!(probes[0].state.is_free());
    assert!(!probes[1].state.is_free());

    release.store(true, Ordering::SeqCst);
    holder.join().unwrap();
    assert!(set.try_acquire(ResourceId(1)).unwrap());
}

#[test]
fn test_unordered_timeout_releases_everything() {
    let set = OrderedLockSet::contiguous(2, |_| ()).unwrap();
    let _held = set.acquire([ResourceId(1)]).unwrap();

    thread::scope(|s| {
        s.spawn(|| {
            let result =
                set.acquire_unordered(&ids(&[0, 1]), Some(Duration::from_millis(30)));
            assert!(matches!(result, Err(SyncError::TimedOut(_))));
            // Resource 0 must have been released on the way out
            assert!(set.try_acquire(ResourceId(0)).unwrap());
        });
    });

    assert_eq!(set.stats().timeouts, 1);
}
