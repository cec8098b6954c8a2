/*!
 * Cyclic Barrier Tests
 * Rendezvous, generation fencing across back-to-back rounds, and close
 */

use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use sync_patterns::{CyclicBarrier, SyncError};

#[test]
fn test_third_arrival_releases_all() {
    let barrier = Arc::new(CyclicBarrier::new(3).unwrap());
    let released = Arc::new(AtomicUsize::new(0));

    let early: Vec<_> = (0..2)
        .map(|_| {
            let (barrier, released) = (barrier.clone(), released.clone());
            thread::spawn(move || {
                let result = barrier.wait().unwrap();
                released.fetch_add(1, Ordering::SeqCst);
                result
            })
        })
        .collect();

    thread::sleep(Duration::from_millis(50));
    assert_eq!(released.load(Ordering::SeqCst), 0, "two parties must not pass");
    assert_eq!(barrier.arrived(), 2);

    let last = barrier.wait().unwrap();
    assert!(last.is_leader());
    assert_eq!(last.generation, 1);

    for handle in early {
        let result = handle.join().unwrap();
        assert!(!result.is_leader());
        assert_eq!(result.generation, 1);
    }
    assert_eq!(released.load(Ordering::SeqCst), 2);
    assert_eq!(barrier.arrived(), 0);
}

#[test]
fn test_extra_arrival_waits_for_next_round() {
    let barrier = Arc::new(CyclicBarrier::new(3).unwrap());

    thread::scope(|s| {
        for _ in 0..3 {
            s.spawn(|| barrier.wait().unwrap());
        }
    });
    assert_eq!(barrier.generation(), 1);

    let passed = Arc::new(AtomicBool::new(false));
    let fourth = {
        let (barrier, passed) = (barrier.clone(), passed.clone());
        thread::spawn(move || {
            let result = barrier.wait().unwrap();
            passed.store(true, Ordering::SeqCst);
            result
        })
    };

    thread::sleep(Duration::from_millis(50));
    assert!(!passed.load(Ordering::SeqCst), "an extra arrival must not pass alone");
    assert_eq!(barrier.generation(), 1);
    assert_eq!(barrier.arrived(), 1);

    let fifth = {
        let barrier = barrier.clone();
        thread::spawn(move || barrier.wait().unwrap())
    };
    thread::sleep(Duration::from_millis(50));
    assert!(!passed.load(Ordering::SeqCst));
    assert_eq!(barrier.generation(), 1);

    let last = barrier.wait().unwrap();
    assert_eq!(last.generation, 2);
    assert_eq!(fourth.join().unwrap().generation, 2);
    assert_eq!(fifth.join().unwrap().generation, 2);
    assert!(passed.load(Ordering::SeqCst));
    assert_eq!(barrier.generation(), 2);
}

#[test]
fn test_single_party_never_blocks() {
    let barrier = CyclicBarrier::new(1).unwrap();
    for round in 1..=5 {
        let result = barrier.wait().unwrap();
        assert!(result.is_leader());
        assert_eq!(result.generation, round);
    }
}

#[test]
fn test_back_to_back_rounds_stay_fenced() {
    const PARTIES: usize = 4;
    const ROUNDS: u64 = 500;

    let barrier = CyclicBarrier::new(PARTIES).unwrap();
    let leaders = AtomicUsize::new(0);
    let arrivals: Vec<AtomicUsize> = (0..ROUNDS).map(|_| AtomicUsize::new(0)).collect();

    thread::scope(|s| {
        for _ in 0..PARTIES {
            s.spawn(|| {
                for round in 0..ROUNDS {
                    arrivals[round as usize].fetch_add(1, Ordering::SeqCst);
                    let result = barrier.wait().unwrap();
                    // Everyone from this round arrived before anyone left it
                    assert_eq!(arrivals[round as usize].load(Ordering::SeqCst), PARTIES);
                    assert_eq!(result.generation, round + 1);
                    if result.is_leader() {
                        leaders.fetch_add(1, Ordering::SeqCst);
                    }
                }
            });
        }
    });

    assert_eq!(leaders.load(Ordering::SeqCst), ROUNDS as usize);
    assert_eq!(barrier.generation(), ROUNDS);
}

#[test]
fn test_close_releases_waiters_with_error() {
    let barrier = Arc::new(CyclicBarrier::new(3).unwrap());
    let waiter = {
        let barrier = barrier.clone();
        thread::spawn(move || barrier.wait())
    };

    thread::sleep(Duration::from_millis(30));
    barrier.close();

    assert!(matches!(waiter.join().unwrap(), Err(SyncError::Closed)));
    assert!(barrier.is_closed());
    assert!(matches!(barrier.wait(), Err(SyncError::Closed)));
}

#[test]
fn test_timeout_withdraws_arrival() {
    let barrier = CyclicBarrier::new(2).unwrap();
    assert!(matches!(
        barrier.wait_timeout(Duration::from_millis(20)),
        Err(SyncError::TimedOut(_))
    ));
    assert_eq!(barrier.arrived(), 0);

    // The next round still needs two fresh arrivals
    let done = AtomicBool::new(false);
    thread::scope(|s| {
        s.spawn(|| {
            barrier.wait().unwrap();
            done.store(true, Ordering::SeqCst);
        });
        thread::sleep(Duration::from_millis(30));
        assert!(!done.load(Ordering::SeqCst));
        barrier.wait().unwrap();
    });
    assert!(done.load(Ordering::SeqCst));
    assert_eq!(barrier.generation(), 1);
}

#[test]
fn test_zero_parties_rejected() {
    assert!(matches!(
        CyclicBarrier::new(0),
        Err(SyncError::InvalidConfiguration(_))
    ));
}
