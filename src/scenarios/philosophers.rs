/*!
 * Dining Philosophers
 *
 * Two deadlock-free strategies over the same fork table:
 * - `Ordered`: both forks through the ordered lock set
 * - `Waiter`: a semaphore admits at most `n - 1` philosophers, who then
 *   take left before right
 *
 * Per-philosopher meal counts and longest fork wait show fairness.
 */

use crate::core::errors::Result;
use crate::core::sync::{OrderedLockSet, Semaphore, StopSignal};
use crate::core::types::ResourceId;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiningStrategy {
    Ordered,
    Waiter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhilosopherStats {
    pub seat: usize,
    pub meals: u64,
    pub max_wait: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiningSummary {
    pub strategy: DiningStrategy,
    pub philosophers: Vec<PhilosopherStats>,
}

impl DiningSummary {
    pub fn total_meals(&self) -> u64 {
        self.philosophers.iter().map(|p| p.meals).sum()
    }
}

pub fn run_philosophers(
    seats: usize,
    duration: Duration,
    strategy: DiningStrategy,
) -> Result<DiningSummary> {
    let forks = OrderedLockSet::contiguous(seats, |_| ())?;
    let waiter = Semaphore::new(seats.saturating_sub(1).max(1))?;
    let stop = StopSignal::new();

    let philosophers = thread::scope(|s| {
        let handles: Vec<_> = (0..seats)
            .map(|seat| {
                let (forks, waiter, stop) = (&forks, &waiter, &stop);
                s.spawn(move || dine(seat, seats, forks, waiter, stop, strategy))
            })
            .collect();

        stop.wait_timeout(duration);
        stop.stop();
        waiter.close();

        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect::<Result<Vec<_>>>()
    })?;

    let summary = DiningSummary {
        strategy,
        philosophers,
    };
    for p in &summary.philosophers {
        info!(
            seat = p.seat,
            meals = p.meals,
            max_wait_ms = p.max_wait.as_millis() as u64,
            "philosopher done"
        );
    }
    info!(
        strategy = ?strategy,
        total_meals = summary.total_meals(),
        "dining finished"
    );
    Ok(summary)
}

fn dine(
    seat: usize,
    seats: usize,
    forks: &OrderedLockSet<()>,
    waiter: &Semaphore,
    stop: &StopSignal,
    strategy: DiningStrategy,
) -> Result<PhilosopherStats> {
    let mut rng = rand::thread_rng();
    let left = ResourceId::from(seat);
    let right = ResourceId::from((seat + 1) % seats);
    let mut stats = PhilosopherStats {
        seat,
        meals: 0,
        max_wait: Duration::ZERO,
    };

    while !stop.is_stopped() {
        // think
        if stop.wait_timeout(Duration::from_millis(rng.gen_range(1..=5))) {
            break;
        }

        let started = Instant::now();
        let eaten = match strategy {
            DiningStrategy::Ordered => {
                let _forks = forks.acquire([left, right])?;
                stats.max_wait = stats.max_wait.max(started.elapsed());
                thread::sleep(Duration::from_millis(rng.gen_range(1..=3)));
                true
            }
            DiningStrategy::Waiter => match waiter.acquire() {
                Ok(_seat) => {
                    let _forks = forks.acquire_unordered(&[left, right], None)?;
                    stats.max_wait = stats.max_wait.max(started.elapsed());
                    thread::sleep(Duration::from_millis(rng.gen_range(1..=3)));
                    true
                }
                Err(_) => false,
            },
        };
        if eaten {
            stats.meals += 1;
        }
    }

    debug!(seat, meals = stats.meals, "philosopher leaving");
    Ok(stats)
}
