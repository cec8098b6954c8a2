/*!
 * Relay Race
 *
 * Every team has its own barrier. All runners wait on a shared start gate,
 * then run a leg, meet their teammates at the barrier, and start the next
 * lap. The last runner to arrive (the barrier leader) records the lap.
 *
 * A referee closes every barrier once the time limit passes, which ends
 * the race early without stranding a runner at a half-filled barrier.
 */

use crate::core::errors::{Result, SyncError};
use crate::core::sync::{CyclicBarrier, StartGate, StopSignal};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamResult {
    pub team: usize,
    pub laps: u64,
    /// Barrier generation at the end; equals `laps` for a clean run
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelaySummary {
    pub teams: Vec<TeamResult>,
    /// The time limit expired before every lap was run
    pub cut_short: bool,
}

struct Team {
    barrier: CyclicBarrier,
    laps: AtomicU64,
}

struct Race {
    gate: StartGate,
    finished: StopSignal,
    remaining: AtomicUsize,
}

pub fn run_relay(
    teams: usize,
    runners: usize,
    laps: u64,
    max_leg: Duration,
    time_limit: Duration,
) -> Result<RelaySummary> {
    let squads = (0..teams)
        .map(|_| {
            Ok(Team {
                barrier: CyclicBarrier::new(runners)?,
                laps: AtomicU64::new(0),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let race = Race {
        gate: StartGate::new(),
        finished: StopSignal::new(),
        remaining: AtomicUsize::new(teams * runners),
    };
    let max_leg_ms = max_leg.as_millis().max(1) as u64;

    let cut_short = thread::scope(|s| {
        for (team, squad) in squads.iter().enumerate() {
            for runner in 0..runners {
                let race = &race;
                s.spawn(move || {
                    run_legs(team, runner, squad, &race.gate, laps, max_leg_ms);
                    if race.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                        race.finished.stop();
                    }
                });
            }
        }
        info!(teams, runners, laps, "relay start");
        race.gate.open();

        let finished = teams * runners == 0 || race.finished.wait_timeout(time_limit);
        if !finished {
            info!(limit_ms = time_limit.as_millis() as u64, "time limit reached, closing barriers");
            for squad in &squads {
                squad.barrier.close();
            }
        }
        !finished
    });

    let summary = RelaySummary {
        teams: squads
            .iter()
            .enumerate()
            .map(|(team, squad)| TeamResult {
                team,
                laps: squad.laps.load(Ordering::Acquire),
                generation: squad.barrier.generation(),
            })
            .collect(),
        cut_short,
    };
    for result in &summary.teams {
        info!(team = result.team, laps = result.laps, "team finished");
    }
    Ok(summary)
}

fn run_legs(team: usize, runner: usize, squad: &Team, gate: &StartGate, laps: u64, max_leg_ms: u64) {
    let mut rng = rand::thread_rng();
    gate.wait();

    for _ in 0..laps {
        thread::sleep(Duration::from_millis(rng.gen_range(0..=max_leg_ms)));
        match squad.barrier.wait() {
            Ok(result) if result.is_leader() => {
                squad.laps.fetch_add(1, Ordering::AcqRel);
                debug!(team, lap = result.generation, "lap complete");
            }
            Ok(_) => {}
            Err(SyncError::Closed) => break,
            Err(err) => {
                debug!(team, runner, error = %err, "runner stopped");
                break;
            }
        }
    }
}
