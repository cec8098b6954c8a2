/*!
 * Bank Transfers
 *
 * Worker threads move random amounts between random account pairs. Each
 * transfer locks both accounts through the ordered lock set, so opposite
 * transfers never deadlock, and the total balance is conserved.
 */

use crate::core::errors::Result;
use crate::core::sync::{LockSetStats, OrderedLockSet};
use crate::core::types::ResourceId;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::thread;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSummary {
    pub total_before: u64,
    pub total_after: u64,
    pub completed: u64,
    /// Transfers skipped for insufficient funds
    pub declined: u64,
    pub locks: LockSetStats,
}

impl TransferSummary {
    pub fn is_conserved(&self) -> bool {
        self.total_before == self.total_after
    }
}

pub fn run_transfers(
    accounts: usize,
    threads: usize,
    transfers_per_thread: usize,
    initial_balance: u64,
) -> Result<TransferSummary> {
    let bank = OrderedLockSet::contiguous(accounts, |_| initial_balance)?;
    let total_before = initial_balance * accounts as u64;

    let results: Vec<Result<(u64, u64)>> = thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|_| s.spawn(|| transfer_worker(&bank, accounts, transfers_per_thread)))
            .collect();
        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    let (mut completed, mut declined) = (0, 0);
    for result in results {
        let (done, skipped) = result?;
        completed += done;
        declined += skipped;
    }

    let total_after = bank.snapshot().into_iter().map(|(_, balance)| balance).sum();
    let summary = TransferSummary {
        total_before,
        total_after,
        completed,
        declined,
        locks: bank.stats(),
    };

    if summary.is_conserved() {
        info!(
            completed,
            declined,
            total = total_after,
            contended = summary.locks.contended,
            "transfers finished, balance conserved"
        );
    } else {
        warn!(total_before, total_after, "transfers finished, balance NOT conserved");
    }
    Ok(summary)
}

fn transfer_worker(
    bank: &OrderedLockSet<u64>,
    accounts: usize,
    transfers: usize,
) -> Result<(u64, u64)> {
    let mut rng = rand::thread_rng();
    let (mut completed, mut declined) = (0, 0);

    for _ in 0..transfers {
        let from = rng.gen_range(0..accounts);
        let mut to = rng.gen_range(0..accounts);
        while to == from {
            to = rng.gen_range(0..accounts);
        }
        let (from, to) = (ResourceId::from(from), ResourceId::from(to));
        let amount = rng.gen_range(1..=100);

        let mut guard = bank.acquire([from, to])?;
        if let Some((source, target)) = guard.pair_mut(from, to) {
            if *source >= amount {
                *source -= amount;
                *target += amount;
                completed += 1;
            } else {
                declined += 1;
            }
        }
    }
    Ok((completed, declined))
}
