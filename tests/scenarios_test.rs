/*!
 * Scenario Tests
 * Every demo workload run end to end with small sizes
 */

use pretty_assertions::assert_eq;
use serial_test::serial;
use std::time::Duration;
use sync_patterns::scenarios::{
    run_deadlock_demo, run_fib_pool, run_philosophers, run_pipeline, run_relay, run_transfers,
    DiningStrategy, Scenario,
};
use sync_patterns::{PoolConfig, ReportPolicy, WatchdogConfig};

#[test]
fn test_pipeline_delivers_everything() {
    let summary = run_pipeline(200, 4, Duration::from_millis(5)).unwrap();

    assert!(summary.is_complete());
    assert_eq!(summary.produced, 200);
    assert_eq!(summary.transformed, 200);
    assert_eq!(summary.consumed, 200);
    assert!(summary.raw.closed && summary.squared.closed);
    assert!(summary.raw.high_water <= 4);
    assert!(summary.occupancy.peak() <= 4);
}

#[test]
fn test_transfers_conserve_money() {
    let summary = run_transfers(6, 4, 2_000, 500).unwrap();
    assert!(summary.is_conserved());
    assert_eq!(summary.total_before, 3_000);
    assert_eq!(summary.completed + summary.declined, 8_000);
}

#[test]
fn test_both_dining_strategies_feed_everyone() {
    for strategy in [DiningStrategy::Ordered, DiningStrategy::Waiter] {
        let summary = run_philosophers(5, Duration::from_millis(300), strategy).unwrap();
        assert_eq!(summary.philosophers.len(), 5);
        for p in &summary.philosophers {
            assert!(p.meals > 0, "{:?}: seat {} starved", strategy, p.seat);
        }
    }
}

#[test]
fn test_relay_runs_every_lap() {
    let summary = run_relay(2, 3, 4, Duration::from_millis(10), Duration::from_secs(10)).unwrap();
    assert!(!summary.cut_short);
    for team in &summary.teams {
        assert_eq!(team.laps, 4);
        assert_eq!(team.generation, 4);
    }
}

#[test]
fn test_relay_time_limit_closes_barriers() {
    let summary =
        run_relay(1, 2, 1_000, Duration::from_millis(20), Duration::from_millis(100)).unwrap();
    assert!(summary.cut_short);
    assert!(summary.teams[0].laps < 1_000);
}

#[test]
fn test_fib_pool_results() {
    let summary = run_fib_pool(
        PoolConfig {
            workers: 3,
            queue_capacity: 4,
        },
        20,
    )
    .unwrap();
    assert_eq!(summary.stats.processed, 20);
    assert_eq!(summary.results.len(), 20);
    assert_eq!(summary.results[10], (10, 55));
}

#[test]
#[serial]
fn test_deadlock_demo_only_unordered_stalls() {
    let watchdog = WatchdogConfig::new(Duration::from_millis(150), Duration::from_millis(20))
        .with_policy(ReportPolicy::Rebaseline);
    let summary = run_deadlock_demo(3, 6, Duration::from_millis(500), watchdog).unwrap();

    assert!(summary.unordered.stalls >= 1);
    let report = summary.unordered.first_report.as_ref().unwrap();
    assert_eq!(report.contended().count(), 3);

    assert_eq!(summary.ordered.stalls, 0);
    assert!(summary.ordered.completed > 0);
    assert_eq!(summary.ordered.abandoned, 0);
}

#[test]
fn test_scenario_names_parse() {
    assert_eq!("deadlock".parse::<Scenario>().unwrap(), Scenario::Deadlock);
    assert!("bogus".parse::<Scenario>().is_err());
}
