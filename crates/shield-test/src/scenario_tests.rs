//! End-to-end stage scenarios on the simulated clock

use std::time::Duration;

use proptest::prelude::*;

use shield_core::{CounterId, ShieldEvent, SimTime, StageId, StagePhase};
use shield_landmark::FACE_POINT_COUNT;

use crate::{scenarios, StageSimulator};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[test]
fn test_activation_enters_calibration_after_acknowledgement() {
    let mut sim = StageSimulator::new(3).unwrap();
    sim.run_for(ms(250)).unwrap();
    let activated = sim.now();
    assert!(sim.activate());

    sim.run_for(ms(1499)).unwrap();
    assert!(sim.recording().entries(StageId::Calibration).is_empty());

    sim.run_for(ms(1)).unwrap();
    let entries = sim.recording().entries(StageId::Calibration);
    assert_eq!(entries, vec![activated + ms(1500)]);

    let snapshots = sim.recording().landmarks(StageId::Calibration);
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].0, activated + ms(1500));
    assert_eq!(snapshots[0].1.len(), FACE_POINT_COUNT);

    // Only one entry however long we wait
    sim.run_for(ms(3000)).unwrap();
    assert_eq!(sim.recording().entries(StageId::Calibration).len(), 1);
}

#[test]
fn test_progress_completion_hands_off_to_chaos_engine() {
    let mut sim = scenarios::calibrating(3).unwrap();
    let entry = sim.now();

    sim.run_for(ms(5000)).unwrap();
    let recording = sim.recording();
    assert_eq!(
        recording.counter_reached(CounterId::CalibrationProgress, 100),
        Some(entry + ms(5000))
    );
    // Initial value plus one event per tick
    assert_eq!(recording.counter_values(CounterId::CalibrationProgress).len(), 101);
    assert_eq!(sim.stage(), StageId::Calibration);

    sim.run_for(ms(500)).unwrap();
    assert_eq!(
        sim.recording().entries(StageId::ChaosEngine),
        vec![entry + ms(5500)]
    );
}

#[test]
fn test_calibration_counters_run_independently() {
    let mut sim = scenarios::calibrating(3).unwrap();
    let entry = sim.now();
    sim.run_for(ms(5000)).unwrap();

    let recording = sim.recording();
    // 68 reveals at 70ms
    assert_eq!(
        recording.counter_reached(CounterId::LandmarksRevealed, 68),
        Some(entry + ms(4760))
    );
    let scan: Vec<u32> = recording
        .counter_values(CounterId::ScanLine)
        .into_iter()
        .map(|(_, v)| v)
        .collect();
    assert_eq!(scan.len(), 251);
    assert_eq!(scan[50], 0);
    assert!(scan.iter().all(|v| *v < 100 && v % 2 == 0));
}

#[test]
fn test_chaos_engine_dwell_and_arming() {
    let mut sim = scenarios::defending(5).unwrap();
    let entry = sim.now();

    sim.run_for(ms(8000)).unwrap();
    let recording = sim.recording();

    assert_eq!(recording.entries(StageId::StatusReport), vec![entry + ms(8000)]);
    assert_eq!(
        recording.phase_change(StageId::ChaosEngine, StagePhase::Active),
        Some(entry + ms(1000))
    );

    let jitter: Vec<SimTime> = recording
        .landmarks(StageId::ChaosEngine)
        .into_iter()
        .skip(1)
        .map(|(at, _)| at)
        .collect();
    assert!(!jitter.is_empty());
    assert!(jitter.iter().all(|at| *at >= entry + ms(1100) && *at < entry + ms(8000)));
    assert_eq!(jitter.len(), 69);
}

#[test]
fn test_jitter_snapshots_are_fresh_and_bounded() {
    let mut sim = scenarios::defending(5).unwrap();
    sim.run_for(ms(2000)).unwrap();

    let snapshots = sim.recording().landmarks(StageId::ChaosEngine);
    let (_, base) = snapshots[0];
    for pair in snapshots.windows(2) {
        assert!(!pair[0].1.same_snapshot(pair[1].1));
    }
    for (_, snapshot) in &snapshots[1..] {
        assert_eq!(snapshot.len(), base.len());
        for (point, rest) in snapshot.iter().zip(base.iter()) {
            assert_eq!((point.base_x, point.base_y), (rest.base_x, rest.base_y));
            assert!(point.displacement() <= 2.0 + 1e-9);
        }
    }
    // The generated snapshot itself was never touched
    assert!(base.iter().all(|p| p.displacement() == 0.0));
}

#[test]
fn test_no_emissions_from_chaos_engine_after_exit() {
    let mut sim = scenarios::defending(5).unwrap();
    sim.run_for(ms(8000)).unwrap();
    assert_eq!(sim.stage(), StageId::StatusReport);

    let exit_index = sim
        .recording()
        .events()
        .iter()
        .position(|r| r.event == ShieldEvent::StageExited { stage: StageId::ChaosEngine })
        .unwrap();

    sim.run_for(ms(60_000)).unwrap();
    let after = sim.recording().since_index(exit_index + 1);
    assert!(after.iter().all(|r| r.event.stage() != StageId::ChaosEngine));
    assert_eq!(sim.stats().stale_events_dropped, 0);
    assert!(sim.check().is_valid());
}

#[test]
fn test_report_counters_settle_at_their_own_pace() {
    let mut sim = scenarios::reporting(2).unwrap();
    let entry = sim.now();
    sim.run_for(ms(3000)).unwrap();

    let recording = sim.recording();
    let settled = [
        (CounterId::IdentifiersObfuscated, 342, 1050),
        (CounterId::ThreatsBlocked, 27, 2700),
        (CounterId::DataPointsProtected, 68, 1610),
        (CounterId::Uptime, 100, 3000),
    ];
    for (counter, target, after) in settled {
        let values = recording.counter_values(counter);
        let (at, last) = *values.last().unwrap();
        assert_eq!(last, target, "{counter:?}");
        assert_eq!(at, entry + ms(after), "{counter:?}");
    }
    assert_eq!(sim.scheduler().live_timers(), 0);
}

#[test]
fn test_navigation_mid_calibration_cancels_everything() {
    let mut sim = scenarios::calibrating(4).unwrap();
    sim.run_for(ms(2345)).unwrap();
    let progress = sim.scheduler().counter(CounterId::CalibrationProgress).unwrap();
    assert!(progress > 0 && progress < 100);

    sim.navigate(StageId::Dashboard).unwrap();
    assert_eq!(sim.scheduler().live_timers(), 0);

    let mark = sim.recording().len();
    sim.run_for(ms(30_000)).unwrap();
    assert_eq!(sim.recording().len(), mark);
    assert!(sim.recording().entries(StageId::ChaosEngine).is_empty());
    assert!(sim.check().is_valid());
}

#[test]
fn test_navigation_during_handoff_delay() {
    let mut sim = scenarios::calibrating(4).unwrap();
    sim.run_for(ms(5200)).unwrap();

    // Hand-off timer is pending; leaving now must drop it
    sim.navigate(StageId::StatusReport).unwrap();
    sim.run_for(ms(10_000)).unwrap();
    assert!(sim.recording().entries(StageId::ChaosEngine).is_empty());
    assert_eq!(sim.stage(), StageId::StatusReport);
}

#[test]
fn test_reentering_chaos_engine_restarts_arming() {
    let mut sim = scenarios::defending(6).unwrap();
    sim.run_for(ms(3000)).unwrap();
    assert_eq!(sim.scheduler().phase(), StagePhase::Active);

    sim.navigate(StageId::ChaosEngine).unwrap();
    assert_eq!(sim.scheduler().phase(), StagePhase::Initializing);
    let reentry = sim.now();
    let jitter_before = sim.stats().jitter_ticks;

    sim.run_for(ms(999)).unwrap();
    assert_eq!(sim.stats().jitter_ticks, jitter_before);
    sim.run_for(ms(7001)).unwrap();
    assert_eq!(
        sim.recording().entries(StageId::StatusReport),
        vec![reentry + ms(8000)]
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_random_navigation_never_leaks(
        seed in any::<u64>(),
        steps in prop::collection::vec((0usize..4, 1u64..3_000), 1..20),
    ) {
        let mut sim = StageSimulator::new(seed).unwrap();
        for (stage, wait) in steps {
            sim.navigate(StageId::ALL[stage]).unwrap();
            sim.run_for(ms(wait)).unwrap();
        }
        let report = sim.check();
        prop_assert!(report.is_valid(), "{:?}", report.violations);
        prop_assert_eq!(sim.stats().stale_events_dropped, 0);
    }
}
