//! End-to-end tests for the streaming engine: boundary handling, sector
//! decomposition, optimal-lap composition, analytics sentinels and the
//! ordering/monotonicity guarantees.

mod common;

use common::{circle_point, run_laps, run_timed_laps};
use laptrace_core::model::{
    AdviceCategory, Analysis, DataStatus, IngestOutcome, RacePhase, Sample, StrategyMode,
    TireCondition,
};
use laptrace_core::RacingEngine;

const EVEN_LAP: [f64; 3] = [20.0, 20.0, 20.0];

#[test]
fn first_sample_gets_a_live_response_and_seeds_the_buffer() {
    let mut engine = RacingEngine::new();

    let outcome = engine
        .process_sample(Sample {
            timestamp: 0.0,
            lat: 0.0,
            lon: 0.0,
            speed: 10.0,
        })
        .expect("first sample accepted");

    match outcome {
        IngestOutcome::Live(update) => {
            assert!(!update.lap_completed);
            assert_eq!(update.delta, 0.0);
            assert_eq!(update.current_sector, 0);
            assert!(update.prediction.is_none());
            assert!(update.optimal_lap_time.is_none());
        }
        IngestOutcome::LapCompleted(_) => panic!("one sample cannot complete a lap"),
    }
    assert_eq!(engine.current_lap_len(), 1);
}

#[test]
fn short_loop_never_produces_a_lap() {
    let mut engine = RacingEngine::new();

    // nine points around the loop, then back to the start
    for i in 0..9 {
        let (lat, lon) = circle_point(i * 16);
        engine
            .process_sample(Sample {
                timestamp: i as f64,
                lat,
                lon,
                speed: 30.0,
            })
            .unwrap();
    }
    let (lat, lon) = circle_point(0);
    engine
        .process_sample(Sample {
            timestamp: 9.0,
            lat,
            lon,
            speed: 30.0,
        })
        .unwrap();

    // the loop detector needs 50 buffered samples before it may fire, so
    // nothing was finalized and nothing was discarded
    assert_eq!(engine.lap_count(), 0);
    assert_eq!(engine.current_lap_len(), 10);
}

#[test]
fn malformed_samples_are_rejected_without_touching_state() {
    let mut engine = RacingEngine::new();
    engine
        .process_sample(Sample {
            timestamp: 0.0,
            lat: 45.0,
            lon: 9.0,
            speed: 30.0,
        })
        .unwrap();

    for bad in [
        Sample { timestamp: 1.0, lat: f64::NAN, lon: 9.0, speed: 30.0 },
        Sample { timestamp: 1.0, lat: 45.0, lon: f64::INFINITY, speed: 30.0 },
        Sample { timestamp: f64::NAN, lat: 45.0, lon: 9.0, speed: 30.0 },
        Sample { timestamp: 1.0, lat: 45.0, lon: 9.0, speed: -5.0 },
    ] {
        assert!(engine.process_sample(bad).is_err());
    }

    assert_eq!(engine.current_lap_len(), 1, "rejected samples must not buffer");
}

#[test]
fn lap_boundary_finalizes_the_full_buffer() {
    let mut engine = RacingEngine::new();
    let completions = run_laps(&mut engine, &[(EVEN_LAP, 60.0)]);

    assert_eq!(completions.len(), 1);
    let lap = &completions[0].lap_data;
    assert_eq!(lap.lap_number, 1);
    assert!((lap.total_time - 60.0).abs() < 1e-9);
    assert!((lap.avg_speed - 60.0).abs() < 1e-9);

    let points_in_sectors: usize = lap.sectors.values().map(|s| s.points.len()).sum();
    assert_eq!(points_in_sectors, common::POINTS_PER_LAP);

    // the boundary sample seeds the next lap
    assert_eq!(engine.current_lap_len(), 1);
}

#[test]
fn sector_times_sum_to_the_lap_time_within_sampling_tolerance() {
    let mut engine = RacingEngine::new();
    let completions = run_laps(&mut engine, &[(EVEN_LAP, 60.0), ([19.0, 21.0, 20.0], 60.0)]);

    for completion in &completions {
        let lap = &completion.lap_data;
        let sector_sum: f64 = lap.sectors.values().map(|s| s.time).sum();
        // the partition drops the inter-sector sample gaps (two 0.4s steps)
        assert!(
            (lap.total_time - sector_sum).abs() <= 1.0,
            "lap {}: total {} vs sector sum {}",
            lap.lap_number,
            lap.total_time,
            sector_sum
        );
    }
}

#[test]
fn optimal_lap_composes_best_sectors_across_laps() {
    let mut engine = RacingEngine::new();
    // lap 1 even pacing; lap 2 faster first third, slower elsewhere
    run_laps(&mut engine, &[(EVEN_LAP, 60.0), ([19.0, 21.0, 20.5], 60.0)]);

    let view = match engine.optimal_lap() {
        Analysis::Ready(view) => view,
        Analysis::Pending { .. } => panic!("two laps must produce an optimal lap"),
    };

    assert_eq!(view.sectors.len(), 3);
    // sector 0 was improved by lap 2; sectors 1 and 2 stay with lap 1
    assert_eq!(view.sectors[&0].lap_number, 2);
    assert_eq!(view.sectors[&1].lap_number, 1);
    assert_eq!(view.sectors[&2].lap_number, 1);

    let laps = engine.lap_history(10);
    let fastest = laps
        .iter()
        .map(|l| l.total_time)
        .fold(f64::INFINITY, f64::min);
    assert!(
        (view.improvement_potential - (fastest - view.optimal_time)).abs() < 1e-9
    );
    assert!(view.improvement_potential > 0.0);

    // every optimal sector is at least as fast as that sector on any lap
    for lap in &laps {
        for (id, summary) in &lap.sectors {
            assert!(view.sectors[id].time <= summary.time + 1e-9);
        }
    }
}

#[test]
fn racing_line_concatenates_the_optimal_sector_points() {
    let mut engine = RacingEngine::new();
    run_laps(&mut engine, &[(EVEN_LAP, 60.0), ([19.0, 21.0, 20.5], 60.0)]);

    let view = engine.optimal_lap();
    let expected: usize = view
        .as_ready()
        .expect("optimal lap ready")
        .sectors
        .values()
        .map(|s| s.points.len())
        .sum();

    assert_eq!(engine.racing_line().len(), expected);
}

#[test]
fn lap_numbers_increase_monotonically() {
    let mut engine = RacingEngine::new();
    let laps: Vec<([f64; 3], f64)> = (0..6).map(|i| (EVEN_LAP, 60.0 - i as f64)).collect();
    let completions = run_laps(&mut engine, &laps);

    assert_eq!(completions.len(), 6);
    for (i, completion) in completions.iter().enumerate() {
        assert_eq!(completion.lap_data.lap_number, i as u32 + 1);
    }
    let history = engine.lap_history(100);
    for (i, lap) in history.iter().enumerate() {
        assert_eq!(lap.lap_number, i as u32 + 1);
    }
}

#[test]
fn tire_model_reports_fresh_tires_until_three_laps() {
    let mut engine = RacingEngine::new();
    run_laps(&mut engine, &[(EVEN_LAP, 60.0), (EVEN_LAP, 58.0)]);

    let tire = engine.tire_status();
    assert_eq!(tire.grip_level, 100.0);
    assert_eq!(tire.degradation_rate, 0.0);
    assert_eq!(tire.status, TireCondition::NewTires);
    assert!(!tire.pit_recommended);
}

#[test]
fn tire_model_regresses_pace_fade_over_three_laps() {
    let mut engine = RacingEngine::new();
    let completions = run_laps(
        &mut engine,
        &[(EVEN_LAP, 60.0), (EVEN_LAP, 58.0), (EVEN_LAP, 56.0)],
    );

    let tire = &completions[2].lap_data.tire_status;
    assert!((tire.degradation_rate - 2.0).abs() < 1e-6);
    assert!((tire.grip_level - 93.333).abs() < 0.01);
    assert!((tire.speed_loss_percent - 6.667).abs() < 0.01);
    assert_eq!(tire.status, TireCondition::Good);
    // 0.2 km/h of headroom at 2 km/h per lap leaves no laps in hand
    assert!(tire.laps_remaining < 3);
    assert!(tire.pit_recommended);
}

#[test]
fn tire_invariants_hold_across_a_fading_stint() {
    let mut engine = RacingEngine::new();
    let laps: Vec<([f64; 3], f64)> = (0..8).map(|i| (EVEN_LAP, 60.0 - 1.5 * i as f64)).collect();
    let completions = run_laps(&mut engine, &laps);

    for completion in &completions {
        let tire = &completion.lap_data.tire_status;
        assert!((0.0..=100.0).contains(&tire.grip_level));
        if tire.pit_recommended {
            assert!(tire.grip_level < 75.0 || tire.laps_remaining < 3);
        }
    }
}

#[test]
fn performance_is_absent_on_the_first_lap_then_scored() {
    let mut engine = RacingEngine::new();
    let completions = run_laps(&mut engine, &[(EVEN_LAP, 60.0), (EVEN_LAP, 60.0)]);

    assert!(completions[0].lap_data.performance.is_none());

    let perf = completions[1]
        .lap_data
        .performance
        .as_ref()
        .expect("second lap is scored");
    // identical laps at constant speed: perfect pace, consistency and
    // smoothness
    assert!((perf.overall_score - 100.0).abs() < 1e-6);
    assert_eq!(perf.rating.as_str(), "S+");
}

#[test]
fn performance_query_flattens_to_a_status_until_scored() {
    let mut engine = RacingEngine::new();
    run_laps(&mut engine, &[(EVEN_LAP, 60.0)]);

    match engine.performance() {
        Analysis::Pending { status } => assert_eq!(status, DataStatus::InsufficientData),
        Analysis::Ready(_) => panic!("one lap cannot be scored"),
    }

    let json = serde_json::to_value(engine.performance()).unwrap();
    assert_eq!(json, serde_json::json!({"status": "INSUFFICIENT_DATA"}));
}

#[test]
fn strategy_switches_to_attack_mode_late_in_the_race() {
    let mut engine = RacingEngine::new();
    engine.set_race_total_laps(10).unwrap();

    let laps: Vec<([f64; 3], f64)> = (0..8).map(|_| (EVEN_LAP, 60.0)).collect();
    let completions = run_laps(&mut engine, &laps);

    let strategy = completions[7]
        .race_strategy
        .as_ready()
        .expect("lap 8 has strategy");
    assert_eq!(strategy.race_phase, RacePhase::Closing);
    assert_eq!(strategy.strategy_mode, StrategyMode::AttackMode);
    assert!(strategy
        .recommendations
        .iter()
        .any(|r| r.category == AdviceCategory::Strategy));
    assert!(strategy.priority_action.is_some());
}

#[test]
fn strategy_is_pending_on_the_first_lap() {
    let mut engine = RacingEngine::new();
    let completions = run_laps(&mut engine, &[(EVEN_LAP, 60.0)]);

    match &completions[0].race_strategy {
        Analysis::Pending { status } => assert_eq!(*status, DataStatus::InsufficientData),
        Analysis::Ready(_) => panic!("one lap is not enough for strategy"),
    }
}

#[test]
fn race_length_must_be_at_least_one_lap() {
    let mut engine = RacingEngine::new();
    assert!(engine.set_race_total_laps(0).is_err());
    assert!(engine.set_race_total_laps(1).is_ok());
    assert_eq!(engine.race_total_laps(), 1);
}

#[test]
fn live_delta_is_near_zero_at_matching_pace() {
    let mut engine = RacingEngine::new();
    let (_, base_t) =
        run_timed_laps(&mut engine, 0.0, &[(EVEN_LAP, 60.0), (EVEN_LAP, 60.0)]);

    // continue the new lap at the same pace as the optimal reference
    for i in 1..=20 {
        let (lat, lon) = circle_point(i);
        let outcome = engine
            .process_sample(Sample {
                timestamp: base_t + i as f64 * 0.4,
                lat,
                lon,
                speed: 60.0,
            })
            .unwrap();

        if let IngestOutcome::Live(update) = outcome {
            assert_eq!(update.current_sector, 0);
            assert!(
                update.delta.abs() < 1.0,
                "delta {} too large at matching pace",
                update.delta
            );
        } else {
            panic!("mid-lap sample must not complete a lap");
        }
    }
}

#[test]
fn forecast_appears_after_three_laps_of_history() {
    let mut engine = RacingEngine::new();
    let (_, base_t) = run_timed_laps(
        &mut engine,
        0.0,
        &[(EVEN_LAP, 60.0), (EVEN_LAP, 60.0), (EVEN_LAP, 60.0)],
    );

    // drive most of a fourth lap so at least one sector is complete
    let mut last_update = None;
    for i in 1..=70 {
        let (lat, lon) = circle_point(i);
        if let IngestOutcome::Live(update) = engine
            .process_sample(Sample {
                timestamp: base_t + i as f64 * 0.4,
                lat,
                lon,
                speed: 60.0,
            })
            .unwrap()
        {
            last_update = Some(update);
        }
    }

    let update = last_update.expect("live updates were produced");
    let forecast = update.prediction.expect("three laps enable the forecast");
    assert!(
        (forecast.predicted_lap_time - 60.0).abs() < 1.0,
        "prediction {} should be near the uniform 60s laps",
        forecast.predicted_lap_time
    );
    assert!(forecast.confidence > 0.0 && forecast.confidence <= 1.0);
    assert!(update.optimal_lap_time.is_some());
}

#[test]
fn session_stats_report_no_data_then_aggregate() {
    let mut engine = RacingEngine::new();

    match engine.session_stats() {
        Analysis::Pending { status } => assert_eq!(status, DataStatus::NoData),
        Analysis::Ready(_) => panic!("no laps yet"),
    }

    run_laps(
        &mut engine,
        &[(EVEN_LAP, 60.0), ([19.0, 20.0, 20.0], 60.0), (EVEN_LAP, 60.0)],
    );

    let stats = match engine.session_stats() {
        Analysis::Ready(stats) => stats,
        Analysis::Pending { .. } => panic!("three laps recorded"),
    };
    assert_eq!(stats.total_laps, 3);
    assert_eq!(stats.best_lap_number, 2);
    assert!((stats.best_lap_time - 59.0).abs() < 1e-9);
    assert_eq!(stats.best_lap.lap_number, stats.best_lap_number);
    assert!(stats.last_5_avg.is_none(), "needs five laps");
    assert!((0.0..=100.0).contains(&stats.consistency));
}

#[test]
fn dashboard_assembles_all_products() {
    let mut engine = RacingEngine::new();
    run_laps(&mut engine, &[(EVEN_LAP, 60.0), (EVEN_LAP, 59.0)]);

    let dashboard = engine.dashboard();
    assert_eq!(dashboard.lap_history.len(), 2);
    assert!(dashboard.latest_lap.is_some());
    assert!(dashboard.current_position.is_some());
    assert!(dashboard.optimal_lap.as_ready().is_some());
    assert_eq!(
        dashboard.racing_line.len(),
        engine.racing_line().len()
    );
    assert_eq!(dashboard.tire_status.status, TireCondition::NewTires);
}

#[test]
fn overtaking_zones_keep_only_the_latest_lap() {
    let mut engine = RacingEngine::new();
    // fast lap first: plenty of high-speed zones
    let (_, next_t) = run_timed_laps(&mut engine, 0.0, &[(EVEN_LAP, 70.0)]);
    let after_fast = engine.overtaking_zones().len();
    assert!(after_fast > 0, "a 70 km/h lap has overtaking stretches");

    // crawl lap second: nothing above the speed gates
    run_timed_laps(&mut engine, next_t + 0.4, &[(EVEN_LAP, 20.0)]);
    assert!(
        engine.overtaking_zones().is_empty(),
        "zones must reflect the latest lap only"
    );
}
