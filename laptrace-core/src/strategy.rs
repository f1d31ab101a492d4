//! Race strategy rule engine
//!
//! Deterministic rules over tire state, pace trend, driver performance and
//! race progress, bucketed by priority and flattened high-first. Advisory
//! icons and phrasing are part of the wire contract consumed by pit-wall
//! displays.

use crate::model::{
    Advisory, AdviceCategory, Analysis, DataStatus, LapRecord, PerformanceSnapshot, RacePhase,
    StrategyMode, StrategyRecord, TireStatus, Trend,
};

/// Pace drop over five laps that flags a problem (seconds).
const PACE_DROP_ALERT: f64 = 1.0;
/// Pace gain over five laps worth calling out (seconds).
const PACE_GAIN_NOTE: f64 = 0.3;

/// Produce the strategy read-out for a just-completed lap. Needs at least
/// two laps of history to say anything.
pub fn advise(
    history: &[LapRecord],
    lap_number: u32,
    total_laps: u32,
    tire: Option<&TireStatus>,
    performance: Option<&PerformanceSnapshot>,
) -> Analysis<StrategyRecord> {
    if history.is_empty() || lap_number < 2 {
        return Analysis::pending(DataStatus::InsufficientData);
    }

    let laps_remaining = total_laps as i64 - lap_number as i64;
    let race_progress = lap_number as f64 / total_laps as f64;

    let mut high = Vec::new();
    let mut medium = Vec::new();
    let mut low = Vec::new();

    if let Some(tire) = tire {
        if tire.pit_recommended {
            high.push(Advisory {
                category: AdviceCategory::Tires,
                icon: "🔴".to_string(),
                message: format!(
                    "Tire grip at {:.0}% - pit within {} laps",
                    tire.grip_level, tire.laps_remaining
                ),
                action: if tire.grip_level < 65.0 {
                    "BOX_THIS_LAP".to_string()
                } else {
                    "PLAN_PIT_STOP".to_string()
                },
                expected_gain: "+1.2s/lap with fresh tires".to_string(),
            });
        } else if tire.grip_level < 85.0 {
            medium.push(Advisory {
                category: AdviceCategory::Tires,
                icon: "🟡".to_string(),
                message: format!(
                    "Tire degradation detected ({:.1}% pace loss)",
                    tire.speed_loss_percent
                ),
                action: "MONITOR_CLOSELY".to_string(),
                expected_gain: "Consider pit window in 3-5 laps".to_string(),
            });
        }
    }

    if history.len() >= 5 {
        let recent = &history[history.len() - 5..];
        let pace_trend = recent[recent.len() - 1].total_time - recent[0].total_time;

        if pace_trend > PACE_DROP_ALERT {
            high.push(Advisory {
                category: AdviceCategory::Pace,
                icon: "⚠️".to_string(),
                message: format!("Pace dropping by {:.2}s over last 5 laps", pace_trend),
                action: "CHECK_TIRE_PRESSURE".to_string(),
                expected_gain: "Investigate mechanical issues".to_string(),
            });
        } else if pace_trend < -PACE_GAIN_NOTE {
            low.push(Advisory {
                category: AdviceCategory::Pace,
                icon: "✅".to_string(),
                message: format!("Pace improving by {:.2}s - excellent", pace_trend.abs()),
                action: "MAINTAIN_RHYTHM".to_string(),
                expected_gain: "Keep building confidence".to_string(),
            });
        }
    }

    if let Some(perf) = performance {
        if perf.overall_score < 70.0 {
            medium.push(Advisory {
                category: AdviceCategory::Driving,
                icon: "💡".to_string(),
                message: format!(
                    "Performance score {} - focus on consistency",
                    perf.rating.as_str()
                ),
                action: "SMOOTH_INPUTS".to_string(),
                expected_gain: "+0.3s/lap potential".to_string(),
            });
        } else if perf.trend == Trend::Improving {
            low.push(Advisory {
                category: AdviceCategory::Driving,
                icon: "📈".to_string(),
                message: format!("Performance improving - rating {}", perf.rating.as_str()),
                action: "KEEP_PUSHING".to_string(),
                expected_gain: "Momentum building".to_string(),
            });
        }
    }

    let strategy_mode = if race_progress < 0.3 {
        StrategyMode::SettleIn
    } else if race_progress < 0.7 {
        StrategyMode::MaintainPace
    } else {
        high.push(Advisory {
            category: AdviceCategory::Strategy,
            icon: "🏁".to_string(),
            message: format!("Final {} laps - push for position", laps_remaining),
            action: "MAXIMUM_ATTACK".to_string(),
            expected_gain: "Race is now".to_string(),
        });
        StrategyMode::AttackMode
    };

    if laps_remaining == 5 {
        high.push(Advisory {
            category: AdviceCategory::RaceInfo,
            icon: "⏱️".to_string(),
            message: "5 laps remaining - final push".to_string(),
            action: "GIVE_IT_EVERYTHING".to_string(),
            expected_gain: "No tire saving needed".to_string(),
        });
    } else if laps_remaining == 1 {
        high.push(Advisory {
            category: AdviceCategory::RaceInfo,
            icon: "🏁".to_string(),
            message: "Final lap - maximum attack".to_string(),
            action: "QUALIFYING_MODE".to_string(),
            expected_gain: "Last chance for positions".to_string(),
        });
    }

    let mut recommendations = high;
    recommendations.append(&mut medium);
    recommendations.append(&mut low);

    Analysis::Ready(StrategyRecord {
        lap: lap_number,
        laps_remaining,
        race_progress: race_progress * 100.0,
        race_phase: phase_for(race_progress),
        strategy_mode,
        priority_action: recommendations.first().cloned(),
        recommendations,
    })
}

fn phase_for(progress: f64) -> RacePhase {
    if progress < 0.25 {
        RacePhase::Opening
    } else if progress < 0.5 {
        RacePhase::Early
    } else if progress < 0.75 {
        RacePhase::Middle
    } else {
        RacePhase::Closing
    }
}
