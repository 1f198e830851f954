use std::collections::BTreeMap;

use serde::Serialize;

use carom_core::search::{BestShot, SearchPhase};

/// The JSON object handed to the rendering/API layer: chosen shot
/// parameters, the legality verdict, and enough trajectory data to draw a
/// path overlay.
#[derive(Debug, Serialize)]
pub struct ShotReport {
    pub angle: f32,
    pub power: f32,
    pub offset: [f32; 2],
    pub legal: bool,
    pub reason: &'static str,
    pub score: i32,
    pub phase: &'static str,
    /// Collision symbols in contact order, one-letter each.
    pub collisions: Vec<String>,
    /// Ball color -> strided [x, y] samples.
    pub trajectories: BTreeMap<&'static str, Vec<[f32; 2]>>,
}

impl ShotReport {
    pub fn new(best: &BestShot, trajectory_stride: usize) -> Self {
        let result = &best.result;
        let stride = trajectory_stride.max(1);

        let trajectories = result
            .trajectories
            .iter()
            .map(|(color, path)| {
                let samples = path
                    .iter()
                    .step_by(stride)
                    .map(|p| [p.x, p.y])
                    .collect();
                (color.as_str(), samples)
            })
            .collect();

        Self {
            angle: result.params.angle_deg,
            power: result.params.power,
            offset: [result.params.offset.x, result.params.offset.y],
            legal: result.verdict.legal,
            reason: result.verdict.reason.as_str(),
            score: result.score,
            phase: match best.phase {
                SearchPhase::Coarse => "coarse",
                SearchPhase::Fine => "fine",
            },
            collisions: result
                .events
                .iter()
                .map(|e| e.symbol.as_char().to_string())
                .collect(),
            trajectories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carom_core::physics::PhysicsConfig;
    use carom_core::scoring::ScoringConfig;
    use carom_core::simulator::{ShotParams, simulate_shot};
    use carom_core::table::{BallColor, Vec2};
    use carom_core::test_helpers::{spread_layout, standard_table};

    fn sample_best() -> BestShot {
        let result = simulate_shot(
            &standard_table(),
            &spread_layout(BallColor::White),
            ShotParams::new(0.0, 8.0, Vec2::ZERO),
            &PhysicsConfig::default(),
            &ScoringConfig::default(),
        );
        BestShot {
            result,
            phase: SearchPhase::Coarse,
        }
    }

    #[test]
    fn report_carries_shot_and_verdict() {
        let best = sample_best();
        let report = ShotReport::new(&best, 1);
        assert_eq!(report.angle, 0.0);
        assert_eq!(report.power, 8.0);
        assert_eq!(report.phase, "coarse");
        assert_eq!(report.trajectories.len(), 3);
        assert!(report.trajectories.contains_key("white"));
    }

    #[test]
    fn stride_thins_trajectories() {
        let best = sample_best();
        let full = ShotReport::new(&best, 1);
        let thinned = ShotReport::new(&best, 5);
        let full_len = full.trajectories["white"].len();
        let thinned_len = thinned.trajectories["white"].len();
        assert_eq!(thinned_len, full_len.div_ceil(5));
    }

    #[test]
    fn report_serializes_to_json() {
        let best = sample_best();
        let json = serde_json::to_value(ShotReport::new(&best, 5)).unwrap();
        assert!(json["legal"].is_boolean());
        assert!(json["collisions"].is_array());
        assert!(json["trajectories"]["red"].is_array());
        assert_eq!(json["reason"], best.result.verdict.reason.as_str());
    }
}
