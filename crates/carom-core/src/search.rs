use serde::{Deserialize, Serialize};

use crate::physics::PhysicsConfig;
use crate::scoring::ScoringConfig;
use crate::simulator::{ShotParams, ShotResult, simulate_shot};
use crate::table::{BallLayout, Table, Vec2};

/// Grid dimensions for the two search phases.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Coarse phase angle step, degrees.
    pub coarse_angle_step: u32,
    /// Inclusive power gauge range, integers in [1, 10].
    pub power_min: u32,
    pub power_max: u32,
    /// Fine phase: half-width of the angle window around the coarse best.
    pub fine_angle_window: u32,
    /// Fine phase angle step, degrees.
    pub fine_angle_step: u32,
    /// Fine phase: half-width of the power window (clamped to the gauge).
    pub fine_power_window: u32,
    /// Fine phase: spin offsets sweep a square grid of this radius (in
    /// integer pixels) around the coarse best offset.
    pub fine_offset_radius: i32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            coarse_angle_step: 5,
            power_min: 1,
            power_max: 10,
            fine_angle_window: 30,
            fine_angle_step: 5,
            fine_power_window: 5,
            fine_offset_radius: 1,
        }
    }
}

/// Which search phase produced the winning trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchPhase {
    Coarse,
    Fine,
}

/// The winning trial of a full search run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestShot {
    pub result: ShotResult,
    pub phase: SearchPhase,
}

/// Candidate pools for one phase: legal shots whose first contact is an
/// object ball are preferred over legal shots that open with a cushion.
/// Within a pool, the first maximum in enumeration order wins.
#[derive(Default)]
struct Candidates {
    direct: Option<ShotResult>,
    backup: Option<ShotResult>,
    trials: u32,
    legal: u32,
}

impl Candidates {
    fn offer(&mut self, result: ShotResult) {
        self.trials += 1;
        if !result.verdict.legal {
            return;
        }
        self.legal += 1;
        let pool = if result.first_contact_is_object() {
            &mut self.direct
        } else {
            &mut self.backup
        };
        // Strictly-greater keeps the first maximum encountered.
        match pool {
            Some(best) if best.score >= result.score => {},
            _ => *pool = Some(result),
        }
    }

    fn best(self) -> Option<ShotResult> {
        self.direct.or(self.backup)
    }
}

/// Two-phase adaptive grid search over (angle, power, spin offset).
///
/// Phase 1 sweeps the full circle with a center strike; phase 2 narrows in
/// around the coarse best and adds a small offset grid. Returns `None` when
/// phase 1 finds no legal shot at all; an illegal "best" is never invented.
pub fn adaptive_search(
    table: &Table,
    layout: &BallLayout,
    search: &SearchConfig,
    physics: &PhysicsConfig,
    scoring: &ScoringConfig,
) -> Option<BestShot> {
    let coarse = coarse_phase(table, layout, search, physics, scoring)?;
    tracing::info!(
        angle = coarse.params.angle_deg,
        power = coarse.params.power,
        score = coarse.score,
        "coarse phase best"
    );

    match fine_phase(table, layout, &coarse.params, search, physics, scoring) {
        Some(fine) => {
            tracing::info!(
                angle = fine.params.angle_deg,
                power = fine.params.power,
                score = fine.score,
                "fine phase best"
            );
            Some(BestShot {
                result: fine,
                phase: SearchPhase::Fine,
            })
        },
        None => {
            tracing::info!("fine phase found no legal shot, keeping coarse result");
            Some(BestShot {
                result: coarse,
                phase: SearchPhase::Coarse,
            })
        },
    }
}

fn coarse_phase(
    table: &Table,
    layout: &BallLayout,
    search: &SearchConfig,
    physics: &PhysicsConfig,
    scoring: &ScoringConfig,
) -> Option<ShotResult> {
    let mut candidates = Candidates::default();
    let step = search.coarse_angle_step.max(1);

    for angle in (0..360).step_by(step as usize) {
        for power in search.power_min..=search.power_max {
            let params = ShotParams::new(angle as f32, power as f32, Vec2::ZERO);
            candidates.offer(simulate_shot(table, layout, params, physics, scoring));
        }
    }

    tracing::debug!(
        trials = candidates.trials,
        legal = candidates.legal,
        "coarse phase done"
    );
    candidates.best()
}

fn fine_phase(
    table: &Table,
    layout: &BallLayout,
    around: &ShotParams,
    search: &SearchConfig,
    physics: &PhysicsConfig,
    scoring: &ScoringConfig,
) -> Option<ShotResult> {
    let mut candidates = Candidates::default();

    let center_angle = around.angle_deg.round() as i32;
    let window = search.fine_angle_window as i32;
    let angle_step = search.fine_angle_step.max(1) as usize;

    let center_power = around.power.round() as u32;
    let power_lo = center_power
        .saturating_sub(search.fine_power_window)
        .max(search.power_min);
    let power_hi = (center_power + search.fine_power_window).min(search.power_max);

    let r = search.fine_offset_radius;
    let base = around.offset;

    for angle in ((center_angle - window)..=(center_angle + window)).step_by(angle_step) {
        let angle = angle.rem_euclid(360) as f32;
        for power in power_lo..=power_hi {
            for ox in -r..=r {
                for oy in -r..=r {
                    let offset = Vec2::new(base.x + ox as f32, base.y + oy as f32);
                    let params = ShotParams::new(angle, power as f32, offset);
                    candidates.offer(simulate_shot(table, layout, params, physics, scoring));
                }
            }
        }
    }

    tracing::debug!(
        trials = candidates.trials,
        legal = candidates.legal,
        "fine phase done"
    );
    candidates.best()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{CollisionEvent, CollisionSymbol};
    use crate::scoring::{Reason, Verdict};
    use crate::simulator::Termination;
    use crate::table::BallColor;
    use crate::test_helpers::{spread_layout, standard_table};
    use std::collections::BTreeMap;

    fn fake_result(legal: bool, direct: bool, score: i32, angle: f32) -> ShotResult {
        let first = if direct {
            CollisionSymbol::Red
        } else {
            CollisionSymbol::Cushion
        };
        ShotResult {
            params: ShotParams::new(angle, 5.0, Vec2::ZERO),
            verdict: Verdict {
                legal,
                reason: if legal {
                    Reason::Legal3Cushion
                } else {
                    Reason::NoObjectBall
                },
            },
            score,
            events: vec![CollisionEvent {
                frame: 1,
                symbol: first,
            }],
            trajectories: BTreeMap::new(),
            steps: 1,
            termination: Termination::Settled,
        }
    }

    #[test]
    fn illegal_results_are_discarded() {
        let mut c = Candidates::default();
        c.offer(fake_result(false, true, 999, 0.0));
        assert!(c.best().is_none());
    }

    #[test]
    fn direct_pool_preferred_even_at_lower_score() {
        let mut c = Candidates::default();
        c.offer(fake_result(true, false, 500, 0.0));
        c.offer(fake_result(true, true, 10, 5.0));
        let best = c.best().unwrap();
        assert_eq!(best.score, 10);
        assert!(best.first_contact_is_object());
    }

    #[test]
    fn backup_pool_used_when_no_direct_shot() {
        let mut c = Candidates::default();
        c.offer(fake_result(true, false, 40, 0.0));
        c.offer(fake_result(true, false, 70, 5.0));
        assert_eq!(c.best().unwrap().score, 70);
    }

    #[test]
    fn ties_break_to_first_in_enumeration_order() {
        let mut c = Candidates::default();
        c.offer(fake_result(true, true, 100, 10.0));
        c.offer(fake_result(true, true, 100, 20.0));
        assert_eq!(c.best().unwrap().params.angle_deg, 10.0);
    }

    #[test]
    fn empty_fine_phase_keeps_the_coarse_result() {
        let table = standard_table();
        let layout = spread_layout(BallColor::White);
        let physics = PhysicsConfig::default();
        let scoring = ScoringConfig::default();
        let base = SearchConfig {
            coarse_angle_step: 30,
            ..SearchConfig::default()
        };

        let coarse = coarse_phase(&table, &layout, &base, &physics, &scoring)
            .expect("coarse sweep finds a legal shot on the spread layout");
        let center_angle = coarse.params.angle_deg.round() as i32;

        // A window w with step 2w + 1 leaves a single fine trial at
        // center - w; widen until that lone trial is illegal, so the
        // fine sweep comes up empty.
        let window = (1..=60u32)
            .find(|w| {
                let angle = (center_angle - *w as i32).rem_euclid(360) as f32;
                let params = ShotParams::new(angle, coarse.params.power, Vec2::ZERO);
                !simulate_shot(&table, &layout, params, &physics, &scoring)
                    .verdict
                    .legal
            })
            .expect("some off-center angle misses the legal shot");

        let search = SearchConfig {
            fine_angle_window: window,
            fine_angle_step: 2 * window + 1,
            fine_power_window: 0,
            fine_offset_radius: 0,
            ..base
        };

        let best = adaptive_search(&table, &layout, &search, &physics, &scoring)
            .expect("coarse result survives an empty fine phase");
        assert_eq!(best.phase, SearchPhase::Coarse);
        assert_eq!(best.result.params.angle_deg, coarse.params.angle_deg);
        assert_eq!(best.result.params.power, coarse.params.power);
        assert_eq!(best.result.score, coarse.score);
    }

    #[test]
    fn fine_angles_wrap_modulo_360() {
        // The wrap arithmetic itself, isolated from physics.
        let center = 10i32;
        let window = 30i32;
        let wrapped: Vec<i32> = ((center - window)..=(center + window))
            .step_by(5)
            .map(|a| a.rem_euclid(360))
            .collect();
        assert!(wrapped.contains(&340));
        assert!(wrapped.contains(&0));
        assert!(wrapped.contains(&40));
        assert!(wrapped.iter().all(|a| (0..360).contains(a)));
    }
}
