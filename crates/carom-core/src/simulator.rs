use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::events::{CollisionEvent, CollisionLog, CollisionSymbol};
use crate::physics::{PhysicsConfig, World};
use crate::scoring::{self, ScoringConfig, Verdict};
use crate::table::{BALL_MASS, BallColor, BallLayout, Table, Vec2};

/// Fixed physics timestep (60 Hz reference rate).
pub const DT: f32 = 1.0 / 60.0;

/// Maximum power gauge value.
pub const MAX_POWER: f32 = 10.0;

/// Parameters of a single candidate shot; immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotParams {
    /// Aim angle in degrees, [0, 360). 0° points along +x; increasing angle
    /// rotates counter-clockwise in image coordinates (y is negated).
    pub angle_deg: f32,
    /// Power gauge in [0, 10], mapped linearly to the impulse speed.
    pub power: f32,
    /// Impulse application offset from the cue ball center (strike point).
    pub offset: Vec2,
}

impl ShotParams {
    pub const fn new(angle_deg: f32, power: f32, offset: Vec2) -> Self {
        Self {
            angle_deg,
            power,
            offset,
        }
    }

    /// Convert (angle, power) into an impulse vector for a body of ball mass.
    ///
    /// The y component is negated: image coordinates grow downward, and the
    /// rendering overlay depends on this convention exactly.
    pub fn impulse(&self, max_speed: f32) -> Vec2 {
        let power = self.power.clamp(0.0, MAX_POWER);
        let speed = (power / MAX_POWER) * max_speed;
        let radians = self.angle_deg.to_radians();
        Vec2::new(radians.cos(), -radians.sin()) * (speed * BALL_MASS)
    }
}

/// How a trial's stepping loop terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// Every ball slowed below the settle threshold.
    Settled,
    /// The step ceiling was reached; the trajectory is truncated, not failed.
    StepLimitReached,
}

/// Everything one trial produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShotResult {
    pub params: ShotParams,
    pub verdict: Verdict,
    pub score: i32,
    pub events: Vec<CollisionEvent>,
    /// Per-ball sampled positions, one entry per simulated step.
    pub trajectories: BTreeMap<BallColor, Vec<Vec2>>,
    pub steps: u32,
    pub termination: Termination,
}

impl ShotResult {
    pub fn symbols(&self) -> Vec<CollisionSymbol> {
        self.events.iter().map(|e| e.symbol).collect()
    }

    /// Whether the cue ball's first contact was an object ball rather than
    /// a cushion. False for an empty log.
    pub fn first_contact_is_object(&self) -> bool {
        matches!(
            self.events.first(),
            Some(e) if e.symbol != CollisionSymbol::Cushion
        )
    }
}

/// Run one candidate shot to completion.
///
/// Allocates a fresh world and classifier, applies the impulse at the cue
/// center plus the spin offset, then steps until every ball settles or the
/// ceiling is hit. Pure in (table, layout, params, config); repeated calls
/// yield identical results.
pub fn simulate_shot(
    table: &Table,
    layout: &BallLayout,
    params: ShotParams,
    physics: &PhysicsConfig,
    scoring: &ScoringConfig,
) -> ShotResult {
    let mut world = World::new(table, physics);
    for ball in layout.balls() {
        world.add_ball(ball);
    }

    let mut log = CollisionLog::new(layout.cue());

    let impulse = params.impulse(physics.max_speed);
    let strike_point = layout.cue_position() + params.offset;
    world.apply_impulse(layout.cue(), impulse, strike_point);

    let mut trajectories: BTreeMap<BallColor, Vec<Vec2>> = layout
        .balls()
        .iter()
        .map(|b| (b.color, Vec::with_capacity(physics.max_steps as usize)))
        .collect();

    let decay = 1.0 - physics.linear_decay * DT;
    let mut steps = 0;
    let mut termination = Termination::StepLimitReached;

    for frame in 1..=physics.max_steps {
        world.step_with(DT, &mut |contact| log.record(frame, contact));
        world.scale_velocities(decay);

        for (color, position) in world.positions() {
            if let Some(path) = trajectories.get_mut(&color) {
                path.push(position);
            }
        }

        steps = frame;
        // Settled once no ball exceeds the threshold, boundary included.
        if world.fastest_speed() <= physics.settle_threshold {
            termination = Termination::Settled;
            break;
        }
    }

    let symbols = log.symbols();
    let verdict = scoring::evaluate_legality(&symbols, layout.cue());
    let score = scoring::score(&symbols, scoring);

    tracing::trace!(
        angle = params.angle_deg,
        power = params.power,
        steps,
        legal = verdict.legal,
        score,
        contacts = symbols.len(),
        "trial complete"
    );

    ShotResult {
        params,
        verdict,
        score,
        events: log.into_events(),
        trajectories,
        steps,
        termination,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{spread_layout, standard_table};

    fn run(params: ShotParams, layout: &BallLayout) -> ShotResult {
        simulate_shot(
            &standard_table(),
            layout,
            params,
            &PhysicsConfig::default(),
            &ScoringConfig::default(),
        )
    }

    #[test]
    fn impulse_points_along_angle_with_image_y() {
        let params = ShotParams::new(90.0, 10.0, Vec2::ZERO);
        let impulse = params.impulse(200.0);
        // 90° aims "up" in image coordinates, which is negative y.
        assert!(impulse.x.abs() < 1e-3);
        assert!((impulse.y + 200.0).abs() < 1e-3);
    }

    #[test]
    fn power_is_clamped_to_gauge_range() {
        let over = ShotParams::new(0.0, 25.0, Vec2::ZERO).impulse(200.0);
        let max = ShotParams::new(0.0, 10.0, Vec2::ZERO).impulse(200.0);
        assert_eq!(over, max);
        let under = ShotParams::new(0.0, -3.0, Vec2::ZERO).impulse(200.0);
        assert_eq!(under, Vec2::ZERO);
    }

    #[test]
    fn zero_power_settles_with_empty_log() {
        let layout = spread_layout(BallColor::White);
        let result = run(ShotParams::new(0.0, 0.0, Vec2::ZERO), &layout);
        assert_eq!(result.termination, Termination::Settled);
        assert_eq!(result.steps, 1);
        assert!(result.events.is_empty());
        assert!(!result.verdict.legal);
        assert_eq!(result.score, ScoringConfig::default().empty_log_score);
    }

    #[test]
    fn trajectories_cover_every_ball_every_step() {
        let layout = spread_layout(BallColor::White);
        let result = run(ShotParams::new(45.0, 6.0, Vec2::ZERO), &layout);
        assert_eq!(result.trajectories.len(), 3);
        for path in result.trajectories.values() {
            assert_eq!(path.len(), result.steps as usize);
        }
    }

    #[test]
    fn full_power_shot_reaches_a_cushion() {
        let layout = spread_layout(BallColor::White);
        // Aim straight down at the bottom cushion (270° is +y in image space).
        let result = run(ShotParams::new(270.0, 10.0, Vec2::ZERO), &layout);
        assert!(
            result
                .events
                .iter()
                .any(|e| e.symbol == CollisionSymbol::Cushion),
            "expected at least one cushion contact, log = {:?}",
            result.events
        );
    }

    #[test]
    fn trial_is_deterministic() {
        let layout = spread_layout(BallColor::White);
        let params = ShotParams::new(30.0, 8.0, Vec2::new(1.0, -1.0));
        let a = run(params, &layout);
        let b = run(params, &layout);
        assert_eq!(a, b);
    }

    #[test]
    fn settle_check_includes_the_threshold_exactly() {
        // Reproduce the cue speed after exactly one step (world damping,
        // then the simulator's extra decay) and use it as the threshold:
        // a ball *at* the threshold counts as settled.
        let physics = PhysicsConfig::default();
        let retain = physics.damping.powf(DT);
        let decay = 1.0 - physics.linear_decay * DT;
        let speed_after_first_step = (physics.max_speed * retain) * decay;
        let physics = PhysicsConfig {
            settle_threshold: speed_after_first_step,
            ..physics
        };

        let result = simulate_shot(
            &standard_table(),
            &spread_layout(BallColor::White),
            ShotParams::new(0.0, 10.0, Vec2::ZERO),
            &physics,
            &ScoringConfig::default(),
        );
        assert_eq!(result.termination, Termination::Settled);
        assert_eq!(
            result.steps, 1,
            "speed equal to the threshold must settle immediately"
        );
    }

    #[test]
    fn step_ceiling_bounds_the_loop() {
        let layout = spread_layout(BallColor::White);
        // No decay at all: balls never settle, so the ceiling must fire.
        let physics = PhysicsConfig {
            damping: 1.0,
            linear_decay: 0.0,
            restitution: 1.0,
            friction: 0.0,
            max_steps: 120,
            ..PhysicsConfig::default()
        };
        let result = simulate_shot(
            &standard_table(),
            &layout,
            ShotParams::new(10.0, 10.0, Vec2::ZERO),
            &physics,
            &ScoringConfig::default(),
        );
        assert_eq!(result.termination, Termination::StepLimitReached);
        assert_eq!(result.steps, 120);
    }
}
