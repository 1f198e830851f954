use serde::{Deserialize, Serialize};

use crate::table::{BALL_MASS, BALL_RADIUS, Ball, BallColor, Table, Vec2};

/// Tunable physics constants; defaults are the calibrated table values.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Per-second velocity retention factor applied by the world each step.
    pub damping: f32,
    /// Restitution for cushions and balls alike.
    pub restitution: f32,
    /// Contact friction for cushions and balls alike.
    pub friction: f32,
    /// Impulse speed at full power gauge, pixels per second.
    pub max_speed: f32,
    /// Extra per-step linear decay applied by the simulator on top of
    /// the world damping (`v *= 1 - decay * dt`).
    pub linear_decay: f32,
    /// Speed at or below which a ball counts as settled.
    pub settle_threshold: f32,
    /// Hard ceiling on simulation steps; guarantees termination.
    pub max_steps: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            damping: 0.99,
            restitution: 0.90,
            friction: 0.05,
            max_speed: 200.0,
            linear_decay: 0.02,
            settle_threshold: 1.2,
            max_steps: 1200,
        }
    }
}

/// Identity of a collider participating in a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColliderKind {
    Cushion,
    Ball(BallColor),
}

/// A resolved contact between two colliders, reported once per step in
/// which an impulse was actually applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub a: ColliderKind,
    pub b: ColliderKind,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    a: Vec2,
    b: Vec2,
}

#[derive(Debug, Clone, Copy)]
struct Body {
    color: BallColor,
    position: Vec2,
    velocity: Vec2,
    radius: f32,
    mass: f32,
}

/// Minimal 2D impulse world: zero gravity, four static cushion segments,
/// dynamic circles with elastic/frictional contacts, per-second damping.
///
/// One world is built per trial and mutated in place by `step_with`; nothing
/// here is shared across trials.
#[derive(Debug)]
pub struct World {
    damping: f32,
    restitution: f32,
    friction: f32,
    segments: Vec<Segment>,
    bodies: Vec<Body>,
}

impl World {
    pub fn new(table: &Table, config: &PhysicsConfig) -> Self {
        let segments = table
            .cushions()
            .into_iter()
            .map(|(a, b)| Segment { a, b })
            .collect();
        Self {
            damping: config.damping,
            restitution: config.restitution,
            friction: config.friction,
            segments,
            bodies: Vec::with_capacity(3),
        }
    }

    pub fn add_ball(&mut self, ball: &Ball) {
        self.bodies.push(Body {
            color: ball.color,
            position: ball.position,
            velocity: Vec2::ZERO,
            radius: BALL_RADIUS,
            mass: BALL_MASS,
        });
    }

    /// Apply an instantaneous impulse to a body.
    ///
    /// The application point is accepted for parity with the shot contract
    /// (spin offset), but bodies do not rotate, so only the linear response
    /// is modeled.
    pub fn apply_impulse(&mut self, color: BallColor, impulse: Vec2, _point: Vec2) {
        if let Some(body) = self.bodies.iter_mut().find(|b| b.color == color) {
            body.velocity += impulse * (1.0 / body.mass);
        }
    }

    /// Advance the world by one fixed timestep, invoking `on_contact` for
    /// every resolved contact. Resolution order is fixed (ball pairs in
    /// insertion order, then cushions), so stepping is fully deterministic.
    pub fn step_with(&mut self, dt: f32, on_contact: &mut dyn FnMut(Contact)) {
        for body in &mut self.bodies {
            body.position += body.velocity * dt;
        }

        for i in 0..self.bodies.len() {
            for j in (i + 1)..self.bodies.len() {
                let (left, right) = self.bodies.split_at_mut(j);
                let (a, b) = (&mut left[i], &mut right[0]);
                if resolve_ball_pair(a, b, self.restitution, self.friction) {
                    on_contact(Contact {
                        a: ColliderKind::Ball(a.color),
                        b: ColliderKind::Ball(b.color),
                    });
                }
            }
        }

        for body in &mut self.bodies {
            for segment in &self.segments {
                if resolve_cushion(body, segment, self.restitution, self.friction) {
                    on_contact(Contact {
                        a: ColliderKind::Ball(body.color),
                        b: ColliderKind::Cushion,
                    });
                }
            }
        }

        let retain = self.damping.powf(dt);
        for body in &mut self.bodies {
            body.velocity = body.velocity * retain;
        }
    }

    /// Extra velocity scaling applied by the caller on top of world damping.
    pub fn scale_velocities(&mut self, factor: f32) {
        for body in &mut self.bodies {
            body.velocity = body.velocity * factor;
        }
    }

    /// Current position of every body, in insertion order.
    pub fn positions(&self) -> impl Iterator<Item = (BallColor, Vec2)> + '_ {
        self.bodies.iter().map(|b| (b.color, b.position))
    }

    /// Speed of the fastest body; zero for an empty world.
    pub fn fastest_speed(&self) -> f32 {
        self.bodies
            .iter()
            .map(|b| b.velocity.length())
            .fold(0.0, f32::max)
    }

    #[cfg(test)]
    fn velocity(&self, color: BallColor) -> Vec2 {
        self.bodies
            .iter()
            .find(|b| b.color == color)
            .map(|b| b.velocity)
            .unwrap_or(Vec2::ZERO)
    }

    #[cfg(test)]
    fn position(&self, color: BallColor) -> Vec2 {
        self.bodies
            .iter()
            .find(|b| b.color == color)
            .map(|b| b.position)
            .unwrap_or(Vec2::ZERO)
    }
}

/// Elastic circle-circle resolution with positional correction.
/// Returns true when an impulse was applied.
fn resolve_ball_pair(a: &mut Body, b: &mut Body, restitution: f32, friction: f32) -> bool {
    let delta = b.position - a.position;
    let dist = delta.length();
    let min_dist = a.radius + b.radius;
    if dist >= min_dist || dist <= 1e-6 {
        return false;
    }

    let normal = delta * (1.0 / dist);

    // Separate the overlap evenly.
    let push = (min_dist - dist) * 0.5;
    a.position -= normal * push;
    b.position += normal * push;

    let rel = a.velocity - b.velocity;
    let vn = rel.dot(normal);
    if vn <= 0.0 {
        // Already separating.
        return false;
    }

    let inv_mass_sum = 1.0 / a.mass + 1.0 / b.mass;
    let jn = (1.0 + restitution) * vn / inv_mass_sum;
    a.velocity -= normal * (jn / a.mass);
    b.velocity += normal * (jn / b.mass);

    // Coulomb-style tangential friction, clamped to the normal impulse.
    let tangent = rel - normal * vn;
    let tangent_speed = tangent.length();
    if tangent_speed > 1e-6 {
        let tdir = tangent * (1.0 / tangent_speed);
        let jt = (friction * jn).min(tangent_speed / inv_mass_sum);
        a.velocity -= tdir * (jt / a.mass);
        b.velocity += tdir * (jt / b.mass);
    }
    true
}

/// Circle-segment resolution: project the center onto the segment, push the
/// ball out along the contact normal, and reflect the normal velocity
/// component. Returns true when an impulse was applied.
fn resolve_cushion(body: &mut Body, segment: &Segment, restitution: f32, friction: f32) -> bool {
    let edge = segment.b - segment.a;
    let len_sq = edge.length_squared();
    if len_sq < 1e-6 {
        return false;
    }

    let t = ((body.position - segment.a).dot(edge) / len_sq).clamp(0.0, 1.0);
    let closest = segment.a + edge * t;
    let offset = body.position - closest;
    let dist = offset.length();
    if dist >= body.radius || dist <= 1e-6 {
        return false;
    }

    let normal = offset * (1.0 / dist);
    body.position += normal * (body.radius - dist);

    let vn = body.velocity.dot(normal);
    if vn >= 0.0 {
        return false;
    }

    body.velocity -= normal * ((1.0 + restitution) * vn);
    // Friction bleeds a little tangential speed on each cushion contact.
    let tangent = body.velocity - normal * body.velocity.dot(normal);
    body.velocity -= tangent * friction;
    true
}
