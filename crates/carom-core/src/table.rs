use std::collections::HashMap;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Ball radius in table-pixel units.
pub const BALL_RADIUS: f32 = 5.0;
/// Uniform ball mass (the impulse math only needs the ratio, so 1.0).
pub const BALL_MASS: f32 = 1.0;

/// A 2D point or vector in table-pixel units.
///
/// Image coordinates: x grows rightward, y grows *downward*. Anything that
/// converts an angle into a direction must negate the y component to keep
/// overlays aligned with detected positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub const ZERO: Self = Self::new(0.0, 0.0);

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// The closed set of ball identities on a carom table.
///
/// White and yellow are cue-eligible; red is always an object ball.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum BallColor {
    #[default]
    White,
    Yellow,
    Red,
}

impl BallColor {
    pub const ALL: [BallColor; 3] = [BallColor::White, BallColor::Yellow, BallColor::Red];

    /// Parse a label-file color token. Unknown tokens yield `None`.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "white" => Some(Self::White),
            "yellow" => Some(Self::Yellow),
            "red" => Some(Self::Red),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }
}

impl fmt::Display for BallColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single ball: fixed identity, radius, and mass; position in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub color: BallColor,
    pub position: Vec2,
}

impl Ball {
    pub const fn new(color: BallColor, position: Vec2) -> Self {
        Self { color, position }
    }
}

/// The rectangular playing surface, in the same pixel units as ball positions.
///
/// Constant for the engine's lifetime; the four cushion segments run along
/// the rectangle's edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub width: f32,
    pub height: f32,
}

impl Table {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// The four cushion edges as (a, b) endpoint pairs: top, bottom, left, right.
    pub fn cushions(&self) -> [(Vec2, Vec2); 4] {
        let (w, h) = (self.width, self.height);
        [
            (Vec2::new(0.0, 0.0), Vec2::new(w, 0.0)),
            (Vec2::new(0.0, h), Vec2::new(w, h)),
            (Vec2::new(0.0, 0.0), Vec2::new(0.0, h)),
            (Vec2::new(w, 0.0), Vec2::new(w, h)),
        ]
    }

    /// Clamp a spawn position so the whole ball lies inside the cushions.
    pub fn clamp_spawn(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x.clamp(BALL_RADIUS, self.width - BALL_RADIUS),
            p.y.clamp(BALL_RADIUS, self.height - BALL_RADIUS),
        )
    }
}

/// The three detected balls plus the designated cue color.
///
/// Immutable once built; each simulation trial copies the initial positions
/// into its own fresh physics world.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BallLayout {
    balls: [Ball; 3],
    cue: BallColor,
}

impl BallLayout {
    /// Build a layout from a color → position mapping.
    ///
    /// Fails when any of the three colors is absent or when the cue is red
    /// (only white and yellow may be struck). Positions are clamped into the
    /// playable rectangle minus the ball radius.
    pub fn new(
        positions: &HashMap<BallColor, Vec2>,
        cue: BallColor,
        table: &Table,
    ) -> Result<Self, EngineError> {
        if cue == BallColor::Red {
            return Err(EngineError::InvalidConfig(
                "cue ball must be white or yellow".to_string(),
            ));
        }
        let mut balls = [Ball::new(BallColor::White, Vec2::ZERO); 3];
        for (slot, color) in balls.iter_mut().zip(BallColor::ALL) {
            let &p = positions
                .get(&color)
                .ok_or(EngineError::MissingBall(color))?;
            *slot = Ball::new(color, table.clamp_spawn(p));
        }
        Ok(Self { balls, cue })
    }

    /// Read a layout from a whitespace-separated label file
    /// (`"<color> <x> <y>"`, one ball per line, malformed lines skipped).
    pub fn from_label_file(
        path: &Path,
        cue: BallColor,
        table: &Table,
    ) -> Result<Self, EngineError> {
        let text = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let positions = parse_labels(&text);
        if positions.len() < 3 {
            return Err(EngineError::TooFewBalls(positions.len()));
        }
        Self::new(&positions, cue, table)
    }

    pub fn balls(&self) -> &[Ball; 3] {
        &self.balls
    }

    pub fn cue(&self) -> BallColor {
        self.cue
    }

    pub fn cue_position(&self) -> Vec2 {
        self.ball(self.cue).position
    }

    pub fn ball(&self, color: BallColor) -> &Ball {
        // ALL ordering matches the constructor's slot order.
        &self.balls[BallColor::ALL.iter().position(|&c| c == color).unwrap_or(0)]
    }

    /// The two colors the cue ball must contact, in enum order.
    pub fn object_colors(&self) -> [BallColor; 2] {
        match self.cue {
            BallColor::White => [BallColor::Yellow, BallColor::Red],
            _ => [BallColor::White, BallColor::Red],
        }
    }
}

/// Parse label-file text into a color → position mapping.
///
/// Malformed lines are skipped (logged at debug level); a color repeated on
/// a later line overwrites the earlier one, matching upstream behavior.
pub fn parse_labels(text: &str) -> HashMap<BallColor, Vec2> {
    let mut positions = HashMap::new();
    for line in text.lines() {
        let mut parts = line.split_whitespace();
        let parsed = (|| {
            let color = BallColor::parse(parts.next()?)?;
            let x: i32 = parts.next()?.parse().ok()?;
            let y: i32 = parts.next()?.parse().ok()?;
            Some((color, Vec2::new(x as f32, y as f32)))
        })();
        match parsed {
            Some((color, p)) => {
                positions.insert(color, p);
            },
            None if line.trim().is_empty() => {},
            None => {
                tracing::debug!(line, "skipping malformed label line");
            },
        }
    }
    positions
}
