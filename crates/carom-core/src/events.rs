use std::fmt;

use serde::{Deserialize, Serialize};

use crate::physics::{ColliderKind, Contact};
use crate::table::BallColor;

/// Minimum frame gap between two recorded cushion symbols. A graze that
/// keeps re-contacting a cushion within this window collapses into one
/// symbol; suppressed contacts still extend the window.
pub const DEBOUNCE_FRAMES: u32 = 3;

/// One-letter collision symbols, relative to the current cue ball.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollisionSymbol {
    Cushion,
    White,
    Yellow,
    Red,
}

impl CollisionSymbol {
    pub fn as_char(self) -> char {
        match self {
            Self::Cushion => 'C',
            Self::White => 'W',
            Self::Yellow => 'Y',
            Self::Red => 'R',
        }
    }
}

impl From<BallColor> for CollisionSymbol {
    fn from(color: BallColor) -> Self {
        match color {
            BallColor::White => Self::White,
            BallColor::Yellow => Self::Yellow,
            BallColor::Red => Self::Red,
        }
    }
}

impl fmt::Display for CollisionSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One classified cue-ball contact: the simulation frame it occurred on
/// plus its symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionEvent {
    pub frame: u32,
    pub symbol: CollisionSymbol,
}

/// Per-trial collision classifier.
///
/// Consumes raw contact notifications from the physics world, keeps only
/// those involving the cue ball, and appends debounced symbols in strict
/// time order. Owned by a single trial; never shared.
#[derive(Debug)]
pub struct CollisionLog {
    cue: BallColor,
    last_symbol: Option<CollisionSymbol>,
    last_frame: u32,
    events: Vec<CollisionEvent>,
}

impl CollisionLog {
    pub fn new(cue: BallColor) -> Self {
        Self {
            cue,
            last_symbol: None,
            last_frame: 0,
            events: Vec::new(),
        }
    }

    /// Classify one raw contact at the given frame.
    pub fn record(&mut self, frame: u32, contact: Contact) {
        let other = match (contact.a, contact.b) {
            (ColliderKind::Ball(c), other) if c == self.cue => other,
            (other, ColliderKind::Ball(c)) if c == self.cue => other,
            _ => return,
        };
        let symbol = match other {
            ColliderKind::Cushion => CollisionSymbol::Cushion,
            ColliderKind::Ball(c) => CollisionSymbol::from(c),
        };

        if symbol == CollisionSymbol::Cushion
            && self.last_symbol == Some(CollisionSymbol::Cushion)
            && frame.saturating_sub(self.last_frame) < DEBOUNCE_FRAMES
        {
            // Same physical graze; keep extending the window without emitting.
            self.last_frame = frame;
            return;
        }

        self.events.push(CollisionEvent { frame, symbol });
        self.last_symbol = Some(symbol);
        self.last_frame = frame;
    }

    pub fn events(&self) -> &[CollisionEvent] {
        &self.events
    }

    pub fn symbols(&self) -> Vec<CollisionSymbol> {
        self.events.iter().map(|e| e.symbol).collect()
    }

    pub fn into_events(self) -> Vec<CollisionEvent> {
        self.events
    }
}
