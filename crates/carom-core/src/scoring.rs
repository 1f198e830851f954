use std::fmt;

use serde::{Deserialize, Serialize};

use crate::events::CollisionSymbol;
use crate::table::BallColor;

/// Tunable scoring constants.
///
/// These magnitudes are calibration material, not engine invariants: every
/// value is loadable from `carom.toml`, and nothing downstream assumes the
/// defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Base score when the very first symbol is an object ball.
    pub base_direct: i32,
    /// Base score when the sequence opens with a cushion.
    pub base_indirect: i32,
    /// Bonus for contacting an object ball first.
    pub direct_bonus: i32,
    /// Penalty for opening with a cushion.
    pub cushion_first_penalty: i32,
    /// Cost subtracted per recorded collision event.
    pub per_contact_cost: i32,
    /// Fixed score for a trial whose cue ball touched nothing.
    pub empty_log_score: i32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_direct: 150,
            base_indirect: 100,
            direct_bonus: 50,
            cushion_first_penalty: 30,
            per_contact_cost: 2,
            empty_log_score: 50,
        }
    }
}

/// Why a shot was judged legal or illegal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reason {
    Legal3Cushion,
    InsufficientCushions,
    NoObjectBall,
    OneObjectBall,
}

impl Reason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Legal3Cushion => "legal 3-cushion",
            Self::InsufficientCushions => "insufficient cushions before second object ball",
            Self::NoObjectBall => "no object ball contacted",
            Self::OneObjectBall => "only one object ball contacted",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Legality verdict for one collision symbol sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub legal: bool,
    pub reason: Reason,
}

impl Verdict {
    const fn legal() -> Self {
        Self {
            legal: true,
            reason: Reason::Legal3Cushion,
        }
    }

    const fn illegal(reason: Reason) -> Self {
        Self {
            legal: false,
            reason,
        }
    }
}

fn is_object(symbol: CollisionSymbol, cue: BallColor) -> bool {
    symbol != CollisionSymbol::Cushion && symbol != CollisionSymbol::from(cue)
}

/// 3-cushion legality: scanning left to right, the shot is legal iff the
/// running cushion count has reached 3 at the moment the second *distinct*
/// object-ball symbol first appears. Anything after that moment is
/// irrelevant; falling short at that moment is immediately illegal.
pub fn evaluate_legality(symbols: &[CollisionSymbol], cue: BallColor) -> Verdict {
    let mut cushions = 0u32;
    let mut first_object: Option<CollisionSymbol> = None;

    for &symbol in symbols {
        if symbol == CollisionSymbol::Cushion {
            cushions += 1;
        } else if is_object(symbol, cue) {
            match first_object {
                None => first_object = Some(symbol),
                Some(first) if first != symbol => {
                    return if cushions >= 3 {
                        Verdict::legal()
                    } else {
                        Verdict::illegal(Reason::InsufficientCushions)
                    };
                },
                Some(_) => {},
            }
        }
    }

    match first_object {
        None => Verdict::illegal(Reason::NoObjectBall),
        Some(_) => Verdict::illegal(Reason::OneObjectBall),
    }
}

/// Numeric shot quality: tiered base by the first symbol, direct bonus or
/// cushion-first penalty, minus a per-event cost that penalizes chaotic
/// many-contact shots. An empty sequence gets the fixed fallback.
pub fn score(symbols: &[CollisionSymbol], config: &ScoringConfig) -> i32 {
    let Some(&first) = symbols.first() else {
        return config.empty_log_score;
    };

    let direct = first != CollisionSymbol::Cushion;
    let mut total = if direct {
        config.base_direct + config.direct_bonus
    } else {
        config.base_indirect - config.cushion_first_penalty
    };
    total -= config.per_contact_cost * symbols.len() as i32;
    total
}
