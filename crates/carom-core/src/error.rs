use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::table::BallColor;

/// Errors surfaced by the engine's fallible entry points.
///
/// "No legal shot found" is deliberately *not* an error: the search returns
/// `None` for that outcome and callers must handle it explicitly.
#[derive(Debug)]
pub enum EngineError {
    /// Ball-position input could not be read.
    Io { path: PathBuf, source: io::Error },
    /// A required ball color was absent from the input layout.
    MissingBall(BallColor),
    /// Fewer than the three required balls were detected.
    TooFewBalls(usize),
    /// Configuration failed validation.
    InvalidConfig(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            },
            Self::MissingBall(color) => write!(f, "no {color} ball in input layout"),
            Self::TooFewBalls(found) => {
                write!(f, "need 3 detected balls, found {found}")
            },
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
