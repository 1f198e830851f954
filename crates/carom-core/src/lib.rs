//! Carom billiard shot engine.
//!
//! Given the top-view positions of three balls and a designated cue ball,
//! this crate simulates candidate shots (angle, power, spin offset) in a
//! minimal 2D impulse world, classifies each trial's collision sequence
//! against 3-cushion legality rules, scores it, and runs a coarse-then-fine
//! adaptive grid search for the best legal shot.
//!
//! - `table`: table geometry, ball identities, and label-file input
//! - `physics`: the per-trial impulse world (segments, circles, damping)
//! - `events`: cue-relative collision symbols with cushion debounce
//! - `scoring`: legality verdicts and the tunable score formula
//! - `simulator`: one bounded trial, trajectories included
//! - `search`: the two-phase adaptive grid search
//! - `config`: `carom.toml` loading with env overrides

pub mod config;
pub mod error;
pub mod events;
pub mod physics;
pub mod scoring;
pub mod search;
pub mod simulator;
pub mod table;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use std::collections::HashMap;

    use crate::table::{BallColor, BallLayout, Table, Vec2};

    /// An 800x400 table, the default rectified top-view size.
    pub fn standard_table() -> Table {
        Table::new(800.0, 400.0)
    }

    /// A well-spread layout with no two balls in line: cue-eligible balls on
    /// the left half, red on the right.
    pub fn spread_layout(cue: BallColor) -> BallLayout {
        layout_at(
            cue,
            [
                (BallColor::White, 200.0, 120.0),
                (BallColor::Yellow, 250.0, 300.0),
                (BallColor::Red, 600.0, 200.0),
            ],
        )
    }

    /// Build a layout from explicit positions on the standard table.
    pub fn layout_at(cue: BallColor, positions: [(BallColor, f32, f32); 3]) -> BallLayout {
        let map: HashMap<BallColor, Vec2> = positions
            .into_iter()
            .map(|(c, x, y)| (c, Vec2::new(x, y)))
            .collect();
        BallLayout::new(&map, cue, &standard_table()).expect("test layout must be valid")
    }
}
