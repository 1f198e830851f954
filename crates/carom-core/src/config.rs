use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::physics::PhysicsConfig;
use crate::scoring::ScoringConfig;
use crate::search::SearchConfig;
use crate::table::{BALL_RADIUS, BallColor, Table};

/// Table dimensions in the same pixel units as detected ball positions.
///
/// Defaults match the rectified top-view image the upstream detector emits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TableConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 400.0,
        }
    }
}

/// Output shaping for downstream consumers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Keep every Nth trajectory sample in the emitted JSON.
    pub trajectory_stride: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            trajectory_stride: 5,
        }
    }
}

/// Top-level engine configuration, loaded from `carom.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Which ball the player strikes; white or yellow.
    pub cue: BallColor,
    pub table: TableConfig,
    pub physics: PhysicsConfig,
    pub scoring: ScoringConfig,
    pub search: SearchConfig,
    pub output: OutputConfig,
}

impl EngineConfig {
    pub fn table(&self) -> Table {
        Table::new(self.table.width, self.table.height)
    }

    /// Load config from `carom.toml` if it exists, then apply env var
    /// overrides.
    pub fn load() -> Self {
        let mut config = match std::fs::read_to_string("carom.toml") {
            Ok(content) => match toml::from_str::<EngineConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!("Loaded configuration from carom.toml");
                    cfg
                },
                Err(e) => {
                    tracing::warn!("Failed to parse carom.toml: {e}, using defaults");
                    EngineConfig::default()
                },
            },
            Err(_) => {
                tracing::info!("No carom.toml found, using defaults");
                EngineConfig::default()
            },
        };

        if let Ok(cue) = std::env::var("CAROM_CUE")
            && let Some(color) = BallColor::parse(&cue)
        {
            config.cue = color;
        }
        if let Ok(val) = std::env::var("CAROM_TABLE_WIDTH")
            && let Ok(n) = val.parse::<f32>()
        {
            config.table.width = n;
        }
        if let Ok(val) = std::env::var("CAROM_TABLE_HEIGHT")
            && let Ok(n) = val.parse::<f32>()
        {
            config.table.height = n;
        }
        if let Ok(val) = std::env::var("CAROM_MAX_STEPS")
            && let Ok(n) = val.parse::<u32>()
        {
            config.physics.max_steps = n;
        }
        if let Ok(val) = std::env::var("CAROM_COARSE_ANGLE_STEP")
            && let Ok(n) = val.parse::<u32>()
        {
            config.search.coarse_angle_step = n;
        }
        if let Ok(val) = std::env::var("CAROM_TRAJECTORY_STRIDE")
            && let Ok(n) = val.parse::<usize>()
        {
            config.output.trajectory_stride = n;
        }

        config
    }

    /// Validate configuration; the CLI exits on error, library callers get
    /// a plain `EngineError`.
    pub fn validate(&self) -> Result<(), EngineError> {
        let invalid = |msg: &str| Err(EngineError::InvalidConfig(msg.to_string()));

        if self.cue == BallColor::Red {
            return invalid("cue must be white or yellow");
        }
        if self.table.width <= 4.0 * BALL_RADIUS || self.table.height <= 4.0 * BALL_RADIUS {
            return invalid("table must be larger than a few ball diameters");
        }
        if !(self.physics.damping > 0.0 && self.physics.damping <= 1.0) {
            return invalid("physics.damping must be in (0, 1]");
        }
        if !(0.0..=1.0).contains(&self.physics.restitution) {
            return invalid("physics.restitution must be in [0, 1]");
        }
        if !(0.0..1.0).contains(&self.physics.friction) {
            return invalid("physics.friction must be in [0, 1)");
        }
        if self.physics.max_speed <= 0.0 {
            return invalid("physics.max_speed must be positive");
        }
        if self.physics.settle_threshold < 0.0 {
            return invalid("physics.settle_threshold must not be negative");
        }
        if self.physics.max_steps == 0 {
            return invalid("physics.max_steps must be > 0");
        }
        if self.search.coarse_angle_step == 0 || self.search.coarse_angle_step >= 360 {
            return invalid("search.coarse_angle_step must be in [1, 359]");
        }
        if self.search.fine_angle_step == 0 {
            return invalid("search.fine_angle_step must be > 0");
        }
        if self.search.power_min < 1
            || self.search.power_max > 10
            || self.search.power_min > self.search.power_max
        {
            return invalid("search power range must satisfy 1 <= min <= max <= 10");
        }
        if self.search.fine_offset_radius < 0 {
            return invalid("search.fine_offset_radius must not be negative");
        }
        if self.output.trajectory_stride == 0 {
            return invalid("output.trajectory_stride must be >= 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = EngineConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.cue, BallColor::White);
        assert_eq!(cfg.physics.max_steps, 1200);
        assert_eq!(cfg.search.coarse_angle_step, 5);
    }

    #[test]
    fn parse_partial_toml() {
        let toml_str = r#"
cue = "yellow"

[table]
width = 1024.0
height = 512.0

[scoring]
base_direct = 100
direct_bonus = 80
"#;
        let cfg: EngineConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.cue, BallColor::Yellow);
        assert_eq!(cfg.table.width, 1024.0);
        assert_eq!(cfg.scoring.base_direct, 100);
        assert_eq!(cfg.scoring.direct_bonus, 80);
        // Untouched sections keep their defaults.
        assert_eq!(cfg.scoring.per_contact_cost, 2);
        assert_eq!(cfg.search.fine_angle_window, 30);
    }

    #[test]
    fn validate_rejects_red_cue() {
        let cfg = EngineConfig {
            cue: BallColor::Red,
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_angle_step() {
        let mut cfg = EngineConfig::default();
        cfg.search.coarse_angle_step = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_power_range() {
        let mut cfg = EngineConfig::default();
        cfg.search.power_min = 8;
        cfg.search.power_max = 3;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_damping() {
        let mut cfg = EngineConfig::default();
        cfg.physics.damping = 0.0;
        assert!(cfg.validate().is_err());
        cfg.physics.damping = 1.5;
        assert!(cfg.validate().is_err());
    }
}
