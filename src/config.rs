use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::constants::{
    CELL_SIZE, CHASE_DURATION_MS, DOT_SCORE, HUNTER_SCARED_SPEED, HUNTER_SCORE, HUNTER_SPEED,
    MAX_FRAME_MS, MAX_SUBSTEPS_PER_TICK, MODE_WARNING_MS, MOTION_STEP_MS, PLAYER_SPEED,
    POWER_DURATION_MS, POWER_PELLET_SCORE, SCATTER_DURATION_MS, SIGNAL_DURATION_MS,
    SIREN_RESUME_DELAY_MS,
};
use crate::error::ConfigError;

/// Gameplay tunables. Every field falls back to the compiled-in default when
/// omitted from a config file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimConfig {
    pub player_speed: f32,
    pub hunter_speed: f32,
    pub hunter_scared_speed: f32,
    pub dot_score: u32,
    pub power_pellet_score: u32,
    pub hunter_score: u32,
    pub power_duration_ms: u64,
    pub siren_resume_delay_ms: u64,
    pub scatter_duration_ms: u64,
    pub chase_duration_ms: u64,
    pub mode_warning_ms: u64,
    pub signal_duration_ms: u64,
    pub max_frame_ms: u64,
    pub motion_step_ms: u64,
    pub max_substeps_per_tick: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            player_speed: PLAYER_SPEED,
            hunter_speed: HUNTER_SPEED,
            hunter_scared_speed: HUNTER_SCARED_SPEED,
            dot_score: DOT_SCORE,
            power_pellet_score: POWER_PELLET_SCORE,
            hunter_score: HUNTER_SCORE,
            power_duration_ms: POWER_DURATION_MS,
            siren_resume_delay_ms: SIREN_RESUME_DELAY_MS,
            scatter_duration_ms: SCATTER_DURATION_MS,
            chase_duration_ms: CHASE_DURATION_MS,
            mode_warning_ms: MODE_WARNING_MS,
            signal_duration_ms: SIGNAL_DURATION_MS,
            max_frame_ms: MAX_FRAME_MS,
            motion_step_ms: MOTION_STEP_MS,
            max_substeps_per_tick: MAX_SUBSTEPS_PER_TICK,
        }
    }
}

impl SimConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: SimConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, speed) in [
            ("playerSpeed", self.player_speed),
            ("hunterSpeed", self.hunter_speed),
            ("hunterScaredSpeed", self.hunter_scared_speed),
        ] {
            if !speed.is_finite() || speed <= 0.0 {
                return Err(ConfigError::Invalid(format!("{name} must be positive")));
            }
            // Agents only re-center on cells when the step length tiles a cell exactly.
            let steps = CELL_SIZE / speed;
            if (steps - steps.round()).abs() > f32::EPSILON {
                return Err(ConfigError::Invalid(format!(
                    "{name} must divide the cell size {CELL_SIZE}"
                )));
            }
        }
        if self.motion_step_ms == 0 {
            return Err(ConfigError::Invalid("motionStepMs must be non-zero".to_string()));
        }
        if self.max_frame_ms == 0 {
            return Err(ConfigError::Invalid("maxFrameMs must be non-zero".to_string()));
        }
        if self.max_substeps_per_tick == 0 {
            return Err(ConfigError::Invalid(
                "maxSubstepsPerTick must be non-zero".to_string(),
            ));
        }
        if self.scatter_duration_ms == 0 || self.chase_duration_ms == 0 {
            return Err(ConfigError::Invalid("mode durations must be non-zero".to_string()));
        }
        if self.mode_warning_ms > self.scatter_duration_ms.min(self.chase_duration_ms) {
            return Err(ConfigError::Invalid(
                "modeWarningMs must not exceed the shortest mode".to_string(),
            ));
        }
        Ok(())
    }
}

/// Installs the stderr subscriber used by the binaries. `RUST_LOG` overrides
/// the `info` default.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
