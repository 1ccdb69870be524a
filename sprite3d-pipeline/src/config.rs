//! Pipeline configuration

use sprite3d_backend::DEFAULT_GAME_SPEED;

/// Host interface versions and start-up defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Oldest engine interface the plugin runs on
    pub min_interface_version: i32,
    /// First interface that reports per-stage world/view/projection
    pub matrices_interface_version: i32,
    /// Loops per second until the game calls `SetLoopsPerSecond`
    pub default_game_speed: i32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_interface_version: 23,
            matrices_interface_version: 25,
            default_game_speed: DEFAULT_GAME_SPEED,
        }
    }
}
