use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetConfig {
    /// Merge consecutive identical moves before sending them.
    pub combine_moves: bool,
    pub max_combined_delta: f32,
    /// Unacknowledged moves kept for replay.
    pub max_saved_moves: usize,
    /// Client location drift the server accepts without a correction.
    pub max_position_error: f32,
    /// Largest delta time the server simulates for one move.
    pub max_move_delta: f32,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            combine_moves: true,
            max_combined_delta: 0.05,
            max_saved_moves: 96,
            max_position_error: 0.02,
            max_move_delta: 0.125,
        }
    }
}

impl NetConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("max_combined_delta", self.max_combined_delta),
            ("max_position_error", self.max_position_error),
            ("max_move_delta", self.max_move_delta),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        if self.max_saved_moves == 0 {
            return Err(ConfigError::Inconsistent(
                "max_saved_moves must hold at least one move",
            ));
        }
        if self.max_combined_delta > self.max_move_delta {
            return Err(ConfigError::Inconsistent(
                "max_combined_delta exceeds max_move_delta",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        NetConfig::default().validate().expect("default net config");
    }

    #[test]
    fn combined_delta_must_fit_a_server_move() {
        let config = NetConfig {
            max_combined_delta: 0.2,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Inconsistent(_))
        ));
    }
}
