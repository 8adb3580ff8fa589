use parkour::{MovementConfig, SessionConfig};

use crate::scenario::Scenario;

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub scenario: Scenario,
    pub ticks: u64,
    /// Ticks of scripted input before the character goes idle.
    pub active_ticks: u64,
    pub frame_rate: u32,
    pub movement: MovementConfig,
    pub session: SessionConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            scenario: Scenario::Parkour,
            ticks: 600,
            active_ticks: 300,
            frame_rate: 144,
            movement: MovementConfig::default(),
            session: SessionConfig::default(),
        }
    }
}
