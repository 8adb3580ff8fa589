use glam::Vec3;

use crate::movement::MovementMode;
use crate::net::PacketError;

#[derive(Debug, thiserror::Error)]
pub enum MovementError {
    #[error("no capsule attached to the movement component")]
    MissingCapsule,
    #[error("non-finite movement state in {mode:?} (position {position}, velocity {velocity})")]
    NonFiniteState {
        mode: MovementMode,
        position: Vec3,
        velocity: Vec3,
    },
    #[error("cannot stand up at {position}: standing capsule is encroached")]
    Encroached { position: Vec3 },
    #[error("invalid delta time {0}")]
    InvalidDeltaTime(f32),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("{field} must lie in [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
    #[error("{0}")]
    Inconsistent(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Movement(#[from] MovementError),
    #[error(transparent)]
    Packet(#[from] PacketError),
}
