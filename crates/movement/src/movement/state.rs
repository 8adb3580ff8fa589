use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::collision::{Hull, SurfaceId};

use super::{Locomotion, MovementConfig, MovementMode};

/// Collision capsule attached to the character, standing dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Capsule {
    pub radius: f32,
    pub half_height: f32,
}

impl Capsule {
    pub fn new(radius: f32, half_height: f32) -> Self {
        Self {
            radius,
            half_height,
        }
    }

    pub fn hull(&self) -> Hull {
        Hull::capsule(self.radius, self.half_height)
    }
}

bitflags::bitflags! {
    /// Gameplay state that gates movement, mirrored from the ability layer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct StatusTags: u8 {
        const ATTACKING = 1 << 0;
        const STUNNED   = 1 << 1;
        const ROOTED    = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeTimers {
    pub prev_slide_time: f32,
    pub last_jump_time: f32,
    pub last_wall_jump_time: f32,
    pub last_mantle_time: f32,
    pub wall_climb_time_used: f32,
    pub wall_jump_count: u32,
    pub time_on_ground: f32,
}

impl Default for ModeTimers {
    fn default() -> Self {
        Self {
            prev_slide_time: f32::NEG_INFINITY,
            last_jump_time: f32::NEG_INFINITY,
            last_wall_jump_time: f32::NEG_INFINITY,
            last_mantle_time: f32::NEG_INFINITY,
            wall_climb_time_used: 0.0,
            wall_jump_count: 0,
            time_on_ground: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceContact {
    pub location: Vec3,
    pub normal: Vec3,
    pub wall: Option<SurfaceId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfaceMemory {
    pub last_wall_jump: Option<SurfaceContact>,
    pub last_wall_run: Option<SurfaceContact>,
    pub last_ledge_climb: Option<SurfaceContact>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloorResult {
    pub normal: Vec3,
    /// Gap between the bottom of the hull and the floor.
    pub distance: f32,
    pub surface: Option<SurfaceId>,
}

/// Everything a move reads or writes. Cloning yields a full snapshot that a
/// saved move can rewind to.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementState {
    pub position: Vec3,
    pub velocity: Vec3,
    pub acceleration: Vec3,
    pub locomotion: Locomotion,
    pub timers: ModeTimers,
    pub surfaces: SurfaceMemory,
    pub floor: Option<FloorResult>,
    pub crouched: bool,
    pub facing_yaw: f32,
    pub time: f32,
    pub rotation_locked: bool,
    pub collision_enabled: bool,
    pub fall_origin: Option<Vec3>,
    pub jump_latched: bool,
    pub wall_jump_latched: bool,
    /// Walk speed before crouch, sprint and aim modifiers. Gameplay code may
    /// change it between moves, so it rewinds with the rest of the state.
    pub max_walk_speed: f32,
    pub status: StatusTags,
}

impl Default for MovementState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            locomotion: Locomotion::Walking,
            timers: ModeTimers::default(),
            surfaces: SurfaceMemory::default(),
            floor: None,
            crouched: false,
            facing_yaw: 0.0,
            time: 0.0,
            rotation_locked: false,
            collision_enabled: true,
            fall_origin: None,
            jump_latched: false,
            wall_jump_latched: false,
            max_walk_speed: MovementConfig::default().max_walk_speed,
            status: StatusTags::empty(),
        }
    }
}

impl MovementState {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn mode(&self) -> MovementMode {
        self.locomotion.mode()
    }

    pub fn horizontal_speed(&self) -> f32 {
        Vec3::new(self.velocity.x, 0.0, self.velocity.z).length()
    }
}
