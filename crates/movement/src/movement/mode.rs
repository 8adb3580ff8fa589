use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::collision::SurfaceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomMode {
    Slide,
    WallClimbing,
    Mantling,
    LedgeClimbing,
    WallRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementMode {
    Walking,
    Falling,
    Custom(CustomMode),
}

impl MovementMode {
    pub const SLIDE: Self = Self::Custom(CustomMode::Slide);
    pub const WALL_CLIMBING: Self = Self::Custom(CustomMode::WallClimbing);
    pub const MANTLING: Self = Self::Custom(CustomMode::Mantling);
    pub const LEDGE_CLIMBING: Self = Self::Custom(CustomMode::LedgeClimbing);
    pub const WALL_RUNNING: Self = Self::Custom(CustomMode::WallRunning);

    pub fn custom(self) -> Option<CustomMode> {
        match self {
            Self::Custom(custom) => Some(custom),
            _ => None,
        }
    }

    pub fn is_grounded(self) -> bool {
        matches!(self, Self::Walking | Self::SLIDE)
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Self::Walking => 0,
            Self::Falling => 1,
            Self::Custom(CustomMode::Slide) => 2,
            Self::Custom(CustomMode::WallClimbing) => 3,
            Self::Custom(CustomMode::Mantling) => 4,
            Self::Custom(CustomMode::LedgeClimbing) => 5,
            Self::Custom(CustomMode::WallRunning) => 6,
        }
    }

    pub fn from_byte(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Walking),
            1 => Some(Self::Falling),
            2 => Some(Self::SLIDE),
            3 => Some(Self::WALL_CLIMBING),
            4 => Some(Self::MANTLING),
            5 => Some(Self::LEDGE_CLIMBING),
            6 => Some(Self::WALL_RUNNING),
            _ => None,
        }
    }
}

/// Air-control window granted after a wall jump (sway) or a mantle jump
/// (lurch).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AirStrafeWindow {
    #[default]
    None,
    Sway {
        start: f32,
    },
    Lurch {
        start: f32,
        locked_direction: Vec3,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FallingState {
    pub jump_force_time_remaining: f32,
    pub window: AirStrafeWindow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlideState {
    pub start_time: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallClimbState {
    pub wall_normal: Vec3,
    pub wall: Option<SurfaceId>,
    pub start_time: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallRunState {
    pub wall_normal: Vec3,
    pub wall: Option<SurfaceId>,
    pub start_time: f32,
    /// +1 when the wall is on the right, -1 when it is on the left.
    pub side: f32,
    pub speed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClimbKind {
    Fast,
    Normal,
    Slow,
}

/// Where a mantle or ledge climb ends and how it gets there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimbTarget {
    /// Hull center standing on the ledge.
    pub location: Vec3,
    /// Point on the ledge surface the climb grabs.
    pub ledge_point: Vec3,
    pub wall_normal: Vec3,
    /// Ledge height above the feet when the search ran.
    pub height: f32,
    pub kind: ClimbKind,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimbState {
    pub target: ClimbTarget,
    pub start: Vec3,
    /// Rise in front of the wall, then move onto the ledge.
    pub waypoints: [Vec3; 2],
    pub waypoint: usize,
    pub speed: f32,
    pub total_distance: f32,
    pub traveled: f32,
}

impl ClimbState {
    pub fn new(start: Vec3, target: ClimbTarget, speed: f32) -> Self {
        let rise = Vec3::new(start.x, target.location.y, start.z);
        let waypoints = [rise, target.location];
        let total_distance = (rise - start).length() + (target.location - rise).length();
        Self {
            target,
            start,
            waypoints,
            waypoint: 0,
            speed,
            total_distance,
            traveled: 0.0,
        }
    }

    pub fn progress(&self) -> f32 {
        if self.total_distance <= f32::EPSILON {
            1.0
        } else {
            (self.traveled / self.total_distance).clamp(0.0, 1.0)
        }
    }
}

/// Active locomotion mode together with the state only that mode uses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Locomotion {
    Walking,
    Falling(FallingState),
    Slide(SlideState),
    WallClimbing(WallClimbState),
    Mantling(ClimbState),
    LedgeClimbing(ClimbState),
    WallRunning(WallRunState),
}

impl Default for Locomotion {
    fn default() -> Self {
        Self::Walking
    }
}

impl Locomotion {
    pub fn falling() -> Self {
        Self::Falling(FallingState::default())
    }

    pub fn mode(&self) -> MovementMode {
        match self {
            Self::Walking => MovementMode::Walking,
            Self::Falling(_) => MovementMode::Falling,
            Self::Slide(_) => MovementMode::SLIDE,
            Self::WallClimbing(_) => MovementMode::WALL_CLIMBING,
            Self::Mantling(_) => MovementMode::MANTLING,
            Self::LedgeClimbing(_) => MovementMode::LEDGE_CLIMBING,
            Self::WallRunning(_) => MovementMode::WALL_RUNNING,
        }
    }

    pub fn climb(&self) -> Option<&ClimbState> {
        match self {
            Self::Mantling(climb) | Self::LedgeClimbing(climb) => Some(climb),
            _ => None,
        }
    }

    pub fn wall_normal(&self) -> Option<Vec3> {
        match self {
            Self::WallClimbing(climb) => Some(climb.wall_normal),
            Self::WallRunning(run) => Some(run.wall_normal),
            Self::Mantling(climb) | Self::LedgeClimbing(climb) => Some(climb.target.wall_normal),
            _ => None,
        }
    }
}
