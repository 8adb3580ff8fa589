use glam::Vec3;
use rkyv::{Archive, Deserialize, Serialize};

use crate::collision::SurfaceId;
use crate::movement::{
    AirStrafeWindow, ClimbKind, ClimbState, ClimbTarget, CustomMode, FallingState, Locomotion,
    MovementMode, MovementState, PlayerInput, SlideState, WallClimbState, WallRunState,
};

use super::CompressedFlags;

/// Climb targets travel as whole centimeters.
const TARGET_SCALE: f32 = 100.0;

pub fn quantize_target(location: Vec3) -> [i32; 3] {
    [
        (location.x * TARGET_SCALE).round() as i32,
        (location.y * TARGET_SCALE).round() as i32,
        (location.z * TARGET_SCALE).round() as i32,
    ]
}

pub fn dequantize_target(encoded: [i32; 3]) -> Vec3 {
    Vec3::new(
        encoded[0] as f32 / TARGET_SCALE,
        encoded[1] as f32 / TARGET_SCALE,
        encoded[2] as f32 / TARGET_SCALE,
    )
}

/// One saved move as it crosses the wire to the server.
#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct NetworkMoveData {
    pub timestamp: f32,
    pub delta_time: f32,
    pub input_vector: [i8; 2],
    pub view_yaw: i16,
    pub compressed_flags: u8,
    pub ledge_target: Option<[i32; 3]>,
    pub mantle_target: Option<[i32; 3]>,
    pub client_location: [f32; 3],
    pub client_mode: u8,
}

impl NetworkMoveData {
    pub fn flags(&self) -> CompressedFlags {
        CompressedFlags::from_bits_retain(self.compressed_flags)
    }

    pub fn player_input(&self) -> PlayerInput {
        PlayerInput {
            move_input: PlayerInput::decode_move_input(self.input_vector),
            view_yaw: PlayerInput::decode_view_yaw(self.view_yaw),
            intents: self.flags().to_intents(),
        }
    }

    pub fn client_location(&self) -> Vec3 {
        Vec3::from_array(self.client_location)
    }

    pub fn client_mode(&self) -> Option<MovementMode> {
        MovementMode::from_byte(self.client_mode)
    }

    /// The climb the client was in when the move ended, if any.
    pub fn climb_target(&self) -> Option<(CustomMode, Vec3)> {
        if let Some(ledge) = self.ledge_target {
            return Some((CustomMode::LedgeClimbing, dequantize_target(ledge)));
        }
        self.mantle_target
            .map(|mantle| (CustomMode::Mantling, dequantize_target(mantle)))
    }
}

/// Per-mode state of a correction, enough to resume the mode exactly where
/// the server left it.
#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum ModeData {
    Walking,
    Falling {
        jump_force_time_remaining: f32,
        /// 0 none, 1 sway, 2 lurch.
        window: u8,
        window_start: f32,
        locked_direction: [f32; 3],
    },
    Slide {
        start_time: f32,
    },
    WallClimbing {
        wall_normal: [f32; 3],
        wall: Option<u32>,
        start_time: f32,
    },
    WallRunning {
        wall_normal: [f32; 3],
        wall: Option<u32>,
        start_time: f32,
        side: f32,
        speed: f32,
    },
    Climb {
        location: [f32; 3],
        ledge_point: [f32; 3],
        wall_normal: [f32; 3],
        height: f32,
        kind: u8,
        start: [f32; 3],
        waypoint: u8,
        speed: f32,
        traveled: f32,
    },
}

impl ModeData {
    pub fn capture(locomotion: &Locomotion) -> Self {
        match *locomotion {
            Locomotion::Walking => Self::Walking,
            Locomotion::Falling(falling) => {
                let (window, window_start, locked_direction) = match falling.window {
                    AirStrafeWindow::None => (0, 0.0, Vec3::ZERO),
                    AirStrafeWindow::Sway { start } => (1, start, Vec3::ZERO),
                    AirStrafeWindow::Lurch {
                        start,
                        locked_direction,
                    } => (2, start, locked_direction),
                };
                Self::Falling {
                    jump_force_time_remaining: falling.jump_force_time_remaining,
                    window,
                    window_start,
                    locked_direction: locked_direction.to_array(),
                }
            }
            Locomotion::Slide(slide) => Self::Slide {
                start_time: slide.start_time,
            },
            Locomotion::WallClimbing(climb) => Self::WallClimbing {
                wall_normal: climb.wall_normal.to_array(),
                wall: climb.wall.map(|id| id.0),
                start_time: climb.start_time,
            },
            Locomotion::WallRunning(run) => Self::WallRunning {
                wall_normal: run.wall_normal.to_array(),
                wall: run.wall.map(|id| id.0),
                start_time: run.start_time,
                side: run.side,
                speed: run.speed,
            },
            Locomotion::Mantling(climb) | Locomotion::LedgeClimbing(climb) => Self::Climb {
                location: climb.target.location.to_array(),
                ledge_point: climb.target.ledge_point.to_array(),
                wall_normal: climb.target.wall_normal.to_array(),
                height: climb.target.height,
                kind: climb_kind_to_byte(climb.target.kind),
                start: climb.start.to_array(),
                waypoint: climb.waypoint as u8,
                speed: climb.speed,
                traveled: climb.traveled,
            },
        }
    }

    /// Rebuilds the locomotion for `mode`. `None` when the data belongs to a
    /// different mode or carries an unknown tag.
    pub fn locomotion(&self, mode: MovementMode) -> Option<Locomotion> {
        let locomotion = match (mode, *self) {
            (MovementMode::Walking, Self::Walking) => Locomotion::Walking,
            (
                MovementMode::Falling,
                Self::Falling {
                    jump_force_time_remaining,
                    window,
                    window_start,
                    locked_direction,
                },
            ) => {
                let window = match window {
                    0 => AirStrafeWindow::None,
                    1 => AirStrafeWindow::Sway {
                        start: window_start,
                    },
                    2 => AirStrafeWindow::Lurch {
                        start: window_start,
                        locked_direction: Vec3::from_array(locked_direction),
                    },
                    _ => return None,
                };
                Locomotion::Falling(FallingState {
                    jump_force_time_remaining,
                    window,
                })
            }
            (MovementMode::Custom(CustomMode::Slide), Self::Slide { start_time }) => {
                Locomotion::Slide(SlideState { start_time })
            }
            (
                MovementMode::Custom(CustomMode::WallClimbing),
                Self::WallClimbing {
                    wall_normal,
                    wall,
                    start_time,
                },
            ) => Locomotion::WallClimbing(WallClimbState {
                wall_normal: Vec3::from_array(wall_normal),
                wall: wall.map(SurfaceId),
                start_time,
            }),
            (
                MovementMode::Custom(CustomMode::WallRunning),
                Self::WallRunning {
                    wall_normal,
                    wall,
                    start_time,
                    side,
                    speed,
                },
            ) => Locomotion::WallRunning(WallRunState {
                wall_normal: Vec3::from_array(wall_normal),
                wall: wall.map(SurfaceId),
                start_time,
                side,
                speed,
            }),
            (
                MovementMode::Custom(custom @ (CustomMode::Mantling | CustomMode::LedgeClimbing)),
                Self::Climb {
                    location,
                    ledge_point,
                    wall_normal,
                    height,
                    kind,
                    start,
                    waypoint,
                    speed,
                    traveled,
                },
            ) => {
                let target = ClimbTarget {
                    location: Vec3::from_array(location),
                    ledge_point: Vec3::from_array(ledge_point),
                    wall_normal: Vec3::from_array(wall_normal),
                    height,
                    kind: climb_kind_from_byte(kind)?,
                };
                let mut climb = ClimbState::new(Vec3::from_array(start), target, speed);
                if waypoint as usize > climb.waypoints.len() {
                    return None;
                }
                climb.waypoint = waypoint as usize;
                climb.traveled = traveled;
                if custom == CustomMode::Mantling {
                    Locomotion::Mantling(climb)
                } else {
                    Locomotion::LedgeClimbing(climb)
                }
            }
            _ => return None,
        };
        Some(locomotion)
    }
}

fn climb_kind_to_byte(kind: ClimbKind) -> u8 {
    match kind {
        ClimbKind::Fast => 0,
        ClimbKind::Normal => 1,
        ClimbKind::Slow => 2,
    }
}

fn climb_kind_from_byte(byte: u8) -> Option<ClimbKind> {
    match byte {
        0 => Some(ClimbKind::Fast),
        1 => Some(ClimbKind::Normal),
        2 => Some(ClimbKind::Slow),
        _ => None,
    }
}

/// Authoritative end state of one move, sent when the client's prediction
/// drifted.
#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct MoveCorrection {
    pub timestamp: f32,
    pub location: [f32; 3],
    pub velocity: [f32; 3],
    pub mode: u8,
    pub crouched: bool,
    pub mode_data: ModeData,
}

impl MoveCorrection {
    pub fn capture(timestamp: f32, state: &MovementState) -> Self {
        Self {
            timestamp,
            location: state.position.to_array(),
            velocity: state.velocity.to_array(),
            mode: state.mode().to_byte(),
            crouched: state.crouched,
            mode_data: ModeData::capture(&state.locomotion),
        }
    }

    pub fn location(&self) -> Vec3 {
        Vec3::from_array(self.location)
    }

    pub fn velocity(&self) -> Vec3 {
        Vec3::from_array(self.velocity)
    }

    pub fn mode(&self) -> Option<MovementMode> {
        MovementMode::from_byte(self.mode)
    }

    /// Rebuilds the mode data the correction describes. `None` when the mode
    /// byte is unknown or disagrees with the mode data.
    pub fn locomotion(&self) -> Option<Locomotion> {
        self.mode_data.locomotion(self.mode()?)
    }
}
