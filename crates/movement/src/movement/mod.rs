mod component;
mod config;
mod curve;
mod input;
mod mode;
mod observer;
mod phys;
mod predicates;
mod state;
mod transitions;
mod velocity;

pub use component::MovementComponent;
pub use config::{
    AirStrafeConfig, MantleConfig, MovementConfig, SlideConfig, WALL_MAX_NORMAL_Y, WallClimbConfig,
    WallJumpConfig, WallRunConfig,
};
pub use curve::SpeedCurve;
pub use input::{InputIntents, PlayerInput};
pub use mode::{
    AirStrafeWindow, ClimbKind, ClimbState, ClimbTarget, CustomMode, FallingState, Locomotion,
    MovementMode, SlideState, WallClimbState, WallRunState,
};
pub use observer::{ModeEvent, ModeHistory, ModeObserver};
pub use state::{
    Capsule, FloorResult, ModeTimers, MovementState, StatusTags, SurfaceContact, SurfaceMemory,
};
pub use velocity::{VelocityStrategy, apply_velocity_braking, compose_velocity, lurch_strength};

pub const MIN_TICK_TIME: f32 = 1.0e-6;
/// Floor distances the walking stepper keeps the hull hovering between.
pub const MIN_FLOOR_DIST: f32 = 0.019;
pub const MAX_FLOOR_DIST: f32 = 0.024;
