use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

use super::SpeedCurve;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementConfig {
    pub capsule_radius: f32,
    pub capsule_half_height: f32,
    pub crouched_half_height: f32,

    pub max_walk_speed: f32,
    pub max_walk_speed_crouched: f32,
    pub sprint_speed_multiplier: f32,
    pub aim_speed_multiplier: f32,

    pub max_acceleration: f32,
    pub braking_deceleration_walking: f32,
    pub braking_deceleration_falling: f32,
    pub ground_friction: f32,
    pub braking_friction_factor: f32,

    pub gravity: f32,
    pub gravity_scale: f32,
    pub terminal_velocity: f32,

    pub jump_z_velocity: f32,
    pub jump_max_hold_time: f32,
    pub air_control: f32,

    pub walkable_floor_y: f32,
    pub max_step_height: f32,

    pub max_simulation_iterations: u32,
    pub max_simulation_time_step: f32,

    pub air_strafe: AirStrafeConfig,
    pub slide: SlideConfig,
    pub wall_climb: WallClimbConfig,
    pub wall_run: WallRunConfig,
    pub wall_jump: WallJumpConfig,
    pub mantle: MantleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirStrafeConfig {
    pub speed_cap: f32,
    pub rotation_rate: f32,

    pub sway_duration: f32,
    pub sway_speed_multiplier: f32,
    pub sway_turn_rate: f32,

    pub lurch_duration: f32,
    pub lurch_full_strength_duration: f32,
    pub lurch_friction: f32,
    pub lurch_speed_penalty: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideConfig {
    pub enabled: bool,
    pub delay: f32,
    pub enter_min_speed: f32,
    pub exit_speed: f32,
    pub enter_boost: f32,
    pub max_boost_speed: f32,
    pub speed_cap: f32,
    pub friction: f32,
    pub braking_deceleration: f32,
    pub floor_angle_braking_scale: f32,
    pub gravity_scale: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallClimbConfig {
    pub enabled: bool,
    /// Total climb time per airborne stretch, `None` for unlimited.
    pub duration: Option<f32>,
    pub speed: f32,
    /// Horizontal drift and vertical scale applied to the climb vector.
    pub multiplier: Vec2,
    pub jump_interval: f32,
    pub mantle_interval: f32,
    pub acceptable_angle: f32,
    pub entry_angle: f32,
    pub ledge_input_angle: f32,
    pub wall_stick: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallRunConfig {
    pub enabled: bool,
    pub min_speed: f32,
    pub max_speed: f32,
    pub duration: f32,
    pub angle_radius: f32,
    pub acceptable_angle: f32,
    pub min_height_delta: f32,
    pub gravity_scale: f32,
    pub max_fall_speed: f32,
    pub wall_stick: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallJumpConfig {
    pub enabled: bool,
    pub max_jumps: u32,
    pub z_velocity: f32,
    pub min_horizontal_speed: f32,
    pub input_weight: f32,
    pub reach: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MantleConfig {
    pub enabled: bool,
    pub reach: f32,
    pub min_height: f32,
    pub max_height: f32,
    pub ledge_climb_max_height: f32,
    pub fast_max_height: f32,
    pub slow_min_height: f32,
    pub ledge_inset: f32,
    pub fast_speed: f32,
    pub normal_speed: f32,
    pub slow_speed: f32,
    pub ledge_climb_speed: f32,
    pub tolerance: f32,
    pub jump_z_velocity: f32,
    /// Time after a climb ends before another one can start.
    pub retrigger_delay: f32,
    pub curve: SpeedCurve,
}

/// Surfaces whose normal has a smaller vertical component count as walls.
pub const WALL_MAX_NORMAL_Y: f32 = 0.3;

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            capsule_radius: 0.34,
            capsule_half_height: 0.88,
            crouched_half_height: 0.6,

            max_walk_speed: 6.0,
            max_walk_speed_crouched: 3.0,
            sprint_speed_multiplier: 1.5,
            aim_speed_multiplier: 0.6,

            max_acceleration: 20.48,
            braking_deceleration_walking: 20.48,
            braking_deceleration_falling: 0.0,
            ground_friction: 8.0,
            braking_friction_factor: 2.0,

            gravity: 9.8,
            gravity_scale: 1.5,
            terminal_velocity: 40.0,

            jump_z_velocity: 5.2,
            jump_max_hold_time: 0.15,
            air_control: 0.8,

            walkable_floor_y: 0.71,
            max_step_height: 0.45,

            max_simulation_iterations: 8,
            max_simulation_time_step: 0.05,

            air_strafe: AirStrafeConfig::default(),
            slide: SlideConfig::default(),
            wall_climb: WallClimbConfig::default(),
            wall_run: WallRunConfig::default(),
            wall_jump: WallJumpConfig::default(),
            mantle: MantleConfig::default(),
        }
    }
}

impl Default for AirStrafeConfig {
    fn default() -> Self {
        Self {
            speed_cap: 0.8,
            rotation_rate: 3.0,

            sway_duration: 0.35,
            sway_speed_multiplier: 1.25,
            sway_turn_rate: 10.0,

            lurch_duration: 0.6,
            lurch_full_strength_duration: 0.15,
            lurch_friction: 6.0,
            lurch_speed_penalty: 0.15,
        }
    }
}

impl Default for SlideConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay: 0.75,
            enter_min_speed: 5.0,
            exit_speed: 2.0,
            enter_boost: 2.0,
            max_boost_speed: 12.0,
            speed_cap: 14.0,
            friction: 0.6,
            braking_deceleration: 4.0,
            floor_angle_braking_scale: 2.0,
            gravity_scale: 1.0,
        }
    }
}

impl Default for WallClimbConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            duration: Some(1.2),
            speed: 4.0,
            multiplier: Vec2::new(0.5, 1.0),
            jump_interval: 0.35,
            mantle_interval: 0.5,
            acceptable_angle: 45.0,
            entry_angle: 35.0,
            ledge_input_angle: 60.0,
            wall_stick: 2.0,
        }
    }
}

impl Default for WallRunConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_speed: 5.0,
            max_speed: 11.0,
            duration: 1.5,
            angle_radius: 35.0,
            acceptable_angle: 60.0,
            min_height_delta: 0.5,
            gravity_scale: 0.15,
            max_fall_speed: 2.0,
            wall_stick: 1.5,
        }
    }
}

impl Default for WallJumpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_jumps: 3,
            z_velocity: 5.5,
            min_horizontal_speed: 6.0,
            input_weight: 0.35,
            reach: 0.6,
        }
    }
}

impl Default for MantleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reach: 0.7,
            min_height: 0.5,
            max_height: 1.9,
            ledge_climb_max_height: 2.4,
            fast_max_height: 1.0,
            slow_min_height: 1.5,
            ledge_inset: 0.3,
            fast_speed: 6.0,
            normal_speed: 4.0,
            slow_speed: 2.5,
            ledge_climb_speed: 3.0,
            tolerance: 0.02,
            jump_z_velocity: 5.0,
            retrigger_delay: 0.4,
            curve: SpeedCurve::default(),
        }
    }
}

impl MovementConfig {
    pub fn gravity_magnitude(&self) -> f32 {
        self.gravity * self.gravity_scale
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("capsule_radius", self.capsule_radius),
            ("capsule_half_height", self.capsule_half_height),
            ("crouched_half_height", self.crouched_half_height),
            ("max_walk_speed", self.max_walk_speed),
            ("max_acceleration", self.max_acceleration),
            ("gravity", self.gravity),
            ("max_simulation_time_step", self.max_simulation_time_step),
            ("slide.delay", self.slide.delay),
            ("wall_climb.speed", self.wall_climb.speed),
            ("wall_run.duration", self.wall_run.duration),
            ("mantle.normal_speed", self.mantle.normal_speed),
            ("mantle.ledge_climb_speed", self.mantle.ledge_climb_speed),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        if !(0.0..=1.0).contains(&self.walkable_floor_y) {
            return Err(ConfigError::OutOfRange {
                field: "walkable_floor_y",
                value: self.walkable_floor_y,
                min: 0.0,
                max: 1.0,
            });
        }

        if self.crouched_half_height > self.capsule_half_height {
            return Err(ConfigError::Inconsistent(
                "crouched_half_height exceeds capsule_half_height",
            ));
        }

        if self.max_simulation_iterations == 0 {
            return Err(ConfigError::Inconsistent(
                "max_simulation_iterations must be at least 1",
            ));
        }

        let lurch = &self.air_strafe;
        if lurch.lurch_full_strength_duration > lurch.lurch_duration {
            return Err(ConfigError::Inconsistent(
                "lurch_full_strength_duration exceeds lurch_duration",
            ));
        }

        if self.mantle.min_height >= self.mantle.max_height {
            return Err(ConfigError::Inconsistent(
                "mantle.min_height must be below mantle.max_height",
            ));
        }

        if self.wall_run.min_speed > self.wall_run.max_speed {
            return Err(ConfigError::Inconsistent(
                "wall_run.min_speed exceeds wall_run.max_speed",
            ));
        }

        Ok(())
    }
}
