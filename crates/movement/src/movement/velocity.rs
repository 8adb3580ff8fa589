use glam::Vec3;

use crate::math::{KINDA_SMALL, horizontal};

use super::{MIN_TICK_TIME, MovementConfig};

const BRAKING_SUB_STEP: f32 = 1.0 / 33.0;
const BRAKING_STOP_SPEED: f32 = 0.01;

/// Velocity blend picked for the current tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VelocityStrategy {
    Ground,
    Slide { floor_normal: Vec3 },
    Sway,
    Lurch { elapsed: f32, locked_direction: Vec3 },
    AirStrafe,
}

/// Weight of the lurch blend `elapsed` seconds after a mantle jump.
pub fn lurch_strength(elapsed: f32, full_strength_duration: f32, duration: f32) -> f32 {
    if elapsed <= full_strength_duration {
        return 1.0;
    }
    if elapsed >= duration {
        return 0.0;
    }
    1.0 - (elapsed - full_strength_duration) / (duration - full_strength_duration)
}

/// Blends input acceleration into the horizontal velocity. The vertical
/// component passes through untouched; gravity belongs to the steppers.
pub fn compose_velocity(
    config: &MovementConfig,
    strategy: VelocityStrategy,
    velocity: Vec3,
    acceleration: Vec3,
    max_speed: f32,
    dt: f32,
) -> Vec3 {
    if dt < MIN_TICK_TIME {
        return velocity;
    }

    let planar = horizontal(velocity);
    let accel = horizontal(acceleration);

    let blended = match strategy {
        VelocityStrategy::Ground => ground_velocity(config, planar, accel, max_speed, dt),
        VelocityStrategy::Slide { floor_normal } => {
            slide_velocity(config, planar, accel, floor_normal, dt)
        }
        VelocityStrategy::Sway => sway_velocity(config, planar, accel, max_speed, dt),
        VelocityStrategy::Lurch {
            elapsed,
            locked_direction,
        } => lurch_velocity(config, planar, accel, elapsed, locked_direction, dt),
        VelocityStrategy::AirStrafe => air_strafe_velocity(config, planar, accel, dt),
    };

    Vec3::new(blended.x, velocity.y, blended.z)
}

fn ground_velocity(
    config: &MovementConfig,
    velocity: Vec3,
    accel: Vec3,
    max_speed: f32,
    dt: f32,
) -> Vec3 {
    let analog = (accel.length() / config.max_acceleration).clamp(0.0, 1.0);
    let max_input_speed = (max_speed * analog).max(KINDA_SMALL);
    let zero_accel = accel.length_squared() <= KINDA_SMALL * KINDA_SMALL;
    let exceeding = velocity.length_squared() > max_speed * max_speed * 1.0201;

    let mut velocity = velocity;
    if zero_accel || exceeding {
        let old = velocity;
        velocity = apply_velocity_braking(
            velocity,
            dt,
            config.ground_friction * config.braking_friction_factor,
            config.braking_deceleration_walking,
        );
        // braking must not drop an over-speed player below max speed while
        // they still push
        if exceeding && !zero_accel && velocity.length_squared() < max_speed * max_speed {
            velocity = old.normalize_or_zero() * max_speed;
        }
    } else {
        let speed = velocity.length();
        let accel_dir = accel.normalize_or_zero();
        velocity -= (velocity - accel_dir * speed) * (dt * config.ground_friction).min(1.0);
    }

    if zero_accel {
        return velocity;
    }

    let new_max = if exceeding {
        velocity.length()
    } else {
        max_input_speed
    };
    (velocity + accel * dt).clamp_length_max(new_max)
}

/// Decelerates with friction and constant braking, sub-stepped so large
/// frames do not overshoot through zero.
pub fn apply_velocity_braking(velocity: Vec3, dt: f32, friction: f32, braking: f32) -> Vec3 {
    if velocity.length_squared() <= 0.0 || dt < MIN_TICK_TIME {
        return velocity;
    }

    let friction = friction.max(0.0);
    let braking = braking.max(0.0);
    let zero_friction = friction == 0.0;
    if zero_friction && braking == 0.0 {
        return velocity;
    }

    let old = velocity;
    let reverse_accel = -velocity.normalize_or_zero() * braking;
    let mut velocity = velocity;
    let mut remaining = dt;

    while remaining >= MIN_TICK_TIME {
        let step = if remaining > BRAKING_SUB_STEP && !zero_friction {
            BRAKING_SUB_STEP.min(remaining * 0.5)
        } else {
            remaining
        };
        remaining -= step;

        velocity += (-friction * velocity + reverse_accel) * step;

        if velocity.dot(old) <= 0.0 {
            return Vec3::ZERO;
        }
    }

    if velocity.length_squared() <= BRAKING_STOP_SPEED * BRAKING_STOP_SPEED {
        return Vec3::ZERO;
    }
    velocity
}

fn slide_velocity(
    config: &MovementConfig,
    velocity: Vec3,
    accel: Vec3,
    floor_normal: Vec3,
    dt: f32,
) -> Vec3 {
    let slide = &config.slide;
    let Some(forward) = velocity.try_normalize() else {
        return velocity;
    };

    let lateral = Vec3::Y.cross(forward);
    let lateral_accel = lateral * accel.dot(lateral);

    let mut velocity = velocity + lateral_accel * dt;

    // Momentum is kept until steering pushes past the cap.
    if velocity.length() > slide.speed_cap {
        let steepness = 1.0 - floor_normal.y.clamp(0.0, 1.0);
        let braking = slide.braking_deceleration
            * (1.0 + steepness * slide.floor_angle_braking_scale);
        velocity = apply_velocity_braking(velocity, dt, slide.friction, braking);
    }

    velocity
}

fn sway_velocity(
    config: &MovementConfig,
    velocity: Vec3,
    accel: Vec3,
    max_speed: f32,
    dt: f32,
) -> Vec3 {
    let strafe = &config.air_strafe;
    let Some(accel_dir) = accel.try_normalize() else {
        return velocity;
    };

    let speed = velocity.length();
    let target = accel_dir * speed;
    let turned = velocity + (target - velocity) * (strafe.sway_turn_rate * dt).min(1.0);
    let turned = turned.normalize_or(accel_dir) * speed;

    let gain_cap = config.max_acceleration / 100.0 * strafe.sway_speed_multiplier;
    let gain = (accel.length() * config.air_control * dt).min(gain_cap);
    let limit = speed.max(max_speed * strafe.sway_speed_multiplier);

    (turned + accel_dir * gain).clamp_length_max(limit)
}

fn lurch_velocity(
    config: &MovementConfig,
    velocity: Vec3,
    accel: Vec3,
    elapsed: f32,
    locked_direction: Vec3,
    dt: f32,
) -> Vec3 {
    let strafe = &config.air_strafe;
    let plain = air_strafe_velocity(config, velocity, accel, dt);

    let strength = lurch_strength(
        elapsed,
        strafe.lurch_full_strength_duration,
        strafe.lurch_duration,
    );
    if strength <= 0.0 {
        return plain;
    }

    let direction = accel
        .try_normalize()
        .or_else(|| horizontal(locked_direction).try_normalize());
    let Some(direction) = direction else {
        return plain;
    };

    let locked_speed = velocity.length() * (1.0 - strafe.lurch_speed_penalty);
    let locked_target = direction * locked_speed;
    let locked = velocity + (locked_target - velocity) * (strafe.lurch_friction * dt).min(1.0);

    plain.lerp(locked, strength)
}

fn air_strafe_velocity(config: &MovementConfig, velocity: Vec3, accel: Vec3, dt: f32) -> Vec3 {
    let strafe = &config.air_strafe;
    let Some(accel_dir) = accel.try_normalize() else {
        return velocity;
    };

    let wish_speed = accel.length().min(strafe.speed_cap);
    let current = velocity.dot(accel_dir);
    let add_speed = wish_speed - current;
    if add_speed <= 0.0 {
        return velocity;
    }

    let wish_speed = accel.length() * strafe.rotation_rate * config.air_control;
    let accel_speed = (wish_speed * dt).min(add_speed);
    velocity + accel_dir * accel_speed
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn lurch_strength_holds_then_decays() {
        assert_eq!(lurch_strength(0.0, 0.15, 0.6), 1.0);
        assert_eq!(lurch_strength(0.15, 0.15, 0.6), 1.0);
        assert!((lurch_strength(0.375, 0.15, 0.6) - 0.5).abs() < 1.0e-5);
        assert_eq!(lurch_strength(0.6, 0.15, 0.6), 0.0);
        assert_eq!(lurch_strength(2.0, 0.15, 0.6), 0.0);
    }

    #[test]
    fn ground_accelerates_to_max_speed() {
        let config = MovementConfig::default();
        let accel = Vec3::Z * config.max_acceleration;
        let mut velocity = Vec3::ZERO;
        for _ in 0..240 {
            velocity = compose_velocity(
                &config,
                VelocityStrategy::Ground,
                velocity,
                accel,
                config.max_walk_speed,
                DT,
            );
        }
        assert!((velocity.length() - config.max_walk_speed).abs() < 0.05);
        assert!(velocity.x.abs() < 1.0e-4);
    }

    #[test]
    fn ground_brakes_to_stop_without_input() {
        let config = MovementConfig::default();
        let mut velocity = Vec3::new(6.0, 0.0, 0.0);
        for _ in 0..120 {
            velocity = compose_velocity(
                &config,
                VelocityStrategy::Ground,
                velocity,
                Vec3::ZERO,
                config.max_walk_speed,
                DT,
            );
        }
        assert_eq!(velocity, Vec3::ZERO);
    }

    #[test]
    fn vertical_velocity_is_untouched() {
        let config = MovementConfig::default();
        let velocity = Vec3::new(1.0, -3.0, 2.0);
        let out = compose_velocity(
            &config,
            VelocityStrategy::AirStrafe,
            velocity,
            Vec3::X * config.max_acceleration,
            config.max_walk_speed,
            DT,
        );
        assert_eq!(out.y, -3.0);
    }

    #[test]
    fn air_strafe_gains_perpendicular_speed() {
        let config = MovementConfig::default();
        let velocity = Vec3::Z * 8.0;
        let out = compose_velocity(
            &config,
            VelocityStrategy::AirStrafe,
            velocity,
            Vec3::X * config.max_acceleration,
            config.max_walk_speed,
            DT,
        );
        assert!(out.x > 0.0);
        assert!(out.x <= config.air_strafe.speed_cap + 1.0e-5);
        assert_eq!(out.z, 8.0);
        assert!(out.length() > velocity.length());
    }

    #[test]
    fn air_strafe_never_adds_along_fast_direction() {
        let config = MovementConfig::default();
        let velocity = Vec3::Z * 8.0;
        let out = compose_velocity(
            &config,
            VelocityStrategy::AirStrafe,
            velocity,
            Vec3::Z * config.max_acceleration,
            config.max_walk_speed,
            DT,
        );
        assert_eq!(out, velocity);
    }

    #[test]
    fn slide_only_steers_laterally() {
        let config = MovementConfig::default();
        let velocity = Vec3::Z * 8.0;
        let out = compose_velocity(
            &config,
            VelocityStrategy::Slide {
                floor_normal: Vec3::Y,
            },
            velocity,
            Vec3::Z * config.max_acceleration,
            config.max_walk_speed,
            DT,
        );
        assert_eq!(out, velocity);

        let steered = compose_velocity(
            &config,
            VelocityStrategy::Slide {
                floor_normal: Vec3::Y,
            },
            velocity,
            Vec3::X * config.max_acceleration,
            config.max_walk_speed,
            DT,
        );
        assert!(steered.x.abs() > 0.0);
    }

    #[test]
    fn slide_keeps_its_speed_below_the_cap() {
        let config = MovementConfig::default();
        assert!(config.slide.speed_cap > 8.0);
        let mut velocity = Vec3::Z * 8.0;
        for _ in 0..60 {
            velocity = compose_velocity(
                &config,
                VelocityStrategy::Slide {
                    floor_normal: Vec3::Y,
                },
                velocity,
                Vec3::Z * config.max_acceleration,
                config.max_walk_speed,
                DT,
            );
        }
        assert!((velocity.length() - 8.0).abs() < 1e-3, "{velocity}");
    }

    #[test]
    fn slide_brakes_back_toward_the_cap() {
        let config = MovementConfig::default();
        let fast = Vec3::Z * (config.slide.speed_cap + 4.0);
        let flat = compose_velocity(
            &config,
            VelocityStrategy::Slide {
                floor_normal: Vec3::Y,
            },
            fast,
            Vec3::ZERO,
            config.max_walk_speed,
            DT,
        );
        let steep = compose_velocity(
            &config,
            VelocityStrategy::Slide {
                floor_normal: Vec3::new(0.0, 0.8, -0.6),
            },
            fast,
            Vec3::ZERO,
            config.max_walk_speed,
            DT,
        );
        assert!(flat.length() < fast.length());
        assert!(steep.length() < flat.length());
    }

    #[test]
    fn sway_turns_without_losing_speed() {
        let config = MovementConfig::default();
        let velocity = Vec3::Z * 7.0;
        let out = compose_velocity(
            &config,
            VelocityStrategy::Sway,
            velocity,
            Vec3::X * config.max_acceleration,
            config.max_walk_speed,
            DT,
        );
        assert!(out.x > 1.0);
        assert!(horizontal(out).length() >= 7.0 - 1.0e-4);
    }

    #[test]
    fn lurch_at_full_strength_redirects_toward_input() {
        let config = MovementConfig::default();
        let accel = Vec3::X * config.max_acceleration;
        let mut plain = Vec3::Z * 6.0;
        let mut lurched = plain;
        for tick in 0..9 {
            plain = compose_velocity(
                &config,
                VelocityStrategy::AirStrafe,
                plain,
                accel,
                config.max_walk_speed,
                DT,
            );
            lurched = compose_velocity(
                &config,
                VelocityStrategy::Lurch {
                    elapsed: tick as f32 * DT,
                    locked_direction: Vec3::Z,
                },
                lurched,
                accel,
                config.max_walk_speed,
                DT,
            );
        }
        assert!(lurched.x > plain.x * 2.0);

        let velocity = Vec3::Z * 6.0;
        let plain = compose_velocity(
            &config,
            VelocityStrategy::AirStrafe,
            velocity,
            accel,
            config.max_walk_speed,
            DT,
        );
        let expired = compose_velocity(
            &config,
            VelocityStrategy::Lurch {
                elapsed: 5.0,
                locked_direction: Vec3::Z,
            },
            velocity,
            accel,
            config.max_walk_speed,
            DT,
        );
        assert_eq!(expired, plain);
    }
}
