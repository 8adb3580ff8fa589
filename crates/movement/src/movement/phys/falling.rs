use glam::Vec3;

use crate::collision::{CollisionQuery, TraceHit, clip_velocity};
use crate::math::horizontal;

use crate::movement::{
    InputIntents, Locomotion, MIN_TICK_TIME, MovementComponent, WALL_MAX_NORMAL_Y,
    WallClimbState, WallRunState, apply_velocity_braking,
};

type ContactResolver = fn(&mut MovementComponent, &dyn CollisionQuery, &TraceHit) -> bool;

/// Ways an airborne hull can attach to what it ran into, in priority order.
/// The first resolver that accepts the contact wins.
const FALLING_CONTACT_RESOLVERS: [ContactResolver; 5] = [
    MovementComponent::try_land,
    MovementComponent::try_wall_jump_from_hit,
    MovementComponent::try_mantle_from_hit,
    MovementComponent::try_wall_climb_from_hit,
    MovementComponent::try_wall_run_from_hit,
];

impl MovementComponent {
    pub(super) fn phys_falling(&mut self, world: &dyn CollisionQuery, dt: f32, iterations: u32) {
        let mut iterations = iterations;
        let mut remaining = dt;
        let gravity = self.config.gravity_magnitude();

        while remaining >= MIN_TICK_TIME && iterations < self.config.max_simulation_iterations {
            iterations += 1;
            let mut time_tick = self.simulation_time_step(remaining, iterations);
            remaining -= time_tick;

            let Locomotion::Falling(mut falling) = self.state.locomotion else {
                return;
            };
            let old_velocity = self.state.velocity;

            let mut gravity_time = time_tick;
            let mut holding = false;
            if falling.jump_force_time_remaining > 0.0 {
                if self.input.has(InputIntents::JUMP) {
                    let hold = falling.jump_force_time_remaining.min(time_tick);
                    falling.jump_force_time_remaining -= hold;
                    gravity_time -= hold;
                    holding = true;
                } else {
                    falling.jump_force_time_remaining = 0.0;
                }
            }

            // split the step at the apex so the peak height is exact
            if !holding && old_velocity.y > 0.0 && gravity > 0.0 {
                let apex = old_velocity.y / gravity;
                if apex > MIN_TICK_TIME && apex < time_tick {
                    remaining += time_tick - apex;
                    time_tick = apex;
                    gravity_time = apex;
                }
            }

            self.state.locomotion = Locomotion::Falling(falling);
            self.calc_velocity(time_tick);
            let braking = self.config.braking_deceleration_falling;
            if self.state.acceleration == Vec3::ZERO && braking > 0.0 {
                let braked = apply_velocity_braking(
                    horizontal(self.state.velocity),
                    time_tick,
                    0.0,
                    braking,
                );
                self.state.velocity = Vec3::new(braked.x, self.state.velocity.y, braked.z);
            }
            self.state.velocity.y =
                (old_velocity.y - gravity * gravity_time).max(-self.config.terminal_velocity);

            let delta = (old_velocity + self.state.velocity) * 0.5 * time_tick;
            let hit = self.safe_move(world, delta);
            if !hit.blocking_hit || hit.start_penetrating {
                continue;
            }

            let leftover = time_tick * (1.0 - hit.time);
            let mode_before = self.state.mode();
            let resolved = FALLING_CONTACT_RESOLVERS
                .iter()
                .any(|resolve| resolve(self, world, &hit));
            if resolved {
                if self.state.mode() != mode_before {
                    self.start_new_physics(world, remaining + leftover, iterations);
                    return;
                }
                remaining += leftover;
                continue;
            }

            self.state.velocity = clip_velocity(self.state.velocity, hit.normal);
            let Some(second) = self.slide_along_surface(world, delta, hit.time, hit.normal, false)
            else {
                continue;
            };
            if second.blocking_hit && !second.start_penetrating && self.try_land(world, &second) {
                self.start_new_physics(world, remaining, iterations);
                return;
            }
        }
    }

    fn try_land(&mut self, world: &dyn CollisionQuery, hit: &TraceHit) -> bool {
        if !hit.is_walkable(self.config.walkable_floor_y) {
            return false;
        }

        if let Some(origin) = self.state.fall_origin {
            log::debug!(
                "landed at {} after dropping {:.2} m",
                self.state.position,
                origin.y - self.state.position.y
            );
        }
        self.state.velocity.y = 0.0;
        self.set_locomotion(Locomotion::Walking);
        if let Some(floor) = self.find_floor(world) {
            self.snap_to_floor(&floor);
        }
        true
    }

    fn try_wall_jump_from_hit(&mut self, _world: &dyn CollisionQuery, hit: &TraceHit) -> bool {
        if !hit.is_wall(WALL_MAX_NORMAL_Y) || !self.wall_jump_requested() {
            return false;
        }
        self.try_wall_jump(hit.normal, hit.impact_point, hit.surface)
    }

    fn try_mantle_from_hit(&mut self, world: &dyn CollisionQuery, hit: &TraceHit) -> bool {
        if !hit.is_wall(WALL_MAX_NORMAL_Y) || !self.wants_to_mantle() {
            return false;
        }
        let Some(target) = self.check_if_safe_to_mantle_ledge(world) else {
            return false;
        };
        self.begin_climb(target);
        true
    }

    fn try_wall_climb_from_hit(&mut self, _world: &dyn CollisionQuery, hit: &TraceHit) -> bool {
        if !hit.is_wall(WALL_MAX_NORMAL_Y) || !self.can_wall_climb() {
            return false;
        }
        if !self.facing_wall(hit, self.config.wall_climb.entry_angle) {
            return false;
        }

        self.set_locomotion(Locomotion::WallClimbing(WallClimbState {
            wall_normal: horizontal(hit.normal).normalize_or_zero(),
            wall: hit.surface,
            start_time: self.state.time,
        }));
        true
    }

    fn try_wall_run_from_hit(&mut self, _world: &dyn CollisionQuery, hit: &TraceHit) -> bool {
        if !self.can_wall_run(hit) {
            return false;
        }

        let run = &self.config.wall_run;
        let normal = horizontal(hit.normal).normalize_or_zero();
        let along = Vec3::Y.cross(normal);
        let along_speed = horizontal(self.state.velocity).dot(along);
        let side = if along_speed >= 0.0 { 1.0 } else { -1.0 };
        let speed = along_speed.abs().clamp(run.min_speed, run.max_speed);

        self.set_locomotion(Locomotion::WallRunning(WallRunState {
            wall_normal: normal,
            wall: hit.surface,
            start_time: self.state.time,
            side,
            speed,
        }));
        true
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::collision::CollisionWorld;
    use crate::movement::{AirStrafeWindow, FallingState, MovementMode, PlayerInput};

    const DT: f32 = 1.0 / 60.0;

    fn flat_world() -> CollisionWorld {
        let mut world = CollisionWorld::new();
        world.add_ground(0.0, 100.0);
        world
    }

    #[test]
    fn drops_and_lands_on_the_floor() {
        let world = flat_world();
        let mut component = MovementComponent::default();
        component.spawn(&world, Vec3::new(0.0, 4.0, 0.0));
        assert_eq!(component.movement_mode(), MovementMode::Falling);

        for _ in 0..120 {
            component.perform_movement(&world, DT).expect("valid move");
        }

        assert_eq!(component.movement_mode(), MovementMode::Walking);
        let feet = component.position().y - component.config().capsule_half_height;
        assert!(feet > 0.0 && feet < 0.03);
        assert_eq!(component.velocity().y, 0.0);
        assert!(component.state.fall_origin.is_none());
    }

    #[test]
    fn jump_reaches_the_expected_apex() {
        let world = flat_world();
        let mut component = MovementComponent::default();
        component.spawn(&world, Vec3::new(0.0, 1.0, 0.0));
        let ground = component.position().y;

        component.start_jump();
        component.perform_movement(&world, DT).expect("valid move");
        component.stop_jump();
        assert_eq!(component.movement_mode(), MovementMode::Falling);

        let mut peak = ground;
        for _ in 0..120 {
            component.perform_movement(&world, DT).expect("valid move");
            peak = peak.max(component.position().y);
        }

        let g = component.config().gravity_magnitude();
        let v = component.config().jump_z_velocity;
        // the press tick is held, so it rises at full speed before gravity
        let expected = v * DT + v * v / (2.0 * g);
        assert!(((peak - ground) - expected).abs() < 0.02);
        assert_eq!(component.movement_mode(), MovementMode::Walking);
    }

    #[test]
    fn holding_jump_rises_higher() {
        let world = flat_world();
        let peak = |hold: bool| {
            let mut component = MovementComponent::default();
            component.spawn(&world, Vec3::new(0.0, 1.0, 0.0));
            let ground = component.position().y;
            component.start_jump();
            let mut peak = ground;
            for tick in 0..90 {
                if !hold && tick == 1 {
                    component.stop_jump();
                }
                component.perform_movement(&world, DT).expect("valid move");
                peak = peak.max(component.position().y);
            }
            peak - ground
        };
        assert!(peak(true) > peak(false) + 0.3);
    }

    #[test]
    fn fall_speed_is_capped() {
        let mut world = CollisionWorld::new();
        world.add_ground(-500.0, 10.0);
        let mut component = MovementComponent::default();
        component.spawn(&world, Vec3::ZERO);
        for _ in 0..300 {
            component.perform_movement(&world, DT).expect("valid move");
        }
        assert!(component.velocity().y >= -component.config().terminal_velocity);
        assert!(component.velocity().y < -component.config().terminal_velocity + 0.01);
    }

    #[test]
    fn head_on_wall_contact_starts_a_wall_climb() {
        let mut world = flat_world();
        world.add_box(Vec3::new(0.0, 3.0, 2.0), Vec3::new(3.0, 3.0, 0.5));

        let mut component = MovementComponent::default();
        component.spawn(&world, Vec3::new(0.0, 2.0, 0.0));
        component.state.velocity = Vec3::new(0.0, 2.0, 5.0);
        component.set_player_input(PlayerInput::new(Vec2::new(0.0, 1.0), 0.0));

        for _ in 0..20 {
            component.perform_movement(&world, DT).expect("valid move");
            if component.movement_mode() == MovementMode::WALL_CLIMBING {
                break;
            }
        }
        assert_eq!(component.movement_mode(), MovementMode::WALL_CLIMBING);
        let normal = component.state.locomotion.wall_normal().expect("wall normal");
        assert!((normal + Vec3::Z).length() < 1.0e-4);
    }

    #[test]
    fn grazing_wall_contact_starts_a_wall_run() {
        let mut world = flat_world();
        world.add_box(Vec3::new(1.5, 3.0, 10.0), Vec3::new(0.5, 3.0, 12.0));

        let mut component = MovementComponent::default();
        component.spawn(&world, Vec3::new(0.0, 2.0, 0.0));
        component.state.velocity = Vec3::new(2.0, 1.0, 8.0);
        component.set_player_input(PlayerInput::new(Vec2::new(0.0, 1.0), 0.0));

        for _ in 0..30 {
            component.perform_movement(&world, DT).expect("valid move");
            if component.movement_mode() == MovementMode::WALL_RUNNING {
                break;
            }
        }
        assert_eq!(component.movement_mode(), MovementMode::WALL_RUNNING);
        let Locomotion::WallRunning(run) = component.state.locomotion else {
            unreachable!();
        };
        assert_eq!(run.side, 1.0);
        assert!(run.speed >= component.config().wall_run.min_speed);
    }

    #[test]
    fn jump_pressed_against_a_wall_kicks_off_it() {
        let mut world = flat_world();
        world.add_box(Vec3::new(0.0, 3.0, 2.0), Vec3::new(3.0, 3.0, 0.5));

        let mut component = MovementComponent::default();
        component.spawn(&world, Vec3::new(0.0, 2.0, 0.0));
        component.state.velocity = Vec3::new(0.0, 0.0, 6.0);
        component.state.locomotion = Locomotion::Falling(FallingState::default());
        component.set_player_input(
            PlayerInput::new(Vec2::ZERO, 0.0).with_intents(InputIntents::WALL_JUMP),
        );

        for _ in 0..20 {
            component.perform_movement(&world, DT).expect("valid move");
            if component.state.timers.wall_jump_count > 0 {
                break;
            }
        }
        assert_eq!(component.state.timers.wall_jump_count, 1);
        assert!(component.velocity().z < 0.0);
        assert!(matches!(
            component.state.locomotion,
            Locomotion::Falling(FallingState {
                window: AirStrafeWindow::Sway { .. },
                ..
            })
        ));
        assert!(component.last_wall_jump_location().is_some());
    }

    #[test]
    fn held_wall_jump_kicks_off_only_one_wall() {
        let mut world = flat_world();
        world.add_box(Vec3::new(0.0, 3.0, 2.0), Vec3::new(3.0, 3.0, 0.5));
        world.add_box(Vec3::new(0.0, 3.0, -2.0), Vec3::new(3.0, 3.0, 0.5));

        let mut component = MovementComponent::default();
        component.spawn(&world, Vec3::new(0.0, 2.0, 0.0));
        component.state.velocity = Vec3::new(0.0, 0.0, 6.0);
        component.state.locomotion = Locomotion::Falling(FallingState::default());
        component.set_player_input(
            PlayerInput::new(Vec2::ZERO, 0.0).with_intents(InputIntents::WALL_JUMP),
        );

        let mut most_jumps = 0;
        let mut reached_back_wall = false;
        for _ in 0..120 {
            component.perform_movement(&world, DT).expect("valid move");
            most_jumps = most_jumps.max(component.state.timers.wall_jump_count);
            reached_back_wall |= component.position().z < -1.0;
        }

        assert_eq!(most_jumps, 1);
        assert!(reached_back_wall);
    }
}
