use glam::Vec3;

use crate::collision::{CollisionQuery, clip_velocity};
use crate::math::{angle_between_deg, forward_from_yaw, horizontal};
use crate::movement::{
    Locomotion, MAX_FLOOR_DIST, MIN_TICK_TIME, MovementComponent, WALL_MAX_NORMAL_Y, WallRunState,
};

/// Largest bend between wall segments a run follows.
const MAX_WALL_TURN_DEG: f32 = 30.0;

fn run_direction(run: &WallRunState) -> Vec3 {
    Vec3::Y.cross(run.wall_normal) * run.side
}

impl MovementComponent {
    pub(super) fn phys_wall_running(
        &mut self,
        world: &dyn CollisionQuery,
        dt: f32,
        iterations: u32,
    ) {
        let Locomotion::WallRunning(run) = self.state.locomotion else {
            return;
        };

        if self.state.time - run.start_time >= self.config.wall_run.duration {
            log::debug!("wall run timed out at {}", self.state.position);
            self.leave_wall_run(world, dt, iterations);
            return;
        }
        if self.wall_jump_requested() {
            let contact = self.state.position - run.wall_normal * self.hull().half_extents.x;
            if !self.try_wall_jump(run.wall_normal, contact, run.wall) {
                self.set_locomotion(Locomotion::falling());
            }
            self.start_new_physics(world, dt, iterations);
            return;
        }
        let view = forward_from_yaw(self.input.view_yaw);
        if self.input.forward() <= 0.0
            || angle_between_deg(view, run_direction(&run)) > self.config.wall_run.acceptable_angle
        {
            self.leave_wall_run(world, dt, iterations);
            return;
        }

        let gravity = self.config.gravity_magnitude() * self.config.wall_run.gravity_scale;
        let max_fall_speed = self.config.wall_run.max_fall_speed;
        let stick = self.config.wall_run.wall_stick;

        let mut iterations = iterations;
        let mut remaining = dt;
        while remaining >= MIN_TICK_TIME && iterations < self.config.max_simulation_iterations {
            iterations += 1;
            let time_tick = self.simulation_time_step(remaining, iterations);
            remaining -= time_tick;

            let Locomotion::WallRunning(mut run) = self.state.locomotion else {
                return;
            };

            let fall = (self.state.velocity.y - gravity * time_tick).max(-max_fall_speed);
            self.state.velocity = run_direction(&run) * run.speed + Vec3::Y * fall;

            let delta = (self.state.velocity - run.wall_normal * stick) * time_tick;
            let hit = self.safe_move(world, delta);

            if !hit.blocking_hit {
                log::trace!("ran off the end of the wall at {}", self.state.position);
                self.leave_wall_run(world, remaining, iterations);
                return;
            }
            if hit.start_penetrating {
                continue;
            }
            if hit.is_walkable(self.config.walkable_floor_y) {
                self.set_locomotion(Locomotion::Walking);
                self.start_new_physics(world, remaining, iterations);
                return;
            }

            if hit.is_wall(WALL_MAX_NORMAL_Y) {
                let normal = horizontal(hit.normal).normalize_or_zero();
                if angle_between_deg(normal, run.wall_normal) > MAX_WALL_TURN_DEG {
                    self.leave_wall_run(world, remaining, iterations);
                    return;
                }
                run.wall_normal = normal;
                run.wall = hit.surface;
                self.set_locomotion(Locomotion::WallRunning(run));
            } else {
                self.state.velocity = clip_velocity(self.state.velocity, hit.normal);
            }
            self.slide_along_surface(world, delta, hit.time, hit.normal, false);

            if self.state.velocity.y <= 0.0 {
                if let Some(floor) = self.find_floor(world) {
                    if floor.distance <= MAX_FLOOR_DIST {
                        self.set_locomotion(Locomotion::Walking);
                        self.snap_to_floor(&floor);
                        self.start_new_physics(world, remaining, iterations);
                        return;
                    }
                }
            }
        }
    }

    fn leave_wall_run(&mut self, world: &dyn CollisionQuery, dt: f32, iterations: u32) {
        self.set_locomotion(Locomotion::falling());
        self.start_new_physics(world, dt, iterations);
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::collision::CollisionWorld;
    use crate::movement::{MovementMode, PlayerInput};

    const DT: f32 = 1.0 / 60.0;

    /// Wall on the right of a runner heading +Z, face at `x = 1`.
    fn running_along(wall_length: f32, height: f32) -> (MovementComponent, CollisionWorld) {
        let mut world = CollisionWorld::new();
        world.add_ground(0.0, 60.0);
        world.add_box(
            Vec3::new(1.5, 3.0, wall_length * 0.5 - 2.0),
            Vec3::new(0.5, 3.0, wall_length * 0.5),
        );

        let mut component = MovementComponent::default();
        component.spawn(&world, Vec3::new(0.65, height, 0.0));
        component.set_player_input(PlayerInput::new(Vec2::new(0.0, 1.0), 0.0));
        component.set_locomotion(Locomotion::WallRunning(WallRunState {
            wall_normal: -Vec3::X,
            wall: None,
            start_time: 0.0,
            side: 1.0,
            speed: 8.0,
        }));
        (component, world)
    }

    #[test]
    fn runs_along_the_wall_with_reduced_gravity() {
        let (mut component, world) = running_along(40.0, 2.5);
        let start = component.position();
        for _ in 0..30 {
            component.perform_movement(&world, DT).expect("valid move");
        }

        assert_eq!(component.movement_mode(), MovementMode::WALL_RUNNING);
        let travelled = component.position() - start;
        assert!((travelled.z - 4.0).abs() < 0.1);
        assert!(travelled.y < 0.0 && travelled.y > -0.5);
        assert!(travelled.x.abs() < 0.02);
    }

    #[test]
    fn run_times_out_into_a_fall() {
        let (mut component, world) = running_along(40.0, 5.0);
        let mut ended = None;
        for tick in 0..120 {
            component.perform_movement(&world, DT).expect("valid move");
            if component.movement_mode() != MovementMode::WALL_RUNNING {
                ended = Some(tick);
                break;
            }
        }

        let tick = ended.expect("wall run should end");
        assert!((88..=92).contains(&tick));
        assert_eq!(component.movement_mode(), MovementMode::Falling);
    }

    #[test]
    fn looking_away_ends_the_run() {
        let (mut component, world) = running_along(40.0, 2.5);
        component.perform_movement(&world, DT).expect("valid move");
        component.set_view_yaw(-std::f32::consts::FRAC_PI_2);
        component.perform_movement(&world, DT).expect("valid move");
        assert_eq!(component.movement_mode(), MovementMode::Falling);
    }

    #[test]
    fn jump_kicks_away_from_the_wall() {
        let (mut component, world) = running_along(40.0, 2.5);
        component.perform_movement(&world, DT).expect("valid move");
        component.start_jump();
        component.perform_movement(&world, DT).expect("valid move");

        assert_eq!(component.movement_mode(), MovementMode::Falling);
        assert_eq!(component.state.timers.wall_jump_count, 1);
        assert!(component.velocity().x < 0.0);
        assert!(component.velocity().z > 0.0);
    }

    #[test]
    fn running_past_the_end_falls_and_remembers_the_wall() {
        let (mut component, world) = running_along(5.0, 2.5);
        let mut fell = false;
        for _ in 0..60 {
            component.perform_movement(&world, DT).expect("valid move");
            if component.movement_mode() == MovementMode::Falling {
                fell = true;
                break;
            }
        }

        assert!(fell);
        assert!(component.position().z > 3.0);
        assert_eq!(component.last_wall_run_normal(), Some(-Vec3::X));
    }
}
