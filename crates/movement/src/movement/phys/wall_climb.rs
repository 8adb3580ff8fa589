use glam::Vec3;

use crate::collision::CollisionQuery;
use crate::math::{KINDA_SMALL, angle_between_deg, horizontal, project_on_plane};
use crate::movement::{
    Locomotion, MIN_TICK_TIME, MovementComponent, WALL_MAX_NORMAL_Y, WallClimbState,
};

const HEAD_REACH_MARGIN: f32 = 0.1;

impl MovementComponent {
    pub(super) fn phys_wall_climbing(
        &mut self,
        world: &dyn CollisionQuery,
        dt: f32,
        iterations: u32,
    ) {
        let Locomotion::WallClimbing(climb) = self.state.locomotion else {
            return;
        };

        if let Some(limit) = self.config.wall_climb.duration {
            if self.state.timers.wall_climb_time_used >= limit {
                log::debug!("wall climb ran out after {limit:.2}s");
                self.drop_off_wall(world, dt, iterations);
                return;
            }
        }
        if self.wall_jump_requested() {
            let contact = self.state.position - climb.wall_normal * self.hull().half_extents.z;
            if !self.try_wall_jump(climb.wall_normal, contact, climb.wall) {
                self.set_locomotion(Locomotion::falling());
            }
            self.start_new_physics(world, dt, iterations);
            return;
        }
        if self.input.forward() <= 0.0 {
            self.drop_off_wall(world, dt, iterations);
            return;
        }

        let mut iterations = iterations;
        let mut remaining = dt;
        while remaining >= MIN_TICK_TIME && iterations < self.config.max_simulation_iterations {
            iterations += 1;
            let time_tick = self.simulation_time_step(remaining, iterations);
            remaining -= time_tick;

            let Locomotion::WallClimbing(mut climb) = self.state.locomotion else {
                return;
            };
            let settings = &self.config.wall_climb;
            let speed = settings.speed;
            let multiplier = settings.multiplier;
            let stick = settings.wall_stick;
            let acceptable_angle = settings.acceptable_angle;

            let wish = self.state.acceleration / self.config.max_acceleration.max(KINDA_SMALL);
            let lateral = horizontal(project_on_plane(wish, climb.wall_normal));
            let direction = lateral * multiplier.x + Vec3::Y * multiplier.y;
            self.state.velocity = (direction * speed).clamp_length_max(speed);
            self.state.timers.wall_climb_time_used += time_tick;

            let delta = (self.state.velocity - climb.wall_normal * stick) * time_tick;
            let hit = self.safe_move(world, delta);

            if !hit.blocking_hit {
                log::trace!("lost the wall at {}", self.state.position);
                self.drop_off_wall(world, remaining, iterations);
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
                if angle_between_deg(normal, climb.wall_normal) > acceptable_angle {
                    self.drop_off_wall(world, remaining, iterations);
                    return;
                }
                climb.wall_normal = normal;
                climb.wall = hit.surface;
                self.set_locomotion(Locomotion::WallClimbing(climb));
            }
            self.slide_along_surface(world, delta, hit.time, hit.normal, false);

            if self.ledge_in_reach(world, &climb) {
                if let Some(target) = self.check_if_safe_to_mantle_ledge(world) {
                    self.begin_climb(target);
                    self.start_new_physics(world, remaining, iterations);
                    return;
                }
            }
        }
    }

    fn drop_off_wall(&mut self, world: &dyn CollisionQuery, dt: f32, iterations: u32) {
        self.set_locomotion(Locomotion::falling());
        self.start_new_physics(world, dt, iterations);
    }

    /// The top of the hull has risen past the wall and the player is still
    /// pushing toward it.
    fn ledge_in_reach(&self, world: &dyn CollisionQuery, climb: &WallClimbState) -> bool {
        let wish = self.state.acceleration;
        if angle_between_deg(wish, -climb.wall_normal) > self.config.wall_climb.ledge_input_angle {
            return false;
        }

        let hull = self.hull();
        let head = self.state.position + Vec3::Y * hull.half_height();
        let reach = hull.half_extents.z + HEAD_REACH_MARGIN;
        !world
            .line_trace(head, head - climb.wall_normal * reach)
            .blocking_hit
    }
}
