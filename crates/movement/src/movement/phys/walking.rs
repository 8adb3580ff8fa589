use glam::Vec3;

use crate::collision::{CollisionQuery, TraceHit};
use crate::math::{horizontal, project_on_plane};

use super::{Locomotion, MIN_MOVE_SQ, MIN_TICK_TIME, MovementComponent};

/// Tilts a horizontal move so it runs along a walkable ramp.
fn ground_movement_delta(delta: Vec3, floor_normal: Vec3, walkable_floor_y: f32) -> Vec3 {
    let flat = horizontal(delta);
    if floor_normal.y >= 1.0 - f32::EPSILON || floor_normal.y < walkable_floor_y {
        return flat;
    }
    let rise = -(floor_normal.x * flat.x + floor_normal.z * flat.z) / floor_normal.y;
    Vec3::new(flat.x, rise, flat.z)
}

impl MovementComponent {
    pub(super) fn phys_walking(&mut self, world: &dyn CollisionQuery, dt: f32, iterations: u32) {
        self.phys_ground(world, dt, iterations);
    }

    /// Floor-following integrator shared by walking and sliding.
    pub(super) fn phys_ground(&mut self, world: &dyn CollisionQuery, dt: f32, iterations: u32) {
        let mut iterations = iterations;
        let mut remaining = dt;

        while remaining >= MIN_TICK_TIME && iterations < self.config.max_simulation_iterations {
            iterations += 1;
            let time_tick = self.simulation_time_step(remaining, iterations);
            remaining -= time_tick;

            let sliding = matches!(self.state.locomotion, Locomotion::Slide(_));
            let old_location = self.state.position;

            self.state.velocity.y = 0.0;
            self.calc_velocity(time_tick);
            if sliding {
                self.apply_slope_gravity(time_tick);
            }

            let delta = self.state.velocity * time_tick;
            if delta.length_squared() > MIN_MOVE_SQ {
                self.move_along_floor(world, delta);
            }

            let Some(floor) = self.find_floor(world) else {
                log::trace!("walked off a ledge at {}", self.state.position);
                self.set_locomotion(Locomotion::falling());
                self.start_new_physics(world, remaining, iterations);
                return;
            };
            self.snap_to_floor(&floor);

            self.state.velocity = horizontal(self.state.position - old_location) / time_tick;
        }

        self.state.timers.time_on_ground += dt;
    }

    fn apply_slope_gravity(&mut self, dt: f32) {
        let Some(floor) = self.state.floor else {
            return;
        };
        let scale = self.config.slide.gravity_scale;
        let gravity = Vec3::NEG_Y * self.config.gravity_magnitude() * scale;
        let downhill = project_on_plane(gravity, floor.normal);
        self.state.velocity += horizontal(downhill) * dt;
    }

    fn move_along_floor(&mut self, world: &dyn CollisionQuery, delta: Vec3) {
        let walkable = self.config.walkable_floor_y;
        let floor_normal = self.state.floor.map_or(Vec3::Y, |floor| floor.normal);
        let ramp_delta = ground_movement_delta(delta, floor_normal, walkable);

        let hit = self.safe_move(world, ramp_delta);
        if !hit.blocking_hit || hit.start_penetrating {
            return;
        }

        if hit.is_walkable(walkable) {
            let rest = ground_movement_delta(delta * (1.0 - hit.time), hit.normal, walkable);
            let second = self.safe_move(world, rest);
            if second.blocking_hit
                && !second.start_penetrating
                && !second.is_walkable(walkable)
            {
                self.handle_ground_blocking(world, rest, &second);
            }
            return;
        }

        self.handle_ground_blocking(world, ramp_delta, &hit);
    }

    fn handle_ground_blocking(&mut self, world: &dyn CollisionQuery, delta: Vec3, hit: &TraceHit) {
        let rest = delta * (1.0 - hit.time);
        if hit.normal.y.abs() < self.config.walkable_floor_y && self.step_up(world, rest) {
            return;
        }
        let normal = horizontal(hit.normal).normalize_or(hit.normal);
        self.slide_along_surface(world, delta, hit.time, normal, true);
    }
}
