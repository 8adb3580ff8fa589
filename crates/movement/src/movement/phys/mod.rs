mod climb;
mod falling;
mod slide;
mod walking;
mod wall_climb;
mod wall_run;

use glam::Vec3;

use crate::collision::{
    CollisionQuery, SURFACE_CLIP_EPSILON, SurfaceId, TraceHit, compute_slide_vector,
    two_wall_adjust,
};
use crate::math::{KINDA_SMALL, horizontal, input_to_world};

use super::{
    AirStrafeWindow, FallingState, FloorResult, Locomotion, MAX_FLOOR_DIST, MIN_FLOOR_DIST,
    MIN_TICK_TIME, MovementComponent, SurfaceContact,
};

const PENETRATION_PULLBACK: f32 = 0.01;
const FLOOR_TARGET: f32 = (MIN_FLOOR_DIST + MAX_FLOOR_DIST) * 0.5;
const MIN_MOVE_SQ: f32 = KINDA_SMALL * KINDA_SMALL;

impl MovementComponent {
    /// Dispatches to the stepper of the active mode. Steppers that change
    /// mode mid-move call back in with the time they did not use.
    pub(super) fn start_new_physics(
        &mut self,
        world: &dyn CollisionQuery,
        dt: f32,
        iterations: u32,
    ) {
        if dt < MIN_TICK_TIME || iterations >= self.config.max_simulation_iterations {
            return;
        }

        match self.state.locomotion {
            Locomotion::Walking => self.phys_walking(world, dt, iterations),
            Locomotion::Falling(_) => self.phys_falling(world, dt, iterations),
            Locomotion::Slide(_) => self.phys_slide(world, dt, iterations),
            Locomotion::WallClimbing(_) => self.phys_wall_climbing(world, dt, iterations),
            Locomotion::Mantling(_) | Locomotion::LedgeClimbing(_) => {
                self.phys_climb(world, dt, iterations)
            }
            Locomotion::WallRunning(_) => self.phys_wall_running(world, dt, iterations),
        }
    }

    fn simulation_time_step(&self, remaining: f32, iterations: u32) -> f32 {
        let max_step = self.config.max_simulation_time_step;
        if remaining > max_step && iterations < self.config.max_simulation_iterations {
            max_step.min(remaining * 0.5)
        } else {
            remaining
        }
    }

    /// Sweeps the hull by `delta` and moves it to where the sweep stopped.
    /// A start inside geometry is pushed out once before giving up.
    fn safe_move(&mut self, world: &dyn CollisionQuery, delta: Vec3) -> TraceHit {
        let start = self.state.position;
        if !self.state.collision_enabled {
            self.state.position = start + delta;
            return TraceHit::miss(start, start + delta);
        }

        let hull = self.hull();
        let mut hit = world.sweep(start, start + delta, hull);
        if hit.start_penetrating {
            let resolved = start + hit.normal * (hit.penetration_depth + PENETRATION_PULLBACK);
            if world.overlaps(resolved, hull) {
                log::warn!(
                    "stuck in geometry at {start} (depth {:.3})",
                    hit.penetration_depth
                );
                return hit;
            }
            log::debug!("resolved penetration at {start} -> {resolved}");
            self.state.position = resolved;
            hit = world.sweep(resolved, resolved + delta, hull);
            if hit.start_penetrating {
                return hit;
            }
        }

        self.state.position = hit.location;
        hit
    }

    /// Continues a blocked move along the surface, handling a second wall by
    /// following the crease between the two.
    fn slide_along_surface(
        &mut self,
        world: &dyn CollisionQuery,
        delta: Vec3,
        hit_time: f32,
        normal: Vec3,
        flatten_walls: bool,
    ) -> Option<TraceHit> {
        let slide = compute_slide_vector(delta, 1.0 - hit_time, normal);
        if slide.dot(delta) <= 0.0 || slide.length_squared() < MIN_MOVE_SQ {
            return None;
        }

        let hit = self.safe_move(world, slide);
        if !hit.blocking_hit || hit.start_penetrating {
            return Some(hit);
        }

        let second_normal = if flatten_walls && !hit.is_walkable(self.config.walkable_floor_y) {
            horizontal(hit.normal).normalize_or(hit.normal)
        } else {
            hit.normal
        };
        let adjusted = two_wall_adjust(slide, hit.time, normal, second_normal);
        if adjusted.length_squared() > MIN_MOVE_SQ {
            self.safe_move(world, adjusted);
        }
        Some(hit)
    }

    pub(super) fn find_floor(&self, world: &dyn CollisionQuery) -> Option<FloorResult> {
        let start = self.state.position;
        let reach = self.config.max_step_height + MAX_FLOOR_DIST;
        let hit = world.sweep(start, start - Vec3::Y * reach, self.hull());

        if !hit.blocking_hit || hit.start_penetrating {
            return None;
        }
        if !hit.is_walkable(self.config.walkable_floor_y) {
            return None;
        }

        Some(FloorResult {
            normal: hit.normal,
            distance: hit.distance() + SURFACE_CLIP_EPSILON,
            surface: hit.surface,
        })
    }

    /// Drops the hull onto the floor found below it, keeping the walking gap.
    pub(super) fn snap_to_floor(&mut self, floor: &FloorResult) {
        self.state.position.y += FLOOR_TARGET - floor.distance;
        self.state.floor = Some(FloorResult {
            distance: FLOOR_TARGET,
            ..*floor
        });
    }

    fn step_up(&mut self, world: &dyn CollisionQuery, delta: Vec3) -> bool {
        let delta = horizontal(delta);
        if delta.length_squared() < MIN_MOVE_SQ {
            return false;
        }

        let hull = self.hull();
        let start = self.state.position;
        let step = self.config.max_step_height;

        let up = world.sweep(start, start + Vec3::Y * step, hull);
        if up.start_penetrating {
            return false;
        }
        let raised = up.location;
        let lift = raised.y - start.y;
        if lift < KINDA_SMALL {
            return false;
        }

        let forward = world.sweep(raised, raised + delta, hull);
        if forward.start_penetrating {
            return false;
        }
        let advanced = forward.location;
        if horizontal(advanced - raised).length_squared() < MIN_MOVE_SQ {
            return false;
        }

        let down = world.sweep(advanced, advanced - Vec3::Y * (lift + MAX_FLOOR_DIST), hull);
        if down.start_penetrating || !down.is_walkable(self.config.walkable_floor_y) {
            return false;
        }
        if down.location.y - start.y > step {
            return false;
        }

        log::trace!("stepped up {:.3}", down.location.y - start.y);
        self.state.position = down.location;
        true
    }

    /// Kicks off a wall. Leaves the character Falling with a sway window.
    pub(super) fn try_wall_jump(
        &mut self,
        normal: Vec3,
        contact: Vec3,
        wall: Option<SurfaceId>,
    ) -> bool {
        let jump = &self.config.wall_jump;
        if !jump.enabled || self.state.timers.wall_jump_count >= jump.max_jumps {
            return false;
        }
        let Some(away) = horizontal(normal).try_normalize() else {
            return false;
        };

        let wish = input_to_world(self.input.move_input, self.input.view_yaw);
        let direction = (away * (1.0 - jump.input_weight) + wish * jump.input_weight)
            .normalize_or(away);
        let speed = self.state.horizontal_speed().max(jump.min_horizontal_speed);

        self.state.velocity = direction * speed + Vec3::Y * jump.z_velocity;
        self.state.timers.wall_jump_count += 1;
        self.state.timers.last_wall_jump_time = self.state.time;
        self.state.surfaces.last_wall_jump = Some(SurfaceContact {
            location: contact,
            normal: away,
            wall,
        });
        self.consume_jump_inputs();

        log::debug!(
            "wall jump {} off {:?} at {}",
            self.state.timers.wall_jump_count,
            wall,
            contact
        );
        self.set_locomotion(Locomotion::Falling(FallingState {
            jump_force_time_remaining: 0.0,
            window: AirStrafeWindow::Sway {
                start: self.state.time,
            },
        }));
        true
    }
}
