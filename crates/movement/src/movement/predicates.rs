use glam::Vec3;

use crate::collision::{CollisionQuery, TraceHit};
use crate::math::{angle_between_deg, forward_from_yaw, horizontal, input_to_world, right_from_yaw};

use super::{
    ClimbKind, ClimbTarget, InputIntents, Locomotion, MAX_FLOOR_DIST, MIN_FLOOR_DIST,
    MovementComponent, MovementMode, StatusTags, WALL_MAX_NORMAL_Y,
};

const LEDGE_SEARCH_MARGIN: f32 = 0.05;
const TARGET_QUANTUM: f32 = 0.01;

/// Rounds a climb target to the centimeter grid used on the wire so every
/// peer climbs toward the same point.
pub(crate) fn snap_target_to_grid(location: Vec3) -> Vec3 {
    (location / TARGET_QUANTUM).round() * TARGET_QUANTUM
}

impl MovementComponent {
    pub fn can_slide(&self) -> bool {
        let slide = &self.config.slide;
        if !slide.enabled || self.capsule.is_none() {
            return false;
        }
        if !self.state.mode().is_grounded() {
            return false;
        }
        if self.state.timers.prev_slide_time + slide.delay > self.state.time {
            return false;
        }
        if !self.state.crouched || self.state.status.contains(StatusTags::ATTACKING) {
            return false;
        }

        let min_speed = if self.state.mode() == MovementMode::SLIDE {
            slide.exit_speed
        } else {
            slide.enter_min_speed
        };
        self.state.horizontal_speed() >= min_speed
    }

    pub fn can_wall_climb(&self) -> bool {
        let climb = &self.config.wall_climb;
        if !climb.enabled {
            return false;
        }
        if let Some(limit) = climb.duration {
            if self.state.timers.wall_climb_time_used >= limit {
                return false;
            }
        }
        let timers = &self.state.timers;
        if timers.last_wall_jump_time + climb.jump_interval > self.state.time {
            return false;
        }
        if timers.last_mantle_time + climb.mantle_interval > self.state.time {
            return false;
        }
        self.input.forward() > 0.0
    }

    pub fn can_wall_run(&self, hit: &TraceHit) -> bool {
        let run = &self.config.wall_run;
        if !run.enabled || self.state.status.contains(StatusTags::ATTACKING) {
            return false;
        }
        if self.input.forward() <= 0.0 || !hit.is_wall(WALL_MAX_NORMAL_Y) {
            return false;
        }

        let normal = horizontal(hit.normal).normalize_or_zero();
        let along = Vec3::Y.cross(normal);
        let velocity = horizontal(self.state.velocity);
        if velocity.dot(along).abs() < run.min_speed {
            return false;
        }

        let incidence = angle_between_deg(velocity, normal);
        if (incidence - 90.0).abs() > run.angle_radius {
            return false;
        }

        if let Some(last) = self.state.surfaces.last_wall_run {
            if last.wall.is_some() && last.wall == hit.surface {
                let delta = (self.state.position.y - last.location.y).abs();
                if delta < run.min_height_delta {
                    return false;
                }
            }
        }

        true
    }

    /// Wall the character is pushing into, for climbing onto or jumping off.
    pub(super) fn facing_wall(&self, hit: &TraceHit, max_angle: f32) -> bool {
        if !hit.is_wall(WALL_MAX_NORMAL_Y) {
            return false;
        }
        let wish = input_to_world(self.input.move_input, self.input.view_yaw);
        let into_wall = -horizontal(hit.normal);
        angle_between_deg(wish, into_wall) <= max_angle && wish.length_squared() > 0.0
    }

    /// Short sweep toward the view direction looking for a wall to jump off.
    pub(super) fn find_wall(&self, world: &dyn CollisionQuery) -> Option<TraceHit> {
        let hull = self.hull();
        let start = self.state.position;
        let reach = self.config.wall_jump.reach;
        let forward = forward_from_yaw(self.input.view_yaw);
        let right = right_from_yaw(self.input.view_yaw);

        [forward, right, -right, -forward]
            .into_iter()
            .map(|direction| world.sweep(start, start + direction * reach, hull))
            .find(|hit| !hit.start_penetrating && hit.is_wall(WALL_MAX_NORMAL_Y))
    }

    /// Wall search, ledge surface search, then climb-space clearance. Only a
    /// target that passes all three is returned.
    pub fn check_if_safe_to_mantle_ledge(&self, world: &dyn CollisionQuery) -> Option<ClimbTarget> {
        let mantle = &self.config.mantle;
        if !mantle.enabled || self.capsule.is_none() {
            return None;
        }

        let hull = self.hull();
        let standing = self.standing_hull();
        let position = self.state.position;
        let feet = self.feet();

        let forward = match self.state.locomotion {
            Locomotion::WallClimbing(climb) => -horizontal(climb.wall_normal).normalize_or_zero(),
            _ => forward_from_yaw(self.state.facing_yaw),
        };
        let max_height = match self.state.locomotion {
            Locomotion::WallClimbing(_) => mantle.ledge_climb_max_height,
            _ => mantle.max_height,
        };

        let wall = world.sweep(position, position + forward * mantle.reach, hull);
        if !wall.blocking_hit || wall.start_penetrating || !wall.is_wall(WALL_MAX_NORMAL_Y) {
            return None;
        }
        let wall_normal = horizontal(wall.normal).normalize_or_zero();

        let column = wall.impact_point - wall_normal * mantle.ledge_inset;
        let top = Vec3::new(column.x, feet + max_height + LEDGE_SEARCH_MARGIN, column.z);
        let bottom = Vec3::new(column.x, feet + mantle.min_height, column.z);
        let ledge = world.line_trace(top, bottom);
        if !ledge.blocking_hit
            || ledge.start_penetrating
            || !ledge.is_walkable(self.config.walkable_floor_y)
        {
            return None;
        }

        let height = ledge.location.y - feet;
        if height < mantle.min_height || height > max_height {
            return None;
        }

        let floor_gap = (MIN_FLOOR_DIST + MAX_FLOOR_DIST) * 0.5;
        let location = snap_target_to_grid(Vec3::new(
            ledge.location.x,
            ledge.location.y + standing.half_height() + floor_gap,
            ledge.location.z,
        ));

        let rise = Vec3::new(position.x, location.y, position.z);
        if world.sweep(position, rise, hull).blocking_hit {
            return None;
        }
        if world.sweep(rise, location, standing).blocking_hit {
            return None;
        }
        if world.overlaps(location, standing) {
            return None;
        }

        let grounded = self.state.mode().is_grounded();
        let kind = if grounded && height <= mantle.fast_max_height {
            ClimbKind::Fast
        } else if !grounded || height >= mantle.slow_min_height {
            ClimbKind::Slow
        } else {
            ClimbKind::Normal
        };

        Some(ClimbTarget {
            location,
            ledge_point: ledge.location,
            wall_normal,
            height,
            kind,
        })
    }

    pub(super) fn wants_to_mantle(&self) -> bool {
        let delay = self.config.mantle.retrigger_delay;
        self.input.has(InputIntents::MANTLE)
            && self.state.timers.last_mantle_time + delay <= self.state.time
    }
}
