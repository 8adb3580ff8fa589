use glam::Vec3;

use crate::math::horizontal;

use super::{
    ClimbKind, ClimbState, ClimbTarget, Locomotion, MovementComponent, MovementMode,
    SurfaceContact,
};

impl MovementComponent {
    /// Switches locomotion. Staying in the same mode only swaps the mode's
    /// data; a real change runs the exit, entry and reset hooks once each.
    pub fn set_locomotion(&mut self, next: Locomotion) {
        let previous = self.state.locomotion;
        self.state.locomotion = next;
        if previous.mode() != next.mode() {
            self.on_movement_mode_changed(previous);
        }
    }

    fn on_movement_mode_changed(&mut self, previous: Locomotion) {
        let current = self.state.mode();

        self.exit_mode(&previous);
        self.enter_mode();

        self.reset_wall_jump_information();
        self.reset_wall_climb_information();
        self.reset_wall_run_information();
        self.reset_falling_state_information();
        self.reset_ground_state_information();

        log::debug!(
            "movement mode {:?} -> {:?} at {}",
            previous.mode(),
            current,
            self.state.position
        );
        if let Some(observer) = self.observer.as_mut() {
            observer.on_mode_changed(previous.mode(), current);
        }
    }

    fn exit_mode(&mut self, previous: &Locomotion) {
        let time = self.state.time;
        match previous {
            Locomotion::Slide(_) => {
                self.state.timers.prev_slide_time = time;
                self.state.rotation_locked = false;
            }
            Locomotion::WallClimbing(_) => {
                self.state.rotation_locked = false;
            }
            Locomotion::WallRunning(run) => {
                self.state.surfaces.last_wall_run = Some(SurfaceContact {
                    location: self.state.position,
                    normal: run.wall_normal,
                    wall: run.wall,
                });
            }
            Locomotion::Mantling(_) | Locomotion::LedgeClimbing(_) => {
                self.state.timers.last_mantle_time = time;
                self.state.collision_enabled = true;
                self.state.rotation_locked = false;
            }
            Locomotion::Walking | Locomotion::Falling(_) => {}
        }

        if let Some(observer) = self.observer.as_mut() {
            observer.on_exit(previous.mode());
        }
    }

    fn enter_mode(&mut self) {
        match self.state.locomotion {
            Locomotion::Walking => {
                self.state.velocity.y = 0.0;
            }
            Locomotion::Falling(_) => {
                self.state.fall_origin = Some(self.state.position);
                self.state.floor = None;
            }
            Locomotion::Slide(_) => {
                let slide = &self.config.slide;
                let planar = horizontal(self.state.velocity);
                let speed = planar.length();
                if speed < slide.max_boost_speed {
                    let boosted = (speed + slide.enter_boost).min(slide.max_boost_speed);
                    self.state.velocity += planar.normalize_or_zero() * (boosted - speed);
                }
                self.state.rotation_locked = true;
            }
            Locomotion::WallClimbing(_) => {
                self.state.velocity = Vec3::Y * self.state.velocity.y.max(0.0);
                self.state.rotation_locked = true;
            }
            Locomotion::WallRunning(_) => {
                self.state.velocity.y = self.state.velocity.y.max(0.0);
            }
            Locomotion::Mantling(_) => {
                self.state.collision_enabled = false;
                self.state.velocity = Vec3::ZERO;
                self.state.rotation_locked = true;
            }
            Locomotion::LedgeClimbing(climb) => {
                self.state.collision_enabled = false;
                self.state.velocity = Vec3::ZERO;
                self.state.rotation_locked = true;
                self.state.surfaces.last_ledge_climb = Some(SurfaceContact {
                    location: climb.target.ledge_point,
                    normal: climb.target.wall_normal,
                    wall: None,
                });
            }
        }

        if let Some(observer) = self.observer.as_mut() {
            observer.on_enter(self.state.mode());
        }
    }

    fn reset_wall_jump_information(&mut self) {
        if self.state.mode().is_grounded() {
            self.state.timers.wall_jump_count = 0;
            self.state.surfaces.last_wall_jump = None;
        }
    }

    fn reset_wall_climb_information(&mut self) {
        if self.state.mode().is_grounded() {
            self.state.timers.wall_climb_time_used = 0.0;
        }
    }

    fn reset_wall_run_information(&mut self) {
        if self.state.mode().is_grounded() {
            self.state.surfaces.last_wall_run = None;
        }
    }

    fn reset_falling_state_information(&mut self) {
        if self.state.mode() != MovementMode::Falling {
            self.state.fall_origin = None;
        }
    }

    fn reset_ground_state_information(&mut self) {
        if !self.state.mode().is_grounded() {
            self.state.floor = None;
            self.state.timers.time_on_ground = 0.0;
        }
    }

    /// Starts a mantle, or a ledge climb when the target sits above mantle
    /// reach or the character is hanging on a wall.
    pub(super) fn begin_climb(&mut self, target: ClimbTarget) {
        let mantle = &self.config.mantle;
        let from_wall = matches!(self.state.locomotion, Locomotion::WallClimbing(_));

        if from_wall || target.height > mantle.max_height {
            let climb = ClimbState::new(self.state.position, target, mantle.ledge_climb_speed);
            self.set_locomotion(Locomotion::LedgeClimbing(climb));
            return;
        }

        let speed = match target.kind {
            ClimbKind::Fast => mantle.fast_speed,
            ClimbKind::Normal => mantle.normal_speed,
            ClimbKind::Slow => mantle.slow_speed,
        };
        let climb = ClimbState::new(self.state.position, target, speed);
        self.set_locomotion(Locomotion::Mantling(climb));
    }
}
