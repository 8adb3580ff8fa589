use glam::{Vec2, Vec3};

use crate::collision::{CollisionQuery, Hull};
use crate::error::MovementError;
use crate::math::{self, is_finite_vec};

use super::{
    AirStrafeWindow, Capsule, ClimbState, CustomMode, FallingState, InputIntents, Locomotion,
    MIN_TICK_TIME, ModeObserver, MovementConfig, MovementMode, MovementState, PlayerInput,
    StatusTags, VelocityStrategy, compose_velocity,
};

/// Character movement: owns the movement state and timers, runs the mode
/// machine and the per-mode steppers once per move.
pub struct MovementComponent {
    pub(super) config: MovementConfig,
    pub(super) capsule: Option<Capsule>,
    pub(super) state: MovementState,
    pub(super) input: PlayerInput,
    pub(super) observer: Option<Box<dyn ModeObserver>>,
}

impl Default for MovementComponent {
    fn default() -> Self {
        Self::new(MovementConfig::default())
    }
}

impl std::fmt::Debug for MovementComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MovementComponent")
            .field("capsule", &self.capsule)
            .field("state", &self.state)
            .field("input", &self.input)
            .finish_non_exhaustive()
    }
}

impl MovementComponent {
    pub fn new(config: MovementConfig) -> Self {
        let capsule = Capsule::new(config.capsule_radius, config.capsule_half_height);
        let state = MovementState {
            max_walk_speed: config.max_walk_speed,
            ..Default::default()
        };
        Self {
            config,
            capsule: Some(capsule),
            state,
            input: PlayerInput::default(),
            observer: None,
        }
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    pub fn capsule(&self) -> Option<Capsule> {
        self.capsule
    }

    pub fn attach_capsule(&mut self, capsule: Capsule) {
        self.capsule = Some(capsule);
    }

    pub fn detach_capsule(&mut self) -> Option<Capsule> {
        self.capsule.take()
    }

    pub fn set_observer(&mut self, observer: Box<dyn ModeObserver>) {
        self.observer = Some(observer);
    }

    pub fn state(&self) -> &MovementState {
        &self.state
    }

    pub fn snapshot(&self) -> MovementState {
        self.state.clone()
    }

    /// Rewinds to a snapshot without running any mode hooks.
    pub fn restore_state(&mut self, state: MovementState) {
        self.state = state;
    }

    /// Places the character and picks Walking or Falling from what is below.
    pub fn spawn(&mut self, world: &dyn CollisionQuery, position: Vec3) {
        self.state = MovementState {
            max_walk_speed: self.state.max_walk_speed,
            status: self.state.status,
            ..MovementState::at(position)
        };
        match self.find_floor(world) {
            Some(floor) => {
                self.snap_to_floor(&floor);
                self.state.locomotion = Locomotion::Walking;
            }
            None => {
                self.state.locomotion = Locomotion::falling();
                self.state.fall_origin = Some(position);
            }
        }
        log::debug!(
            "spawned at {} in {:?}",
            self.state.position,
            self.state.mode()
        );
    }

    pub fn position(&self) -> Vec3 {
        self.state.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.state.velocity
    }

    pub fn movement_mode(&self) -> MovementMode {
        self.state.mode()
    }

    pub fn custom_movement_mode(&self) -> Option<CustomMode> {
        self.state.mode().custom()
    }

    pub fn is_crouching(&self) -> bool {
        self.state.crouched
    }

    pub fn last_wall_jump_location(&self) -> Option<Vec3> {
        self.state.surfaces.last_wall_jump.map(|contact| contact.location)
    }

    pub fn last_wall_jump_normal(&self) -> Option<Vec3> {
        self.state.surfaces.last_wall_jump.map(|contact| contact.normal)
    }

    pub fn last_wall_run_location(&self) -> Option<Vec3> {
        self.state.surfaces.last_wall_run.map(|contact| contact.location)
    }

    pub fn last_wall_run_normal(&self) -> Option<Vec3> {
        self.state.surfaces.last_wall_run.map(|contact| contact.normal)
    }

    pub fn last_ledge_climb_location(&self) -> Option<Vec3> {
        self.state
            .surfaces
            .last_ledge_climb
            .map(|contact| contact.location)
    }

    pub fn last_ledge_climb_normal(&self) -> Option<Vec3> {
        self.state.surfaces.last_ledge_climb.map(|contact| contact.normal)
    }

    pub fn max_walk_speed(&self) -> f32 {
        self.state.max_walk_speed
    }

    pub fn set_max_walk_speed(&mut self, speed: f32) {
        if !(speed >= 0.0) {
            log::warn!("ignoring invalid max walk speed {speed}");
            return;
        }
        self.state.max_walk_speed = speed;
    }

    pub fn player_input(&self) -> &PlayerInput {
        &self.input
    }

    pub fn set_player_input(&mut self, input: PlayerInput) {
        self.input = input;
    }

    pub fn set_move_input(&mut self, move_input: Vec2) {
        self.input.move_input = move_input;
    }

    pub fn set_view_yaw(&mut self, yaw: f32) {
        self.input.view_yaw = yaw;
    }

    pub fn start_sprint(&mut self) {
        self.input.set(InputIntents::SPRINT, true);
    }

    pub fn stop_sprint(&mut self) {
        self.input.set(InputIntents::SPRINT, false);
    }

    pub fn start_aim(&mut self) {
        self.input.set(InputIntents::AIM, true);
    }

    pub fn stop_aim(&mut self) {
        self.input.set(InputIntents::AIM, false);
    }

    pub fn start_wall_jump(&mut self) {
        self.input.set(InputIntents::WALL_JUMP, true);
    }

    pub fn stop_wall_jump(&mut self) {
        self.input.set(InputIntents::WALL_JUMP, false);
    }

    pub fn start_mantle(&mut self) {
        self.input.set(InputIntents::MANTLE, true);
    }

    pub fn stop_mantle(&mut self) {
        self.input.set(InputIntents::MANTLE, false);
    }

    pub fn start_jump(&mut self) {
        self.input.set(InputIntents::JUMP, true);
    }

    pub fn stop_jump(&mut self) {
        self.input.set(InputIntents::JUMP, false);
    }

    pub fn start_crouch(&mut self) {
        self.input.set(InputIntents::CROUCH, true);
    }

    pub fn stop_crouch(&mut self) {
        self.input.set(InputIntents::CROUCH, false);
    }

    pub fn status(&self) -> StatusTags {
        self.state.status
    }

    pub fn set_status(&mut self, status: StatusTags) {
        self.state.status = status;
    }

    /// Speed cap for ground movement after crouch, sprint and aim modifiers.
    pub fn max_speed(&self) -> f32 {
        if self.state.crouched {
            return self.config.max_walk_speed_crouched;
        }

        let mut speed = self.state.max_walk_speed;
        if self.input.has(InputIntents::AIM) {
            speed *= self.config.aim_speed_multiplier;
        } else if self.input.has(InputIntents::SPRINT)
            && !self.state.status.contains(StatusTags::ATTACKING)
        {
            speed *= self.config.sprint_speed_multiplier;
        }
        speed
    }

    pub(super) fn hull(&self) -> Hull {
        let capsule = self.capsule.unwrap_or(Capsule::new(
            self.config.capsule_radius,
            self.config.capsule_half_height,
        ));
        let half_height = if self.state.crouched {
            self.config.crouched_half_height.min(capsule.half_height)
        } else {
            capsule.half_height
        };
        Hull::capsule(capsule.radius, half_height)
    }

    pub(super) fn standing_hull(&self) -> Hull {
        self.capsule
            .map(|capsule| capsule.hull())
            .unwrap_or(Hull::capsule(
                self.config.capsule_radius,
                self.config.capsule_half_height,
            ))
    }

    pub(super) fn feet(&self) -> f32 {
        self.state.position.y - self.hull().half_height()
    }

    /// Runs one move with the component's current input and the timestamp
    /// already in the state.
    pub fn perform_movement(
        &mut self,
        world: &dyn CollisionQuery,
        dt: f32,
    ) -> Result<(), MovementError> {
        if self.capsule.is_none() {
            let err = MovementError::MissingCapsule;
            log::error!("{err}");
            return Err(err);
        }
        if !dt.is_finite() || dt < MIN_TICK_TIME {
            let err = MovementError::InvalidDeltaTime(dt);
            log::warn!("{err}");
            return Err(err);
        }

        let prior = self.state.clone();

        if !self.state.rotation_locked {
            self.state.facing_yaw = self.input.view_yaw;
        }
        self.refresh_acceleration();
        self.update_crouch(world);
        self.check_jump_input(world);
        self.evaluate_mode_predicates(world);
        self.start_new_physics(world, dt, 0);

        self.state.time += dt;
        self.state.jump_latched = self.input.has(InputIntents::JUMP);
        self.state.wall_jump_latched = self.input.has(InputIntents::WALL_JUMP);

        if !is_finite_vec(self.state.position) || !is_finite_vec(self.state.velocity) {
            let err = MovementError::NonFiniteState {
                mode: self.state.mode(),
                position: self.state.position,
                velocity: self.state.velocity,
            };
            log::error!("{err}, restoring previous state");
            self.state = prior;
            return Err(err);
        }

        Ok(())
    }

    /// Simulates a move exactly as recorded: input and start time come from
    /// the caller so client and server produce the same result.
    pub fn move_autonomous(
        &mut self,
        world: &dyn CollisionQuery,
        timestamp: f32,
        dt: f32,
        input: PlayerInput,
    ) -> Result<(), MovementError> {
        self.input = input;
        self.state.time = timestamp;
        self.perform_movement(world, dt)
    }

    pub(super) fn refresh_acceleration(&mut self) {
        if self.state.status.intersects(StatusTags::STUNNED | StatusTags::ROOTED) {
            self.state.acceleration = Vec3::ZERO;
            return;
        }
        self.state.acceleration = math::input_to_world(self.input.move_input, self.input.view_yaw)
            * self.config.max_acceleration;
    }

    pub(super) fn jump_requested(&self) -> bool {
        self.input.has(InputIntents::JUMP) && !self.state.jump_latched
    }

    /// A fresh wall-jump or jump press. Holding either kicks off one wall only.
    pub(super) fn wall_jump_requested(&self) -> bool {
        (self.input.has(InputIntents::WALL_JUMP) && !self.state.wall_jump_latched)
            || self.jump_requested()
    }

    pub(super) fn consume_jump_inputs(&mut self) {
        self.state.jump_latched = self.input.has(InputIntents::JUMP);
        self.state.wall_jump_latched = self.input.has(InputIntents::WALL_JUMP);
    }

    fn update_crouch(&mut self, world: &dyn CollisionQuery) {
        let wants = self.input.has(InputIntents::CROUCH);
        let climbing = self.state.locomotion.climb().is_some();
        if climbing || wants == self.state.crouched {
            return;
        }

        let standing = self.standing_hull().half_height();
        let crouched = self.config.crouched_half_height.min(standing);
        let shift = standing - crouched;
        let grounded = self.state.mode().is_grounded();

        if wants {
            self.state.crouched = true;
            if grounded {
                self.state.position.y -= shift;
            }
            return;
        }

        let candidate = if grounded {
            self.state.position + Vec3::Y * shift
        } else {
            self.state.position
        };
        if world.overlaps(candidate, self.standing_hull()) {
            let err = MovementError::Encroached {
                position: candidate,
            };
            log::warn!("{err}");
            return;
        }
        self.state.crouched = false;
        self.state.position = candidate;
    }

    fn check_jump_input(&mut self, world: &dyn CollisionQuery) {
        if self.state.status.intersects(StatusTags::STUNNED | StatusTags::ROOTED) {
            return;
        }

        match self.state.locomotion {
            Locomotion::Walking | Locomotion::Slide(_) => {
                if !self.jump_requested() {
                    return;
                }
                self.consume_jump_inputs();
                self.state.velocity.y = self.state.velocity.y.max(self.config.jump_z_velocity);
                self.state.timers.last_jump_time = self.state.time;
                self.set_locomotion(Locomotion::Falling(FallingState {
                    jump_force_time_remaining: self.config.jump_max_hold_time,
                    window: AirStrafeWindow::None,
                }));
            }
            Locomotion::Mantling(_) | Locomotion::LedgeClimbing(_) => {
                if self.jump_requested() {
                    self.consume_jump_inputs();
                    self.mantle_jump();
                }
            }
            Locomotion::Falling(_) => {
                if self.input.has(InputIntents::WALL_JUMP) && !self.state.wall_jump_latched {
                    if let Some(hit) = self.find_wall(world) {
                        self.try_wall_jump(hit.normal, hit.impact_point, hit.surface);
                    }
                }
            }
            Locomotion::WallClimbing(_) | Locomotion::WallRunning(_) => {}
        }
    }

    fn mantle_jump(&mut self) {
        let forward = math::forward_from_yaw(self.input.view_yaw);
        let speed = self.state.horizontal_speed().max(self.state.max_walk_speed * 0.5);
        self.state.velocity = forward * speed + Vec3::Y * self.config.mantle.jump_z_velocity;
        self.state.timers.last_jump_time = self.state.time;
        self.set_locomotion(Locomotion::Falling(FallingState {
            jump_force_time_remaining: 0.0,
            window: AirStrafeWindow::Lurch {
                start: self.state.time,
                locked_direction: forward,
            },
        }));
    }

    fn evaluate_mode_predicates(&mut self, world: &dyn CollisionQuery) {
        match self.state.locomotion {
            Locomotion::Walking => {
                if self.can_slide() {
                    self.set_locomotion(Locomotion::Slide(super::SlideState {
                        start_time: self.state.time,
                    }));
                    return;
                }
                if self.wants_to_mantle() {
                    if let Some(target) = self.check_if_safe_to_mantle_ledge(world) {
                        self.begin_climb(target);
                    }
                }
            }
            Locomotion::Falling(_) => {
                if self.wants_to_mantle() {
                    if let Some(target) = self.check_if_safe_to_mantle_ledge(world) {
                        self.begin_climb(target);
                    }
                }
            }
            _ => {}
        }
    }

    /// Picks the velocity blend for the active mode and applies it.
    pub(super) fn calc_velocity(&mut self, dt: f32) {
        let strategy = match self.state.locomotion {
            Locomotion::Slide(_) => VelocityStrategy::Slide {
                floor_normal: self.state.floor.map_or(Vec3::Y, |floor| floor.normal),
            },
            Locomotion::Falling(falling) => match falling.window {
                AirStrafeWindow::Sway { start }
                    if self.state.time - start < self.config.air_strafe.sway_duration =>
                {
                    VelocityStrategy::Sway
                }
                AirStrafeWindow::Lurch {
                    start,
                    locked_direction,
                } if self.state.time - start < self.config.air_strafe.lurch_duration => {
                    VelocityStrategy::Lurch {
                        elapsed: self.state.time - start,
                        locked_direction,
                    }
                }
                _ => VelocityStrategy::AirStrafe,
            },
            _ => VelocityStrategy::Ground,
        };

        self.state.velocity = compose_velocity(
            &self.config,
            strategy,
            self.state.velocity,
            self.state.acceleration,
            self.max_speed(),
            dt,
        );
    }

    /// Climb targets in flight as `(ledge, mantle)`.
    pub fn climb_targets(&self) -> (Option<Vec3>, Option<Vec3>) {
        match &self.state.locomotion {
            Locomotion::LedgeClimbing(climb) => (Some(climb.target.location), None),
            Locomotion::Mantling(climb) => (None, Some(climb.target.location)),
            _ => (None, None),
        }
    }

    /// Replaces the target of the climb in flight with one supplied from
    /// outside, after checking the hull fits there.
    pub fn adopt_climb_target(
        &mut self,
        world: &dyn CollisionQuery,
        mode: CustomMode,
        location: Vec3,
    ) -> bool {
        let climb = match (&self.state.locomotion, mode) {
            (Locomotion::Mantling(climb), CustomMode::Mantling)
            | (Locomotion::LedgeClimbing(climb), CustomMode::LedgeClimbing) => *climb,
            _ => return false,
        };

        if (climb.target.location - location).length() <= self.config.mantle.tolerance {
            return true;
        }
        if world.overlaps(location, self.standing_hull()) {
            log::warn!("rejecting climb target {location}: hull does not fit");
            return false;
        }

        let mut target = climb.target;
        target.location = location;
        let replanned = ClimbState::new(self.state.position, target, climb.speed);
        self.state.locomotion = match mode {
            CustomMode::Mantling => Locomotion::Mantling(replanned),
            _ => Locomotion::LedgeClimbing(replanned),
        };
        true
    }

    /// Overwrites the simulated state with an authoritative one. The mode
    /// change runs through the transition manager before the kinematics are
    /// written.
    pub fn apply_server_state(
        &mut self,
        position: Vec3,
        velocity: Vec3,
        locomotion: Locomotion,
        crouched: bool,
    ) {
        self.set_locomotion(locomotion);
        self.state.position = position;
        self.state.velocity = velocity;
        self.state.crouched = crouched;
    }
}
