use glam::Vec3;

use crate::collision::CollisionQuery;
use crate::movement::{
    CustomMode, MovementComponent, MovementMode, MovementState, PlayerInput, StatusTags,
};

use super::{CompressedFlags, NetworkMoveData, dequantize_target, quantize_target};

/// One client tick kept for replay until the server acknowledges it.
#[derive(Debug, Clone)]
pub struct SavedMove {
    pub timestamp: f32,
    pub delta_time: f32,
    /// Already quantized to what the server decodes.
    pub input: PlayerInput,
    pub start_state: MovementState,
    pub end_location: Vec3,
    pub end_velocity: Vec3,
    pub end_mode: MovementMode,
    pub ledge_target: Option<[i32; 3]>,
    pub mantle_target: Option<[i32; 3]>,
    /// Gameplay settings in force when the move was made. Replays run under
    /// these, not whatever is set when the correction arrives.
    pub max_walk_speed: f32,
    pub status: StatusTags,
}

impl SavedMove {
    /// Records the start of a move about to be simulated on `component`.
    pub fn set_move_for(
        component: &MovementComponent,
        delta_time: f32,
        input: PlayerInput,
    ) -> Self {
        let start_state = component.snapshot();
        let (ledge, mantle) = component.climb_targets();
        Self {
            timestamp: start_state.time,
            delta_time,
            input: input.quantized(),
            end_location: start_state.position,
            end_velocity: start_state.velocity,
            end_mode: start_state.mode(),
            max_walk_speed: start_state.max_walk_speed,
            status: start_state.status,
            start_state,
            ledge_target: ledge.map(quantize_target),
            mantle_target: mantle.map(quantize_target),
        }
    }

    pub fn start_mode(&self) -> MovementMode {
        self.start_state.mode()
    }

    /// Captures where the move ended.
    pub fn post_update(&mut self, component: &MovementComponent) {
        let (ledge, mantle) = component.climb_targets();
        self.end_location = component.position();
        self.end_velocity = component.velocity();
        self.end_mode = component.movement_mode();
        self.ledge_target = ledge.map(quantize_target);
        self.mantle_target = mantle.map(quantize_target);
    }

    pub fn compressed_flags(&self) -> CompressedFlags {
        CompressedFlags::from_intents(self.input.intents)
    }

    /// Whether `newer` can be folded into this move: identical wire input and
    /// targets, no mode change, and the merged delta stays in bounds.
    pub fn can_combine_with(&self, newer: &SavedMove, max_combined_delta: f32) -> bool {
        if self.start_mode() != self.end_mode || newer.start_mode() != self.end_mode {
            return false;
        }
        if self.delta_time + newer.delta_time > max_combined_delta {
            return false;
        }

        self.input.encode_move_input() == newer.input.encode_move_input()
            && self.input.encode_view_yaw() == newer.input.encode_view_yaw()
            && self.compressed_flags() == newer.compressed_flags()
            && self.ledge_target == newer.ledge_target
            && self.mantle_target == newer.mantle_target
            && self.max_walk_speed == newer.max_walk_speed
            && self.status == newer.status
    }

    /// Extends this move by `newer`. The caller rewinds the component to
    /// `start_state` and simulates the merged delta.
    pub fn combine_with(&mut self, newer: SavedMove) {
        self.delta_time += newer.delta_time;
        self.input = newer.input;
    }

    /// Restores input, gameplay settings and any in-flight climb target
    /// before a replay.
    pub fn prep_move_for(&self, component: &mut MovementComponent, world: &dyn CollisionQuery) {
        component.set_player_input(self.input);
        component.set_max_walk_speed(self.max_walk_speed);
        component.set_status(self.status);

        let recorded = match (self.ledge_target, self.mantle_target) {
            (Some(ledge), _) => Some((CustomMode::LedgeClimbing, ledge)),
            (None, Some(mantle)) => Some((CustomMode::Mantling, mantle)),
            (None, None) => None,
        };
        let Some((mode, target)) = recorded else {
            return;
        };
        if component.custom_movement_mode() == Some(mode) {
            component.adopt_climb_target(world, mode, dequantize_target(target));
        }
    }

    pub fn to_move_data(&self) -> NetworkMoveData {
        NetworkMoveData {
            timestamp: self.timestamp,
            delta_time: self.delta_time,
            input_vector: self.input.encode_move_input(),
            view_yaw: self.input.encode_view_yaw(),
            compressed_flags: self.compressed_flags().bits(),
            ledge_target: self.ledge_target,
            mantle_target: self.mantle_target,
            client_location: self.end_location.to_array(),
            client_mode: self.end_mode.to_byte(),
        }
    }
}
