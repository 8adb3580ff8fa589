use std::collections::VecDeque;

use glam::Vec3;

use crate::collision::CollisionQuery;
use crate::error::MovementError;
use crate::movement::{MIN_TICK_TIME, MovementComponent, PlayerInput};

use super::{MoveCorrection, NetConfig, NetworkMoveData, SavedMove};

const ERROR_CORRECTION_SPEED: f32 = 20.0;
const ERROR_THRESHOLD: f32 = 0.0001;
const SNAP_THRESHOLD: f32 = 1.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PredictionStats {
    pub moves_sent: u64,
    pub moves_combined: u64,
    pub moves_dropped: u64,
    pub corrections: u64,
    pub moves_replayed: u64,
}

/// Client side of move replication: simulates locally, keeps every
/// unacknowledged move and replays them on top of server corrections.
pub struct PredictionBuffer {
    config: NetConfig,
    saved_moves: VecDeque<SavedMove>,
    pending_move: Option<SavedMove>,
    last_sent: Option<NetworkMoveData>,
    last_acked_timestamp: Option<f32>,
    prev_position: Vec3,
    current_position: Vec3,
    visual_position: Vec3,
    position_error: Vec3,
    stats: PredictionStats,
}

impl PredictionBuffer {
    pub fn new(config: NetConfig) -> Self {
        Self {
            saved_moves: VecDeque::with_capacity(config.max_saved_moves),
            config,
            pending_move: None,
            last_sent: None,
            last_acked_timestamp: None,
            prev_position: Vec3::ZERO,
            current_position: Vec3::ZERO,
            visual_position: Vec3::ZERO,
            position_error: Vec3::ZERO,
            stats: PredictionStats::default(),
        }
    }

    pub fn config(&self) -> &NetConfig {
        &self.config
    }

    pub fn stats(&self) -> PredictionStats {
        self.stats
    }

    pub fn saved_move_count(&self) -> usize {
        self.saved_moves.len()
    }

    pub fn has_pending_move(&self) -> bool {
        self.pending_move.is_some()
    }

    /// Predicts one tick. Returns the moves to put in a `ServerMove` when a
    /// move was finalized this tick: the new one last, preceded by the
    /// previously sent move for redundancy.
    pub fn tick(
        &mut self,
        component: &mut MovementComponent,
        world: &dyn CollisionQuery,
        input: PlayerInput,
        dt: f32,
    ) -> Result<Option<Vec<NetworkMoveData>>, MovementError> {
        if !dt.is_finite() || dt < MIN_TICK_TIME {
            return Err(MovementError::InvalidDeltaTime(dt));
        }

        self.prev_position = component.position();
        let mut next = SavedMove::set_move_for(component, dt, input);
        let mut outgoing = None;

        if let Some(mut pending) = self.pending_move.take() {
            if self.config.combine_moves
                && pending.can_combine_with(&next, self.config.max_combined_delta)
            {
                component.restore_state(pending.start_state.clone());
                pending.combine_with(next);
                next = pending;
                self.stats.moves_combined += 1;
            } else {
                outgoing = Some(self.send(pending));
            }
        }

        let result = component.move_autonomous(world, next.timestamp, next.delta_time, next.input);
        next.post_update(component);
        self.current_position = component.position();

        if self.config.combine_moves {
            self.pending_move = Some(next);
        } else {
            outgoing = Some(self.send(next));
        }

        result.map(|()| outgoing)
    }

    /// Sends the move held back for combining, if any.
    pub fn flush(&mut self) -> Option<Vec<NetworkMoveData>> {
        let pending = self.pending_move.take()?;
        Some(self.send(pending))
    }

    fn send(&mut self, saved: SavedMove) -> Vec<NetworkMoveData> {
        let data = saved.to_move_data();
        self.saved_moves.push_back(saved);
        while self.saved_moves.len() > self.config.max_saved_moves {
            self.saved_moves.pop_front();
            self.stats.moves_dropped += 1;
            log::warn!("saved move buffer full, dropping the oldest move");
        }
        self.stats.moves_sent += 1;

        let mut moves = Vec::with_capacity(2);
        if let Some(previous) = self.last_sent.replace(data) {
            moves.push(previous);
        }
        moves.push(data);
        moves
    }

    pub fn on_ack(&mut self, timestamp: f32) {
        if self
            .last_acked_timestamp
            .is_some_and(|acked| timestamp <= acked)
        {
            return;
        }
        self.last_acked_timestamp = Some(timestamp);

        while self
            .saved_moves
            .front()
            .is_some_and(|saved| saved.timestamp <= timestamp)
        {
            self.saved_moves.pop_front();
        }
    }

    /// Takes the server's state for the move at `correction.timestamp` and
    /// replays every later move on top of it.
    pub fn on_correction(
        &mut self,
        component: &mut MovementComponent,
        world: &dyn CollisionQuery,
        correction: &MoveCorrection,
    ) -> Result<(), MovementError> {
        if self
            .last_acked_timestamp
            .is_some_and(|acked| correction.timestamp < acked)
        {
            log::debug!("ignoring stale correction for {:.3}", correction.timestamp);
            return Ok(());
        }
        let Some(locomotion) = correction.locomotion() else {
            log::warn!(
                "ignoring correction with unusable mode byte {}",
                correction.mode
            );
            return Ok(());
        };
        self.on_ack(correction.timestamp);

        let before = component.position();
        let max_walk_speed = component.max_walk_speed();
        let status = component.status();
        let base = self
            .saved_moves
            .front()
            .or(self.pending_move.as_ref())
            .map(|saved| saved.start_state.clone());
        if let Some(base) = base {
            component.restore_state(base);
        }
        component.apply_server_state(
            correction.location(),
            correction.velocity(),
            locomotion,
            correction.crouched,
        );

        let mut replayed = 0;
        for saved in self
            .saved_moves
            .iter_mut()
            .chain(self.pending_move.as_mut())
        {
            saved.start_state = component.snapshot();
            saved.prep_move_for(component, world);
            component.move_autonomous(world, saved.timestamp, saved.delta_time, saved.input)?;
            saved.post_update(component);
            replayed += 1;
        }
        component.set_max_walk_speed(max_walk_speed);
        component.set_status(status);
        self.stats.corrections += 1;
        self.stats.moves_replayed += replayed;

        let server_error = component.position() - before;
        let error_magnitude = server_error.length();
        log::debug!(
            "correction at {:.3}: replayed {replayed} moves, error {error_magnitude:.4}",
            correction.timestamp
        );
        self.current_position = component.position();
        if error_magnitude < ERROR_THRESHOLD {
            return Ok(());
        }

        self.prev_position += server_error;
        if error_magnitude > SNAP_THRESHOLD {
            self.position_error = Vec3::ZERO;
        } else {
            // Keep the rendered position continuous and bleed the error off.
            self.position_error -= server_error;
        }
        Ok(())
    }

    pub fn update(&mut self, dt: f32) {
        let decay = (-ERROR_CORRECTION_SPEED * dt).exp();
        self.position_error *= decay;
    }

    pub fn update_visuals(&mut self, alpha: f32) {
        let interpolated = self.prev_position.lerp(self.current_position, alpha);
        self.visual_position = interpolated + self.position_error;
    }

    pub fn predicted_position(&self) -> Vec3 {
        self.visual_position
    }

    pub fn position_error(&self) -> Vec3 {
        self.position_error
    }
}
