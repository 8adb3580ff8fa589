use crate::collision::CollisionQuery;
use crate::movement::{MIN_TICK_TIME, MovementComponent};

use super::{MoveCorrection, NetConfig, NetworkMoveData, Payload};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerMoveStats {
    pub processed: u64,
    pub stale: u64,
    pub rejected: u64,
    pub corrections: u64,
}

/// Authoritative side of move replication for one character.
#[derive(Debug)]
pub struct ServerMoveHandler {
    component: MovementComponent,
    config: NetConfig,
    last_timestamp: Option<f32>,
    stats: ServerMoveStats,
}

impl ServerMoveHandler {
    pub fn new(component: MovementComponent, config: NetConfig) -> Self {
        Self {
            component,
            config,
            last_timestamp: None,
            stats: ServerMoveStats::default(),
        }
    }

    pub fn component(&self) -> &MovementComponent {
        &self.component
    }

    pub fn component_mut(&mut self) -> &mut MovementComponent {
        &mut self.component
    }

    pub fn stats(&self) -> ServerMoveStats {
        self.stats
    }

    pub fn last_timestamp(&self) -> Option<f32> {
        self.last_timestamp
    }

    /// Runs a batch from one `ServerMove`, oldest first, and answers for the
    /// newest move that was simulated.
    pub fn handle_moves(
        &mut self,
        world: &dyn CollisionQuery,
        moves: &[NetworkMoveData],
    ) -> Option<Payload> {
        moves
            .iter()
            .filter_map(|data| self.handle_move(world, data))
            .last()
    }

    pub fn handle_move(
        &mut self,
        world: &dyn CollisionQuery,
        data: &NetworkMoveData,
    ) -> Option<Payload> {
        if !data.timestamp.is_finite() {
            log::warn!("rejecting move with timestamp {}", data.timestamp);
            self.stats.rejected += 1;
            return None;
        }
        if self.last_timestamp.is_some_and(|last| data.timestamp <= last) {
            log::debug!("skipping stale move at {:.3}", data.timestamp);
            self.stats.stale += 1;
            return None;
        }
        if !data.delta_time.is_finite()
            || data.delta_time < MIN_TICK_TIME
            || data.delta_time > self.config.max_move_delta
        {
            log::warn!(
                "rejecting move at {:.3} with delta time {}",
                data.timestamp,
                data.delta_time
            );
            self.stats.rejected += 1;
            return None;
        }

        self.adopt_client_target(world, data);
        let was_climbing = self.component.state().locomotion.climb().is_some();
        let result =
            self.component
                .move_autonomous(world, data.timestamp, data.delta_time, data.player_input());
        self.last_timestamp = Some(data.timestamp);
        self.stats.processed += 1;

        if let Err(err) = result {
            log::warn!("move at {:.3} failed: {err}", data.timestamp);
            return Some(self.correction(data.timestamp));
        }
        if !was_climbing {
            self.adopt_client_target(world, data);
        }

        let error = (self.component.position() - data.client_location()).length();
        let mode_matches = data.client_mode() == Some(self.component.movement_mode());
        if error > self.config.max_position_error || !mode_matches {
            log::debug!(
                "correcting move at {:.3}: error {error:.4}, client {:?}, server {:?}",
                data.timestamp,
                data.client_mode(),
                self.component.movement_mode()
            );
            return Some(self.correction(data.timestamp));
        }
        Some(Payload::MoveAck {
            timestamp: data.timestamp,
        })
    }

    fn adopt_client_target(&mut self, world: &dyn CollisionQuery, data: &NetworkMoveData) {
        let Some((mode, target)) = data.climb_target() else {
            return;
        };
        if self.component.custom_movement_mode() != Some(mode) {
            return;
        }
        if !self.component.adopt_climb_target(world, mode, target) {
            log::debug!("client {mode:?} target {target} failed the clearance check");
        }
    }

    fn correction(&mut self, timestamp: f32) -> Payload {
        self.stats.corrections += 1;
        Payload::MoveCorrection(MoveCorrection::capture(
            timestamp,
            self.component.state(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};

    use super::*;
    use crate::collision::CollisionWorld;
    use crate::movement::{MovementMode, PlayerInput};
    use crate::net::SavedMove;

    const DT: f32 = 1.0 / 60.0;

    fn world() -> CollisionWorld {
        let mut world = CollisionWorld::new();
        world.add_ground(0.0, 50.0);
        world
    }

    fn spawned(world: &CollisionWorld) -> MovementComponent {
        let mut component = MovementComponent::default();
        component.spawn(world, Vec3::new(0.0, 1.0, 0.0));
        component
    }

    fn client_move(client: &mut MovementComponent, world: &CollisionWorld) -> NetworkMoveData {
        let input = PlayerInput::new(Vec2::new(0.2, 1.0), 0.1);
        let mut saved = SavedMove::set_move_for(client, DT, input);
        client
            .move_autonomous(world, saved.timestamp, saved.delta_time, saved.input)
            .expect("valid move");
        saved.post_update(client);
        saved.to_move_data()
    }

    #[test]
    fn matching_prediction_is_acknowledged() {
        let world = world();
        let mut client = spawned(&world);
        let mut server = ServerMoveHandler::new(spawned(&world), NetConfig::default());

        for _ in 0..10 {
            let data = client_move(&mut client, &world);
            let reply = server.handle_move(&world, &data);
            assert_eq!(
                reply,
                Some(Payload::MoveAck {
                    timestamp: data.timestamp
                })
            );
        }
        assert_eq!(server.component().position(), client.position());
        assert_eq!(server.stats().corrections, 0);
    }

    #[test]
    fn drifted_client_gets_a_correction() {
        let world = world();
        let mut client = spawned(&world);
        let mut server = ServerMoveHandler::new(spawned(&world), NetConfig::default());

        let mut data = client_move(&mut client, &world);
        data.client_location[0] += 0.5;
        let Some(Payload::MoveCorrection(correction)) = server.handle_move(&world, &data) else {
            panic!("expected a correction");
        };
        assert_eq!(correction.timestamp, data.timestamp);
        assert_eq!(correction.location(), server.component().position());
        assert_eq!(correction.mode(), Some(MovementMode::Walking));
    }

    #[test]
    fn redundant_and_invalid_moves_are_skipped() {
        let world = world();
        let mut client = spawned(&world);
        let mut server = ServerMoveHandler::new(spawned(&world), NetConfig::default());

        let first = client_move(&mut client, &world);
        let second = client_move(&mut client, &world);
        assert!(server.handle_moves(&world, &[first]).is_some());
        let reply = server.handle_moves(&world, &[first, second]);
        assert_eq!(
            reply,
            Some(Payload::MoveAck {
                timestamp: second.timestamp
            })
        );
        assert_eq!(server.stats().stale, 1);

        let mut oversized = client_move(&mut client, &world);
        oversized.delta_time = 1.0;
        assert_eq!(server.handle_move(&world, &oversized), None);
        assert_eq!(server.stats().rejected, 1);
        assert_eq!(server.last_timestamp(), Some(second.timestamp));
    }
}
