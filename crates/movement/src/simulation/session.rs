use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::collision::CollisionWorld;
use crate::error::SessionError;
use crate::movement::{MovementComponent, MovementConfig, PlayerInput};
use crate::net::{
    LinkConditions, LinkSimulator, NetConfig, Packet, PacketHeader, Payload, PredictionBuffer,
    ServerMoveHandler, sequence_greater_than,
};

use super::FixedTimestep;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub tick_rate: u32,
    pub net: NetConfig,
    pub uplink: LinkConditions,
    pub downlink: LinkConditions,
    pub seed: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_rate: crate::net::DEFAULT_TICK_RATE,
            net: NetConfig::default(),
            uplink: LinkConditions::default(),
            downlink: LinkConditions::default(),
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub acks: u64,
    pub corrections: u64,
    pub out_of_order: u64,
    pub bad_packets: u64,
}

/// Last sequence seen from the other side of the link.
#[derive(Debug, Default)]
struct Remote {
    send_sequence: u32,
    received: Option<u32>,
}

impl Remote {
    fn next_header(&mut self) -> PacketHeader {
        let header = PacketHeader::new(self.send_sequence, self.received.unwrap_or_default());
        self.send_sequence = self.send_sequence.wrapping_add(1);
        header
    }

    /// Records `sequence`, returning `false` for a packet older than one
    /// already seen.
    fn accept(&mut self, sequence: u32) -> bool {
        if self
            .received
            .is_some_and(|latest| !sequence_greater_than(sequence, latest))
        {
            return false;
        }
        self.received = Some(sequence);
        true
    }
}

/// A predicting client and its authoritative server joined by two lossy
/// links, all stepped by one fixed timestep.
pub struct Session {
    world: CollisionWorld,
    timestep: FixedTimestep,
    client: MovementComponent,
    prediction: PredictionBuffer,
    server: ServerMoveHandler,
    uplink: LinkSimulator,
    downlink: LinkSimulator,
    client_remote: Remote,
    server_remote: Remote,
    stats: SessionStats,
}

impl Session {
    pub fn new(
        world: CollisionWorld,
        spawn: Vec3,
        movement: MovementConfig,
        config: SessionConfig,
    ) -> Self {
        let mut client = MovementComponent::new(movement.clone());
        client.spawn(&world, spawn);
        let mut server_component = MovementComponent::new(movement);
        server_component.spawn(&world, spawn);

        Self {
            timestep: FixedTimestep::new(config.tick_rate),
            prediction: PredictionBuffer::new(config.net.clone()),
            server: ServerMoveHandler::new(server_component, config.net),
            uplink: LinkSimulator::new(config.uplink, config.seed),
            downlink: LinkSimulator::new(config.downlink, config.seed.wrapping_add(1)),
            client,
            world,
            client_remote: Remote::default(),
            server_remote: Remote::default(),
            stats: SessionStats::default(),
        }
    }

    pub fn world(&self) -> &CollisionWorld {
        &self.world
    }

    pub fn client(&self) -> &MovementComponent {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut MovementComponent {
        &mut self.client
    }

    pub fn server(&self) -> &ServerMoveHandler {
        &self.server
    }

    pub fn prediction(&self) -> &PredictionBuffer {
        &self.prediction
    }

    pub fn uplink(&self) -> &LinkSimulator {
        &self.uplink
    }

    pub fn downlink(&self) -> &LinkSimulator {
        &self.downlink
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn tick(&self) -> u64 {
        self.timestep.tick()
    }

    pub fn dt(&self) -> f32 {
        self.timestep.dt()
    }

    /// Feeds frame time in and runs every tick it covers with `input`.
    pub fn advance(&mut self, frame_time: f32, input: PlayerInput) -> Result<u32, SessionError> {
        self.timestep.accumulate(frame_time);
        let mut ticks_run = 0;
        while self.timestep.should_tick() {
            self.run_tick(input)?;
            self.timestep.consume_tick();
            ticks_run += 1;
        }
        self.prediction.update_visuals(self.timestep.alpha());
        Ok(ticks_run)
    }

    /// Runs exactly one tick on both sides, ignoring accumulated frame time.
    pub fn step(&mut self, input: PlayerInput) -> Result<(), SessionError> {
        self.run_tick(input)?;
        self.timestep.advance_tick();
        self.prediction.update_visuals(1.0);
        Ok(())
    }

    fn run_tick(&mut self, input: PlayerInput) -> Result<(), SessionError> {
        let now = self.timestep.tick();
        let dt = self.timestep.dt();

        self.process_client_network(now)?;
        if let Some(moves) = self
            .prediction
            .tick(&mut self.client, &self.world, input, dt)?
        {
            self.send_moves(now, moves)?;
        }
        self.process_server_network(now)?;

        self.prediction.update(dt);
        Ok(())
    }

    /// Sends the move held back for combining.
    pub fn flush(&mut self) -> Result<(), SessionError> {
        if let Some(moves) = self.prediction.flush() {
            self.send_moves(self.timestep.tick(), moves)?;
        }
        Ok(())
    }

    fn send_moves(
        &mut self,
        now: u64,
        moves: Vec<crate::net::NetworkMoveData>,
    ) -> Result<(), SessionError> {
        let header = self.client_remote.next_header();
        let bytes = Packet::new(header, Payload::ServerMove { moves }).serialize()?;
        self.uplink.send(now, bytes);
        Ok(())
    }

    fn process_client_network(&mut self, now: u64) -> Result<(), SessionError> {
        for bytes in self.downlink.receive(now) {
            let Some(packet) = Self::decode(&bytes, &mut self.client_remote, &mut self.stats)
            else {
                continue;
            };
            self.handle_client_packet(packet)?;
        }
        Ok(())
    }

    fn handle_client_packet(&mut self, packet: Packet) -> Result<(), SessionError> {
        match packet.payload {
            Payload::MoveAck { timestamp } => {
                self.stats.acks += 1;
                self.prediction.on_ack(timestamp);
            }
            Payload::MoveCorrection(correction) => {
                self.stats.corrections += 1;
                self.prediction
                    .on_correction(&mut self.client, &self.world, &correction)?;
            }
            Payload::ServerMove { .. } => {
                log::warn!("client received a ServerMove packet");
            }
        }
        Ok(())
    }

    fn process_server_network(&mut self, now: u64) -> Result<(), SessionError> {
        for bytes in self.uplink.receive(now) {
            let Some(packet) = Self::decode(&bytes, &mut self.server_remote, &mut self.stats)
            else {
                continue;
            };
            let Payload::ServerMove { moves } = packet.payload else {
                log::warn!("server received a non-move packet");
                continue;
            };
            let Some(reply) = self.server.handle_moves(&self.world, &moves) else {
                continue;
            };

            let header = self.server_remote.next_header();
            let bytes = Packet::new(header, reply).serialize()?;
            self.downlink.send(now, bytes);
        }
        Ok(())
    }

    fn decode(bytes: &[u8], remote: &mut Remote, stats: &mut SessionStats) -> Option<Packet> {
        let packet = match Packet::deserialize(bytes) {
            Ok(packet) => packet,
            Err(err) => {
                log::warn!("dropping packet: {err}");
                stats.bad_packets += 1;
                return None;
            }
        };
        if !remote.accept(packet.header.sequence) {
            log::trace!("dropping out of order packet {}", packet.header.sequence);
            stats.out_of_order += 1;
            return None;
        }
        Some(packet)
    }
}
