use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Latency and loss applied to one direction of a simulated link, in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkConditions {
    pub latency_ticks: u32,
    pub jitter_ticks: u32,
    pub loss_percent: f32,
}

impl Default for LinkConditions {
    fn default() -> Self {
        Self {
            latency_ticks: 3,
            jitter_ticks: 0,
            loss_percent: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub sent: u64,
    pub dropped: u64,
    pub delivered: u64,
}

#[derive(Debug)]
struct DelayedPacket {
    release_tick: u64,
    order: u64,
    bytes: Vec<u8>,
}

impl PartialEq for DelayedPacket {
    fn eq(&self, other: &Self) -> bool {
        self.release_tick == other.release_tick && self.order == other.order
    }
}

impl Eq for DelayedPacket {}

impl PartialOrd for DelayedPacket {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DelayedPacket {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other
            .release_tick
            .cmp(&self.release_tick)
            .then_with(|| other.order.cmp(&self.order))
    }
}

/// One-way lossy link driven by the simulation tick. Seeded so a run can be
/// reproduced exactly.
#[derive(Debug)]
pub struct LinkSimulator {
    conditions: LinkConditions,
    rng: StdRng,
    queue: BinaryHeap<DelayedPacket>,
    next_order: u64,
    stats: LinkStats,
}

impl LinkSimulator {
    pub fn new(conditions: LinkConditions, seed: u64) -> Self {
        Self {
            conditions,
            rng: StdRng::seed_from_u64(seed),
            queue: BinaryHeap::new(),
            next_order: 0,
            stats: LinkStats::default(),
        }
    }

    pub fn conditions(&self) -> LinkConditions {
        self.conditions
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    pub fn in_flight(&self) -> usize {
        self.queue.len()
    }

    fn should_drop(&mut self) -> bool {
        if self.conditions.loss_percent <= 0.0 {
            return false;
        }
        self.rng.gen_range(0.0..100.0) < self.conditions.loss_percent
    }

    fn delay_ticks(&mut self) -> u64 {
        let jitter = if self.conditions.jitter_ticks > 0 {
            self.rng.gen_range(0..=self.conditions.jitter_ticks)
        } else {
            0
        };
        u64::from(self.conditions.latency_ticks + jitter)
    }

    /// Queues `bytes` sent at tick `now`. Returns `false` when the packet
    /// was lost.
    pub fn send(&mut self, now: u64, bytes: Vec<u8>) -> bool {
        self.stats.sent += 1;
        if self.should_drop() {
            self.stats.dropped += 1;
            log::trace!("link dropped a {} byte packet at tick {now}", bytes.len());
            return false;
        }

        let release_tick = now + self.delay_ticks();
        self.queue.push(DelayedPacket {
            release_tick,
            order: self.next_order,
            bytes,
        });
        self.next_order += 1;
        true
    }

    /// Everything due at or before tick `now`, in release order.
    pub fn receive(&mut self, now: u64) -> Vec<Vec<u8>> {
        let mut packets = Vec::new();
        while self
            .queue
            .peek()
            .is_some_and(|delayed| delayed.release_tick <= now)
        {
            if let Some(delayed) = self.queue.pop() {
                packets.push(delayed.bytes);
            }
        }
        self.stats.delivered += packets.len() as u64;
        packets
    }
}
