use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceId(pub u32);

/// Axis-aligned box hull swept through the world. The character capsule is
/// approximated by its bounding box so floor and wall contacts stay flat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hull {
    pub half_extents: Vec3,
}

impl Hull {
    pub fn new(half_extents: Vec3) -> Self {
        Self { half_extents }
    }

    pub fn capsule(radius: f32, half_height: f32) -> Self {
        Self::new(Vec3::new(radius, half_height, radius))
    }

    /// Distance from the hull center to its support point along `normal`.
    pub fn support(&self, normal: Vec3) -> f32 {
        self.half_extents.x * normal.x.abs()
            + self.half_extents.y * normal.y.abs()
            + self.half_extents.z * normal.z.abs()
    }

    pub fn half_height(&self) -> f32 {
        self.half_extents.y
    }
}

/// Result of sweeping a hull from `start` toward `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceHit {
    pub blocking_hit: bool,
    /// The sweep began inside solid geometry.
    pub start_penetrating: bool,
    /// Fraction of the requested move that was completed, in `[0, 1]`.
    pub time: f32,
    /// Hull center where the sweep stopped.
    pub location: Vec3,
    /// Point on the blocking surface.
    pub impact_point: Vec3,
    pub normal: Vec3,
    /// How deep the start position sits inside the blocking collider.
    pub penetration_depth: f32,
    pub surface: Option<SurfaceId>,
    pub start: Vec3,
    pub end: Vec3,
}

impl TraceHit {
    pub fn miss(start: Vec3, end: Vec3) -> Self {
        Self {
            blocking_hit: false,
            start_penetrating: false,
            time: 1.0,
            location: end,
            impact_point: end,
            normal: Vec3::ZERO,
            penetration_depth: 0.0,
            surface: None,
            start,
            end,
        }
    }

    pub fn is_walkable(&self, walkable_floor_y: f32) -> bool {
        self.blocking_hit && self.normal.y >= walkable_floor_y
    }

    /// A surface steep enough to climb, run along or jump off.
    pub fn is_wall(&self, max_normal_y: f32) -> bool {
        self.blocking_hit && self.normal.y.abs() <= max_normal_y
    }

    pub fn distance(&self) -> f32 {
        (self.end - self.start).length() * self.time
    }
}
