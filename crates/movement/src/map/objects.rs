use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::collision::{CollisionWorld, SurfaceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapObjectKind {
    Ground,
    StaticBox,
    /// Slope rising along +X.
    Ramp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapObject {
    pub kind: MapObjectKind,
    pub position: Vec3,
    pub half_extents: Vec3,
}

impl MapObject {
    /// Flat ground whose walkable top sits at `position.y`.
    pub fn ground(position: Vec3, half_size: f32) -> Self {
        Self {
            kind: MapObjectKind::Ground,
            position,
            half_extents: Vec3::new(half_size, 0.5, half_size),
        }
    }

    pub fn static_box(position: Vec3, half_extents: Vec3) -> Self {
        Self {
            kind: MapObjectKind::StaticBox,
            position,
            half_extents,
        }
    }

    pub fn ramp(position: Vec3, half_extents: Vec3) -> Self {
        Self {
            kind: MapObjectKind::Ramp,
            position,
            half_extents,
        }
    }

    /// Height of the highest walkable point.
    pub fn top(&self) -> f32 {
        match self.kind {
            MapObjectKind::Ground => self.position.y,
            MapObjectKind::StaticBox | MapObjectKind::Ramp => {
                self.position.y + self.half_extents.y
            }
        }
    }

    pub fn add_to(&self, world: &mut CollisionWorld) -> SurfaceId {
        match self.kind {
            MapObjectKind::Ground => world.add_ground(self.position.y, self.half_extents.x),
            MapObjectKind::StaticBox => world.add_box(self.position, self.half_extents),
            MapObjectKind::Ramp => world.add_ramp(self.position, self.half_extents),
        }
    }
}
