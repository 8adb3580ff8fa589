use glam::Vec3;

use crate::collision::CollisionWorld;

use super::MapObject;

/// Parkour course used by the sim and the traversal tests. Each lane starts
/// from one of the approach points below; `+Z` is yaw 0.
pub struct TestingGround {
    objects: Vec<MapObject>,
}

impl Default for TestingGround {
    fn default() -> Self {
        Self::new()
    }
}

impl TestingGround {
    const GROUND_SIZE: f32 = 100.0;
    const GROUND_Y: f32 = 0.0;

    pub const SPAWN: Vec3 = Vec3::new(0.0, 1.0, -6.0);
    /// In front of the 1 m block, facing +Z.
    pub const MANTLE_APPROACH: Vec3 = Vec3::new(8.0, 1.0, -2.5);
    /// Foot of the stairs, facing +Z.
    pub const STAIRS_APPROACH: Vec3 = Vec3::new(-5.0, 1.0, 3.0);
    /// Lane alongside the run wall, which is on the left when facing +Z.
    pub const WALL_RUN_APPROACH: Vec3 = Vec3::new(-10.6, 1.0, 0.0);
    /// Facing the 2.5 m climbing wall whose face is at `z = 28`.
    pub const CLIMB_APPROACH: Vec3 = Vec3::new(0.0, 1.0, 25.0);
    /// Bottom of the ramp, facing +X.
    pub const RAMP_APPROACH: Vec3 = Vec3::new(6.0, 1.0, 20.0);

    pub const CLIMB_WALL_HEIGHT: f32 = 2.5;
    pub const RUN_WALL_FACE_X: f32 = -11.5;

    pub fn new() -> Self {
        let mut objects = Vec::new();

        objects.push(MapObject::ground(
            Vec3::new(0.0, Self::GROUND_Y, 0.0),
            Self::GROUND_SIZE,
        ));

        Self::add_platform_obstacles(&mut objects);
        Self::add_stair_platforms(&mut objects);
        Self::add_run_wall(&mut objects);
        Self::add_climb_wall(&mut objects);
        Self::add_ramp(&mut objects);

        Self { objects }
    }

    /// Blocks of increasing height along +X: step, mantle, ledge climb and
    /// two walls too tall for either.
    fn add_platform_obstacles(objects: &mut Vec<MapObject>) {
        objects.push(MapObject::static_box(
            Vec3::new(5.0, 0.25, 0.0),
            Vec3::new(1.0, 0.25, 1.0),
        ));

        objects.push(MapObject::static_box(
            Vec3::new(8.0, 0.5, 0.0),
            Vec3::new(1.0, 0.5, 1.0),
        ));

        objects.push(MapObject::static_box(
            Vec3::new(11.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 1.0),
        ));

        objects.push(MapObject::static_box(
            Vec3::new(14.0, 1.5, 0.0),
            Vec3::new(1.5, 1.5, 1.5),
        ));

        objects.push(MapObject::static_box(
            Vec3::new(18.0, 2.0, 0.0),
            Vec3::new(2.0, 2.0, 2.0),
        ));
    }

    fn add_stair_platforms(objects: &mut Vec<MapObject>) {
        let stair_start = Vec3::new(-5.0, 0.0, 5.0);
        let step_height = 0.3;
        let step_depth = 0.4;
        let step_width = 2.0;

        for i in 0..10 {
            let top = step_height * (i as f32 + 1.0);
            let z = stair_start.z + step_depth * i as f32;
            objects.push(MapObject::static_box(
                Vec3::new(stair_start.x, top * 0.5, z),
                Vec3::new(step_width, top * 0.5, step_depth * 0.5),
            ));
        }
    }

    fn add_run_wall(objects: &mut Vec<MapObject>) {
        objects.push(MapObject::static_box(
            Vec3::new(Self::RUN_WALL_FACE_X - 0.5, 3.0, 20.0),
            Vec3::new(0.5, 3.0, 12.0),
        ));
    }

    fn add_climb_wall(objects: &mut Vec<MapObject>) {
        let half_height = Self::CLIMB_WALL_HEIGHT * 0.5;
        objects.push(MapObject::static_box(
            Vec3::new(0.0, half_height, 30.0),
            Vec3::new(3.0, half_height, 2.0),
        ));
    }

    fn add_ramp(objects: &mut Vec<MapObject>) {
        objects.push(MapObject::ramp(
            Vec3::new(12.0, 0.75, 20.0),
            Vec3::new(3.0, 0.75, 2.0),
        ));
    }

    pub fn objects(&self) -> &[MapObject] {
        &self.objects
    }

    pub fn build_world(&self) -> CollisionWorld {
        let mut world = CollisionWorld::new();
        for object in &self.objects {
            object.add_to(&mut world);
        }
        log::debug!("testing ground built with {} colliders", world.len());
        world
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::CollisionQuery;
    use crate::movement::{MovementComponent, MovementMode};

    #[test]
    fn testing_ground_builds_every_object() {
        let ground = TestingGround::new();
        let world = ground.build_world();

        assert_eq!(world.len(), ground.objects().len());
        let tallest = ground
            .objects()
            .iter()
            .map(MapObject::top)
            .fold(f32::MIN, f32::max);
        assert_eq!(tallest, 6.0);
    }

    #[test]
    fn every_approach_starts_on_open_ground() {
        let world = TestingGround::new().build_world();
        let approaches = [
            TestingGround::SPAWN,
            TestingGround::MANTLE_APPROACH,
            TestingGround::STAIRS_APPROACH,
            TestingGround::WALL_RUN_APPROACH,
            TestingGround::CLIMB_APPROACH,
            TestingGround::RAMP_APPROACH,
        ];

        for approach in approaches {
            let mut component = MovementComponent::default();
            component.spawn(&world, approach);
            assert_eq!(component.movement_mode(), MovementMode::Walking);
            let feet = component.position().y - component.config().capsule_half_height;
            assert!(feet.abs() < 0.05, "{approach} spawned at feet {feet}");

            let hull = component.capsule().map(|capsule| capsule.hull());
            let hull = hull.expect("capsule attached");
            assert!(!world.overlaps(component.position(), hull));
        }
    }
}
