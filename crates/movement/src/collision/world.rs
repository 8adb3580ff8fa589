use glam::Vec3;
use rapier3d::parry::query::{self, ShapeCastOptions};
use rapier3d::prelude::*;

use super::{Hull, SurfaceId, TraceHit};

/// Distance the trace keeps between a hull and the surface it stops against.
pub const SURFACE_CLIP_EPSILON: f32 = 0.002;

/// Colliders a sweep may skip because the hull only grazes them.
const MAX_GRAZING_CONTACTS: usize = 4;
const GRAZING_COSINE: f32 = 1.0e-3;

/// World collision services consumed by the movement component.
pub trait CollisionQuery {
    fn sweep(&self, start: Vec3, end: Vec3, hull: Hull) -> TraceHit;

    fn line_trace(&self, start: Vec3, end: Vec3) -> TraceHit;

    fn overlaps(&self, position: Vec3, hull: Hull) -> bool;
}

/// Static level geometry held in a rapier collider set. Only scene queries
/// run against it; nothing is ever integrated.
pub struct CollisionWorld {
    pipeline: PhysicsPipeline,
    integration_parameters: IntegrationParameters,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    next_surface: u32,
}

impl Default for CollisionWorld {
    fn default() -> Self {
        Self::new()
    }
}

struct SweepContact {
    collider: ColliderHandle,
    time: f32,
    normal: Vec3,
}

impl CollisionWorld {
    pub fn new() -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            integration_parameters: IntegrationParameters::default(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            next_surface: 0,
        }
    }

    pub fn add_box(&mut self, center: Vec3, half_extents: Vec3) -> SurfaceId {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .translation(to_vector(center));
        self.insert(collider)
    }

    /// Slope rising along +X from the bottom of the box at `min.x` to its top
    /// at `max.x`, built from a tilted slab whose upper face is the slope.
    pub fn add_ramp(&mut self, center: Vec3, half_extents: Vec3) -> SurfaceId {
        let rise = half_extents.y * 2.0;
        let run = half_extents.x * 2.0;
        let angle = rise.atan2(run);
        let half_length = run.hypot(rise) * 0.5;
        let half_thickness = half_extents.y;

        let slope_normal = Vec3::new(-angle.sin(), angle.cos(), 0.0);
        let slab_center = center - slope_normal * half_thickness;
        let collider = ColliderBuilder::cuboid(half_length, half_thickness, half_extents.z)
            .translation(to_vector(slab_center))
            .rotation(Vector::new(0.0, 0.0, angle));
        self.insert(collider)
    }

    /// Flat slab whose top face sits at `y`.
    pub fn add_ground(&mut self, y: f32, half_size: f32) -> SurfaceId {
        self.add_box(
            Vec3::new(0.0, y - 0.5, 0.0),
            Vec3::new(half_size, 0.5, half_size),
        )
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    fn insert(&mut self, collider: ColliderBuilder) -> SurfaceId {
        let id = SurfaceId(self.next_surface);
        self.next_surface += 1;
        self.colliders.insert(collider.user_data(id.0 as u128).build());
        self.refresh();
        id
    }

    /// Runs a pipeline pass so the broad phase sees newly added colliders.
    /// There are no bodies, so nothing moves.
    fn refresh(&mut self) {
        self.pipeline.step(
            Vector::new(0.0, 0.0, 0.0),
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );
    }

    fn query_pipeline<'a>(&'a self, filter: QueryFilter<'a>) -> QueryPipeline<'a> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        )
    }

    fn surface(&self, handle: ColliderHandle) -> Option<SurfaceId> {
        self.colliders
            .get(handle)
            .map(|collider| SurfaceId(collider.user_data as u32))
    }

    /// Deepest collider the hull sits inside, as the push-out normal, depth
    /// and surface.
    fn penetration(
        &self,
        position: Vec3,
        shape: &SharedShape,
    ) -> Option<(Vec3, f32, ColliderHandle)> {
        let pose = pose_at(position);
        let query = self.query_pipeline(QueryFilter::default());

        let mut deepest: Option<(Vec3, f32, ColliderHandle)> = None;
        for (handle, collider) in query.intersect_shape(pose, shape.as_ref()) {
            let Ok(Some(contact)) =
                query::contact(&pose, shape.as_ref(), collider.position(), collider.shape(), 0.0)
            else {
                continue;
            };
            let depth = (-contact.dist).max(0.0);
            if deepest.is_none_or(|(_, best, _)| depth > best) {
                let away = -from_vector(contact.normal1);
                deepest = Some((away.normalize_or(Vec3::Y), depth, handle));
            }
        }
        deepest
    }

    fn cast(
        &self,
        start: Vec3,
        delta: Vec3,
        shape: &SharedShape,
        skipped: &[ColliderHandle],
    ) -> Option<SweepContact> {
        let predicate = |handle: ColliderHandle, _: &Collider| !skipped.contains(&handle);
        let query = self.query_pipeline(QueryFilter::default().predicate(&predicate));

        let mut options = ShapeCastOptions::with_max_time_of_impact(1.0);
        options.target_distance = SURFACE_CLIP_EPSILON;
        options.stop_at_penetration = false;
        options.compute_impact_geometry_on_penetration = true;

        let pose = pose_at(start);
        let (collider, hit) = query.cast_shape(&pose, to_vector(delta), shape.as_ref(), options)?;
        let time = hit.time_of_impact.clamp(0.0, 1.0);

        let normal = self
            .contact_normal(start + delta * time, shape, collider)
            .unwrap_or_else(|| {
                let normal = from_vector(hit.normal1).normalize_or_zero();
                if normal.dot(delta) > 0.0 { -normal } else { normal }
            });

        Some(SweepContact {
            collider,
            time,
            normal,
        })
    }

    /// Normal of `collider` facing a hull resting at `position`.
    fn contact_normal(
        &self,
        position: Vec3,
        shape: &SharedShape,
        collider: ColliderHandle,
    ) -> Option<Vec3> {
        let collider = self.colliders.get(collider)?;
        let pose = pose_at(position);
        let contact = query::contact(
            &pose,
            shape.as_ref(),
            collider.position(),
            collider.shape(),
            SURFACE_CLIP_EPSILON * 4.0,
        )
        .ok()??;
        (-from_vector(contact.normal1)).try_normalize()
    }
}

impl CollisionQuery for CollisionWorld {
    fn sweep(&self, start: Vec3, end: Vec3, hull: Hull) -> TraceHit {
        let mut result = TraceHit::miss(start, end);
        let shape = hull_shape(hull);

        if let Some((normal, depth, collider)) = self.penetration(start, &shape) {
            result.blocking_hit = true;
            result.start_penetrating = true;
            result.time = 0.0;
            result.location = start;
            result.normal = normal;
            result.penetration_depth = depth;
            result.impact_point = start - normal * hull.support(normal);
            result.surface = self.surface(collider);
            return result;
        }

        let delta = end - start;
        if delta.length_squared() <= 0.0 {
            return result;
        }

        // a hull resting against a face reports it at time zero even when
        // moving along it
        let direction = delta.normalize();
        let mut skipped = Vec::new();
        while let Some(contact) = self.cast(start, delta, &shape, &skipped) {
            if contact.time <= 0.0
                && contact.normal.dot(direction) > -GRAZING_COSINE
                && skipped.len() < MAX_GRAZING_CONTACTS
            {
                skipped.push(contact.collider);
                continue;
            }

            result.blocking_hit = true;
            result.time = contact.time;
            result.normal = contact.normal;
            result.location = start + delta * contact.time;
            result.impact_point = result.location - contact.normal * hull.support(contact.normal);
            result.surface = self.surface(contact.collider);
            break;
        }

        result
    }

    fn line_trace(&self, start: Vec3, end: Vec3) -> TraceHit {
        let mut result = TraceHit::miss(start, end);
        let delta = end - start;
        let length = delta.length();
        if length <= 0.0 {
            return result;
        }

        let query = self.query_pipeline(QueryFilter::default());
        let ray = Ray::new(to_vector(start), to_vector(delta));
        let Some((collider, hit)) = query.cast_ray_and_get_normal(&ray, 1.0, true) else {
            return result;
        };

        let normal = from_vector(hit.normal).normalize_or_zero();
        result.blocking_hit = true;
        result.start_penetrating = hit.time_of_impact <= 0.0;
        result.time = (hit.time_of_impact - SURFACE_CLIP_EPSILON / length).max(0.0);
        result.location = start + delta * result.time;
        result.impact_point = start + delta * hit.time_of_impact;
        result.normal = if normal.dot(delta) > 0.0 { -normal } else { normal };
        result.surface = self.surface(collider);
        result
    }

    fn overlaps(&self, position: Vec3, hull: Hull) -> bool {
        let shape = hull_shape(hull);
        let query = self.query_pipeline(QueryFilter::default());
        query
            .intersect_shape(pose_at(position), shape.as_ref())
            .next()
            .is_some()
    }
}

fn hull_shape(hull: Hull) -> SharedShape {
    let half = hull.half_extents;
    SharedShape::cuboid(half.x, half.y, half.z)
}

fn pose_at(position: Vec3) -> Pose {
    Pose::from_parts(to_vector(position), Rotation::IDENTITY)
}

fn to_vector(v: Vec3) -> Vector {
    Vector::new(v.x, v.y, v.z)
}

fn from_vector(v: Vector) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}
