mod slide;
mod trace;
mod world;

pub use slide::{clip_velocity, compute_slide_vector, two_wall_adjust};
pub use trace::{Hull, SurfaceId, TraceHit};
pub use world::{CollisionQuery, CollisionWorld, SURFACE_CLIP_EPSILON};
