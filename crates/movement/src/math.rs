use glam::{Vec2, Vec3};

pub const KINDA_SMALL: f32 = 1.0e-4;

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Removes the part of `v` pointing along `normal`. `normal` must be unit length.
pub fn project_on_plane(v: Vec3, normal: Vec3) -> Vec3 {
    v - normal * v.dot(normal)
}

pub fn forward_from_yaw(yaw: f32) -> Vec3 {
    let (sin_yaw, cos_yaw) = yaw.sin_cos();
    Vec3::new(sin_yaw, 0.0, cos_yaw)
}

pub fn right_from_yaw(yaw: f32) -> Vec3 {
    let (sin_yaw, cos_yaw) = yaw.sin_cos();
    Vec3::new(cos_yaw, 0.0, -sin_yaw)
}

pub fn yaw_from_direction(direction: Vec3) -> f32 {
    direction.x.atan2(direction.z)
}

/// Maps a strafe/forward input vector into a world-space horizontal direction
/// for the given view yaw. The result keeps the input magnitude, clamped to 1.
pub fn input_to_world(input: Vec2, yaw: f32) -> Vec3 {
    let clamped = input.clamp_length_max(1.0);
    right_from_yaw(yaw) * clamped.x + forward_from_yaw(yaw) * clamped.y
}

/// Angle in degrees between two vectors, 0 when either is degenerate.
pub fn angle_between_deg(a: Vec3, b: Vec3) -> f32 {
    let (Some(a), Some(b)) = (a.try_normalize(), b.try_normalize()) else {
        return 0.0;
    };
    a.dot(b).clamp(-1.0, 1.0).acos().to_degrees()
}

pub fn is_finite_vec(v: Vec3) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}
