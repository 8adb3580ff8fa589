use glam::Vec3;

/// Removes the velocity component going into a surface.
pub fn clip_velocity(velocity: Vec3, normal: Vec3) -> Vec3 {
    let into = velocity.dot(normal);
    if into < 0.0 {
        velocity - normal * into
    } else {
        velocity
    }
}

/// Delta that continues a blocked move along the hit surface for the
/// unfinished fraction `time`.
pub fn compute_slide_vector(delta: Vec3, time: f32, normal: Vec3) -> Vec3 {
    (delta - normal * delta.dot(normal)) * time
}

/// Slide delta after hitting a second surface. When the two surfaces form a
/// crease the move follows the crease line, otherwise it slides along the
/// new surface.
pub fn two_wall_adjust(delta: Vec3, hit_time: f32, old_normal: Vec3, new_normal: Vec3) -> Vec3 {
    let remaining = delta * (1.0 - hit_time);

    if old_normal.dot(new_normal) <= 0.0 {
        let crease = old_normal.cross(new_normal).normalize_or_zero();
        let along = crease * remaining.dot(crease);
        if along.dot(delta) <= 0.0 {
            return Vec3::ZERO;
        }
        return along;
    }

    let slid = compute_slide_vector(remaining, 1.0, new_normal);
    if slid.dot(delta) <= 0.0 {
        Vec3::ZERO
    } else {
        slid
    }
}
