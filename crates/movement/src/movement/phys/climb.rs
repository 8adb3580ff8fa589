use crate::collision::CollisionQuery;
use crate::math::KINDA_SMALL;
use crate::movement::{Locomotion, MIN_TICK_TIME, MovementComponent};

impl MovementComponent {
    /// Moves along the climb waypoints with collision off. Speed follows the
    /// mantle curve over the progress of the whole path.
    pub(super) fn phys_climb(&mut self, world: &dyn CollisionQuery, dt: f32, iterations: u32) {
        let Some(mut climb) = self.state.locomotion.climb().copied() else {
            return;
        };

        let tolerance = self.config.mantle.tolerance;
        let start = self.state.position;
        let mut remaining = dt;

        while remaining >= MIN_TICK_TIME && climb.waypoint < climb.waypoints.len() {
            let target = climb.waypoints[climb.waypoint];
            let to_target = target - self.state.position;
            let distance = to_target.length();
            if distance <= tolerance {
                climb.traveled += distance;
                self.state.position = target;
                climb.waypoint += 1;
                continue;
            }

            let scale = self.config.mantle.curve.evaluate(climb.progress());
            let speed = (climb.speed * scale).max(KINDA_SMALL);
            let step = speed * remaining;
            if step >= distance {
                self.state.position = target;
                climb.traveled += distance;
                remaining -= distance / speed;
                climb.waypoint += 1;
            } else {
                self.state.position += to_target / distance * step;
                climb.traveled += step;
                remaining = 0.0;
            }
        }

        self.state.velocity = (self.state.position - start) / dt;

        if climb.waypoint < climb.waypoints.len() {
            self.state.locomotion = match self.state.locomotion {
                Locomotion::LedgeClimbing(_) => Locomotion::LedgeClimbing(climb),
                _ => Locomotion::Mantling(climb),
            };
            return;
        }

        log::debug!(
            "{:?} finished at {} ({:.2} m)",
            self.state.mode(),
            self.state.position,
            climb.traveled
        );
        let floor = self.find_floor(world);
        let next = if floor.is_some() {
            Locomotion::Walking
        } else {
            Locomotion::falling()
        };
        self.set_locomotion(next);
        if let Some(floor) = floor {
            self.snap_to_floor(&floor);
        }
        self.start_new_physics(world, remaining, iterations + 1);
    }
}
