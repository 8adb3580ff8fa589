use crate::collision::CollisionQuery;

use crate::movement::{InputIntents, Locomotion, MovementComponent};

impl MovementComponent {
    pub(super) fn phys_slide(&mut self, world: &dyn CollisionQuery, dt: f32, iterations: u32) {
        if !self.input.has(InputIntents::CROUCH) || !self.can_slide() {
            log::trace!("slide ended at {:.2} m/s", self.state.horizontal_speed());
            self.set_locomotion(Locomotion::Walking);
            self.start_new_physics(world, dt, iterations);
            return;
        }

        self.phys_ground(world, dt, iterations);
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};

    use super::*;
    use crate::collision::CollisionWorld;
    use crate::movement::{MovementMode, PlayerInput};

    const DT: f32 = 1.0 / 60.0;

    fn sliding_setup() -> (MovementComponent, CollisionWorld) {
        let mut world = CollisionWorld::new();
        world.add_ground(0.0, 100.0);

        let mut component = MovementComponent::default();
        component.spawn(&world, Vec3::new(0.0, 1.0, 0.0));
        component.state.velocity = Vec3::Z * 8.0;
        component.set_player_input(
            PlayerInput::new(Vec2::new(0.0, 1.0), 0.0).with_intents(InputIntents::CROUCH),
        );
        (component, world)
    }

    #[test]
    fn crouching_at_speed_starts_a_boosted_slide() {
        let (mut component, world) = sliding_setup();
        component.perform_movement(&world, DT).expect("valid move");

        assert_eq!(component.movement_mode(), MovementMode::SLIDE);
        assert!(component.state.horizontal_speed() > 8.5);
        assert!(component.state.rotation_locked);
    }

    #[test]
    fn slide_holds_its_speed_on_flat_ground() {
        let (mut component, world) = sliding_setup();
        component.perform_movement(&world, DT).expect("valid move");
        let boosted = component.state.horizontal_speed();

        for _ in 0..120 {
            component.perform_movement(&world, DT).expect("valid move");
        }

        assert_eq!(component.movement_mode(), MovementMode::SLIDE);
        assert!((component.state.horizontal_speed() - boosted).abs() < 0.05);
    }

    #[test]
    fn slide_up_a_ramp_slows_and_hands_back_to_walking() {
        let mut world = CollisionWorld::new();
        world.add_ground(0.0, 100.0);
        world.add_ramp(Vec3::new(14.0, 3.0, 0.0), Vec3::new(10.0, 3.0, 4.0));

        let mut component = MovementComponent::default();
        component.spawn(&world, Vec3::new(0.0, 1.0, 0.0));
        component.state.velocity = Vec3::X * 8.0;
        component.set_player_input(
            PlayerInput::new(Vec2::new(0.0, 1.0), std::f32::consts::FRAC_PI_2)
                .with_intents(InputIntents::CROUCH),
        );

        let mut ticks_sliding = 0;
        let mut ended_at = None;
        for _ in 0..300 {
            let was_sliding = component.movement_mode() == MovementMode::SLIDE;
            component.perform_movement(&world, DT).expect("valid move");
            if component.movement_mode() == MovementMode::SLIDE {
                ticks_sliding += 1;
            } else if was_sliding && ended_at.is_none() {
                ended_at = Some(component.position().x);
            }
        }

        assert!(ticks_sliding > 30);
        let ended_at = ended_at.expect("slide ended");
        assert!(ended_at > 4.0 && ended_at < 24.0, "slide ended at x={ended_at}");
        assert_eq!(component.movement_mode(), MovementMode::Walking);
        assert!(component.state.timers.prev_slide_time > 0.0);
    }

    #[test]
    fn releasing_crouch_stops_the_slide() {
        let (mut component, world) = sliding_setup();
        component.perform_movement(&world, DT).expect("valid move");
        assert_eq!(component.movement_mode(), MovementMode::SLIDE);

        component.stop_crouch();
        component.perform_movement(&world, DT).expect("valid move");
        assert_eq!(component.movement_mode(), MovementMode::Walking);
        assert!(!component.is_crouching());
    }
}
