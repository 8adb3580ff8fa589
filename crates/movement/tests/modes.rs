use std::cell::RefCell;
use std::rc::Rc;

use glam::{Vec2, Vec3};
use parkour::{
    CollisionWorld, InputIntents, Locomotion, ModeEvent, ModeHistory, MovementComponent,
    MovementMode, PlayerInput, StatusTags,
};

const DT: f32 = 1.0 / 60.0;

fn flat_world() -> CollisionWorld {
    let mut world = CollisionWorld::new();
    world.add_ground(0.0, 100.0);
    world
}

fn run(component: &mut MovementComponent, world: &CollisionWorld, ticks: usize) {
    for _ in 0..ticks {
        component.perform_movement(world, DT).expect("valid move");
    }
}

#[test]
fn observer_sees_every_change_of_a_jump() {
    let world = flat_world();
    let history = Rc::new(RefCell::new(ModeHistory::new()));
    let mut component = MovementComponent::default();
    component.spawn(&world, Vec3::new(0.0, 1.0, 0.0));
    component.set_observer(Box::new(history.clone()));

    component.start_jump();
    component.perform_movement(&world, DT).expect("valid move");
    assert_eq!(component.movement_mode(), MovementMode::Falling);
    component.stop_jump();

    for _ in 0..120 {
        component.perform_movement(&world, DT).expect("valid move");
        if component.movement_mode() == MovementMode::Walking {
            break;
        }
    }
    assert_eq!(component.movement_mode(), MovementMode::Walking);

    let events = history.borrow().events().to_vec();
    assert_eq!(
        events,
        vec![
            ModeEvent::Exit(MovementMode::Walking),
            ModeEvent::Enter(MovementMode::Falling),
            ModeEvent::Changed {
                previous: MovementMode::Walking,
                current: MovementMode::Falling,
            },
            ModeEvent::Exit(MovementMode::Falling),
            ModeEvent::Enter(MovementMode::Walking),
            ModeEvent::Changed {
                previous: MovementMode::Falling,
                current: MovementMode::Walking,
            },
        ]
    );
}

#[test]
fn slide_waits_for_its_cooldown() {
    let world = flat_world();
    let mut component = MovementComponent::default();
    component.spawn(&world, Vec3::new(0.0, 1.0, -40.0));
    component.set_player_input(
        PlayerInput::new(Vec2::new(0.0, 1.0), 0.0).with_intents(InputIntents::SPRINT),
    );
    run(&mut component, &world, 60);

    component.start_crouch();
    component.perform_movement(&world, DT).expect("valid move");
    assert_eq!(component.movement_mode(), MovementMode::SLIDE);

    component.stop_crouch();
    component.perform_movement(&world, DT).expect("valid move");
    assert_eq!(component.movement_mode(), MovementMode::Walking);

    component.start_crouch();
    component.perform_movement(&world, DT).expect("valid move");
    assert_eq!(component.movement_mode(), MovementMode::Walking);
    assert!(!component.can_slide());

    component.stop_crouch();
    run(&mut component, &world, 60);
    component.start_crouch();
    component.perform_movement(&world, DT).expect("valid move");
    assert_eq!(component.movement_mode(), MovementMode::SLIDE);
}

#[test]
fn wall_jump_count_resets_on_landing() {
    let mut world = flat_world();
    world.add_box(Vec3::new(0.0, 3.0, 2.0), Vec3::new(3.0, 3.0, 0.5));

    let mut component = MovementComponent::default();
    component.spawn(&world, Vec3::new(0.0, 2.0, 0.0));
    let mut state = component.snapshot();
    state.velocity = Vec3::new(0.0, 0.0, 6.0);
    state.locomotion = Locomotion::falling();
    component.restore_state(state);
    component.set_player_input(
        PlayerInput::new(Vec2::ZERO, 0.0).with_intents(InputIntents::WALL_JUMP),
    );

    for _ in 0..20 {
        component.perform_movement(&world, DT).expect("valid move");
        if component.state().timers.wall_jump_count > 0 {
            break;
        }
    }
    assert_eq!(component.state().timers.wall_jump_count, 1);
    assert!(component.last_wall_jump_normal().is_some());

    component.set_player_input(PlayerInput::default());
    for _ in 0..180 {
        component.perform_movement(&world, DT).expect("valid move");
        if component.movement_mode() == MovementMode::Walking {
            break;
        }
    }
    assert_eq!(component.movement_mode(), MovementMode::Walking);
    assert_eq!(component.state().timers.wall_jump_count, 0);
}

#[test]
fn stunned_character_stays_put() {
    let world = flat_world();
    let mut component = MovementComponent::default();
    component.spawn(&world, Vec3::new(0.0, 1.0, 0.0));
    component.set_status(StatusTags::STUNNED);
    component.set_player_input(
        PlayerInput::new(Vec2::new(0.0, 1.0), 0.0).with_intents(InputIntents::JUMP),
    );
    let start = component.position();

    run(&mut component, &world, 30);

    assert_eq!(component.movement_mode(), MovementMode::Walking);
    assert!((component.position() - start).length() < 1.0e-4);

    component.set_status(StatusTags::empty());
    component.stop_jump();
    run(&mut component, &world, 30);
    assert!(component.position().z > start.z + 1.0);
}

#[test]
fn cannot_stand_up_under_a_low_slab() {
    let mut world = flat_world();
    world.add_box(Vec3::new(0.0, 1.7, 5.0), Vec3::new(3.0, 0.1, 2.0));

    let mut component = MovementComponent::default();
    component.spawn(&world, Vec3::new(0.0, 1.0, 0.0));
    component.set_player_input(
        PlayerInput::new(Vec2::new(0.0, 1.0), 0.0).with_intents(InputIntents::CROUCH),
    );
    run(&mut component, &world, 100);
    assert!(component.is_crouching());
    let z = component.position().z;
    assert!((3.5..6.5).contains(&z), "stopped at z {z}");

    component.set_player_input(PlayerInput::default());
    run(&mut component, &world, 10);
    assert!(component.is_crouching());
    assert_eq!(component.movement_mode(), MovementMode::Walking);

    component.set_player_input(
        PlayerInput::new(Vec2::new(0.0, 1.0), 0.0).with_intents(InputIntents::CROUCH),
    );
    run(&mut component, &world, 90);
    assert!(component.position().z > 7.5);

    component.set_player_input(PlayerInput::default());
    run(&mut component, &world, 2);
    assert!(!component.is_crouching());
}
