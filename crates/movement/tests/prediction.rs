use glam::{Vec2, Vec3};
use parkour::simulation::{Session, SessionConfig};
use parkour::{
    AirStrafeWindow, CollisionWorld, InputIntents, LinkConditions, Locomotion, MoveCorrection,
    MovementComponent, MovementConfig, MovementMode, MovementState, NetConfig, PlayerInput,
    PredictionBuffer, SavedMove, TestingGround,
};

const DT: f32 = 1.0 / 60.0;

/// Run, jump and run again toward +Z.
fn scripted_input(tick: usize) -> PlayerInput {
    let mut input = PlayerInput::new(Vec2::new(0.0, 1.0), 0.0).with_intents(InputIntents::SPRINT);
    if (40..44).contains(&tick) {
        input.set(InputIntents::JUMP, true);
    }
    if tick >= 100 {
        input = PlayerInput::new(Vec2::ZERO, 0.0);
    }
    input
}

fn course_session(config: SessionConfig) -> Session {
    Session::new(
        TestingGround::new().build_world(),
        TestingGround::SPAWN,
        MovementConfig::default(),
        config,
    )
}

fn run_clean_session(combine_moves: bool) {
    let mut session = course_session(SessionConfig {
        net: NetConfig {
            combine_moves,
            ..Default::default()
        },
        ..Default::default()
    });

    for tick in 0..160 {
        session.step(scripted_input(tick)).expect("tick");
    }
    session.flush().expect("flush");

    let stats = session.stats();
    assert!(stats.acks > 0);
    assert_eq!(stats.corrections, 0);
    assert_eq!(stats.bad_packets, 0);
    assert_eq!(session.server().stats().corrections, 0);
    assert_eq!(
        session.server().component().position(),
        session.client().position()
    );
    assert_eq!(session.client().movement_mode(), MovementMode::Walking);
}

#[test]
fn clean_link_never_corrects() {
    run_clean_session(false);
}

#[test]
fn clean_link_never_corrects_combined_moves() {
    run_clean_session(true);
}

#[test]
fn replaying_a_saved_move_reproduces_it() {
    let world = TestingGround::new().build_world();
    let mut component = MovementComponent::default();
    component.spawn(&world, TestingGround::MANTLE_APPROACH);
    let input = PlayerInput::new(Vec2::new(0.0, 1.0), 0.0).with_intents(InputIntents::MANTLE);

    let mut saw_mantle = false;
    for _ in 0..120 {
        let mut saved = SavedMove::set_move_for(&component, DT, input);
        component
            .move_autonomous(&world, saved.timestamp, saved.delta_time, saved.input)
            .expect("valid move");
        saved.post_update(&component);
        let predicted = component.snapshot();

        component.restore_state(saved.start_state.clone());
        component
            .move_autonomous(&world, saved.timestamp, saved.delta_time, saved.input)
            .expect("valid move");
        assert_eq!(component.snapshot(), predicted);
        assert_eq!(saved.end_location, predicted.position);

        saw_mantle |= component.movement_mode() == MovementMode::MANTLING;
    }
    assert!(saw_mantle);
}

#[test]
fn lossy_link_converges_once_idle() {
    let lossy = LinkConditions {
        latency_ticks: 3,
        jitter_ticks: 2,
        loss_percent: 10.0,
    };
    let mut session = course_session(SessionConfig {
        uplink: lossy,
        downlink: lossy,
        seed: 42,
        ..Default::default()
    });

    for tick in 0..220 {
        session.step(scripted_input(tick)).expect("tick");
    }

    assert!(session.uplink().stats().sent > 0);
    let client = session.client().position();
    let server = session.server().component().position();
    assert!(
        (client - server).length() < 0.05,
        "client {client} server {server}"
    );
    assert!(session.prediction().position_error().length() < 0.05);
}

/// A client that predicted one move per tick, without combining.
struct Predicted {
    world: CollisionWorld,
    component: MovementComponent,
    buffer: PredictionBuffer,
    /// Timestamp and end state of every move.
    moves: Vec<(f32, MovementState)>,
}

fn predict(
    spawn: Vec3,
    ticks: usize,
    mut input: impl FnMut(usize, &MovementComponent) -> PlayerInput,
) -> Predicted {
    let world = TestingGround::new().build_world();
    let mut component = MovementComponent::default();
    component.spawn(&world, spawn);
    let mut buffer = PredictionBuffer::new(NetConfig {
        combine_moves: false,
        ..Default::default()
    });

    let mut moves = Vec::with_capacity(ticks);
    for tick in 0..ticks {
        let timestamp = component.state().time;
        let next = input(tick, &component);
        buffer
            .tick(&mut component, &world, next, DT)
            .expect("valid move");
        moves.push((timestamp, component.snapshot()));
    }

    Predicted {
        world,
        component,
        buffer,
        moves,
    }
}

impl Predicted {
    /// Applies a correction that agrees with move `index` and returns the
    /// state the client had predicted before the replay.
    fn correct_identically(&mut self, index: usize) -> MovementState {
        let predicted = self.component.snapshot();
        let (timestamp, state) = &self.moves[index];
        let correction = MoveCorrection::capture(*timestamp, state);
        self.buffer
            .on_correction(&mut self.component, &self.world, &correction)
            .expect("replay");
        predicted
    }
}

#[test]
fn identical_correction_during_jump_hold_replays_exactly() {
    let jump = PlayerInput::new(Vec2::ZERO, 0.0).with_intents(InputIntents::JUMP);
    let mut client = predict(TestingGround::SPAWN, 6, |_, _| jump);

    let (_, corrected) = &client.moves[1];
    assert!(matches!(
        corrected.locomotion,
        Locomotion::Falling(falling) if falling.jump_force_time_remaining > 0.0
    ));

    let predicted = client.correct_identically(1);
    assert_eq!(client.component.snapshot(), predicted);
    assert_eq!(client.buffer.stats().moves_replayed, 4);
}

#[test]
fn identical_correction_mid_mantle_replays_exactly() {
    let input = PlayerInput::new(Vec2::new(0.0, 1.0), 0.0).with_intents(InputIntents::MANTLE);
    let mut mantle_start = None;
    let mut client = predict(TestingGround::MANTLE_APPROACH, 80, |tick, component| {
        if mantle_start.is_none() && component.movement_mode() == MovementMode::MANTLING {
            mantle_start = Some(tick);
        }
        input
    });

    let start = mantle_start.expect("mantle started");
    let index = start + 3;
    assert!(index + 5 < client.moves.len());
    let (_, corrected) = &client.moves[index];
    let Locomotion::Mantling(climb) = corrected.locomotion else {
        panic!("not mantling at move {index}: {:?}", corrected.mode());
    };
    assert!(climb.traveled > 0.0);

    let predicted = client.correct_identically(index);
    assert_eq!(client.component.snapshot(), predicted);
}

#[test]
fn identical_correction_during_lurch_window_replays_exactly() {
    let approach = PlayerInput::new(Vec2::new(0.0, 1.0), 0.0).with_intents(InputIntents::MANTLE);
    let jump_off = PlayerInput::new(Vec2::new(0.0, 1.0), 0.0).with_intents(InputIntents::JUMP);
    let mut client = predict(TestingGround::MANTLE_APPROACH, 90, |_, component| {
        if component.movement_mode() == MovementMode::MANTLING {
            jump_off
        } else {
            approach
        }
    });

    let index = client
        .moves
        .iter()
        .position(|(_, state)| {
            matches!(
                state.locomotion,
                Locomotion::Falling(falling)
                    if matches!(falling.window, AirStrafeWindow::Lurch { .. })
            )
        })
        .expect("mantle jump opened a lurch window")
        + 2;
    assert!(index + 5 < client.moves.len());

    let predicted = client.correct_identically(index);
    assert_eq!(client.component.snapshot(), predicted);
}

#[test]
fn replay_keeps_the_walk_speed_each_move_was_made_with() {
    let forward = PlayerInput::new(Vec2::new(0.0, 1.0), 0.0);
    let mut client = predict(TestingGround::SPAWN, 30, |_, _| forward);

    client.component.set_max_walk_speed(2.0);
    let mut predicted = client.correct_identically(10);
    predicted.max_walk_speed = 2.0;

    assert_eq!(client.component.snapshot(), predicted);
    assert_eq!(client.component.max_walk_speed(), 2.0);
}
