use clap::ValueEnum;
use glam::{Vec2, Vec3};
use parkour::{InputIntents, PlayerInput, TestingGround};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Sprint at the waist-high block and mantle onto it.
    Parkour,
    /// Chained jumps with alternating air strafe.
    Bhop,
    /// Sprint, then crouch into a slide.
    Slide,
    /// Jump at the climbing wall and pull onto its ledge.
    Climb,
    /// Jump alongside the run wall and run on it.
    Wallrun,
}

impl Scenario {
    pub fn spawn(self) -> Vec3 {
        match self {
            Self::Parkour => TestingGround::MANTLE_APPROACH,
            Self::Bhop | Self::Slide => TestingGround::SPAWN,
            Self::Climb => TestingGround::CLIMB_APPROACH,
            Self::Wallrun => TestingGround::WALL_RUN_APPROACH,
        }
    }

    /// Input held during `tick`. Every scenario goes idle after `idle_after`
    /// ticks so the link can settle.
    pub fn input(self, tick: u64, idle_after: u64) -> PlayerInput {
        if tick >= idle_after {
            return PlayerInput::default();
        }

        let forward = PlayerInput::new(Vec2::new(0.0, 1.0), 0.0);
        match self {
            Self::Parkour => forward.with_intents(InputIntents::SPRINT | InputIntents::MANTLE),
            Self::Bhop => {
                let phase = tick % 50;
                let strafe = if (tick / 50) % 2 == 0 { 0.7 } else { -0.7 };
                let mut input = if phase < 30 {
                    forward
                } else {
                    PlayerInput::new(Vec2::new(strafe, 0.3), 0.0)
                };
                input.set(InputIntents::SPRINT, true);
                input.set(InputIntents::JUMP, phase < 3);
                input
            }
            Self::Slide => {
                let mut input = forward.with_intents(InputIntents::SPRINT);
                input.set(InputIntents::CROUCH, (60..150).contains(&tick));
                input
            }
            Self::Climb => {
                let mut input = forward;
                input.set(InputIntents::JUMP, (24..28).contains(&tick));
                input
            }
            Self::Wallrun => {
                let mut input = PlayerInput::new(Vec2::new(0.0, 1.0), -0.12)
                    .with_intents(InputIntents::SPRINT);
                input.set(InputIntents::JUMP, (45..49).contains(&tick));
                input
            }
        }
    }
}
