use glam::Vec2;
use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct InputIntents: u8 {
        const JUMP      = 1 << 0;
        const CROUCH    = 1 << 1;
        const SPRINT    = 1 << 2;
        const AIM       = 1 << 3;
        const WALL_JUMP = 1 << 4;
        const MANTLE    = 1 << 5;
    }
}

const AXIS_SCALE: f32 = 127.0;
const YAW_SCALE: f32 = 10000.0;

fn normalize_angle(angle: f32) -> f32 {
    let two_pi = std::f32::consts::TAU;
    let mut normalized = angle % two_pi;
    if normalized > std::f32::consts::PI {
        normalized -= two_pi;
    } else if normalized < -std::f32::consts::PI {
        normalized += two_pi;
    }
    normalized
}

/// One tick of player input: analog move vector (`x` strafe, `y` forward),
/// view yaw in radians and held intents.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerInput {
    pub move_input: Vec2,
    pub view_yaw: f32,
    pub intents: InputIntents,
}

impl PlayerInput {
    pub fn new(move_input: Vec2, view_yaw: f32) -> Self {
        Self {
            move_input,
            view_yaw,
            intents: InputIntents::empty(),
        }
    }

    pub fn with_intents(mut self, intents: InputIntents) -> Self {
        self.intents = intents;
        self
    }

    pub fn has(&self, intent: InputIntents) -> bool {
        self.intents.contains(intent)
    }

    pub fn set(&mut self, intent: InputIntents, pressed: bool) {
        self.intents.set(intent, pressed);
    }

    pub fn forward(&self) -> f32 {
        self.move_input.y
    }

    pub fn encode_move_input(&self) -> [i8; 2] {
        let clamped = self.move_input.clamp_length_max(1.0);
        [
            (clamped.x * AXIS_SCALE).round() as i8,
            (clamped.y * AXIS_SCALE).round() as i8,
        ]
    }

    pub fn decode_move_input(encoded: [i8; 2]) -> Vec2 {
        Vec2::new(
            encoded[0] as f32 / AXIS_SCALE,
            encoded[1] as f32 / AXIS_SCALE,
        )
    }

    pub fn encode_view_yaw(&self) -> i16 {
        (normalize_angle(self.view_yaw) * YAW_SCALE).round() as i16
    }

    pub fn decode_view_yaw(encoded: i16) -> f32 {
        encoded as f32 / YAW_SCALE
    }

    /// Input as the server will see it after a trip over the wire. Clients
    /// simulate with this so both sides start from identical values.
    pub fn quantized(&self) -> Self {
        Self {
            move_input: Self::decode_move_input(self.encode_move_input()),
            view_yaw: Self::decode_view_yaw(self.encode_view_yaw()),
            intents: self.intents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantization_is_idempotent() {
        let input = PlayerInput::new(Vec2::new(0.31, -0.77), 2.9)
            .with_intents(InputIntents::SPRINT | InputIntents::JUMP);
        let once = input.quantized();
        let twice = once.quantized();
        assert_eq!(once, twice);
        assert!((once.move_input - input.move_input).length() < 0.01);
        assert!((once.view_yaw - input.view_yaw).abs() < 0.001);
    }

    #[test]
    fn yaw_wraps_before_encoding() {
        let input = PlayerInput::new(Vec2::ZERO, std::f32::consts::TAU + 0.5);
        let decoded = PlayerInput::decode_view_yaw(input.encode_view_yaw());
        assert!((decoded - 0.5).abs() < 0.001);
    }

    #[test]
    fn oversized_input_is_clamped() {
        let input = PlayerInput::new(Vec2::new(1.0, 1.0), 0.0);
        let encoded = input.encode_move_input();
        assert_eq!(encoded, [90, 90]);
        assert!(PlayerInput::decode_move_input(encoded).length() <= 1.01);
    }
}
