use serde::{Deserialize, Serialize};

use crate::movement::InputIntents;

bitflags::bitflags! {
    /// Held intents packed into the single byte a saved move carries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct CompressedFlags: u8 {
        const JUMP_PRESSED      = 0x01;
        const WANTS_TO_CROUCH   = 0x02;
        const RESERVED_1        = 0x04;
        const RESERVED_2        = 0x08;
        const WALL_JUMP_PRESSED = 0x10;
        const AIM_PRESSED       = 0x20;
        const MANTLING          = 0x40;
        const SPRINT_PRESSED    = 0x80;
    }
}

const MAPPING: [(InputIntents, CompressedFlags); 6] = [
    (InputIntents::JUMP, CompressedFlags::JUMP_PRESSED),
    (InputIntents::CROUCH, CompressedFlags::WANTS_TO_CROUCH),
    (InputIntents::WALL_JUMP, CompressedFlags::WALL_JUMP_PRESSED),
    (InputIntents::AIM, CompressedFlags::AIM_PRESSED),
    (InputIntents::MANTLE, CompressedFlags::MANTLING),
    (InputIntents::SPRINT, CompressedFlags::SPRINT_PRESSED),
];

impl CompressedFlags {
    pub fn from_intents(intents: InputIntents) -> Self {
        let mut flags = Self::empty();
        for (intent, flag) in MAPPING {
            flags.set(flag, intents.contains(intent));
        }
        flags
    }

    /// Reserved bits are ignored.
    pub fn to_intents(self) -> InputIntents {
        let mut intents = InputIntents::empty();
        for (intent, flag) in MAPPING {
            intents.set(intent, self.contains(flag));
        }
        intents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_layout_matches_the_wire_byte() {
        let flags = CompressedFlags::from_intents(InputIntents::JUMP | InputIntents::SPRINT);
        assert_eq!(flags.bits(), 0x81);

        let flags = CompressedFlags::from_intents(InputIntents::MANTLE | InputIntents::CROUCH);
        assert_eq!(flags.bits(), 0x42);
    }

    #[test]
    fn reserved_bits_do_not_become_intents() {
        let flags = CompressedFlags::from_bits_retain(0x0C | 0x10);
        assert_eq!(flags.to_intents(), InputIntents::WALL_JUMP);
    }

    #[test]
    fn every_intent_survives_the_byte() {
        let all = InputIntents::all();
        assert_eq!(CompressedFlags::from_intents(all).to_intents(), all);
    }
}
