mod config;
mod flags;
mod link;
mod move_data;
mod prediction;
mod protocol;
mod saved_move;
mod server;

pub use config::NetConfig;
pub use flags::CompressedFlags;
pub use link::{LinkConditions, LinkSimulator, LinkStats};
pub use move_data::{ModeData, MoveCorrection, NetworkMoveData, dequantize_target, quantize_target};
pub use prediction::{PredictionBuffer, PredictionStats};
pub use protocol::{
    DEFAULT_TICK_RATE, MAX_PACKET_SIZE, PROTOCOL_MAGIC, PROTOCOL_VERSION, Packet, PacketError,
    PacketHeader, Payload, sequence_greater_than,
};
pub use saved_move::SavedMove;
pub use server::{ServerMoveHandler, ServerMoveStats};
