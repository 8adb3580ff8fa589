pub mod collision;
pub mod error;
pub mod map;
pub mod math;
pub mod movement;
pub mod net;
pub mod simulation;

pub use collision::{CollisionQuery, CollisionWorld, Hull, SurfaceId, TraceHit};
pub use error::{ConfigError, MovementError, SessionError};
pub use map::{MapObject, MapObjectKind, TestingGround};
pub use movement::{
    AirStrafeWindow, Capsule, ClimbTarget, CustomMode, InputIntents, Locomotion, ModeEvent,
    ModeHistory, ModeObserver, MovementComponent, MovementConfig, MovementMode, MovementState,
    PlayerInput, StatusTags,
};
pub use net::{
    CompressedFlags, LinkConditions, LinkSimulator, ModeData, MoveCorrection, NetConfig,
    NetworkMoveData, Packet, PacketError, PacketHeader, Payload, PredictionBuffer, SavedMove,
    ServerMoveHandler,
};
pub use simulation::{FixedTimestep, Session, SessionConfig, SessionStats};
