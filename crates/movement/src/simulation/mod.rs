mod session;
mod tick;

pub use session::{Session, SessionConfig, SessionStats};
pub use tick::FixedTimestep;
