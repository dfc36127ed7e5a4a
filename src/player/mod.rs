//! Player module: playback probing and control through `playerctl`.

pub mod control;
pub mod metadata;
pub mod probe;

pub use control::PlayerCommand;
pub use metadata::{PlaybackSnapshot, PlaybackStatus, TrackIdentity};
pub use probe::{PlaybackProbe, PlayerctlProbe, ProbeError};
