use thiserror::Error;

use crate::geometry::{Direction, Position};

/// A malformed observation packet. The packet is dropped as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObservationError {
    #[error("door {dir:?} of cell {offset:?} reported twice in one packet")]
    DuplicateDoor { offset: Position, dir: Direction },

    #[error("door at offset {offset:?} is outside the visibility radius {radius}")]
    OutOfRange { offset: Position, radius: u32 },

    #[error("unknown door state code {0}")]
    UnknownDoorState(u8),

    #[error("unknown direction code {0}")]
    UnknownDirection(u8),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("radius must be at least 1")]
    ZeroRadius,

    #[error("max_door_frequency must be at least 1")]
    ZeroFrequency,

    #[error("map_dim must be at least 1")]
    ZeroMapDim,
}
