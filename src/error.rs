// Simulation error types: level validation failures and invalid control-surface use

use thiserror::Error;

use crate::types::TilePos;

/// Level Load Errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LevelLoadError {
    #[error("Line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("Level grid is empty")]
    EmptyGrid,
    #[error("Grid dimension mismatch: expected {width}x{height}, found {found} cells")]
    DimensionMismatch {
        width: usize,
        height: usize,
        found: usize,
    },
    #[error("{what} at {pos} is outside the {width}x{height} grid")]
    OutOfRange {
        what: &'static str,
        pos: TilePos,
        width: usize,
        height: usize,
    },
    #[error("Base coordinate {0} does not hold a base tile")]
    BaseTileMissing(TilePos),
    #[error("Level contains more than one base tile")]
    MultipleBases,
    #[error("Base tile at {0} has no matching base coordinate")]
    UndeclaredBase(TilePos),
    #[error("Level has enemies to spawn but no enemy spawn points")]
    NoSpawnPoints,
    #[error("{what} at {pos} is not passable for tanks")]
    SpawnBlocked { what: &'static str, pos: TilePos },
}

/// Simulation Errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),
    #[error("Invalid elapsed time: {0}")]
    InvalidElapsed(f32),
    #[error(transparent)]
    LevelLoad(#[from] LevelLoadError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_errors_convert_into_sim_errors() {
        let err: SimError = LevelLoadError::EmptyGrid.into();
        assert_eq!(err, SimError::LevelLoad(LevelLoadError::EmptyGrid));
        assert_eq!(err.to_string(), "Level grid is empty");
    }

    #[test]
    fn test_error_messages_name_the_position() {
        let err = LevelLoadError::OutOfRange {
            what: "Base",
            pos: TilePos::new(20, 3),
            width: 13,
            height: 13,
        };
        assert_eq!(err.to_string(), "Base at (20, 3) is outside the 13x13 grid");
    }
}
