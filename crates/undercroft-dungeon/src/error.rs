use thiserror::Error;

use crate::grid::MIN_DIMENSION;

/// Failures surfaced by the level generator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error(
        "grid {width}x{height} is smaller than the {min}x{min} minimum",
        min = MIN_DIMENSION
    )]
    InvalidDimensions { width: usize, height: usize },
    #[error("level plan has no drawable archetypes or an inverted enemy count range")]
    InvalidPlan,
    #[error("no connected layout with valid spawns after {attempts} carve attempts")]
    Exhausted { attempts: u32 },
}

/// Failures parsing an ASCII grid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridParseError {
    #[error("grid text has no rows")]
    Empty,
    #[error("row {row} has {found} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown tile {ch:?} at row {row}, column {col}")]
    UnknownTile { row: usize, col: usize, ch: char },
}

/// Failures building a level session from a grid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("grid has no player spawn marker")]
    MissingPlayerSpawn,
}

/// Failures encoding, decoding, or playing back a replay.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to encode replay: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("failed to decode replay: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Session(#[from] SessionError),
}
