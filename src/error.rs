//! Error types for level and session configuration
//!
//! Only load-time problems are errors. Probe misses, out-of-map queries and
//! the end of a replay are ordinary return values.

use thiserror::Error;

/// Errors raised while building a level or a session
#[derive(Debug, Error)]
pub enum MayhemError {
    #[error("terrain has zero extent ({width}x{height})")]
    EmptyTerrain { width: usize, height: usize },

    #[error("terrain has {actual} cells, expected {width}x{height}")]
    TerrainSize {
        width: usize,
        height: usize,
        actual: usize,
    },

    #[error("terrain row {row} is {actual} cells wide, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("platform {index} is malformed: {reason}")]
    InvalidPlatform { index: usize, reason: String },

    #[error("level has no spawn points")]
    NoSpawnPoints,

    #[error("spawn point {index} at ({x}, {y}) lies outside the terrain")]
    SpawnOutOfBounds { index: usize, x: i32, y: i32 },

    #[error("session needs {needed} spawn points, level has {available}")]
    NotEnoughSpawns { needed: usize, available: usize },

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
