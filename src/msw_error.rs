// Error taxonomy for session setup
// Only board configuration can fail; play itself has no runtime errors

use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Board dimension must be at least 1")]
    ZeroDimension,
    #[error("Board dimension {dimension} exceeds the maximum of {max}")]
    DimensionTooLarge { dimension: usize, max: usize },
    #[error("Too many mines: {mines} requested but the board only has {cells} cells")]
    TooManyMines { mines: usize, cells: usize },
    #[error("Mine at ({x}, {y}) lies outside the board")]
    MineOutOfBounds { x: i32, y: i32 },
}
