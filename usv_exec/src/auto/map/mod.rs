//! # Map
//!
//! This module implements the [`OccupancyGrid`], the dense walkability map both planners read, and
//! the [`ObstacleField`] interface it is refreshed from.

// ------------------------------------------------------------------------------------------------
// MODS
// ------------------------------------------------------------------------------------------------

/// Implements the [`OccupancyGrid`] type
pub mod occupancy_grid;

/// Static obstacle shapes and queries
pub mod obstacles;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use obstacles::{ObstacleField, ObstacleSet, ObstacleShape};
pub use occupancy_grid::{
    BuildStatus, Cell, CellBounds, CellIdx, GridError, OccupancyGrid, OccupancyGridParams,
    OperatingArea,
};
