//! # Autonomy Module
//!
//! This module provides the autonomy of the vessel, taking it from its current position to a goal
//! across the operating area while keeping clear of other traffic.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Localisation module - defines the pose of the vessel
pub mod loc;

/// Trajectory control module - follows waypoints when nothing needs avoiding
pub mod traj_ctrl;

/// Defines path types
pub mod path;

/// Navigation module - global and local planning
pub mod nav;

/// Map module - occupancy grid and static obstacles
pub mod map;

/// Perception module - range sensors and obstacle admission
pub mod per;
