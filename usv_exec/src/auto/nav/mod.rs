//! # Navigation
//!
//! This module provides the planners that move the vessel towards its goal.
//!
//! - [`GlobalPlanner`] - A* search over the occupancy grid producing the global path.
//! - [`LocalPlanner`] - Velocity-space search choosing each helm command, avoiding obstacles the
//!   grid doesn't know about while following the right-of-way rules.
//! - [`NavMgr`] - Runs both planners every tick and decides which of them, the waypoint follower
//!   or an [`ActionProposer`] drives the vessel.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod action_proposer;
pub mod global_planner;
pub mod local_planner;
pub mod nav_mgr;
pub mod open_set;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use action_proposer::{ActionProposer, DiscreteActionProposer};
pub use global_planner::{GlobalPlanner, GlobalPlannerParams, PlanError, SearchReport};
pub use local_planner::{CandidateScore, LocalPlan, LocalPlanner, LocalPlannerParams};
pub use nav_mgr::{NavInput, NavMgr, NavMgrError, NavMgrOutput, NavMgrParams, NavMode};
