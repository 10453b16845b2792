//! # USV library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to access items defined
//! inside the USV crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Autonomy module - mapping, planning and control of the vessel
pub mod auto;

/// Simulation module - kinematic world used to run scenarios
pub mod sim;
