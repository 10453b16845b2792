//! # Communications interface crate.
//!
//! Provides the data types exchanged between the autonomy software and its collaborators: the
//! helm (actuation) layer and the range sensor.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Commands sent to the helm/actuation layer
pub mod tc;

/// Data produced by equipment (like the range sensor)
pub mod eqpt;
