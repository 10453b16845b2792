//! # Telecommand module
//!
//! Commands produced by the autonomy software for the actuation layer.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod helm;
