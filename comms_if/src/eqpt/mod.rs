//! # Equipment Interface
//!
//! This module defines the interface structures which are received from equipment.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod lidar;
