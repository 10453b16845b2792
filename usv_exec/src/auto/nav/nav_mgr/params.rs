//! Parameters for the navigation manager

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use serde::Deserialize;

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct NavMgrParams {
    /// The vessel has arrived once it is this close to the goal
    pub goal_tolerance_m: f64,

    /// A re-plan is requested when the vessel is further than this from the global path
    pub lost_path_distance_m: f64,

    /// Delay before trying again after the global planner fails
    pub replan_retry_delay_s: f64,

    /// Delay between a reported collision and the re-plan it triggers
    pub collision_replan_delay_s: f64,
}

impl Default for NavMgrParams {
    fn default() -> Self {
        Self {
            goal_tolerance_m: 1.0,
            lost_path_distance_m: 5.0,
            replan_retry_delay_s: 2.0,
            collision_replan_delay_s: 0.5,
        }
    }
}
