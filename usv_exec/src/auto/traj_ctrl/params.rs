//! Waypoint follower parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the waypoint follower
#[derive(Deserialize, Debug, Clone)]
pub struct WaypointFollowerParams {
    /// Heading controller proportional gain
    pub head_k_p: f64,

    /// Heading controller integral gain
    pub head_k_i: f64,

    /// Heading controller derivative gain
    pub head_k_d: f64,

    /// Limit on the magnitude of the turn rate demand
    pub max_turn_rate_rads: f64,

    /// Speed demand when pointing straight at the waypoint
    pub max_speed_dem_ms: f64,

    /// Speed demand at or above `slow_head_error_rad` of heading error
    pub min_speed_dem_ms: f64,

    /// Heading error at which the speed demand bottoms out
    pub slow_head_error_rad: f64,
}

impl Default for WaypointFollowerParams {
    fn default() -> Self {
        Self {
            head_k_p: 1.2,
            head_k_i: 0.0,
            head_k_d: 0.1,
            max_turn_rate_rads: 0.785398,
            max_speed_dem_ms: 1.5,
            min_speed_dem_ms: 0.2,
            slow_head_error_rad: 1.570796,
        }
    }
}
