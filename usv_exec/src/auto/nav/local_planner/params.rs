//! Local planner parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::right_of_way::RightOfWayParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the local planner
#[derive(Debug, Clone, Deserialize)]
pub struct LocalPlannerParams {
    /// Candidate forward speeds, in the order they are evaluated. Zero is always added if missing.
    pub linear_options_ms: Vec<f64>,

    /// Candidate turn rates (positive to port), in the order they are evaluated. Zero is always
    /// added if missing.
    pub angular_options_rads: Vec<f64>,

    /// Top speed of the vessel, used to normalise the smoothness score
    pub max_linear_ms: f64,

    /// Length of the motion prediction for each candidate
    pub predict_horizon_s: f64,

    /// Number of equal integration steps the horizon is split into
    pub predict_steps: usize,

    /// Obstacles closer than this are avoided, and it sets the scale of the clearance and
    /// progress scores
    pub safe_distance_m: f64,

    /// Admitted returns closer together than this, on neighbouring bearings, are treated as one
    /// obstacle
    pub obstacle_join_distance_m: f64,

    /// Inside this distance of an obstacle the right-of-way score is scaled down further
    pub right_of_way_distance_m: f64,

    /// Distance at which the tracked waypoint is considered reached
    pub waypoint_arrival_m: f64,

    /// Once clear of obstacles, avoidance ends when the vessel is this close to the global path
    pub return_to_path_threshold_m: f64,

    /// Weights of the score terms
    pub weights: ScoreWeights,

    /// Right-of-way rule parameters
    pub right_of_way: RightOfWayParams,
}

/// Weights applied to each candidate score term before summing.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScoreWeights {
    pub clearance: f64,
    pub progress: f64,
    pub right_of_way: f64,
    pub smoothness: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for LocalPlannerParams {
    fn default() -> Self {
        let deg = std::f64::consts::PI / 180.0;

        Self {
            linear_options_ms: vec![0.0, 0.3, 0.8, 1.2, 1.5],
            // Port turns first
            angular_options_rads: [45.0, 30.0, 15.0, 0.0, -15.0, -30.0, -45.0]
                .iter()
                .map(|d| d * deg)
                .collect(),
            max_linear_ms: 1.5,
            predict_horizon_s: 0.8,
            predict_steps: 5,
            safe_distance_m: 3.0,
            obstacle_join_distance_m: 1.0,
            right_of_way_distance_m: 4.0,
            waypoint_arrival_m: 1.0,
            return_to_path_threshold_m: 2.0,
            weights: ScoreWeights::default(),
            right_of_way: RightOfWayParams::default(),
        }
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            clearance: 0.5,
            progress: 0.3,
            right_of_way: 0.15,
            smoothness: 0.05,
        }
    }
}
