//! # Right-of-way rules
//!
//! Approximates the collision regulations by classifying each obstacle from its bearing relative
//! to the vessel's (predicted) heading. Bearings here are measured positive to starboard, so an
//! obstacle fine on the starboard bow has a small positive bearing.
//!
//! | Encounter           | Bearing                 | Expected behaviour               |
//! |---------------------|-------------------------|----------------------------------|
//! | Head-on             | `abs(b) < 20 deg`       | give way, turn at the head-on rate |
//! | Crossing from right | `0 < b < 120 deg`       | stand on, hold course            |
//! | Crossing from left  | `-120 deg < b < 0`      | give way, turn at the give-way rate |
//!
//! Obstacles abaft the crossing sectors impose no rule.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use util::maths::{clamp, wrap_pi};

use crate::auto::per::DynamicObstacle;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the right-of-way rules. Turn rates are positive to port.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RightOfWayParams {
    /// Half-width of the head-on sector
    pub head_on_sector_rad: f64,

    /// Extent of each crossing sector from the bow
    pub crossing_sector_rad: f64,

    /// Obstacles slower than this are never treated as head-on
    pub head_on_min_speed_ms: f64,

    /// Turn rate expected of the vessel in a head-on encounter
    pub head_on_avoid_rate_rads: f64,

    /// Deviation from the head-on rate at which the factor reaches its floor
    pub head_on_deviation_span_rads: f64,

    /// Smallest factor a head-on encounter can apply
    pub head_on_floor: f64,

    /// Turn rate at which the stand-on factor reaches its floor
    pub stand_on_turn_span_rads: f64,

    /// Smallest factor a stand-on encounter can apply
    pub stand_on_floor: f64,

    /// Turn rate expected of the vessel when giving way to an obstacle crossing from the left
    pub give_way_avoid_rate_rads: f64,

    /// Deviation from the give-way rate at which the factor reaches its floor
    pub give_way_deviation_span_rads: f64,

    /// Smallest factor a give-way encounter can apply
    pub give_way_floor: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Encounter {
    HeadOn,
    CrossingFromRight,
    CrossingFromLeft,
    /// Obstacle astern of the crossing sectors
    Clear,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Bearing of `target_m` seen from `position_m` with the given heading, positive to starboard,
/// in `[-pi, pi)`.
pub fn relative_bearing(position_m: &Vector2<f64>, heading_rad: f64, target_m: &Vector2<f64>) -> f64 {
    let rel = target_m - position_m;
    -wrap_pi(rel[1].atan2(rel[0]) - heading_rad)
}

/// Classify an obstacle from its relative bearing and speed.
pub fn classify(bearing_rad: f64, obstacle_speed_ms: f64, params: &RightOfWayParams) -> Encounter {
    if bearing_rad.abs() < params.head_on_sector_rad
        && obstacle_speed_ms >= params.head_on_min_speed_ms
    {
        Encounter::HeadOn
    } else if bearing_rad > 0.0 && bearing_rad < params.crossing_sector_rad {
        Encounter::CrossingFromRight
    } else if bearing_rad < 0.0 && bearing_rad > -params.crossing_sector_rad {
        Encounter::CrossingFromLeft
    } else {
        Encounter::Clear
    }
}

/// Factor in `[floor, 1]` rewarding turn rates that follow the rule for the encounter.
pub fn rule_factor(encounter: Encounter, angular_rads: f64, params: &RightOfWayParams) -> f64 {
    match encounter {
        Encounter::HeadOn => clamp(
            1.0 - (angular_rads - params.head_on_avoid_rate_rads).abs()
                / params.head_on_deviation_span_rads,
            params.head_on_floor,
            1.0,
        ),
        Encounter::CrossingFromRight => clamp(
            1.0 - angular_rads.abs() / params.stand_on_turn_span_rads,
            params.stand_on_floor,
            1.0,
        ),
        Encounter::CrossingFromLeft => clamp(
            1.0 - (angular_rads - params.give_way_avoid_rate_rads).abs()
                / params.give_way_deviation_span_rads,
            params.give_way_floor,
            1.0,
        ),
        Encounter::Clear => 1.0,
    }
}

/// Right-of-way score of a candidate, the product of the per-obstacle factors.
///
/// Each obstacle's rule factor is further scaled by `distance / right_of_way_distance_m` when the
/// predicted position is inside that distance, so close encounters dominate.
pub fn score(
    position_m: &Vector2<f64>,
    heading_rad: f64,
    angular_rads: f64,
    obstacles: &[DynamicObstacle],
    right_of_way_distance_m: f64,
    params: &RightOfWayParams,
) -> f64 {
    obstacles.iter().fold(1.0, |score, obs| {
        let bearing_rad = relative_bearing(position_m, heading_rad, &obs.position_m);
        let encounter = classify(bearing_rad, obs.velocity_ms.norm(), params);

        let mut factor = rule_factor(encounter, angular_rads, params);

        let dist_m = (obs.position_m - position_m).norm();
        if dist_m < right_of_way_distance_m {
            factor *= dist_m / right_of_way_distance_m;
        }

        score * factor
    })
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for RightOfWayParams {
    fn default() -> Self {
        let deg = std::f64::consts::PI / 180.0;

        Self {
            head_on_sector_rad: 20.0 * deg,
            crossing_sector_rad: 120.0 * deg,
            head_on_min_speed_ms: 0.0,
            head_on_avoid_rate_rads: 45.0 * deg,
            head_on_deviation_span_rads: 90.0 * deg,
            head_on_floor: 0.3,
            stand_on_turn_span_rads: 30.0 * deg,
            stand_on_floor: 0.4,
            give_way_avoid_rate_rads: -30.0 * deg,
            give_way_deviation_span_rads: 60.0 * deg,
            give_way_floor: 0.3,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::Vector2;

    const DEG: f64 = std::f64::consts::PI / 180.0;

    #[test]
    fn test_relative_bearing() {
        let origin = Vector2::new(0.0, 0.0);

        // Heading north, an obstacle to the east is on the starboard beam
        let b = relative_bearing(&origin, 90.0 * DEG, &Vector2::new(5.0, 0.0));
        assert!((b - 90.0 * DEG).abs() < 1e-9);

        // Heading east, an obstacle to the north is on the port beam
        let b = relative_bearing(&origin, 0.0, &Vector2::new(0.0, 5.0));
        assert!((b + 90.0 * DEG).abs() < 1e-9);
    }

    #[test]
    fn test_classify() {
        let params = RightOfWayParams::default();

        assert_eq!(classify(0.0, 0.0, &params), Encounter::HeadOn);
        assert_eq!(classify(-19.0 * DEG, 1.0, &params), Encounter::HeadOn);
        assert_eq!(classify(30.0 * DEG, 1.0, &params), Encounter::CrossingFromRight);
        assert_eq!(classify(-30.0 * DEG, 1.0, &params), Encounter::CrossingFromLeft);
        assert_eq!(classify(150.0 * DEG, 1.0, &params), Encounter::Clear);

        let gated = RightOfWayParams {
            head_on_min_speed_ms: 0.5,
            ..params
        };
        assert_eq!(classify(10.0 * DEG, 0.1, &gated), Encounter::CrossingFromRight);
        assert_eq!(classify(10.0 * DEG, 0.6, &gated), Encounter::HeadOn);
    }

    #[test]
    fn test_rule_factor() {
        let params = RightOfWayParams::default();

        // Following the rule scores full marks
        assert!((rule_factor(Encounter::HeadOn, 45.0 * DEG, &params) - 1.0).abs() < 1e-9);
        assert!((rule_factor(Encounter::CrossingFromRight, 0.0, &params) - 1.0).abs() < 1e-9);
        assert!((rule_factor(Encounter::CrossingFromLeft, -30.0 * DEG, &params) - 1.0).abs() < 1e-9);

        // Deviating is penalised down to the floor
        assert!((rule_factor(Encounter::HeadOn, 0.0, &params) - 0.5).abs() < 1e-9);
        assert!((rule_factor(Encounter::HeadOn, -45.0 * DEG, &params) - 0.3).abs() < 1e-9);
        assert!((rule_factor(Encounter::CrossingFromRight, 45.0 * DEG, &params) - 0.4).abs() < 1e-9);
        assert!((rule_factor(Encounter::CrossingFromLeft, 30.0 * DEG, &params) - 0.3).abs() < 1e-9);
        assert_eq!(rule_factor(Encounter::Clear, 45.0 * DEG, &params), 1.0);
    }

    #[test]
    fn test_score_combines_obstacles() {
        let params = RightOfWayParams::default();
        let origin = Vector2::new(0.0, 0.0);

        // Far away crossing from the right and from the left
        let obstacles = vec![
            DynamicObstacle {
                position_m: Vector2::new(10.0, -10.0),
                velocity_ms: Vector2::new(0.0, 1.0),
            },
            DynamicObstacle {
                position_m: Vector2::new(10.0, 10.0),
                velocity_ms: Vector2::new(0.0, -1.0),
            },
        ];

        // Holding course satisfies the first and costs half on the second
        let s = score(&origin, 0.0, 0.0, &obstacles, 4.0, &params);
        assert!((s - 0.5).abs() < 1e-9);

        // Close obstacles scale the factor by distance
        let close = vec![DynamicObstacle {
            position_m: Vector2::new(0.0, -2.0),
            velocity_ms: Vector2::zeros(),
        }];
        let s = score(&origin, 0.0, 0.0, &close, 4.0, &params);
        assert!((s - 0.5).abs() < 1e-9);

        assert_eq!(score(&origin, 0.0, 0.3, &[], 4.0, &params), 1.0);
    }
}
