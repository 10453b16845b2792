//! # Localisation module
//!
//! The vessel's pose is supplied every cycle by the navigation sensors (or by the simulation), so
//! this module only defines the pose type shared by the planners.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{UnitQuaternion, Vector2, Vector3};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The current pose (position and attitude in the world frame) of the vessel.
///
/// The world frame has X and Y in the water plane and Z upwards.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// The position in the world frame
    pub position_m: Vector3<f64>,

    /// The attitude of the vessel in the world frame.
    pub attitude_q: UnitQuaternion<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    pub fn new(position_m: Vector3<f64>, attitude_q: UnitQuaternion<f64>) -> Self {
        Self {
            position_m,
            attitude_q,
        }
    }

    /// Build a pose on the water plane from a planar position and a heading.
    pub fn from_planar(x_m: f64, y_m: f64, heading_rad: f64) -> Self {
        Self {
            position_m: Vector3::new(x_m, y_m, 0.0),
            attitude_q: UnitQuaternion::from_euler_angles(0.0, 0.0, heading_rad),
        }
    }

    /// Return the heading (angle to the positive X axis) of the vessel in radians.
    ///
    /// Heading is measured counter-clockwise and given in the range [-pi, pi].
    pub fn get_heading(&self) -> f64 {
        self.attitude_q.euler_angles().2
    }

    /// Position of the vessel projected onto the water plane.
    pub fn position2(&self) -> Vector2<f64> {
        Vector2::new(self.position_m[0], self.position_m[1])
    }

    /// Unit vector pointing along the vessel's heading in the water plane.
    pub fn forward2(&self) -> Vector2<f64> {
        let head_rad = self.get_heading();
        Vector2::new(head_rad.cos(), head_rad.sin())
    }

    /// Component of the given world velocity along the vessel's heading.
    pub fn forward_speed_ms(&self, velocity_ms: &Vector3<f64>) -> f64 {
        self.forward2()
            .dot(&Vector2::new(velocity_ms[0], velocity_ms[1]))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_pose_heading() {
        let pose = Pose::from_planar(1.0, 2.0, FRAC_PI_2);

        assert!((pose.get_heading() - FRAC_PI_2).abs() < 1e-12);
        assert_eq!(pose.position2(), Vector2::new(1.0, 2.0));
        assert!((pose.forward2() - Vector2::new(0.0, 1.0)).norm() < 1e-12);
        assert!((pose.forward_speed_ms(&Vector3::new(0.5, 2.0, 0.0)) - 2.0).abs() < 1e-12);
    }
}
