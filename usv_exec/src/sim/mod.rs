//! # Simulation
//!
//! A kinematic world for running the autonomy without a vessel: static obstacles, other traffic
//! moving at constant velocity and our own vessel integrating the helm commands it is given.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod scenario;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;
use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

use comms_if::tc::helm::HelmCmd;

use crate::auto::{
    loc::Pose,
    map::{ObstacleSet, ObstacleShape},
};

pub use scenario::{Scenario, ScenarioError, ScenarioStart};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A circular obstacle moving at constant velocity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovingObstacle {
    pub centre_m: Vector2<f64>,
    pub radius_m: f64,
    pub velocity_ms: Vector2<f64>,
}

#[derive(Debug, Clone)]
pub struct SimWorld {
    pub static_obstacles: ObstacleSet,
    pub moving_obstacles: Vec<MovingObstacle>,

    /// Radius of our vessel's footprint, used for collision checks
    pub vessel_radius_m: f64,

    pose: Pose,
    velocity_ms: Vector3<f64>,
    time_s: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MovingObstacle {
    pub fn shape(&self) -> ObstacleShape {
        ObstacleShape::Circle {
            centre_m: self.centre_m,
            radius_m: self.radius_m,
        }
    }
}

impl SimWorld {
    pub fn new(
        static_obstacles: ObstacleSet,
        moving_obstacles: Vec<MovingObstacle>,
        start: Pose,
        vessel_radius_m: f64,
    ) -> Self {
        Self {
            static_obstacles,
            moving_obstacles,
            vessel_radius_m,
            pose: start,
            velocity_ms: Vector3::zeros(),
            time_s: 0.0,
        }
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn velocity_ms(&self) -> Vector3<f64> {
        self.velocity_ms
    }

    pub fn time_s(&self) -> f64 {
        self.time_s
    }

    /// Advance the world by `dt_s` with the vessel obeying `cmd`.
    ///
    /// The vessel turns first and then moves along its new heading.
    pub fn step(&mut self, cmd: &HelmCmd, dt_s: f64) {
        for obs in self.moving_obstacles.iter_mut() {
            obs.centre_m += obs.velocity_ms * dt_s;
        }

        let heading_rad = self.pose.get_heading() + cmd.angular_rads * dt_s;
        let position_m = self.pose.position2()
            + Vector2::new(heading_rad.cos(), heading_rad.sin()) * cmd.linear_ms * dt_s;

        self.pose = Pose::from_planar(position_m[0], position_m[1], heading_rad);
        self.velocity_ms = Vector3::new(
            heading_rad.cos() * cmd.linear_ms,
            heading_rad.sin() * cmd.linear_ms,
            0.0,
        );
        self.time_s += dt_s;

        trace!(
            "Sim t = {:.2} s: vessel at ({:.2}, {:.2}) heading {:.3}",
            self.time_s,
            position_m[0],
            position_m[1],
            heading_rad
        );
    }

    /// Every obstacle as a lidar target. Static shapes keep ids `0..n`, moving obstacles follow.
    pub fn lidar_targets(&self) -> Vec<(usize, ObstacleShape)> {
        let num_static = self.static_obstacles.shapes.len();

        self.static_obstacles
            .shapes
            .iter()
            .cloned()
            .enumerate()
            .chain(
                self.moving_obstacles
                    .iter()
                    .enumerate()
                    .map(|(i, m)| (num_static + i, m.shape())),
            )
            .collect()
    }

    /// Returns true if the vessel's footprint touches any obstacle.
    pub fn in_collision(&self) -> bool {
        let position_m = self.pose.position2();

        self.static_obstacles
            .shapes
            .iter()
            .map(|s| s.distance_to(&position_m))
            .chain(
                self.moving_obstacles
                    .iter()
                    .map(|m| m.shape().distance_to(&position_m)),
            )
            .any(|d| d <= self.vessel_radius_m)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn world() -> SimWorld {
        SimWorld::new(
            ObstacleSet::new(vec![ObstacleShape::Box {
                min_m: Vector2::new(5.0, -1.0),
                max_m: Vector2::new(6.0, 1.0),
            }]),
            vec![MovingObstacle {
                centre_m: Vector2::new(0.0, 10.0),
                radius_m: 1.0,
                velocity_ms: Vector2::new(0.0, -1.0),
            }],
            Pose::from_planar(0.0, 0.0, 0.0),
            0.5,
        )
    }

    #[test]
    fn test_kinematics() {
        let mut w = world();

        w.step(&HelmCmd::new(1.0, 0.0), 1.0);
        assert!((w.pose().position2() - Vector2::new(1.0, 0.0)).norm() < 1e-9);
        assert!((w.velocity_ms() - Vector3::new(1.0, 0.0, 0.0)).norm() < 1e-9);
        assert!((w.moving_obstacles[0].centre_m - Vector2::new(0.0, 9.0)).norm() < 1e-9);

        // Turn to port on the spot
        w.step(&HelmCmd::new(0.0, std::f64::consts::FRAC_PI_2), 1.0);
        assert!((w.pose().get_heading() - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
        assert!((w.pose().position2() - Vector2::new(1.0, 0.0)).norm() < 1e-9);
        assert!((w.time_s() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_collision() {
        let mut w = world();
        assert!(!w.in_collision());

        // Up to the quay
        for _ in 0..9 {
            w.step(&HelmCmd::new(0.5, 0.0), 1.0);
        }
        assert!(w.in_collision());

        let targets = w.lidar_targets();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[1].0, 1);
    }
}
