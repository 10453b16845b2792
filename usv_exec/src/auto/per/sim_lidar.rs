//! # Simulated lidar
//!
//! Raycasts against obstacle shapes to stand in for the real sensor. Bearing `i` points
//! `i / N * 360 - 180` degrees from the vessel's heading, counter-clockwise.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::f64::consts::PI;

use log::trace;
use nalgebra::{Vector2, Vector3};
use serde::Deserialize;

use super::RangeSensor;
use crate::auto::{loc::Pose, map::ObstacleShape};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SimLidarParams {
    /// Number of bearings in a full scan
    pub num_samples: usize,

    /// Rays further than this are misses
    pub max_range_m: f64,

    /// Number of rays cast by each incremental `scan` call
    pub rays_per_scan: usize,
}

#[derive(Debug, Clone)]
pub struct SimLidar {
    params: SimLidarParams,

    /// Shapes the rays can hit, tagged with an id that stays the same while the shape moves
    targets: Vec<(usize, ObstacleShape)>,

    distances: Vec<f64>,
    points: Vec<Vector3<f64>>,
    velocities: Vec<Vector3<f64>>,

    /// Target hit by each bearing last time it was cast, and when
    last_hits: Vec<Option<(usize, f64)>>,

    /// Next bearing to cast in an incremental scan
    cursor: usize,

    time_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SimLidarParams {
    fn default() -> Self {
        Self {
            num_samples: 360,
            max_range_m: 20.0,
            rays_per_scan: 30,
        }
    }
}

impl SimLidar {
    pub fn new(params: SimLidarParams) -> Self {
        let n = params.num_samples;

        Self {
            distances: vec![params.max_range_m; n],
            points: vec![Vector3::zeros(); n],
            velocities: vec![Vector3::zeros(); n],
            last_hits: vec![None; n],
            params,
            targets: Vec::new(),
            cursor: 0,
            time_s: 0.0,
        }
    }

    /// Replace the set of shapes the rays can hit.
    pub fn set_targets(&mut self, targets: Vec<(usize, ObstacleShape)>) {
        self.targets = targets;
    }

    /// Bearing of a sample relative to the heading, counter-clockwise.
    pub fn bearing_rad(&self, bearing_idx: usize) -> f64 {
        bearing_idx as f64 / self.params.num_samples as f64 * 2.0 * PI - PI
    }

    fn cast(&mut self, pose: &Pose, bearing_idx: usize) {
        let origin_m = pose.position2();
        let angle_rad = pose.get_heading() + self.bearing_rad(bearing_idx);
        let direction = Vector2::new(angle_rad.cos(), angle_rad.sin());
        let max_range_m = self.params.max_range_m;

        let hit = self
            .targets
            .iter()
            .filter_map(|(id, shape)| {
                shape
                    .ray_intersect(&origin_m, &direction, max_range_m)
                    .map(|d| (*id, d))
            })
            .fold(None, |best: Option<(usize, f64)>, (id, d)| match best {
                Some((_, best_d)) if best_d <= d => best,
                _ => Some((id, d)),
            });

        let distance_m = hit.map(|(_, d)| d).unwrap_or(max_range_m);
        let end_m = origin_m + direction * distance_m;
        let point_m = Vector3::new(end_m[0], end_m[1], pose.position_m[2]);

        let velocity_ms = match (hit, self.last_hits[bearing_idx]) {
            (Some((id, _)), Some((last_id, last_time_s)))
                if id == last_id && self.time_s > last_time_s =>
            {
                (point_m - self.points[bearing_idx]) / (self.time_s - last_time_s)
            }
            _ => Vector3::zeros(),
        };

        self.distances[bearing_idx] = distance_m;
        self.points[bearing_idx] = point_m;
        self.velocities[bearing_idx] = velocity_ms;
        self.last_hits[bearing_idx] = hit.map(|(id, _)| (id, self.time_s));
    }
}

impl RangeSensor for SimLidar {
    fn num_samples(&self) -> usize {
        self.params.num_samples
    }

    fn scan(&mut self, pose: &Pose, dt_s: f64) {
        let n = self.params.num_samples;
        if n == 0 {
            return;
        }

        self.time_s += dt_s;

        for _ in 0..self.params.rays_per_scan.min(n) {
            self.cast(pose, self.cursor);
            self.cursor = (self.cursor + 1) % n;
            if self.cursor == 0 {
                break;
            }
        }
    }

    fn complete_scan(&mut self, pose: &Pose, dt_s: f64) {
        self.time_s += dt_s;

        for bearing_idx in self.cursor..self.params.num_samples {
            self.cast(pose, bearing_idx);
        }
        self.cursor = 0;

        trace!(
            "Completed scan, closest return {:.2} m",
            self.distances.iter().cloned().fold(f64::INFINITY, f64::min)
        );
    }

    fn distances(&self) -> &[f64] {
        &self.distances
    }

    fn points(&self) -> &[Vector3<f64>] {
        &self.points
    }

    fn velocities(&self) -> &[Vector3<f64>] {
        &self.velocities
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn params(num_samples: usize) -> SimLidarParams {
        SimLidarParams {
            num_samples,
            max_range_m: 20.0,
            rays_per_scan: 3,
        }
    }

    #[test]
    fn test_bearings() {
        let lidar = SimLidar::new(params(4));

        // Index 0 points astern, index N/2 straight ahead
        assert!((lidar.bearing_rad(0) + PI).abs() < 1e-12);
        assert!(lidar.bearing_rad(2).abs() < 1e-12);
        assert!((lidar.bearing_rad(3) - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_hit_and_miss() {
        let mut lidar = SimLidar::new(params(4));
        lidar.set_targets(vec![(
            7,
            ObstacleShape::Circle {
                centre_m: Vector2::new(5.0, 0.0),
                radius_m: 1.0,
            },
        )]);

        let pose = Pose::from_planar(0.0, 0.0, 0.0);
        lidar.complete_scan(&pose, 0.1);

        // Ahead hits the near edge of the circle
        assert!((lidar.distances()[2] - 4.0).abs() < 1e-9);
        assert!((lidar.points()[2] - Vector3::new(4.0, 0.0, 0.0)).norm() < 1e-9);
        assert_eq!(lidar.velocities()[2], Vector3::zeros());

        // Port beam misses, reporting max range and the ray end point
        assert_eq!(lidar.distances()[3], 20.0);
        assert!((lidar.points()[3] - Vector3::new(0.0, 20.0, 0.0)).norm() < 1e-9);

        let returns = lidar.returns();
        assert_eq!(returns.len(), 4);
        assert_eq!(returns[2].bearing_idx, 2);
    }

    #[test]
    fn test_velocity_estimate() {
        let mut lidar = SimLidar::new(params(4));
        let pose = Pose::from_planar(0.0, 0.0, 0.0);
        let circle = ObstacleShape::Circle {
            centre_m: Vector2::new(5.0, 0.0),
            radius_m: 1.0,
        };

        lidar.set_targets(vec![(1, circle)]);
        lidar.complete_scan(&pose, 0.5);

        // Closing at 1 m/s
        lidar.set_targets(vec![(1, circle.translated(&Vector2::new(-0.5, 0.0)))]);
        lidar.complete_scan(&pose, 0.5);
        assert!((lidar.velocities()[2] - Vector3::new(-1.0, 0.0, 0.0)).norm() < 1e-9);

        // A different target on the same bearing starts from zero
        lidar.set_targets(vec![(2, circle)]);
        lidar.complete_scan(&pose, 0.5);
        assert_eq!(lidar.velocities()[2], Vector3::zeros());
    }

    #[test]
    fn test_incremental_scan() {
        let mut lidar = SimLidar::new(params(4));
        lidar.set_targets(vec![(
            0,
            ObstacleShape::Box {
                min_m: Vector2::new(-10.0, -10.0),
                max_m: Vector2::new(-2.0, 10.0),
            },
        )]);
        let pose = Pose::from_planar(0.0, 0.0, 0.0);

        // Three rays, then the last one is finished by the complete scan
        lidar.scan(&pose, 0.1);
        assert!((lidar.distances()[0] - 2.0).abs() < 1e-9);
        assert_eq!(lidar.distances()[3], 20.0);
        assert!((lidar.points()[3]).norm() < 1e-9);

        lidar.complete_scan(&pose, 0.1);
        assert!((lidar.points()[3] - Vector3::new(0.0, 20.0, 0.0)).norm() < 1e-9);
    }
}
