//! # Perception module
//!
//! Range sensing and the filter that decides which sensed returns the local planner must react
//! to.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod external_lidar;
mod sim_lidar;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Vector2, Vector3};

use comms_if::eqpt::lidar::LidarReturn;

use crate::auto::{loc::Pose, map::OccupancyGrid};

pub use external_lidar::{ExternalLidar, ScanReplay};
pub use sim_lidar::{SimLidar, SimLidarParams};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A sensor producing a fixed number of range samples at evenly spaced bearings around the
/// vessel.
///
/// The sample arrays returned by `distances`, `points` and `velocities` all have length
/// `num_samples` and are indexed by bearing.
pub trait RangeSensor {
    fn num_samples(&self) -> usize;

    /// Advance the scan by a bounded number of rays.
    fn scan(&mut self, pose: &Pose, dt_s: f64);

    /// Finish every ray of the current scan.
    fn complete_scan(&mut self, pose: &Pose, dt_s: f64);

    fn distances(&self) -> &[f64];

    fn points(&self) -> &[Vector3<f64>];

    fn velocities(&self) -> &[Vector3<f64>];

    /// Get the latest sample for every bearing as a list of returns.
    fn returns(&self) -> Vec<LidarReturn> {
        self.distances()
            .iter()
            .zip(self.points().iter())
            .zip(self.velocities().iter())
            .enumerate()
            .map(|(bearing_idx, ((d, p), v))| LidarReturn {
                bearing_idx,
                distance_m: *d,
                point_m: *p,
                velocity_ms: *v,
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An obstacle the local planner has to avoid, in the water plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicObstacle {
    pub position_m: Vector2<f64>,
    pub velocity_ms: Vector2<f64>,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Select the returns that should trigger reactive avoidance.
///
/// A return is admitted if it is closer than `safe_distance_m` and lands in a cell the grid marks
/// walkable. Returns from mapped obstacles are dropped since the global path already goes around
/// them.
pub fn admit_obstacles(
    returns: &[LidarReturn],
    grid: &OccupancyGrid,
    safe_distance_m: f64,
) -> Vec<DynamicObstacle> {
    returns
        .iter()
        .filter(|r| r.distance_m < safe_distance_m)
        .map(|r| DynamicObstacle {
            position_m: Vector2::new(r.point_m[0], r.point_m[1]),
            velocity_ms: Vector2::new(r.velocity_ms[0], r.velocity_ms[1]),
        })
        .filter(|o| grid.is_walkable(&grid.world_to_grid(&o.position_m)))
        .collect()
}

/// Merge admitted returns that belong to the same object.
///
/// `admitted` must be in bearing order. Consecutive returns whose points are closer than
/// `join_distance_m` form one group, and the groups at either end of the sweep are merged if
/// they meet across the wrap-around. Each group is reduced to the point nearest `vessel_m`,
/// moving at the mean velocity of its members.
pub fn group_obstacles(
    admitted: &[DynamicObstacle],
    vessel_m: &Vector2<f64>,
    join_distance_m: f64,
) -> Vec<DynamicObstacle> {
    let mut groups: Vec<Vec<DynamicObstacle>> = Vec::new();

    for obs in admitted.iter() {
        let joins = groups
            .last()
            .and_then(|g| g.last())
            .map(|prev| (prev.position_m - obs.position_m).norm() < join_distance_m)
            .unwrap_or(false);

        if joins {
            if let Some(group) = groups.last_mut() {
                group.push(*obs);
            }
        } else {
            groups.push(vec![*obs]);
        }
    }

    if groups.len() > 1 {
        let first = groups.first().and_then(|g| g.first());
        let last = groups.last().and_then(|g| g.last());
        let wraps = match (first, last) {
            (Some(f), Some(l)) => (f.position_m - l.position_m).norm() < join_distance_m,
            _ => false,
        };
        if wraps {
            if let Some(mut merged) = groups.pop() {
                merged.append(&mut groups[0]);
                groups[0] = merged;
            }
        }
    }

    groups
        .iter()
        .filter_map(|group| {
            let nearest = group.iter().min_by(|a, b| {
                (a.position_m - vessel_m)
                    .norm()
                    .total_cmp(&(b.position_m - vessel_m).norm())
            })?;
            let velocity_ms = group
                .iter()
                .fold(Vector2::zeros(), |acc, o| acc + o.velocity_ms)
                / group.len() as f64;

            Some(DynamicObstacle {
                position_m: nearest.position_m,
                velocity_ms,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::auto::map::{occupancy_grid::test::built_grid, CellIdx};

    fn ret(bearing_idx: usize, distance_m: f64, x_m: f64, y_m: f64) -> LidarReturn {
        LidarReturn {
            bearing_idx,
            distance_m,
            point_m: Vector3::new(x_m, y_m, 0.0),
            velocity_ms: Vector3::new(0.5, 0.0, 0.0),
        }
    }

    #[test]
    fn test_admission() {
        let mut grid = built_grid(20.0, 20.0, 1.0);
        grid.set_walkable(&CellIdx::new(12, 10), false).unwrap();

        let returns = vec![
            // Close, unmapped
            ret(0, 2.0, 10.5, 12.5),
            // Close but already in the map
            ret(1, 2.0, 12.5, 10.5),
            // Beyond the safe distance
            ret(2, 3.5, 13.5, 10.5),
        ];

        let admitted = admit_obstacles(&returns, &grid, 3.0);
        assert_eq!(admitted.len(), 1);
        assert_eq!(admitted[0].position_m, Vector2::new(10.5, 12.5));
        assert_eq!(admitted[0].velocity_ms, Vector2::new(0.5, 0.0));

        assert!(admit_obstacles(&[], &grid, 3.0).is_empty());
    }

    fn obs(x_m: f64, y_m: f64, vx_ms: f64) -> DynamicObstacle {
        DynamicObstacle {
            position_m: Vector2::new(x_m, y_m),
            velocity_ms: Vector2::new(vx_ms, 0.0),
        }
    }

    #[test]
    fn test_grouping() {
        let vessel = Vector2::new(0.0, 0.0);

        // One hull seen along three neighbouring bearings, then a separate buoy
        let admitted = vec![
            obs(2.0, -0.4, -1.0),
            obs(1.8, 0.0, -0.8),
            obs(2.0, 0.4, -0.6),
            obs(0.0, 2.5, 0.0),
        ];
        let grouped = group_obstacles(&admitted, &vessel, 1.0);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].position_m, Vector2::new(1.8, 0.0));
        assert!((grouped[0].velocity_ms - Vector2::new(-0.8, 0.0)).norm() < 1e-12);
        assert_eq!(grouped[1], admitted[3]);

        // A hull dead astern is split across the ends of the sweep
        let astern = vec![obs(-2.0, -0.3, 0.2), obs(0.0, 2.5, 0.0), obs(-2.0, 0.3, 0.4)];
        let grouped = group_obstacles(&astern, &vessel, 1.0);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].position_m, Vector2::new(-2.0, 0.3));
        assert!((grouped[0].velocity_ms - Vector2::new(0.3, 0.0)).norm() < 1e-12);
        assert_eq!(grouped[1], astern[1]);

        assert!(group_obstacles(&[], &vessel, 1.0).is_empty());
        assert_eq!(group_obstacles(&admitted[3..], &vessel, 1.0).len(), 1);
    }
}
