//! # Path
//!
//! This module defines the global path produced by the planner and followed by the vessel.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::map::{CellIdx, OccupancyGrid};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Segments shorter than this are treated as a single point when measuring distance to the path.
pub const DEGENERATE_SEGMENT_LENGTH_M: f64 = 0.01;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A path through the occupancy grid, from the start cell to the goal cell inclusive.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Path {
    /// The cells visited by the path
    pub cells: Vec<CellIdx>,

    /// World positions of the centres of `cells`, in the water plane
    pub points_m: Vec<Vector2<f64>>,

    /// Sum of the step costs along the path
    pub cost_m: f64,
}

/// A segment between two path points
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PathSegment {
    /// The target of the segment
    pub target_m: Vector2<f64>,

    /// The start point of the segment
    pub start_m: Vector2<f64>,

    /// The length of the segment
    pub length_m: f64,

    /// The heading (angle to the +ve x axis) of the segment
    pub heading_rad: f64,

    /// Unit vector pointing in the direction of the segment, zero for degenerate segments
    pub direction: Vector2<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Path {
    /// Create a new empty path
    pub fn new_empty() -> Self {
        Path {
            cells: Vec::new(),
            points_m: Vec::new(),
            cost_m: 0.0,
        }
    }

    /// Build a path from a cell sequence, looking up the cell centres in the grid.
    pub fn from_cells(cells: Vec<CellIdx>, grid: &OccupancyGrid, cost_m: f64) -> Self {
        let points_m = cells.iter().map(|c| grid.grid_to_world2(c)).collect();

        Path {
            cells,
            points_m,
            cost_m,
        }
    }

    /// Returns the path segment connecting the target point and the previous
    /// point.
    ///
    /// If no segment exists (the target is the first point in the sequence or
    /// is beyond the end of the sequence) then `None` will be returned
    pub fn get_segment_to_target(&self, target_index: usize) -> Option<PathSegment> {
        if target_index == 0 || target_index >= self.points_m.len() {
            return None;
        }

        let start_m = self.points_m[target_index - 1];
        let target_m = self.points_m[target_index];
        let delta = target_m - start_m;
        let length_m = delta.norm();

        let direction = if length_m > 0.0 {
            delta / length_m
        } else {
            Vector2::zeros()
        };

        Some(PathSegment {
            target_m,
            start_m,
            length_m,
            heading_rad: delta[1].atan2(delta[0]),
            direction,
        })
    }

    /// Return the length of the path in meters.
    ///
    /// If the path is empty (not enough points) then `None` is returned.
    pub fn get_length(&self) -> Option<f64> {
        if self.points_m.len() < 2 {
            return None;
        }

        Some(
            self.points_m
                .windows(2)
                .map(|p| (p[1] - p[0]).norm())
                .sum(),
        )
    }

    /// Get the number of points in the path
    pub fn get_num_points(&self) -> usize {
        self.points_m.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points_m.is_empty()
    }

    /// Minimum distance from the point to any segment of the path.
    ///
    /// Returns `None` if the path has fewer than two points.
    pub fn distance_to(&self, point_m: &Vector2<f64>) -> Option<f64> {
        (1..self.points_m.len())
            .filter_map(|i| self.get_segment_to_target(i))
            .map(|seg| seg.distance_to(point_m))
            .fold(None, |min: Option<f64>, d| {
                Some(min.map_or(d, |m| m.min(d)))
            })
    }

    /// Whether the point is within `threshold_m` of the path.
    ///
    /// Paths with fewer than two points have no segments to leave, so every point counts as close.
    pub fn is_close_to(&self, point_m: &Vector2<f64>, threshold_m: f64) -> bool {
        self.distance_to(point_m)
            .map(|d| d < threshold_m)
            .unwrap_or(true)
    }
}

impl PathSegment {
    /// Distance from the point to the closest point on the segment.
    pub fn distance_to(&self, point_m: &Vector2<f64>) -> f64 {
        if self.length_m < DEGENERATE_SEGMENT_LENGTH_M {
            return (point_m - self.start_m).norm();
        }

        let along_m = (point_m - self.start_m)
            .dot(&self.direction)
            .max(0.0)
            .min(self.length_m);

        (point_m - (self.start_m + self.direction * along_m)).norm()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn l_path() -> Path {
        Path {
            cells: vec![],
            points_m: vec![
                Vector2::new(0.0, 0.0),
                Vector2::new(4.0, 0.0),
                Vector2::new(4.0, 3.0),
            ],
            cost_m: 7.0,
        }
    }

    #[test]
    fn test_segments() {
        let path = l_path();

        assert!(path.get_segment_to_target(0).is_none());
        assert!(path.get_segment_to_target(3).is_none());

        let seg = path.get_segment_to_target(2).unwrap();
        assert_eq!(seg.length_m, 3.0);
        assert!((seg.heading_rad - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert_eq!(path.get_length(), Some(7.0));
        assert_eq!(Path::new_empty().get_length(), None);
    }

    #[test]
    fn test_distance_to() {
        let path = l_path();

        assert!((path.distance_to(&Vector2::new(2.0, 1.0)).unwrap() - 1.0).abs() < 1e-12);
        assert!((path.distance_to(&Vector2::new(5.0, 2.0)).unwrap() - 1.0).abs() < 1e-12);
        // Beyond the end of the first segment the end point is closest
        assert!((path.distance_to(&Vector2::new(-3.0, 4.0)).unwrap() - 5.0).abs() < 1e-12);

        assert!(path.is_close_to(&Vector2::new(2.0, 1.0), 2.0));
        assert!(!path.is_close_to(&Vector2::new(2.0, 2.5), 1.0));

        // Too short to have any segments
        assert_eq!(Path::new_empty().distance_to(&Vector2::new(1.0, 1.0)), None);
        assert!(Path::new_empty().is_close_to(&Vector2::new(100.0, 0.0), 2.0));
    }

    #[test]
    fn test_degenerate_segment() {
        let seg = PathSegment {
            start_m: Vector2::new(1.0, 1.0),
            target_m: Vector2::new(1.0, 1.005),
            length_m: 0.005,
            heading_rad: 0.0,
            direction: Vector2::new(0.0, 1.0),
        };

        assert!((seg.distance_to(&Vector2::new(4.0, 5.0)) - 5.0).abs() < 1e-12);
    }
}
