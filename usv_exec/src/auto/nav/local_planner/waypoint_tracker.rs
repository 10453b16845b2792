//! Tracks which waypoint of the global path the local planner is steering towards.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use nalgebra::Vector2;

use crate::auto::path::Path;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct WaypointTracker {
    arrival_threshold_m: f64,
    index: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WaypointTracker {
    pub fn new(arrival_threshold_m: f64) -> Self {
        Self {
            arrival_threshold_m,
            index: 0,
        }
    }

    /// Go back to the first waypoint, used whenever the path is replaced.
    pub fn reset(&mut self) {
        self.index = 0;
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Get the waypoint to steer towards.
    ///
    /// With no path (or an empty one) the goal is returned. Otherwise the tracked waypoint moves on
    /// by at most one per call once the vessel is within the arrival threshold, and never past the
    /// last point.
    pub fn update(
        &mut self,
        path: Option<&Path>,
        position_m: &Vector2<f64>,
        goal_m: &Vector2<f64>,
    ) -> Vector2<f64> {
        let points = match path {
            Some(p) if !p.is_empty() => &p.points_m,
            _ => return *goal_m,
        };

        self.index = self.index.min(points.len() - 1);

        if (points[self.index] - position_m).norm() < self.arrival_threshold_m
            && self.index + 1 < points.len()
        {
            self.index += 1;
            trace!("Advanced to waypoint {} of {}", self.index, points.len());
        }

        points[self.index]
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::Point2;

    fn straight_path() -> Path {
        Path {
            cells: (0..4).map(|x| Point2::new(x, 0)).collect(),
            points_m: (0..4).map(|x| Vector2::new(x as f64 * 2.0, 0.0)).collect(),
            cost_m: 6.0,
        }
    }

    #[test]
    fn test_no_path_gives_goal() {
        let mut tracker = WaypointTracker::new(1.0);
        let goal = Vector2::new(5.0, 5.0);

        assert_eq!(tracker.update(None, &Vector2::zeros(), &goal), goal);
        assert_eq!(
            tracker.update(Some(&Path::new_empty()), &Vector2::zeros(), &goal),
            goal
        );
    }

    #[test]
    fn test_advance() {
        let mut tracker = WaypointTracker::new(1.0);
        let path = straight_path();
        let goal = Vector2::new(6.0, 0.0);

        // On top of the first point, moves on by one only
        let wp = tracker.update(Some(&path), &Vector2::new(0.0, 0.0), &goal);
        assert_eq!(wp, Vector2::new(2.0, 0.0));

        // Not yet arrived at the second
        let wp = tracker.update(Some(&path), &Vector2::new(0.5, 0.0), &goal);
        assert_eq!(wp, Vector2::new(2.0, 0.0));

        let wp = tracker.update(Some(&path), &Vector2::new(1.5, 0.0), &goal);
        assert_eq!(wp, Vector2::new(4.0, 0.0));

        // Never past the end
        tracker.update(Some(&path), &Vector2::new(4.0, 0.0), &goal);
        for _ in 0..5 {
            tracker.update(Some(&path), &Vector2::new(6.0, 0.0), &goal);
        }
        assert_eq!(tracker.index(), 3);

        tracker.reset();
        assert_eq!(tracker.index(), 0);
    }
}
