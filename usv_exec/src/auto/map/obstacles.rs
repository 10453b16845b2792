//! # Obstacles
//!
//! Static obstacle geometry in the water plane, and the query interface the occupancy grid uses to
//! mark cells as blocked.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Anything that can answer "is there an obstacle near this point?".
pub trait ObstacleField {
    /// Returns true if any obstacle lies within `radius_m` of `centre_m`.
    fn any_within(&self, centre_m: &Vector2<f64>, radius_m: f64) -> bool;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A collection of obstacle shapes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObstacleSet {
    pub shapes: Vec<ObstacleShape>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Footprint of a single obstacle in the water plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObstacleShape {
    /// A disc, for buoys, moored boats and other vessels
    Circle { centre_m: Vector2<f64>, radius_m: f64 },

    /// An axis aligned rectangle, for piers and quay walls
    Box {
        min_m: Vector2<f64>,
        max_m: Vector2<f64>,
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ObstacleShape {
    /// Distance from the point to the edge of the shape, zero if the point is inside.
    pub fn distance_to(&self, point_m: &Vector2<f64>) -> f64 {
        match self {
            ObstacleShape::Circle { centre_m, radius_m } => {
                ((point_m - centre_m).norm() - radius_m).max(0.0)
            }
            ObstacleShape::Box { min_m, max_m } => {
                let dx = (min_m[0] - point_m[0]).max(point_m[0] - max_m[0]).max(0.0);
                let dy = (min_m[1] - point_m[1]).max(point_m[1] - max_m[1]).max(0.0);
                dx.hypot(dy)
            }
        }
    }

    /// Intersect a ray with the shape.
    ///
    /// `direction` must be a unit vector. Returns the distance along the ray to the first
    /// intersection if it is within `max_range_m`. A ray starting inside the shape hits at zero.
    pub fn ray_intersect(
        &self,
        origin_m: &Vector2<f64>,
        direction: &Vector2<f64>,
        max_range_m: f64,
    ) -> Option<f64> {
        let dist_m = match self {
            ObstacleShape::Circle { centre_m, radius_m } => {
                let oc = origin_m - centre_m;
                let b = oc.dot(direction);
                let c = oc.norm_squared() - radius_m * radius_m;

                if c <= 0.0 {
                    return Some(0.0);
                }

                let disc = b * b - c;
                if disc < 0.0 {
                    return None;
                }

                let t = -b - disc.sqrt();
                if t < 0.0 {
                    return None;
                }
                t
            }
            ObstacleShape::Box { min_m, max_m } => {
                let mut t_min = 0f64;
                let mut t_max = max_range_m;

                for axis in 0..2 {
                    if direction[axis].abs() < std::f64::EPSILON {
                        if origin_m[axis] < min_m[axis] || origin_m[axis] > max_m[axis] {
                            return None;
                        }
                        continue;
                    }

                    let mut t_0 = (min_m[axis] - origin_m[axis]) / direction[axis];
                    let mut t_1 = (max_m[axis] - origin_m[axis]) / direction[axis];
                    if t_0 > t_1 {
                        std::mem::swap(&mut t_0, &mut t_1);
                    }

                    t_min = t_min.max(t_0);
                    t_max = t_max.min(t_1);

                    if t_min > t_max {
                        return None;
                    }
                }
                t_min
            }
        };

        if dist_m <= max_range_m {
            Some(dist_m)
        } else {
            None
        }
    }

    /// Return a copy of the shape moved by `delta_m`.
    pub fn translated(&self, delta_m: &Vector2<f64>) -> Self {
        match *self {
            ObstacleShape::Circle { centre_m, radius_m } => ObstacleShape::Circle {
                centre_m: centre_m + delta_m,
                radius_m,
            },
            ObstacleShape::Box { min_m, max_m } => ObstacleShape::Box {
                min_m: min_m + delta_m,
                max_m: max_m + delta_m,
            },
        }
    }
}

impl ObstacleSet {
    pub fn new(shapes: Vec<ObstacleShape>) -> Self {
        Self { shapes }
    }
}

impl ObstacleField for ObstacleSet {
    fn any_within(&self, centre_m: &Vector2<f64>, radius_m: f64) -> bool {
        self.shapes
            .iter()
            .any(|s| s.distance_to(centre_m) <= radius_m)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
