//! # Local planner
//!
//! Dynamic-window style planner choosing the next helm command. Each candidate pair of forward
//! speed and turn rate is forward simulated over a short horizon and scored on clearance from
//! admitted obstacles, progress towards the tracked waypoint, compliance with the right-of-way
//! rules, and smoothness. The highest scoring candidate wins, with ties going to the candidate
//! evaluated first.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod params;
pub mod right_of_way;
mod waypoint_tracker;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, trace, warn};
use nalgebra::{Vector2, Vector3};
use serde::Serialize;

use comms_if::tc::helm::HelmCmd;
use util::maths::clamp;

use crate::auto::{loc::Pose, per::DynamicObstacle};

pub use params::{LocalPlannerParams, ScoreWeights};
pub use right_of_way::{Encounter, RightOfWayParams};
pub use waypoint_tracker::WaypointTracker;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct LocalPlanner {
    params: LocalPlannerParams,

    /// Largest absolute turn rate among the options, used to normalise smoothness
    max_angular_rads: f64,
}

/// Planar state at the end of a candidate's prediction horizon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictedState {
    pub position_m: Vector2<f64>,
    pub heading_rad: f64,
}

/// The individual terms and weighted total of a candidate's score. Each term is in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CandidateScore {
    pub clearance: f64,
    pub progress: f64,
    pub right_of_way: f64,
    pub smoothness: f64,
    pub total: f64,
}

/// Result of one local planning cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocalPlan {
    pub cmd: HelmCmd,
    pub score: CandidateScore,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LocalPlanner {
    /// Create a new planner. The zero speed and zero turn rate options are added if the
    /// parameters leave them out, so that stopping is always a candidate.
    pub fn new(mut params: LocalPlannerParams) -> Self {
        if !params.linear_options_ms.iter().any(|v| *v == 0.0) {
            warn!("Linear options have no zero speed, adding one");
            params.linear_options_ms.insert(0, 0.0);
        }
        if !params.angular_options_rads.iter().any(|w| *w == 0.0) {
            warn!("Angular options have no zero turn rate, adding one");
            params.angular_options_rads.push(0.0);
        }

        let max_angular_rads = params
            .angular_options_rads
            .iter()
            .fold(0.0f64, |max, w| max.max(w.abs()));

        Self {
            params,
            max_angular_rads,
        }
    }

    pub fn params(&self) -> &LocalPlannerParams {
        &self.params
    }

    /// Choose the helm command for this cycle.
    ///
    /// `obstacles` must already have been admitted, see
    /// [`admit_obstacles`](crate::auto::per::admit_obstacles). This never fails: if no candidate
    /// produces a finite score the stop command is returned.
    pub fn plan(
        &self,
        pose: &Pose,
        velocity_ms: &Vector3<f64>,
        waypoint_m: &Vector2<f64>,
        obstacles: &[DynamicObstacle],
    ) -> LocalPlan {
        let current_speed_ms = pose.forward_speed_ms(velocity_ms);

        let mut best = LocalPlan {
            cmd: HelmCmd::stop(),
            score: CandidateScore {
                total: f64::NEG_INFINITY,
                ..Default::default()
            },
        };

        for linear_ms in self.params.linear_options_ms.iter() {
            for angular_rads in self.params.angular_options_rads.iter() {
                let score = self.score(
                    pose,
                    current_speed_ms,
                    waypoint_m,
                    obstacles,
                    *linear_ms,
                    *angular_rads,
                );

                trace!(
                    "Candidate ({:.2} m/s, {:.3} rad/s): {:.4}",
                    linear_ms,
                    angular_rads,
                    score.total
                );

                if score.total > best.score.total {
                    best = LocalPlan {
                        cmd: HelmCmd::new(*linear_ms, *angular_rads),
                        score,
                    };
                }
            }
        }

        if !best.score.total.is_finite() {
            warn!("No candidate produced a finite score, stopping");
            return LocalPlan {
                cmd: HelmCmd::stop(),
                score: CandidateScore::default(),
            };
        }

        debug!(
            "Local plan: {:.2} m/s, {:.3} rad/s (score {:.4}, {} obstacles)",
            best.cmd.linear_ms,
            best.cmd.angular_rads,
            best.score.total,
            obstacles.len()
        );

        best
    }

    /// Forward simulate a candidate over the prediction horizon.
    ///
    /// Each step rotates first and then moves along the new heading.
    pub fn predict(&self, pose: &Pose, linear_ms: f64, angular_rads: f64) -> PredictedState {
        let steps = self.params.predict_steps.max(1);
        let dt_s = self.params.predict_horizon_s / steps as f64;

        let mut position_m = pose.position2();
        let mut heading_rad = pose.get_heading();

        for _ in 0..steps {
            heading_rad += angular_rads * dt_s;
            position_m += Vector2::new(heading_rad.cos(), heading_rad.sin()) * linear_ms * dt_s;
        }

        PredictedState {
            position_m,
            heading_rad,
        }
    }

    /// Score a single candidate command.
    pub fn score(
        &self,
        pose: &Pose,
        current_speed_ms: f64,
        waypoint_m: &Vector2<f64>,
        obstacles: &[DynamicObstacle],
        linear_ms: f64,
        angular_rads: f64,
    ) -> CandidateScore {
        let pred = self.predict(pose, linear_ms, angular_rads);
        let safe_m = self.params.safe_distance_m;

        let clearance = if obstacles.is_empty() {
            1.0
        } else {
            obstacles
                .iter()
                .map(|o| clamp((o.position_m - pred.position_m).norm() / safe_m, 0.0, 1.0))
                .sum::<f64>()
                / obstacles.len() as f64
        };

        let progress = clamp(
            1.0 - (waypoint_m - pred.position_m).norm() / (2.0 * safe_m),
            0.0,
            1.0,
        );

        let right_of_way = right_of_way::score(
            &pred.position_m,
            pred.heading_rad,
            angular_rads,
            obstacles,
            self.params.right_of_way_distance_m,
            &self.params.right_of_way,
        );

        let linear_smooth = 1.0 - (linear_ms - current_speed_ms).abs() / self.params.max_linear_ms;
        let angular_smooth = if self.max_angular_rads > 0.0 {
            1.0 - angular_rads.abs() / self.max_angular_rads
        } else {
            1.0
        };
        let smoothness = clamp((linear_smooth + angular_smooth) / 2.0, 0.0, 1.0);

        let w = &self.params.weights;
        let total = w.clearance * clearance
            + w.progress * progress
            + w.right_of_way * right_of_way
            + w.smoothness * smoothness;

        CandidateScore {
            clearance,
            progress,
            right_of_way,
            smoothness,
            total,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const DEG: f64 = std::f64::consts::PI / 180.0;

    fn stationary(x_m: f64, y_m: f64) -> DynamicObstacle {
        DynamicObstacle {
            position_m: Vector2::new(x_m, y_m),
            velocity_ms: Vector2::zeros(),
        }
    }

    #[test]
    fn test_predict() {
        let planner = LocalPlanner::new(LocalPlannerParams::default());
        let pose = Pose::from_planar(1.0, 2.0, 0.0);

        let straight = planner.predict(&pose, 1.0, 0.0);
        assert!((straight.position_m - Vector2::new(1.8, 2.0)).norm() < 1e-9);
        assert_eq!(straight.heading_rad, 0.0);

        let spin = planner.predict(&pose, 0.0, 45.0 * DEG);
        assert!((spin.position_m - Vector2::new(1.0, 2.0)).norm() < 1e-12);
        assert!((spin.heading_rad - 0.8 * 45.0 * DEG).abs() < 1e-9);

        // Turning to port moves the vessel to +Y
        let port = planner.predict(&pose, 1.0, 45.0 * DEG);
        assert!(port.position_m[1] > 2.0);
    }

    #[test]
    fn test_obstacle_ahead_turns_away() {
        let planner = LocalPlanner::new(LocalPlannerParams::default());
        let pose = Pose::from_planar(0.0, 0.0, 0.0);
        let waypoint = Vector2::new(6.0, 0.0);
        let obstacles = vec![stationary(2.0, 0.0)];

        let plan = planner.plan(&pose, &Vector3::zeros(), &waypoint, &obstacles);
        assert!(plan.cmd.angular_rads.abs() > 0.0);
        assert!((plan.cmd.angular_rads + 30.0 * DEG).abs() < 1e-9);

        // And the chosen command beats holding course
        let ahead = planner.score(&pose, 0.0, &waypoint, &obstacles, 0.0, 0.0);
        assert!(plan.score.total > ahead.total);
        let full_ahead = planner.score(&pose, 0.0, &waypoint, &obstacles, 1.5, 0.0);
        assert!(plan.score.total > full_ahead.total);
    }

    #[test]
    fn test_clear_water_goes_straight() {
        let planner = LocalPlanner::new(LocalPlannerParams::default());
        let pose = Pose::from_planar(0.0, 0.0, 0.0);

        for speed in [0.0, 1.5].iter() {
            let plan = planner.plan(
                &pose,
                &Vector3::new(*speed, 0.0, 0.0),
                &Vector2::new(3.0, 0.0),
                &[],
            );
            assert_eq!(plan.cmd, HelmCmd::new(1.5, 0.0));
            assert_eq!(plan.score.clearance, 1.0);
            assert_eq!(plan.score.right_of_way, 1.0);
        }
    }

    #[test]
    fn test_plan_is_deterministic() {
        let planner = LocalPlanner::new(LocalPlannerParams::default());
        let pose = Pose::from_planar(3.0, -1.0, 0.4);
        let velocity = Vector3::new(0.6, 0.2, 0.0);
        let waypoint = Vector2::new(10.0, 4.0);
        let obstacles = vec![
            stationary(5.0, 0.0),
            DynamicObstacle {
                position_m: Vector2::new(6.0, 3.0),
                velocity_ms: Vector2::new(-0.5, 0.0),
            },
        ];

        let first = planner.plan(&pose, &velocity, &waypoint, &obstacles);
        for _ in 0..10 {
            assert_eq!(planner.plan(&pose, &velocity, &waypoint, &obstacles), first);
        }
    }

    #[test]
    fn test_ties_go_to_first_candidate() {
        let params = LocalPlannerParams {
            weights: ScoreWeights {
                clearance: 0.0,
                progress: 0.0,
                right_of_way: 0.0,
                smoothness: 0.0,
            },
            ..Default::default()
        };
        let planner = LocalPlanner::new(params);
        let plan = planner.plan(
            &Pose::from_planar(0.0, 0.0, 0.0),
            &Vector3::zeros(),
            &Vector2::new(5.0, 0.0),
            &[],
        );

        assert_eq!(plan.cmd, HelmCmd::new(0.0, 45.0 * DEG));
    }

    #[test]
    fn test_zero_candidate_always_present() {
        let params = LocalPlannerParams {
            linear_options_ms: vec![1.0],
            angular_options_rads: vec![0.5],
            ..Default::default()
        };
        let planner = LocalPlanner::new(params);

        assert!(planner.params().linear_options_ms.contains(&0.0));
        assert!(planner.params().angular_options_rads.contains(&0.0));
    }

    #[test]
    fn test_non_finite_scores_stop() {
        let mut params = LocalPlannerParams::default();
        params.weights.progress = f64::NAN;
        let planner = LocalPlanner::new(params);

        let plan = planner.plan(
            &Pose::from_planar(0.0, 0.0, 0.0),
            &Vector3::zeros(),
            &Vector2::new(5.0, 0.0),
            &[stationary(2.0, 2.0)],
        );

        assert_eq!(plan.cmd, HelmCmd::stop());
    }
}
