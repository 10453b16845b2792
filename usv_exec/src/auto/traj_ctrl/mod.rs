//! # Trajectory control
//!
//! Straight waypoint following, used when the local planner has nothing to avoid. The heading
//! error to the tracked waypoint is fed through a PID controller to give the turn rate, and the
//! speed demand drops linearly as the heading error grows so the vessel turns before it runs.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod controllers;
mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use nalgebra::Vector2;

use comms_if::tc::helm::HelmCmd;
use util::maths::{clamp, get_ang_dist, lin_map};

use crate::auto::loc::Pose;

pub use controllers::PidController;
pub use params::WaypointFollowerParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct WaypointFollower {
    params: WaypointFollowerParams,

    head_ctrl: PidController,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WaypointFollower {
    pub fn new(params: WaypointFollowerParams) -> Self {
        Self {
            head_ctrl: PidController::new(params.head_k_p, params.head_k_i, params.head_k_d),
            params,
        }
    }

    /// Reset the controller state, called when control is handed back to the follower.
    pub fn reset(&mut self) {
        self.head_ctrl.reset();
    }

    /// Heading error to the waypoint, positive when the waypoint lies to port.
    pub fn head_error_rad(pose: &Pose, waypoint_m: &Vector2<f64>) -> f64 {
        let to_wp = waypoint_m - pose.position2();
        if to_wp.norm() < std::f64::EPSILON {
            return 0.0;
        }

        get_ang_dist(pose.get_heading(), to_wp[1].atan2(to_wp[0]))
    }

    /// Get the helm command steering towards the waypoint.
    pub fn get_cmd(&mut self, pose: &Pose, waypoint_m: &Vector2<f64>, dt_s: f64) -> HelmCmd {
        let head_err_rad = Self::head_error_rad(pose, waypoint_m);

        let angular_rads = clamp(
            self.head_ctrl.get(head_err_rad, dt_s),
            -self.params.max_turn_rate_rads,
            self.params.max_turn_rate_rads,
        );

        let linear_ms = lin_map(
            (0.0, self.params.slow_head_error_rad),
            (self.params.max_speed_dem_ms, self.params.min_speed_dem_ms),
            head_err_rad.abs().min(self.params.slow_head_error_rad),
        );

        trace!(
            "Follower: head error {:.3} rad, demand ({:.2} m/s, {:.3} rad/s)",
            head_err_rad,
            linear_ms,
            angular_rads
        );

        HelmCmd::new(linear_ms, angular_rads)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_straight_ahead() {
        let mut follower = WaypointFollower::new(WaypointFollowerParams::default());
        let cmd = follower.get_cmd(
            &Pose::from_planar(0.0, 0.0, 0.0),
            &Vector2::new(10.0, 0.0),
            0.1,
        );

        assert!((cmd.linear_ms - 1.5).abs() < 1e-9);
        assert!(cmd.angular_rads.abs() < 1e-9);
    }

    #[test]
    fn test_turns_towards_waypoint() {
        let params = WaypointFollowerParams::default();
        let mut follower = WaypointFollower::new(params.clone());

        // Waypoint on the port beam, turn port at the limit and slow right down
        let cmd = follower.get_cmd(
            &Pose::from_planar(0.0, 0.0, 0.0),
            &Vector2::new(0.0, 5.0),
            0.1,
        );
        assert!((cmd.angular_rads - params.max_turn_rate_rads).abs() < 1e-9);
        assert!((cmd.linear_ms - params.min_speed_dem_ms).abs() < 1e-6);

        // Waypoint fine on the starboard bow, gentle starboard turn and most of the speed
        follower.reset();
        let cmd = follower.get_cmd(
            &Pose::from_planar(0.0, 0.0, 0.0),
            &Vector2::new(10.0, -1.0),
            0.1,
        );
        assert!(cmd.angular_rads < 0.0);
        assert!(cmd.angular_rads > -params.max_turn_rate_rads);
        assert!(cmd.linear_ms > 1.3 && cmd.linear_ms < 1.5);
    }

    #[test]
    fn test_head_error_wraps() {
        // Heading nearly west, waypoint just south of west
        let pose = Pose::from_planar(0.0, 0.0, 3.0);
        let err = WaypointFollower::head_error_rad(&pose, &Vector2::new(-1.0, -0.1));
        assert!(err > 0.0 && err < 0.3);
    }
}
