//! # Controllers module
//!
//! This module provides the PID controller used by the waypoint follower.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID controller
#[derive(Debug, Serialize, Clone)]
pub struct PidController {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Dervative gain
    k_d: f64,

    /// Previous error
    prev_error: Option<f64>,

    /// The integral accumulation
    integral: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {
    /// Create a new controller with the given gains.
    pub fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self {
            k_p,
            k_i,
            k_d,
            integral: 0f64,
            prev_error: None,
        }
    }

    /// Get the value of the controller for the given error, `dt_s` after the previous call.
    ///
    /// The planners run on simulation time as well as wall time, so the time step is given by the
    /// caller rather than measured.
    pub fn get(&mut self, error: f64, dt_s: f64) -> f64 {
        let dt = if dt_s > 0.0 { Some(dt_s) } else { None };

        // Accumulate the integral term.
        //
        // If there's no time difference then we don't accumulate the integral, adding the raw
        // error would produce a large spike compared to normal operation.
        self.integral += match dt {
            Some(t) => error * t,
            None => 0f64,
        };

        // Calculate the derivative, zero on the first call or without a time difference.
        let deriv = match (self.prev_error, dt) {
            (Some(e), Some(t)) => (error - e) / t,
            _ => 0f64,
        };

        let out = self.k_p * error + self.k_i * self.integral + self.k_d * deriv;

        self.prev_error = Some(error);

        out
    }

    /// Forget the integral and the previous error.
    pub fn reset(&mut self) {
        self.integral = 0f64;
        self.prev_error = None;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_pid() {
        let mut p = PidController::new(2.0, 0.0, 0.0);
        assert_eq!(p.get(0.5, 0.1), 1.0);

        let mut i = PidController::new(0.0, 1.0, 0.0);
        i.get(1.0, 0.5);
        assert!((i.get(1.0, 0.5) - 1.0).abs() < 1e-12);

        // No derivative kick on the first call
        let mut d = PidController::new(0.0, 0.0, 1.0);
        assert_eq!(d.get(1.0, 0.1), 0.0);
        assert!((d.get(2.0, 0.5) - 2.0).abs() < 1e-12);

        // Zero time step leaves the integral alone
        i.reset();
        assert_eq!(i.get(3.0, 0.0), 0.0);
    }
}
