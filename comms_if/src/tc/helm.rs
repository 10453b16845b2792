//! # Helm commands
//!
//! The helm command is the single output of the autonomy software each control cycle.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Fraction of the maximum speed used by the discrete turning actions.
pub const DISCRETE_TURN_SPEED_FRACTION: f64 = 0.7;

/// Turn rate used by the discrete turning actions, 30 degrees per second.
pub const DISCRETE_TURN_RATE_RADS: f64 = std::f64::consts::PI / 6.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A velocity demand for the vessel.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HelmCmd {
    /// Forward speed demand in meters/second.
    pub linear_ms: f64,

    /// Turn rate demand in radians/second.
    ///
    /// Follows the right hand rule about the vessel's Z+ (upwards) axis, so that a positive turn
    /// rate turns the vessel to port (left), and a negative turn rate turns it to starboard.
    pub angular_rads: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The reduced action set produced by a baseline action proposer (for instance a learned policy
/// with three discrete outputs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscreteHelmAction {
    /// Full speed straight ahead
    Ahead,

    /// Reduced speed while turning to port
    Port,

    /// Reduced speed while turning to starboard
    Starboard,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl HelmCmd {
    pub fn new(linear_ms: f64, angular_rads: f64) -> Self {
        Self {
            linear_ms,
            angular_rads,
        }
    }

    /// Zero speed and zero turn rate.
    pub fn stop() -> Self {
        Self::default()
    }

    /// Limit the forward speed into `[0, max_linear_ms]`, non-finite demands become a stop.
    pub fn clamp_linear(self, max_linear_ms: f64) -> Self {
        if !self.linear_ms.is_finite() || !self.angular_rads.is_finite() {
            return Self::stop();
        }

        Self {
            linear_ms: self.linear_ms.max(0.0).min(max_linear_ms),
            angular_rads: self.angular_rads,
        }
    }
}

impl DiscreteHelmAction {
    /// Convert the action into a velocity demand for a vessel with the given top speed.
    pub fn to_helm_cmd(self, max_linear_ms: f64) -> HelmCmd {
        match self {
            DiscreteHelmAction::Ahead => HelmCmd::new(max_linear_ms, 0.0),
            DiscreteHelmAction::Port => HelmCmd::new(
                max_linear_ms * DISCRETE_TURN_SPEED_FRACTION,
                DISCRETE_TURN_RATE_RADS,
            ),
            DiscreteHelmAction::Starboard => HelmCmd::new(
                max_linear_ms * DISCRETE_TURN_SPEED_FRACTION,
                -DISCRETE_TURN_RATE_RADS,
            ),
        }
    }
}

impl TryFrom<i32> for DiscreteHelmAction {
    type Error = i32;

    /// Map a policy output index (0 = ahead, 1 = port, 2 = starboard) onto an action, returning
    /// the index back if it is not recognised.
    fn try_from(index: i32) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(DiscreteHelmAction::Ahead),
            1 => Ok(DiscreteHelmAction::Port),
            2 => Ok(DiscreteHelmAction::Starboard),
            i => Err(i),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_discrete_actions() {
        assert_eq!(
            DiscreteHelmAction::Ahead.to_helm_cmd(1.5),
            HelmCmd::new(1.5, 0.0)
        );

        let port = DiscreteHelmAction::Port.to_helm_cmd(1.5);
        assert!((port.linear_ms - 1.05).abs() < 1e-12);
        assert!(port.angular_rads > 0.0);

        let stbd = DiscreteHelmAction::Starboard.to_helm_cmd(1.5);
        assert!(stbd.angular_rads < 0.0);

        assert_eq!(DiscreteHelmAction::try_from(2), Ok(DiscreteHelmAction::Starboard));
        assert_eq!(DiscreteHelmAction::try_from(7), Err(7));
    }

    #[test]
    fn test_clamp_linear() {
        assert_eq!(HelmCmd::new(3.0, 0.1).clamp_linear(1.5), HelmCmd::new(1.5, 0.1));
        assert_eq!(HelmCmd::new(-1.0, 0.1).clamp_linear(1.5), HelmCmd::new(0.0, 0.1));
        assert_eq!(HelmCmd::new(std::f64::NAN, 0.1).clamp_linear(1.5), HelmCmd::stop());
    }
}
