//! # Action proposers
//!
//! An action proposer supplies the helm command while no obstacle needs avoiding, in place of the
//! built in waypoint follower. Learned policies plug in here.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector3;

use comms_if::tc::helm::{DiscreteHelmAction, HelmCmd};

use crate::auto::loc::Pose;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

pub trait ActionProposer {
    fn propose(&mut self, pose: &Pose, velocity_ms: &Vector3<f64>) -> HelmCmd;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Proposes one discrete helm action until told otherwise.
#[derive(Debug, Clone, Copy)]
pub struct DiscreteActionProposer {
    pub action: DiscreteHelmAction,
    pub max_linear_ms: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DiscreteActionProposer {
    pub fn new(action: DiscreteHelmAction, max_linear_ms: f64) -> Self {
        Self {
            action,
            max_linear_ms,
        }
    }
}

impl ActionProposer for DiscreteActionProposer {
    fn propose(&mut self, _pose: &Pose, _velocity_ms: &Vector3<f64>) -> HelmCmd {
        self.action.to_helm_cmd(self.max_linear_ms)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_discrete_proposer() {
        let mut proposer = DiscreteActionProposer::new(DiscreteHelmAction::Ahead, 1.5);
        let pose = Pose::from_planar(0.0, 0.0, 0.0);

        assert_eq!(
            proposer.propose(&pose, &Vector3::zeros()),
            HelmCmd::new(1.5, 0.0)
        );

        proposer.action = DiscreteHelmAction::Starboard;
        let cmd = proposer.propose(&pose, &Vector3::zeros());
        assert!(cmd.angular_rads < 0.0);
        assert!((cmd.linear_ms - 1.05).abs() < 1e-9);
    }
}
