//! Motion phases and the requests which are broken down into them

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::arm::JointId;
use serde::{Deserialize, Serialize};

use crate::pose_table::{Pose, Slot};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Phases of the grab sub-sequence, in execution order.
pub const GRAB_PHASES: [Phase; 7] = [
    Phase::GrabOpenGrip,
    Phase::GrabShoulderSafe,
    Phase::GrabBase,
    Phase::GrabWrist,
    Phase::GrabElbow,
    Phase::GrabShoulder,
    Phase::GrabCloseGrip,
];

/// Phases of the release sub-sequence, in execution order.
pub const RELEASE_PHASES: [Phase; 10] = [
    Phase::ReleaseShoulderSafe,
    Phase::ReleaseElbowInterim,
    Phase::ReleaseBase,
    Phase::ReleaseWristInterim,
    Phase::ReleaseElbow,
    Phase::ReleaseWristMid,
    Phase::ReleaseShoulderLift,
    Phase::ReleaseWrist,
    Phase::ReleaseShoulder,
    Phase::ReleaseOpenGrip,
];

/// Phases of a single leg reach, in execution order. The grip phase is only present if the
/// request carries a grip action.
pub const REACH_PHASES: [Phase; 6] = [
    Phase::ReachShoulderSafe,
    Phase::ReachBase,
    Phase::ReachWrist,
    Phase::ReachElbow,
    Phase::ReachShoulder,
    Phase::ReachGrip,
];

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A request for the motion sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionRequest {
    /// Grab the piece at `from` and release it at `to`.
    Transfer { from: Slot, to: Slot },

    /// Move to a literal target pose, optionally actuating the grip once there.
    Reach {
        target: Pose,
        grip: Option<GripAction>,
    },
}

/// Grip actuation at the end of a reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GripAction {
    Open,
    Close,
}

/// A single step of a motion, each phase is exactly one joint command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    GrabOpenGrip,
    GrabShoulderSafe,
    GrabBase,
    GrabWrist,
    GrabElbow,
    GrabShoulder,
    GrabCloseGrip,

    ReleaseShoulderSafe,
    ReleaseElbowInterim,
    ReleaseBase,
    ReleaseWristInterim,
    ReleaseElbow,
    ReleaseWristMid,
    ReleaseShoulderLift,
    ReleaseWrist,
    ReleaseShoulder,
    ReleaseOpenGrip,

    ReachShoulderSafe,
    ReachBase,
    ReachWrist,
    ReachElbow,
    ReachShoulder,
    ReachGrip,

    /// No motion is in progress
    Complete,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MotionRequest {
    /// Break the request down into the ordered list of phases to execute.
    pub fn plan(&self) -> Vec<Phase> {
        match self {
            MotionRequest::Transfer { to, .. } => GRAB_PHASES
                .iter()
                .chain(RELEASE_PHASES.iter())
                // Dropped pieces need no precise wrist alignment
                .filter(|p| !(to.is_drop() && **p == Phase::ReleaseWristMid))
                .copied()
                .collect(),
            MotionRequest::Reach { grip, .. } => REACH_PHASES
                .iter()
                .filter(|p| grip.is_some() || **p != Phase::ReachGrip)
                .copied()
                .collect(),
        }
    }
}

impl Phase {
    /// The joint commanded during this phase, or `None` for `Complete`.
    pub fn joint(&self) -> Option<JointId> {
        use Phase::*;

        match self {
            GrabOpenGrip | GrabCloseGrip | ReleaseOpenGrip | ReachGrip => Some(JointId::Grip),
            GrabShoulderSafe | GrabShoulder | ReleaseShoulderSafe | ReleaseShoulderLift
            | ReleaseShoulder | ReachShoulderSafe | ReachShoulder => Some(JointId::Shoulder),
            GrabBase | ReleaseBase | ReachBase => Some(JointId::Base),
            GrabWrist | ReleaseWristInterim | ReleaseWristMid | ReleaseWrist | ReachWrist => {
                Some(JointId::Wrist)
            }
            GrabElbow | ReleaseElbowInterim | ReleaseElbow | ReachElbow => Some(JointId::Elbow),
            Complete => None,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_transfer_plan() {
        let plan = MotionRequest::Transfer {
            from: Slot::Stack(4),
            to: Slot::Cell(0),
        }
        .plan();
        assert_eq!(plan.len(), GRAB_PHASES.len() + RELEASE_PHASES.len());
        assert_eq!(plan[0], Phase::GrabOpenGrip);
        assert_eq!(plan[7], Phase::ReleaseShoulderSafe);
        assert_eq!(plan.last(), Some(&Phase::ReleaseOpenGrip));

        let drop_plan = MotionRequest::Transfer {
            from: Slot::Temp(0),
            to: Slot::Output(0),
        }
        .plan();
        assert_eq!(drop_plan.len(), plan.len() - 1);
        assert!(!drop_plan.contains(&Phase::ReleaseWristMid));
    }

    #[test]
    fn test_reach_plan() {
        let target = Pose::new(90, 90, 90, 90);
        let with_grip = MotionRequest::Reach {
            target,
            grip: Some(GripAction::Close),
        }
        .plan();
        let without_grip = MotionRequest::Reach { target, grip: None }.plan();

        assert_eq!(with_grip.len(), 6);
        assert_eq!(without_grip.len(), 5);
        assert_eq!(with_grip.last(), Some(&Phase::ReachGrip));
        assert!(without_grip.iter().all(|p| p.joint() != Some(JointId::Grip)));
    }
}
