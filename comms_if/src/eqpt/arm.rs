//! # Arm Equipment Demands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::EqptError;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Driver for the arm's joint actuators.
///
/// Implementations must be safe to call repeatedly with identical demands, the controller will
/// resend a demand after a rejection.
pub trait ArmDriver {
    /// Send a single joint demand to the actuators.
    fn send_joint_dem(&mut self, dem: JointDem) -> Result<(), EqptError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A demand for a single joint of the arm.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointDem {
    /// The joint to move
    pub joint: JointId,

    /// Target angle of the joint.
    ///
    /// Units: degrees
    pub angle_deg: i32,

    /// Amount the actuator may overshoot the target before settling, used to overcome the
    /// backlash of the heavily loaded joints.
    ///
    /// Units: degrees
    pub overshoot_deg: i32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of all joints on the arm
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum JointId {
    Base,
    Shoulder,
    Elbow,
    Wrist,
    Grip,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl std::fmt::Display for JointDem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?} -> {} deg (overshoot {} deg)",
            self.joint, self.angle_deg, self.overshoot_deg
        )
    }
}
