//! Parameters structure for MotionSeq

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::arm::JointId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the motion sequencer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionSeqParams {
    /// Minimum time between two joint commands, whether the previous one succeeded or not.
    ///
    /// Units: seconds
    pub cooldown_s: f64,

    /// Shoulder angle at which the arm can rotate about the base without hitting the board.
    ///
    /// Units: degrees
    pub safe_shoulder_deg: i32,

    /// Elbow angle held while the base swings towards the release position.
    ///
    /// Units: degrees
    pub release_elbow_interim_deg: i32,

    /// Wrist angle held while the elbow extends towards the release position.
    ///
    /// Units: degrees
    pub release_wrist_interim_deg: i32,

    /// Position of the settling wrist angle between the interim wrist angle (0) and the release
    /// pose's wrist angle (1).
    pub release_wrist_mid_blend: f64,

    /// Amount the shoulder is held above the release pose while the wrist settles.
    ///
    /// Units: degrees
    pub release_shoulder_lift_deg: i32,

    /// Overshoot applied to each joint's demands.
    pub overshoot: OvershootParams,
}

/// Per joint overshoot.
///
/// Units: degrees
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct OvershootParams {
    pub base_deg: i32,
    pub shoulder_deg: i32,
    pub elbow_deg: i32,
    pub wrist_deg: i32,
    pub grip_deg: i32,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for MotionSeqParams {
    fn default() -> Self {
        Self {
            cooldown_s: 0.2,
            safe_shoulder_deg: 90,
            release_elbow_interim_deg: 90,
            release_wrist_interim_deg: 90,
            release_wrist_mid_blend: 0.5,
            release_shoulder_lift_deg: 10,
            overshoot: OvershootParams::default(),
        }
    }
}

impl Default for OvershootParams {
    fn default() -> Self {
        Self {
            base_deg: 0,
            shoulder_deg: 10,
            elbow_deg: 0,
            wrist_deg: 4,
            grip_deg: 0,
        }
    }
}

impl MotionSeqParams {
    /// Wrist angle held while the shoulder settles above a release pose.
    pub fn release_wrist_mid_deg(&self, tgt_wrist_deg: i32) -> i32 {
        let w = self.release_wrist_mid_blend;
        let deg = (1.0 - w) * self.release_wrist_interim_deg as f64 + w * tgt_wrist_deg as f64;

        deg.floor() as i32
    }
}

impl OvershootParams {
    pub fn for_joint(&self, joint: JointId) -> i32 {
        match joint {
            JointId::Base => self.base_deg,
            JointId::Shoulder => self.shoulder_deg,
            JointId::Elbow => self.elbow_deg,
            JointId::Wrist => self.wrist_deg,
            JointId::Grip => self.grip_deg,
        }
    }
}
