//! # Arm Executable Parameters
//!
//! This module provide parameters for the arm executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use comms_if::tc::GameKind;
use util::logger::LogParams;

use crate::{game::OrchestratorParams, sim::SimParams};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmExecParams {
    /// Target period of one cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Game started as soon as the executable is running, if no game is given on the command
    /// line.
    pub auto_start: Option<GameKind>,

    pub log: LogParams,

    pub orchestrator: OrchestratorParams,

    pub sim: SimParams,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ArmExecParams {
    fn default() -> Self {
        Self {
            cycle_period_s: 0.05,
            auto_start: None,
            log: LogParams::default(),
            orchestrator: OrchestratorParams::default(),
            sim: SimParams::default(),
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
    fn test_load_partial() {
        let params: ArmExecParams = util::params::from_str(
            r#"
            auto_start = "Cups"

            [sim]
            failure_rate = 0.1
            perception_replay = "replays/cups.json"
            "#,
        )
        .unwrap();

        assert_eq!(params.auto_start, Some(GameKind::Cups));
        assert_eq!(params.cycle_period_s, 0.05);
        assert_eq!(params.sim.failure_rate, 0.1);
        assert_eq!(params.sim.seed, 0);
        assert_eq!(params.orchestrator.stepper_retry_s, 0.2);
        assert_eq!(params.log, LogParams::default());
    }

    #[test]
    fn test_shipped_params() {
        let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../params");

        let params: ArmExecParams =
            util::params::from_str(&std::fs::read_to_string(dir.join("arm_exec.toml")).unwrap())
                .unwrap();
        assert_eq!(
            params.sim.perception_replay.as_deref(),
            Some("replays/demo.json")
        );
        assert_eq!(params.log, LogParams::default());

        let motion: crate::motion_seq::MotionSeqParams = util::params::from_str(
            &std::fs::read_to_string(dir.join("motion_seq.toml")).unwrap(),
        )
        .unwrap();
        assert_eq!(motion.cooldown_s, 0.2);
        assert_eq!(motion.overshoot.shoulder_deg, 10);
        assert_eq!(motion.release_wrist_mid_blend, 0.5);
    }
}
