//! # Simulated equipment
//!
//! Stand-ins for the actuator transport, the cube steppers, the perception service and the
//! display, used when running without hardware and by the tests.
//!
//! - [`SimArm`] accepts joint demands, optionally rejecting some of them.
//! - [`SimSteppers`] does the same for stepper demands.
//! - [`ReplayPerception`] replays recorded perception responses per tag.
//! - [`LogStatus`] writes status messages to the log.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    collections::{HashMap, VecDeque},
    fs,
    path::Path,
};

use log::{debug, info};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use comms_if::eqpt::{
    arm::{ArmDriver, JointDem, JointId},
    display::{OperatingMode, StatusSink},
    perception::{PerceptionService, PerceptionTag, PERCEPTION_FAILURE},
    stepper::{StepperDems, StepperDriver},
    EqptError,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Simulated arm actuators.
#[derive(Debug)]
pub struct SimArm {
    /// Every accepted demand, in order
    pub history: Vec<JointDem>,

    /// Last accepted angle of each joint
    pub joint_angles_deg: HashMap<JointId, i32>,

    /// Number of rejected demands
    pub num_rejected: u64,

    /// Number of upcoming demands to reject
    fail_next: u32,

    /// Probability of randomly rejecting a demand
    failure_rate: f64,

    rng: StdRng,
}

/// Simulated cube steppers.
#[derive(Debug)]
pub struct SimSteppers {
    /// Every accepted demand, in order
    pub history: Vec<StepperDems>,

    pub num_rejected: u64,

    fail_next: u32,

    failure_rate: f64,

    rng: StdRng,
}

/// Replays recorded perception responses.
///
/// Responses are served in order per tag. Once a tag's responses are exhausted the failure
/// sentinel is returned.
#[derive(Debug, Default)]
pub struct ReplayPerception {
    responses: HashMap<String, VecDeque<String>>,

    /// Every tag queried, in order
    pub queries: Vec<String>,
}

/// Status sink which logs all messages.
#[derive(Debug, Default)]
pub struct LogStatus {
    /// Every message displayed, in order
    pub messages: Vec<String>,

    /// Every operating mode set, in order
    pub modes: Vec<OperatingMode>,
}

/// Parameters of the simulated equipment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Probability that any joint or stepper demand is rejected
    pub failure_rate: f64,

    /// Seed for the failure generator
    pub seed: u64,

    /// Path to the recorded perception responses, relative to `$ARM_SW_ROOT`
    pub perception_replay: Option<String>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Cannot load the replay file: {0}")]
    ReplayLoadError(std::io::Error),

    #[error("Cannot parse the replay file: {0}")]
    ReplayParseError(serde_json::Error),

    #[error("The replay contains responses for an unknown tag: {0:?}")]
    UnknownTag(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimArm {
    pub fn new(failure_rate: f64, seed: u64) -> Self {
        Self {
            history: vec![],
            joint_angles_deg: HashMap::new(),
            num_rejected: 0,
            fail_next: 0,
            failure_rate,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Reject the next `n` demands.
    pub fn fail_next(&mut self, n: u32) {
        self.fail_next = n;
    }
}

impl Default for SimArm {
    fn default() -> Self {
        Self::new(0.0, 0)
    }
}

impl ArmDriver for SimArm {
    fn send_joint_dem(&mut self, dem: JointDem) -> Result<(), EqptError> {
        if should_fail(&mut self.fail_next, self.failure_rate, &mut self.rng) {
            self.num_rejected += 1;
            return Err(EqptError::Rejected);
        }

        debug!("SimArm: {}", dem);
        self.joint_angles_deg.insert(dem.joint, dem.angle_deg);
        self.history.push(dem);
        Ok(())
    }
}

impl SimSteppers {
    pub fn new(failure_rate: f64, seed: u64) -> Self {
        Self {
            history: vec![],
            num_rejected: 0,
            fail_next: 0,
            failure_rate,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Reject the next `n` demands.
    pub fn fail_next(&mut self, n: u32) {
        self.fail_next = n;
    }
}

impl Default for SimSteppers {
    fn default() -> Self {
        Self::new(0.0, 0)
    }
}

impl StepperDriver for SimSteppers {
    fn send_stepper_dems(&mut self, dems: &StepperDems) -> Result<(), EqptError> {
        if should_fail(&mut self.fail_next, self.failure_rate, &mut self.rng) {
            self.num_rejected += 1;
            return Err(EqptError::Rejected);
        }

        debug!("SimSteppers: {:?}", dems.to_cmd_vector());
        self.history.push(dems.clone());
        Ok(())
    }
}

impl ReplayPerception {
    /// Load recorded responses from a JSON file of the form `{"<tag>": ["<response>", ...]}`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let json = fs::read_to_string(path).map_err(SimError::ReplayLoadError)?;
        Self::from_json(&json)
    }

    /// Load recorded responses from the contents of a replay file.
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let responses: HashMap<String, Vec<String>> =
            serde_json::from_str(json).map_err(SimError::ReplayParseError)?;

        if let Some(tag) = responses
            .keys()
            .find(|t| PerceptionTag::from_wire_tag(t).is_none())
        {
            return Err(SimError::UnknownTag(tag.clone()));
        }

        debug!("Replay loaded with {} tags", responses.len());

        Ok(Self {
            responses: responses
                .into_iter()
                .map(|(tag, r)| (tag, r.into()))
                .collect(),
            queries: vec![],
        })
    }

    /// Queue a response for a tag.
    pub fn push(&mut self, tag: &str, response: &str) {
        self.responses
            .entry(tag.to_string())
            .or_default()
            .push_back(response.to_string());
    }

    /// Number of responses still queued for a tag.
    pub fn num_remaining(&self, tag: &str) -> usize {
        self.responses.get(tag).map(|r| r.len()).unwrap_or(0)
    }
}

impl PerceptionService for ReplayPerception {
    fn query(&mut self, tag: &str) -> String {
        self.queries.push(tag.to_string());

        self.responses
            .get_mut(tag)
            .and_then(|r| r.pop_front())
            .unwrap_or_else(|| PERCEPTION_FAILURE.to_string())
    }
}

impl StatusSink for LogStatus {
    fn display_status(&mut self, msg: &str) {
        info!("[status] {}", msg);
        self.messages.push(msg.to_string());
    }

    fn set_operating_mode(&mut self, mode: OperatingMode) {
        info!("[mode] {}", mode.wire_tag());
        self.modes.push(mode);
    }
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            failure_rate: 0.0,
            seed: 0,
            perception_replay: None,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn should_fail(fail_next: &mut u32, failure_rate: f64, rng: &mut StdRng) -> bool {
    if *fail_next > 0 {
        *fail_next -= 1;
        return true;
    }

    failure_rate > 0.0 && rng.gen_bool(failure_rate.min(1.0))
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
