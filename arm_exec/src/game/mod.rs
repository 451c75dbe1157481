//! # Game module
//!
//! Shared skeleton for all games played by the arm. Each game implements [`Game`], a state
//! machine which is stepped by the [`Orchestrator`] whenever the arm and the cube steppers are
//! idle. A step returns a [`StepOutput`] describing the action the orchestrator must perform
//! next:
//!
//! - `None` - nothing to do this cycle
//! - `Move` - start a motion of the arm
//! - `Rotate` - start a sequence of stepper rotations
//! - `GameOver` - the game has reached its terminal state
//!
//! The next step is only made once that action has completed, so a game never needs to poll
//! the motion itself.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod active;
mod orchestrator;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

pub use active::{ActiveGame, GameParams};
pub use orchestrator::{Orchestrator, OrchestratorParams};

use comms_if::eqpt::{
    arm::ArmDriver,
    display::{OperatingMode, StatusSink},
    perception::{PerceptionService, PerceptionTag},
    stepper::{StepperDriver, StepperRotation},
};

use crate::{
    motion_seq::MotionRequest,
    perception::{PerceptionBridge, PerceptionError, SceneData},
    pose_table::PoseTable,
};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A game played by the arm.
pub trait Game {
    /// Name of the game, used in logs.
    fn name(&self) -> &'static str;

    /// Operating mode the perception pipeline must be in for this game.
    fn mode(&self) -> OperatingMode;

    /// Pose table used to resolve the slots of this game's motions.
    fn pose_table(&self) -> &PoseTable;

    /// Discard all game data and return to the initial state.
    fn reset(&mut self, now_s: f64);

    /// Advance the game's state machine.
    ///
    /// Only called while no motion or rotation is in progress.
    fn step(&mut self, ctx: &mut StepCtx) -> Result<StepOutput, GameError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Equipment used by the orchestrator.
pub struct Eqpt<'a> {
    pub arm: &'a mut dyn ArmDriver,
    pub steppers: &'a mut dyn StepperDriver,
    pub perception: &'a mut dyn PerceptionService,
    pub status: &'a mut dyn StatusSink,
}

/// Context passed to a game's step function.
pub struct StepCtx<'a> {
    /// Current session time.
    ///
    /// Units: seconds
    pub now_s: f64,

    perception: &'a mut dyn PerceptionService,
    bridge: &'a mut PerceptionBridge,
    status: &'a mut dyn StatusSink,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Action requested by a game's step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutput {
    None,

    Move(MotionRequest),

    Rotate {
        rotations: Vec<StepperRotation>,

        /// Units: seconds
        settle_s: f64,
    },

    GameOver(Outcome),
}

/// How a game ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    RobotWin,
    OpponentWin,
    Tie,

    /// The game ran to completion (games without a winner)
    Completed,

    /// The game hit an unrecoverable inconsistency
    Aborted(String),

    /// The game was stopped by command
    Stopped,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GameError {
    #[error("Perception error: {0}")]
    Perception(PerceptionError),

    #[error("Illegal opponent move: {0}")]
    IllegalMove(String),

    #[error("Game logic inconsistency: {0}")]
    Logic(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<'a> StepCtx<'a> {
    pub fn new(
        now_s: f64,
        perception: &'a mut dyn PerceptionService,
        bridge: &'a mut PerceptionBridge,
        status: &'a mut dyn StatusSink,
    ) -> Self {
        Self {
            now_s,
            perception,
            bridge,
            status,
        }
    }

    /// Query the perception service through the bridge.
    pub fn query(&mut self, tag: PerceptionTag) -> Result<SceneData, PerceptionError> {
        self.bridge.query(&mut *self.perception, tag)
    }

    /// Record that data returned by the last query was rejected.
    pub fn reject(&mut self, err: &PerceptionError) {
        if let PerceptionError::InvalidData(_) = err {
            self.bridge.record_invalid();
        }
    }

    /// Show a status message.
    pub fn status(&mut self, msg: &str) {
        self.status.display_status(msg);
    }
}

impl Outcome {
    /// Message displayed when the game ends with this outcome.
    pub fn message(&self) -> String {
        match self {
            Outcome::RobotWin => "Robot wins! Game Over".into(),
            Outcome::OpponentWin => "You win! Game Over".into(),
            Outcome::Tie => "It's a tie! Game Over".into(),
            Outcome::Completed => "Game Over!".into(),
            Outcome::Aborted(reason) => format!("Game aborted: {}", reason),
            Outcome::Stopped => "Game stopped".into(),
        }
    }
}

impl From<PerceptionError> for GameError {
    fn from(e: PerceptionError) -> Self {
        GameError::Perception(e)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}
