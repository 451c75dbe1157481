//! # Game orchestrator
//!
//! Drives one game at a time. Each call to [`Orchestrator::loop_once`] makes at most one
//! actuator command, either from the motion in progress or, once the arm and the steppers are
//! both idle, from the action requested by the next step of the game.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use comms_if::eqpt::display::OperatingMode;
use util::time::Cooldown;

use super::{Eqpt, Game, GameError, Outcome, StepCtx, StepOutput};
use crate::{
    motion_seq::{MotionSeq, MotionSeqError, MotionSeqParams, StepperSeq},
    perception::PerceptionBridge,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorParams {
    /// Minimum time between two steps of the game.
    ///
    /// Units: seconds
    pub min_transition_interval_s: f64,

    /// Time to wait before resending a rejected stepper command.
    ///
    /// Units: seconds
    pub stepper_retry_s: f64,
}

/// Runs a game against the arm, the steppers and the perception service.
#[derive(Debug)]
pub struct Orchestrator<G: Game> {
    game: G,

    motion: MotionSeq,

    steppers: StepperSeq,

    bridge: PerceptionBridge,

    /// Gate between two steps of the game
    throttle: Cooldown,

    /// True between `start_game` and either `stop_game` or the end of the game
    running: bool,

    outcome: Option<Outcome>,

    /// True once the outcome has been displayed
    outcome_reported: bool,

    num_moves_started: u64,

    num_rotations_started: u64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for OrchestratorParams {
    fn default() -> Self {
        Self {
            min_transition_interval_s: 0.1,
            stepper_retry_s: 0.2,
        }
    }
}

impl<G: Game> Orchestrator<G> {
    pub fn new(game: G, motion_params: MotionSeqParams, params: OrchestratorParams) -> Self {
        Self {
            game,
            motion: MotionSeq::new(motion_params),
            steppers: StepperSeq::new(params.stepper_retry_s),
            bridge: PerceptionBridge::new(),
            throttle: Cooldown::new(params.min_transition_interval_s),
            running: false,
            outcome: None,
            outcome_reported: false,
            num_moves_started: 0,
            num_rotations_started: 0,
        }
    }

    /// Start the game from its initial state.
    pub fn start_game(&mut self, now_s: f64, eqpt: &mut Eqpt) {
        info!("Starting {} game", self.game.name());

        eqpt.status.set_operating_mode(self.game.mode());
        self.game.reset(now_s);

        self.running = true;
        self.outcome = None;
        self.outcome_reported = false;
        self.throttle.reset();
    }

    /// Stop the game. Any motion in progress still runs to completion.
    pub fn stop_game(&mut self, eqpt: &mut Eqpt) {
        eqpt.status.set_operating_mode(OperatingMode::None);

        if !self.running {
            return;
        }
        self.running = false;

        info!("{} game stopped", self.game.name());

        if self.outcome.is_none() {
            self.outcome = Some(Outcome::Stopped);
            self.report_outcome(eqpt);
        }
    }

    /// Replace the game, only possible while the arm and the steppers are idle.
    pub fn set_game(&mut self, game: G) -> Result<(), MotionSeqError> {
        if self.is_busy() {
            return Err(MotionSeqError::Busy);
        }

        self.game = game;
        self.running = false;
        self.outcome = None;
        self.outcome_reported = false;

        Ok(())
    }

    /// Perform one cycle of the orchestrator.
    pub fn loop_once(&mut self, now_s: f64, eqpt: &mut Eqpt) {
        // ---- MOTION IN PROGRESS ----

        if self.motion.is_busy() {
            if !self.motion.tick(now_s, &mut *eqpt.arm) {
                return;
            }
        } else if self.steppers.is_busy() && !self.steppers.tick(now_s, &mut *eqpt.steppers) {
            return;
        }

        // ---- TERMINAL ----

        if self.outcome.is_some() {
            self.report_outcome(eqpt);
            return;
        }

        if !self.running {
            return;
        }

        if !self.throttle.try_trigger(now_s) {
            return;
        }

        // ---- GAME STEP ----

        let step = {
            let mut ctx = StepCtx::new(
                now_s,
                &mut *eqpt.perception,
                &mut self.bridge,
                &mut *eqpt.status,
            );
            self.game.step(&mut ctx)
        };

        match step {
            Ok(StepOutput::None) => (),
            Ok(StepOutput::Move(req)) => match self.motion.start(req, self.game.pose_table()) {
                Ok(()) => self.num_moves_started += 1,
                Err(e) => self.abort(format!("Could not start motion {:?}: {}", req, e)),
            },
            Ok(StepOutput::Rotate {
                rotations,
                settle_s,
            }) => {
                let num = rotations.len();
                match self.steppers.start(rotations, settle_s) {
                    Ok(()) => {
                        debug!("Started {} stepper rotations", num);
                        self.num_rotations_started += 1;
                    }
                    Err(e) => self.abort(format!("Could not start rotations: {}", e)),
                }
            }
            Ok(StepOutput::GameOver(outcome)) => {
                info!("{} game over: {}", self.game.name(), outcome);
                self.outcome = Some(outcome);
                self.running = false;
            }
            Err(GameError::Logic(reason)) => {
                error!("{} game logic inconsistency: {}", self.game.name(), reason);
                self.abort(reason);
            }
            Err(e) => warn!("{} game step failed: {}", self.game.name(), e),
        }

        if self.outcome.is_some() {
            self.report_outcome(eqpt);
        }
    }

    fn abort(&mut self, reason: String) {
        self.outcome = Some(Outcome::Aborted(reason));
        self.running = false;
    }

    fn report_outcome(&mut self, eqpt: &mut Eqpt) {
        if self.outcome_reported {
            return;
        }

        if let Some(ref outcome) = self.outcome {
            eqpt.status.display_status(&outcome.message());
            self.outcome_reported = true;
        }
    }

    /// True if the arm or the steppers are moving.
    pub fn is_busy(&self) -> bool {
        self.motion.is_busy() || self.steppers.is_busy()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// True once the game has ended, whether it finished, was aborted or stopped.
    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn num_moves_started(&self) -> u64 {
        self.num_moves_started
    }

    pub fn num_rotations_started(&self) -> u64 {
        self.num_rotations_started
    }

    pub fn motion(&self) -> &MotionSeq {
        &self.motion
    }

    pub fn steppers(&self) -> &StepperSeq {
        &self.steppers
    }

    pub fn bridge(&self) -> &PerceptionBridge {
        &self.bridge
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut G {
        &mut self.game
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
