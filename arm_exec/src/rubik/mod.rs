//! # Rubik's cube game
//!
//! The cube sits in a holder turned by five steppers. Each face is in turn rotated into view of
//! the camera, scanned, and rotated back. Scanning the last face also returns the solution, which
//! is then applied one move at a time.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod moves;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

pub use moves::*;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use comms_if::eqpt::{
    display::OperatingMode,
    perception::PerceptionTag,
    stepper::{Direction, StepperChannel, StepperRotation},
};

use crate::{
    game::{Game, GameError, Outcome, StepCtx, StepOutput},
    perception::{PerceptionError, PerceptionRetry, SceneData},
    pose_table::{GripAngles, Pose, PoseTable},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of stickers on one face.
pub const FACE_LEN: usize = 9;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RubikParams {
    /// Rotations presenting each face to the camera, one list per face.
    pub faces: Vec<Vec<StepperRotation>>,

    /// Units: seconds
    pub init_delay_s: f64,

    /// Wait after each rotation of a face choreography.
    ///
    /// Units: seconds
    pub rotation_settle_s: f64,

    /// Wait after each move of the solution.
    ///
    /// Units: seconds
    pub move_settle_s: f64,

    /// Delay before re-scanning a face after a perception failure.
    ///
    /// Units: seconds
    pub capture_retry_s: f64,
}

/// Rubik game context.
#[derive(Debug)]
pub struct RubikGame {
    params: RubikParams,

    /// The arm is not used by this game but the orchestrator needs a table to hold it at.
    poses: PoseTable,

    state: RubikState,

    state_start_s: f64,

    /// Scanned stickers of each face
    scans: Vec<Vec<String>>,

    /// Decoded solution
    solution: Vec<StepperRotation>,

    capture_retry: PerceptionRetry,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RubikState {
    Init,

    /// Rotating the face into view
    Presenting { face: usize },

    Capturing { face: usize },

    /// Rotating the face back
    Restoring { face: usize },

    Solving,
    GameOver,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for RubikParams {
    fn default() -> Self {
        fn rot(channel: StepperChannel, angle_deg: i32, direction: Direction) -> StepperRotation {
            StepperRotation {
                channel,
                angle_deg,
                direction,
            }
        }

        use Direction::*;
        use StepperChannel::*;

        Self {
            faces: vec![
                vec![rot(Down, 90, Forward)],
                vec![rot(Down, 180, Forward)],
                vec![rot(Down, 90, Reverse)],
                vec![rot(Left, 90, Forward), rot(Right, 90, Reverse)],
                vec![rot(Left, 90, Reverse), rot(Right, 90, Forward)],
                vec![rot(Front, 90, Forward), rot(Back, 90, Reverse)],
            ],
            init_delay_s: 0.5,
            rotation_settle_s: 1.0,
            move_settle_s: 1.0,
            capture_retry_s: 1.0,
        }
    }
}

impl RubikGame {
    pub fn new(params: RubikParams) -> Self {
        Self {
            poses: PoseTable::with_home(
                Pose::new(90, 90, 90, 90),
                GripAngles {
                    open_deg: 110,
                    closed_deg: 80,
                },
            ),
            capture_retry: PerceptionRetry::new(params.capture_retry_s),
            params,
            state: RubikState::Init,
            state_start_s: 0.0,
            scans: vec![],
            solution: vec![],
        }
    }

    pub fn state(&self) -> RubikState {
        self.state
    }

    pub fn scans(&self) -> &[Vec<String>] {
        &self.scans
    }

    pub fn solution(&self) -> &[StepperRotation] {
        &self.solution
    }

    fn num_faces(&self) -> usize {
        self.params.faces.len()
    }

    fn set_state(&mut self, state: RubikState, now_s: f64) {
        debug!("Rubik state {:?} -> {:?}", self.state, state);
        self.state = state;
        self.state_start_s = now_s;
    }

    /// Rotate the given choreography, or move straight on if it is empty.
    fn rotate(&self, rotations: Vec<StepperRotation>) -> StepOutput {
        if rotations.is_empty() {
            StepOutput::None
        } else {
            StepOutput::Rotate {
                rotations,
                settle_s: self.params.rotation_settle_s,
            }
        }
    }

    fn present(&mut self, face: usize, now_s: f64) -> StepOutput {
        self.set_state(RubikState::Presenting { face }, now_s);
        self.rotate(self.params.faces[face].clone())
    }

    fn capture(&mut self, ctx: &mut StepCtx, face: usize) -> Result<StepOutput, GameError> {
        if !self.capture_retry.is_ready(ctx.now_s) {
            return Ok(StepOutput::None);
        }

        let last = face + 1 == self.num_faces();
        let result = if last {
            ctx.query(PerceptionTag::RubikSolve)
                .and_then(parse_solution)
                .map(|s| self.solution = s)
        } else {
            ctx.query(PerceptionTag::RubikFace)
                .and_then(|d| d.expect_len(FACE_LEN))
                .map(|d| self.scans.push(d.fields().to_vec()))
        };

        if let Err(e) = result {
            ctx.reject(&e);
            self.capture_retry.fail(ctx.now_s, &e);
            return Err(e.into());
        }
        self.capture_retry.succeed();

        if last {
            info!("Solution has {} moves", self.solution.len());
        } else {
            ctx.status(&format!("Face {} scanned", face + 1));
        }

        self.set_state(RubikState::Restoring { face }, ctx.now_s);
        Ok(self.rotate(inverse_choreography(&self.params.faces[face])))
    }
}

impl Game for RubikGame {
    fn name(&self) -> &'static str {
        "rubik"
    }

    fn mode(&self) -> OperatingMode {
        OperatingMode::Rubik
    }

    fn pose_table(&self) -> &PoseTable {
        &self.poses
    }

    fn reset(&mut self, now_s: f64) {
        *self = Self::new(self.params.clone());
        self.state_start_s = now_s;
    }

    fn step(&mut self, ctx: &mut StepCtx) -> Result<StepOutput, GameError> {
        let now_s = ctx.now_s;

        match self.state {
            RubikState::Init => {
                if now_s - self.state_start_s < self.params.init_delay_s {
                    return Ok(StepOutput::None);
                }
                if self.num_faces() == 0 {
                    return Err(GameError::Logic("No faces to scan".into()));
                }
                ctx.status("Scanning cube...");
                Ok(self.present(0, now_s))
            }
            RubikState::Presenting { face } => {
                self.set_state(RubikState::Capturing { face }, now_s);
                Ok(StepOutput::None)
            }
            RubikState::Capturing { face } => self.capture(ctx, face),
            RubikState::Restoring { face } => {
                if face + 1 < self.num_faces() {
                    return Ok(self.present(face + 1, now_s));
                }

                self.set_state(RubikState::Solving, now_s);
                if self.solution.is_empty() {
                    ctx.status("Cube already solved");
                    return Ok(StepOutput::None);
                }

                ctx.status("Solving...");
                Ok(StepOutput::Rotate {
                    rotations: self.solution.clone(),
                    settle_s: self.params.move_settle_s,
                })
            }
            RubikState::Solving => {
                ctx.status("Cube solved!");
                self.set_state(RubikState::GameOver, now_s);
                Ok(StepOutput::GameOver(Outcome::Completed))
            }
            RubikState::GameOver => Ok(StepOutput::None),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Decode a solution move list. An empty list means the cube is already solved.
pub fn parse_solution(data: SceneData) -> Result<Vec<StepperRotation>, PerceptionError> {
    data.ints()?
        .into_iter()
        .map(|m| decode_move(m).map_err(|e| PerceptionError::InvalidData(e.to_string())))
        .collect()
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        perception::PerceptionBridge,
        sim::{LogStatus, ReplayPerception},
    };

    fn run(perception: &mut ReplayPerception) -> (RubikGame, Vec<StepOutput>, u32) {
        let mut bridge = PerceptionBridge::new();
        let mut status = LogStatus::default();
        let mut game = RubikGame::new(RubikParams::default());
        game.reset(0.0);

        let mut outputs = vec![];
        let mut errors = 0;
        let mut t = 0.0;
        while game.state() != RubikState::GameOver {
            let mut ctx = StepCtx::new(t, &mut *perception, &mut bridge, &mut status);
            match game.step(&mut ctx) {
                Ok(StepOutput::None) => (),
                Ok(o) => outputs.push(o),
                Err(_) => errors += 1,
            }
            t += 0.25;
            assert!(t < 100.0);
        }

        (game, outputs, errors)
    }

    #[test]
    fn test_scan_and_solve() {
        let mut perception = ReplayPerception::default();
        for _ in 0..5 {
            perception.push("rubik", "w,w,w,w,w,w,w,w,w");
        }
        perception.push("rubikSolve", "23,31");

        let (game, outputs, errors) = run(&mut perception);
        assert_eq!(errors, 0);
        assert_eq!(game.scans().len(), 5);
        assert_eq!(game.solution().len(), 2);

        // Present and restore each face, then solve, then finish
        assert_eq!(outputs.len(), 2 * 6 + 2);

        let params = RubikParams::default();
        assert_eq!(
            outputs[6],
            StepOutput::Rotate {
                rotations: params.faces[3].clone(),
                settle_s: params.rotation_settle_s
            }
        );
        assert_eq!(
            outputs[7],
            StepOutput::Rotate {
                rotations: inverse_choreography(&params.faces[3]),
                settle_s: params.rotation_settle_s
            }
        );

        match &outputs[12] {
            StepOutput::Rotate { rotations, .. } => {
                assert_eq!(rotations[0], decode_move(23).unwrap());
                assert_eq!(rotations[1], decode_move(31).unwrap());
            }
            o => panic!("unexpected output {:?}", o),
        }
        assert_eq!(outputs[13], StepOutput::GameOver(Outcome::Completed));
    }

    #[test]
    fn test_bad_scans_and_solved_cube() {
        let mut perception = ReplayPerception::default();
        perception.push("rubik", "w,w,w");
        for _ in 0..5 {
            perception.push("rubik", "w,w,w,w,w,w,w,w,w");
        }
        perception.push("rubikSolve", "77");
        perception.push("rubikSolve", "");

        let (game, outputs, errors) = run(&mut perception);
        assert_eq!(errors, 2);
        assert!(game.solution().is_empty());

        // No solving rotation for a solved cube
        assert_eq!(outputs.len(), 2 * 6 + 1);
        assert_eq!(outputs.last(), Some(&StepOutput::GameOver(Outcome::Completed)));
    }
}
