//! # Tic-tac-toe
//!
//! The robot plays X and moves first, taking its pieces from a stack next to the board. After
//! each of its moves it retreats, waits for the opponent to play, and reads the board back from
//! the perception service. A captured board is only accepted if it differs from the last known
//! board by exactly one legal opponent move.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod board;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

pub use board::*;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use comms_if::eqpt::{display::OperatingMode, perception::PerceptionTag};

use crate::{
    game::{Game, GameError, Outcome, StepCtx, StepOutput},
    motion_seq::MotionRequest,
    perception::PerceptionRetry,
    pose_table::{GripAngles, Pose, PoseTable, Slot},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const ROBOT: Mark = Mark::X;
const OPPONENT: Mark = Mark::O;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct XoParams {
    /// Board cells (row-major) and stack levels (lowest first).
    pub poses: PoseTable,

    /// Delay between the start of the game and the first motion.
    ///
    /// Units: seconds
    pub init_delay_s: f64,

    /// Time given to the opponent before the board is captured.
    ///
    /// Units: seconds
    pub player_wait_s: f64,

    /// Delay before re-capturing the board after a perception failure.
    ///
    /// Units: seconds
    pub capture_retry_s: f64,

    /// Delay before re-capturing the board after an illegal opponent move.
    ///
    /// Units: seconds
    pub illegal_move_retry_s: f64,
}

/// Tic-tac-toe game context.
#[derive(Debug)]
pub struct XoGame {
    params: XoParams,

    state: XoState,

    /// Time the current state was entered.
    ///
    /// Units: seconds
    state_start_s: f64,

    /// Board including the robot's latest move
    board: Board,

    /// Last board confirmed by a capture
    last_board: Board,

    /// Stack level of the next piece, `None` once the stack is empty
    next_piece: Option<usize>,

    capture_retry: PerceptionRetry,

    /// Result to report once the final retreat is complete
    result: Option<Outcome>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XoState {
    Init,
    RobotInit,
    Thinking,
    Placing,
    Retreating,
    WaitingForPlayer,
    Capturing,
    FinalRetreat,
    GameOver,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for XoParams {
    fn default() -> Self {
        let mut poses = PoseTable::with_home(
            Pose::new(90, 90, 90, 90),
            GripAngles {
                open_deg: 110,
                closed_deg: 80,
            },
        );
        poses.cells = vec![
            Pose::new(122, 13, 70, 41),
            Pose::new(110, 12, 70, 40),
            Pose::new(96, 12, 68, 40),
            Pose::new(127, 34, 112, 52),
            Pose::new(110, 43, 126, 65),
            Pose::new(95, 38, 116, 60),
            Pose::new(130, 54, 145, 64),
            Pose::new(110, 60, 150, 68),
            Pose::new(91, 57, 145, 66),
        ];
        poses.stack = vec![
            Pose::new(79, 23, 86, 37),
            Pose::new(79, 26, 86, 35),
            Pose::new(79, 27, 84, 32),
            Pose::new(79, 30, 84, 31),
            Pose::new(79, 34, 84, 30),
        ];

        Self {
            poses,
            init_delay_s: 0.5,
            player_wait_s: 4.0,
            capture_retry_s: 1.0,
            illegal_move_retry_s: 2.0,
        }
    }
}

impl XoGame {
    pub fn new(params: XoParams) -> Self {
        let capture_retry = PerceptionRetry::new(params.capture_retry_s);
        let next_piece = params.poses.stack.len().checked_sub(1);

        Self {
            params,
            state: XoState::Init,
            state_start_s: 0.0,
            board: Board::new(),
            last_board: Board::new(),
            next_piece,
            capture_retry,
            result: None,
        }
    }

    pub fn state(&self) -> XoState {
        self.state
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Number of captures rejected since the last accepted one.
    pub fn consecutive_failures(&self) -> u32 {
        self.capture_retry.consecutive_failures()
    }

    fn set_state(&mut self, state: XoState, now_s: f64) {
        debug!("XO state {:?} -> {:?}", self.state, state);
        self.state = state;
        self.state_start_s = now_s;
    }

    fn retreat(&self) -> StepOutput {
        StepOutput::Move(MotionRequest::Reach {
            target: self.params.poses.home,
            grip: None,
        })
    }

    /// The result of the game on the current board, if it is decided.
    fn result(&self) -> Option<Outcome> {
        match self.board.winner() {
            Some(m) if m == ROBOT => Some(Outcome::RobotWin),
            Some(_) => Some(Outcome::OpponentWin),
            None if self.board.is_full() => Some(Outcome::Tie),
            None => None,
        }
    }

    /// If the game is decided move to the final retreat.
    fn check_result(&mut self, ctx: &mut StepCtx) -> Option<StepOutput> {
        let outcome = self.result()?;

        info!("XO game decided: {}", outcome);
        self.result = Some(outcome);
        self.set_state(XoState::FinalRetreat, ctx.now_s);

        Some(self.retreat())
    }

    fn think(&mut self, ctx: &mut StepCtx) -> Result<StepOutput, GameError> {
        let (row, col) = find_best_move(&self.board, ROBOT)
            .ok_or_else(|| GameError::Logic("No free cell for the robot's move".into()))?;

        let level = self
            .next_piece
            .ok_or_else(|| GameError::Logic("Out of pieces in the stack".into()))?;
        self.next_piece = level.checked_sub(1);

        self.board.set(row, col, ROBOT);
        self.last_board.set(row, col, ROBOT);

        info!("Robot plays ({}, {}) with stack piece {}", row, col, level);
        ctx.status(&format!("Robot plays: {},{}", row + 1, col + 1));

        self.set_state(XoState::Placing, ctx.now_s);

        Ok(StepOutput::Move(MotionRequest::Transfer {
            from: Slot::Stack(level),
            to: Slot::Cell(row * BOARD_SIZE + col),
        }))
    }

    fn capture(&mut self, ctx: &mut StepCtx) -> Result<StepOutput, GameError> {
        if !self.capture_retry.is_ready(ctx.now_s) {
            return Ok(StepOutput::None);
        }

        ctx.status("Reading board...");

        let captured = match ctx.query(PerceptionTag::Xo).and_then(Board::from_capture) {
            Ok(b) => b,
            Err(e) => {
                ctx.reject(&e);
                self.capture_retry.fail(ctx.now_s, &e);
                return Err(e.into());
            }
        };

        if let Err(e) = validate_opponent_move(&self.last_board, &captured, OPPONENT) {
            self.capture_retry
                .fail_for(ctx.now_s, &e, self.params.illegal_move_retry_s);
            return Err(GameError::IllegalMove(e.to_string()));
        }

        self.capture_retry.succeed();
        self.board = captured;
        self.last_board = captured;
        info!("Opponent moved, board: {}", self.board);

        if let Some(out) = self.check_result(ctx) {
            return Ok(out);
        }

        self.set_state(XoState::Thinking, ctx.now_s);
        Ok(StepOutput::None)
    }
}

impl Game for XoGame {
    fn name(&self) -> &'static str {
        "xo"
    }

    fn mode(&self) -> OperatingMode {
        OperatingMode::Xo
    }

    fn pose_table(&self) -> &PoseTable {
        &self.params.poses
    }

    fn reset(&mut self, now_s: f64) {
        *self = Self::new(self.params.clone());
        self.state_start_s = now_s;
    }

    fn step(&mut self, ctx: &mut StepCtx) -> Result<StepOutput, GameError> {
        let now_s = ctx.now_s;

        match self.state {
            XoState::Init => {
                if now_s - self.state_start_s < self.params.init_delay_s {
                    return Ok(StepOutput::None);
                }
                ctx.status("XO Game Started");
                self.set_state(XoState::RobotInit, now_s);
                Ok(self.retreat())
            }
            XoState::RobotInit => {
                self.set_state(XoState::Thinking, now_s);
                Ok(StepOutput::None)
            }
            XoState::Thinking => self.think(ctx),
            XoState::Placing => {
                if let Some(out) = self.check_result(ctx) {
                    return Ok(out);
                }
                ctx.status("Robot retreating...");
                self.set_state(XoState::Retreating, now_s);
                Ok(self.retreat())
            }
            XoState::Retreating => {
                ctx.status("Your turn...");
                self.set_state(XoState::WaitingForPlayer, now_s);
                Ok(StepOutput::None)
            }
            XoState::WaitingForPlayer => {
                if now_s - self.state_start_s >= self.params.player_wait_s {
                    self.set_state(XoState::Capturing, now_s);
                }
                Ok(StepOutput::None)
            }
            XoState::Capturing => self.capture(ctx),
            XoState::FinalRetreat => {
                self.set_state(XoState::GameOver, now_s);
                Ok(StepOutput::GameOver(
                    self.result.clone().unwrap_or(Outcome::Completed),
                ))
            }
            XoState::GameOver => Ok(StepOutput::None),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        game::{Eqpt, Orchestrator},
        motion_seq::MotionSeqParams,
        perception::PerceptionBridge,
        sim::{LogStatus, ReplayPerception, SimArm, SimSteppers},
    };

    /// Encode a board as a capture string.
    fn capture(cells: [[u8; 3]; 3]) -> String {
        let mut v = vec![];
        for row in cells.iter() {
            v.push("9".to_string());
            v.extend(row.iter().map(|c| c.to_string()));
            v.push("9".to_string());
        }
        v.join(",")
    }

    struct Harness {
        perception: ReplayPerception,
        bridge: PerceptionBridge,
        status: LogStatus,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                perception: ReplayPerception::default(),
                bridge: PerceptionBridge::new(),
                status: LogStatus::default(),
            }
        }

        fn step(&mut self, game: &mut XoGame, now_s: f64) -> Result<StepOutput, GameError> {
            let mut ctx = StepCtx::new(
                now_s,
                &mut self.perception,
                &mut self.bridge,
                &mut self.status,
            );
            game.step(&mut ctx)
        }
    }

    #[test]
    fn test_opening_and_capture_retry() {
        let mut h = Harness::new();
        let mut game = XoGame::new(XoParams::default());
        game.reset(0.0);

        // Settle delay
        assert_eq!(h.step(&mut game, 0.25), Ok(StepOutput::None));
        assert!(matches!(
            h.step(&mut game, 0.5),
            Ok(StepOutput::Move(MotionRequest::Reach { grip: None, .. }))
        ));
        assert_eq!(game.state(), XoState::RobotInit);

        h.step(&mut game, 1.0).unwrap();
        assert_eq!(
            h.step(&mut game, 1.25),
            Ok(StepOutput::Move(MotionRequest::Transfer {
                from: Slot::Stack(4),
                to: Slot::Cell(4)
            }))
        );
        assert_eq!(game.board().get(1, 1), Mark::X);

        // Placing, retreating, waiting
        assert!(matches!(h.step(&mut game, 2.0), Ok(StepOutput::Move(_))));
        assert_eq!(game.state(), XoState::Retreating);
        h.step(&mut game, 3.0).unwrap();
        assert_eq!(game.state(), XoState::WaitingForPlayer);
        h.step(&mut game, 5.0).unwrap();
        assert_eq!(game.state(), XoState::WaitingForPlayer);
        h.step(&mut game, 7.0).unwrap();
        assert_eq!(game.state(), XoState::Capturing);

        // Camera failure then backoff
        assert!(matches!(
            h.step(&mut game, 7.25),
            Err(GameError::Perception(_))
        ));
        assert_eq!(h.step(&mut game, 7.5), Ok(StepOutput::None));
        assert_eq!(h.bridge.num_queries(), 1);

        // Illegal move: two new marks
        h.perception
            .push("xo", &capture([[2, 0, 2], [0, 1, 0], [0, 0, 0]]));
        assert!(matches!(
            h.step(&mut game, 8.25),
            Err(GameError::IllegalMove(_))
        ));
        assert_eq!(game.consecutive_failures(), 2);
        assert_eq!(h.step(&mut game, 9.25), Ok(StepOutput::None));

        // Legal move
        h.perception
            .push("xo", &capture([[2, 0, 0], [0, 1, 0], [0, 0, 0]]));
        assert_eq!(h.step(&mut game, 10.25), Ok(StepOutput::None));
        assert_eq!(game.state(), XoState::Thinking);
        assert_eq!(h.bridge.num_queries(), 3);
        assert_eq!(game.consecutive_failures(), 0);

        // Next robot move takes the next stack piece, into the first free corner
        assert_eq!(
            h.step(&mut game, 10.5),
            Ok(StepOutput::Move(MotionRequest::Transfer {
                from: Slot::Stack(3),
                to: Slot::Cell(2)
            }))
        );
    }

    #[test]
    fn test_out_of_pieces() {
        let mut h = Harness::new();
        let mut params = XoParams::default();
        params.poses.stack.clear();
        params.init_delay_s = 0.0;

        let mut game = XoGame::new(params);
        game.reset(0.0);

        h.step(&mut game, 0.0).unwrap();
        h.step(&mut game, 0.25).unwrap();
        assert!(matches!(h.step(&mut game, 0.5), Err(GameError::Logic(_))));
    }

    #[test]
    fn test_opponent_win() {
        let mut arm = SimArm::default();
        let mut steppers = SimSteppers::default();
        let mut perception = ReplayPerception::default();
        let mut status = LogStatus::default();
        perception.push("xo", &capture([[2, 2, 2], [0, 1, 0], [1, 0, 0]]));
        let mut eqpt = Eqpt {
            arm: &mut arm,
            steppers: &mut steppers,
            perception: &mut perception,
            status: &mut status,
        };

        let mut orch = Orchestrator::new(
            XoGame::new(XoParams::default()),
            MotionSeqParams::default(),
            Default::default(),
        );
        orch.start_game(0.0, &mut eqpt);

        // Resume a game where the opponent is one move from the top row
        let mut last = Board::new();
        last.set(1, 1, Mark::X);
        last.set(2, 0, Mark::X);
        last.set(0, 0, Mark::O);
        last.set(0, 2, Mark::O);
        {
            let game = orch.game_mut();
            game.board = last;
            game.last_board = last;
            game.next_piece = Some(2);
            game.set_state(XoState::Capturing, 0.0);
        }

        let mut states = vec![];
        let mut t = 0.0;
        while !orch.is_over() {
            orch.loop_once(t, &mut eqpt);
            if states.last() != Some(&orch.game().state()) {
                states.push(orch.game().state());
            }
            t += 0.25;
            assert!(t < 100.0, "game never finished");
        }

        assert_eq!(states, vec![XoState::FinalRetreat, XoState::GameOver]);
        assert_eq!(orch.outcome(), Some(&Outcome::OpponentWin));
        assert_eq!(orch.game().board().winner(), Some(Mark::O));
        assert_eq!(orch.num_moves_started(), 1);

        drop(eqpt);
        assert_eq!(
            status
                .messages
                .iter()
                .filter(|m| *m == "You win! Game Over")
                .count(),
            1
        );
        assert_eq!(
            status.messages.last().map(|m| m.as_str()),
            Some("You win! Game Over")
        );
        assert!(!status.messages.iter().any(|m| m.starts_with("Robot plays")));
    }
}
