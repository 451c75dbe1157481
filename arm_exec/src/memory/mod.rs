//! # Memory game
//!
//! Cards are laid face down on a 2x3 board, each of the three shapes appearing twice. Each
//! round the robot reveals cards by moving them into a viewing slot in front of the camera,
//! collecting matched pairs into the output stack and returning mismatched cards to their cells.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod tracker;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

pub use tracker::*;

use std::{collections::VecDeque, convert::TryFrom};

use log::{debug, info};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

use comms_if::eqpt::{display::OperatingMode, perception::PerceptionTag};

use crate::{
    game::{Game, GameError, Outcome, StepCtx, StepOutput},
    motion_seq::MotionRequest,
    perception::{PerceptionError, PerceptionRetry},
    pose_table::{GripAngles, Pose, PoseTable, Slot},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Viewing slot of the first card of a round
const FIRST_VIEW: Slot = Slot::Temp(0);

/// Viewing slot of the second card of a round
const SECOND_VIEW: Slot = Slot::Temp(1);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryParams {
    /// Board cells (row-major), the two viewing slots and the output stack levels.
    pub poses: PoseTable,

    /// Number of distinct shapes, the board holds two cards of each.
    pub num_shapes: usize,

    /// Units: seconds
    pub init_delay_s: f64,

    /// Delay before re-reading a card after a perception failure.
    ///
    /// Units: seconds
    pub reveal_retry_s: f64,

    /// Seed of the card picker, `None` for a random seed.
    pub seed: Option<u64>,
}

/// Memory game context.
#[derive(Debug)]
pub struct MemoryGame {
    params: MemoryParams,

    state: MemoryState,

    state_start_s: f64,

    cards: Vec<Card>,

    tracker: ShapePairTracker,

    /// Motions still to run before the next round
    routing: VecDeque<MotionRequest>,

    /// Next free output stack level
    next_output: usize,

    reveal_retry: PerceptionRetry,

    rng: StdRng,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// What is known about a board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Card {
    Unknown,
    Known(usize),
    Collected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryState {
    Init,
    RoundStart,

    /// The card from `cell` is in the first viewing slot
    RevealFirst { cell: usize },

    /// The card from `cell` is in the second viewing slot
    RevealSecond {
        first_cell: usize,
        first_shape: usize,
        cell: usize,
    },

    /// Running the motions queued by the round
    Routing,

    FinalRetreat,
    GameOver,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for MemoryParams {
    fn default() -> Self {
        let mut poses = PoseTable::with_home(
            Pose::new(90, 90, 90, 90),
            GripAngles {
                open_deg: 110,
                closed_deg: 80,
            },
        );
        poses.cells = vec![
            Pose::new(125, 30, 95, 50),
            Pose::new(108, 28, 92, 48),
            Pose::new(92, 30, 95, 50),
            Pose::new(128, 50, 130, 60),
            Pose::new(108, 52, 135, 62),
            Pose::new(90, 50, 130, 60),
        ];
        poses.temp = vec![Pose::new(60, 35, 100, 50), Pose::new(50, 35, 100, 50)];
        poses.output = vec![
            Pose::new(150, 20, 85, 40),
            Pose::new(150, 23, 85, 38),
            Pose::new(150, 26, 84, 36),
            Pose::new(150, 29, 84, 34),
            Pose::new(150, 32, 84, 32),
            Pose::new(150, 35, 84, 30),
        ];

        Self {
            poses,
            num_shapes: 3,
            init_delay_s: 0.5,
            reveal_retry_s: 1.0,
            seed: None,
        }
    }
}

impl MemoryGame {
    pub fn new(params: MemoryParams) -> Self {
        let rng = match params.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        Self {
            cards: vec![Card::Unknown; 2 * params.num_shapes],
            tracker: ShapePairTracker::new(params.num_shapes),
            reveal_retry: PerceptionRetry::new(params.reveal_retry_s),
            params,
            state: MemoryState::Init,
            state_start_s: 0.0,
            routing: VecDeque::new(),
            next_output: 0,
            rng,
        }
    }

    pub fn state(&self) -> MemoryState {
        self.state
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn tracker(&self) -> &ShapePairTracker {
        &self.tracker
    }

    fn set_state(&mut self, state: MemoryState, now_s: f64) {
        debug!("Memory state {:?} -> {:?}", self.state, state);
        self.state = state;
        self.state_start_s = now_s;
    }

    /// Pick a random cell whose card has never been revealed.
    fn pick_unknown(&mut self) -> Result<usize, GameError> {
        let unknown: Vec<usize> = self
            .cards
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == Card::Unknown)
            .map(|(i, _)| i)
            .collect();

        unknown.choose(&mut self.rng).copied().ok_or_else(|| {
            GameError::Logic(format!(
                "No unknown cards left with {} of {} shapes matched",
                self.tracker.complete(),
                self.tracker.num_shapes()
            ))
        })
    }

    fn next_output(&mut self) -> Slot {
        let slot = Slot::Output(self.next_output);
        self.next_output += 1;
        slot
    }

    /// Match a shape, collecting the cards at both slots.
    fn collect(
        &mut self,
        shape: usize,
        from: [Slot; 2],
        cells: [usize; 2],
    ) -> Result<(), GameError> {
        self.tracker
            .mark_matched(shape)
            .map_err(|e| GameError::Logic(e.to_string()))?;

        for &cell in cells.iter() {
            self.cards[cell] = Card::Collected;
        }

        for &slot in from.iter() {
            let to = self.next_output();
            self.routing.push_back(MotionRequest::Transfer { from: slot, to });
        }

        info!(
            "Shape {} matched at cells {:?} ({}/{})",
            shape,
            cells,
            self.tracker.complete(),
            self.tracker.num_shapes()
        );

        Ok(())
    }

    /// Read the shape of the card in a viewing slot and record it as being at `cell`.
    fn read_card(&mut self, ctx: &mut StepCtx, cell: usize) -> Result<Option<usize>, GameError> {
        if !self.reveal_retry.is_ready(ctx.now_s) {
            return Ok(None);
        }

        let shape = ctx
            .query(PerceptionTag::MemoryCard)
            .and_then(|d| d.expect_len(1))
            .and_then(|d| d.ints())
            .and_then(|v| {
                usize::try_from(v[0])
                    .map_err(|_| PerceptionError::InvalidData(format!("Shape id {}", v[0])))
            })
            .and_then(|s| {
                self.tracker
                    .check(s, cell)
                    .map(|_| s)
                    .map_err(|e| PerceptionError::InvalidData(e.to_string()))
            });

        let shape = match shape {
            Ok(s) => s,
            Err(e) => {
                ctx.reject(&e);
                self.reveal_retry.fail(ctx.now_s, &e);
                return Err(e.into());
            }
        };

        self.reveal_retry.succeed();
        self.tracker
            .record(shape, cell)
            .map_err(|e| GameError::Logic(e.to_string()))?;
        self.cards[cell] = Card::Known(shape);

        debug!("Cell {} holds shape {}", cell, shape);
        Ok(Some(shape))
    }

    fn start_round(&mut self, ctx: &mut StepCtx) -> Result<StepOutput, GameError> {
        if self.tracker.is_complete() {
            ctx.status("All pairs found!");
            self.set_state(MemoryState::FinalRetreat, ctx.now_s);
            return Ok(StepOutput::Move(MotionRequest::Reach {
                target: self.params.poses.home,
                grip: None,
            }));
        }

        // A pair known from earlier rounds is collected straight away
        if let Some((shape, [a, b])) = self.tracker.known_pair() {
            self.collect(shape, [Slot::Cell(a), Slot::Cell(b)], [a, b])?;
            self.set_state(MemoryState::Routing, ctx.now_s);
            return Ok(StepOutput::None);
        }

        let cell = self.pick_unknown()?;
        ctx.status("Revealing a card...");
        self.set_state(MemoryState::RevealFirst { cell }, ctx.now_s);

        Ok(StepOutput::Move(MotionRequest::Transfer {
            from: Slot::Cell(cell),
            to: FIRST_VIEW,
        }))
    }

    fn reveal_first(&mut self, ctx: &mut StepCtx, cell: usize) -> Result<StepOutput, GameError> {
        let shape = match self.read_card(ctx, cell)? {
            Some(s) => s,
            None => return Ok(StepOutput::None),
        };

        // Second occurrence of a shape already seen
        if let Some(partner) = self.tracker.partner(shape, cell) {
            ctx.status("Match!");
            self.collect(shape, [FIRST_VIEW, Slot::Cell(partner)], [cell, partner])?;
            self.set_state(MemoryState::Routing, ctx.now_s);
            return Ok(StepOutput::None);
        }

        let second = self.pick_unknown()?;
        self.set_state(
            MemoryState::RevealSecond {
                first_cell: cell,
                first_shape: shape,
                cell: second,
            },
            ctx.now_s,
        );

        Ok(StepOutput::Move(MotionRequest::Transfer {
            from: Slot::Cell(second),
            to: SECOND_VIEW,
        }))
    }

    fn reveal_second(
        &mut self,
        ctx: &mut StepCtx,
        first_cell: usize,
        first_shape: usize,
        cell: usize,
    ) -> Result<StepOutput, GameError> {
        let shape = match self.read_card(ctx, cell)? {
            Some(s) => s,
            None => return Ok(StepOutput::None),
        };

        if shape == first_shape {
            ctx.status("Match!");
            self.collect(shape, [FIRST_VIEW, SECOND_VIEW], [first_cell, cell])?;
        } else {
            ctx.status("No match");
            self.routing.push_back(MotionRequest::Transfer {
                from: FIRST_VIEW,
                to: Slot::Cell(first_cell),
            });
            self.routing.push_back(MotionRequest::Transfer {
                from: SECOND_VIEW,
                to: Slot::Cell(cell),
            });
        }

        self.set_state(MemoryState::Routing, ctx.now_s);
        Ok(StepOutput::None)
    }
}

impl Game for MemoryGame {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn mode(&self) -> OperatingMode {
        OperatingMode::Memory
    }

    fn pose_table(&self) -> &PoseTable {
        &self.params.poses
    }

    fn reset(&mut self, now_s: f64) {
        let rng = self.rng.clone();
        *self = Self::new(self.params.clone());
        self.rng = rng;
        self.state_start_s = now_s;
    }

    fn step(&mut self, ctx: &mut StepCtx) -> Result<StepOutput, GameError> {
        match self.state {
            MemoryState::Init => {
                if ctx.now_s - self.state_start_s < self.params.init_delay_s {
                    return Ok(StepOutput::None);
                }
                ctx.status("Memory Game Started");
                self.set_state(MemoryState::RoundStart, ctx.now_s);
                Ok(StepOutput::None)
            }
            MemoryState::RoundStart => self.start_round(ctx),
            MemoryState::RevealFirst { cell } => self.reveal_first(ctx, cell),
            MemoryState::RevealSecond {
                first_cell,
                first_shape,
                cell,
            } => self.reveal_second(ctx, first_cell, first_shape, cell),
            MemoryState::Routing => match self.routing.pop_front() {
                Some(req) => Ok(StepOutput::Move(req)),
                None => {
                    self.set_state(MemoryState::RoundStart, ctx.now_s);
                    Ok(StepOutput::None)
                }
            },
            MemoryState::FinalRetreat => {
                self.set_state(MemoryState::GameOver, ctx.now_s);
                Ok(StepOutput::GameOver(Outcome::Completed))
            }
            MemoryState::GameOver => Ok(StepOutput::None),
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
        perception::PerceptionBridge,
        sim::{LogStatus, ReplayPerception},
    };

    /// Play a full game against a hidden layout, answering each reveal with the shape of the
    /// card which was moved into view.
    fn play(layout: &[usize], seed: u64) -> (MemoryGame, Vec<MotionRequest>) {
        let mut perception = ReplayPerception::default();
        let mut bridge = PerceptionBridge::new();
        let mut status = LogStatus::default();

        let mut game = MemoryGame::new(MemoryParams {
            seed: Some(seed),
            init_delay_s: 0.0,
            ..Default::default()
        });
        game.reset(0.0);

        let mut moves = vec![];
        let mut t = 0.0;

        while game.state() != MemoryState::GameOver {
            let mut ctx = StepCtx::new(t, &mut perception, &mut bridge, &mut status);
            let out = game.step(&mut ctx).unwrap();

            if let StepOutput::Move(req) = out {
                if let MotionRequest::Transfer {
                    from: Slot::Cell(c),
                    to: Slot::Temp(_),
                } = req
                {
                    perception.push("memory", &layout[c].to_string());
                }
                moves.push(req);
            }

            // Matched shapes always have both positions known
            for s in 0..game.tracker().num_shapes() {
                let r = game.tracker().get(s).unwrap();
                if r.matched {
                    assert_eq!(r.num_known(), 2);
                }
            }
            assert_eq!(
                game.tracker().is_complete(),
                (0..layout.len() / 2).all(|s| game.tracker().get(s).unwrap().matched)
            );

            t += 0.25;
            assert!(t < 1000.0, "game never finished");
        }

        (game, moves)
    }

    #[test]
    fn test_full_games() {
        for seed in 0..20 {
            for layout in [[0, 1, 2, 0, 1, 2], [2, 2, 1, 1, 0, 0], [0, 1, 1, 2, 2, 0]].iter() {
                let (game, moves) = play(layout, seed);

                assert_eq!(game.tracker().complete(), 3);
                assert!(game.cards().iter().all(|c| *c == Card::Collected));

                // Every card ends in its own output level
                let mut outputs: Vec<usize> = moves
                    .iter()
                    .filter_map(|m| match m {
                        MotionRequest::Transfer {
                            to: Slot::Output(k),
                            ..
                        } => Some(*k),
                        _ => None,
                    })
                    .collect();
                outputs.sort_unstable();
                assert_eq!(outputs, vec![0, 1, 2, 3, 4, 5]);

                // Each shape's positions are the layout's
                for s in 0..3 {
                    let mut pos: Vec<usize> = game
                        .tracker()
                        .get(s)
                        .unwrap()
                        .positions
                        .iter()
                        .flatten()
                        .copied()
                        .collect();
                    pos.sort_unstable();
                    let expected: Vec<usize> =
                        (0..6).filter(|&c| layout[c] == s).collect();
                    assert_eq!(pos, expected);
                }

                assert!(matches!(moves.last(), Some(MotionRequest::Reach { .. })));
            }
        }
    }

    #[test]
    fn test_invalid_card() {
        let mut perception = ReplayPerception::default();
        let mut bridge = PerceptionBridge::new();
        let mut status = LogStatus::default();

        let mut game = MemoryGame::new(MemoryParams {
            seed: Some(1),
            init_delay_s: 0.0,
            ..Default::default()
        });
        game.reset(0.0);

        let mut step = |game: &mut MemoryGame, p: &mut ReplayPerception, t: f64| {
            let mut ctx = StepCtx::new(t, p, &mut bridge, &mut status);
            game.step(&mut ctx)
        };

        step(&mut game, &mut perception, 0.0).unwrap();
        assert!(matches!(
            step(&mut game, &mut perception, 0.25),
            Ok(StepOutput::Move(_))
        ));
        let cell = match game.state() {
            MemoryState::RevealFirst { cell } => cell,
            s => panic!("unexpected state {:?}", s),
        };

        // Out of range, then wrong count, then valid after the backoff
        perception.push("memory", "7");
        assert!(matches!(
            step(&mut game, &mut perception, 0.5),
            Err(GameError::Perception(PerceptionError::InvalidData(_)))
        ));
        perception.push("memory", "1,2");
        assert!(step(&mut game, &mut perception, 1.5).is_err());
        perception.push("memory", "1");
        assert!(matches!(
            step(&mut game, &mut perception, 2.0),
            Ok(StepOutput::None)
        ));
        assert!(step(&mut game, &mut perception, 2.5).is_ok());

        assert_eq!(game.cards()[cell], Card::Known(1));
        assert!(matches!(game.state(), MemoryState::RevealSecond { .. }));
    }
}
