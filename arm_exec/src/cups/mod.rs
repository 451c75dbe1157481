//! # Cups game
//!
//! Balls are hidden under a row of cups. Once the perception service has reported what each cup
//! contains, the robot lifts every populated cup in turn, from left to right, showing its
//! contents.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info};
use serde::{Deserialize, Serialize};

use comms_if::eqpt::{display::OperatingMode, perception::PerceptionTag};

use crate::{
    game::{Game, GameError, Outcome, StepCtx, StepOutput},
    motion_seq::MotionRequest,
    perception::{PerceptionError, PerceptionRetry, SceneData},
    pose_table::{GripAngles, Pose, PoseTable, Slot},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Labels reported for an empty cup.
const EMPTY_LABELS: [&str; 2] = ["none", "null"];

/// Slot cups are lifted to, to show their contents.
const DISPLAY: Slot = Slot::Output(0);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CupsParams {
    /// Cups (left to right) and the display pose at `Output(0)`.
    pub poses: PoseTable,

    pub num_cups: usize,

    /// Units: seconds
    pub init_delay_s: f64,

    /// Time given to the players to hide the balls before the cups are read.
    ///
    /// Units: seconds
    pub detection_wait_s: f64,

    /// Delay before reading the cups again after a failed detection.
    ///
    /// Units: seconds
    pub detection_retry_s: f64,

    /// Time the result is shown for after each cup.
    ///
    /// Units: seconds
    pub display_s: f64,
}

/// Cups game context.
#[derive(Debug)]
pub struct CupsGame {
    params: CupsParams,

    state: CupsState,

    state_start_s: f64,

    /// Contents of each cup, `None` for empty cups
    contents: Vec<Option<String>>,

    /// Next cup to check
    next_cup: usize,

    detect_retry: PerceptionRetry,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CupsState {
    Init,
    WaitingForDetection,
    Detecting,
    ProcessingCups,

    /// Lifting the cup to the display pose
    Revealing { cup: usize },

    /// Returning from a reveal
    Retreating { cup: usize },

    Showing,
    FinalRetreat,
    GameOver,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for CupsParams {
    fn default() -> Self {
        let mut poses = PoseTable::with_home(
            Pose::new(108, 90, 85, 55),
            GripAngles {
                open_deg: 100,
                closed_deg: 72,
            },
        );
        poses.cups = vec![
            Pose::new(120, 20, 80, 50),
            Pose::new(108, 25, 85, 55),
            Pose::new(90, 20, 80, 50),
        ];
        poses.output = vec![Pose::new(108, 60, 90, 60)];

        Self {
            poses,
            num_cups: 3,
            init_delay_s: 0.5,
            detection_wait_s: 4.0,
            detection_retry_s: 1.0,
            display_s: 2.0,
        }
    }
}

impl CupsGame {
    pub fn new(params: CupsParams) -> Self {
        Self {
            contents: vec![None; params.num_cups],
            detect_retry: PerceptionRetry::new(params.detection_retry_s),
            params,
            state: CupsState::Init,
            state_start_s: 0.0,
            next_cup: 0,
        }
    }

    pub fn state(&self) -> CupsState {
        self.state
    }

    pub fn contents(&self) -> &[Option<String>] {
        &self.contents
    }

    fn set_state(&mut self, state: CupsState, now_s: f64) {
        debug!("Cups state {:?} -> {:?}", self.state, state);
        self.state = state;
        self.state_start_s = now_s;
    }

    fn retreat(&self) -> StepOutput {
        StepOutput::Move(MotionRequest::Reach {
            target: self.params.poses.home,
            grip: None,
        })
    }

    fn detect(&mut self, ctx: &mut StepCtx) -> Result<StepOutput, GameError> {
        if !self.detect_retry.is_ready(ctx.now_s) {
            return Ok(StepOutput::None);
        }

        let contents = ctx
            .query(PerceptionTag::Cups)
            .and_then(|d| parse_contents(d, self.params.num_cups));

        match contents {
            Ok(c) => {
                self.detect_retry.succeed();
                info!("Cup contents: {:?}", c);
                self.contents = c;
                self.next_cup = 0;
                ctx.status("Balls detected");
                self.set_state(CupsState::ProcessingCups, ctx.now_s);
                Ok(StepOutput::None)
            }
            Err(e) => {
                ctx.reject(&e);
                ctx.status(match e {
                    PerceptionError::Unavailable => "Camera error!",
                    PerceptionError::InvalidData(_) => "No balls detected",
                });
                self.detect_retry.fail(ctx.now_s, &e);
                Err(e.into())
            }
        }
    }

    fn process_next(&mut self, ctx: &mut StepCtx) -> StepOutput {
        let cup = match (self.next_cup..self.contents.len()).find(|&i| self.contents[i].is_some())
        {
            Some(c) => c,
            None => {
                info!("All cups revealed");
                ctx.status("Game completed");
                self.set_state(CupsState::FinalRetreat, ctx.now_s);
                return self.retreat();
            }
        };

        ctx.status(&self.describe(cup));
        self.set_state(CupsState::Revealing { cup }, ctx.now_s);

        StepOutput::Move(MotionRequest::Transfer {
            from: Slot::Cup(cup),
            to: DISPLAY,
        })
    }

    /// Status line for a populated cup.
    fn describe(&self, cup: usize) -> String {
        let label = self.contents[cup].as_deref().unwrap_or("nothing");
        format!("{} in {} cup", label, cup_name(cup))
    }
}

impl Game for CupsGame {
    fn name(&self) -> &'static str {
        "cups"
    }

    fn mode(&self) -> OperatingMode {
        OperatingMode::Cups
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
        let elapsed_s = now_s - self.state_start_s;

        match self.state {
            CupsState::Init => {
                if elapsed_s >= self.params.init_delay_s {
                    ctx.status("Waiting for cups...");
                    self.set_state(CupsState::WaitingForDetection, now_s);
                }
                Ok(StepOutput::None)
            }
            CupsState::WaitingForDetection => {
                if elapsed_s >= self.params.detection_wait_s {
                    self.set_state(CupsState::Detecting, now_s);
                }
                Ok(StepOutput::None)
            }
            CupsState::Detecting => self.detect(ctx),
            CupsState::ProcessingCups => Ok(self.process_next(ctx)),
            CupsState::Revealing { cup } => {
                ctx.status(&self.describe(cup));
                self.set_state(CupsState::Retreating { cup }, now_s);
                Ok(self.retreat())
            }
            CupsState::Retreating { cup } => {
                self.next_cup = cup + 1;
                self.set_state(CupsState::Showing, now_s);
                Ok(StepOutput::None)
            }
            CupsState::Showing => {
                if elapsed_s >= self.params.display_s {
                    self.set_state(CupsState::ProcessingCups, now_s);
                }
                Ok(StepOutput::None)
            }
            CupsState::FinalRetreat => {
                self.set_state(CupsState::GameOver, now_s);
                Ok(StepOutput::GameOver(Outcome::Completed))
            }
            CupsState::GameOver => Ok(StepOutput::None),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Name of a cup position.
pub fn cup_name(cup: usize) -> &'static str {
    match cup {
        0 => "Left",
        1 => "Middle",
        2 => "Right",
        _ => "Unknown",
    }
}

/// Parse the label of every cup, requiring at least one populated cup.
pub fn parse_contents(
    data: SceneData,
    num_cups: usize,
) -> Result<Vec<Option<String>>, PerceptionError> {
    let data = data.expect_len(num_cups)?;

    let contents: Vec<Option<String>> = data
        .fields()
        .iter()
        .map(|f| {
            if f.is_empty() || EMPTY_LABELS.iter().any(|e| f.eq_ignore_ascii_case(e)) {
                None
            } else {
                Some(f.clone())
            }
        })
        .collect();

    if contents.iter().all(|c| c.is_none()) {
        return Err(PerceptionError::InvalidData("No populated cup".into()));
    }

    Ok(contents)
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

    #[test]
    fn test_parse_contents() {
        assert_eq!(
            parse_contents(SceneData::parse("red,none,NULL"), 3),
            Ok(vec![Some("red".to_string()), None, None])
        );
        assert!(parse_contents(SceneData::parse("none,null,none"), 3).is_err());
        assert!(parse_contents(SceneData::parse("red,none"), 3).is_err());
        assert_eq!(cup_name(2), "Right");
    }

    #[test]
    fn test_reveal_order() {
        let mut perception = ReplayPerception::default();
        let mut bridge = PerceptionBridge::new();
        let mut status = LogStatus::default();

        perception.push("cupsResult", "none,none,none");
        perception.push("cupsResult", "blue,none,red");

        let mut game = CupsGame::new(CupsParams::default());
        game.reset(0.0);

        let mut moves = vec![];
        let mut errors = 0;
        let mut t = 0.0;
        while game.state() != CupsState::GameOver {
            let mut ctx = StepCtx::new(t, &mut perception, &mut bridge, &mut status);
            match game.step(&mut ctx) {
                Ok(StepOutput::Move(m)) => moves.push(m),
                Ok(_) => (),
                Err(_) => errors += 1,
            }
            t += 0.25;
            assert!(t < 100.0);
        }

        assert_eq!(errors, 1);
        assert_eq!(bridge.num_queries(), 2);
        assert_eq!(
            moves,
            vec![
                MotionRequest::Transfer {
                    from: Slot::Cup(0),
                    to: DISPLAY
                },
                MotionRequest::Reach {
                    target: CupsParams::default().poses.home,
                    grip: None
                },
                MotionRequest::Transfer {
                    from: Slot::Cup(2),
                    to: DISPLAY
                },
                MotionRequest::Reach {
                    target: CupsParams::default().poses.home,
                    grip: None
                },
                MotionRequest::Reach {
                    target: CupsParams::default().poses.home,
                    grip: None
                },
            ]
        );
        assert!(status.messages.contains(&"blue in Left cup".to_string()));
        assert!(status.messages.contains(&"red in Right cup".to_string()));
    }
}
