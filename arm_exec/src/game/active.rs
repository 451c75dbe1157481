//! # Active game
//!
//! The executable can switch between games at runtime, so the orchestrator it owns is
//! parameterised over [`ActiveGame`], which dispatches to whichever game is selected.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::info;

use comms_if::{eqpt::display::OperatingMode, tc::GameKind};
use util::params::{self, LoadError};

use super::{Game, GameError, StepCtx, StepOutput};
use crate::{
    cups::{CupsGame, CupsParams},
    memory::{MemoryGame, MemoryParams},
    pose_table::PoseTable,
    rubik::{RubikGame, RubikParams},
    xo::{XoGame, XoParams},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of every game.
#[derive(Debug, Clone, Default)]
pub struct GameParams {
    pub xo: XoParams,
    pub memory: MemoryParams,
    pub cups: CupsParams,
    pub rubik: RubikParams,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug)]
pub enum ActiveGame {
    Xo(XoGame),
    Memory(MemoryGame),
    Cups(CupsGame),
    Rubik(RubikGame),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl GameParams {
    /// Load the parameters of every game, using the defaults of any game without a file.
    pub fn load() -> Result<Self, LoadError> {
        Ok(Self {
            xo: params::load_or_default("xo.toml")?,
            memory: params::load_or_default("memory.toml")?,
            cups: params::load_or_default("cups.toml")?,
            rubik: params::load_or_default("rubik.toml")?,
        })
    }

    /// Build a fresh game of the given kind.
    pub fn build(&self, kind: GameKind) -> ActiveGame {
        info!("Building {:?} game", kind);

        match kind {
            GameKind::Xo => ActiveGame::Xo(XoGame::new(self.xo.clone())),
            GameKind::Memory => ActiveGame::Memory(MemoryGame::new(self.memory.clone())),
            GameKind::Cups => ActiveGame::Cups(CupsGame::new(self.cups.clone())),
            GameKind::Rubik => ActiveGame::Rubik(RubikGame::new(self.rubik.clone())),
        }
    }
}

impl ActiveGame {
    pub fn kind(&self) -> GameKind {
        match self {
            ActiveGame::Xo(_) => GameKind::Xo,
            ActiveGame::Memory(_) => GameKind::Memory,
            ActiveGame::Cups(_) => GameKind::Cups,
            ActiveGame::Rubik(_) => GameKind::Rubik,
        }
    }

    fn inner(&self) -> &dyn Game {
        match self {
            ActiveGame::Xo(g) => g,
            ActiveGame::Memory(g) => g,
            ActiveGame::Cups(g) => g,
            ActiveGame::Rubik(g) => g,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Game {
        match self {
            ActiveGame::Xo(g) => g,
            ActiveGame::Memory(g) => g,
            ActiveGame::Cups(g) => g,
            ActiveGame::Rubik(g) => g,
        }
    }
}

impl Game for ActiveGame {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn mode(&self) -> OperatingMode {
        self.inner().mode()
    }

    fn pose_table(&self) -> &PoseTable {
        self.inner().pose_table()
    }

    fn reset(&mut self, now_s: f64) {
        self.inner_mut().reset(now_s)
    }

    fn step(&mut self, ctx: &mut StepCtx) -> Result<StepOutput, GameError> {
        self.inner_mut().step(ctx)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
