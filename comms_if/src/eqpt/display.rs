//! # Display and mode switching interface

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Sink for status messages and the perception operating mode.
pub trait StatusSink {
    /// Show a status message to the players.
    fn display_status(&mut self, msg: &str);

    /// Switch the perception pipeline into the mode required by a game.
    fn set_operating_mode(&mut self, mode: OperatingMode);
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Operating modes of the perception pipeline.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum OperatingMode {
    None,
    Xo,
    Memory,
    Cups,
    Rubik,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl OperatingMode {
    /// The mode string used on the wire.
    pub fn wire_tag(&self) -> &'static str {
        match self {
            OperatingMode::None => "none",
            OperatingMode::Xo => "xo",
            OperatingMode::Memory => "memory",
            OperatingMode::Cups => "cups",
            OperatingMode::Rubik => "rubik",
        }
    }
}
