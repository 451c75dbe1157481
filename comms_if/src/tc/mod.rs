//! # Telecommand module
//!
//! This module provides telecommand functionality to the communications interface. Telecommands
//! are used by the mode switcher (a script or an operator) to start and stop games.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction sent to the arm executable.
///
/// On the wire a TC is a JSON object with a `type` and an optional `payload`, for example
/// `{"type": "START", "payload": "Xo"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Tc {
    #[serde(rename = "HEARTBEAT")]
    Heartbeat,

    /// Start the given game, stopping any game in progress
    #[serde(rename = "START")]
    StartGame(GameKind),

    /// Stop the game in progress
    #[serde(rename = "STOP")]
    StopGame,
}

/// The games the arm can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameKind {
    Xo,
    Memory,
    Cups,
    Rubik,
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("{0} is not a recognised game")]
    InvalidGame(String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {
    /// Parse a new TC from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        serde_json::from_str(json_str).map_err(TcParseError::InvalidJson)
    }
}

impl FromStr for GameKind {
    type Err = TcParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xo" => Ok(GameKind::Xo),
            "memory" => Ok(GameKind::Memory),
            "cups" => Ok(GameKind::Cups),
            "rubik" => Ok(GameKind::Rubik),
            _ => Err(TcParseError::InvalidGame(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
