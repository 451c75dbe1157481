//! # Perception Service Interface
//!
//! The perception service (camera and inference pipeline) is reached through a string based
//! query/response channel. Queries carry a context tag, responses are either comma separated
//! data or the failure sentinel.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Response returned by the service when it cannot produce data for the query.
pub const PERCEPTION_FAILURE: &str = "ERROR";

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// The external perception service.
pub trait PerceptionService {
    /// Query the service with a wire tag, returning the raw response.
    fn query(&mut self, tag: &str) -> String;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Context tags understood by the perception service.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum PerceptionTag {
    /// Snapshot of the tic-tac-toe board
    Xo,

    /// Shape on the card currently held in the viewing slot
    MemoryCard,

    /// Contents of each cup
    Cups,

    /// Colours of the cube face presented to the camera
    RubikFace,

    /// Scan of the last face, returning the solution move list
    RubikSolve,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl PerceptionTag {
    /// The tag string used on the wire.
    pub fn wire_tag(&self) -> &'static str {
        match self {
            PerceptionTag::Xo => "xo",
            PerceptionTag::MemoryCard => "memory",
            PerceptionTag::Cups => "cupsResult",
            PerceptionTag::RubikFace => "rubik",
            PerceptionTag::RubikSolve => "rubikSolve",
        }
    }

    pub fn from_wire_tag(tag: &str) -> Option<Self> {
        match tag {
            "xo" => Some(PerceptionTag::Xo),
            "memory" => Some(PerceptionTag::MemoryCard),
            "cupsResult" => Some(PerceptionTag::Cups),
            "rubik" => Some(PerceptionTag::RubikFace),
            "rubikSolve" => Some(PerceptionTag::RubikSolve),
            _ => None,
        }
    }
}

impl std::fmt::Display for PerceptionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.wire_tag())
    }
}
