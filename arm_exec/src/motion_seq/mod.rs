//! # Motion Sequencer module
//!
//! The motion sequencer drives the arm through a multi-joint move one actuator command per
//! cycle, so that the rest of the executable keeps running while the arm moves. A rejected
//! command is retried on a later cycle once the command cooldown has elapsed.
//!
//! The [`StepperSeq`] does the same for batches of cube stepper rotations.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod phase;
mod state;
mod stepper;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use phase::*;
pub use state::*;
pub use stepper::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during MotionSeq operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MotionSeqError {
    #[error("Cannot start a new motion while the current one is still running")]
    Busy,

    #[error("Cannot start an empty stepper sequence")]
    EmptySequence,
}
