//! # Arm library.
//!
//! This library allows the executable, and the tests, to access the control core of the arm:
//! the motion sequencers, the perception bridge, the orchestrator and the games it plays.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Pose table - maps the named slots of a game layout to joint angles
pub mod pose_table;

/// Motion sequencer - drives the arm and the cube steppers one command per cycle
pub mod motion_seq;

/// Perception bridge - turns perception service responses into scene data
pub mod perception;

/// Game skeleton and orchestrator
pub mod game;

/// Tic-tac-toe
pub mod xo;

/// Memory card matching game
pub mod memory;

/// Find the ball under the cup
pub mod cups;

/// Rubik's cube scanning and solving
pub mod rubik;

/// Simulated equipment
pub mod sim;

/// Executable parameters
pub mod params;
