//! # Cube Stepper Demands
//!
//! The cube holder is turned by five stepper motors. The transport accepts a batch command of
//! ten integers, an `(angle, direction)` pair for each physical channel.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::EqptError;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of stepper channels on the cube holder.
pub const NUM_STEPPER_CHANNELS: usize = 5;

/// Length of the batch command vector sent to the transport.
pub const STEPPER_CMD_LEN: usize = 2 * NUM_STEPPER_CHANNELS;

/// All stepper channels in transport order.
pub const STEPPER_CHANNELS: [StepperChannel; NUM_STEPPER_CHANNELS] = [
    StepperChannel::Left,
    StepperChannel::Right,
    StepperChannel::Front,
    StepperChannel::Back,
    StepperChannel::Down,
];

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Driver for the cube holder's stepper motors.
pub trait StepperDriver {
    /// Send a batch of stepper demands.
    fn send_stepper_dems(&mut self, dems: &StepperDems) -> Result<(), EqptError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single rotation of one stepper.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepperRotation {
    /// The motor to rotate
    pub channel: StepperChannel,

    /// Magnitude of the rotation.
    ///
    /// Units: degrees
    pub angle_deg: i32,

    /// Direction of the rotation
    pub direction: Direction,
}

/// Batch demands for all stepper channels. Channels without a demand do not move.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct StepperDems {
    pub rotations: [Option<(i32, Direction)>; NUM_STEPPER_CHANNELS],
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Stepper motor channels
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum StepperChannel {
    Left,
    Right,
    Front,
    Back,
    Down,
}

/// Rotation direction of a stepper
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum Direction {
    /// Encoded as `0` on the wire
    Forward,
    /// Encoded as `1` on the wire
    Reverse,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl StepperChannel {
    /// Index of this channel in the command vector (the angle is at `2 * index`, the direction
    /// at `2 * index + 1`).
    pub fn index(&self) -> usize {
        match self {
            StepperChannel::Left => 0,
            StepperChannel::Right => 1,
            StepperChannel::Front => 2,
            StepperChannel::Back => 3,
            StepperChannel::Down => 4,
        }
    }
}

impl Direction {
    pub fn flipped(&self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }

    pub fn wire_value(&self) -> i32 {
        match self {
            Direction::Forward => 0,
            Direction::Reverse => 1,
        }
    }
}

impl StepperRotation {
    /// The rotation which undoes this one.
    pub fn inverse(&self) -> Self {
        Self {
            direction: self.direction.flipped(),
            ..*self
        }
    }
}

impl StepperDems {
    /// Build demands which only move the motor of the given rotation.
    pub fn single(rotation: StepperRotation) -> Self {
        let mut dems = Self::default();
        dems.rotations[rotation.channel.index()] = Some((rotation.angle_deg, rotation.direction));
        dems
    }

    /// Encode the demands into the batch command vector expected by the transport.
    pub fn to_cmd_vector(&self) -> [i32; STEPPER_CMD_LEN] {
        let mut cmd = [0; STEPPER_CMD_LEN];

        for (i, rot) in self.rotations.iter().enumerate() {
            if let Some((angle_deg, dir)) = rot {
                cmd[2 * i] = *angle_deg;
                cmd[2 * i + 1] = dir.wire_value();
            }
        }

        cmd
    }
}

impl From<StepperRotation> for StepperDems {
    fn from(rotation: StepperRotation) -> Self {
        Self::single(rotation)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cmd_vector() {
        let dems = StepperDems::single(StepperRotation {
            channel: StepperChannel::Front,
            angle_deg: 90,
            direction: Direction::Reverse,
        });

        assert_eq!(dems.to_cmd_vector(), [0, 0, 0, 0, 90, 1, 0, 0, 0, 0]);
        assert_eq!(StepperDems::default().to_cmd_vector(), [0; STEPPER_CMD_LEN]);
    }
}
