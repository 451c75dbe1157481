//! Decoding of solution moves and face choreographies

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::stepper::{Direction, StepperRotation, STEPPER_CHANNELS};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveDecodeError {
    #[error("Move {0} does not address one of the five motors")]
    InvalidMotor(i32),
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Decode a solution move.
///
/// The tens digit is the motor (1 to 5), the units digit the turn: 1 is a quarter turn, 2 a
/// half turn, anything else a quarter turn in reverse.
pub fn decode_move(mv: i32) -> Result<StepperRotation, MoveDecodeError> {
    let motor = mv / 10;
    let code = mv % 10;

    if !(1..=STEPPER_CHANNELS.len() as i32).contains(&motor) {
        return Err(MoveDecodeError::InvalidMotor(mv));
    }

    let (angle_deg, direction) = match code {
        1 => (90, Direction::Forward),
        2 => (180, Direction::Forward),
        _ => (90, Direction::Reverse),
    };

    Ok(StepperRotation {
        channel: STEPPER_CHANNELS[(motor - 1) as usize],
        angle_deg,
        direction,
    })
}

/// The choreography which undoes `rotations`: the inverse of each rotation, in reverse order.
pub fn inverse_choreography(rotations: &[StepperRotation]) -> Vec<StepperRotation> {
    rotations.iter().rev().map(|r| r.inverse()).collect()
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::stepper::StepperChannel;

    #[test]
    fn test_decode_move() {
        let r = decode_move(23).unwrap();
        assert_eq!(r.channel, StepperChannel::Right);
        assert_eq!(r.angle_deg, 90);
        assert_eq!(r.direction.wire_value(), 1);

        let r = decode_move(31).unwrap();
        assert_eq!(r.channel, StepperChannel::Front);
        assert_eq!(r.angle_deg, 90);
        assert_eq!(r.direction.wire_value(), 0);

        let r = decode_move(52).unwrap();
        assert_eq!(r.channel, StepperChannel::Down);
        assert_eq!((r.angle_deg, r.direction), (180, Direction::Forward));

        assert_eq!(decode_move(61), Err(MoveDecodeError::InvalidMotor(61)));
        assert_eq!(decode_move(3), Err(MoveDecodeError::InvalidMotor(3)));
        assert_eq!(decode_move(-11), Err(MoveDecodeError::InvalidMotor(-11)));
    }

    #[test]
    fn test_inverse_choreography() {
        let a = decode_move(11).unwrap();
        let b = decode_move(42).unwrap();

        let inv = inverse_choreography(&[a, b]);
        assert_eq!(inv.len(), 2);
        assert_eq!(inv[0].channel, b.channel);
        assert_eq!(inv[0].direction, Direction::Reverse);
        assert_eq!(inv[1].channel, a.channel);
        assert_eq!(inv[1].angle_deg, 90);
        assert_eq!(inverse_choreography(&inv), vec![a, b]);
    }
}
