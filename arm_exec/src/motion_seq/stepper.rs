//! Non-blocking sequencer for the cube holder's stepper motors

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::VecDeque;

use log::{debug, warn};

use super::MotionSeqError;
use comms_if::eqpt::stepper::{StepperDems, StepperDriver, StepperRotation};
use util::time::Cooldown;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Sends a list of stepper rotations one batch command per cycle.
///
/// After each accepted command the sequencer waits for the settle delay before sending the
/// next one. The sequence is complete once the last rotation has settled.
#[derive(Debug)]
pub struct StepperSeq {
    /// Time to wait before resending a rejected command.
    ///
    /// Units: seconds
    retry_s: f64,

    /// Time to wait after an accepted command.
    ///
    /// Units: seconds
    settle_s: f64,

    pending: VecDeque<StepperRotation>,

    gate: Cooldown,

    /// True from `start` until completion is reported
    active: bool,

    num_sent: u64,

    num_completed: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl StepperSeq {
    pub fn new(retry_s: f64) -> Self {
        Self {
            retry_s,
            settle_s: 0.0,
            pending: VecDeque::new(),
            gate: Cooldown::new(retry_s),
            active: false,
            num_sent: 0,
            num_completed: 0,
        }
    }

    /// Start a new sequence of rotations.
    pub fn start(
        &mut self,
        rotations: Vec<StepperRotation>,
        settle_s: f64,
    ) -> Result<(), MotionSeqError> {
        if self.active {
            return Err(MotionSeqError::Busy);
        }
        if rotations.is_empty() {
            return Err(MotionSeqError::EmptySequence);
        }

        debug!("New stepper sequence of {} rotations", rotations.len());

        self.pending = rotations.into();
        self.settle_s = settle_s;
        self.gate.reset();
        self.active = true;

        Ok(())
    }

    /// Perform one cycle of the sequencer, returning `true` on the cycle the sequence
    /// completes.
    pub fn tick(&mut self, now_s: f64, steppers: &mut dyn StepperDriver) -> bool {
        if !self.active || !self.gate.is_ready(now_s) {
            return false;
        }

        let rotation = match self.pending.front() {
            Some(r) => *r,
            None => {
                // Last rotation has settled
                self.active = false;
                self.num_completed += 1;
                return true;
            }
        };

        match steppers.send_stepper_dems(&StepperDems::single(rotation)) {
            Ok(()) => {
                self.pending.pop_front();
                self.num_sent += 1;
                self.gate.hold(now_s, self.settle_s);
            }
            Err(e) => {
                warn!(
                    "Stepper command {:?} failed ({}), will retry",
                    rotation, e
                );
                self.gate.hold(now_s, self.retry_s);
            }
        }

        false
    }

    pub fn is_busy(&self) -> bool {
        self.active
    }

    /// Number of rotations still to be sent.
    pub fn num_pending(&self) -> usize {
        self.pending.len()
    }

    /// Number of rotations accepted since creation.
    pub fn num_sent(&self) -> u64 {
        self.num_sent
    }

    /// Number of sequences completed since creation.
    pub fn num_completed(&self) -> u64 {
        self.num_completed
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::SimSteppers;
    use comms_if::eqpt::stepper::{Direction, StepperChannel};

    fn rot(channel: StepperChannel) -> StepperRotation {
        StepperRotation {
            channel,
            angle_deg: 90,
            direction: Direction::Forward,
        }
    }

    #[test]
    fn test_stepper_seq() {
        let mut seq = StepperSeq::new(0.25);
        let mut steppers = SimSteppers::default();

        assert_eq!(seq.start(vec![], 1.0), Err(MotionSeqError::EmptySequence));

        seq.start(vec![rot(StepperChannel::Left), rot(StepperChannel::Down)], 1.0)
            .unwrap();
        assert_eq!(
            seq.start(vec![rot(StepperChannel::Left)], 1.0),
            Err(MotionSeqError::Busy)
        );

        // First rotation sent immediately
        assert!(!seq.tick(0.0, &mut steppers));
        assert_eq!(steppers.history.len(), 1);

        // Settling
        assert!(!seq.tick(0.5, &mut steppers));
        assert_eq!(steppers.history.len(), 1);

        // Second rotation rejected, then accepted once the retry delay has passed
        steppers.fail_next(1);
        assert!(!seq.tick(1.0, &mut steppers));
        assert!(!seq.tick(1.1, &mut steppers));
        assert!(!seq.tick(1.25, &mut steppers));
        assert_eq!(steppers.history.len(), 2);
        assert_eq!(seq.num_pending(), 0);

        // Complete once the last rotation has settled
        assert!(!seq.tick(2.0, &mut steppers));
        assert!(seq.tick(2.25, &mut steppers));
        assert!(!seq.is_busy());
        assert_eq!(seq.num_completed(), 1);
        assert!(!seq.tick(3.0, &mut steppers));
        assert_eq!(
            steppers.history[1].to_cmd_vector(),
            [0, 0, 0, 0, 0, 0, 0, 0, 90, 0]
        );
    }
}
