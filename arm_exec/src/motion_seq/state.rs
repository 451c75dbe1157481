//! Implementations for the MotionSeq state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace, warn};

// Internal
use super::{GripAction, MotionRequest, MotionSeqError, MotionSeqParams, Phase};
use crate::pose_table::{GripAngles, Pose, PoseTable};
use comms_if::eqpt::arm::{ArmDriver, JointDem};
use util::time::Cooldown;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Motion sequencer state
#[derive(Debug)]
pub struct MotionSeq {
    params: MotionSeqParams,

    /// The motion in progress, `None` when idle
    current: Option<ActiveMotion>,

    /// Gate between two joint commands
    cmd_gate: Cooldown,

    /// Number of requests completed since creation
    num_completed: u64,
}

/// A request resolved against its pose table.
#[derive(Debug)]
struct ActiveMotion {
    request: MotionRequest,

    plan: Vec<Phase>,

    /// Index of the current phase in the plan
    index: usize,

    /// Pose the grab happens at
    source: Pose,

    /// Pose of the release or reach target
    target: Pose,

    grip_action: Option<GripAction>,

    grip: GripAngles,

    /// Consecutive rejected attempts at the current phase
    attempts: u32,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MotionSeq {
    pub fn new(params: MotionSeqParams) -> Self {
        Self {
            cmd_gate: Cooldown::new(params.cooldown_s),
            params,
            current: None,
            num_completed: 0,
        }
    }

    /// Start a new motion.
    ///
    /// Slots in the request are resolved against `table`. Only valid when no motion is in
    /// progress.
    pub fn start(
        &mut self,
        request: MotionRequest,
        table: &PoseTable,
    ) -> Result<(), MotionSeqError> {
        if self.is_busy() {
            return Err(MotionSeqError::Busy);
        }

        let (source, target, grip_action) = match request {
            MotionRequest::Transfer { from, to } => {
                (table.resolve(from), table.resolve(to), None)
            }
            MotionRequest::Reach { target, grip } => (target, target, grip),
        };

        debug!("New motion {:?}", request);

        self.current = Some(ActiveMotion {
            plan: request.plan(),
            request,
            index: 0,
            source,
            target,
            grip_action,
            grip: table.grip,
            attempts: 0,
        });

        Ok(())
    }

    /// Perform one cycle of the sequencer.
    ///
    /// Issues at most one joint command. Returns `true` on the cycle the motion completes,
    /// `false` otherwise (including when idle or while the command cooldown is running).
    pub fn tick(&mut self, now_s: f64, arm: &mut dyn ArmDriver) -> bool {
        let motion = match self.current {
            Some(ref mut m) => m,
            None => return false,
        };

        if !self.cmd_gate.try_trigger(now_s) {
            return false;
        }

        let phase = motion.plan[motion.index];
        let dem = match motion.dem(phase, &self.params) {
            Some(d) => d,
            None => return false,
        };

        match arm.send_joint_dem(dem) {
            Ok(()) => {
                trace!("{:?} accepted: {}", phase, dem);
                motion.attempts = 0;
                motion.index += 1;
            }
            Err(e) => {
                motion.attempts += 1;
                warn!(
                    "Joint command for {:?} failed ({}), will retry (attempt {})",
                    phase, e, motion.attempts
                );
                return false;
            }
        }

        if motion.index >= motion.plan.len() {
            debug!("Motion {:?} complete", motion.request);
            self.current = None;
            self.num_completed += 1;
            true
        } else {
            false
        }
    }

    /// True if a motion is in progress.
    pub fn is_busy(&self) -> bool {
        self.current.is_some()
    }

    /// The current phase, `Complete` when idle.
    pub fn phase(&self) -> Phase {
        match self.current {
            Some(ref m) => m.plan[m.index],
            None => Phase::Complete,
        }
    }

    /// Number of consecutive rejected commands in the current phase.
    pub fn attempts(&self) -> u32 {
        self.current.as_ref().map(|m| m.attempts).unwrap_or(0)
    }

    /// The request in progress.
    pub fn request(&self) -> Option<MotionRequest> {
        self.current.as_ref().map(|m| m.request)
    }

    /// Number of motions completed since creation.
    pub fn num_completed(&self) -> u64 {
        self.num_completed
    }
}

impl Default for MotionSeq {
    fn default() -> Self {
        Self::new(MotionSeqParams::default())
    }
}

impl ActiveMotion {
    /// Build the joint demand for a phase of this motion.
    fn dem(&self, phase: Phase, params: &MotionSeqParams) -> Option<JointDem> {
        use Phase::*;

        let src = &self.source;
        let tgt = &self.target;

        let angle_deg = match phase {
            GrabOpenGrip | ReleaseOpenGrip => self.grip.open_deg,
            GrabCloseGrip => self.grip.closed_deg,
            GrabShoulderSafe | ReleaseShoulderSafe | ReachShoulderSafe => params.safe_shoulder_deg,
            GrabBase => src.base,
            GrabWrist => src.wrist,
            GrabElbow => src.elbow,
            GrabShoulder => src.shoulder,

            ReleaseElbowInterim => params.release_elbow_interim_deg,
            ReleaseBase | ReachBase => tgt.base,
            ReleaseWristInterim => params.release_wrist_interim_deg,
            ReleaseElbow | ReachElbow => tgt.elbow,
            ReleaseWristMid => params.release_wrist_mid_deg(tgt.wrist),
            ReleaseShoulderLift => tgt.shoulder + params.release_shoulder_lift_deg,
            ReleaseWrist | ReachWrist => tgt.wrist,
            ReleaseShoulder | ReachShoulder => tgt.shoulder,

            ReachGrip => match self.grip_action {
                Some(GripAction::Open) => self.grip.open_deg,
                Some(GripAction::Close) => self.grip.closed_deg,
                None => return None,
            },

            Complete => return None,
        };

        let joint = phase.joint()?;

        Some(JointDem {
            joint,
            angle_deg,
            overshoot_deg: params.overshoot.for_joint(joint),
        })
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::super::{GRAB_PHASES, RELEASE_PHASES};
    use super::*;
    use crate::{pose_table::Slot, sim::SimArm};
    use comms_if::eqpt::arm::JointId;

    /// Time between two ticks in the tests, longer than the default cooldown.
    const TICK_S: f64 = 0.25;

    fn table() -> PoseTable {
        let mut t = PoseTable::with_home(
            Pose::new(90, 90, 90, 90),
            GripAngles {
                open_deg: 110,
                closed_deg: 80,
            },
        );
        t.cells = vec![Pose::new(122, 13, 70, 41), Pose::new(110, 12, 70, 40)];
        t.stack = vec![Pose::new(79, 23, 86, 37)];
        t.output = vec![Pose::new(60, 40, 100, 50)];
        t
    }

    /// Tick the sequencer until it completes, returning the phases seen at each tick.
    fn run(seq: &mut MotionSeq, arm: &mut SimArm, start_s: f64) -> (Vec<Phase>, f64) {
        let mut phases = vec![];
        let mut t = start_s;
        loop {
            phases.push(seq.phase());
            let done = seq.tick(t, arm);
            t += TICK_S;
            if done {
                return (phases, t);
            }
            assert!(phases.len() < 1000, "motion never completed");
        }
    }

    #[test]
    fn test_transfer_all_succeed() {
        let table = table();

        for (from, to) in [
            (Slot::Stack(0), Slot::Cell(0)),
            (Slot::Cell(1), Slot::Cell(0)),
            (Slot::Cell(0), Slot::Output(0)),
        ]
        .iter()
        {
            let mut seq = MotionSeq::default();
            let mut arm = SimArm::default();

            seq.start(
                MotionRequest::Transfer {
                    from: *from,
                    to: *to,
                },
                &table,
            )
            .unwrap();

            let (phases, _) = run(&mut seq, &mut arm, 0.0);

            // Every phase is visited exactly once, in order
            let expected: Vec<Phase> = MotionRequest::Transfer {
                from: *from,
                to: *to,
            }
            .plan();
            assert_eq!(phases, expected);
            assert_eq!(arm.history.len(), expected.len());
            assert_eq!(seq.phase(), Phase::Complete);
            assert!(!seq.is_busy());
            assert_eq!(seq.num_completed(), 1);
        }
    }

    #[test]
    fn test_transfer_dems() {
        let table = table();
        let mut seq = MotionSeq::default();
        let mut arm = SimArm::default();

        seq.start(
            MotionRequest::Transfer {
                from: Slot::Stack(0),
                to: Slot::Cell(0),
            },
            &table,
        )
        .unwrap();
        run(&mut seq, &mut arm, 0.0);

        let dems: Vec<(JointId, i32, i32)> = arm
            .history
            .iter()
            .map(|d| (d.joint, d.angle_deg, d.overshoot_deg))
            .collect();

        assert_eq!(dems.len(), GRAB_PHASES.len() + RELEASE_PHASES.len());
        assert_eq!(
            &dems[..7],
            &[
                (JointId::Grip, 110, 0),
                (JointId::Shoulder, 90, 10),
                (JointId::Base, 79, 0),
                (JointId::Wrist, 37, 4),
                (JointId::Elbow, 86, 0),
                (JointId::Shoulder, 23, 10),
                (JointId::Grip, 80, 0),
            ]
        );
        assert_eq!(dems[9], (JointId::Base, 122, 0));
        assert_eq!(dems[12], (JointId::Wrist, 65, 4));
        assert_eq!(dems[13], (JointId::Shoulder, 23, 10));
        assert_eq!(dems[16], (JointId::Grip, 110, 0));
    }

    #[test]
    fn test_release_wrist_mid() {
        let table = table();
        let transfer = MotionRequest::Transfer {
            from: Slot::Stack(0),
            to: Slot::Cell(0),
        };
        let mid_index = transfer
            .plan()
            .iter()
            .position(|p| *p == Phase::ReleaseWristMid)
            .unwrap();

        // Fully blended towards the release pose
        let mut seq = MotionSeq::new(MotionSeqParams {
            release_wrist_mid_blend: 1.0,
            ..Default::default()
        });
        let mut arm = SimArm::default();
        seq.start(transfer, &table).unwrap();
        run(&mut seq, &mut arm, 0.0);
        assert_eq!(arm.history[mid_index].joint, JointId::Wrist);
        assert_eq!(arm.history[mid_index].angle_deg, 41);

        // Held at the interim angle
        let params = MotionSeqParams {
            release_wrist_mid_blend: 0.0,
            ..Default::default()
        };
        assert_eq!(params.release_wrist_mid_deg(41), 90);
        assert_eq!(MotionSeqParams::default().release_wrist_mid_deg(41), 65);
    }

    #[test]
    fn test_retry_after_failures() {
        let table = table();

        for n in 0..4 {
            let mut seq = MotionSeq::default();
            let mut arm = SimArm::default();

            seq.start(
                MotionRequest::Reach {
                    target: table.home,
                    grip: None,
                },
                &table,
            )
            .unwrap();

            // Advance to the third phase
            let mut t = 0.0;
            for _ in 0..2 {
                assert!(!seq.tick(t, &mut arm));
                t += TICK_S;
            }
            let phase = seq.phase();
            assert_eq!(phase, Phase::ReachWrist);

            // Reject the next n commands
            arm.fail_next(n);
            for i in 0..n {
                assert!(!seq.tick(t, &mut arm));
                assert_eq!(seq.phase(), phase);
                assert_eq!(seq.attempts(), i + 1);
                t += TICK_S;
            }

            // The n+1th attempt succeeds
            assert!(!seq.tick(t, &mut arm));
            assert_eq!(seq.phase(), Phase::ReachElbow);
            assert_eq!(seq.attempts(), 0);
            assert_eq!(arm.num_rejected as u32, n);
        }
    }

    #[test]
    fn test_cooldown_gating() {
        let table = table();
        let mut seq = MotionSeq::default();
        let mut arm = SimArm::default();

        seq.start(
            MotionRequest::Reach {
                target: table.home,
                grip: Some(GripAction::Open),
            },
            &table,
        )
        .unwrap();

        assert!(!seq.tick(0.0, &mut arm));
        assert_eq!(arm.history.len(), 1);

        // Within the cooldown nothing is sent
        assert!(!seq.tick(0.1, &mut arm));
        assert!(!seq.tick(0.15, &mut arm));
        assert_eq!(arm.history.len(), 1);
        assert_eq!(seq.phase(), Phase::ReachBase);

        assert!(!seq.tick(0.25, &mut arm));
        assert_eq!(arm.history.len(), 2);
    }

    #[test]
    fn test_busy_and_idle() {
        let table = table();
        let mut seq = MotionSeq::default();
        let mut arm = SimArm::default();

        // Idle ticks do nothing
        assert!(!seq.tick(0.0, &mut arm));
        assert!(arm.history.is_empty());

        let req = MotionRequest::Reach {
            target: table.home,
            grip: None,
        };
        seq.start(req, &table).unwrap();
        assert_eq!(seq.start(req, &table), Err(MotionSeqError::Busy));

        let (_, t) = run(&mut seq, &mut arm, 0.0);
        assert!(!seq.tick(t, &mut arm));
        assert!(seq.start(req, &table).is_ok());
    }
}
