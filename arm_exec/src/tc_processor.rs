//! # Telecommand processor module
//!
//! The telecommand processor handles the TCs coming from the script or the operator.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};

// Internal
use arm_lib::game::{ActiveGame, Eqpt, GameParams, Orchestrator};
use comms_if::tc::{GameKind, Tc};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Applies telecommands to the orchestrator.
pub(crate) struct TcProcessor {
    games: GameParams,

    /// Game to start once the arm has finished its current motion
    pending_start: Option<GameKind>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TcProcessor {
    pub(crate) fn new(games: GameParams) -> Self {
        Self {
            games,
            pending_start: None,
        }
    }

    /// Execute a telecommand.
    pub(crate) fn exec(
        &mut self,
        tc: &Tc,
        now_s: f64,
        orch: &mut Orchestrator<ActiveGame>,
        eqpt: &mut Eqpt,
    ) {
        match tc {
            Tc::Heartbeat => debug!("Recieved Heartbeat"),
            Tc::StartGame(kind) => {
                debug!("Recieved StartGame({:?})", kind);

                // Any game in progress is stopped first
                orch.stop_game(eqpt);
                self.pending_start = Some(*kind);
                self.proc_pending(now_s, orch, eqpt);
            }
            Tc::StopGame => {
                debug!("Recieved StopGame");
                self.pending_start = None;
                orch.stop_game(eqpt);
            }
        }
    }

    /// Start the pending game if the arm is idle.
    pub(crate) fn proc_pending(
        &mut self,
        now_s: f64,
        orch: &mut Orchestrator<ActiveGame>,
        eqpt: &mut Eqpt,
    ) {
        let kind = match self.pending_start {
            Some(k) => k,
            None => return,
        };

        if orch.set_game(self.games.build(kind)).is_err() {
            debug!("Arm busy, {:?} start deferred", kind);
            return;
        }

        self.pending_start = None;
        info!("Switching to the {:?} game", kind);
        orch.start_game(now_s, eqpt);
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use arm_lib::{
        game::{Game, Outcome},
        motion_seq::MotionSeqParams,
        sim::{LogStatus, ReplayPerception, SimArm, SimSteppers},
    };
    use comms_if::eqpt::display::OperatingMode;

    #[test]
    fn test_start_deferred_while_moving() {
        let mut arm = SimArm::default();
        let mut steppers = SimSteppers::default();
        let mut perception = ReplayPerception::default();
        let mut status = LogStatus::default();
        let mut eqpt = Eqpt {
            arm: &mut arm,
            steppers: &mut steppers,
            perception: &mut perception,
            status: &mut status,
        };

        let games = GameParams::default();
        let mut orch = Orchestrator::new(
            games.build(GameKind::Xo),
            MotionSeqParams::default(),
            Default::default(),
        );
        let mut tcp = TcProcessor::new(games);

        tcp.exec(&Tc::StartGame(GameKind::Xo), 0.0, &mut orch, &mut eqpt);
        assert!(orch.is_running());

        // Run until the arm is moving
        let mut t = 0.0;
        while !orch.is_busy() {
            orch.loop_once(t, &mut eqpt);
            t += 0.25;
            assert!(t < 10.0);
        }

        tcp.exec(&Tc::StartGame(GameKind::Cups), t, &mut orch, &mut eqpt);
        assert_eq!(orch.outcome(), Some(&Outcome::Stopped));
        assert_eq!(orch.game().mode(), OperatingMode::Xo);

        while orch.is_busy() {
            orch.loop_once(t, &mut eqpt);
            tcp.proc_pending(t, &mut orch, &mut eqpt);
            t += 0.25;
            assert!(t < 100.0);
        }
        tcp.proc_pending(t, &mut orch, &mut eqpt);

        assert_eq!(orch.game().kind(), GameKind::Cups);
        assert!(orch.is_running());
        assert!(!orch.is_over());

        tcp.exec(&Tc::StopGame, t, &mut orch, &mut eqpt);
        assert!(!orch.is_running());
        assert_eq!(orch.outcome(), Some(&Outcome::Stopped));

        drop(eqpt);
        assert_eq!(
            status.modes,
            vec![
                OperatingMode::None,
                OperatingMode::Xo,
                OperatingMode::None,
                OperatingMode::Cups,
                OperatingMode::None
            ]
        );
    }
}
