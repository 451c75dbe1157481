//! Main arm executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Telecommand processing and handling
//!         - Orchestrator processing:
//!             - Motion sequencer and stepper sequencer execution
//!             - Game state machine execution
//!
//! The equipment is simulated: actuator demands are accepted (or randomly rejected) by
//! `SimArm` and `SimSteppers`, and perception responses are replayed from a recording.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use arm_lib::{
    game::{Eqpt, GameParams, Orchestrator},
    motion_seq::MotionSeqParams,
    params::ArmExecParams,
    sim::{LogStatus, ReplayPerception, SimArm, SimSteppers},
};
use comms_if::tc::GameKind;

mod tc_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use tc_processor::TcProcessor;
use util::{
    host,
    logger::logger_init,
    script_interpreter::{PendingTcs, ScriptInterpreter},
    session::{get_elapsed_seconds, Session},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Command line options.
#[derive(Debug, StructOpt)]
#[structopt(name = "arm_exec", about = "Game-playing arm executable")]
struct Opts {
    /// Game to start as soon as the executable is running (xo, memory, cups or rubik)
    #[structopt(short, long)]
    game: Option<GameKind>,

    /// Telecommand script to execute
    #[structopt(parse(from_os_str))]
    script: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("arm_exec", "sessions").wrap_err("Failed to create the session")?;

    // Exec params are loaded first as they hold the log levels
    let exec_params: ArmExecParams = util::params::load_or_default("arm_exec.toml")
        .wrap_err("Could not load exec params")?;

    // Initialise logger
    logger_init(&exec_params.log, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Game-playing Arm Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opts);

    // ---- LOAD PARAMETERS ----

    let motion_params: MotionSeqParams = util::params::load_or_default("motion_seq.toml")
        .wrap_err("Could not load motion sequencer params")?;

    let game_params = GameParams::load().wrap_err("Could not load game params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE TC SOURCE ----

    let mut script = match opts.script {
        Some(ref path) => {
            info!("Loading script from {:?}", path);

            let si = ScriptInterpreter::new(path).wrap_err("Failed to load script")?;

            info!(
                "Loaded script lasts {:.02} s and contains {} TCs\n",
                si.get_duration(),
                si.get_num_tcs()
            );

            Some(si)
        }
        None => None,
    };

    let start_kind = opts.game.or(exec_params.auto_start);

    if script.is_none() && start_kind.is_none() {
        warn!("No script and no game given, nothing to do");
        return Ok(());
    }

    // ---- INITIALISE EQUIPMENT ----

    info!("Initialising equipment...");

    let sim = &exec_params.sim;

    let mut arm = SimArm::new(sim.failure_rate, sim.seed);
    let mut steppers = SimSteppers::new(sim.failure_rate, sim.seed.wrapping_add(1));
    let mut perception = match sim.perception_replay {
        Some(ref rel_path) => {
            let mut path = host::get_arm_sw_root()
                .wrap_err("Cannot locate the perception replay, ARM_SW_ROOT is not set")?;
            path.push(rel_path);

            info!("Loading perception replay from {:?}", path);
            ReplayPerception::from_file(&path).wrap_err("Failed to load the perception replay")?
        }
        None => {
            warn!("No perception replay given, all perception queries will fail");
            ReplayPerception::default()
        }
    };
    let mut status = LogStatus::default();

    let mut eqpt = Eqpt {
        arm: &mut arm,
        steppers: &mut steppers,
        perception: &mut perception,
        status: &mut status,
    };

    info!("Equipment initialisation complete\n");

    // ---- INITIALISE MODULES ----

    let mut orch = Orchestrator::new(
        game_params.build(start_kind.unwrap_or(GameKind::Xo)),
        motion_params,
        exec_params.orchestrator.clone(),
    );
    let mut tcp = TcProcessor::new(game_params);

    if let Some(kind) = start_kind {
        info!("Starting {:?} game", kind);
        orch.start_game(get_elapsed_seconds(), &mut eqpt);
    }

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let cycle_period = Duration::from_secs_f64(exec_params.cycle_period_s);
    let mut num_cycles: u64 = 0;

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();
        let now_s = get_elapsed_seconds();

        // ---- TELECOMMAND PROCESSING ----

        if let Some(ref mut si) = script {
            match si.get_pending_tcs(now_s) {
                PendingTcs::None => (),
                PendingTcs::Some(tc_vec) => {
                    for tc in tc_vec.iter() {
                        tcp.exec(tc, now_s, &mut orch, &mut eqpt);
                    }
                }
                // Exit if end of script reached
                PendingTcs::EndOfScript => {
                    info!("End of TC script reached, stopping");
                    break;
                }
            }
        }

        tcp.proc_pending(now_s, &mut orch, &mut eqpt);

        // ---- ORCHESTRATOR PROCESSING ----

        orch.loop_once(now_s, &mut eqpt);

        // Without a script there is nothing left to do once the game is over
        if script.is_none() && orch.is_over() && !orch.is_busy() {
            if let Some(outcome) = orch.outcome() {
                info!("Game ended: {}", outcome);
            }
            break;
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Cycle overran by {:.06} s",
                cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
            ),
        }

        num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    orch.stop_game(&mut eqpt);

    info!(
        "Ran {} cycles, {} motions and {} stepper sequences, {} perception queries ({} failed)",
        num_cycles,
        orch.num_moves_started(),
        orch.num_rotations_started(),
        orch.bridge().num_queries(),
        orch.bridge().num_failures()
    );
    info!(
        "{} joint demands accepted ({} rejected)",
        arm.history.len(),
        arm.num_rejected
    );

    info!("End of execution");

    Ok(())
}
