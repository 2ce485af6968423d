//! Main tripod-side executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - System input acquisition:
//!             - Motor controller responses
//!             - Position feed records, solved into the platform state and published
//!         - Maneuver request processing
//!         - Sequence control processing
//!         - Motor controller command output
//!         - Archiving
//!
//! If a maneuver script is given as the only argument its requests are executed at their script
//! times and the executable stops once the script has ended and the last sequence is complete.
//!
//! # Modules
//!
//! All cyclic modules (e.g. `seq_ctrl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, trace, warn};
use std::env;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use tripod_lib::{
    data_store::DataStore,
    hw_channel::HwChannel,
    kin_ctrl::{self, KinCtrl},
    params::TripodExecParams,
    platform_state::PlatformState,
    request_processor,
    seq_ctrl::SeqCtrl,
    tlm_reader::TlmReader,
};
use util::{
    archive::Archived,
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    script_interpreter::{PendingReqs, ScriptInterpreter},
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.10;

/// Number of cycles per second
const CYCLE_FREQUENCY_HZ: f64 = 1.0 / CYCLE_PERIOD_S;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("tripod_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Tripod Pointing Mount Executable\n");
    info!(
        "Running on: {}",
        host::get_hostname().unwrap_or_else(|| String::from("unknown host"))
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: TripodExecParams =
        util::params::load("tripod_exec.toml").wrap_err("Could not load exec params")?;
    let kin_params: kin_ctrl::Params =
        util::params::load("kin_ctrl.toml").wrap_err("Could not load KinCtrl params")?;

    session.save("params/tripod_exec.json", exec_params.clone());
    session.save("params/kin_ctrl.json", kin_params.clone());

    info!("Exec parameters loaded");

    // ---- INITIALISE REQUEST SOURCE ----

    let mut script = None;

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    // If we have a single argument use it as the script path
    if args.len() == 2 {
        info!("Loading script from \"{}\"", &args[1]);

        let si = ScriptInterpreter::new(&args[1]).wrap_err("Failed to load script")?;

        info!(
            "Loaded script lasts {:.02} s and contains {} requests\n",
            si.get_duration(),
            si.get_num_reqs()
        );

        script = Some(si);
    } else if args.len() == 1 {
        info!("No script provided, only the controller's own activity will be followed\n");
    } else {
        return Err(eyre!(
            "Expected either zero or one argument, found {}",
            args.len() - 1
        ));
    }

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let kin = KinCtrl::new(&kin_params).wrap_err("Failed to initialise KinCtrl")?;
    info!("KinCtrl init complete");

    let mut seq = SeqCtrl::default();
    seq.init("seq_ctrl.toml", &session)
        .wrap_err("Failed to initialise SeqCtrl")?;
    info!("SeqCtrl init complete");

    let platform = PlatformState::new(Some(session.arch_root.join("platform_state")));

    let mut ds = DataStore::new(kin, seq, platform);

    let broadcast_rx = match exec_params.log_broadcasts {
        true => Some(ds.tlm_pub.subscribe()),
        false => None,
    };

    info!("Module initialisation complete\n");

    // ---- INITIALISE HARDWARE ----

    info!("Initialising motor controller interfaces");

    let mut hw = HwChannel::open(&exec_params.cmd_pipe_path, &exec_params.resp_pipe_path)
        .wrap_err("Failed to open the motor controller pipes")?;
    info!("HwChannel initialised");

    let mut tlm_reader = TlmReader::start(&exec_params.feed_path, exec_params.tlm_reader_timing())
        .wrap_err("Failed to start the TlmReader")?;
    info!("TlmReader started on {}", exec_params.feed_path);

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(CYCLE_FREQUENCY_HZ, session::get_elapsed_seconds());

        // ---- DATA INPUT ----

        match hw.poll_responses() {
            Ok(r) => ds.seq_ctrl_input.responses = r,
            Err(e) => warn!("Could not read controller responses: {}", e),
        }

        let records = tlm_reader
            .recv_records()
            .wrap_err("Lost the position feed")?;

        for record in records.iter() {
            let sample = ds.platform.apply_record(&mut ds.kin_ctrl, record);
            ds.tlm_pub.publish(&sample);
            ds.num_records_last_s += 1;
        }

        // ---- REQUEST PROCESSING ----

        if let Some(ref mut si) = script {
            match si.get_pending_reqs_at(ds.time_s) {
                PendingReqs::None => (),
                PendingReqs::Some(reqs) => {
                    for req in reqs.iter() {
                        request_processor::exec(&mut ds, req);
                    }
                }
                // Exit once the script and its last sequence are done
                PendingReqs::EndOfScript => {
                    if ds.seq_ctrl.is_idle() {
                        info!("End of script reached, stopping");
                        break;
                    }
                }
            }
        }

        // ---- CONTROL ALGORITHM PROCESSING ----

        // SeqCtrl processing
        match ds.seq_ctrl.proc(&ds.seq_ctrl_input) {
            Ok((o, r)) => {
                ds.seq_ctrl_output = o;
                ds.seq_ctrl_status_rpt = r;
            }
            Err(e) => warn!("Error during SeqCtrl processing: {}", e),
        };

        // Send command to the controller
        ds.send_seq_ctrl_cmd(&mut hw);

        ds.update_sequence_marker();

        // ---- WRITE ARCHIVES ----

        if let Err(e) = ds.platform.write() {
            warn!("Could not archive the platform state: {}", e);
        }

        // ---- TELEMETRY ----

        if let Some(ref rx) = broadcast_rx {
            for sample in rx.try_iter() {
                info!("{}", sample);
            }
        }

        if ds.is_1_hz_cycle {
            trace!(
                "{} position records in the last second, status {}",
                ds.num_records_last_s,
                ds.platform.status
            );
            ds.num_records_last_s = 0;
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S).checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        ds.num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    tlm_reader.stop();
    session.exit();

    info!("End of execution");

    Ok(())
}
