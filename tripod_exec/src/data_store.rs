//! # Data Store

use log::{info, warn};
use std::io::{Read, Write};

use crate::{
    hw_channel::HwChannel, kin_ctrl::KinCtrl, platform_state::PlatformState, seq_ctrl,
    tlm_pub::TlmPublisher,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Session elapsed time at the start of the cycle
    pub time_s: f64,

    // KinCtrl
    pub kin_ctrl: KinCtrl,

    // SeqCtrl
    pub seq_ctrl: seq_ctrl::SeqCtrl,
    pub seq_ctrl_input: seq_ctrl::InputData,
    pub seq_ctrl_output: seq_ctrl::OutputData,
    pub seq_ctrl_status_rpt: seq_ctrl::StatusReport,

    // Platform
    pub platform: PlatformState,
    pub tlm_pub: TlmPublisher,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    /// Number of telemetry records applied during the last second
    pub num_records_last_s: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    pub fn new(kin_ctrl: KinCtrl, seq_ctrl: seq_ctrl::SeqCtrl, platform: PlatformState) -> Self {
        Self {
            num_cycles: 0,
            is_1_hz_cycle: false,
            time_s: 0.0,
            kin_ctrl,
            seq_ctrl,
            seq_ctrl_input: seq_ctrl::InputData::default(),
            seq_ctrl_output: seq_ctrl::OutputData::default(),
            seq_ctrl_status_rpt: seq_ctrl::StatusReport::default(),
            platform,
            tlm_pub: TlmPublisher::default(),
            num_consec_cycle_overruns: 0,
            num_records_last_s: 0,
        }
    }

    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, sets the 1Hz cycle flag and
    /// records the session time of the cycle.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64, time_s: f64) {
        self.is_1_hz_cycle = self.num_cycles % (cycle_frequency_hz as u128) == 0;

        self.time_s = time_s;

        self.seq_ctrl_input = seq_ctrl::InputData {
            responses: Vec::new(),
            time_s: self.time_s,
        };
        self.seq_ctrl_output = seq_ctrl::OutputData::default();
        self.seq_ctrl_status_rpt = seq_ctrl::StatusReport::default();
    }

    /// Write the sequencer's command of this cycle to the controller.
    ///
    /// A command which cannot be written will never be acknowledged, so its sequence is aborted
    /// straight away.
    pub fn send_seq_ctrl_cmd<W: Write, R: Read>(&mut self, hw: &mut HwChannel<W, R>) {
        let e = match self.seq_ctrl_output.cmd {
            Some(ref cmd) => match hw.send(cmd) {
                Ok(()) => return,
                Err(e) => e,
            },
            None => return,
        };

        warn!("{}", e);
        if let Some(aborted) = self
            .seq_ctrl
            .abort(seq_ctrl::AbortCause::SendFailed(e.to_string()))
        {
            self.seq_ctrl_status_rpt.aborted = Some(aborted);
        }
    }

    /// Apply the sequencer's status to the platform state.
    pub fn update_sequence_marker(&mut self) {
        let marker = self.seq_ctrl.state().kind();

        if marker != self.platform.sequence {
            match marker {
                Some(k) => info!("Sequence in progress: {}", k),
                None => info!("No sequence in progress"),
            }
            self.platform.sequence = marker;
        }
    }
}
