//! # Platform state
//!
//! Live picture of the platform built from the position feed: actuator steps, controller status,
//! the orientation solved from the steps and the sequence currently running. Owned by the
//! `DataStore` and only ever changed on the control loop.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

// Internal
use crate::kin_ctrl::{ActuatorSteps, EulerAngles, KinCtrl, OrientationAngles};
use crate::seq_ctrl::SequenceKind;
use comms_if::{
    eqpt::mech::ActId,
    eqpt::mech_tlm::MechTlmRecord,
    tm::{PlatformStatus, PositionBroadcast},
};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    maths::wrap_deg,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Current state of the platform.
#[derive(Default)]
pub struct PlatformState {
    /// Last reported encoder position of each actuator
    pub steps: ActuatorSteps,

    pub status: PlatformStatus,

    /// Latched once the controller reports an error
    pub async_error: bool,

    /// Latched once the controller reports the platform centered
    pub centered: bool,

    /// Units: milliseconds
    pub elapsed_ms: f64,

    pub progress: u32,

    /// While set, orientations are not solved and progress is not updated
    pub importing: bool,

    /// Last orientation solved from the feed
    pub orientation: Option<OrientationAngles>,

    /// Sequence currently running on the controller
    pub sequence: Option<SequenceKind>,

    /// Number of records applied
    pub num_records: u64,

    /// Avionics angles in degrees of the previous solved record
    last_angles_deg: Option<[f64; 3]>,

    arch_dir: Option<PathBuf>,
    num_simulations: u32,
    sim_time_s: f64,
    sim_archive: Archiver,
    sim_rows: Vec<SimRow>,
}

/// One telemetry sample, as handed to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TlmSample {
    /// Solved orientation, `None` if the broadcast was zeroed
    pub orientation: Option<OrientationAngles>,

    pub steps: ActuatorSteps,
    pub status: PlatformStatus,

    /// Units: milliseconds
    pub elapsed_ms: f64,

    pub progress: u32,

    pub broadcast: PositionBroadcast,
}

/// Row of the simulation archive.
#[derive(Debug, Clone, Serialize)]
struct SimRow {
    record: u64,
    sim_time_s: f64,
    roll_deg: f64,
    pitch_deg: f64,
    yaw_deg: f64,
    turret_steps: i64,
    front_steps: i64,
    rear_right_steps: i64,
    rear_left_steps: i64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PlatformState {
    /// Create the state, archiving simulations under `arch_dir` if given.
    pub fn new(arch_dir: Option<PathBuf>) -> Self {
        Self {
            arch_dir,
            ..Default::default()
        }
    }

    /// Update the state from a feed record and build the matching sample.
    pub fn apply_record(&mut self, kin: &mut KinCtrl, record: &MechTlmRecord) -> TlmSample {
        if record.status != self.status {
            info!("Platform status: {} -> {}", self.status, record.status);
            self.on_status_change(record.status);
        }

        self.steps = ActuatorSteps(record.steps);
        self.status = record.status;
        match record.status {
            PlatformStatus::Error => self.async_error = true,
            PlatformStatus::Centered => self.centered = true,
            _ => (),
        }
        self.elapsed_ms = record.elapsed_ms;
        if !self.importing {
            self.progress = record.progress;
        }
        self.num_records += 1;

        let orientation = self.solve(kin);

        let mut broadcast = PositionBroadcast {
            roll_deg: 0.0,
            pitch_deg: 0.0,
            yaw_deg: 0.0,
            roll_rate_degs: 0.0,
            pitch_rate_degs: 0.0,
            yaw_rate_degs: 0.0,
            status: self.status,
            elapsed_ms: self.elapsed_ms,
            progress: self.progress,
        };

        if let Some(o) = orientation {
            let angles = degrees(&o.avionics);
            let rates = self.rates(&angles);

            broadcast.roll_deg = angles[0];
            broadcast.pitch_deg = angles[1];
            broadcast.yaw_deg = angles[2];
            broadcast.roll_rate_degs = rates[0];
            broadcast.pitch_rate_degs = rates[1];
            broadcast.yaw_rate_degs = rates[2];

            self.last_angles_deg = Some(angles);
            self.orientation = Some(o);
        } else {
            // Rates restart from the next solved record
            self.last_angles_deg = None;
        }

        if self.status == PlatformStatus::Simulating {
            self.sim_time_s += self.elapsed_ms / 1000.0;
            self.sim_rows.push(SimRow {
                record: self.num_records,
                sim_time_s: self.sim_time_s,
                roll_deg: broadcast.roll_deg,
                pitch_deg: broadcast.pitch_deg,
                yaw_deg: broadcast.yaw_deg,
                turret_steps: self.steps.get(ActId::Turret),
                front_steps: self.steps.get(ActId::Front),
                rear_right_steps: self.steps.get(ActId::RearRight),
                rear_left_steps: self.steps.get(ActId::RearLeft),
            });
        }

        TlmSample {
            orientation,
            steps: self.steps,
            status: self.status,
            elapsed_ms: self.elapsed_ms,
            progress: self.progress,
            broadcast,
        }
    }

    /// Solve the orientation of the current steps, unless the broadcast has to be zeroed.
    fn solve(&mut self, kin: &mut KinCtrl) -> Option<OrientationAngles> {
        if self.importing {
            return None;
        }

        if !kin.steps_within_limits(&self.steps) {
            info!("Actuator steps beyond limits: {:?}", self.steps.0);
            return None;
        }

        let positions = kin.positions_from_steps(&self.steps);
        match kin.solve_orientation(&positions) {
            Ok(o) => Some(o),
            Err(e) => {
                debug!("No orientation for steps {:?}: {}", self.steps.0, e);
                None
            }
        }
    }

    /// Rate of each angle since the previous solved record, zero without one.
    ///
    /// Angle changes are taken the short way round, so a yaw crossing +/-180 degrees gives the
    /// true turret rate.
    ///
    /// Units: degrees/second
    fn rates(&self, angles: &[f64; 3]) -> [f64; 3] {
        let mut rates = [0.0; 3];

        if let Some(last) = self.last_angles_deg {
            if self.elapsed_ms > 0.0 {
                let dt_s = self.elapsed_ms / 1000.0;
                for i in 0..3 {
                    rates[i] = wrap_deg(angles[i] - last[i]) / dt_s;
                }
            }
        }

        rates
    }

    fn on_status_change(&mut self, new_status: PlatformStatus) {
        if new_status == PlatformStatus::Simulating {
            self.num_simulations += 1;
            self.sim_time_s = 0.0;

            if let Some(ref dir) = self.arch_dir {
                let path = dir.join(format!("simulation_{:03}.csv", self.num_simulations));
                self.sim_archive = match Archiver::create(&path) {
                    Ok(a) => {
                        info!("Archiving simulation to {:?}", path);
                        a
                    }
                    Err(e) => {
                        warn!("Simulation will not be archived: {}", e);
                        Archiver::default()
                    }
                };
            }
        } else if self.status == PlatformStatus::Simulating {
            // Rows of the finished simulation still go to its archive
            if let Err(e) = self.write() {
                warn!("Could not write the simulation archive: {}", e);
            }
            self.sim_archive = Archiver::default();
        }
    }

    /// Set or clear the importing flag.
    pub fn set_importing(&mut self, importing: bool) {
        if importing != self.importing {
            info!("Importing: {}", importing);
        }
        self.importing = importing;
    }
}

impl Archived for PlatformState {
    /// Write the simulation rows gathered since the last write.
    fn write(&mut self) -> Result<(), ArchiveError> {
        for row in self.sim_rows.drain(..) {
            self.sim_archive.serialise(row)?;
        }

        Ok(())
    }
}

impl fmt::Display for TlmSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.broadcast)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn degrees(angles: &EulerAngles) -> [f64; 3] {
    [angles.roll_deg(), angles.pitch_deg(), angles.yaw_deg()]
}
