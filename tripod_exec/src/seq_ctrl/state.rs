//! Implementations for the SeqCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use serde::Serialize;

// Internal
use super::{AbortCause, Params, SeqCtrlError, SequenceKind, SequenceState};
use crate::kin_ctrl::{ActuatorSteps, NUM_LIN_ACTS};
use comms_if::eqpt::mech::{ActId, MechCmd, MechResponse};
use util::{module::State, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Sequence control module state
#[derive(Debug, Default)]
pub struct SeqCtrl {
    pub(crate) params: Params,

    pub(crate) state: SequenceState,

    /// Command written to the controller and not yet acknowledged
    in_flight: Option<InFlight>,

    /// Command waiting to be written on the next cycle
    pending: Option<MechCmd>,

    /// Payload mass applied by the next weight correction, zero when disarmed
    ///
    /// Units: kilograms
    armed_mass_kg: f64,

    report: StatusReport,
}

#[derive(Debug, Clone)]
struct InFlight {
    cmd: MechCmd,
    sent_at_s: f64,
}

/// Input data to Sequence Control.
#[derive(Debug, Default)]
pub struct InputData {
    /// Lines received from the controller since the last cycle, in arrival order
    pub responses: Vec<MechResponse>,

    /// Session elapsed time at the start of the cycle
    ///
    /// Units: seconds
    pub time_s: f64,
}

/// Output of Sequence Control.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct OutputData {
    /// Command to write to the controller on this cycle
    pub cmd: Option<MechCmd>,
}

/// Status report for SeqCtrl processing.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    /// A sequence started on its own during this cycle
    pub started: Option<SequenceKind>,

    /// A sequence had its last stage acknowledged during this cycle
    pub completed: Option<SequenceKind>,

    /// A sequence was aborted during this cycle
    pub aborted: Option<(SequenceKind, AbortCause)>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for SeqCtrl {
    type InitData = &'static str;
    type InitError = SeqCtrlError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = SeqCtrlError;

    /// Initialise the SeqCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, _session: &Session) -> Result<(), Self::InitError> {
        *self = Self::from_params(params::load(init_data)?)?;

        Ok(())
    }

    /// Perform cyclic processing of Sequence Control.
    ///
    /// Responses are handled first, so a command emitted on this cycle can only be acknowledged
    /// by lines received on a later one.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        self.report = StatusReport::default();

        for response in input_data.responses.iter() {
            self.handle_response(response);
        }

        let timed_out = match self.in_flight {
            Some(ref f) if input_data.time_s - f.sent_at_s > self.params.ack_timeout_s => {
                warn!(
                    "No acknowledgement of \"{}\" after {:.1} s",
                    f.cmd, self.params.ack_timeout_s
                );
                true
            }
            _ => false,
        };
        if timed_out {
            self.abort(AbortCause::AckTimeout);
        }

        let mut output = OutputData::default();

        if let Some(cmd) = self.pending.take() {
            debug!("SeqCtrl command: {}", cmd);
            self.in_flight = Some(InFlight {
                cmd: cmd.clone(),
                sent_at_s: input_data.time_s,
            });
            output.cmd = Some(cmd);
        }

        Ok((output, self.report.clone()))
    }
}

impl SeqCtrl {
    /// Create a new sequencer from its parameters.
    pub fn from_params(params: Params) -> Result<Self, SeqCtrlError> {
        params.validate()?;

        Ok(Self {
            params,
            ..Default::default()
        })
    }

    /// Start a position move to the given steps.
    ///
    /// `relative_speed` scales the full speed profiles and must be in (0, 100].
    pub fn request_position_move(
        &mut self,
        steps: &ActuatorSteps,
        relative_speed: f64,
    ) -> Result<(), SeqCtrlError> {
        self.check_idle()?;

        if !(relative_speed > 0.0 && relative_speed <= 100.0) {
            return Err(SeqCtrlError::InvalidSpeed(relative_speed));
        }

        let mut target_steps = [0i64; NUM_LIN_ACTS];
        target_steps.copy_from_slice(&steps.0[..NUM_LIN_ACTS]);

        let profile = self.position_lin_profile(relative_speed);
        let opening = self.position_opening(steps.get(ActId::Turret), relative_speed);
        self.start(
            SequenceState::PositionMove {
                next: 0,
                target_steps,
                profile,
            },
            opening,
        );

        Ok(())
    }

    /// Start a lowering move, bringing the turret to zero and the struts to the lowering position.
    pub fn request_lowering_move(&mut self) -> Result<(), SeqCtrlError> {
        self.check_idle()?;

        let opening = self.lowering_opening();
        self.start(SequenceState::LoweringMove { next: 0 }, opening);

        Ok(())
    }

    /// Arm the weight correction with the payload mass.
    ///
    /// The correction itself runs when the controller next reports its initialisation complete. A
    /// mass of zero disarms it.
    pub fn request_weight_correction(&mut self, payload_mass_kg: f64) -> Result<(), SeqCtrlError> {
        if !(payload_mass_kg >= 0.0 && payload_mass_kg <= self.params.max_payload_mass_kg) {
            return Err(SeqCtrlError::InvalidMass {
                mass: payload_mass_kg,
                max: self.params.max_payload_mass_kg,
            });
        }

        info!("Weight correction armed for {:.3} kg", payload_mass_kg);
        self.armed_mass_kg = payload_mass_kg;

        Ok(())
    }

    /// True if no sequence is running and every emitted command has been acknowledged.
    pub fn is_idle(&self) -> bool {
        self.state == SequenceState::Idle && self.in_flight.is_none() && self.pending.is_none()
    }

    /// Current state of the sequencer.
    pub fn state(&self) -> &SequenceState {
        &self.state
    }

    /// Payload mass the next weight correction will apply.
    pub fn armed_mass_kg(&self) -> f64 {
        self.armed_mass_kg
    }

    fn check_idle(&self) -> Result<(), SeqCtrlError> {
        match self.state.kind() {
            Some(kind) => Err(SeqCtrlError::Busy(kind)),
            None => Ok(()),
        }
    }

    fn start(&mut self, state: SequenceState, opening: MechCmd) {
        if let Some(kind) = state.kind() {
            info!("Starting {}", kind);
        }
        self.state = state;
        self.pending = Some(opening);
    }

    fn handle_response(&mut self, response: &MechResponse) {
        // Lines arriving with nothing in flight answer commands from other sources
        if self.in_flight.is_none() {
            if response.is_init_complete() && self.is_idle() && self.armed_mass_kg > 0.0 {
                let value = self.load_comp_value(self.armed_mass_kg);
                let opening = self.weight_correction_opening(value);
                self.start(SequenceState::WeightCorrection { next: 1, value }, opening);
                self.report.started = Some(SequenceKind::WeightCorrection);
            } else {
                trace!("Ignoring controller line: {}", response.text());
            }
            return;
        }

        match response {
            MechResponse::Ack(line) => {
                trace!("Acknowledged: {}", line);
                self.in_flight = None;

                match self.next_stage() {
                    Some(cmd) => self.pending = Some(cmd),
                    None => {
                        if let Some(kind) = self.state.kind() {
                            info!("{} complete", kind);
                            self.report.completed = Some(kind);
                        }
                        self.state = SequenceState::Idle;
                    }
                }
            }
            MechResponse::Reject(line) => {
                warn!("Controller rejected the sequence command: {}", line);
                self.abort(AbortCause::Rejected(line.clone()));
            }
            MechResponse::Info(line) => trace!("Controller: {}", line),
        }
    }

    /// Stop the running sequence and drop any command in flight.
    ///
    /// Returns the aborted sequence and its cause, `None` if nothing was running.
    pub fn abort(&mut self, cause: AbortCause) -> Option<(SequenceKind, AbortCause)> {
        let aborted = self.state.kind().map(|kind| {
            warn!("Aborting {}: {}", kind, cause);
            (kind, cause)
        });
        if aborted.is_some() {
            self.report.aborted = aborted.clone();
        }

        self.state = SequenceState::Idle;
        self.in_flight = None;
        self.pending = None;

        aborted
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::seq_ctrl::params::test::flight_params;

    fn seq_ctrl() -> SeqCtrl {
        SeqCtrl::from_params(flight_params()).unwrap()
    }

    fn ack() -> Vec<MechResponse> {
        vec![MechResponse::parse("OK CT1")]
    }

    /// Run one cycle and return the emitted line, if any, with the report.
    fn cycle(seq: &mut SeqCtrl, responses: Vec<MechResponse>, time_s: f64) -> (Option<String>, StatusReport) {
        let (output, report) = seq.proc(&InputData { responses, time_s }).unwrap();
        (output.cmd.map(|c| c.to_string()), report)
    }

    #[test]
    fn test_position_move_sequence() {
        let mut seq = seq_ctrl();

        seq.request_position_move(&ActuatorSteps([-8000, 1200, 0, -73211]), 10.0)
            .unwrap();
        assert!(!seq.is_idle());

        let (cmd, _) = cycle(&mut seq, vec![], 0.0);
        assert_eq!(cmd.as_deref(), Some("CT1 M119 P-73211 VM10000 AM20"));

        // Nothing moves until the acknowledgement arrives
        let (cmd, _) = cycle(&mut seq, vec![MechResponse::parse("@M119 S0")], 0.1);
        assert_eq!(cmd, None);

        let (cmd, _) = cycle(&mut seq, ack(), 0.2);
        assert_eq!(cmd.as_deref(), Some("CT1 M120 P-8000 VM60000 AM50"));
        let (cmd, _) = cycle(&mut seq, ack(), 0.3);
        assert_eq!(cmd.as_deref(), Some("CT1 M121 P1200 VM60000 AM50"));
        let (cmd, _) = cycle(&mut seq, ack(), 0.4);
        assert_eq!(cmd.as_deref(), Some("CT1 M122 P0 VM60000 AM50 S"));

        // Still busy until the last command is acknowledged
        assert!(!seq.is_idle());

        let (cmd, report) = cycle(&mut seq, ack(), 0.5);
        assert_eq!(cmd, None);
        assert_eq!(report.completed, Some(SequenceKind::PositionMove));
        assert!(seq.is_idle());
    }

    #[test]
    fn test_lowering_sequence() {
        let mut seq = seq_ctrl();

        seq.request_lowering_move().unwrap();

        let expected = [
            "CT1 M119 P0 VM10000 AM20",
            "CT1 M120 P318000 VM60000 AM50",
            "CT1 M121 P318000 VM60000 AM50",
            "CT1 M122 P318000 VM60000 AM50",
        ];

        let (cmd, _) = cycle(&mut seq, vec![], 0.0);
        assert_eq!(cmd.as_deref(), Some(expected[0]));

        for (i, line) in expected.iter().enumerate().skip(1) {
            let (cmd, _) = cycle(&mut seq, ack(), i as f64);
            assert_eq!(cmd.as_deref(), Some(*line));
        }

        let (_, report) = cycle(&mut seq, ack(), 4.0);
        assert_eq!(report.completed, Some(SequenceKind::LoweringMove));
        assert!(seq.is_idle());
    }

    #[test]
    fn test_exclusivity() {
        let mut seq = seq_ctrl();
        let steps = ActuatorSteps([100, 200, 300, 400]);

        seq.request_lowering_move().unwrap();
        assert!(matches!(
            seq.request_position_move(&steps, 50.0),
            Err(SeqCtrlError::Busy(SequenceKind::LoweringMove))
        ));
        assert!(matches!(
            seq.request_lowering_move(),
            Err(SeqCtrlError::Busy(SequenceKind::LoweringMove))
        ));

        cycle(&mut seq, vec![], 0.0);
        for i in 0..4 {
            assert!(seq.request_position_move(&steps, 50.0).is_err());
            cycle(&mut seq, ack(), 0.1 * (i + 1) as f64);
        }

        assert!(seq.is_idle());
        assert!(seq.request_position_move(&steps, 50.0).is_ok());
        assert_eq!(seq.state().kind(), Some(SequenceKind::PositionMove));
    }

    #[test]
    fn test_responses_without_command_in_flight() {
        let mut seq = seq_ctrl();

        // An acknowledgement of some other command does nothing when idle
        let (cmd, report) = cycle(&mut seq, ack(), 0.0);
        assert_eq!(cmd, None);
        assert_eq!(report, StatusReport::default());

        // Requested but not yet written, so the acknowledgement is not ours
        seq.request_position_move(&ActuatorSteps([1, 2, 3, 4]), 50.0)
            .unwrap();
        let (cmd, _) = cycle(&mut seq, ack(), 0.1);
        assert_eq!(cmd.as_deref(), Some("CT1 M119 P4 VM50000 AM100"));

        // Two acknowledgements in one cycle only advance one stage
        let (cmd, _) = cycle(&mut seq, vec![ack()[0].clone(), ack()[0].clone()], 0.2);
        assert_eq!(cmd.as_deref(), Some("CT1 M120 P1 VM300000 AM250"));
        let (cmd, _) = cycle(&mut seq, ack(), 0.3);
        assert_eq!(cmd.as_deref(), Some("CT1 M121 P2 VM300000 AM250"));
    }

    #[test]
    fn test_rejection_aborts() {
        let mut seq = seq_ctrl();

        seq.request_position_move(&ActuatorSteps([1, 2, 3, 4]), 50.0)
            .unwrap();
        cycle(&mut seq, vec![], 0.0);
        cycle(&mut seq, ack(), 0.1);

        let (cmd, report) = cycle(&mut seq, vec![MechResponse::parse("CERR CT1 2: fault")], 0.2);
        assert_eq!(cmd, None);
        assert_eq!(
            report.aborted,
            Some((
                SequenceKind::PositionMove,
                AbortCause::Rejected(String::from("CERR CT1 2: fault"))
            ))
        );
        assert!(seq.is_idle());

        // Later acknowledgements belong to nothing
        let (cmd, _) = cycle(&mut seq, ack(), 0.3);
        assert_eq!(cmd, None);
    }

    #[test]
    fn test_ack_timeout_aborts() {
        let mut seq = seq_ctrl();

        seq.request_lowering_move().unwrap();
        cycle(&mut seq, vec![], 10.0);

        let (_, report) = cycle(&mut seq, vec![], 14.9);
        assert_eq!(report.aborted, None);
        assert!(!seq.is_idle());

        let (cmd, report) = cycle(&mut seq, vec![], 15.1);
        assert_eq!(cmd, None);
        assert_eq!(
            report.aborted,
            Some((SequenceKind::LoweringMove, AbortCause::AckTimeout))
        );
        assert!(seq.is_idle());
    }

    #[test]
    fn test_weight_correction() {
        let mut seq = seq_ctrl();

        // Nothing happens on initialisation until a mass is armed
        let (cmd, _) = cycle(&mut seq, vec![MechResponse::parse("OK CT0")], 0.0);
        assert_eq!(cmd, None);

        seq.request_weight_correction(50.0).unwrap();
        let (cmd, _) = cycle(&mut seq, vec![], 0.1);
        assert_eq!(cmd, None);
        assert!(seq.is_idle());

        let (cmd, report) = cycle(&mut seq, vec![MechResponse::parse("OK CT0")], 0.2);
        assert_eq!(cmd.as_deref(), Some("PR5 M120 O60FB S008 T32s FFF551A0"));
        assert_eq!(report.started, Some(SequenceKind::WeightCorrection));

        let (cmd, _) = cycle(&mut seq, ack(), 0.3);
        assert_eq!(cmd.as_deref(), Some("PR5 M121 O60FB S008 T32s FFF551A0"));
        let (cmd, _) = cycle(&mut seq, ack(), 0.4);
        assert_eq!(cmd.as_deref(), Some("PR5 M122 O60FB S008 T32s FFF551A0"));
        let (cmd, report) = cycle(&mut seq, ack(), 0.5);
        assert_eq!(cmd, None);
        assert_eq!(report.completed, Some(SequenceKind::WeightCorrection));

        // Stays armed for the next initialisation
        assert_eq!(seq.armed_mass_kg(), 50.0);
        seq.request_weight_correction(12.3456).unwrap();
        let (cmd, _) = cycle(&mut seq, vec![MechResponse::parse("OK CT0 M5")], 0.6);
        assert_eq!(cmd.as_deref(), Some("PR5 M120 O60FB S008 T32s FFF677CD"));
    }

    #[test]
    fn test_invalid_requests() {
        let mut seq = seq_ctrl();
        let steps = ActuatorSteps::default();

        for speed in [0.0, -5.0, 100.5, std::f64::NAN].iter() {
            assert!(matches!(
                seq.request_position_move(&steps, *speed),
                Err(SeqCtrlError::InvalidSpeed(_))
            ));
        }
        assert!(seq.request_position_move(&steps, 100.0).is_ok());

        let mut seq = seq_ctrl();
        for mass in [-1.0, 300.5, std::f64::INFINITY].iter() {
            assert!(matches!(
                seq.request_weight_correction(*mass),
                Err(SeqCtrlError::InvalidMass { .. })
            ));
        }
        assert_eq!(seq.armed_mass_kg(), 0.0);
        assert!(seq.is_idle());
    }
}
