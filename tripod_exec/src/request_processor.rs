//! # Maneuver request processor module
//!
//! The request processor handles maneuver requests coming from any source, and gives the
//! immediate response to each of them.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};

// Internal
use crate::{
    data_store::DataStore,
    kin_ctrl::{avionics_to_internal, EulerAngles, KinCtrlError},
    seq_ctrl::SeqCtrlError,
};
use comms_if::tc::{ManeuverRequest, RequestResponse};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a maneuver request.
///
/// Position moves are converted into actuator steps before being handed to the sequencer, so a
/// move that cannot be reached, or that would take an actuator past its limit, is refused before
/// any command is written.
pub fn exec(ds: &mut DataStore, req: &ManeuverRequest) -> RequestResponse {
    debug!("Recieved request: {:?}", req);

    let response = match req {
        ManeuverRequest::PositionMove {
            roll_deg,
            pitch_deg,
            yaw_deg,
            relative_speed,
        } => position_move(
            ds,
            EulerAngles::from_deg(*roll_deg, *pitch_deg, *yaw_deg),
            *relative_speed,
        ),
        ManeuverRequest::LoweringMove => ds
            .seq_ctrl
            .request_lowering_move()
            .map_or_else(from_seq_ctrl_error, |_| RequestResponse::Accepted),
        ManeuverRequest::WeightCorrection { payload_mass_kg } => ds
            .seq_ctrl
            .request_weight_correction(*payload_mass_kg)
            .map_or_else(from_seq_ctrl_error, |_| RequestResponse::Accepted),
    };

    match response {
        RequestResponse::Accepted => info!("Request accepted"),
        ref r => warn!("Request refused: {}", r),
    }

    response
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert an avionics orientation into steps and start the move.
fn position_move(ds: &mut DataStore, avionics: EulerAngles, relative_speed: f64) -> RequestResponse {
    if !ds.seq_ctrl.is_idle() {
        return RequestResponse::Busy;
    }

    if !avionics.is_finite() {
        return RequestResponse::Invalid(String::from("Angles must be finite"));
    }

    if !(relative_speed > 0.0 && relative_speed <= 100.0) {
        return from_seq_ctrl_error(SeqCtrlError::InvalidSpeed(relative_speed));
    }

    let internal = avionics_to_internal(&avionics);
    debug!(
        "Target orientation (internal): R{:.4} P{:.4} Y{:.4}",
        internal.roll_deg(),
        internal.pitch_deg(),
        internal.yaw_deg()
    );

    let steps = match ds
        .kin_ctrl
        .inverse_solve(&internal)
        .and_then(|p| ds.kin_ctrl.steps_from_positions(&p))
    {
        Ok(s) => s,
        Err(e) => return from_kin_ctrl_error(e),
    };

    debug!("Target steps: {:?}", steps.0);

    match ds.seq_ctrl.request_position_move(&steps, relative_speed) {
        Ok(()) => RequestResponse::Accepted,
        Err(e) => from_seq_ctrl_error(e),
    }
}

fn from_kin_ctrl_error(e: KinCtrlError) -> RequestResponse {
    match e {
        KinCtrlError::NoSolution { .. } => RequestResponse::NoSolution,
        KinCtrlError::LimitExceeded { act, direction, .. } => {
            RequestResponse::LimitExceeded { act, direction }
        }
        e => RequestResponse::Invalid(e.to_string()),
    }
}

fn from_seq_ctrl_error(e: SeqCtrlError) -> RequestResponse {
    match e {
        SeqCtrlError::Busy(_) => RequestResponse::Busy,
        e => RequestResponse::Invalid(e.to_string()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::data_store::test::test_data_store;
    use comms_if::eqpt::mech::{ActId, LimitDirection, MechCmd};
    use util::module::State;

    fn pos(roll_deg: f64, pitch_deg: f64, yaw_deg: f64, relative_speed: f64) -> ManeuverRequest {
        ManeuverRequest::PositionMove {
            roll_deg,
            pitch_deg,
            yaw_deg,
            relative_speed,
        }
    }

    /// Run the sequencer for a cycle and get the command it emits.
    fn emitted(ds: &mut DataStore) -> Option<MechCmd> {
        let (output, _) = ds.seq_ctrl.proc(&ds.seq_ctrl_input).unwrap();
        output.cmd
    }

    #[test]
    fn test_neutral_position_move() {
        let mut ds = test_data_store();

        assert_eq!(
            exec(&mut ds, &pos(0.0, 0.0, 0.0, 10.0)),
            RequestResponse::Accepted
        );
        assert_eq!(
            emitted(&mut ds).map(|c| c.to_string()).as_deref(),
            Some("CT1 M119 P0 VM10000 AM20")
        );
        assert_eq!(exec(&mut ds, &pos(1.0, 0.0, 0.0, 10.0)), RequestResponse::Busy);
    }

    #[test]
    fn test_position_move_targets() {
        let mut ds = test_data_store();

        assert_eq!(
            exec(&mut ds, &pos(2.0, -3.0, 15.0, 50.0)),
            RequestResponse::Accepted
        );

        // The turret carries most of the yaw, with the sign of the controller
        match emitted(&mut ds) {
            Some(MechCmd::Move {
                act: ActId::Turret,
                target_steps,
                ..
            }) => assert!(target_steps < -30000 && target_steps > -45000, "{}", target_steps),
            c => panic!("Unexpected command {:?}", c),
        }
        assert!(ds.kin_ctrl.last_conversion_positions().is_some());
    }

    #[test]
    fn test_refused_requests() {
        let mut ds = test_data_store();

        assert_eq!(
            exec(&mut ds, &pos(0.0, 80.0, 0.0, 10.0)),
            RequestResponse::NoSolution
        );
        assert!(matches!(
            exec(&mut ds, &pos(std::f64::NAN, 0.0, 0.0, 10.0)),
            RequestResponse::Invalid(_)
        ));
        assert!(matches!(
            exec(&mut ds, &pos(0.0, 0.0, 0.0, 0.0)),
            RequestResponse::Invalid(_)
        ));
        assert!(matches!(
            exec(
                &mut ds,
                &ManeuverRequest::WeightCorrection {
                    payload_mass_kg: -2.0
                }
            ),
            RequestResponse::Invalid(_)
        ));

        // Nothing reached the sequencer
        assert!(ds.seq_ctrl.is_idle());
        assert_eq!(emitted(&mut ds), None);
    }

    #[test]
    fn test_limit_exceeded_before_any_command() {
        let mut ds = test_data_store();

        // Tighten the linear range so a reachable orientation needs too many steps
        let mut params = crate::kin_ctrl::params::test::flight_params();
        params.max_linear_step = 1000;
        ds.kin_ctrl = crate::kin_ctrl::KinCtrl::new(&params).unwrap();

        // Nose up extends the front strut, nose down retracts it
        assert!(matches!(
            exec(&mut ds, &pos(0.0, 5.0, 0.0, 10.0)),
            RequestResponse::LimitExceeded {
                act: ActId::Front,
                direction: LimitDirection::Upper,
            }
        ));
        assert!(matches!(
            exec(&mut ds, &pos(0.0, -5.0, 0.0, 10.0)),
            RequestResponse::LimitExceeded {
                act: ActId::Front,
                direction: LimitDirection::Lower,
            }
        ));
        assert!(ds.seq_ctrl.is_idle());
        assert_eq!(emitted(&mut ds), None);
    }

    #[test]
    fn test_lowering_blocks_position_move() {
        let mut ds = test_data_store();

        assert_eq!(
            exec(&mut ds, &ManeuverRequest::LoweringMove),
            RequestResponse::Accepted
        );
        assert_eq!(exec(&mut ds, &pos(0.0, 0.0, 0.0, 10.0)), RequestResponse::Busy);
        assert_eq!(
            exec(&mut ds, &ManeuverRequest::LoweringMove),
            RequestResponse::Busy
        );

        // Weight correction only arms, so it is accepted while busy
        assert_eq!(
            exec(
                &mut ds,
                &ManeuverRequest::WeightCorrection {
                    payload_mass_kg: 20.0
                }
            ),
            RequestResponse::Accepted
        );
    }
}
