//! Parameters structure for SeqCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::SeqCtrlError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Sequence control, as loaded from `seq_ctrl.toml`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Params {
    // ---- PROFILES ----
    /// Velocity of a linear actuator moving at full relative speed.
    ///
    /// Units: controller velocity units
    pub lin_max_velocity: u32,

    /// Acceleration of a linear actuator moving at full relative speed.
    ///
    /// Units: controller acceleration units
    pub lin_max_accel: u32,

    /// Velocity of the turret moving at full relative speed.
    ///
    /// Units: controller velocity units
    pub rot_max_velocity: u32,

    /// Acceleration of the turret moving at full relative speed.
    ///
    /// Units: controller acceleration units
    pub rot_max_accel: u32,

    // ---- LOWERING ----
    /// Divisor applied to the full speed profiles during a lowering move.
    pub lowering_divisor: u32,

    /// Step target of the linear actuators at the end of a lowering move.
    pub lowering_target_steps: i64,

    // ---- LOAD COMPENSATION ----
    /// Load compensation with no payload.
    pub load_comp_offset: i64,

    /// Load compensation added per kilogram of payload, subtracted from the offset.
    ///
    /// Units: 1/kilograms
    pub load_comp_per_kg: f64,

    /// Heaviest payload the load compensation accepts.
    ///
    /// Units: kilograms
    pub max_payload_mass_kg: f64,

    // ---- TIMING ----
    /// Time allowed for the controller to acknowledge a command before its sequence is aborted.
    ///
    /// Units: seconds
    pub ack_timeout_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    pub fn validate(&self) -> Result<(), SeqCtrlError> {
        if self.lin_max_velocity == 0
            || self.lin_max_accel == 0
            || self.rot_max_velocity == 0
            || self.rot_max_accel == 0
        {
            return Err(SeqCtrlError::InvalidParams(String::from(
                "Profile limits must be non-zero",
            )));
        }

        if self.lowering_divisor == 0 {
            return Err(SeqCtrlError::InvalidParams(String::from(
                "lowering_divisor must be non-zero",
            )));
        }

        if !(self.max_payload_mass_kg.is_finite() && self.max_payload_mass_kg > 0.0)
            || !self.load_comp_per_kg.is_finite()
        {
            return Err(SeqCtrlError::InvalidParams(String::from(
                "Load compensation parameters must be finite with a positive maximum mass",
            )));
        }

        if !(self.ack_timeout_s.is_finite() && self.ack_timeout_s > 0.0) {
            return Err(SeqCtrlError::InvalidParams(format!(
                "ack_timeout_s must be positive, found {}",
                self.ack_timeout_s
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    pub(crate) fn flight_params() -> Params {
        Params {
            lin_max_velocity: 600000,
            lin_max_accel: 500,
            rot_max_velocity: 100000,
            rot_max_accel: 200,
            lowering_divisor: 10,
            lowering_target_steps: 318000,
            load_comp_offset: -600000,
            load_comp_per_kg: 2000.0,
            max_payload_mass_kg: 300.0,
            ack_timeout_s: 5.0,
        }
    }

    #[test]
    fn test_file_params() {
        let p: Params = util::params::parse(include_str!("../../../params/seq_ctrl.toml")).unwrap();
        assert!(p.validate().is_ok());
        assert_eq!(p.lowering_target_steps, 318000);
    }

    #[test]
    fn test_invalid_params() {
        assert!(Params::default().validate().is_err());

        let mut p = flight_params();
        p.ack_timeout_s = 0.0;
        assert!(p.validate().is_err());

        let mut p = flight_params();
        p.lowering_divisor = 0;
        assert!(p.validate().is_err());
    }
}
