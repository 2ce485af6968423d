//! Platform pose types

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::NUM_LIN_ACTS;
use comms_if::eqpt::mech::ActId;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Physical positions of all actuators.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActuatorPositions {
    /// Extension of the front, rear-right and rear-left struts relative to the neutral height.
    ///
    /// Units: meters
    pub lin_pos_m: [f64; NUM_LIN_ACTS],

    /// Turret angle.
    ///
    /// Units: radians
    pub turret_pos_rad: f64,
}

/// Positions of all actuators in motor steps, using the controller's sign convention.
///
/// Indexed in the fixed actuator order (front, rear-right, rear-left, turret).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorSteps(pub [i64; 4]);

/// Inclination of each strut from the vertical, towards the centre of the base.
///
/// Units: radians
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrutAngles(pub [f64; NUM_LIN_ACTS]);

/// A roll, pitch, yaw triple in a given convention.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EulerAngles {
    /// Units: radians
    pub roll_rad: f64,

    /// Units: radians
    pub pitch_rad: f64,

    /// Units: radians
    pub yaw_rad: f64,
}

/// The orientation of the platform in both angle conventions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationAngles {
    /// Yaw applied first, then pitch, then roll (Z1Y2X3)
    pub internal: EulerAngles,

    /// Roll applied first, then pitch, then yaw (X1Y2Z3)
    pub avionics: EulerAngles,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ActuatorPositions {
    pub fn new(lin_pos_m: [f64; NUM_LIN_ACTS], turret_pos_rad: f64) -> Self {
        Self {
            lin_pos_m,
            turret_pos_rad,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.lin_pos_m.iter().all(|p| p.is_finite()) && self.turret_pos_rad.is_finite()
    }
}

impl ActuatorSteps {
    /// Get the step count of the given actuator.
    pub fn get(&self, act: ActId) -> i64 {
        self.0[act.index()]
    }
}

impl EulerAngles {
    pub fn from_rad(roll_rad: f64, pitch_rad: f64, yaw_rad: f64) -> Self {
        Self {
            roll_rad,
            pitch_rad,
            yaw_rad,
        }
    }

    pub fn from_deg(roll_deg: f64, pitch_deg: f64, yaw_deg: f64) -> Self {
        Self::from_rad(
            roll_deg.to_radians(),
            pitch_deg.to_radians(),
            yaw_deg.to_radians(),
        )
    }

    pub fn roll_deg(&self) -> f64 {
        self.roll_rad.to_degrees()
    }

    pub fn pitch_deg(&self) -> f64 {
        self.pitch_rad.to_degrees()
    }

    pub fn yaw_deg(&self) -> f64 {
        self.yaw_rad.to_degrees()
    }

    /// The angles as `[roll, pitch, yaw]` in radians.
    pub fn as_array(&self) -> [f64; 3] {
        [self.roll_rad, self.pitch_rad, self.yaw_rad]
    }

    pub fn is_finite(&self) -> bool {
        self.as_array().iter().all(|a| a.is_finite())
    }
}

impl OrientationAngles {
    /// Build the orientation from angles in the internal convention.
    pub fn from_internal(internal: EulerAngles) -> Self {
        Self {
            internal,
            avionics: super::internal_to_avionics(&internal),
        }
    }
}
