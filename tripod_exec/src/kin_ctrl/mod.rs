//! # Kinematics control module
//!
//! Converts between actuator positions and platform orientation for the three strut mount.
//!
//! The platform rests on three vertical linear actuators (front, rear-right, rear-left) topped by a
//! rotary turret. No closed form inverse exists for this linkage, so both directions are solved by
//! bounded iterative search:
//!
//! - the forward solve finds the strut inclinations which close the top triangle for a set of
//!   extensions, from which the orientation is read back,
//! - the inverse solve guesses extensions for a target orientation and corrects the guess using
//!   the forward solve until the orientations agree.
//!
//! Orientations are available in the internal convention (yaw-pitch-roll application order) and
//! the avionics convention (roll-pitch-yaw application order).

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod convert;
mod forward;
mod inverse;
pub(crate) mod params;
mod pose;
mod state;
mod steps;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use convert::*;
pub use forward::ForwardSolution;
pub use params::*;
pub use pose::*;
pub use state::*;

use comms_if::eqpt::mech::{ActId, LimitDirection};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The number of linear actuators (struts) on the platform.
pub const NUM_LIN_ACTS: usize = 3;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during KinCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum KinCtrlError {
    #[error("Invalid KinCtrl parameters: {0}")]
    InvalidParams(String),

    #[error("Actuator positions are not finite: {0:?}")]
    NonFinitePositions(ActuatorPositions),

    #[error("Target orientation is not finite: {0:?}")]
    NonFiniteTarget(EulerAngles),

    #[error("No solution found after {iterations} iterations")]
    NoSolution { iterations: usize },

    #[error("{act:?} actuator target of {steps} steps exceeds its {direction} limit")]
    LimitExceeded {
        act: ActId,
        direction: LimitDirection,
        steps: i64,
    },
}
