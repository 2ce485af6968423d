//! # Sequence control module
//!
//! Turns a maneuver into the ordered series of single actuator commands understood by the motor
//! controller. The controller accepts one command at a time, so a sequence only moves on to its
//! next stage once the previous command has been acknowledged.
//!
//! | Sequence         | Opening command        | Following stages                          |
//! |------------------|------------------------|-------------------------------------------|
//! | Position move    | turret move            | front, rear-right, rear-left (synced)     |
//! | Lowering move    | turret to zero, slow   | front, rear-right, rear-left to lowering  |
//! | Weight correction| front load compensation| rear-right, rear-left load compensation   |
//!
//! Only one sequence can run at once, requests made while a sequence is running are rejected with
//! [`SeqCtrlError::Busy`].

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub(crate) mod params;
mod stages;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use state::*;

use comms_if::eqpt::mech::MoveProfile;
use serde::Serialize;
use std::fmt;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during SeqCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum SeqCtrlError {
    #[error("Could not load SeqCtrl parameters: {0}")]
    ParamLoad(#[from] util::params::LoadError),

    #[error("Invalid SeqCtrl parameters: {0}")]
    InvalidParams(String),

    #[error("A {0} sequence is already in progress")]
    Busy(SequenceKind),

    #[error("Relative speed must be in (0, 100], found {0}")]
    InvalidSpeed(f64),

    #[error("Payload mass must be between 0 and {max} kg, found {mass}")]
    InvalidMass { mass: f64, max: f64 },
}

/// Current step of the sequencer.
///
/// Each active variant holds what is needed to build the commands of its remaining stages. `next`
/// is the index, in the linear actuator order, of the next linear actuator to command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SequenceState {
    Idle,

    PositionMove {
        next: usize,
        target_steps: [i64; 3],
        profile: MoveProfile,
    },

    LoweringMove {
        next: usize,
    },

    WeightCorrection {
        next: usize,
        value: u32,
    },
}

/// The sequences the sequencer can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SequenceKind {
    PositionMove,
    LoweringMove,
    WeightCorrection,
}

/// Reason a sequence stopped before its last stage was acknowledged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AbortCause {
    /// The controller rejected a command, with the rejection line
    Rejected(String),

    /// No acknowledgement arrived within the timeout
    AckTimeout,

    /// The command could not be written to the controller
    SendFailed(String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SequenceState {
    fn default() -> Self {
        SequenceState::Idle
    }
}

impl SequenceState {
    /// The sequence this state belongs to, or `None` when idle.
    pub fn kind(&self) -> Option<SequenceKind> {
        match self {
            SequenceState::Idle => None,
            SequenceState::PositionMove { .. } => Some(SequenceKind::PositionMove),
            SequenceState::LoweringMove { .. } => Some(SequenceKind::LoweringMove),
            SequenceState::WeightCorrection { .. } => Some(SequenceKind::WeightCorrection),
        }
    }
}

impl fmt::Display for SequenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceKind::PositionMove => write!(f, "position move"),
            SequenceKind::LoweringMove => write!(f, "lowering move"),
            SequenceKind::WeightCorrection => write!(f, "weight correction"),
        }
    }
}

impl fmt::Display for AbortCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortCause::Rejected(line) => write!(f, "command rejected ({})", line),
            AbortCause::AckTimeout => write!(f, "acknowledgement timed out"),
            AbortCause::SendFailed(e) => write!(f, "command not sent ({})", e),
        }
    }
}
