//! # Mechanisms Telemetry Records
//!
//! The motor controller streams one status record per line on its position feed:
//!
//! ```text
//! @M119 S0 @M120 S0 @M121 S0 @M122 S0 AS4 T9.89 C0
//! ```
//!
//! Each `@M<id> S<steps>` pair gives an actuator's encoder position, followed by the platform status
//! code, the time covered by the record in milliseconds and a progress counter.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use conquer_once::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::mech::{ActId, ACT_IDS};
use crate::tm::PlatformStatus;

// ------------------------------------------------------------------------------------------------
// STATICS
// ------------------------------------------------------------------------------------------------

static RECORD_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"((?:@M\S* S\S* ){4,5})AS(\S*) T(\S*) C(\S*)")
        .expect("Telemetry record regex is invalid")
});

static MOTOR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@M(\S*) S(\S*)").expect("Motor position regex is invalid"));

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single record from the position feed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct MechTlmRecord {
    /// Encoder position of each actuator, in the fixed actuator order.
    ///
    /// Units: motor steps, controller sign convention
    pub steps: [i64; 4],

    pub status: PlatformStatus,

    /// Units: milliseconds
    pub elapsed_ms: f64,

    pub progress: u32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Reasons a feed line is not a valid record.
#[derive(Debug, Error, PartialEq)]
pub enum TlmParseError {
    #[error("Line does not match the telemetry record format")]
    NoMatch,

    #[error("Invalid position field for motor {0}: {1:?}")]
    InvalidSteps(String, String),

    #[error("The record does not contain actuator {0:?}")]
    MissingAct(ActId),

    #[error("Invalid status field: {0:?}")]
    InvalidStatus(String),

    #[error("Invalid elapsed time field: {0:?}")]
    InvalidElapsed(String),

    #[error("Invalid progress field: {0:?}")]
    InvalidProgress(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MechTlmRecord {
    /// Parse a record from a line of the position feed.
    ///
    /// Unknown motor addresses are ignored, but all four platform actuators must be present.
    pub fn parse(line: &str) -> Result<Self, TlmParseError> {
        let caps = RECORD_REGEX
            .captures(line)
            .ok_or(TlmParseError::NoMatch)?;

        let field = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or("");

        // Motor positions
        let mut steps: [Option<i64>; 4] = [None; 4];
        for motor in MOTOR_REGEX.captures_iter(field(1)) {
            let id_str = motor.get(1).map(|m| m.as_str()).unwrap_or("");
            let steps_str = motor.get(2).map(|m| m.as_str()).unwrap_or("");

            let act = match id_str.parse::<u32>().ok().and_then(ActId::from_motor_id) {
                Some(a) => a,
                None => continue,
            };

            let s = steps_str.parse::<i64>().map_err(|_| {
                TlmParseError::InvalidSteps(id_str.to_string(), steps_str.to_string())
            })?;

            steps[act.index()] = Some(s);
        }

        let mut record_steps = [0i64; 4];
        for act in ACT_IDS.iter() {
            record_steps[act.index()] = steps[act.index()].ok_or(TlmParseError::MissingAct(*act))?;
        }

        // Trailer
        let status = field(2)
            .parse::<u8>()
            .ok()
            .and_then(PlatformStatus::from_code)
            .ok_or_else(|| TlmParseError::InvalidStatus(field(2).to_string()))?;

        let elapsed_ms = field(3)
            .parse::<f64>()
            .ok()
            .filter(|t| t.is_finite())
            .ok_or_else(|| TlmParseError::InvalidElapsed(field(3).to_string()))?;

        let progress = field(4)
            .parse::<u32>()
            .map_err(|_| TlmParseError::InvalidProgress(field(4).to_string()))?;

        Ok(Self {
            steps: record_steps,
            status,
            elapsed_ms,
            progress,
        })
    }
}
