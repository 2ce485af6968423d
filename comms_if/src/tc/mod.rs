//! # Telecommand module
//!
//! Maneuver requests accepted by the platform and the immediate responses given to them.
//!
//! Requests are exchanged as JSON, for instance:
//!
//! ```json
//! {"type": "POS", "payload": {"roll_deg": 1.0, "pitch_deg": -2.0, "yaw_deg": 15.0, "relative_speed": 50}}
//! {"type": "LOWER"}
//! {"type": "WEIGHT", "payload": {"payload_mass_kg": 12.5}}
//! ```

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use serde_json::{self, Value};
use std::fmt;
use thiserror::Error;

use crate::eqpt::mech::{ActId, LimitDirection};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A high level maneuver request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum ManeuverRequest {
    /// Move the platform to an absolute orientation.
    ///
    /// Angles are in the avionics (roll, pitch, yaw) convention.
    PositionMove {
        /// Units: degrees
        roll_deg: f64,

        /// Units: degrees
        pitch_deg: f64,

        /// Units: degrees
        yaw_deg: f64,

        /// Percentage of the maximum actuator speed, in (0, 100]
        relative_speed: f64,
    },

    /// Lower the platform onto its rest position at low speed.
    LoweringMove,

    /// Arm the load compensation for the given payload, applied when the controller next reports
    /// its initialisation complete.
    WeightCorrection {
        /// Units: kilograms
        payload_mass_kg: f64,
    },
}

/// Immediate response to a maneuver request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum RequestResponse {
    /// The request has been accepted and will be executed
    Accepted,

    /// Another sequence is in progress
    Busy,

    /// The request parameters are invalid
    Invalid(String),

    /// No platform configuration reaches the requested orientation
    NoSolution,

    /// The requested move would take an actuator beyond its range
    LimitExceeded {
        act: ActId,
        direction: LimitDirection,
    },
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum RequestParseError {
    #[error("Request contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("Request has an invalid type ({0})")]
    InvalidType(String),

    #[error("Request of type {0} is expected to have a payload but it doesn't")]
    MissingPayload(String),

    #[error("Request of type {0} has an invalid payload: {1}")]
    InvalidPayload(String, serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Deserialize)]
struct PositionMovePayload {
    roll_deg: f64,
    pitch_deg: f64,
    yaw_deg: f64,
    relative_speed: f64,
}

#[derive(Deserialize)]
struct WeightCorrectionPayload {
    payload_mass_kg: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ManeuverRequest {
    /// Parse a request from a JSON packet.
    pub fn from_json(json_str: &str) -> Result<Self, RequestParseError> {
        let val: Value = serde_json::from_str(json_str).map_err(RequestParseError::InvalidJson)?;

        let req_type = match val["type"].as_str() {
            Some(s) => s,
            None => {
                return Err(RequestParseError::InvalidType(String::from(
                    "Expected \"type\" to be a string",
                )))
            }
        };

        let payload = &val["payload"];

        match req_type {
            "POS" => {
                let p: PositionMovePayload = parse_payload(req_type, payload)?;
                Ok(ManeuverRequest::PositionMove {
                    roll_deg: p.roll_deg,
                    pitch_deg: p.pitch_deg,
                    yaw_deg: p.yaw_deg,
                    relative_speed: p.relative_speed,
                })
            }
            "LOWER" => Ok(ManeuverRequest::LoweringMove),
            "WEIGHT" => {
                let p: WeightCorrectionPayload = parse_payload(req_type, payload)?;
                Ok(ManeuverRequest::WeightCorrection {
                    payload_mass_kg: p.payload_mass_kg,
                })
            }
            t => Err(RequestParseError::InvalidType(format!(
                "{} is not a recognised request type",
                t
            ))),
        }
    }
}

impl fmt::Display for RequestResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestResponse::Accepted => write!(f, "accepted"),
            RequestResponse::Busy => write!(f, "busy, a sequence is already in progress"),
            RequestResponse::Invalid(why) => write!(f, "invalid request: {}", why),
            RequestResponse::NoSolution => write!(f, "no solution for the requested orientation"),
            RequestResponse::LimitExceeded { act, direction } => {
                write!(f, "{:?} actuator {} limit exceeded", act, direction)
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn parse_payload<T: serde::de::DeserializeOwned>(
    req_type: &str,
    payload: &Value,
) -> Result<T, RequestParseError> {
    if payload.is_null() {
        return Err(RequestParseError::MissingPayload(req_type.to_string()));
    }

    serde_json::from_value(payload.clone())
        .map_err(|e| RequestParseError::InvalidPayload(req_type.to_string(), e))
}
