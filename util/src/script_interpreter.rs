//! # Maneuver script interpreter module
//!
//! This module provides an interpreter for maneuver scripts, allowing the platform to be driven
//! without an external command dispatcher.
//!
//! A script is a list of timestamped JSON requests, one per statement:
//!
//! ```text
//! 1.0: {"type": "WEIGHT", "payload": {"payload_mass_kg": 10.0}};
//! 2.5: {"type": "POS", "payload": {"roll_deg": 2, "pitch_deg": 0, "yaw_deg": 10, "relative_speed": 50}};
//! 30:  {"type": "LOWER"};
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use conquer_once::Lazy;
use regex::{Regex, RegexBuilder};
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use thiserror::Error;

// Internal
use crate::session::get_elapsed_seconds;
use comms_if::tc::{ManeuverRequest, RequestParseError};

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

static STATEMENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
        .multi_line(true)
        .build()
        .expect("Script statement regex is invalid")
});

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A request which is scripted to occur at a specific time.
struct Command {
    /// The time the request is supposed to execute at
    exec_time_s: f64,

    request: ManeuverRequest,
}

/// A script interpreter.
///
/// After initialising with the path to the script to run use `.get_pending_reqs` to acquire the
/// requests that need executing.
pub struct ScriptInterpreter {
    cmds: VecDeque<Command>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0}")]
    ScriptNotFound(String),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error("Script contains an invalid timestamp: {0}. Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Script contains an invalid request at {0} s: {1}")]
    InvalidRequest(f64, RequestParseError),
}

/// Requests that are due for execution.
#[derive(Debug, PartialEq)]
pub enum PendingReqs {
    None,
    Some(Vec<ManeuverRequest>),
    EndOfScript,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {
    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {
        let path = script_path.as_ref();

        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(
                path.to_string_lossy().to_string(),
            ));
        }

        let script = fs::read_to_string(path).map_err(ScriptError::ScriptLoadError)?;

        Self::from_script(&script)
    }

    /// Create a new interpreter from the contents of a script.
    pub fn from_script(script: &str) -> Result<Self, ScriptError> {
        let mut cmds: VecDeque<Command> = VecDeque::new();

        for cap in STATEMENT_REGEX.captures_iter(script) {
            let time_str = cap.get(1).map(|m| m.as_str()).unwrap_or("");
            let exec_time_s: f64 = time_str
                .parse()
                .map_err(|e| ScriptError::InvalidTimestamp(format!("{} ({})", time_str, e)))?;

            let request = ManeuverRequest::from_json(cap.get(3).map(|m| m.as_str()).unwrap_or(""))
                .map_err(|e| ScriptError::InvalidRequest(exec_time_s, e))?;

            cmds.push_back(Command {
                exec_time_s,
                request,
            });
        }

        if cmds.is_empty() {
            return Err(ScriptError::ScriptEmpty);
        }

        Ok(ScriptInterpreter { cmds })
    }

    /// Return the requests due at the current session time.
    pub fn get_pending_reqs(&mut self) -> PendingReqs {
        self.get_pending_reqs_at(get_elapsed_seconds())
    }

    /// Return the requests due at the given time.
    ///
    /// Once all requests have been returned the end of script is signalled.
    pub fn get_pending_reqs_at(&mut self, current_time_s: f64) -> PendingReqs {
        if self.cmds.is_empty() {
            return PendingReqs::EndOfScript;
        }

        let mut reqs = vec![];

        while let Some(c) = self.cmds.front() {
            if c.exec_time_s >= current_time_s {
                break;
            }
            if let Some(c) = self.cmds.pop_front() {
                reqs.push(c.request);
            }
        }

        if reqs.is_empty() {
            PendingReqs::None
        } else {
            PendingReqs::Some(reqs)
        }
    }

    /// Get the number of requests remaining in the script
    pub fn get_num_reqs(&self) -> usize {
        self.cmds.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.cmds.back() {
            Some(c) => c.exec_time_s,
            None => 0f64,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SCRIPT: &str = r#"
        0.5: {"type": "WEIGHT", "payload": {"payload_mass_kg": 10.0}};
        1.0: {"type": "POS", "payload": {"roll_deg": 2, "pitch_deg": 0, "yaw_deg": 10, "relative_speed": 50}};
        1.0: {"type": "LOWER"};
    "#;

    #[test]
    fn test_pending_reqs() {
        let mut si = ScriptInterpreter::from_script(SCRIPT).unwrap();

        assert_eq!(si.get_num_reqs(), 3);
        assert_eq!(si.get_duration(), 1.0);

        assert_eq!(si.get_pending_reqs_at(0.1), PendingReqs::None);
        assert_eq!(
            si.get_pending_reqs_at(0.6),
            PendingReqs::Some(vec![ManeuverRequest::WeightCorrection {
                payload_mass_kg: 10.0
            }])
        );

        match si.get_pending_reqs_at(1.5) {
            PendingReqs::Some(v) => {
                assert_eq!(v.len(), 2);
                assert_eq!(v[1], ManeuverRequest::LoweringMove);
            }
            p => panic!("Expected two requests, got {:?}", p),
        }

        assert_eq!(si.get_pending_reqs_at(2.0), PendingReqs::EndOfScript);
    }

    #[test]
    fn test_invalid_scripts() {
        assert!(matches!(
            ScriptInterpreter::from_script("no statements here"),
            Err(ScriptError::ScriptEmpty)
        ));
        assert!(matches!(
            ScriptInterpreter::from_script(r#"2.0: {"type": "JUMP"};"#),
            Err(ScriptError::InvalidRequest(t, _)) if t == 2.0
        ));
        assert!(matches!(
            ScriptInterpreter::new("/does/not/exist.tps"),
            Err(ScriptError::ScriptNotFound(_))
        ));
    }
}
