//! # Tripod Executable Parameters
//!
//! This module provide parameters for the tripod executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::tlm_reader::TlmReaderTiming;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripodExecParams {
    /// Named pipe the motor controller reads its commands from
    pub cmd_pipe_path: String,

    /// Named pipe the motor controller writes its responses to
    pub resp_pipe_path: String,

    /// Live position feed of the motor controller
    pub feed_path: String,

    /// Time between checks for the position feed while it is missing.
    ///
    /// Units: seconds
    pub feed_poll_period_s: f64,

    /// Time between reads of the open position feed.
    ///
    /// Units: seconds
    pub feed_read_period_s: f64,

    /// Print every telemetry broadcast line to the log
    pub log_broadcasts: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TripodExecParams {
    pub fn tlm_reader_timing(&self) -> TlmReaderTiming {
        TlmReaderTiming {
            poll_period: Duration::from_secs_f64(self.feed_poll_period_s),
            read_period: Duration::from_secs_f64(self.feed_read_period_s),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_file_params() {
        let p: TripodExecParams =
            util::params::parse(include_str!("../../params/tripod_exec.toml")).unwrap();

        let timing = p.tlm_reader_timing();
        assert_eq!(timing.poll_period, Duration::from_millis(500));
        assert!(timing.read_period <= timing.poll_period);
    }
}
