//! # Tripod library.
//!
//! This library allows other crates in the workspace, and the benchmarks, to access items defined
//! inside the tripod crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Global data store of the executable
pub mod data_store;

/// Hardware channel - writes commands to and reads responses from the motor controller
pub mod hw_channel;

/// Kinematics control module - converts between platform orientations and actuator positions
pub mod kin_ctrl;

/// Executable parameters
pub mod params;

/// Platform state - the live view of the mount built from the position feed
pub mod platform_state;

/// Maneuver request processor
pub mod request_processor;

/// Sequence control module - runs multi-stage actuator sequences
pub mod seq_ctrl;

/// Telemetry publisher - hands position broadcasts to any number of subscribers
pub mod tlm_pub;

/// Telemetry reader - follows the motor controller's position feed on a background thread
pub mod tlm_reader;
