//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the software.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Maneuver requests and their responses
pub mod tc;

/// Platform status and position broadcast
pub mod tm;

/// Command and response definitions for equipment (like mechanisms)
pub mod eqpt;
