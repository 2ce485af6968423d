//! # Equipment Interface
//!
//! This module defines the lines exchanged with the motor controller.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Commands and responses of the controller's command channel
pub mod mech;

/// Records of the controller's position feed
pub mod mech_tlm;
