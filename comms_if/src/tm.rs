//! # Telemetry module
//!
//! Platform status codes reported by the motor controller and the position broadcast line sent to
//! telemetry subscribers.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Operational status of the platform as reported by the controller.
///
/// There is no transition table, the controller is free to report any status at any time.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq)]
pub enum PlatformStatus {
    Error,
    Off,
    Emergency,
    Active,
    Initialized,
    CenterSearch,
    Centered,
    Analyzed,
    Simulating,
    Stopped,
    Centering,
    Released,
    Unauthenticated,
    InPosition,
    JoystickConnected,
    FreeMovement,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// One position broadcast, as streamed to telemetry clients.
///
/// Formats as `R+00.000;P+00.000;Y+000.000;RS+00.000;PS+00.000;YS+00.000;AS4;T09.9;C000`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PositionBroadcast {
    /// Units: degrees
    pub roll_deg: f64,
    /// Units: degrees
    pub pitch_deg: f64,
    /// Units: degrees
    pub yaw_deg: f64,

    /// Units: degrees/second
    pub roll_rate_degs: f64,
    /// Units: degrees/second
    pub pitch_rate_degs: f64,
    /// Units: degrees/second
    pub yaw_rate_degs: f64,

    pub status: PlatformStatus,

    /// Time covered by the telemetry record.
    ///
    /// Units: milliseconds
    pub elapsed_ms: f64,

    /// Progress counter of the current controller operation
    pub progress: u32,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PlatformStatus {
    /// All statuses, indexed by their code.
    const ALL: [PlatformStatus; 16] = [
        PlatformStatus::Error,
        PlatformStatus::Off,
        PlatformStatus::Emergency,
        PlatformStatus::Active,
        PlatformStatus::Initialized,
        PlatformStatus::CenterSearch,
        PlatformStatus::Centered,
        PlatformStatus::Analyzed,
        PlatformStatus::Simulating,
        PlatformStatus::Stopped,
        PlatformStatus::Centering,
        PlatformStatus::Released,
        PlatformStatus::Unauthenticated,
        PlatformStatus::InPosition,
        PlatformStatus::JoystickConnected,
        PlatformStatus::FreeMovement,
    ];

    /// Get the status matching a controller status code, or `None` if the code is unknown.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// The controller status code of this status.
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Human readable name of the status.
    pub fn name(&self) -> &'static str {
        match self {
            PlatformStatus::Error => "ERROR",
            PlatformStatus::Off => "OFF",
            PlatformStatus::Emergency => "EMERGENCY",
            PlatformStatus::Active => "ACTIVE",
            PlatformStatus::Initialized => "INITIALIZED",
            PlatformStatus::CenterSearch => "CENTER_SEARCH",
            PlatformStatus::Centered => "CENTERED",
            PlatformStatus::Analyzed => "ANALYZED",
            PlatformStatus::Simulating => "SIMULATING",
            PlatformStatus::Stopped => "STOPPED",
            PlatformStatus::Centering => "CENTERING",
            PlatformStatus::Released => "RELEASED",
            PlatformStatus::Unauthenticated => "UNAUTHENTICATED",
            PlatformStatus::InPosition => "IN_POSITION",
            PlatformStatus::JoystickConnected => "JOYSTICK_CONNECTED",
            PlatformStatus::FreeMovement => "FREE_MOVEMENT",
        }
    }
}

impl Default for PlatformStatus {
    fn default() -> Self {
        PlatformStatus::Active
    }
}

impl fmt::Display for PlatformStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

impl fmt::Display for PositionBroadcast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "R{:+07.3};P{:+07.3};Y{:+08.3};RS{:+07.3};PS{:+07.3};YS{:+07.3};AS{};T{:04.1};C{:03}",
            self.roll_deg,
            self.pitch_deg,
            self.yaw_deg,
            self.roll_rate_degs,
            self.pitch_rate_degs,
            self.yaw_rate_degs,
            self.status.code(),
            self.elapsed_ms,
            self.progress
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_status_codes() {
        for code in 0..16u8 {
            let status = PlatformStatus::from_code(code).unwrap();
            assert_eq!(status.code(), code);
        }
        assert_eq!(PlatformStatus::from_code(6), Some(PlatformStatus::Centered));
        assert_eq!(PlatformStatus::from_code(16), None);
        assert_eq!(PlatformStatus::Simulating.name(), "SIMULATING");
    }

    #[test]
    fn test_broadcast_format() {
        let b = PositionBroadcast {
            roll_deg: 1.5,
            pitch_deg: -12.3456,
            yaw_deg: 0.0,
            roll_rate_degs: 0.25,
            pitch_rate_degs: 0.0,
            yaw_rate_degs: -3.0,
            status: PlatformStatus::Initialized,
            elapsed_ms: 9.89,
            progress: 7,
        };

        assert_eq!(
            b.to_string(),
            "R+01.500;P-12.346;Y+000.000;RS+00.250;PS+00.000;YS-03.000;AS4;T09.9;C007"
        );
    }
}
