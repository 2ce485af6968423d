//! # Mechanisms Equipment Commands
//!
//! Line protocol spoken with the motor controller. Commands are single text lines written to the
//! controller's input, responses are single text lines read back from its output.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Control code for absolute position moves.
pub const MOVE_CTRL_CODE: &str = "CT1";

/// Control code for motor drive register writes.
pub const REG_WRITE_CTRL_CODE: &str = "PR5";

/// Prefix of every positive acknowledgement from the controller.
pub const ACK_PREFIX: &str = "OK";

/// Acknowledgement sent by the controller once its initialisation has completed.
pub const INIT_COMPLETE_ACK: &str = "OK CT0";

/// Prefixes of lines rejecting a command.
const REJECT_PREFIXES: [&str; 2] = ["ERR", "CERR"];

/// All linear actuators in the fixed actuator order.
pub const LIN_ACT_IDS: [ActId; 3] = [ActId::Front, ActId::RearRight, ActId::RearLeft];

/// All actuators in the fixed actuator order.
pub const ACT_IDS: [ActId; 4] = [ActId::Front, ActId::RearRight, ActId::RearLeft, ActId::Turret];

/// Drive register holding the static load compensation of the linear actuators.
pub const LOAD_COMP_REGISTER: Register = Register {
    index: 0x60FB,
    sub_index: 0x08,
    data_type: "32s",
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Velocity and acceleration limits sent with a move command, in controller units.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveProfile {
    pub velocity: u32,
    pub accel: u32,
}

/// Address of a drive register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Register {
    /// Object dictionary index
    pub index: u16,

    /// Object dictionary sub index
    pub sub_index: u8,

    /// Controller type tag of the value, for instance `32s` for signed 32 bit
    pub data_type: &'static str,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of all actuators on the platform
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum ActId {
    Front,
    RearRight,
    RearLeft,
    Turret,
}

/// Which end of an actuator's range has been exceeded.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Copy, Clone)]
pub enum LimitDirection {
    Lower,
    Upper,
}

/// A single command for the motor controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MechCmd {
    /// Move an actuator to an absolute step position.
    ///
    /// The sync flag asks the controller to start all pending moves together.
    Move {
        act: ActId,
        target_steps: i64,
        profile: MoveProfile,
        sync: bool,
    },

    /// Write a raw 32 bit value into a drive register.
    RegisterWrite {
        act: ActId,
        register: Register,
        value: u32,
    },
}

/// A line received from the motor controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MechResponse {
    /// The last command was accepted
    Ack(String),

    /// The last command was rejected
    Reject(String),

    /// Any other output from the controller
    Info(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ActId {
    /// Get the motor address used by the controller for this actuator.
    pub fn motor_id(&self) -> u32 {
        match self {
            ActId::Turret => 119,
            ActId::Front => 120,
            ActId::RearRight => 121,
            ActId::RearLeft => 122,
        }
    }

    /// Get the actuator with the given controller motor address.
    pub fn from_motor_id(motor_id: u32) -> Option<Self> {
        ACT_IDS.iter().copied().find(|a| a.motor_id() == motor_id)
    }

    /// Position of this actuator in the fixed actuator order.
    pub fn index(&self) -> usize {
        match self {
            ActId::Front => 0,
            ActId::RearRight => 1,
            ActId::RearLeft => 2,
            ActId::Turret => 3,
        }
    }
}

impl fmt::Display for LimitDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitDirection::Lower => write!(f, "lower"),
            LimitDirection::Upper => write!(f, "upper"),
        }
    }
}

impl MechCmd {
    /// The actuator addressed by this command.
    pub fn act(&self) -> ActId {
        match self {
            MechCmd::Move { act, .. } => *act,
            MechCmd::RegisterWrite { act, .. } => *act,
        }
    }
}

impl fmt::Display for MechCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MechCmd::Move {
                act,
                target_steps,
                profile,
                sync,
            } => {
                write!(
                    f,
                    "{} M{} P{} VM{} AM{}",
                    MOVE_CTRL_CODE,
                    act.motor_id(),
                    target_steps,
                    profile.velocity,
                    profile.accel
                )?;
                if *sync {
                    write!(f, " S")?;
                }
                Ok(())
            }
            MechCmd::RegisterWrite {
                act,
                register,
                value,
            } => write!(
                f,
                "{} M{} O{:04X} S{:03X} T{} {:X}",
                REG_WRITE_CTRL_CODE,
                act.motor_id(),
                register.index,
                register.sub_index,
                register.data_type,
                value
            ),
        }
    }
}

impl MechResponse {
    /// Classify a line received from the controller.
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end();

        if has_prefix(line, ACK_PREFIX) {
            MechResponse::Ack(line.to_string())
        } else if REJECT_PREFIXES.iter().any(|p| has_prefix(line, p)) {
            MechResponse::Reject(line.to_string())
        } else {
            MechResponse::Info(line.to_string())
        }
    }

    /// True if this is the acknowledgement of the controller's initialisation.
    pub fn is_init_complete(&self) -> bool {
        match self {
            MechResponse::Ack(l) => l.starts_with(INIT_COMPLETE_ACK),
            _ => false,
        }
    }

    /// The raw text of the response.
    pub fn text(&self) -> &str {
        match self {
            MechResponse::Ack(l) | MechResponse::Reject(l) | MechResponse::Info(l) => l,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// True if the first word of `line` is exactly `prefix`.
fn has_prefix(line: &str, prefix: &str) -> bool {
    match line.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with(' '),
        None => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_move_format() {
        let cmd = MechCmd::Move {
            act: ActId::Turret,
            target_steps: -1234,
            profile: MoveProfile {
                velocity: 100,
                accel: 2,
            },
            sync: false,
        };
        assert_eq!(cmd.to_string(), "CT1 M119 P-1234 VM100 AM2");

        let cmd = MechCmd::Move {
            act: ActId::RearLeft,
            target_steps: 318000,
            profile: MoveProfile {
                velocity: 60000,
                accel: 50,
            },
            sync: true,
        };
        assert_eq!(cmd.to_string(), "CT1 M122 P318000 VM60000 AM50 S");
    }

    #[test]
    fn test_register_write_format() {
        let cmd = MechCmd::RegisterWrite {
            act: ActId::Front,
            register: LOAD_COMP_REGISTER,
            value: (-700_000i32) as u32,
        };
        assert_eq!(cmd.to_string(), "PR5 M120 O60FB S008 T32s FFF551A0");
    }

    #[test]
    fn test_response_parse() {
        assert_eq!(
            MechResponse::parse("OK CT1\n"),
            MechResponse::Ack("OK CT1".into())
        );
        assert!(MechResponse::parse("OK CT0 M5").is_init_complete());
        assert!(!MechResponse::parse("OK CT1").is_init_complete());
        assert_eq!(
            MechResponse::parse("CERR CT1 2: bad axis"),
            MechResponse::Reject("CERR CT1 2: bad axis".into())
        );
        assert_eq!(
            MechResponse::parse("OKAY"),
            MechResponse::Info("OKAY".into())
        );
        assert_eq!(
            MechResponse::parse("@M A120"),
            MechResponse::Info("@M A120".into())
        );
    }

    #[test]
    fn test_motor_ids() {
        for act in ACT_IDS.iter() {
            assert_eq!(ActId::from_motor_id(act.motor_id()), Some(*act));
            assert_eq!(ACT_IDS[act.index()], *act);
        }
        assert_eq!(ActId::from_motor_id(118), None);
    }
}
