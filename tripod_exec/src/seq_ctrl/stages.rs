//! Commands making up each sequence

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::mech::{ActId, MechCmd, MoveProfile, LIN_ACT_IDS, LOAD_COMP_REGISTER};

use super::{SeqCtrl, SequenceState};

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SeqCtrl {
    /// Turret move opening a position move.
    pub(crate) fn position_opening(&self, turret_steps: i64, relative_speed: f64) -> MechCmd {
        MechCmd::Move {
            act: ActId::Turret,
            target_steps: turret_steps,
            profile: scaled_profile(
                self.params.rot_max_velocity,
                self.params.rot_max_accel,
                relative_speed,
            ),
            sync: false,
        }
    }

    /// Profile of the linear actuators during a position move.
    pub(crate) fn position_lin_profile(&self, relative_speed: f64) -> MoveProfile {
        scaled_profile(
            self.params.lin_max_velocity,
            self.params.lin_max_accel,
            relative_speed,
        )
    }

    /// Turret move back to zero opening a lowering move.
    pub(crate) fn lowering_opening(&self) -> MechCmd {
        MechCmd::Move {
            act: ActId::Turret,
            target_steps: 0,
            profile: MoveProfile {
                velocity: self.params.rot_max_velocity / self.params.lowering_divisor,
                accel: self.params.rot_max_accel / self.params.lowering_divisor,
            },
            sync: false,
        }
    }

    fn lowering_lin_profile(&self) -> MoveProfile {
        MoveProfile {
            velocity: self.params.lin_max_velocity / self.params.lowering_divisor,
            accel: self.params.lin_max_accel / self.params.lowering_divisor,
        }
    }

    /// Front actuator register write opening a weight correction.
    pub(crate) fn weight_correction_opening(&self, value: u32) -> MechCmd {
        MechCmd::RegisterWrite {
            act: ActId::Front,
            register: LOAD_COMP_REGISTER,
            value,
        }
    }

    /// Raw register value compensating for a payload of `mass_kg`.
    ///
    /// The value is the signed compensation truncated to its low 32 bits.
    pub(crate) fn load_comp_value(&self, mass_kg: f64) -> u32 {
        let comp = self.params.load_comp_offset
            - (mass_kg * self.params.load_comp_per_kg).round() as i64;

        comp as u32
    }

    /// Build the command of the next stage and advance the sequence.
    ///
    /// Returns `None` once every stage of the current sequence has been emitted, or if idle.
    pub(crate) fn next_stage(&mut self) -> Option<MechCmd> {
        let lowering_profile = self.lowering_lin_profile();
        let lowering_target = self.params.lowering_target_steps;

        match &mut self.state {
            SequenceState::Idle => None,
            SequenceState::PositionMove {
                next,
                target_steps,
                profile,
            } => {
                let act = *LIN_ACT_IDS.get(*next)?;
                let cmd = MechCmd::Move {
                    act,
                    target_steps: target_steps[*next],
                    profile: *profile,
                    // The last actuator releases all pending moves together
                    sync: *next == LIN_ACT_IDS.len() - 1,
                };
                *next += 1;
                Some(cmd)
            }
            SequenceState::LoweringMove { next } => {
                let act = *LIN_ACT_IDS.get(*next)?;
                *next += 1;
                Some(MechCmd::Move {
                    act,
                    target_steps: lowering_target,
                    profile: lowering_profile,
                    sync: false,
                })
            }
            SequenceState::WeightCorrection { next, value } => {
                let act = *LIN_ACT_IDS.get(*next)?;
                *next += 1;
                Some(MechCmd::RegisterWrite {
                    act,
                    register: LOAD_COMP_REGISTER,
                    value: *value,
                })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Scale a full speed profile by a relative speed in percent, truncating towards zero.
fn scaled_profile(max_velocity: u32, max_accel: u32, relative_speed: f64) -> MoveProfile {
    MoveProfile {
        velocity: (max_velocity as f64 / 100.0 * relative_speed) as u32,
        accel: (max_accel as f64 / 100.0 * relative_speed) as u32,
    }
}
