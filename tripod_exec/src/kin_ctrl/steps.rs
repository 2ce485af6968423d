//! Conversion between actuator positions and motor steps

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::mech::{ActId, LimitDirection, LIN_ACT_IDS};

use super::*;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl KinCtrl {
    /// Convert actuator positions into motor steps in the controller's sign convention.
    ///
    /// Positions are rounded to the nearest step. Every actuator is checked against its limit
    /// before anything is returned, linear actuators first in actuator order, lower limit before
    /// upper, then the turret.
    pub fn steps_from_positions(
        &self,
        positions: &ActuatorPositions,
    ) -> Result<ActuatorSteps, KinCtrlError> {
        if !positions.is_finite() {
            return Err(KinCtrlError::NonFinitePositions(*positions));
        }

        let mut steps = [0i64; 4];

        for (i, act) in LIN_ACT_IDS.iter().enumerate() {
            steps[act.index()] = check_limit(
                *act,
                (positions.lin_pos_m[i] * self.geom.steps_per_meter).round(),
                self.geom.max_linear_step,
            )?;
        }

        steps[ActId::Turret.index()] = check_limit(
            ActId::Turret,
            (positions.turret_pos_rad * self.geom.steps_per_radian).round(),
            self.geom.max_rotary_step,
        )?;

        for s in steps.iter_mut() {
            *s = -*s;
        }

        Ok(ActuatorSteps(steps))
    }

    /// Convert motor steps in the controller's sign convention back into actuator positions.
    pub fn positions_from_steps(&self, steps: &ActuatorSteps) -> ActuatorPositions {
        let mut lin_pos_m = [0f64; NUM_LIN_ACTS];
        for (i, act) in LIN_ACT_IDS.iter().enumerate() {
            lin_pos_m[i] = -(steps.get(*act) as f64) / self.geom.steps_per_meter;
        }

        ActuatorPositions::new(
            lin_pos_m,
            -(steps.get(ActId::Turret) as f64) / self.geom.steps_per_radian,
        )
    }

    /// True if every actuator of `steps` is within its limit.
    pub fn steps_within_limits(&self, steps: &ActuatorSteps) -> bool {
        LIN_ACT_IDS
            .iter()
            .all(|a| steps.get(*a).abs() <= self.geom.max_linear_step)
            && steps.get(ActId::Turret).abs() <= self.geom.max_rotary_step
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn check_limit(act: ActId, steps: f64, max_step: i64) -> Result<i64, KinCtrlError> {
    let limit = max_step as f64;

    if steps < -limit {
        Err(KinCtrlError::LimitExceeded {
            act,
            direction: LimitDirection::Lower,
            steps: steps as i64,
        })
    } else if steps > limit {
        Err(KinCtrlError::LimitExceeded {
            act,
            direction: LimitDirection::Upper,
            steps: steps as i64,
        })
    } else {
        Ok(steps as i64)
    }
}
