//! Inverse kinematics: platform orientation to actuator positions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;

use super::*;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl KinCtrl {
    /// Find the actuator positions which put the platform at the given orientation.
    ///
    /// The target is in the internal convention. Extensions are guessed from a small angle model
    /// of the platform for a set of search angles, the forward solve reports the orientation this
    /// guess actually gives, and the remaining error is added onto the search angles. Repeats until
    /// every angle is within the angular tolerance.
    ///
    /// The forward solves use their own warm start seed so the live telemetry solve is not
    /// disturbed. On success the result is kept as the last conversion.
    pub fn inverse_solve(
        &mut self,
        target: &EulerAngles,
    ) -> Result<ActuatorPositions, KinCtrlError> {
        if !target.is_finite() {
            return Err(KinCtrlError::NonFiniteTarget(*target));
        }

        let target = target.as_array();
        let mut search = target;

        for iteration in 0..self.geom.inverse_iteration_limit {
            let positions = self.geom.guess_positions(&search);

            let sol = self
                .geom
                .solve_struts(&mut self.inverse_solver, &positions)
                .map_err(|e| {
                    debug!("Forward solve failed during inverse solve: {}", e);
                    KinCtrlError::NoSolution {
                        iterations: iteration + 1,
                    }
                })?;

            let obtained = self
                .geom
                .extract_internal(&positions, &sol.alpha)
                .as_array();

            let mut converged = true;
            for i in 0..3 {
                let err = target[i] - obtained[i];
                if err.abs() >= self.geom.angular_tolerance_rad {
                    converged = false;
                }
                search[i] += err;
            }

            if converged {
                debug!(
                    "Inverse solve converged in {} iterations: {:?}",
                    iteration + 1,
                    positions
                );
                self.last_conversion_positions = Some(positions);
                return Ok(positions);
            }
        }

        Err(KinCtrlError::NoSolution {
            iterations: self.geom.inverse_iteration_limit,
        })
    }
}

impl Geometry {
    /// Small angle estimate of the actuator positions for `[roll, pitch, yaw]` search angles.
    ///
    /// Pitch tilts the front strut against the rear edge and roll tilts the rear edge, leaving the
    /// mean height of the front strut and the rear edge unchanged.
    fn guess_positions(&self, search: &[f64; 3]) -> ActuatorPositions {
        let pitch_drop = self.base_height_m * search[1].sin();
        let roll_drop = self.base_edge_m * search[0].sin();

        let front = 0.5 * pitch_drop;
        let rear_left = -0.5 * pitch_drop - 0.5 * roll_drop;
        let rear_right = rear_left + roll_drop;

        ActuatorPositions::new([front, rear_right, rear_left], search[2])
    }
}
