//! Forward kinematics: actuator positions to platform orientation
//!
//! The front strut base sits at the origin and the rear strut bases at `(base_height, ±edge/2)`.
//! A strut of height `h` inclined by `alpha` towards the centre of the base puts its top vertex at
//! height `h cos(alpha)`, displaced by `h sin(alpha)` horizontally. The forward solve looks for
//! the three inclinations which make every side of the top triangle as long as the base edge.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use nalgebra::Vector3;
use util::maths::safe_asin;

use super::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// sin(60 deg), horizontal component of a rear strut's inclination across the base.
const SIN_60: f64 = 0.866_025_403_784_438_6;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A converged forward solve.
#[derive(Debug, Clone, Copy)]
pub struct ForwardSolution {
    pub alpha: StrutAngles,

    /// Number of search iterations used
    pub iterations: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl KinCtrl {
    /// Solve the strut inclinations for the given actuator positions.
    ///
    /// The search is seeded from the last converged solution if there is one. On success the
    /// solution becomes the new seed, on failure the seed is cleared.
    pub fn forward_solve(
        &mut self,
        positions: &ActuatorPositions,
    ) -> Result<ForwardSolution, KinCtrlError> {
        self.geom.solve_struts(&mut self.live_solver, positions)
    }

    /// Get the platform orientation for the given positions and solved strut inclinations.
    pub fn extract_orientation(
        &self,
        positions: &ActuatorPositions,
        alpha: &StrutAngles,
    ) -> OrientationAngles {
        OrientationAngles::from_internal(self.geom.extract_internal(positions, alpha))
    }

    /// Forward solve then extract the orientation.
    pub fn solve_orientation(
        &mut self,
        positions: &ActuatorPositions,
    ) -> Result<OrientationAngles, KinCtrlError> {
        let sol = self.forward_solve(positions)?;
        Ok(self.extract_orientation(positions, &sol.alpha))
    }
}

impl Geometry {
    /// Heights of the three struts.
    fn strut_heights(&self, positions: &ActuatorPositions) -> [f64; NUM_LIN_ACTS] {
        let mut h = [self.neutral_height_m; NUM_LIN_ACTS];
        for (h, p) in h.iter_mut().zip(positions.lin_pos_m.iter()) {
            *h += p;
        }
        h
    }

    /// Top vertices of the three struts.
    fn vertices(&self, alpha: &[f64; NUM_LIN_ACTS], heights: &[f64; NUM_LIN_ACTS]) -> [Vector3<f64>; 3] {
        let half_edge = 0.5 * self.base_edge_m;
        let s1 = heights[1] * alpha[1].sin();
        let s2 = heights[2] * alpha[2].sin();

        [
            Vector3::new(heights[0] * alpha[0].sin(), 0.0, heights[0] * alpha[0].cos()),
            Vector3::new(
                self.base_height_m - 0.5 * s1,
                half_edge - SIN_60 * s1,
                heights[1] * alpha[1].cos(),
            ),
            Vector3::new(
                self.base_height_m - 0.5 * s2,
                -half_edge + SIN_60 * s2,
                heights[2] * alpha[2].cos(),
            ),
        ]
    }

    /// Signed error of the length of the top edge between struts `i` and `j`.
    fn edge_error(
        &self,
        alpha: &[f64; NUM_LIN_ACTS],
        heights: &[f64; NUM_LIN_ACTS],
        i: usize,
        j: usize,
    ) -> f64 {
        let v = self.vertices(alpha, heights);
        (v[i] - v[j]).norm() - self.base_edge_m
    }

    /// Nested relaxation search for the strut inclinations.
    ///
    /// The outer loop walks strut 0, the middle loop closes edge 0-1 with strut 1 and the inner
    /// loop closes edge 1-2 with strut 2. The triple is accepted once edge 0-2 also closes. Each
    /// step is the edge error scaled by the search gain. Every iteration of every loop counts
    /// towards the iteration limit.
    pub(crate) fn solve_struts(
        &self,
        solver: &mut SolverState,
        positions: &ActuatorPositions,
    ) -> Result<ForwardSolution, KinCtrlError> {
        if !positions.is_finite() {
            solver.clear();
            return Err(KinCtrlError::NonFinitePositions(*positions));
        }

        let heights = self.strut_heights(positions);
        let unit = self.search_step_rad;
        let gain = self.search_gain * unit;
        let tol = self.convergence_tolerance_m;
        let lim = self.alpha_limit_rad;
        let iteration_limit = self.iteration_limit;

        let mut start = match solver.seed() {
            Some(a) => a.0,
            None => [-lim; NUM_LIN_ACTS],
        };
        let mut alpha = start;

        let mut err = [0f64; 3];
        let mut step = [0f64; 3];
        err[0] = self.edge_error(&alpha, &heights, 0, 1);
        step[1] = err[0] * gain;
        err[1] = self.edge_error(&alpha, &heights, 1, 2);
        step[2] = err[1] * gain;
        err[2] = self.edge_error(&alpha, &heights, 0, 2);
        step[0] = err[2] * gain;

        let mut iterations = 0usize;

        macro_rules! count_iteration {
            () => {
                iterations += 1;
                if iterations > iteration_limit {
                    trace!("Forward solve failed for {:?}", positions);
                    solver.clear();
                    return Err(KinCtrlError::NoSolution {
                        iterations: iteration_limit,
                    });
                }
            };
        }

        'outer: loop {
            count_iteration!();

            alpha[0] += step[0];
            alpha[1] = start[1];

            loop {
                count_iteration!();

                alpha[1] += step[1];

                // Strut 1 ran off the end of its range, restart it from just inside the limit on
                // the next outer step
                if alpha[1] > lim {
                    step[1] = unit;
                    step[0] = err[0] * gain;
                    start[1] = lim - 2.0 * unit;
                    continue 'outer;
                }

                err[0] = self.edge_error(&alpha, &heights, 0, 1);
                step[1] = err[0] * gain;

                if err[0].abs() < tol {
                    start[1] = alpha[1];
                    step[1] = unit;

                    loop {
                        count_iteration!();

                        alpha[2] += step[2];
                        err[1] = self.edge_error(&alpha, &heights, 1, 2);
                        step[2] = err[1] * gain;

                        if err[1].abs() < tol {
                            step[2] = unit;
                            err[2] = self.edge_error(&alpha, &heights, 0, 2);
                            step[0] = err[2] * gain;

                            if err[2].abs() < tol {
                                let alpha = StrutAngles(alpha);
                                solver.accept(alpha);
                                return Ok(ForwardSolution { alpha, iterations });
                            }

                            continue 'outer;
                        }
                    }
                }
            }
        }
    }

    /// Read the internal convention orientation back from a solved platform.
    ///
    /// Pitch and yaw come from the edge joining the front vertex to the middle of the rear edge,
    /// roll from the rear edge itself. The turret angle adds directly to the yaw.
    pub(crate) fn extract_internal(
        &self,
        positions: &ActuatorPositions,
        alpha: &StrutAngles,
    ) -> EulerAngles {
        let v = self.vertices(&alpha.0, &self.strut_heights(positions));

        let rear_mid = (v[1] + v[2]) * 0.5;
        let r0 = (v[0] - rear_mid).normalize();
        let r1 = (v[1] - rear_mid).normalize();

        let pitch = safe_asin(r0.z);
        let cos_pitch = pitch.cos();

        EulerAngles::from_rad(
            safe_asin(r1.z / cos_pitch),
            pitch,
            safe_asin(r0.y / cos_pitch) + positions.turret_pos_rad,
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::kin_ctrl::params::test::flight_params;

    fn kin_ctrl() -> KinCtrl {
        KinCtrl::new(&flight_params()).unwrap()
    }

    #[test]
    fn test_neutral_pose() {
        let mut kin = kin_ctrl();

        let orient = kin.solve_orientation(&ActuatorPositions::default()).unwrap();

        for a in orient
            .internal
            .as_array()
            .iter()
            .chain(orient.avionics.as_array().iter())
        {
            assert!(a.to_degrees().abs() < 1e-4, "{:?}", orient);
        }
    }

    #[test]
    fn test_top_triangle_closes() {
        let mut kin = kin_ctrl();
        let pos = ActuatorPositions::new([0.02, -0.01, 0.005], 0.0);

        let sol = kin.forward_solve(&pos).unwrap();

        let geom = kin.geometry();
        let heights = geom.strut_heights(&pos);
        for (i, j) in [(0, 1), (1, 2), (0, 2)].iter() {
            assert!(geom.edge_error(&sol.alpha.0, &heights, *i, *j).abs() < 1e-6);
        }
        for a in sol.alpha.0.iter() {
            assert!(a.abs() <= geom.alpha_limit_rad);
        }
    }

    #[test]
    fn test_turret_adds_to_yaw() {
        let mut kin = kin_ctrl();
        let pos = ActuatorPositions::new([0.0; 3], 0.3);

        let orient = kin.solve_orientation(&pos).unwrap();

        assert!((orient.internal.yaw_rad - 0.3).abs() < 1e-5);
        assert!(orient.internal.roll_rad.abs() < 1e-5);
        assert!(orient.internal.pitch_rad.abs() < 1e-5);
    }

    #[test]
    fn test_pitch_and_roll_signs() {
        let mut kin = kin_ctrl();

        // Raising the front strut pitches the platform up
        let orient = kin
            .solve_orientation(&ActuatorPositions::new([0.02, 0.0, 0.0], 0.0))
            .unwrap();
        assert!(orient.internal.pitch_rad > 0.0);

        // Raising the rear-right strut rolls the platform positively
        let orient = kin
            .solve_orientation(&ActuatorPositions::new([0.0, 0.02, 0.0], 0.0))
            .unwrap();
        assert!(orient.internal.roll_rad > 0.0);
    }

    #[test]
    fn test_warm_start() {
        let pos = ActuatorPositions::new([0.01, -0.02, 0.015], 0.0);

        let mut kin = kin_ctrl();
        let cold = kin.forward_solve(&pos).unwrap();
        assert!(kin.live_solver().alpha_valid);

        let warm = kin.forward_solve(&pos).unwrap();
        assert!(warm.iterations < cold.iterations);
        for (w, c) in warm.alpha.0.iter().zip(cold.alpha.0.iter()) {
            assert!((w - c).abs() < 1e-6);
        }

        // Jumping to another pose from a warm seed finds the same root as a cold solve
        let other = ActuatorPositions::new([-0.03, 0.05, 0.007], 0.26);
        let warm = kin.forward_solve(&other).unwrap();
        let cold = kin_ctrl().forward_solve(&other).unwrap();
        for (w, c) in warm.alpha.0.iter().zip(cold.alpha.0.iter()) {
            assert!((w - c).abs() < 1e-5);
        }
    }

    #[test]
    fn test_failure_clears_seed() {
        let neutral = ActuatorPositions::default();
        let cold_iterations = kin_ctrl().forward_solve(&neutral).unwrap().iterations;

        let mut kin = kin_ctrl();
        kin.forward_solve(&neutral).unwrap();
        assert!(kin.live_solver().alpha_valid);

        let unreachable = ActuatorPositions::new([0.5, -0.5, 0.5], 0.0);
        assert!(matches!(
            kin.forward_solve(&unreachable),
            Err(KinCtrlError::NoSolution { iterations: 1000 })
        ));
        assert!(!kin.live_solver().alpha_valid);

        // Next solve starts cold again
        assert_eq!(kin.forward_solve(&neutral).unwrap().iterations, cold_iterations);
    }

    #[test]
    fn test_bounded_iterations() {
        let mut params = flight_params();
        params.iteration_limit = 5;
        let mut kin = KinCtrl::new(&params).unwrap();

        assert!(matches!(
            kin.forward_solve(&ActuatorPositions::default()),
            Err(KinCtrlError::NoSolution { iterations: 5 })
        ));

        let mut kin = kin_ctrl();
        let unreachable = ActuatorPositions::new([0.35, -0.35, 0.35], 0.0);
        assert!(kin.forward_solve(&unreachable).is_err());
        assert!(kin.forward_solve(&unreachable).is_err());
    }

    #[test]
    fn test_non_finite_positions() {
        let mut kin = kin_ctrl();
        let pos = ActuatorPositions::new([std::f64::NAN, 0.0, 0.0], 0.0);

        assert!(matches!(
            kin.forward_solve(&pos),
            Err(KinCtrlError::NonFinitePositions(_))
        ));
    }
}
