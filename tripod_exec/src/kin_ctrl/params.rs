//! Parameters structure for KinCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::KinCtrlError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Kinematics control, as loaded from `kin_ctrl.toml`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Params {
    // ---- GEOMETRY ----
    /// Radius of the circle through the three strut bases.
    ///
    /// Units: meters
    pub base_radius_m: f64,

    /// Height of a strut at zero extension.
    ///
    /// Units: meters
    pub neutral_height_m: f64,

    // ---- MOTORS ----
    /// Motor steps per revolution of a motor shaft.
    pub steps_per_turn: f64,

    /// Linear travel of a strut per motor revolution.
    ///
    /// Units: meters
    pub meters_per_turn: f64,

    /// Gear reduction between the turret motor and the turret.
    pub rot_reduction: f64,

    /// Largest step count a linear actuator can be commanded to, in either direction.
    pub max_linear_step: i64,

    /// Largest step count the turret can be commanded to, in either direction.
    pub max_rotary_step: i64,

    // ---- SOLVER ----
    /// Largest strut inclination searched by the forward solve, in either direction.
    ///
    /// Units: degrees
    pub alpha_limit_deg: f64,

    /// Unit step of the strut inclination search.
    ///
    /// Units: degrees
    pub angle_search_step_deg: f64,

    /// Gain applied to the edge length error to get the next search step.
    ///
    /// Units: 1/meters
    pub angle_search_gain: f64,

    /// Maximum number of iterations of a forward solve, all loops included.
    pub iteration_limit: usize,

    /// Edge length error under which the top triangle is considered closed.
    ///
    /// Units: meters
    pub convergence_tolerance_m: f64,

    /// Orientation error under which an inverse solve is considered converged.
    ///
    /// Units: degrees
    pub angular_tolerance_deg: f64,

    /// Maximum number of correction iterations of an inverse solve.
    pub inverse_iteration_limit: usize,
}

/// Immutable geometry constants derived from the parameters.
#[derive(Debug, Clone, Copy)]
pub struct Geometry {
    /// Units: meters
    pub base_radius_m: f64,

    /// Length of each side of the base (and top) triangle.
    ///
    /// Units: meters
    pub base_edge_m: f64,

    /// Distance from the front strut to the rear edge of the base.
    ///
    /// Units: meters
    pub base_height_m: f64,

    /// Units: meters
    pub neutral_height_m: f64,

    pub steps_per_meter: f64,
    pub steps_per_radian: f64,
    pub max_linear_step: i64,
    pub max_rotary_step: i64,

    /// Units: radians
    pub alpha_limit_rad: f64,

    /// Units: radians
    pub search_step_rad: f64,

    pub search_gain: f64,
    pub iteration_limit: usize,

    /// Units: meters
    pub convergence_tolerance_m: f64,

    /// Units: radians
    pub angular_tolerance_rad: f64,

    pub inverse_iteration_limit: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Check that the parameters describe a usable platform.
    pub fn validate(&self) -> Result<(), KinCtrlError> {
        let positive = [
            ("base_radius_m", self.base_radius_m),
            ("neutral_height_m", self.neutral_height_m),
            ("steps_per_turn", self.steps_per_turn),
            ("meters_per_turn", self.meters_per_turn),
            ("rot_reduction", self.rot_reduction),
            ("alpha_limit_deg", self.alpha_limit_deg),
            ("angle_search_step_deg", self.angle_search_step_deg),
            ("angle_search_gain", self.angle_search_gain),
            ("convergence_tolerance_m", self.convergence_tolerance_m),
            ("angular_tolerance_deg", self.angular_tolerance_deg),
        ];

        for (name, value) in positive.iter() {
            if !(value.is_finite() && *value > 0.0) {
                return Err(KinCtrlError::InvalidParams(format!(
                    "{} must be positive, found {}",
                    name, value
                )));
            }
        }

        if self.max_linear_step <= 0 || self.max_rotary_step <= 0 {
            return Err(KinCtrlError::InvalidParams(String::from(
                "Step limits must be positive",
            )));
        }

        if self.iteration_limit == 0 || self.inverse_iteration_limit == 0 {
            return Err(KinCtrlError::InvalidParams(String::from(
                "Iteration limits must be non-zero",
            )));
        }

        Ok(())
    }
}

impl Geometry {
    /// Validate the parameters and derive the geometry constants from them.
    pub fn from_params(params: &Params) -> Result<Self, KinCtrlError> {
        params.validate()?;

        Ok(Self {
            base_radius_m: params.base_radius_m,
            base_edge_m: params.base_radius_m * 3f64.sqrt(),
            base_height_m: 1.5 * params.base_radius_m,
            neutral_height_m: params.neutral_height_m,
            steps_per_meter: params.steps_per_turn / params.meters_per_turn,
            steps_per_radian: params.steps_per_turn * params.rot_reduction
                / std::f64::consts::TAU,
            max_linear_step: params.max_linear_step,
            max_rotary_step: params.max_rotary_step,
            alpha_limit_rad: params.alpha_limit_deg.to_radians(),
            search_step_rad: params.angle_search_step_deg.to_radians(),
            search_gain: params.angle_search_gain,
            iteration_limit: params.iteration_limit,
            convergence_tolerance_m: params.convergence_tolerance_m,
            angular_tolerance_rad: params.angular_tolerance_deg.to_radians(),
            inverse_iteration_limit: params.inverse_iteration_limit,
        })
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    /// Parameters of the flight platform.
    pub(crate) fn flight_params() -> Params {
        Params {
            base_radius_m: 0.8,
            neutral_height_m: 1.685,
            steps_per_turn: 8000.0,
            meters_per_turn: 0.01,
            rot_reduction: 115.0,
            max_linear_step: 319999,
            max_rotary_step: 2147483647,
            alpha_limit_deg: 10.0,
            angle_search_step_deg: 0.1,
            angle_search_gain: 200.0,
            iteration_limit: 1000,
            convergence_tolerance_m: 1e-6,
            angular_tolerance_deg: 1e-4,
            inverse_iteration_limit: 100,
        }
    }

    #[test]
    fn test_derived_geometry() {
        let geom = Geometry::from_params(&flight_params()).unwrap();

        assert!((geom.base_edge_m - 1.385640646055102).abs() < 1e-12);
        assert!((geom.base_height_m - 1.2).abs() < 1e-12);
        assert_eq!(geom.steps_per_meter, 800000.0);
        assert!((geom.steps_per_radian - 146422.54764).abs() < 1e-3);
    }

    #[test]
    fn test_file_params() {
        let p: Params = util::params::parse(include_str!("../../../params/kin_ctrl.toml")).unwrap();
        assert!(p.validate().is_ok());
        assert_eq!(p.max_linear_step, 319999);
    }

    #[test]
    fn test_invalid_params() {
        let mut p = flight_params();
        p.meters_per_turn = 0.0;
        assert!(matches!(
            Geometry::from_params(&p),
            Err(KinCtrlError::InvalidParams(_))
        ));

        let mut p = flight_params();
        p.convergence_tolerance_m = -1e-6;
        assert!(p.validate().is_err());

        let mut p = flight_params();
        p.iteration_limit = 0;
        assert!(p.validate().is_err());

        assert!(Params::default().validate().is_err());
    }
}
