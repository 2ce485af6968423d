//! Implementations for the KinCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use serde::Serialize;

// Internal
use super::{ActuatorPositions, Geometry, KinCtrlError, Params, StrutAngles};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Warm start seed of a forward solve.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct SolverState {
    /// True if `alpha` holds the last converged solution
    pub alpha_valid: bool,

    /// Last converged strut inclinations
    pub alpha: StrutAngles,
}

/// Kinematics control module state
#[derive(Debug)]
pub struct KinCtrl {
    pub(crate) geom: Geometry,

    /// Seed of the live solve run on every telemetry record
    pub(crate) live_solver: SolverState,

    /// Seed of the forward solves run inside inverse solves
    pub(crate) inverse_solver: SolverState,

    /// Result of the last successful inverse solve
    pub(crate) last_conversion_positions: Option<ActuatorPositions>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SolverState {
    /// The seed to start a search from, or `None` if the search must start cold.
    pub fn seed(&self) -> Option<StrutAngles> {
        match self.alpha_valid {
            true => Some(self.alpha),
            false => None,
        }
    }

    pub fn accept(&mut self, alpha: StrutAngles) {
        self.alpha = alpha;
        self.alpha_valid = true;
    }

    pub fn clear(&mut self) {
        self.alpha_valid = false;
        self.alpha = StrutAngles::default();
    }
}

impl KinCtrl {
    /// Create a new kinematics module from its parameters.
    pub fn new(params: &Params) -> Result<Self, KinCtrlError> {
        let geom = Geometry::from_params(params)?;

        debug!(
            "KinCtrl geometry: base edge {:.6} m, base height {:.6} m, {} steps/m, {:.3} steps/rad",
            geom.base_edge_m, geom.base_height_m, geom.steps_per_meter, geom.steps_per_radian
        );

        Ok(Self {
            geom,
            live_solver: SolverState::default(),
            inverse_solver: SolverState::default(),
            last_conversion_positions: None,
        })
    }

    /// Geometry constants of the platform.
    pub fn geometry(&self) -> &Geometry {
        &self.geom
    }

    /// Warm start state of the live forward solve.
    pub fn live_solver(&self) -> &SolverState {
        &self.live_solver
    }

    /// Positions produced by the last successful inverse solve.
    pub fn last_conversion_positions(&self) -> Option<ActuatorPositions> {
        self.last_conversion_positions
    }
}
