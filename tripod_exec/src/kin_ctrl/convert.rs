//! Conversions between the internal and avionics angle conventions
//!
//! Both conventions describe the same rotation matrix, built from elementary rotations in a
//! different order:
//!
//! - internal: `R = Rz(yaw) * Ry(pitch) * Rx(roll)`
//! - avionics: `R = Rx(roll) * Ry(pitch) * Rz(yaw)`
//!
//! A conversion builds the matrix in one convention and reads the angles of the other back from
//! its elements. Both directions are exact inverses while |pitch| < 90 degrees.
//!
//! The turret turns through more than one revolution, so the yaw read back is kept within half a
//! turn of the yaw given instead of being folded into (-180, 180].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Rotation3, Vector3};
use util::maths::{nearest_turn, safe_asin};

use super::EulerAngles;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert angles in the internal convention to the avionics convention.
pub fn internal_to_avionics(internal: &EulerAngles) -> EulerAngles {
    let m = Rotation3::from_euler_angles(internal.roll_rad, internal.pitch_rad, internal.yaw_rad)
        .into_inner();

    EulerAngles::from_rad(
        (-m[(1, 2)]).atan2(m[(2, 2)]),
        safe_asin(m[(0, 2)]),
        nearest_turn((-m[(0, 1)]).atan2(m[(0, 0)]), internal.yaw_rad),
    )
}

/// Convert angles in the avionics convention to the internal convention.
pub fn avionics_to_internal(avionics: &EulerAngles) -> EulerAngles {
    let m = (Rotation3::from_axis_angle(&Vector3::x_axis(), avionics.roll_rad)
        * Rotation3::from_axis_angle(&Vector3::y_axis(), avionics.pitch_rad)
        * Rotation3::from_axis_angle(&Vector3::z_axis(), avionics.yaw_rad))
    .into_inner();

    EulerAngles::from_rad(
        m[(2, 1)].atan2(m[(2, 2)]),
        safe_asin(-m[(2, 0)]),
        nearest_turn(m[(1, 0)].atan2(m[(0, 0)]), avionics.yaw_rad),
    )
}
