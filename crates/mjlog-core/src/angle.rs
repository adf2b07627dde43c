use std::f64::consts::{PI, TAU};

use num_complex::Complex64;

use crate::error::{MjlogError, Result};
use crate::matrix::PhaseMatrix;

/// Reduce an angle into [0, 2π).
pub fn wrap_tau(theta: f64) -> f64 {
    let r = theta.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if r >= TAU { 0.0 } else { r }
}

/// Reduce every cell of a raw angle matrix into [0, 2π). A non-finite raw
/// angle (bad input or overflow of ω·t) is rejected with its cell.
pub(crate) fn wrap_phase_matrix(raw: PhaseMatrix) -> Result<PhaseMatrix> {
    if let Some(idx) = raw.as_slice().iter().position(|t| !t.is_finite()) {
        let (i, j) = (idx / raw.cols(), idx % raw.cols());
        return Err(MjlogError::invalid_cell(
            "phase",
            i,
            j,
            format!("angle must be finite (got {})", raw.as_slice()[idx]),
        ));
    }
    Ok(raw.map(|&t| wrap_tau(t)))
}

/// Reduce an angle into (−π, π]. Used for shortest-arc differences and for
/// reporting determinant angles.
pub fn wrap_pi(theta: f64) -> f64 {
    let r = PI - (PI - theta).rem_euclid(TAU);
    if r <= -PI { r + TAU } else { r }
}

/// Angle of a complex number in (−π, π].
///
/// `atan2` returns −π for a negative real with a negative-zero imaginary
/// part; that value is folded onto +π.
pub fn arg_half_open(z: Complex64) -> f64 {
    let a = z.arg();
    if a <= -PI { PI } else { a }
}

/// Unit phasor e^{iθ}.
pub fn unit_phasor(theta: f64) -> Complex64 {
    Complex64::new(theta.cos(), theta.sin())
}
