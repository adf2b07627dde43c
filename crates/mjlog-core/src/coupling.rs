//! MJLOG coupling builder.
//!
//! M_ij = ln((ν_i / ν0) · a_j) · e^{iθ_ij}
//!
//! All inputs are checked before any cell is computed. A non-positive
//! logarithm argument is a construction-time [`MjlogError::Domain`], never a
//! NaN in the output.

use num_complex::Complex64;

use crate::error::{MjlogError, Result, ensure_all_positive, ensure_positive};
use crate::matrix::{CouplingMatrix, Matrix, PhaseMatrix};

/// Build the N×K MJLOG matrix.
///
/// `phase` is optional; when absent every angle is zero and every entry is
/// purely real.
pub fn build_coupling(
    frequencies: &[f64],
    modulators: &[f64],
    reference: f64,
    phase: Option<&PhaseMatrix>,
) -> Result<CouplingMatrix> {
    ensure_positive("reference", reference)?;
    ensure_all_positive("frequencies", frequencies)?;
    validate_modulators(modulators)?;

    let (n, k) = (frequencies.len(), modulators.len());
    if let Some(theta) = phase {
        validate_phase(theta, n, k)?;
    }

    let amplitudes = log_amplitudes(frequencies, modulators, reference)?;

    let matrix = match phase {
        None => amplitudes.map(|&amp| Complex64::new(amp, 0.0)),
        Some(theta) => Matrix::from_fn(n, k, |i, j| {
            let amp = amplitudes[(i, j)];
            let angle = theta[(i, j)];
            Complex64::new(amp * angle.cos(), amp * angle.sin())
        }),
    };

    tracing::debug!(n, k, phased = phase.is_some(), "built coupling matrix");
    Ok(matrix)
}

/// Log-amplitude table ln((ν_i / ν0) · a_j), checking every cell first.
fn log_amplitudes(frequencies: &[f64], modulators: &[f64], reference: f64) -> Result<Matrix<f64>> {
    for (i, &nu) in frequencies.iter().enumerate() {
        for (j, &a) in modulators.iter().enumerate() {
            let arg = (nu / reference) * a;
            if !arg.is_finite() || arg <= 0.0 {
                return Err(MjlogError::Domain {
                    i,
                    j,
                    frequency: nu,
                    reference,
                    modulator: a,
                    arg,
                });
            }
        }
    }
    Ok(Matrix::from_fn(frequencies.len(), modulators.len(), |i, j| {
        ((frequencies[i] / reference) * modulators[j]).ln()
    }))
}

fn validate_modulators(modulators: &[f64]) -> Result<()> {
    for (j, &a) in modulators.iter().enumerate() {
        if !a.is_finite() {
            return Err(MjlogError::invalid_at(
                "modulators",
                j,
                format!("must be finite (got {a})"),
            ));
        }
        if a == 0.0 {
            return Err(MjlogError::invalid_at("modulators", j, "must be nonzero"));
        }
    }
    Ok(())
}

fn validate_phase(theta: &PhaseMatrix, n: usize, k: usize) -> Result<()> {
    if theta.shape() != (n, k) {
        return Err(MjlogError::invalid(
            "phase",
            format!(
                "shape must be {n}x{k} (got {}x{})",
                theta.rows(),
                theta.cols()
            ),
        ));
    }
    for (i, row) in theta.iter_rows().enumerate() {
        if let Some(j) = row.iter().position(|t| !t.is_finite()) {
            return Err(MjlogError::invalid_cell(
                "phase",
                i,
                j,
                format!("must be finite (got {})", row[j]),
            ));
        }
    }
    Ok(())
}
