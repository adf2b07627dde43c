//! Path-length geometry: control paths, modulated paths, path-length phase
//! and the odd-harmonic spectral peaks those paths predict.

use std::f64::consts::TAU;

use crate::angle::{wrap_phase_matrix, wrap_tau};
use crate::constants::PHI;
use crate::error::{MjlogError, Result, ensure_all_positive, ensure_finite, ensure_positive};
use crate::matrix::PhaseMatrix;

/// Control path length L0 = 2·√(R² + H²) for a source at radius `r` and
/// height `h`.
pub fn control_path_length(r: f64, h: f64) -> Result<f64> {
    ensure_finite("r", r)?;
    ensure_finite("h", h)?;
    Ok(2.0 * r.hypot(h))
}

/// Effective path length L_eff = L0 · a_j.
pub fn effective_path_length(l0: f64, modulator: f64) -> Result<f64> {
    ensure_finite("l0", l0)?;
    ensure_finite("modulator", modulator)?;
    Ok(l0 * modulator)
}

/// θ = (2πν / c) · L_eff, reduced into [0, 2π).
pub fn path_phase(frequency: f64, path_length: f64, speed: f64) -> Result<f64> {
    ensure_finite("frequency", frequency)?;
    ensure_finite("path_length", path_length)?;
    ensure_positive("speed", speed)?;
    let theta = TAU * frequency / speed * path_length;
    ensure_finite("phase", theta)?;
    Ok(wrap_tau(theta))
}

/// θ_ij = (2πν_i / c) · L_eff_j, reduced into [0, 2π).
///
/// Suitable as the optional phase of [`crate::build_coupling`] when the
/// columns are indexed by effective path length.
pub fn path_phase_matrix(
    frequencies: &[f64],
    path_lengths: &[f64],
    speed: f64,
) -> Result<PhaseMatrix> {
    ensure_positive("speed", speed)?;
    ensure_all_positive("frequencies", frequencies)?;
    if let Some(j) = path_lengths.iter().position(|l| !l.is_finite()) {
        return Err(MjlogError::invalid_at(
            "path_lengths",
            j,
            format!("must be finite (got {})", path_lengths[j]),
        ));
    }
    wrap_phase_matrix(PhaseMatrix::from_fn(
        frequencies.len(),
        path_lengths.len(),
        |i, j| TAU * frequencies[i] / speed * path_lengths[j],
    ))
}

/// Control-path peak for mode `n`: (2n + 1)·c / (2·L0).
pub fn peak_frequency_control(n: u32, l0: f64, speed: f64) -> Result<f64> {
    ensure_positive("l0", l0)?;
    ensure_positive("speed", speed)?;
    Ok(odd_harmonic(n) * speed / (2.0 * l0))
}

/// Golden-ratio path peak for mode `n`: (2n + 1)·c / (2·L0·φ).
pub fn peak_frequency_phi(n: u32, l0: f64, speed: f64) -> Result<f64> {
    ensure_positive("l0", l0)?;
    ensure_positive("speed", speed)?;
    Ok(odd_harmonic(n) * speed / (2.0 * l0 * PHI))
}

/// Control and golden-ratio peaks for each mode, in the order given.
pub fn peak_frequencies(
    l0: f64,
    modes: impl IntoIterator<Item = u32>,
    speed: f64,
) -> Result<(Vec<f64>, Vec<f64>)> {
    let mut control = Vec::new();
    let mut golden = Vec::new();
    for n in modes {
        control.push(peak_frequency_control(n, l0, speed)?);
        golden.push(peak_frequency_phi(n, l0, speed)?);
    }
    Ok((control, golden))
}

fn odd_harmonic(n: u32) -> f64 {
    2.0 * f64::from(n) + 1.0
}
