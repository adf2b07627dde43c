use crate::error::{Result, ensure_positive};

/// Golden ratio: (1 + √5) / 2
pub const PHI: f64 = 1.618_033_988_749_895;

/// Speed of light in vacuum (m/s), exact by SI definition.
pub const C_LIGHT: f64 = 299_792_458.0;

/// Reduced Planck constant (J·s), CODATA 2018.
pub const HBAR: f64 = 1.054_571_817e-34;

/// Vacuum permittivity (F/m), CODATA 2018.
pub const EPS0: f64 = 8.854_187_812_8e-12;

/// Canonical base anchor (Hz).
pub const F_432: f64 = 432.0;

/// Canonical bridge anchor (Hz), the rounded value of 432 · π/φ.
pub const F_838_776: f64 = 838.776;

/// Tolerance used when looking for an anchor among node frequencies (Hz).
pub const ANCHOR_TOL_HZ: f64 = 1e-3;

/// Gate tier 11 (Hz). Reference data; nothing in the builder consults it.
pub const GATE_11_HZ: f64 = 11.0;

/// Gate tier 22 (Hz).
pub const GATE_22_HZ: f64 = 22.0;

/// Gate tier 33 (Hz).
pub const GATE_33_HZ: f64 = 33.0;

/// Gate tier 44 (Hz).
pub const GATE_44_HZ: f64 = 44.0;

/// All gate tiers in ascending order.
pub const GATE_TIERS_HZ: [f64; 4] = [GATE_11_HZ, GATE_22_HZ, GATE_33_HZ, GATE_44_HZ];

/// φ = (1 + √5) / 2, computed rather than read from [`PHI`].
pub fn golden_ratio() -> f64 {
    (1.0 + 5.0_f64.sqrt()) / 2.0
}

/// Golden pi: π_φ = 4 / √φ ≈ 3.1446055110.
pub fn golden_pi() -> f64 {
    4.0 / golden_ratio().sqrt()
}

/// Bridge frequency: reference · (π / φ).
///
/// `bridge_frequency(F_432)` is the canonical ≈ 838.776 Hz bridge.
pub fn bridge_frequency(reference: f64) -> Result<f64> {
    ensure_positive("reference", reference)?;
    Ok(reference * (std::f64::consts::PI / golden_ratio()))
}

/// Harmonic ladder step: base · π_φⁿ · φᵏ.
///
/// Integer exponents go through `powi`, so `(n, k) = (0, 0)` returns `base`
/// unchanged.
pub fn harmonic_ladder(base: f64, n: i32, k: i32) -> Result<f64> {
    ensure_positive("base", base)?;
    Ok(base * golden_pi().powi(n) * golden_ratio().powi(k))
}

/// True if some frequency lies within `tol` of `target`.
pub fn has_anchor(frequencies: &[f64], target: f64, tol: f64) -> bool {
    frequencies.iter().any(|f| (f - target).abs() <= tol)
}
