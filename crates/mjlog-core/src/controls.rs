//! Falsification controls.
//!
//! Both controls destroy one kind of structure while keeping the rest, so a
//! statistic that survives them is not evidence of geometric coherence.

use std::f64::consts::TAU;

use num_complex::Complex64;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::matrix::CouplingMatrix;

/// Keep every |M_ij|, replace every angle with an independent uniform draw
/// from [0, 2π).
///
/// Magnitudes survive the polar round trip up to rounding (about 1 ulp, well
/// inside 1e-12 relative); they are not bit-identical.
pub fn phase_scramble(matrix: &CouplingMatrix, rng: &mut impl Rng) -> CouplingMatrix {
    matrix.map(|z| Complex64::from_polar(z.norm(), rng.random_range(0.0..TAU)))
}

/// Uniformly random permutation of the delays (Fisher–Yates). The multiset
/// of values is unchanged; only their assignment to nodes moves.
pub fn tau_shuffle(delays: &[f64], rng: &mut impl Rng) -> Vec<f64> {
    let mut shuffled = delays.to_vec();
    shuffled.shuffle(rng);
    shuffled
}
