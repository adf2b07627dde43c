//! 2×2 minor sampling and circular statistics over a coupling matrix.
//!
//! A minor picks rows i1 < i2 and columns j1 < j2 and takes the determinant
//! of that submatrix. Keeping the matrix's own order matters: swapping two
//! rows negates the determinant, and random orientation would add a π jump to
//! half of the angles. Structured phase shows up as concentration of the
//! determinant angles, measured by the mean resultant length R.

use num_complex::Complex64;
use rand::Rng;
use serde::Serialize;

use crate::angle::{arg_half_open, unit_phasor, wrap_pi};
use crate::error::{MjlogError, Result};
use crate::matrix::{CouplingMatrix, PhaseMatrix};

/// One sampled minor. `rows.0 < rows.1` and `cols.0 < cols.1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Minor {
    pub rows: (usize, usize),
    pub cols: (usize, usize),
    pub determinant: Complex64,
}

impl Minor {
    pub fn magnitude(&self) -> f64 {
        self.determinant.norm()
    }

    /// Determinant angle in (−π, π].
    pub fn phase(&self) -> f64 {
        arg_half_open(self.determinant)
    }
}

/// Magnitudes and angles of a batch of minors, index-aligned.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MinorSample {
    pub magnitudes: Vec<f64>,
    pub phases: Vec<f64>,
}

impl MinorSample {
    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }
}

impl FromIterator<Minor> for MinorSample {
    fn from_iter<I: IntoIterator<Item = Minor>>(iter: I) -> Self {
        let (magnitudes, phases) = iter.into_iter().map(|m| (m.magnitude(), m.phase())).unzip();
        Self { magnitudes, phases }
    }
}

/// Endless stream of uniformly drawn minors. Restart it by handing in a
/// freshly seeded generator.
pub struct MinorSampler<'a, R> {
    matrix: &'a CouplingMatrix,
    rng: R,
}

impl<'a, R: Rng> MinorSampler<'a, R> {
    /// Fails unless the matrix has at least two rows and two columns.
    pub fn new(matrix: &'a CouplingMatrix, rng: R) -> Result<Self> {
        let (n, k) = matrix.shape();
        if n < 2 || k < 2 {
            return Err(MjlogError::invalid(
                "matrix",
                format!("minor sampling needs at least 2x2 (got {n}x{k})"),
            ));
        }
        Ok(Self { matrix, rng })
    }
}

impl<R: Rng> Iterator for MinorSampler<'_, R> {
    type Item = Minor;

    fn next(&mut self) -> Option<Minor> {
        let (n, k) = self.matrix.shape();
        let (i1, i2) = distinct_pair(&mut self.rng, n);
        let (j1, j2) = distinct_pair(&mut self.rng, k);
        let m = self.matrix;
        let determinant = m[(i1, j1)] * m[(i2, j2)] - m[(i1, j2)] * m[(i2, j1)];
        Some(Minor {
            rows: (i1, i2),
            cols: (j1, j2),
            determinant,
        })
    }
}

/// Draw `sample_count` minors and record |det| and arg(det) for each.
pub fn sample_minors(
    matrix: &CouplingMatrix,
    sample_count: usize,
    rng: &mut impl Rng,
) -> Result<MinorSample> {
    let sample: MinorSample = MinorSampler::new(matrix, rng)?.take(sample_count).collect();
    tracing::trace!(samples = sample.len(), "sampled minors");
    Ok(sample)
}

/// Mean resultant length R = |(1/n) Σ e^{iφ_k}|, in [0, 1].
pub fn mean_resultant_length(phases: &[f64]) -> Result<f64> {
    if phases.is_empty() {
        return Err(MjlogError::invalid("phases", "must be non-empty"));
    }
    if let Some(i) = phases.iter().position(|p| !p.is_finite()) {
        return Err(MjlogError::invalid_at(
            "phases",
            i,
            format!("must be finite (got {})", phases[i]),
        ));
    }
    let sum: Complex64 = phases.iter().map(|&p| unit_phasor(p)).sum();
    // rounding can push a perfectly concentrated sample a hair above 1
    Ok((sum.norm() / phases.len() as f64).min(1.0))
}

/// Quantile with linear interpolation between order statistics.
/// `p` is a fraction in [0, 1].
pub fn quantile(values: &[f64], p: f64) -> Result<f64> {
    if values.is_empty() {
        return Err(MjlogError::invalid("values", "must be non-empty"));
    }
    if !(0.0..=1.0).contains(&p) {
        return Err(MjlogError::invalid("p", format!("must be in [0, 1] (got {p})")));
    }
    if let Some(i) = values.iter().position(|v| !v.is_finite()) {
        return Err(MjlogError::invalid_at(
            "values",
            i,
            format!("must be finite (got {})", values[i]),
        ));
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Ok(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Compact description of a minor sample.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MinorSummary {
    pub samples: usize,
    pub resultant_length: f64,
    pub q50: f64,
    pub q90: f64,
    pub q95: f64,
    pub q99: f64,
}

impl MinorSummary {
    pub fn from_sample(sample: &MinorSample) -> Result<Self> {
        Ok(Self {
            samples: sample.len(),
            resultant_length: mean_resultant_length(&sample.phases)?,
            q50: quantile(&sample.magnitudes, 0.50)?,
            q90: quantile(&sample.magnitudes, 0.90)?,
            q95: quantile(&sample.magnitudes, 0.95)?,
            q99: quantile(&sample.magnitudes, 0.99)?,
        })
    }
}

/// Mean wrapped phase step per unit distance along `edges`, in column
/// `column` of `phase`.
///
/// Zero-length edges are skipped; returns 0 when no edge contributes.
pub fn phase_gradient_proxy<P: AsRef<[f64]>>(
    phase: &PhaseMatrix,
    positions: &[P],
    edges: &[(usize, usize)],
    column: usize,
) -> Result<f64> {
    if positions.len() != phase.rows() {
        return Err(MjlogError::invalid(
            "positions",
            format!(
                "length must equal phase rows ({} != {})",
                positions.len(),
                phase.rows()
            ),
        ));
    }
    if column >= phase.cols() {
        return Err(MjlogError::invalid(
            "column",
            format!("must be < {} (got {column})", phase.cols()),
        ));
    }

    let mut acc = 0.0;
    let mut counted = 0usize;
    for (e, &(a, b)) in edges.iter().enumerate() {
        if a >= phase.rows() || b >= phase.rows() {
            return Err(MjlogError::invalid_at(
                "edges",
                e,
                format!("node index out of range for {} nodes ({a}, {b})", phase.rows()),
            ));
        }
        let (pa, pb) = (positions[a].as_ref(), positions[b].as_ref());
        if pa.len() != pb.len() {
            return Err(MjlogError::invalid_at(
                "edges",
                e,
                format!("endpoint dimensions differ ({} != {})", pa.len(), pb.len()),
            ));
        }
        let dist = pa
            .iter()
            .zip(pb)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f64>()
            .sqrt();
        if dist.is_nan() || dist <= 0.0 {
            continue;
        }
        let step = wrap_pi(phase[(a, column)] - phase[(b, column)]);
        acc += step.abs() / dist;
        counted += 1;
    }

    Ok(if counted == 0 { 0.0 } else { acc / counted as f64 })
}

/// Two distinct indices drawn uniformly from 0..n (n ≥ 2), returned in
/// ascending order so the submatrix keeps the matrix's own row/column order.
fn distinct_pair(rng: &mut impl Rng, n: usize) -> (usize, usize) {
    let a = rng.random_range(0..n);
    let mut b = rng.random_range(0..n - 1);
    if b >= a {
        b += 1;
    }
    (a.min(b), a.max(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coupling::build_coupling;
    use crate::error::Location;
    use crate::matrix::Matrix;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use std::f64::consts::{PI, TAU};

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    fn fixture() -> CouplingMatrix {
        let freqs: Vec<f64> = (0..6).map(|i| 432.0 + 17.0 * i as f64).collect();
        let mods = [1.0, 1.618, 2.0, 2.618];
        let theta = PhaseMatrix::from_fn(6, 4, |i, j| 0.3 * i as f64 + 0.7 * j as f64);
        build_coupling(&freqs, &mods, 432.0, Some(&theta)).unwrap()
    }

    #[test]
    fn test_sample_lengths() {
        let s = sample_minors(&fixture(), 500, &mut rng()).unwrap();
        assert_eq!(s.len(), 500);
        assert_eq!(s.phases.len(), 500);
        assert!(s.phases.iter().all(|&p| p > -PI && p <= PI));
        assert!(s.magnitudes.iter().all(|&m| m >= 0.0));
    }

    #[test]
    fn test_zero_samples_is_empty() {
        let s = sample_minors(&fixture(), 0, &mut rng()).unwrap();
        assert!(s.is_empty());
    }

    #[test]
    fn test_sampling_reproducible() {
        let m = fixture();
        let a = sample_minors(&m, 300, &mut rng()).unwrap();
        let b = sample_minors(&m, 300, &mut rng()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_sampler_picks_distinct_indices() {
        let m = fixture();
        for minor in MinorSampler::new(&m, rng()).unwrap().take(1000) {
            assert!(minor.rows.0 < minor.rows.1);
            assert!(minor.cols.0 < minor.cols.1);
            let (i1, i2) = minor.rows;
            let (j1, j2) = minor.cols;
            let det = m[(i1, j1)] * m[(i2, j2)] - m[(i1, j2)] * m[(i2, j1)];
            assert_eq!(minor.determinant, det);
        }
    }

    #[test]
    fn test_sampler_on_2x2_always_takes_whole_matrix() {
        let m = build_coupling(&[500.0, 600.0], &[1.0, 2.0], 432.0, None).unwrap();
        let det = m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)];
        for minor in MinorSampler::new(&m, rng()).unwrap().take(64) {
            assert_eq!(minor.rows, (0, 1));
            assert_eq!(minor.cols, (0, 1));
            assert_eq!(minor.determinant, det);
        }
    }

    #[test]
    fn test_row_constant_phase_concentrates() {
        // Real amplitudes u_i + v_j give det = (u1 - u2)(v2 - v1), which is
        // negative for ascending inputs; a shared row phase c adds 2c.
        let freqs: Vec<f64> = (0..10).map(|i| 440.0 + 25.0 * i as f64).collect();
        let mods = [1.0, 1.5, 2.0, 2.5, 3.0];
        let theta = PhaseMatrix::from_fn(10, 5, |_, _| 0.4);
        let m = build_coupling(&freqs, &mods, 432.0, Some(&theta)).unwrap();
        let s = sample_minors(&m, 500, &mut rng()).unwrap();
        assert_relative_eq!(
            mean_resultant_length(&s.phases).unwrap(),
            1.0,
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_sampling_rejects_thin_matrix() {
        let m = build_coupling(&[432.0], &[1.0, 2.0], 432.0, None).unwrap();
        let err = sample_minors(&m, 10, &mut rng()).unwrap_err();
        assert_eq!(err.param(), Some("matrix"));
        let m = build_coupling(&[432.0, 500.0], &[1.0], 432.0, None).unwrap();
        assert!(sample_minors(&m, 10, &mut rng()).is_err());
    }

    #[test]
    fn test_resultant_length_identical_phases() {
        let r = mean_resultant_length(&[1.234; 50]).unwrap();
        assert_relative_eq!(r, 1.0, max_relative = 1e-12);
    }

    #[test]
    fn test_resultant_length_uniform_phases() {
        let phases: Vec<f64> = (0..360).map(|k| k as f64 * TAU / 360.0).collect();
        let r = mean_resultant_length(&phases).unwrap();
        assert!(r < 1e-12, "got {r}");
    }

    #[test]
    fn test_resultant_length_opposed_pair() {
        let r = mean_resultant_length(&[0.0, PI]).unwrap();
        assert!(r < 1e-12);
    }

    #[test]
    fn test_resultant_length_empty_rejected() {
        assert_eq!(mean_resultant_length(&[]).unwrap_err().param(), Some("phases"));
    }

    #[test]
    fn test_resultant_length_rejects_non_finite() {
        let err = mean_resultant_length(&[f64::NAN, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            MjlogError::InvalidArgument { param: "phases", at: Location::Index(0), .. }
        ));
        let err = mean_resultant_length(&[0.0, 1.0, f64::INFINITY]).unwrap_err();
        assert!(err.to_string().contains("phases[2]"), "{err}");
    }

    #[test]
    fn test_quantile_interpolates() {
        let v = [4.0, 1.0, 3.0, 2.0, 5.0];
        assert_eq!(quantile(&v, 0.0).unwrap(), 1.0);
        assert_eq!(quantile(&v, 0.5).unwrap(), 3.0);
        assert_eq!(quantile(&v, 1.0).unwrap(), 5.0);
        assert_relative_eq!(quantile(&v, 0.9).unwrap(), 4.6, max_relative = 1e-12);
    }

    #[test]
    fn test_quantile_rejects_bad_input() {
        assert!(quantile(&[], 0.5).is_err());
        assert!(quantile(&[1.0], 1.5).is_err());
        let err = quantile(&[1.0, f64::NAN], 0.5).unwrap_err();
        assert!(matches!(err, MjlogError::InvalidArgument { at: Location::Index(1), .. }));
    }

    #[test]
    fn test_summary_from_sample() {
        let s = sample_minors(&fixture(), 2000, &mut rng()).unwrap();
        let summary = MinorSummary::from_sample(&s).unwrap();
        assert_eq!(summary.samples, 2000);
        assert!((0.0..=1.0).contains(&summary.resultant_length));
        assert!(summary.q50 <= summary.q90);
        assert!(summary.q90 <= summary.q95);
        assert!(summary.q95 <= summary.q99);
    }

    #[test]
    fn test_phase_gradient_proxy() {
        let phase = Matrix::from_rows(vec![vec![0.0], vec![1.0], vec![6.0]]).unwrap();
        let pos = [[0.0, 0.0], [2.0, 0.0], [0.0, 0.0]];
        // edge (0,1): |−1| / 2; edge (0,2) skipped (zero length);
        // edge (1,2): |wrap(1 − 6)| / 2 = (2π − 5) / 2
        let g = phase_gradient_proxy(&phase, &pos, &[(0, 1), (0, 2), (1, 2)], 0).unwrap();
        let expected = (0.5 + (TAU - 5.0) / 2.0) / 2.0;
        assert_relative_eq!(g, expected, max_relative = 1e-12);
    }

    #[test]
    fn test_phase_gradient_proxy_no_edges() {
        let phase = PhaseMatrix::zeros(2, 1);
        let pos = [[0.0], [1.0]];
        assert_eq!(phase_gradient_proxy(&phase, &pos, &[], 0).unwrap(), 0.0);
    }

    #[test]
    fn test_phase_gradient_proxy_validates() {
        let phase = PhaseMatrix::zeros(2, 1);
        let pos = [[0.0], [1.0]];
        assert_eq!(
            phase_gradient_proxy(&phase, &pos, &[(0, 2)], 0).unwrap_err().param(),
            Some("edges")
        );
        assert_eq!(
            phase_gradient_proxy(&phase, &pos, &[(0, 1)], 1).unwrap_err().param(),
            Some("column")
        );
        assert_eq!(
            phase_gradient_proxy(&phase, &pos[..1], &[], 0).unwrap_err().param(),
            Some("positions")
        );
    }
}
