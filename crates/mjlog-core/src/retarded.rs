//! Retarded-time phase binding.
//!
//! Each node sits at a position x_i and is heard by an observer at x* through
//! a medium with finite propagation speed v, so its signal arrives late by
//! τ_i = ‖x_i − x*‖ / v. The delay offsets the node's phase; the resulting
//! phase matrix is handed to the coupling builder.

use std::f64::consts::TAU;

use crate::angle::wrap_phase_matrix;
use crate::coupling::build_coupling;
use crate::error::{MjlogError, Result, ensure_all_positive, ensure_finite, ensure_positive};
use crate::matrix::{CouplingMatrix, PhaseMatrix};

/// Node positions, observer, propagation speed and observation time.
#[derive(Clone, Copy, Debug)]
pub struct Geometry<'a, P> {
    pub positions: &'a [P],
    pub observer: &'a [f64],
    pub speed: f64,
    pub time: f64,
}

/// How the per-node retarded time is turned into an N×K phase matrix.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum PhasePolicy {
    /// θ_ij = 2π·ν_i·(t − τ_i) for every column j. Phase depends on node
    /// geometry and the node's own frequency only.
    #[default]
    NodeBroadcast,
    /// θ_ij = 2π·ν0·a_j·(t − τ_i) + ψ_j. Each modulator acts as a carrier at
    /// a_j times the reference; `offsets` holds ψ_j (all zero when `None`).
    ModulatorCarrier { offsets: Option<Vec<f64>> },
}

/// Output of the binder: the matrix plus the phase and delays used to build
/// it, so either can be audited or perturbed independently.
#[derive(Clone, Debug, PartialEq)]
pub struct RetardedCoupling {
    pub matrix: CouplingMatrix,
    pub phase: PhaseMatrix,
    pub delays: Vec<f64>,
}

/// τ_i = ‖x_i − x*‖ / v for every node.
pub fn retarded_delays<P: AsRef<[f64]>>(
    positions: &[P],
    observer: &[f64],
    speed: f64,
) -> Result<Vec<f64>> {
    ensure_positive("speed", speed)?;
    if let Some(d) = observer.iter().position(|c| !c.is_finite()) {
        return Err(MjlogError::invalid_at(
            "observer",
            d,
            format!("must be finite (got {})", observer[d]),
        ));
    }

    let dim = observer.len();
    for (i, p) in positions.iter().enumerate() {
        let p = p.as_ref();
        if p.len() != dim {
            return Err(MjlogError::invalid_at(
                "positions",
                i,
                format!("dimension must equal the observer's ({} != {dim})", p.len()),
            ));
        }
        if let Some(d) = p.iter().position(|c| !c.is_finite()) {
            return Err(MjlogError::invalid_cell(
                "positions",
                i,
                d,
                format!("must be finite (got {})", p[d]),
            ));
        }
    }

    Ok(positions
        .iter()
        .map(|p| distance(p.as_ref(), observer) / speed)
        .collect())
}

/// Phase matrix for an arbitrary delay vector under `policy`.
///
/// Accepts delays that did not come from [`retarded_delays`], e.g. a
/// shuffled vector. Delays must be finite and non-negative.
pub fn retarded_phase_matrix(
    delays: &[f64],
    frequencies: &[f64],
    modulators: &[f64],
    reference: f64,
    time: f64,
    policy: &PhasePolicy,
) -> Result<PhaseMatrix> {
    ensure_finite("time", time)?;
    validate_delays(delays)?;
    if delays.len() != frequencies.len() {
        return Err(MjlogError::invalid(
            "delays",
            format!(
                "length must equal frequencies length ({} != {})",
                delays.len(),
                frequencies.len()
            ),
        ));
    }

    ensure_all_positive("frequencies", frequencies)?;

    let (n, k) = (frequencies.len(), modulators.len());
    let raw = match policy {
        PhasePolicy::NodeBroadcast => {
            // one angle per node, repeated across the row
            let node_phase: Vec<f64> = frequencies
                .iter()
                .zip(delays)
                .map(|(&nu, &tau)| TAU * nu * (time - tau))
                .collect();
            PhaseMatrix::from_fn(n, k, |i, _| node_phase[i])
        }
        PhasePolicy::ModulatorCarrier { offsets } => {
            ensure_positive("reference", reference)?;
            if let Some(j) = modulators.iter().position(|a| !a.is_finite()) {
                return Err(MjlogError::invalid_at(
                    "modulators",
                    j,
                    format!("must be finite (got {})", modulators[j]),
                ));
            }
            if let Some(psi) = offsets {
                if psi.len() != k {
                    return Err(MjlogError::invalid(
                        "offsets",
                        format!("length must equal modulators length ({} != {k})", psi.len()),
                    ));
                }
                if let Some(j) = psi.iter().position(|p| !p.is_finite()) {
                    return Err(MjlogError::invalid_at(
                        "offsets",
                        j,
                        format!("must be finite (got {})", psi[j]),
                    ));
                }
            }
            let offset = |j: usize| offsets.as_ref().map_or(0.0, |psi| psi[j]);
            PhaseMatrix::from_fn(n, k, |i, j| {
                let omega = TAU * reference * modulators[j];
                omega * (time - delays[i]) + offset(j)
            })
        }
    };
    wrap_phase_matrix(raw)
}

/// Rebuild phase and matrix from a given delay vector.
pub fn couple_from_delays(
    delays: &[f64],
    frequencies: &[f64],
    modulators: &[f64],
    reference: f64,
    time: f64,
    policy: &PhasePolicy,
) -> Result<RetardedCoupling> {
    let phase = retarded_phase_matrix(delays, frequencies, modulators, reference, time, policy)?;
    let matrix = build_coupling(frequencies, modulators, reference, Some(&phase))?;
    Ok(RetardedCoupling {
        matrix,
        phase,
        delays: delays.to_vec(),
    })
}

/// Geometric phase binder with the default [`PhasePolicy::NodeBroadcast`].
pub fn build_retarded_coupling<P: AsRef<[f64]>>(
    geometry: &Geometry<'_, P>,
    frequencies: &[f64],
    modulators: &[f64],
    reference: f64,
) -> Result<RetardedCoupling> {
    build_retarded_coupling_with(
        geometry,
        frequencies,
        modulators,
        reference,
        &PhasePolicy::NodeBroadcast,
    )
}

/// Geometric phase binder under an explicit phase policy.
pub fn build_retarded_coupling_with<P: AsRef<[f64]>>(
    geometry: &Geometry<'_, P>,
    frequencies: &[f64],
    modulators: &[f64],
    reference: f64,
    policy: &PhasePolicy,
) -> Result<RetardedCoupling> {
    if geometry.positions.len() != frequencies.len() {
        return Err(MjlogError::invalid(
            "positions",
            format!(
                "length must equal frequencies length ({} != {})",
                geometry.positions.len(),
                frequencies.len()
            ),
        ));
    }
    ensure_finite("time", geometry.time)?;
    let delays = retarded_delays(geometry.positions, geometry.observer, geometry.speed)?;
    let bound = couple_from_delays(
        &delays,
        frequencies,
        modulators,
        reference,
        geometry.time,
        policy,
    )?;
    tracing::debug!(
        nodes = frequencies.len(),
        modulators = modulators.len(),
        ?policy,
        "bound retarded coupling"
    );
    Ok(bound)
}

fn validate_delays(delays: &[f64]) -> Result<()> {
    for (i, &tau) in delays.iter().enumerate() {
        if !tau.is_finite() || tau < 0.0 {
            return Err(MjlogError::invalid_at(
                "delays",
                i,
                format!("must be finite and >= 0 (got {tau})"),
            ));
        }
    }
    Ok(())
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angle::wrap_tau;
    use crate::constants::F_432;
    use crate::error::Location;
    use approx::assert_relative_eq;

    const FREQS: [f64; 3] = [432.0, 440.0, 528.0];
    const MODS: [f64; 2] = [1.0, 1.618];

    fn positions() -> Vec<[f64; 2]> {
        vec![[0.0, 0.0], [3.0, 4.0], [0.5, 0.5]]
    }

    #[test]
    fn test_delays_are_distance_over_speed() {
        let tau = retarded_delays(&positions(), &[0.0, 0.0], 2.0).unwrap();
        assert_eq!(tau, vec![0.0, 2.5, 0.5_f64.sqrt() / 2.0]);
    }

    #[test]
    fn test_delays_accept_vec_points() {
        let pts = vec![vec![1.0, 0.0, 0.0], vec![0.0, 0.0, 2.0]];
        let tau = retarded_delays(&pts, &[0.0, 0.0, 0.0], 1.0).unwrap();
        assert_eq!(tau, vec![1.0, 2.0]);
    }

    #[test]
    fn test_delays_reject_dimension_mismatch() {
        let pts = vec![vec![1.0, 0.0], vec![0.0]];
        let err = retarded_delays(&pts, &[0.0, 0.0], 1.0).unwrap_err();
        assert!(matches!(
            err,
            MjlogError::InvalidArgument { param: "positions", at: Location::Index(1), .. }
        ));
    }

    #[test]
    fn test_delays_reject_bad_speed_and_coords() {
        assert_eq!(
            retarded_delays(&positions(), &[0.0, 0.0], 0.0).unwrap_err().param(),
            Some("speed")
        );
        let pts = vec![[0.0, f64::NAN]];
        let err = retarded_delays(&pts, &[0.0, 0.0], 1.0).unwrap_err();
        assert!(matches!(err, MjlogError::InvalidArgument { at: Location::Cell(0, 1), .. }));
        let err = retarded_delays(&positions(), &[f64::INFINITY, 0.0], 1.0).unwrap_err();
        assert_eq!(err.param(), Some("observer"));
    }

    #[test]
    fn test_node_broadcast_constant_across_row() {
        let geometry = Geometry {
            positions: &positions(),
            observer: &[0.0, 0.0],
            speed: 343.0,
            time: 0.25,
        };
        let bound = build_retarded_coupling(&geometry, &FREQS, &MODS, F_432).unwrap();
        assert_eq!(bound.phase.shape(), (3, 2));
        assert_eq!(bound.matrix.shape(), (3, 2));
        for (i, row) in bound.phase.iter_rows().enumerate() {
            assert!(row.iter().all(|&t| t == row[0]));
            let expected = wrap_tau(TAU * FREQS[i] * (0.25 - bound.delays[i]));
            assert_eq!(row[0], expected);
            assert!((0.0..TAU).contains(&row[0]));
        }
    }

    #[test]
    fn test_binder_matches_builder_with_returned_phase() {
        let geometry = Geometry {
            positions: &positions(),
            observer: &[0.1, -0.2],
            speed: 1.0,
            time: 0.0,
        };
        let bound = build_retarded_coupling(&geometry, &FREQS, &MODS, F_432).unwrap();
        let rebuilt = build_coupling(&FREQS, &MODS, F_432, Some(&bound.phase)).unwrap();
        assert_eq!(bound.matrix, rebuilt);
    }

    #[test]
    fn test_modulator_carrier_varies_by_column() {
        let tau = [0.0, 0.001, 0.002];
        let policy = PhasePolicy::ModulatorCarrier { offsets: None };
        let theta = retarded_phase_matrix(&tau, &FREQS, &MODS, F_432, 0.0, &policy).unwrap();
        let expected = wrap_tau(TAU * F_432 * MODS[1] * (0.0 - tau[2]));
        assert_relative_eq!(theta[(2, 1)], expected, max_relative = 1e-12);
        assert_ne!(theta[(2, 0)], theta[(2, 1)]);
    }

    #[test]
    fn test_modulator_carrier_offsets() {
        let tau = [0.0, 0.0, 0.0];
        let policy = PhasePolicy::ModulatorCarrier {
            offsets: Some(vec![0.5, 1.5]),
        };
        let theta = retarded_phase_matrix(&tau, &FREQS, &MODS, F_432, 0.0, &policy).unwrap();
        assert_relative_eq!(theta[(0, 0)], 0.5);
        assert_relative_eq!(theta[(1, 1)], 1.5);

        let bad = PhasePolicy::ModulatorCarrier {
            offsets: Some(vec![0.5]),
        };
        let err = retarded_phase_matrix(&tau, &FREQS, &MODS, F_432, 0.0, &bad).unwrap_err();
        assert_eq!(err.param(), Some("offsets"));
    }

    #[test]
    fn test_phase_matrix_rejects_bad_delays() {
        let policy = PhasePolicy::default();
        let err =
            retarded_phase_matrix(&[0.0, -1.0, 0.0], &FREQS, &MODS, F_432, 0.0, &policy).unwrap_err();
        assert!(matches!(err, MjlogError::InvalidArgument { param: "delays", at: Location::Index(1), .. }));
        let err = retarded_phase_matrix(&[0.0], &FREQS, &MODS, F_432, 0.0, &policy).unwrap_err();
        assert_eq!(err.param(), Some("delays"));
        let err =
            retarded_phase_matrix(&[0.0; 3], &FREQS, &MODS, F_432, f64::NAN, &policy).unwrap_err();
        assert_eq!(err.param(), Some("time"));
    }

    #[test]
    fn test_phase_matrix_rejects_non_finite_frequencies() {
        let policy = PhasePolicy::default();
        let err = retarded_phase_matrix(&[0.0], &[f64::NAN], &MODS, F_432, 0.0, &policy).unwrap_err();
        assert!(matches!(
            err,
            MjlogError::InvalidArgument { param: "frequencies", at: Location::Index(0), .. }
        ));
        let carrier = PhasePolicy::ModulatorCarrier { offsets: None };
        let err =
            retarded_phase_matrix(&[0.0], &[-432.0], &MODS, F_432, 0.0, &carrier).unwrap_err();
        assert_eq!(err.param(), Some("frequencies"));
    }

    #[test]
    fn test_modulator_carrier_rejects_non_finite_offsets() {
        let policy = PhasePolicy::ModulatorCarrier {
            offsets: Some(vec![f64::NAN, 0.0]),
        };
        let err =
            retarded_phase_matrix(&[0.0, 0.0], &FREQS[..2], &MODS, F_432, 0.0, &policy).unwrap_err();
        assert!(matches!(
            err,
            MjlogError::InvalidArgument { param: "offsets", at: Location::Index(0), .. }
        ));
    }

    #[test]
    fn test_phase_matrix_rejects_overflowing_angle() {
        let policy = PhasePolicy::default();
        let err = retarded_phase_matrix(&[0.0, 0.0], &[432.0, 1e300], &MODS, F_432, 1e10, &policy)
            .unwrap_err();
        assert!(matches!(
            err,
            MjlogError::InvalidArgument { param: "phase", at: Location::Cell(1, 0), .. }
        ));
    }

    #[test]
    fn test_binder_rejects_length_mismatch() {
        let pts = positions();
        let geometry = Geometry {
            positions: &pts[..2],
            observer: &[0.0, 0.0],
            speed: 1.0,
            time: 0.0,
        };
        let err = build_retarded_coupling(&geometry, &FREQS, &MODS, F_432).unwrap_err();
        assert_eq!(err.param(), Some("positions"));
    }

    #[test]
    fn test_binder_propagates_builder_errors() {
        let geometry = Geometry {
            positions: &positions(),
            observer: &[0.0, 0.0],
            speed: 1.0,
            time: 0.0,
        };
        let err = build_retarded_coupling(&geometry, &FREQS, &[1.0, -2.0], F_432).unwrap_err();
        assert!(matches!(err, MjlogError::Domain { i: 0, j: 1, .. }));
    }

    #[test]
    fn test_couple_from_shuffled_delays_keeps_amplitudes() {
        let geometry = Geometry {
            positions: &positions(),
            observer: &[0.0, 0.0],
            speed: 10.0,
            time: 0.0,
        };
        let bound = build_retarded_coupling(&geometry, &FREQS, &MODS, F_432).unwrap();
        let mut reversed = bound.delays.clone();
        reversed.reverse();
        let rebound =
            couple_from_delays(&reversed, &FREQS, &MODS, F_432, 0.0, &PhasePolicy::default())
                .unwrap();
        assert_eq!(rebound.delays, reversed);
        for (a, b) in bound.matrix.as_slice().iter().zip(rebound.matrix.as_slice()) {
            assert_relative_eq!(a.norm(), b.norm(), max_relative = 1e-12);
        }
    }
}
