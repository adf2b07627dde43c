//! MJLOG coupling kernel.
//!
//! Builds the complex coupling matrix M_ij = ln((ν_i/ν0)·a_j)·e^{iθ_ij} from
//! node frequencies, dimensionless modulators and a phase relationship,
//! optionally derived from node geometry and retarded time. A validation
//! harness samples 2×2 minors of the matrix and applies two falsification
//! controls (phase scramble, delay shuffle).
//!
//! Zero I/O: pure math with explicit random-source injection. Every
//! randomized operation takes `&mut impl rand::Rng`; there is no global
//! stream.

pub mod angle;
pub mod constants;
pub mod controls;
pub mod coupling;
pub mod error;
pub mod gates;
pub mod geometry;
pub mod matrix;
pub mod minors;
pub mod retarded;
pub mod trial;

pub use num_complex::Complex64;

pub use constants::{
    ANCHOR_TOL_HZ, C_LIGHT, EPS0, F_432, F_838_776, GATE_11_HZ, GATE_22_HZ, GATE_33_HZ,
    GATE_44_HZ, GATE_TIERS_HZ, HBAR, PHI, bridge_frequency, golden_pi, golden_ratio,
    harmonic_ladder, has_anchor,
};
pub use controls::{phase_scramble, tau_shuffle};
pub use coupling::build_coupling;
pub use error::{Location, MjlogError, Result};
pub use gates::{
    AnchorRequirement, Gate, GateDetails, GateResult, evaluate_gates, gate_11, gate_22, gate_33,
    gate_44,
};
pub use geometry::{
    control_path_length, effective_path_length, path_phase, path_phase_matrix, peak_frequencies,
    peak_frequency_control, peak_frequency_phi,
};
pub use matrix::{CouplingMatrix, Matrix, PhaseMatrix};
pub use minors::{
    Minor, MinorSample, MinorSampler, MinorSummary, mean_resultant_length, phase_gradient_proxy,
    quantile, sample_minors,
};
pub use retarded::{
    Geometry, PhasePolicy, RetardedCoupling, build_retarded_coupling,
    build_retarded_coupling_with, couple_from_delays, retarded_delays, retarded_phase_matrix,
};
pub use trial::{TrialConfig, TrialInputs, TrialReport, run_trial};
