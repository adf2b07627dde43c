//! Staged eligibility gates.
//!
//! Gates report, they do not enforce: each returns a [`GateResult`] and never
//! an error, so a caller can print every stage for a given input set. Gate
//! 11 checks inputs, 22 checks the derived invariants, 33 stamps minimal
//! activation and 44 additionally requires both canonical anchors.

use std::fmt;

use serde::Serialize;

use crate::constants::{
    ANCHOR_TOL_HZ, F_432, F_838_776, GATE_11_HZ, GATE_22_HZ, GATE_33_HZ, GATE_44_HZ,
    bridge_frequency, golden_pi, has_anchor,
};

/// Gate tiers, in evaluation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Gate {
    #[serde(rename = "GATE11")]
    G11,
    #[serde(rename = "GATE22")]
    G22,
    #[serde(rename = "GATE33")]
    G33,
    #[serde(rename = "GATE44")]
    G44,
}

impl Gate {
    pub const ALL: [Gate; 4] = [Gate::G11, Gate::G22, Gate::G33, Gate::G44];

    pub fn tier_hz(self) -> f64 {
        match self {
            Gate::G11 => GATE_11_HZ,
            Gate::G22 => GATE_22_HZ,
            Gate::G33 => GATE_33_HZ,
            Gate::G44 => GATE_44_HZ,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Gate::G11 => "GATE11",
            Gate::G22 => "GATE22",
            Gate::G33 => "GATE33",
            Gate::G44 => "GATE44",
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which canonical anchors gate 11 must find among the node frequencies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnchorRequirement {
    pub require_432: bool,
    pub require_838: bool,
}

impl AnchorRequirement {
    pub const BOTH: Self = Self {
        require_432: true,
        require_838: true,
    };
}

/// Facts collected while evaluating a gate. Absent fields were not reached.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GateDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_432: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_838_776: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pi_phi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub f_bridge: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stamp: Option<&'static str>,
    /// The offending value when an input check failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GateResult {
    pub gate: Gate,
    pub eligible: bool,
    pub reason: String,
    pub details: GateDetails,
}

impl GateResult {
    fn pass(gate: Gate, details: GateDetails) -> Self {
        Self {
            gate,
            eligible: true,
            reason: "OK".to_string(),
            details,
        }
    }

    fn fail(gate: Gate, reason: impl Into<String>, details: GateDetails) -> Self {
        Self {
            gate,
            eligible: false,
            reason: reason.into(),
            details,
        }
    }

    /// Wrap a failed prerequisite as this gate's failure.
    fn prereq(gate: Gate, failed: GateResult) -> Self {
        Self::fail(
            gate,
            format!("Prereq {} failed: {}", failed.gate, failed.reason),
            failed.details,
        )
    }
}

fn is_pos_finite(x: f64) -> bool {
    x.is_finite() && x > 0.0
}

/// Gate 11: inputs are non-empty, finite and positive; records anchors.
pub fn gate_11(
    frequencies: &[f64],
    modulators: &[f64],
    reference: f64,
    anchors: AnchorRequirement,
) -> GateResult {
    let g = Gate::G11;
    if !is_pos_finite(reference) {
        let details = GateDetails {
            value: Some(reference),
            ..GateDetails::default()
        };
        return GateResult::fail(g, "reference must be finite and > 0", details);
    }
    if frequencies.is_empty() {
        return GateResult::fail(g, "frequencies must be non-empty", GateDetails::default());
    }
    if modulators.is_empty() {
        return GateResult::fail(g, "modulators must be non-empty", GateDetails::default());
    }
    if let Some(i) = frequencies.iter().position(|&f| !is_pos_finite(f)) {
        let details = GateDetails {
            value: Some(frequencies[i]),
            ..GateDetails::default()
        };
        return GateResult::fail(g, format!("frequencies[{i}] must be finite and > 0"), details);
    }
    if let Some(j) = modulators.iter().position(|&a| !is_pos_finite(a)) {
        let details = GateDetails {
            value: Some(modulators[j]),
            ..GateDetails::default()
        };
        return GateResult::fail(g, format!("modulators[{j}] must be finite and > 0"), details);
    }

    let has_432 = has_anchor(frequencies, F_432, ANCHOR_TOL_HZ);
    let has_838 = has_anchor(frequencies, F_838_776, ANCHOR_TOL_HZ);
    let details = GateDetails {
        has_432: Some(has_432),
        has_838_776: Some(has_838),
        ..GateDetails::default()
    };
    if anchors.require_432 && !has_432 {
        return GateResult::fail(g, "432 Hz anchor required but missing", details);
    }
    if anchors.require_838 && !has_838 {
        return GateResult::fail(g, "838.776 Hz anchor required but missing", details);
    }
    GateResult::pass(g, details)
}

/// Gate 22: gate 11 plus finite, positive π_φ and bridge frequency.
pub fn gate_22(frequencies: &[f64], modulators: &[f64], reference: f64) -> GateResult {
    let g11 = gate_11(frequencies, modulators, reference, AnchorRequirement::default());
    if !g11.eligible {
        return GateResult::prereq(Gate::G22, g11);
    }
    invariants(Gate::G22, g11.details)
}

/// Gate 33: gate 22 plus the minimal activation stamp.
pub fn gate_33(frequencies: &[f64], modulators: &[f64], reference: f64) -> GateResult {
    let g22 = gate_22(frequencies, modulators, reference);
    if !g22.eligible {
        return GateResult::prereq(Gate::G33, g22);
    }
    let details = GateDetails {
        stamp: Some("Gate33 active (minimal)"),
        ..g22.details
    };
    GateResult::pass(Gate::G33, details)
}

/// Gate 44: gate 11 with both anchors required, then gate 22.
pub fn gate_44(frequencies: &[f64], modulators: &[f64], reference: f64) -> GateResult {
    let g11 = gate_11(frequencies, modulators, reference, AnchorRequirement::BOTH);
    if !g11.eligible {
        return GateResult::prereq(Gate::G44, g11);
    }
    let g22 = gate_22(frequencies, modulators, reference);
    if !g22.eligible {
        return GateResult::prereq(Gate::G44, g22);
    }
    let details = GateDetails {
        stamp: Some("Gate44 publish-ready"),
        ..g22.details
    };
    GateResult::pass(Gate::G44, details)
}

/// Every gate in order.
pub fn evaluate_gates(frequencies: &[f64], modulators: &[f64], reference: f64) -> Vec<GateResult> {
    vec![
        gate_11(frequencies, modulators, reference, AnchorRequirement::default()),
        gate_22(frequencies, modulators, reference),
        gate_33(frequencies, modulators, reference),
        gate_44(frequencies, modulators, reference),
    ]
}

fn invariants(gate: Gate, base: GateDetails) -> GateResult {
    let pi_phi = golden_pi();
    let f_bridge = bridge_frequency(F_432).unwrap_or(f64::NAN);
    let details = GateDetails {
        pi_phi: Some(pi_phi),
        f_bridge: Some(f_bridge),
        ..base
    };
    if !is_pos_finite(pi_phi) || !is_pos_finite(f_bridge) {
        return GateResult::fail(gate, "Invariant computation failed", details);
    }
    GateResult::pass(gate, details)
}
