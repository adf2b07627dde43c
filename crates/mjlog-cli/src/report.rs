//! Text and JSON rendering of kernel results.

use anyhow::Result;
use mjlog_core::{Complex64, CouplingMatrix, GateResult, MinorSummary, TrialReport};
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn complex(z: Complex64) -> String {
    let sign = if z.im.is_sign_negative() { '-' } else { '+' };
    format!("{:.6}{sign}{:.6}i", z.re, z.im.abs())
}

pub fn matrix_text(m: &CouplingMatrix) -> String {
    let mut out = format!("shape: {}x{}\n", m.rows(), m.cols());
    for (i, row) in m.iter_rows().enumerate() {
        let cells: Vec<String> = row.iter().map(|&z| complex(z)).collect();
        out.push_str(&format!("{i:>3}: {}\n", cells.join("  ")));
    }
    out
}

pub fn gate_line(g: &GateResult) -> String {
    let status = if g.eligible { "eligible" } else { "blocked" };
    format!("{} ({:>2} Hz) {status}: {}", g.gate, g.gate.tier_hz(), g.reason)
}

fn summary_line(label: &str, s: &MinorSummary) -> String {
    format!(
        "{label:<16} R={:.4}  q50={:.4} q90={:.4} q95={:.4} q99={:.4}  (n={})",
        s.resultant_length, s.q50, s.q90, s.q95, s.q99, s.samples
    )
}

pub fn trial_text(report: &TrialReport) -> String {
    [
        summary_line("observed", &report.observed),
        summary_line("phase scramble", &report.phase_scrambled),
        summary_line("tau shuffle", &report.tau_shuffled),
        format!("coherence margin: {:+.4}", report.coherence_margin()),
    ]
    .join("\n")
}
