//! TOML experiment file for `mjlog trial`.

use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use mjlog_core::{F_432, F_838_776, PhasePolicy};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Which retarded-phase rule the trial uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyName {
    #[default]
    NodeBroadcast,
    ModulatorCarrier,
}

impl PolicyName {
    pub fn to_policy(self) -> PhasePolicy {
        match self {
            PolicyName::NodeBroadcast => PhasePolicy::NodeBroadcast,
            PolicyName::ModulatorCarrier => PhasePolicy::ModulatorCarrier { offsets: None },
        }
    }
}

/// Every field is optional in the file; missing ones take the defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExperimentConfig {
    pub seed: u64,
    pub nodes: usize,
    pub samples: usize,
    pub modulators: Vec<f64>,
    pub reference: f64,
    pub observer: Vec<f64>,
    pub speed: f64,
    pub time: f64,
    pub policy: PolicyName,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            nodes: 24,
            samples: 20_000,
            modulators: vec![1.0, 1.618, 2.0, 2.618, 3.236],
            reference: F_432,
            observer: vec![0.5, 0.5],
            speed: 1.0,
            time: 0.0,
            policy: PolicyName::NodeBroadcast,
        }
    }
}

impl ExperimentConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        tracing::debug!("loaded experiment config from {}", path.display());
        Ok(config)
    }

    /// Shape checks the kernel cannot make on its own. Numeric checks
    /// (finiteness, signs) are left to the kernel's validators.
    pub fn validate(&self) -> Result<()> {
        if self.nodes < 2 {
            bail!("nodes must be >= 2, got {}", self.nodes);
        }
        if self.samples == 0 {
            bail!("samples must be > 0");
        }
        if self.modulators.len() < 2 {
            bail!(
                "at least 2 modulators are needed for minor sampling, got {}",
                self.modulators.len()
            );
        }
        if self.observer.is_empty() {
            bail!("observer must have at least one coordinate");
        }
        Ok(())
    }

    /// Anchors first (432 Hz, 838.776 Hz), then 432 + i Hz for the rest.
    pub fn frequencies(&self) -> Vec<f64> {
        let mut freqs = vec![F_432, F_838_776];
        freqs.extend((2..self.nodes).map(|i| F_432 + i as f64));
        freqs.truncate(self.nodes);
        freqs
    }

    /// Node positions uniform in the unit cube of the observer's dimension.
    pub fn positions(&self, rng: &mut impl Rng) -> Vec<Vec<f64>> {
        let dim = self.observer.len();
        (0..self.nodes)
            .map(|_| (0..dim).map(|_| rng.random::<f64>()).collect())
            .collect()
    }
}
