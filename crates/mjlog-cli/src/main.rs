mod config;
mod report;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mjlog_core::{
    C_LIGHT, F_432, GATE_TIERS_HZ, Geometry, TrialConfig, TrialInputs, bridge_frequency,
    build_coupling, evaluate_gates, golden_pi, golden_ratio, harmonic_ladder, peak_frequencies,
    run_trial,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::Serialize;

use crate::config::{ExperimentConfig, PolicyName};

#[derive(Parser)]
#[command(name = "mjlog", about = "MJLOG coupling kernel and falsification harness")]
struct Cli {
    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show φ, π_φ, the bridge frequency and the gate tiers
    Constants {
        /// Reference frequency for the bridge (Hz)
        #[arg(long, default_value_t = F_432)]
        reference: f64,
    },

    /// Compute one harmonic ladder step: base · π_φⁿ · φᵏ
    Ladder {
        #[arg(long, default_value_t = F_432)]
        base: f64,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        n: i32,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        k: i32,
    },

    /// Build an unphased coupling matrix
    Couple {
        #[command(flatten)]
        inputs: CouplingArgs,
    },

    /// Evaluate gates 11 through 44
    Gates {
        #[command(flatten)]
        inputs: CouplingArgs,
    },

    /// Predict control and golden-ratio spectral peaks for a path length
    Peaks {
        /// Control path length L0 (m)
        #[arg(long)]
        path_length: f64,
        /// Number of odd-harmonic modes, starting at n = 0
        #[arg(long, default_value_t = 4)]
        modes: u32,
        /// Propagation speed (m/s)
        #[arg(long, default_value_t = C_LIGHT)]
        speed: f64,
    },

    /// Run observed, phase-scramble and tau-shuffle arms on random nodes
    Trial {
        /// TOML experiment file
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        samples: Option<usize>,
        #[arg(long)]
        nodes: Option<usize>,
        #[arg(long, value_enum)]
        policy: Option<PolicyName>,
    },
}

#[derive(clap::Args)]
struct CouplingArgs {
    /// Node frequencies (Hz), comma-separated or repeated
    #[arg(long = "freq", required = true, value_delimiter = ',', allow_negative_numbers = true)]
    frequencies: Vec<f64>,

    /// Modulators, comma-separated or repeated
    #[arg(long = "modulator", required = true, value_delimiter = ',', allow_negative_numbers = true)]
    modulators: Vec<f64>,

    /// Reference frequency ν0 (Hz)
    #[arg(long, default_value_t = F_432)]
    reference: f64,
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Constants { reference } => cmd_constants(&cli, *reference),
        Commands::Ladder { base, n, k } => cmd_ladder(&cli, *base, *n, *k),
        Commands::Couple { inputs } => cmd_couple(&cli, inputs),
        Commands::Gates { inputs } => cmd_gates(&cli, inputs),
        Commands::Peaks {
            path_length,
            modes,
            speed,
        } => cmd_peaks(&cli, *path_length, *modes, *speed),
        Commands::Trial {
            config,
            seed,
            samples,
            nodes,
            policy,
        } => {
            let mut experiment = match config {
                Some(path) => ExperimentConfig::load(path)?,
                None => ExperimentConfig::default(),
            };
            if let Some(seed) = seed {
                experiment.seed = *seed;
            }
            if let Some(samples) = samples {
                experiment.samples = *samples;
            }
            if let Some(nodes) = nodes {
                experiment.nodes = *nodes;
            }
            if let Some(policy) = policy {
                experiment.policy = *policy;
            }
            cmd_trial(&cli, &experiment)
        }
    }
}

#[derive(Serialize)]
struct ConstantsReport {
    phi: f64,
    pi_phi: f64,
    reference: f64,
    bridge_frequency: f64,
    gate_tiers_hz: [f64; 4],
}

fn cmd_constants(cli: &Cli, reference: f64) -> Result<()> {
    let report = ConstantsReport {
        phi: golden_ratio(),
        pi_phi: golden_pi(),
        reference,
        bridge_frequency: bridge_frequency(reference).context("invalid reference frequency")?,
        gate_tiers_hz: GATE_TIERS_HZ,
    };
    if cli.json {
        return report::print_json(&report);
    }
    println!("phi:        {:.12}", report.phi);
    println!("pi_phi:     {:.12}", report.pi_phi);
    println!(
        "bridge:     {:.6} Hz (reference {} Hz)",
        report.bridge_frequency, report.reference
    );
    println!("gate tiers: {:?} Hz", report.gate_tiers_hz);
    Ok(())
}

fn cmd_ladder(cli: &Cli, base: f64, n: i32, k: i32) -> Result<()> {
    let f = harmonic_ladder(base, n, k).context("failed to compute ladder step")?;
    if cli.json {
        return report::print_json(&serde_json::json!({ "base": base, "n": n, "k": k, "frequency": f }));
    }
    println!("f({n}, {k}) = {f:.6} Hz");
    Ok(())
}

fn cmd_couple(cli: &Cli, args: &CouplingArgs) -> Result<()> {
    let m = build_coupling(&args.frequencies, &args.modulators, args.reference, None)
        .context("failed to build coupling matrix")?;
    if cli.json {
        return report::print_json(&m);
    }
    print!("{}", report::matrix_text(&m));
    Ok(())
}

fn cmd_gates(cli: &Cli, args: &CouplingArgs) -> Result<()> {
    let gates = evaluate_gates(&args.frequencies, &args.modulators, args.reference);
    if cli.json {
        return report::print_json(&gates);
    }
    for g in &gates {
        println!("{}", report::gate_line(g));
    }
    Ok(())
}

fn cmd_peaks(cli: &Cli, path_length: f64, modes: u32, speed: f64) -> Result<()> {
    let (control, golden) =
        peak_frequencies(path_length, 0..modes, speed).context("failed to predict peaks")?;
    if cli.json {
        return report::print_json(&serde_json::json!({ "control": control, "phi": golden }));
    }
    for (n, (c, g)) in control.iter().zip(&golden).enumerate() {
        println!("n={n}: control={c:.6e} Hz  phi={g:.6e} Hz");
    }
    Ok(())
}

fn cmd_trial(cli: &Cli, experiment: &ExperimentConfig) -> Result<()> {
    experiment.validate().context("invalid experiment config")?;
    tracing::info!(
        seed = experiment.seed,
        nodes = experiment.nodes,
        samples = experiment.samples,
        "starting trial"
    );

    let mut rng = SmallRng::seed_from_u64(experiment.seed);
    let positions = experiment.positions(&mut rng);
    let frequencies = experiment.frequencies();
    let inputs = TrialInputs {
        geometry: Geometry {
            positions: &positions,
            observer: &experiment.observer,
            speed: experiment.speed,
            time: experiment.time,
        },
        frequencies: &frequencies,
        modulators: &experiment.modulators,
        reference: experiment.reference,
    };
    let config = TrialConfig {
        samples: experiment.samples,
        policy: experiment.policy.to_policy(),
    };
    let report = run_trial(&inputs, &config, &mut rng).context("trial failed")?;

    if cli.json {
        return report::print_json(&report);
    }
    println!("{}", report::trial_text(&report));
    Ok(())
}
